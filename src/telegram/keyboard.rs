use serde::{Deserialize, Serialize};

/// How links to the list viewer are rendered. Plain url buttons open a browser, web app buttons
/// open the viewer inside Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Url,
    WebApp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAppInfo {
    pub url: String,
}

impl InlineKeyboardButton {
    pub fn link(style: ButtonStyle, text: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let (url, web_app) = match style {
            ButtonStyle::Url => (Some(url), None),
            ButtonStyle::WebApp => (None, Some(WebAppInfo { url })),
        };

        InlineKeyboardButton {
            text: text.into(),
            url,
            web_app,
            callback_data: None,
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        InlineKeyboardButton {
            text: text.into(),
            url: None,
            web_app: None,
            callback_data: Some(data.into()),
        }
    }
}

impl ReplyMarkup {
    pub fn inline(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        ReplyMarkup::Inline {
            inline_keyboard: rows,
        }
    }

    pub fn single_button(button: InlineKeyboardButton) -> Self {
        Self::inline(vec![vec![button]])
    }

    /// Persistent keyboard under the input field opening the web app.
    pub fn web_app_keyboard(text: impl Into<String>, url: impl Into<String>) -> Self {
        ReplyMarkup::Keyboard {
            keyboard: vec![vec![KeyboardButton {
                text: text.into(),
                web_app: Some(WebAppInfo { url: url.into() }),
            }]],
            resize_keyboard: true,
        }
    }
}
