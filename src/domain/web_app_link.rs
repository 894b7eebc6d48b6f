use reqwest::Url;

use crate::domain::list_date::ListDate;

/// Address of the list viewer front-end. Validated once at startup so building per-list links
/// cannot fail afterwards.
#[derive(Debug, Clone)]
pub struct WebAppLink(Url);

impl WebAppLink {
    pub fn parse(url: String) -> Result<WebAppLink, String> {
        let parsed = Url::parse(url.trim())
            .map_err(|err| format!("{} is not a valid web app url: {}", url, err))?;

        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(format!("{} must be an http(s) url", url));
        }

        Ok(Self(parsed))
    }

    pub fn for_date(&self, date: &ListDate) -> String {
        let mut url = self.0.clone();

        url.query_pairs_mut().append_pair("date", date.as_ref());

        url.to_string()
    }
}

impl AsRef<str> for WebAppLink {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
