use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::config::Settings;

/// Which parts of the configuration are present, without any secret value.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub web_app_url: String,
    pub bot_token: &'static str,
    pub firebase_config_set: bool,
}

impl From<&Settings> for EnvironmentReport {
    fn from(settings: &Settings) -> Self {
        let web_app_url = if settings.web_app.url.is_empty() {
            String::from("NOT SET")
        } else {
            settings.web_app.url.clone()
        };
        let bot_token = if settings.telegram.has_bot_token() {
            "SET (hidden)"
        } else {
            "NOT SET"
        };

        EnvironmentReport {
            web_app_url,
            bot_token,
            firebase_config_set: settings.firestore.is_configured(),
        }
    }
}

#[tracing::instrument(name = "Debug environment handler", skip(report))]
pub async fn debug_env(report: web::Data<EnvironmentReport>) -> impl Responder {
    HttpResponse::Ok().json(report.get_ref())
}
