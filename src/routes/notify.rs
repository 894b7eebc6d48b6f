use actix_web::http::StatusCode;
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::domain::list_date::ListDate;
use crate::domain::notification_report::NotificationReport;
use crate::notifier::AppNotifier;

#[derive(Deserialize, Debug)]
pub struct NotifyBody {
    pub date: Option<String>,
}

#[tracing::instrument(
    name = "Notifying subscribers about a new list",
    skip(body, notifier),
    fields(
        date = ?body.date
    )
)]
pub async fn handle_notify(
    body: web::Json<NotifyBody>,
    notifier: web::Data<Option<AppNotifier>>,
) -> Result<HttpResponse, NotifyRouteError> {
    let list_date = body
        .into_inner()
        .date
        .ok_or_else(|| String::from("Date is required"))
        .and_then(ListDate::parse)
        .map_err(NotifyRouteError::InvalidBody)?;
    let notifier = notifier
        .get_ref()
        .as_ref()
        .ok_or(NotifyRouteError::WebAppNotConfigured)?;

    let report = match notifier.notify_all(&list_date).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!("Failed to send notifications: {:?}", err);
            NotificationReport::unavailable(err.to_string())
        }
    };

    Ok(HttpResponse::Ok().json(report))
}

/// Turns malformed or missing JSON bodies into the same 400 answer as a missing date.
pub fn json_error_handler(err: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    tracing::warn!("Rejected notify payload: {}", err);

    NotifyRouteError::InvalidBody(String::from("Date is required")).into()
}

#[derive(thiserror::Error)]
pub enum NotifyRouteError {
    #[error("{0}")]
    InvalidBody(String),
    #[error("Web app url is not configured.")]
    WebAppNotConfigured,
}

impl std::fmt::Debug for NotifyRouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyRouteError::InvalidBody(message) => write!(f, "Invalid body: {}", message),
            NotifyRouteError::WebAppNotConfigured => write!(f, "{}", self),
        }
    }
}

impl ResponseError for NotifyRouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            NotifyRouteError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            NotifyRouteError::WebAppNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            NotifyRouteError::InvalidBody(message) => serde_json::json!({
                "success": false,
                "message": message,
            }),
            NotifyRouteError::WebAppNotConfigured => serde_json::json!({
                "success": false,
                "message": "Server error",
                "error": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
