use actix_web::{HttpRequest, HttpResponse, Responder};

/// Endpoint used by clients to know if the server is working. It never touches the document
/// store or the Bot API.
#[tracing::instrument(name = "Health Check handler", skip(_request))]
pub async fn health_check(_request: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Bot server is running")
}
