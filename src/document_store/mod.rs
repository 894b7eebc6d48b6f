pub mod client;
pub mod document;

use reqwest::StatusCode;

pub use client::FirestoreClient;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to reach the document store: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Document store answered with status {0}.")]
    Status(StatusCode),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        // The request url carries the api key.
        StoreError::Request(err.without_url())
    }
}
