use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::time;

use crate::config::FirestoreSettings;
use crate::document_store::document::{document_id, subscriber_fields, Document, Value};
use crate::document_store::StoreError;
use crate::domain::item_list::{Item, ItemList, ItemRef};
use crate::domain::subscriber::{MalformedSubscriber, NewSubscriber, Subscriber};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);
const PAGE_SIZE: &str = "300";

const SUBSCRIBERS: &str = "subscribers";
const LISTS: &str = "lists";
const ITEMS: &str = "items";

/// Client of the Firestore REST API, authenticated with the project's web api key.
#[derive(Clone)]
pub struct FirestoreClient {
    http_client: Client,
    documents_url: String,
    database_name: String,
    api_key: Secret<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct RunQueryResponse {
    document: Option<Document>,
}

#[derive(serde::Deserialize)]
struct BatchGetResponse {
    found: Option<Document>,
}

impl FirestoreClient {
    pub fn new(
        settings: &FirestoreSettings,
        timeout: Option<time::Duration>,
    ) -> Result<FirestoreClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(FirestoreClient {
            http_client,
            documents_url: settings.get_documents_url(),
            database_name: settings.get_database_name(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Writes the subscriber document, replacing any previous one, and lets the store stamp
    /// `subscribedAt` with its own clock.
    #[tracing::instrument(
        name = "Upserting a subscriber into the document store",
        skip(self, new_subscriber),
        fields(user_id = %new_subscriber.user_id)
    )]
    pub async fn upsert_subscriber(&self, new_subscriber: &NewSubscriber) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "writes": [{
                "update": {
                    "name": self.document_name(SUBSCRIBERS, &new_subscriber.document_id()),
                    "fields": subscriber_fields(new_subscriber),
                },
                "updateTransforms": [{
                    "fieldPath": "subscribedAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
            }],
        });
        let request = self
            .http_client
            .post(format!("{}:commit", self.documents_url))
            .json(&body);

        self.send(request).await?;

        Ok(())
    }

    /// Every subscriber record. A record that fails to decode is returned as malformed instead of
    /// failing the whole listing.
    #[tracing::instrument(name = "Fetching all subscribers", skip(self))]
    pub async fn list_subscribers(
        &self,
    ) -> Result<Vec<Result<Subscriber, MalformedSubscriber>>, StoreError> {
        let url = format!("{}/{}", self.documents_url, SUBSCRIBERS);
        let mut subscribers = vec![];
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE)]);

            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsResponse = self.send(request).await?.json().await?;

            for document in &page.documents {
                let subscriber = Subscriber::try_from(document).map_err(|err| {
                    tracing::warn!("Skipping subscriber record {}: {}", document.name, err);

                    MalformedSubscriber {
                        document_id: document.id().to_string(),
                        reason: err.to_string(),
                    }
                });

                subscribers.push(subscriber);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(subscribers)
    }

    #[tracing::instrument(name = "Fetching a subscriber", skip(self))]
    pub async fn get_subscriber(&self, user_id: i64) -> Result<Option<Subscriber>, StoreError> {
        let request = self
            .http_client
            .get(format!("{}/{}/{}", self.documents_url, SUBSCRIBERS, user_id));
        let response = self.authorized(request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = check_status(response)?.json().await?;

        Subscriber::try_from(&document).map(Some)
    }

    /// Lists ordered by creation time, most recent first.
    #[tracing::instrument(name = "Fetching recent lists", skip(self))]
    pub async fn recent_lists(&self, limit: u32) -> Result<Vec<ItemList>, StoreError> {
        let query = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": LISTS }],
                "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
                "limit": limit,
            }
        });

        self.run_query(query).await
    }

    #[tracing::instrument(name = "Fetching a list by date", skip(self))]
    pub async fn list_by_date(&self, date: &str) -> Result<Option<ItemList>, StoreError> {
        let query = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": LISTS }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "date" },
                        "op": "EQUAL",
                        "value": Value::string(date),
                    }
                },
                "limit": 1,
            }
        });

        Ok(self.run_query(query).await?.into_iter().next())
    }

    /// Resolves item references, preserving their order. References to missing documents are
    /// skipped.
    #[tracing::instrument(name = "Fetching list items", skip(self, refs), fields(count = refs.len()))]
    pub async fn get_items(&self, refs: &[ItemRef]) -> Result<Vec<Item>, StoreError> {
        if refs.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = refs
            .iter()
            .map(|item_ref| self.document_name(ITEMS, &item_ref.0))
            .collect();
        let request = self
            .http_client
            .post(format!("{}:batchGet", self.documents_url))
            .json(&serde_json::json!({ "documents": names }));

        let results: Vec<BatchGetResponse> = self.send(request).await?.json().await?;
        let mut found: HashMap<String, Item> = HashMap::new();

        for document in results.iter().filter_map(|result| result.found.as_ref()) {
            found.insert(document.id().to_string(), Item::try_from(document)?);
        }

        Ok(refs
            .iter()
            .filter_map(|item_ref| found.remove(&item_ref.0))
            .collect())
    }

    async fn run_query(&self, query: serde_json::Value) -> Result<Vec<ItemList>, StoreError> {
        let request = self
            .http_client
            .post(format!("{}:runQuery", self.documents_url))
            .json(&query);

        let results: Vec<RunQueryResponse> = self.send(request).await?.json().await?;

        Ok(results
            .iter()
            .filter_map(|result| result.document.as_ref())
            .map(ItemList::from)
            .collect())
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_name, collection, document_id(id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("key", self.api_key.expose_secret())])
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;

        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();

    if !status.is_success() {
        return Err(StoreError::Status(status));
    }

    Ok(response)
}
