use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document_store::StoreError;
use crate::domain::item_list::{Item, ItemList, ItemRef};
use crate::domain::subscriber::{NewSubscriber, Subscriber};

/// Typed field value of the Firestore REST API, e.g. `{"stringValue": "abc"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(serde_json::Value),
    BooleanValue(bool),
    // 64-bit integers travel as strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Value::IntegerValue(value.to_string())
    }
}

/// Last segment of a document name, e.g. `items/abc` -> `abc`.
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

impl Document {
    pub fn id(&self) -> &str {
        document_id(&self.name)
    }

    pub fn string(&self, field: &str) -> Option<String> {
        match self.fields.get(field) {
            Some(Value::StringValue(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Like [`Document::string`], but treats the empty string as missing.
    pub fn non_empty_string(&self, field: &str) -> Option<String> {
        self.string(field).filter(|value| !value.is_empty())
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(Value::IntegerValue(value)) | Some(Value::StringValue(value)) => {
                value.parse().ok()
            }
            Some(Value::DoubleValue(value)) if value.fract() == 0.0 => Some(*value as i64),
            _ => None,
        }
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(field) {
            Some(Value::TimestampValue(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn array(&self, field: &str) -> &[Value] {
        match self.fields.get(field) {
            Some(Value::ArrayValue(array)) => &array.values,
            _ => &[],
        }
    }
}

/// Fields written for a subscriber. `subscribedAt` is absent, the store fills it in with a
/// server transform.
pub fn subscriber_fields(new_subscriber: &NewSubscriber) -> HashMap<String, Value> {
    let optional = |value: &Option<String>| Value::string(value.clone().unwrap_or_default());

    HashMap::from([
        (String::from("userId"), Value::integer(new_subscriber.user_id)),
        (String::from("username"), optional(&new_subscriber.username)),
        (String::from("firstName"), optional(&new_subscriber.first_name)),
        (String::from("lastName"), optional(&new_subscriber.last_name)),
    ])
}

impl TryFrom<&Document> for Subscriber {
    type Error = StoreError;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let user_id = document
            .integer("userId")
            .or_else(|| document.id().parse().ok())
            .ok_or_else(|| {
                StoreError::MalformedDocument(format!("{} has no userId", document.name))
            })?;

        Ok(Subscriber {
            user_id,
            username: document.non_empty_string("username"),
            first_name: document.non_empty_string("firstName"),
            last_name: document.non_empty_string("lastName"),
            subscribed_at: document.timestamp("subscribedAt"),
        })
    }
}

impl From<&Document> for ItemList {
    fn from(document: &Document) -> Self {
        let items = document
            .array("items")
            .iter()
            .filter_map(|value| match value {
                Value::ReferenceValue(name) => Some(ItemRef(document_id(name).to_string())),
                Value::StringValue(id) if !id.is_empty() => Some(ItemRef(id.clone())),
                Value::MapValue(map) => match map.fields.get("id") {
                    Some(Value::StringValue(id)) => Some(ItemRef(id.clone())),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        ItemList {
            date: document.non_empty_string("date"),
            created_at: document
                .timestamp("createdAt")
                .or(document.create_time),
            items,
        }
    }
}

impl TryFrom<&Document> for Item {
    type Error = StoreError;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let name = document.string("name").ok_or_else(|| {
            StoreError::MalformedDocument(format!("{} has no name", document.name))
        })?;

        Ok(Item { name })
    }
}
