use chrono::{DateTime, Utc};

use crate::telegram::types::User;

/// A bot user who issued `/start`. The store assigns `subscribed_at` when the record is
/// written, so it is only known for records read back from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub subscribed_at: Option<DateTime<Utc>>,
}

/// Stored subscriber record that cannot be read back, e.g. one written without a `userId`.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedSubscriber {
    pub document_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscriber {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewSubscriber {
    pub fn document_id(&self) -> String {
        self.user_id.to_string()
    }
}

impl From<&User> for NewSubscriber {
    fn from(user: &User) -> Self {
        NewSubscriber {
            user_id: user.id,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()).filter(|name| !name.is_empty()),
            last_name: user.last_name.clone(),
        }
    }
}
