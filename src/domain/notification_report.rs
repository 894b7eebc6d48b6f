/// Result of delivering the notification to a single subscriber. A subscriber is delivered only
/// when every message of the sequence went through. `recipient` is the user id, or the record id
/// when the subscriber record could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NotificationReport {
    pub success: bool,
    pub message: String,
    pub delivered: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(recipient: impl ToString) -> Self {
        DeliveryOutcome {
            recipient: recipient.to_string(),
            error: None,
        }
    }

    pub fn failed(recipient: impl ToString, error: String) -> Self {
        DeliveryOutcome {
            recipient: recipient.to_string(),
            error: Some(error),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }
}

impl NotificationReport {
    pub fn no_subscribers() -> Self {
        NotificationReport {
            success: false,
            message: String::from("No subscribers found"),
            delivered: 0,
            failed: 0,
            errors: vec![],
            error: None,
        }
    }

    /// The subscribers could not be fetched, so nobody was notified.
    pub fn unavailable(error: String) -> Self {
        NotificationReport {
            success: false,
            message: String::from("Error sending notifications"),
            delivered: 0,
            failed: 0,
            errors: vec![],
            error: Some(error),
        }
    }

    pub fn from_outcomes(outcomes: &[DeliveryOutcome]) -> Self {
        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
        let errors: Vec<String> = outcomes
            .iter()
            .filter_map(|o| {
                o.error
                    .as_ref()
                    .map(|error| format!("User {}: {}", o.recipient, error))
            })
            .collect();
        let failed = errors.len();

        NotificationReport {
            success: true,
            message: format!(
                "Notifications sent: {} success, {} failed",
                delivered, failed
            ),
            delivered,
            failed,
            errors,
            error: None,
        }
    }
}
