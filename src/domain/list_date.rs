use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Key of a published list. Producers use `YYYY-MM-DD`, but any non-empty key is accepted
/// and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ListDate(String);

impl ListDate {
    /// The key is kept byte for byte, surrounding whitespace included, so lookups use exactly
    /// what the producer sent.
    pub fn parse(date: String) -> Result<ListDate, String> {
        if date.trim().is_empty() {
            return Err(String::from("Date is required"));
        }

        Ok(Self(date))
    }

    pub fn today() -> ListDate {
        Self(chrono::Utc::now().date_naive().format(DATE_FORMAT).to_string())
    }

    /// Display form of the date. A `YYYY-MM-DD` key is rewritten field by field into the same
    /// layout, anything else is shown as is, so formatting is idempotent.
    pub fn formatted(&self) -> String {
        format_list_date(&self.0)
    }
}

pub fn format_list_date(date: &str) -> String {
    if !is_iso_date(date) {
        return date.to_string();
    }

    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(parsed) => parsed.format(DATE_FORMAT).to_string(),
        Err(_) => date.to_string(),
    }
}

fn is_iso_date(date: &str) -> bool {
    let bytes = date.as_bytes();

    bytes.len() == 10
        && bytes.iter().enumerate().all(|(position, byte)| match position {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

impl AsRef<str> for ListDate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ListDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
