use chrono::{DateTime, Utc};

/// Number of item names shown before the remainder is collapsed into `+N more`.
pub const ITEM_PREVIEW_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemList {
    pub date: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<ItemRef>,
}

/// Id of a document in the `items` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: String,
}

impl ItemList {
    pub fn preview_refs(&self) -> &[ItemRef] {
        let shown = self.items.len().min(ITEM_PREVIEW_LIMIT);

        &self.items[..shown]
    }

    pub fn hidden_count(&self) -> usize {
        self.items.len().saturating_sub(ITEM_PREVIEW_LIMIT)
    }
}

/// Renders the item message of a list: a header, one line per shown item and a `+N more`
/// line for the items left out.
pub fn render_item_preview(date: &str, items: &[Item], hidden: usize) -> String {
    if items.is_empty() && hidden == 0 {
        return format!("📋 List ({}) has no items.", date);
    }

    let mut lines = vec![format!("📋 List ({})", date)];

    lines.extend(items.iter().map(|item| format!("• {}", item.name)));

    if hidden > 0 {
        lines.push(format!("+{} more", hidden));
    }

    lines.join("\n")
}
