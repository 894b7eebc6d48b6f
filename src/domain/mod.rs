pub mod item_list;
pub mod list_date;
pub mod notification_report;
pub mod subscriber;
pub mod web_app_link;
