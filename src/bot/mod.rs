pub mod command;
pub mod service;

pub use service::{BotService, BotSettings};
