pub mod client;
pub mod keyboard;
pub mod types;

pub use client::{TelegramClient, TelegramError};
