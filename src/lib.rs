pub mod bot;
pub mod config;
pub mod document_store;
pub mod domain;
pub mod notifier;
pub mod routes;
pub mod startup;
pub mod telegram;
pub mod telemetry;
