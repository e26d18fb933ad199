//! Outbound adapters: AI provider backends and the document store client.

pub mod paperless;
pub mod providers;
