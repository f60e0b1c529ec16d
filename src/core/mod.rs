pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod notify;
pub mod pipeline;
pub mod severity;
pub mod store;
pub mod terminal;
pub mod timeline;
