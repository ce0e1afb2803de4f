// Configuration (TOML + env overrides)
pub mod config;

// Short-lived credential cache
pub mod credentials;

// Error taxonomy
pub mod error;

// Normalized integration items
pub mod item;

// KV store backends
pub mod kv;

// OAuth authorization code flow
pub mod oauth;

// Pagination cursor guard
pub mod pagination;

// Nested JSON key lookup
pub mod tree;

pub use credentials::{CredentialStore, Credentials};
pub use error::{IntegrationError, Result};
pub use item::{IntegrationItem, ItemListing};
