//! Provider connectors and HTTP API for the integration hub.
//!
//! This crate wires the core library (credential store, OAuth flow, item
//! model) to concrete providers and exposes them over HTTP.
//!
//! # Architecture
//!
//! ```text
//!   Integration UI
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       HTTP API (axum)                   │
//! │  - authorize / oauth2callback           │
//! │  - credentials / items                  │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Integration registry              │
//! │  - OAuth flow or static token           │
//! │  - Credential read policy               │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Connectors                        │
//! │  - Page through provider APIs           │
//! │  - Normalize to integration items       │
//! └─────────────────────────────────────────┘
//!          ↓
//!   Airtable / HubSpot / Notion
//! ```
//!
//! # Core Types
//!
//! - [`Connector`] - Trait every provider implements
//! - [`IntegrationRegistry`] - Providers built from configuration
//! - [`Credentials`] - Stored provider credentials (from the core crate)

mod connector;
mod upstream;
pub mod api;
pub mod connectors;
pub mod registry;

pub use connector::Connector;
pub use registry::{AuthorizeResponse, IntegrationRegistry};

pub use integration_hub::{Credentials, IntegrationItem, ItemListing};
