//! Blocking client for the vault's local REST API.
//!
//! # Overview
//! `VaultClient` turns each remote endpoint into an [`Operation`]: a plain-data
//! `HttpRequest`, the set of status codes the endpoint answers with on
//! success, and a decoder for the response body. [`Vault`] pairs a client
//! with a [`Transport`] and runs operations over the network, logging every
//! outcome through `tracing`.
//!
//! # Design
//! - `VaultClient` is stateless. Headers are assembled per request from the
//!   defaults plus the operation's overrides, so one client can be shared
//!   across threads.
//! - Building and parsing never touch the network (host-does-IO). Tests drive
//!   `Operation::parse` with canned `HttpResponse` values.
//! - Every failure is an `ApiError` value. Nothing panics across the
//!   library boundary.

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod vault;

pub use client::{Operation, VaultClient};
pub use config::{ClientCertPaths, ClientConfig};
pub use content::decode_note_body;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Command, InsertPosition, Insertion, NoteJson, NoteStat, Period, SearchMatch, SearchQuery,
    SearchResult, ServerStatus, SimpleSearchResult, Versions,
};
pub use vault::Vault;
