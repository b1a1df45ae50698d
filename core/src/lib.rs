//! Blocking client for the Tedo billing API.
//!
//! # Overview
//! Typed access to plans, prices, entitlements, customers, subscriptions,
//! usage metering and hosted checkout/portal links. Every method maps to a
//! single HTTP endpoint: one request out, one decoded value or one error back.
//!
//! ```no_run
//! use tedo_core::{Client, CreateCustomerParams};
//!
//! # fn main() -> tedo_core::Result<()> {
//! let client = Client::new("tedo_live_xxx");
//! let customer = client.create_customer(&CreateCustomerParams::new("user@example.com").name("Acme Corp"))?;
//! match client.get_customer("cus_missing") {
//!     Err(e) if e.is_not_found() => println!("no such customer"),
//!     other => println!("{other:?}"),
//! }
//! # let _ = customer;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `Client` holds immutable config and a shared `Transport`; no caching,
//!   no retries, no internal locking.
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`),
//!   so `build_request` and `parse_response` can be driven by a host that owns
//!   the I/O.
//! - Partial updates use `Patch<T>` to keep "unchanged" apart from "clear".
//! - Records are defined independently from the mock server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod patch;
mod resources;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ApiError, Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::{paginate, ListParams, Page};
pub use patch::Patch;
pub use transport::{Transport, UreqTransport};
pub use types::*;
