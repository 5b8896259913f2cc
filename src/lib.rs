//! # BigPanda API
//!
//! A Rust client library for sending alerts and deployments to [BigPanda](https://www.bigpanda.io/).
//!
//! ## Features
//!
//! - Send alerts and deployment events over the BigPanda ingestion API
//! - Batch several alerts into a single request
//! - Builder pattern for constructing events
//! - Validation (app key, batch contents, identity attributes) before any network I/O
//!
//! The client never retries on its own. Wrap it with a retry middleware through
//! [`BigPandaClient::with_client`] if you need one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bigpanda_api::{Alert, BigPandaClient, ClientOptions};
//! use serde_json::Map;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BigPandaClient::from_options(
//!         ClientOptions::new("my-api-token").with_app_key("my-app-key"),
//!     )?;
//!
//!     client
//!         .alert("critical", Map::new())
//!         .with_attr("host", "web1")
//!         .with_check("disk")
//!         .with_description("Disk usage above 95%")
//!         .send()
//!         .await?;
//!
//!     let batch = vec![
//!         Alert::new("ok", Map::new()).with_attr("host", "web1").with_check("disk"),
//!         Alert::new("warning", Map::new()).with_attr("host", "web2").with_check("cpu"),
//!     ];
//!     client.send(batch).await?;
//!
//!     client
//!         .deployment("billing", "2.3.1", vec!["web1".to_string()])
//!         .with_owner("alice")
//!         .with_env("production")
//!         .send()
//!         .await?;
//!     Ok(())
//! }
//! ```

mod alert;
mod client;
pub mod config;
mod deployment;
mod errors;
mod types;

pub use alert::Alert;
pub use client::{BigPandaClient, Bound, PreparedRequest};
pub use config::ClientOptions;
pub use deployment::Deployment;
pub use errors::{BigPandaError, Result};
pub use types::{AlertStatus, DeploymentStatus, Event, Outbound};
