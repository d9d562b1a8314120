//! Wordstat Server - HTTP surface of the word-frequency pipeline
//!
//! Every pipeline step is independently invokable over HTTP, and the upload
//! trigger accepts pushed storage notifications.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /word-count` - `{bucket_name, file_path}` → `{total_words}`
//! - `POST /top-words` - `{bucket_name, file_path}` → `{top_10_words}`
//! - `POST /load` - result record → `{status}`
//! - `POST /events/upload` - storage notification → started or skipped
//! - `POST /workflows/run` - run one workflow instance synchronously
//! - `GET /`, `/health`, `/ready`, `/metrics`
//!
//! Errors are `{"error": "...", "code": "..."}` with 400 for invalid input,
//! 404 for a missing object, 502 when a collaborator is unreachable and 500
//! otherwise.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
