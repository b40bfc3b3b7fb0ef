//! chatrelay forwards chat payloads to an upstream completion API and
//! logs every reply to a SQLite response log before returning it.

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
pub mod upstream;

pub use config::Config;
pub use error::RelayError;
pub use server::{build_router, run_server};
pub use store::{LogStats, NewResponse, ResponseLog, ResponseRecord};
pub use types::{ChatMessage, ContentBlock, RelayPayload, RelayReply};
pub use upstream::{Completion, UpstreamClient};
