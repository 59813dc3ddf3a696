//! `waconn` is an async HTTP client for the Workload Automation REST API
//! that fails over between equivalent hosts, plus the chat-bot layer that
//! answers scheduler questions from Webex.
//!
//! - [`WaConn::request`] sends one request, trying each configured host at
//!   most once when connections are refused.
//! - [`WaConn::query_jobs_in_plan`], [`WaConn::find_jobstreams`] and
//!   [`WaConn::rc_evaluation`] wrap the endpoints the bots use.
//! - [`ConnectionConfig::load`] reads `waconn.ini`. The stored password is
//!   only obfuscated, not encrypted; see [`obfuscate`].

mod api;
mod client;
pub mod config;
mod decode;
mod error;
pub mod obfuscate;
mod options;
mod request;
mod types;
mod wire;

pub mod bot;
#[cfg(feature = "webex")]
pub mod webex;

pub use api::{JOBSTREAM_PATH, JOB_QUERY_PATH};
pub use client::{WaConn, HOW_MANY, REQUEST_ID};
pub use config::ConnectionConfig;
pub use error::WaError;
pub use options::ClientOptions;
pub use request::ApiRequest;
pub use types::{JobInPlan, JobStream, RcDate, RcEvaluation};

pub type Result<T> = std::result::Result<T, WaError>;
