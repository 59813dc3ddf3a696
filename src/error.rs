use std::path::PathBuf;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum WaError {
    /// The configuration file is missing required content.
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },
    /// The configuration file could not be read or rewritten.
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The client was built without any host to talk to.
    #[error("no hosts configured")]
    NoHosts,
    /// Every configured host refused the connection.
    #[error("no response received from server after {attempts} attempt(s): {source}")]
    NoHostReachable {
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
    /// Network or request execution error from `reqwest` that is not a
    /// connection failure, such as a read timeout.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body and any messages
    /// the server embedded in it.
    #[error("http error {status}: {body}")]
    Http {
        status: u16,
        body: String,
        messages: Vec<String>,
    },
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl WaError {
    /// Server-reported messages, when the error came with any.
    pub fn server_messages(&self) -> &[String] {
        match self {
            Self::Http { messages, .. } => messages,
            _ => &[],
        }
    }
}
