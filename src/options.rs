/// Configures HTTP timeouts and default request headers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds. A host that does not accept the
    /// connection within this window counts as unreachable.
    pub connect_timeout_ms: u64,
    /// Default value of the `How-Many` header (result-count cap).
    pub how_many: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            how_many: 500,
        }
    }
}
