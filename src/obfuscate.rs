//! Reversible credential encoding for the configuration file.
//!
//! This is base64, nothing more. It keeps the password from being readable
//! at a glance in `waconn.ini`, but anyone with read access to the file can
//! recover it. Protect the file with filesystem permissions if that matters.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::WaError;

/// Encodes a plaintext password into the form stored under `key`.
pub fn encode(plain: &str) -> String {
    STANDARD.encode(plain.as_bytes())
}

/// Decodes a value previously produced by [`encode`].
pub fn decode(encoded: &str) -> Result<String, WaError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|err| WaError::Decode(format!("invalid obfuscated credential: {err}")))?;
    String::from_utf8(bytes)
        .map_err(|err| WaError::Decode(format!("obfuscated credential is not UTF-8: {err}")))
}
