//! Value Envelope Codec
//!
//! Serializes values to JSON and gzip-compresses the large ones. A stored
//! string is either plain JSON or `GZIP:` followed by base64 of the gzip'd
//! JSON; the prefix is the only discriminant.

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

/// Tag marking a compressed envelope.
pub const GZIP_PREFIX: &str = "GZIP:";

/// Default size above which values are compressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 2048;

// == Codec ==
/// Encodes values for storage and decodes them back.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    threshold: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_THRESHOLD)
    }
}

impl Codec {
    /// Creates a codec compressing values whose JSON exceeds `threshold` bytes.
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    // == Encode ==
    /// Serializes `value`, compressing it when the JSON exceeds the threshold.
    ///
    /// Compression failures fall back to the plain JSON form.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_string(value)?;
        if json.len() <= self.threshold {
            return Ok(json);
        }

        match gzip(json.as_bytes()) {
            Ok(compressed) => Ok(format!("{}{}", GZIP_PREFIX, STANDARD.encode(compressed))),
            Err(e) => {
                warn!(error = %e, "compression failed, storing plain JSON");
                Ok(json)
            }
        }
    }

    // == Decode ==
    /// Restores a value from either envelope form.
    ///
    /// Corrupt or truncated blobs return `CacheError::Codec`.
    pub fn decode<T: DeserializeOwned>(&self, stored: &str) -> Result<T> {
        match stored.strip_prefix(GZIP_PREFIX) {
            Some(encoded) => {
                let compressed = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| CacheError::Codec(format!("invalid base64: {}", e)))?;
                let json = gunzip(&compressed)?;
                serde_json::from_str(&json)
                    .map_err(|e| CacheError::Codec(format!("invalid JSON: {}", e)))
            }
            None => serde_json::from_str(stored)
                .map_err(|e| CacheError::Codec(format!("invalid JSON: {}", e))),
        }
    }
}

/// True when `stored` carries the compressed envelope tag.
pub fn is_compressed(stored: &str) -> bool {
    stored.starts_with(GZIP_PREFIX)
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

fn gunzip(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = String::new();
    decoder
        .read_to_string(&mut json)
        .map_err(|e| CacheError::Codec(format!("gunzip failed: {}", e)))?;
    Ok(json)
}
