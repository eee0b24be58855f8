// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Codec pipeline: optional compression + cell-safe text encoding
//!
//! The remote medium only reliably stores printable text in bounded cells,
//! so every payload round-trips through the basE91 alphabet. Compression is
//! applied before text encoding so the ratio benefits from binary density.

pub mod base91;

use crate::error::{Error, Result};
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Compression policy applied before text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl Compression {
    /// The string value stored in the `compression` document property.
    pub fn as_property(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }

    /// Parse a stored property value. Unknown values are rejected so a
    /// payload is never decoded under the wrong policy.
    pub fn from_property(value: &str) -> Result<Self> {
        match value {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown compression policy {:?}",
                other
            ))),
        }
    }
}

/// Reversible transform from raw bytes to store-safe printable text.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    compression: Compression,
}

impl Codec {
    #[must_use]
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    /// Encode raw bytes: optional gzip, then basE91 text.
    pub fn encode(&self, data: &[u8]) -> Result<String> {
        let compressed = match self.compression {
            Compression::None => return Ok(base91::encode(data)),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
                encoder
                    .write_all(data)
                    .and_then(|_| encoder.finish())
                    .map_err(|e| Error::Codec(format!("gzip compression failed: {}", e)))?
            }
        };
        Ok(base91::encode(&compressed))
    }

    /// Decode stored text back to the original bytes.
    ///
    /// A truncated gzip stream fails here rather than returning a short
    /// read; the store additionally checks the decoded length against the
    /// recorded object size.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let raw = base91::decode(text)?;
        match self.compression {
            Compression::None => Ok(raw),
            Compression::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(raw.as_slice())
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Codec(format!("gzip decompression failed: {}", e)))?;
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_roundtrip_both_policies() {
        let mut rng = rand::thread_rng();
        let mut data = vec![0u8; 100_000];
        rng.fill_bytes(&mut data);

        for compression in [Compression::None, Compression::Gzip] {
            let codec = Codec::new(compression);
            for input in [&[][..], &[0u8; 1000][..], &data[..]] {
                let text = codec.encode(input).unwrap();
                assert!(!text.contains(['\t', '\n']));
                assert_eq!(codec.decode(&text).unwrap(), input);
            }
        }
    }

    #[test]
    fn test_gzip_shrinks_repetitive_input() {
        let data = vec![7u8; 1 << 16];
        let plain = Codec::new(Compression::None).encode(&data).unwrap();
        let gzipped = Codec::new(Compression::Gzip).encode(&data).unwrap();
        assert!(gzipped.len() < plain.len() / 10);
    }

    #[test]
    fn test_truncated_gzip_fails() {
        let codec = Codec::new(Compression::Gzip);
        let text = codec.encode(b"some payload that should not survive truncation").unwrap();
        let cut = &text[..text.len() / 2];
        assert!(matches!(codec.decode(cut), Err(Error::Codec(_))));
    }

    #[test]
    fn test_mismatched_policy_fails() {
        let text = Codec::new(Compression::None).encode(b"not a gzip stream").unwrap();
        assert!(matches!(
            Codec::new(Compression::Gzip).decode(&text),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_property_values() {
        assert_eq!(Compression::Gzip.as_property(), "gzip");
        assert_eq!(Compression::from_property("none").unwrap(), Compression::None);
        assert!(Compression::from_property("zip").is_err());
    }
}
