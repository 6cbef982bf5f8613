//! Perceptual hash codes
//!
//! A perceptual hash is a fixed-width fingerprint of an image's coarse visual
//! structure. Codes arrive hex-encoded from an external hasher; the most
//! common width is 64 bits (16 hex characters).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A fixed-width perceptual hash, stored big-endian as raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerceptualHash {
    bytes: Vec<u8>,
}

impl PerceptualHash {
    /// Parse a hex-encoded hash code
    pub fn from_hex(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidHash("empty hash code".to_string()));
        }
        let bytes = hex::decode(text)
            .map_err(|e| Error::InvalidHash(format!("{}: {}", text, e)))?;
        Ok(Self { bytes })
    }

    /// Build a 64-bit code from an integer
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self {
            bytes: value.to_be_bytes().to_vec(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width of the code in bits
    #[inline]
    pub fn width_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Number of differing bits. Codes of unequal width are rejected.
    pub fn hamming_distance(&self, other: &PerceptualHash) -> Result<u32> {
        if self.bytes.len() != other.bytes.len() {
            return Err(Error::HashWidthMismatch {
                left: self.width_bits(),
                right: other.width_bits(),
            });
        }

        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }

    /// Similarity in [0, 1]: `1 - distance / width`
    pub fn similarity(&self, other: &PerceptualHash) -> Result<f32> {
        let distance = self.hamming_distance(other)?;
        Ok(1.0 - distance as f32 / self.width_bits() as f32)
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for PerceptualHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for PerceptualHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<PerceptualHash> for String {
    fn from(hash: PerceptualHash) -> Self {
        hash.to_hex()
    }
}
