use crate::config::PayloadKind;
use crate::{DiskBenchError, Result};
use rand::{Rng, RngCore};
use std::ops::Deref;

/// Immutable data block written on every call of the write phase.
///
/// Generated once, before timing starts, so payload generation never shows
/// up in the measured interval.
#[derive(Debug, Clone)]
pub struct DataBlock {
    bytes: Box<[u8]>,
    kind: PayloadKind,
}

impl DataBlock {
    /// Generate a block of `size` bytes with the given payload
    pub fn generate(size: usize, kind: PayloadKind) -> Result<Self> {
        if size == 0 {
            return Err(DiskBenchError::ConfigError(
                "Block size must be greater than 0".to_string(),
            ));
        }

        let bytes = match kind {
            PayloadKind::Random => random_bytes(size),
            PayloadKind::Pattern => pattern_bytes(size),
            PayloadKind::Float64 => float64_bytes(size),
        };

        Ok(Self {
            bytes: bytes.into_boxed_slice(),
            kind,
        })
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for DataBlock {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn pattern_bytes(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

// Column of uniform f64 samples, little endian; the tail is cut to fit.
fn float64_bytes(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut bytes = Vec::with_capacity(size + 8);
    while bytes.len() < size {
        let value: f64 = rng.gen();
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes.truncate(size);
    bytes
}
