//! Document identity generation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Source of `_id` values for inserted documents.
pub trait IdGenerator: Send + Sync {
    /// Produce a new, globally unique 24-character hex id.
    fn generate(&self) -> String;
}

/// ObjectId-style generator.
///
/// Layout (12 bytes, hex encoded): 4-byte big-endian unix seconds, 5 random
/// bytes fixed per generator, 3-byte big-endian counter seeded randomly.
pub struct ObjectIdGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self {
            process: rng.random(),
            counter: AtomicU32::new(rng.random::<u32>() & 0x00FF_FFFF),
        }
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for ObjectIdGenerator {
    fn generate(&self) -> String {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        hex::encode(bytes)
    }
}
