//! Surrogate keys for `tracks.track_id`
//!
//! `track_id` is a run-local synthetic key. Neither strategy makes it a
//! foreign key into the source data.

use crate::config::TrackIdStrategy;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Bits reserved for the row index under the partition counter strategy
pub const PARTITION_SHIFT: u32 = 33;

/// The content a track id may be derived from
#[derive(Debug, Clone, Copy)]
pub struct TrackContent<'a> {
    pub title: Option<&'a str>,
    pub artist_id: Option<&'a str>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// Hands out track ids that are unique within one run
#[derive(Debug)]
pub struct TrackIdGenerator {
    strategy: TrackIdStrategy,
    issued: HashSet<i64>,
}

impl TrackIdGenerator {
    /// Create a generator for one run
    pub fn new(strategy: TrackIdStrategy) -> Self {
        Self {
            strategy,
            issued: HashSet::new(),
        }
    }

    /// Id for the `row`-th track of input partition `partition`
    ///
    /// Partition counter ids increase with (partition, row) but leave gaps
    /// between partitions. Content hash ids are salted until unused, so
    /// identical rows still get distinct ids, assigned in input order.
    pub fn next_id(&mut self, partition: usize, row: usize, content: &TrackContent<'_>) -> i64 {
        let id = match self.strategy {
            TrackIdStrategy::PartitionCounter => partition_counter_id(partition, row),
            TrackIdStrategy::ContentHash => {
                let mut salt = 0u64;
                loop {
                    let candidate = content_hash_id(content, salt);
                    if !self.issued.contains(&candidate) {
                        break candidate;
                    }
                    salt += 1;
                }
            }
        };
        self.issued.insert(id);
        id
    }
}

/// `(partition << 33) + row`, the layout of a partition-local counter
pub fn partition_counter_id(partition: usize, row: usize) -> i64 {
    ((partition as i64) << PARTITION_SHIFT) + row as i64
}

/// Non-negative id from SHA-256 over the track content and a salt
pub fn content_hash_id(content: &TrackContent<'_>, salt: u64) -> i64 {
    let mut hasher = Sha256::new();
    hash_text(&mut hasher, content.title);
    hash_text(&mut hasher, content.artist_id);
    match content.year {
        Some(year) => {
            hasher.update([1u8]);
            hasher.update(year.to_be_bytes());
        }
        None => hasher.update([0u8]),
    }
    match content.duration {
        Some(duration) => {
            hasher.update([1u8]);
            hasher.update(duration.to_bits().to_be_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(salt.to_be_bytes());

    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) >> 1) as i64
}

/// Length-prefixed so ("ab", "c") and ("a", "bc") hash differently
fn hash_text(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(text) => {
            hasher.update([1u8]);
            hasher.update((text.len() as u64).to_be_bytes());
            hasher.update(text.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}
