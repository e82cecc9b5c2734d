use std::collections::hash_map::DefaultHasher;
use std::f64::consts::LN_2;
use std::hash::{Hash, Hasher};

const SECOND_HASH_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fixed-size bloom filter: no false negatives, bounded false positives.
///
/// Sized with `m = -n ln p / ln² 2` bits and `k = m/n ln 2` probes, using
/// double hashing (`h1 + i * h2`) over SipHash.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    items: u64,
}

impl BloomFilter {
    /// Filter for `capacity` items at false-positive rate `error_rate`.
    pub fn with_rate(error_rate: f64, capacity: u64) -> Self {
        let n = capacity.max(1) as f64;
        let num_bits = (-(n * error_rate.ln()) / (LN_2 * LN_2)).ceil().max(64.0) as u64;
        let num_hashes = ((num_bits as f64 / n) * LN_2).round().max(1.0) as u32;
        let words = num_bits.div_ceil(64) as usize;

        Self {
            bits: vec![0; words],
            num_bits,
            num_hashes,
            items: 0,
        }
    }

    /// Insert an item. Returns true if it was not already (probably) present.
    pub fn insert(&mut self, item: &str) -> bool {
        let (h1, h2) = hash_pair(item);
        let mut changed = false;
        for i in 0..u64::from(self.num_hashes) {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits;
            let (word, mask) = ((bit / 64) as usize, 1u64 << (bit % 64));
            if self.bits[word] & mask == 0 {
                self.bits[word] |= mask;
                changed = true;
            }
        }
        if changed {
            self.items += 1;
        }
        changed
    }

    pub fn contains(&self, item: &str) -> bool {
        let (h1, h2) = hash_pair(item);
        (0..u64::from(self.num_hashes)).all(|i| {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits;
            self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Number of insertions that changed the filter.
    pub fn len(&self) -> u64 {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }
}

fn hash_pair(item: &str) -> (u64, u64) {
    let mut first = DefaultHasher::new();
    item.hash(&mut first);

    let mut second = DefaultHasher::new();
    SECOND_HASH_SALT.hash(&mut second);
    item.hash(&mut second);

    // odd step so probes cycle through distinct bits
    (first.finish(), second.finish() | 1)
}
