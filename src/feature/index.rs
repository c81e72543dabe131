//! Approximate Hamming-space nearest neighbors via bit-sampling LSH.
//!
//! Every frame descriptor is hashed into several tables, each keyed by a
//! small random subset of descriptor bits. A query probes its bucket in
//! every table and scores the union of candidates exactly. When the bucket
//! union is too small for a ratio test the search degrades to brute force
//! over all descriptors, so the index is never less complete than a linear
//! scan.

use crate::feature::brief::{Descriptor, DESCRIPTOR_BITS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

const TABLES: usize = 12;
const KEY_BITS: usize = 12;

struct Table {
    bits: [usize; KEY_BITS],
    buckets: HashMap<u16, Vec<u32>>,
}

/// A multi-table LSH index over one frame's descriptors.
pub struct HammingIndex<'a> {
    descriptors: &'a [Descriptor],
    tables: Vec<Table>,
}

impl<'a> HammingIndex<'a> {
    /// Builds the index. Bit subsets are drawn from a seeded generator so
    /// the index is reproducible across runs.
    pub fn build(descriptors: &'a [Descriptor], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions: Vec<usize> = (0..DESCRIPTOR_BITS).collect();

        let tables = (0..TABLES)
            .map(|_| {
                positions.shuffle(&mut rng);
                let mut bits = [0usize; KEY_BITS];
                bits.copy_from_slice(&positions[..KEY_BITS]);

                let mut buckets: HashMap<u16, Vec<u32>> = HashMap::new();
                for (idx, desc) in descriptors.iter().enumerate() {
                    buckets.entry(key(desc, &bits)).or_default().push(idx as u32);
                }
                Table { bits, buckets }
            })
            .collect();

        Self {
            descriptors,
            tables,
        }
    }

    /// Finds the two nearest descriptors to `query`.
    ///
    /// Returns `(best index, best distance, second-best distance)`, or
    /// `None` when fewer than two descriptors are indexed.
    pub fn two_nearest(&self, query: &Descriptor) -> Option<(usize, u32, u32)> {
        if self.descriptors.len() < 2 {
            return None;
        }

        let mut seen = vec![false; self.descriptors.len()];
        let mut candidates: Vec<usize> = Vec::new();
        for table in &self.tables {
            if let Some(bucket) = table.buckets.get(&key(query, &table.bits)) {
                for &idx in bucket {
                    let idx = idx as usize;
                    if !seen[idx] {
                        seen[idx] = true;
                        candidates.push(idx);
                    }
                }
            }
        }
        // Not enough bucket hits for a ratio test; score everything.
        if candidates.len() < 2 {
            candidates = (0..self.descriptors.len()).collect();
        }

        let mut best: Option<(usize, u32)> = None;
        let mut second = u32::MAX;
        for idx in candidates {
            let dist = query.hamming(&self.descriptors[idx]);
            match best {
                Some((_, b)) if dist >= b => {
                    if dist < second {
                        second = dist;
                    }
                }
                Some((_, b)) => {
                    second = b;
                    best = Some((idx, dist));
                }
                None => best = Some((idx, dist)),
            }
        }
        let (idx, dist) = best?;
        if second == u32::MAX {
            return None;
        }
        Some((idx, dist, second))
    }
}

fn key(desc: &Descriptor, bits: &[usize; KEY_BITS]) -> u16 {
    let mut k = 0u16;
    for (i, &bit) in bits.iter().enumerate() {
        if desc.bit(bit) {
            k |= 1 << i;
        }
    }
    k
}
