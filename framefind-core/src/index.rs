//! Exact top-k Hamming-distance search over stored fingerprints.
//!
//! A linear scan computing population-count of XOR(query, stored) for
//! every entry. Exactness matters here: near-duplicate frames separated
//! by a few bits must never be missed, and at 64 bits a scan over
//! millions of entries is fast enough that approximate methods buy
//! nothing. The index is derived state, rebuilt from the fingerprint
//! store at load time, and is never the source of truth.

use std::collections::BinaryHeap;

use crate::fingerprint::Fingerprint;

/// One search result: store id and Hamming distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub id: u64,
    pub distance: u32,
}

#[derive(Debug)]
pub struct NearestNeighborIndex {
    codes: Vec<u64>,
}

impl NearestNeighborIndex {
    /// Build from the store's flat fingerprint array; position in the
    /// slice is the store id.
    pub fn build(fingerprints: &[Fingerprint]) -> Self {
        Self {
            codes: fingerprints.iter().map(Fingerprint::as_u64).collect(),
        }
    }

    /// Exact top-k nearest neighbors, ascending by distance, ties broken
    /// by ascending id. Returns fewer than `k` entries only when the
    /// corpus itself is smaller than `k`.
    pub fn search(&self, query: &Fingerprint, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let q = query.as_u64();

        // Max-heap of the best k (distance, id) pairs seen so far.
        let mut heap: BinaryHeap<(u32, u64)> = BinaryHeap::with_capacity(k + 1);
        for (id, code) in self.codes.iter().enumerate() {
            let distance = (q ^ code).count_ones();
            let candidate = (distance, id as u64);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|(distance, id)| Neighbor { id, distance })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
