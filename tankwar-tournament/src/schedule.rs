//! Rotational round-robin pairing for competition mode
//!
//! With N strategies in fixed order, map `k` pairs strategy `i` against
//! `(i + 1 + (k mod (N-1))) mod N`. Keeping only pairs where `i` is the
//! smaller index removes the mirrored duplicates, and a per-map seen-set
//! guards against the even-N offset that would otherwise pair a cell twice.
//! Over any window of N-1 consecutive maps every unordered pair plays
//! exactly once.

use std::collections::HashSet;

/// Pairings for map `map_index`, as `(i, j)` with `i < j`
pub fn round_robin_pairs(n: usize, map_index: usize) -> Vec<(usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    let offset = 1 + (map_index % (n - 1));
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for i in 0..n {
        let opponent = (i + offset) % n;
        if i < opponent && seen.insert((i, opponent)) {
            pairs.push((i, opponent));
        }
    }
    pairs
}
