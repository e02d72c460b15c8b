//! Permutation crossover, mutation and repair.
//!
//! These operate on `&[usize]` city orders. Crossover and mutation never
//! look at distances; fitness is the caller's business.
//!
//! # Crossover
//!
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), preserves absolute position
//!
//! # Mutation
//!
//! - [`invert_mutation`]: Reverse a random segment, O(n)
//! - [`swap_mutation`]: Exchange two random positions, O(1)
//!
//! # Repair
//!
//! [`repair`] is the single safety net of the reproduction pipeline: a
//! child that is not a permutation is replaced by a shuffled copy of its
//! first parent. It reports what it did as a [`Repair`] value.
//!
//! # References
//!
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Cicirello (2023), "Genetic Operators for Permutation Representation"

use rand::seq::SliceRandom;
use rand::Rng;

// ============================================================================
// Crossover
// ============================================================================

/// Partially Mapped Crossover (PMX), one child.
///
/// # Algorithm (Goldberg & Lingle, 1985)
///
/// 1. Draw cut points `a <= b` in `0..n`
/// 2. Copy `parent1[a..=b]` into the child at the same positions
/// 3. For each `parent2[i]`, `i` in `a..=b`, not already in the segment,
///    follow `pos -> position of parent1[pos] in parent2` from `pos = i`
///    until `pos` leaves `[a, b]`, and place it there
/// 4. Fill remaining positions from `parent2`
///
/// The result is a permutation whenever both parents are; callers still
/// check it with [`is_valid_permutation`].
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Panics
/// Panics if parents have different lengths.
pub fn pmx_crossover<R: Rng>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");

    if n < 2 {
        return parent1.to_vec();
    }

    let (a, b) = random_segment(n, rng);
    pmx_with_cuts(parent1, parent2, a, b)
}

/// PMX with explicit cut points `a..=b`.
///
/// Malformed parents (duplicates, out-of-range values) never cause a panic
/// or an endless mapping walk; they simply yield a child that fails
/// validation.
///
/// # Panics
/// Panics if parents have different lengths or the cuts are not
/// `a <= b < n`.
pub fn pmx_with_cuts(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> Vec<usize> {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(a <= b && b < n, "cut points must satisfy a <= b < n");

    let mut child: Vec<Option<usize>> = vec![None; n];
    let mut in_segment = vec![false; n];

    // Inverse of parent2: value -> position
    let mut pos_in_p2: Vec<Option<usize>> = vec![None; n];
    for (i, &v) in parent2.iter().enumerate() {
        if v < n && pos_in_p2[v].is_none() {
            pos_in_p2[v] = Some(i);
        }
    }

    // Step 1: fixed segment from parent1
    for i in a..=b {
        let v = parent1[i];
        child[i] = Some(v);
        if v < n {
            in_segment[v] = true;
        }
    }

    // Step 2: place displaced parent2 genes through the mapping chain
    for i in a..=b {
        let gene = parent2[i];
        if gene < n && in_segment[gene] {
            continue;
        }

        let mut pos = i;
        let mut dest = None;
        for _ in 0..n {
            match pos_in_p2.get(parent1[pos]).copied().flatten() {
                Some(next) if next < a || next > b => {
                    dest = Some(next);
                    break;
                }
                Some(next) => pos = next,
                None => break,
            }
        }

        if let Some(d) = dest {
            if child[d].is_none() {
                child[d] = Some(gene);
            }
        }
    }

    // Step 3: everything else straight from parent2
    child
        .into_iter()
        .zip(parent2)
        .map(|(c, &d)| c.unwrap_or(d))
        .collect()
}

// ============================================================================
// Mutation
// ============================================================================

/// Permutation mutation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutation {
    /// Segment reversal ([`invert_mutation`]).
    #[default]
    Inversion,
    /// Two-position exchange ([`swap_mutation`]).
    Swap,
}

impl Mutation {
    /// Applies the operator with probability `rate`. Returns `true` if it fired.
    pub fn apply<R: Rng>(self, perm: &mut [usize], rate: f64, rng: &mut R) -> bool {
        match self {
            Mutation::Inversion => invert_mutation(perm, rate, rng),
            Mutation::Swap => swap_mutation(perm, rate, rng),
        }
    }
}

/// Invert mutation: with probability `rate`, reverse `perm[i..=j]` for two
/// random positions `i <= j`.
///
/// Validity-preserving. Returns `true` if the mutation fired (a draw of
/// `i == j` fires but leaves `perm` unchanged).
///
/// # Complexity
/// O(n) worst case for segment reversal
pub fn invert_mutation<R: Rng>(perm: &mut [usize], rate: f64, rng: &mut R) -> bool {
    let n = perm.len();
    if n < 2 || rng.random_range(0.0..1.0) >= rate {
        return false;
    }
    let (start, end) = random_segment(n, rng);
    perm[start..=end].reverse();
    true
}

/// Swap mutation: with probability `rate`, exchange two random positions.
///
/// # Complexity
/// O(1)
pub fn swap_mutation<R: Rng>(perm: &mut [usize], rate: f64, rng: &mut R) -> bool {
    let n = perm.len();
    if n < 2 || rng.random_range(0.0..1.0) >= rate {
        return false;
    }
    let i = rng.random_range(0..n);
    let j = rng.random_range(0..n);
    perm.swap(i, j);
    true
}

// ============================================================================
// Validation and repair
// ============================================================================

/// Outcome of [`repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// The child was already a valid permutation.
    Intact,
    /// The child was discarded and replaced by a shuffled parent copy.
    Reshuffled,
}

/// Returns `true` if `perm` is a permutation of `0..n`.
pub fn is_valid_permutation(perm: &[usize], n: usize) -> bool {
    if perm.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &v in perm {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Ensures `child` is a permutation of `0..n`.
///
/// An invalid child is overwritten with a copy of `parent` shuffled by
/// `rng`. If `parent` is not a permutation of `0..n` either, the identity
/// order is shuffled instead, so the result is always valid.
pub fn repair<R: Rng>(child: &mut Vec<usize>, parent: &[usize], n: usize, rng: &mut R) -> Repair {
    if is_valid_permutation(child, n) {
        return Repair::Intact;
    }
    child.clear();
    if is_valid_permutation(parent, n) {
        child.extend_from_slice(parent);
    } else {
        child.extend(0..n);
    }
    child.shuffle(rng);
    Repair::Reshuffled
}

// ============================================================================
// Helpers
// ============================================================================

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn shuffled(n: usize, seed: u64) -> Vec<usize> {
        let mut rng = create_rng(seed);
        let mut p: Vec<usize> = (0..n).collect();
        p.shuffle(&mut rng);
        p
    }

    // ---- PMX ----

    #[test]
    fn test_pmx_textbook_example() {
        let p1 = vec![8, 4, 7, 3, 6, 2, 5, 1, 9, 0];
        let p2 = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        let child = pmx_with_cuts(&p1, &p2, 3, 7);
        assert_eq!(child, vec![0, 7, 4, 3, 6, 2, 5, 1, 8, 9]);
    }

    #[test]
    fn test_pmx_produces_valid_permutations() {
        let mut rng = create_rng(42);
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![3, 7, 5, 1, 6, 0, 2, 4];

        for _ in 0..200 {
            let c = pmx_crossover(&p1, &p2, &mut rng);
            assert!(is_valid_permutation(&c, 8), "PMX child not valid: {c:?}");
        }
    }

    #[test]
    fn test_pmx_degenerate_cuts() {
        let p1 = shuffled(12, 1);
        let p2 = shuffled(12, 2);

        // Whole range: child is parent1
        assert_eq!(pmx_with_cuts(&p1, &p2, 0, 11), p1);

        // Single position: one gene from parent1, rest mapped from parent2
        for a in 0..12 {
            let c = pmx_with_cuts(&p1, &p2, a, a);
            assert!(is_valid_permutation(&c, 12));
            assert_eq!(c[a], p1[a]);
        }
    }

    #[test]
    fn test_pmx_identical_parents() {
        let mut rng = create_rng(42);
        let p = vec![0, 1, 2, 3, 4];
        assert_eq!(pmx_crossover(&p, &p, &mut rng), p);
    }

    #[test]
    fn test_pmx_tiny() {
        let mut rng = create_rng(42);
        assert_eq!(pmx_crossover(&[0], &[0], &mut rng), vec![0]);
        assert!(pmx_crossover(&[], &[], &mut rng).is_empty());
        for _ in 0..20 {
            let c = pmx_crossover(&[0, 1], &[1, 0], &mut rng);
            assert!(is_valid_permutation(&c, 2));
        }
    }

    #[test]
    fn test_pmx_malformed_parent_is_caught_not_panicking() {
        let p1 = vec![0, 1, 2, 3];
        let p2 = vec![0, 0, 9, 3];
        for a in 0..4 {
            for b in a..4 {
                let c = pmx_with_cuts(&p1, &p2, a, b);
                assert_eq!(c.len(), 4);
            }
        }
        let c = pmx_with_cuts(&p1, &p2, 1, 1);
        assert!(!is_valid_permutation(&c, 4));
    }

    fn parents_and_cuts() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, usize, usize)> {
        (1usize..48).prop_flat_map(|n| {
            let base: Vec<usize> = (0..n).collect();
            (
                Just(base.clone()).prop_shuffle(),
                Just(base).prop_shuffle(),
                0..n,
                0..n,
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn prop_pmx_child_is_permutation((p1, p2, x, y) in parents_and_cuts()) {
            let (a, b) = if x <= y { (x, y) } else { (y, x) };
            let child = pmx_with_cuts(&p1, &p2, a, b);
            prop_assert!(is_valid_permutation(&child, p1.len()), "child {:?}", child);
            prop_assert_eq!(&child[a..=b], &p1[a..=b]);
        }

        #[test]
        fn prop_pmx_random_cuts_valid((p1, p2, seed, _) in parents_and_cuts()) {
            let mut rng = create_rng(seed as u64);
            let child = pmx_crossover(&p1, &p2, &mut rng);
            prop_assert!(is_valid_permutation(&child, p1.len()));
        }

        #[test]
        fn prop_pmx_outside_segment_from_parent2_when_free((p1, p2, x, y) in parents_and_cuts()) {
            let (a, b) = if x <= y { (x, y) } else { (y, x) };
            let child = pmx_with_cuts(&p1, &p2, a, b);
            // Genes of parent2 outside the segment that do not clash with
            // the copied segment keep their absolute position.
            let segment: std::collections::HashSet<usize> = p1[a..=b].iter().copied().collect();
            for i in (0..p1.len()).filter(|&i| i < a || i > b) {
                if !segment.contains(&p2[i]) {
                    prop_assert_eq!(child[i], p2[i]);
                }
            }
        }
    }

    // ---- Mutation ----

    #[test]
    fn test_invert_preserves_permutation() {
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let mut perm: Vec<usize> = (0..10).collect();
            invert_mutation(&mut perm, 1.0, &mut rng);
            assert!(is_valid_permutation(&perm, 10));
        }
    }

    #[test]
    fn test_invert_reverses_contiguous_segment() {
        let mut rng = create_rng(42);
        let original: Vec<usize> = (0..8).collect();
        for _ in 0..100 {
            let mut perm = original.clone();
            invert_mutation(&mut perm, 1.0, &mut rng);
            let diff: Vec<usize> = (0..8).filter(|&i| perm[i] != original[i]).collect();
            if let (Some(&s), Some(&e)) = (diff.first(), diff.last()) {
                let expected: Vec<usize> = (s..=e).rev().collect();
                assert_eq!(&perm[s..=e], expected.as_slice());
            }
        }
    }

    #[test]
    fn test_zero_rate_never_fires() {
        let mut rng = create_rng(42);
        let mut perm: Vec<usize> = (0..10).collect();
        for _ in 0..100 {
            assert!(!invert_mutation(&mut perm, 0.0, &mut rng));
            assert!(!swap_mutation(&mut perm, 0.0, &mut rng));
        }
        assert_eq!(perm, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_rate_is_respected() {
        let mut rng = create_rng(3);
        let mut perm: Vec<usize> = (0..10).collect();
        let fired = (0..10000)
            .filter(|_| Mutation::Inversion.apply(&mut perm, 0.25, &mut rng))
            .count();
        assert!(fired > 2200 && fired < 2800, "fired {fired}/10000");
    }

    #[test]
    fn test_swap_preserves_permutation() {
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let mut perm: Vec<usize> = (0..10).collect();
            Mutation::Swap.apply(&mut perm, 1.0, &mut rng);
            assert!(is_valid_permutation(&perm, 10));
        }
    }

    #[test]
    fn test_mutation_single_element() {
        let mut rng = create_rng(42);
        let mut perm = vec![0];
        assert!(!invert_mutation(&mut perm, 1.0, &mut rng));
        assert!(!swap_mutation(&mut perm, 1.0, &mut rng));
        assert_eq!(perm, vec![0]);
    }

    // ---- Validation / repair ----

    #[test]
    fn test_is_valid_permutation() {
        assert!(is_valid_permutation(&[2, 0, 1], 3));
        assert!(is_valid_permutation(&[], 0));
        assert!(!is_valid_permutation(&[0, 0, 1], 3));
        assert!(!is_valid_permutation(&[0, 1, 3], 3));
        assert!(!is_valid_permutation(&[0, 1], 3));
    }

    #[test]
    fn test_repair_keeps_valid_child() {
        let mut rng = create_rng(1);
        let mut child = vec![2, 0, 1, 3];
        assert_eq!(repair(&mut child, &[0, 1, 2, 3], 4, &mut rng), Repair::Intact);
        assert_eq!(child, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_repair_replaces_invalid_child() {
        let mut rng = create_rng(1);
        let mut child = vec![2, 2, 7];
        let parent = vec![1, 2, 0, 4, 3];
        assert_eq!(repair(&mut child, &parent, 5, &mut rng), Repair::Reshuffled);
        assert!(is_valid_permutation(&child, 5));
    }

    #[test]
    fn test_repair_with_malformed_parent_falls_back_to_identity() {
        let mut rng = create_rng(2);
        let mut child = vec![0, 0, 0, 0];
        let parent = vec![1, 1, 3, 3];
        assert_eq!(repair(&mut child, &parent, 4, &mut rng), Repair::Reshuffled);
        assert!(is_valid_permutation(&child, 4));

        // Wrong-length child is invalid even if its values are distinct
        let mut short = vec![1, 0];
        assert_eq!(repair(&mut short, &[0, 1, 2], 3, &mut rng), Repair::Reshuffled);
        assert!(is_valid_permutation(&short, 3));
    }

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
