//! 2-opt local search.
//!
//! A 2-opt move removes edges `(a, b)` and `(c, d)` and reconnects the tour
//! as `(a, c)`, `(b, d)` by reversing the path between them. On Euclidean
//! instances every improving move removes a crossing.
//!
//! # References
//!
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems"

use super::types::Tour;
use crate::cost::CostModel;

/// Minimum gain for a move to count as improving.
pub const TWO_OPT_EPSILON: f64 = 1e-9;

/// Gain of the 2-opt move on positions `i < j` (negative = shorter).
#[inline]
fn move_delta<C: CostModel + ?Sized>(perm: &[usize], i: usize, j: usize, cost: &C) -> f64 {
    let n = perm.len();
    let a = perm[i];
    let b = perm[i + 1];
    let c = perm[j];
    let d = perm[(j + 1) % n];
    cost.distance(a, c) + cost.distance(b, d) - cost.distance(a, b) - cost.distance(c, d)
}

/// First-improvement 2-opt until no improving move remains.
///
/// Scans position pairs `i < j` with `j >= i + 2` (edge `(perm[j],
/// perm[j+1 mod n])` wraps to the start); the pair `(0, n-1)` shares city
/// `perm[0]` and is skipped. The first move with gain below
/// `-TWO_OPT_EPSILON` reverses `perm[i+1..=j]` and the scan restarts.
///
/// Recomputes `tour.fitness` on exit and returns the number of moves
/// applied.
///
/// # Complexity
/// O(n²) per scan; the number of scans is not polynomially bounded in the
/// worst case, so callers apply this to a few tours only.
pub fn two_opt<C: CostModel + ?Sized>(tour: &mut Tour, cost: &C) -> usize {
    let n = tour.perm.len();
    let mut moves = 0;

    if n >= 4 {
        'scan: loop {
            for i in 0..n - 2 {
                for j in (i + 2)..n {
                    if i == 0 && j == n - 1 {
                        continue;
                    }
                    if move_delta(&tour.perm, i, j, cost) < -TWO_OPT_EPSILON {
                        tour.perm[i + 1..=j].reverse();
                        moves += 1;
                        continue 'scan;
                    }
                }
            }
            break;
        }
    }

    tour.evaluate(cost);
    moves
}

/// Returns `true` if no single 2-opt move improves `perm`.
pub fn is_two_opt_optimal<C: CostModel + ?Sized>(perm: &[usize], cost: &C) -> bool {
    let n = perm.len();
    if n < 4 {
        return true;
    }
    for i in 0..n - 2 {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if move_delta(perm, i, j, cost) < -TWO_OPT_EPSILON {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::DistanceMatrix;
    use crate::ga::operators::is_valid_permutation;
    use crate::random::create_rng;
    use rand::Rng;

    fn random_points(n: usize, seed: u64) -> DistanceMatrix {
        let mut rng = create_rng(seed);
        let pts: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        DistanceMatrix::euclidean(&pts)
    }

    #[test]
    fn test_uncrosses_square() {
        let m = DistanceMatrix::euclidean(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let mut t = Tour::from_perm(vec![0, 2, 1, 3]);
        let moves = two_opt(&mut t, &m);
        assert!(moves >= 1);
        assert!((t.fitness - 4.0).abs() < 1e-9);
        assert!(is_valid_permutation(&t.perm, 4));
    }

    #[test]
    fn test_never_worse_and_locally_optimal() {
        for seed in 0..20 {
            let m = random_points(30, seed);
            let mut rng = create_rng(seed + 100);
            let mut t = Tour::new(30);
            t.randomize(&mut rng);
            let before = t.evaluate(&m);

            two_opt(&mut t, &m);

            assert!(t.fitness <= before + 1e-9, "2-opt worsened {before} -> {}", t.fitness);
            assert!(is_valid_permutation(&t.perm, 30));
            assert!(is_two_opt_optimal(&t.perm, &m));
            assert!((t.fitness - m.tour_length(&t.perm)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_optimal_tour_untouched() {
        // Points on a circle in order: already optimal
        let pts: Vec<(f64, f64)> = (0..12)
            .map(|k| {
                let a = k as f64 * std::f64::consts::TAU / 12.0;
                (a.cos(), a.sin())
            })
            .collect();
        let m = DistanceMatrix::euclidean(&pts);
        let mut t = Tour::from_perm((0..12).collect());
        assert_eq!(two_opt(&mut t, &m), 0);
        assert_eq!(t.perm, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_tours_only_evaluated() {
        let m = random_points(3, 1);
        let mut t = Tour::from_perm(vec![2, 0, 1]);
        assert_eq!(two_opt(&mut t, &m), 0);
        assert!((t.fitness - m.tour_length(&[2, 0, 1])).abs() < 1e-12);
    }
}
