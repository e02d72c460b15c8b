//! Distance models.
//!
//! The evolutionary engine only ever *queries* distances. [`CostModel`]
//! is the seam: anything that can answer `distance(i, j)` for city
//! indices `0..len()` can drive a run. [`DistanceMatrix`] is the dense
//! row-major implementation used for Euclidean instances.

/// Read-only distance oracle over city indices `0..len()`.
///
/// Implementations must be symmetric, non-negative, and return `0.0` on
/// the diagonal. The model is shared by reference across island threads,
/// hence the `Sync` bound.
pub trait CostModel: Sync {
    /// Number of cities.
    fn len(&self) -> usize;

    /// Distance between cities `i` and `j`.
    fn distance(&self, i: usize, j: usize) -> f64;

    /// Returns `true` if the model has no cities.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the closed tour visiting `perm` in order.
    ///
    /// Includes the wrap-around edge from the last city back to the first.
    /// An empty or single-city tour has length `0.0`.
    fn tour_length(&self, perm: &[usize]) -> f64 {
        let n = perm.len();
        if n < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..n {
            total += self.distance(perm[i], perm[(i + 1) % n]);
        }
        total
    }
}

/// Dense symmetric distance matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMatrix {
    n: usize,
    dist: Vec<f64>,
}

impl DistanceMatrix {
    /// Builds the Euclidean distance matrix for planar points.
    pub fn euclidean(points: &[(f64, f64)]) -> Self {
        Self::from_fn(points.len(), |i, j| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[j];
            (x1 - x2).hypot(y1 - y2)
        })
    }

    /// Builds an `n × n` matrix from a distance function.
    ///
    /// Only the upper triangle is queried; the lower triangle is mirrored
    /// and the diagonal is forced to zero, so the result is symmetric by
    /// construction.
    pub fn from_fn<F>(n: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = f(i, j);
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        Self { n, dist }
    }

    /// Row `i` of the matrix.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.dist[i * self.n..(i + 1) * self.n]
    }
}

impl CostModel for DistanceMatrix {
    fn len(&self) -> usize {
        self.n
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        self.dist[i * self.n + j]
    }
}
