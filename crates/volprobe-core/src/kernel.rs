//! 1D Gaussian kernel used by the probe filter.

/// Default standard deviation, in voxels.
pub const DEFAULT_SIGMA: f32 = 2.0;

/// Normalized 1D Gaussian weights.
///
/// The kernel has `2 * floor(2 * sigma) + 1` taps centered on the middle
/// element, and its weights sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    sigma: f32,
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// Builds the kernel for `sigma > 0`.
    #[must_use]
    pub fn new(sigma: f32) -> Self {
        debug_assert!(sigma > 0.0, "sigma must be positive");
        let beta = 1.0 / (2.0 * sigma * sigma);
        let radius = (sigma * 2.0) as i32;

        let mut weights: Vec<f32> = (-radius..=radius)
            .map(|k| (-beta * (k * k) as f32).exp())
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self { sigma, weights }
    }

    #[must_use]
    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Number of taps on each side of the center.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weights as raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.weights)
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMA)
    }
}
