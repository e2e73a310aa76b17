//! Gauss-Legendre quadrature on [0, 1].

use nec_core::Real;

/// Nodes and weights mapped to the unit interval.
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    pub nodes: Vec<Real>,
    pub weights: Vec<Real>,
}

impl GaussLegendre {
    /// Rule with `n` points (n >= 1), from Newton iteration on P_n.
    pub fn new(n: usize) -> Self {
        let n = n.max(1);
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let m = n.div_ceil(2);
        for i in 0..m {
            // Chebyshev initial guess
            let mut x = (core::f64::consts::PI * (i as Real + 0.75) / (n as Real + 0.5)).cos();
            for _ in 0..100 {
                let (p, d) = legendre(n, x);
                let dx = p / d;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre(n, x);
            let w = 2.0 / ((1.0 - x * x) * dp * dp);
            // Map [-1, 1] -> [0, 1]
            nodes[i] = 0.5 * (1.0 - x);
            nodes[n - 1 - i] = 0.5 * (1.0 + x);
            weights[i] = 0.5 * w;
            weights[n - 1 - i] = 0.5 * w;
        }
        Self { nodes, weights }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate (node, weight) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Real, Real)> + '_ {
        self.nodes.iter().copied().zip(self.weights.iter().copied())
    }
}

/// P_n(x) and its derivative.
fn legendre(n: usize, x: Real) -> (Real, Real) {
    let mut p0 = 1.0;
    let mut p1 = x;
    for k in 2..=n {
        let k = k as Real;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    if n == 0 {
        return (1.0, 0.0);
    }
    let d = n as Real * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}
