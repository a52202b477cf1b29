//! Distribution and correlation statistics behind the chart views

use ndarray::{Array2, ArrayView1};
use serde::Serialize;

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }
}

/// Bin finite `values` into `bins` equal-width bins. The last bin is closed.
///
/// When every value is identical the bins span one unit centred on it.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || bins == 0 {
        return None;
    }

    let mut min_val = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min_val == max_val {
        min_val -= 0.5;
        max_val += 0.5;
    }

    let bin_width = (max_val - min_val) / bins as f64;
    let edges = (0..=bins).map(|i| min_val + i as f64 * bin_width).collect();

    let mut counts = vec![0; bins];
    for value in values {
        let bin = ((value - min_val) / bin_width).floor() as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    Some(Histogram { edges, counts })
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Gaussian kernel density estimate evaluated at `points` evenly spaced
/// positions over `[lo, hi]`, using Scott's rule for the bandwidth.
///
/// Returns `None` with fewer than two values or zero spread.
pub fn gaussian_kde(values: &[f64], points: usize, lo: f64, hi: f64) -> Option<Vec<(f64, f64)>> {
    let std = sample_std(values)?;
    if std <= 0.0 || points < 2 || lo >= hi {
        return None;
    }

    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;

    let curve = (0..points)
        .map(|i| {
            let x = lo + i as f64 * step;
            let density = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect();

    Some(curve)
}

/// Pearson correlation over the rows where both columns are finite
fn pairwise_pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Correlation matrix of the columns of `data` (rows are observations).
///
/// Non-finite cells are treated as missing; undefined coefficients are NaN.
pub fn correlation_matrix(data: &Array2<f64>) -> Array2<f64> {
    let k = data.ncols();
    let mut corr = Array2::from_elem((k, k), f64::NAN);

    for i in 0..k {
        for j in i..k {
            let r = pairwise_pearson(data.column(i), data.column(j));
            let r = if i == j && r.is_finite() { 1.0 } else { r };
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }

    corr
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_histogram_bins() {
        let hist = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, f64::NAN], 4).unwrap();
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
        assert_eq!(hist.bin_width(), 1.0);
        assert_eq!(hist.max_count(), 2);
    }

    #[test]
    fn test_histogram_single_value() {
        let hist = histogram(&[7.0, 7.0], 30).unwrap();
        let (lo, hi) = hist.range();
        assert_eq!(lo, 6.5);
        assert!((hi - 7.5).abs() < 1e-9);
        assert_eq!(hist.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], 30).is_none());
        assert!(histogram(&[f64::NAN], 30).is_none());
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 6.0];
        let curve = gaussian_kde(&values, 400, -10.0, 20.0).unwrap();
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 1e-3, "area was {}", area);
    }

    #[test]
    fn test_kde_degenerate() {
        assert!(gaussian_kde(&[1.0], 50, 0.0, 2.0).is_none());
        assert!(gaussian_kde(&[3.0, 3.0, 3.0], 50, 0.0, 5.0).is_none());
    }

    #[test]
    fn test_correlation_matrix() {
        let data = array![
            [1.0, 2.0, 5.0, 1.0],
            [2.0, 4.0, 3.0, 1.0],
            [3.0, 6.0, 1.0, 1.0],
            [f64::NAN, 1.0, 0.0, 1.0],
        ];
        let corr = correlation_matrix(&data);

        assert_eq!(corr[[0, 0]], 1.0);
        assert!((corr[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((corr[[0, 2]] + 1.0).abs() < 1e-12);
        assert_eq!(corr[[1, 0]], corr[[0, 1]]);
        // constant column
        assert!(corr[[3, 3]].is_nan());
        assert!(corr[[0, 3]].is_nan());
    }
}
