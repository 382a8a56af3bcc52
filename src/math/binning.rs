//! Bin-averaging a sampled curve down to a coarser resolution.
//!
//! Two bin partitions of width `resolution` are laid over the samples, offset
//! from each other by one bin:
//!
//! ```text
//! edges  = w0 - r/2, w0 + r/2, w0 + 3r/2, ...   (up to wN + r/2 + r, exclusive)
//! left   = edges[..n-1]
//! right  = edges[1..]
//! ```
//!
//! The mean of each partition's bins is averaged element-wise. The result is
//! labelled at the boundary shared by the two bins (`edges[1..n-1]`). A single
//! partition would bias values near the edges of a bin; the double pass
//! centres every output on its label.
//!
//! Bins are half-open `[a, b)` except the last bin of each partition, which is
//! closed. The trailing bin of the right partition can fall past the last
//! sample; an empty bin defers to the other partition's mean, and only a
//! label where both bins are empty is `NaN`.

use crate::error::{PwvError, Result};

/// A binned curve: `values[i]` belongs to `wavelengths[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    pub wavelengths: Vec<f64>,
    pub values: Vec<f64>,
}

/// Bin `values` sampled at ascending `wavelengths` to `resolution`.
///
/// Fails with `InvalidResolution` unless `resolution` is coarser than the
/// smallest spacing in `wavelengths`.
pub fn bin_average(values: &[f64], wavelengths: &[f64], resolution: f64) -> Result<Binned> {
    let edges = bin_edges(wavelengths, resolution)?;
    if values.len() != wavelengths.len() {
        return Err(PwvError::MalformedDimensions(format!(
            "{} values for {} wavelengths",
            values.len(),
            wavelengths.len()
        )));
    }

    Ok(average_partitions(values, wavelengths, &edges))
}

/// Bin several curves sharing one wavelength grid (one output row per input row).
pub fn bin_average_rows(rows: &[Vec<f64>], wavelengths: &[f64], resolution: f64) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
    let edges = bin_edges(wavelengths, resolution)?;
    let mut binned_rows = Vec::with_capacity(rows.len());
    let mut centers = edges[1..edges.len().saturating_sub(1)].to_vec();

    for row in rows {
        if row.len() != wavelengths.len() {
            return Err(PwvError::MalformedDimensions(format!(
                "{} values for {} wavelengths",
                row.len(),
                wavelengths.len()
            )));
        }
        let binned = average_partitions(row, wavelengths, &edges);
        centers = binned.wavelengths;
        binned_rows.push(binned.values);
    }

    Ok((centers, binned_rows))
}

fn bin_edges(wavelengths: &[f64], resolution: f64) -> Result<Vec<f64>> {
    if wavelengths.len() < 2 {
        return Err(PwvError::MalformedDimensions(
            "binning requires at least two sampled wavelengths".into(),
        ));
    }

    let min_spacing = wavelengths
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);

    if !(resolution > min_spacing) {
        return Err(PwvError::InvalidResolution {
            resolution,
            min_spacing,
        });
    }

    let half = resolution / 2.0;
    let start = wavelengths[0] - half;
    let stop = wavelengths[wavelengths.len() - 1] + half + resolution;
    let count = ((stop - start) / resolution).ceil() as usize;

    Ok((0..count).map(|k| start + k as f64 * resolution).collect())
}

fn average_partitions(values: &[f64], wavelengths: &[f64], edges: &[f64]) -> Binned {
    let n = edges.len();
    if n < 3 {
        return Binned {
            wavelengths: Vec::new(),
            values: Vec::new(),
        };
    }

    let left = bin_means(values, wavelengths, &edges[..n - 1]);
    let right = bin_means(values, wavelengths, &edges[1..]);

    Binned {
        wavelengths: edges[1..n - 1].to_vec(),
        values: left.iter().zip(&right).map(|(&l, &r)| combine(l, r)).collect(),
    }
}

fn combine(left: f64, right: f64) -> f64 {
    match (left.is_nan(), right.is_nan()) {
        (false, false) => (left + right) / 2.0,
        (true, false) => right,
        (false, true) => left,
        (true, true) => f64::NAN,
    }
}

/// Mean of `values` falling in each bin defined by `edges`.
fn bin_means(values: &[f64], wavelengths: &[f64], edges: &[f64]) -> Vec<f64> {
    let n_bins = edges.len() - 1;
    let last = edges[n_bins];
    let mut sums = vec![0.0; n_bins];
    let mut counts = vec![0usize; n_bins];

    for (&w, &v) in wavelengths.iter().zip(values) {
        if w < edges[0] || w > last {
            continue;
        }
        let bin = if w == last {
            n_bins - 1
        } else {
            edges.partition_point(|&e| e <= w) - 1
        };
        sums[bin] += v;
        counts[bin] += 1;
    }

    sums.iter()
        .zip(&counts)
        .map(|(&s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> Vec<f64> {
        (0..10).map(f64::from).collect()
    }

    #[test]
    fn labels_follow_requested_resolution() {
        let wave = unit_grid();
        let binned = bin_average(&vec![1.0; 10], &wave, 3.0).unwrap();
        assert_eq!(binned.wavelengths, vec![1.5, 4.5, 7.5]);
    }

    #[test]
    fn labels_track_shifted_wavelengths() {
        let wave: Vec<f64> = unit_grid().iter().map(|w| w + 100.0).collect();
        let binned = bin_average(&vec![1.0; 10], &wave, 3.0).unwrap();
        assert_eq!(binned.wavelengths, vec![101.5, 104.5, 107.5]);
    }

    #[test]
    fn constant_curve_stays_constant() {
        let wave: Vec<f64> = (0..200).map(|i| 3000.0 + 0.5 * i as f64).collect();
        for resolution in [0.75, 2.0, 7.5, 25.0] {
            let binned = bin_average(&vec![0.42; wave.len()], &wave, resolution).unwrap();
            assert!(!binned.values.is_empty());
            for v in &binned.values {
                assert!((v - 0.42).abs() < 1e-12, "resolution {resolution}: got {v}");
            }
        }
    }

    #[test]
    fn averages_both_partitions() {
        // Left bins: [-1.5,1.5) [1.5,4.5) [4.5,7.5]; right bins: [1.5,4.5) [4.5,7.5) [7.5,10.5]
        let wave = unit_grid();
        let values = unit_grid();
        let binned = bin_average(&values, &wave, 3.0).unwrap();
        assert!((binned.values[0] - (0.5 + 3.0) / 2.0).abs() < 1e-12);
        assert!((binned.values[1] - (3.0 + 6.0) / 2.0).abs() < 1e-12);
        assert!((binned.values[2] - (6.0 + 8.5) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_trailing_bin_defers_to_other_partition() {
        // 9 / 4 is not integral, so the last right-hand bin starts past w = 9.
        let wave = unit_grid();
        let binned = bin_average(&vec![2.0; 10], &wave, 4.0).unwrap();
        assert!(binned.values.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn finer_resolution_than_sampling_is_rejected() {
        let err = bin_average(&vec![1.0; 10], &unit_grid(), 0.01).unwrap_err();
        assert!(matches!(err, PwvError::InvalidResolution { .. }));

        let err = bin_average(&vec![1.0; 10], &unit_grid(), 1.0).unwrap_err();
        assert!(matches!(err, PwvError::InvalidResolution { .. }));
    }

    #[test]
    fn rows_share_output_grid() {
        let wave = unit_grid();
        let rows = vec![vec![1.0; 10], vec![0.5; 10]];
        let (centers, binned) = bin_average_rows(&rows, &wave, 3.0).unwrap();
        assert_eq!(centers, vec![1.5, 4.5, 7.5]);
        assert!(binned[1].iter().all(|v| (v - 0.5).abs() < 1e-12));
    }
}
