//! Change detection between two classified rasters
//!
//! Cell-by-cell comparison of two maps of the same grid (e.g. land cover
//! at two dates). The result is a binary map, 1 where the value changed
//! and 0 where it did not, plus changed / total pixel counts.

use crate::maybe_rayon::*;
use coopaccess_core::raster::{Raster, RasterElement};
use coopaccess_core::{Algorithm, Error, Result};
use ndarray::Array2;
use serde::Serialize;
use tracing::info;

/// Output value for a changed cell
pub const CHANGED: u8 = 1;
/// Output value for an unchanged (or ignored) cell
pub const UNCHANGED: u8 = 0;

/// Parameters for change detection
#[derive(Debug, Clone, Default)]
pub struct ChangeParams {
    /// Skip cells that are no-data in either input: they are written as
    /// unchanged and left out of `total_pixels` (default: false)
    pub ignore_nodata: bool,
}

/// Binary change map with its statistics
#[derive(Debug, Clone)]
pub struct ChangeDetection {
    /// 1 = changed, 0 = unchanged; same grid as the inputs
    pub map: Raster<u8>,
    pub statistics: ChangeStatistics,
}

/// Changed-cell counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeStatistics {
    pub changed_pixels: usize,
    pub total_pixels: usize,
    /// `changed / total * 100`, 0 for an empty comparison
    pub change_percentage: f64,
}

impl ChangeStatistics {
    fn new(changed_pixels: usize, total_pixels: usize) -> Self {
        let change_percentage = if total_pixels == 0 {
            0.0
        } else {
            changed_pixels as f64 / total_pixels as f64 * 100.0
        };
        Self {
            changed_pixels,
            total_pixels,
            change_percentage,
        }
    }
}

/// Compare two rasters cell by cell.
///
/// Float NaN never equals itself, so a NaN cell counts as changed unless
/// `ignore_nodata` is set.
///
/// # Errors
/// `RasterMismatch` when the rasters differ in size, geotransform or
/// (when both declare one) projection.
pub fn change_detection<T: RasterElement>(
    before: &Raster<T>,
    after: &Raster<T>,
    params: ChangeParams,
) -> Result<ChangeDetection> {
    before.check_same_grid(after)?;
    let (rows, cols) = before.shape();

    let row_results: Vec<(Vec<u8>, usize, usize)> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut out = Vec::with_capacity(cols);
            let mut changed = 0;
            let mut counted = 0;
            for col in 0..cols {
                let a = unsafe { before.get_unchecked(row, col) };
                let b = unsafe { after.get_unchecked(row, col) };

                if params.ignore_nodata && (before.is_nodata(a) || after.is_nodata(b)) {
                    out.push(UNCHANGED);
                    continue;
                }

                counted += 1;
                if a != b {
                    changed += 1;
                    out.push(CHANGED);
                } else {
                    out.push(UNCHANGED);
                }
            }
            (out, changed, counted)
        })
        .collect();

    let mut data = Vec::with_capacity(rows * cols);
    let mut changed_pixels = 0;
    let mut total_pixels = 0;
    for (row, changed, counted) in row_results {
        data.extend(row);
        changed_pixels += changed;
        total_pixels += counted;
    }

    let mut map = before.with_same_meta::<u8>(rows, cols);
    *map.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    let statistics = ChangeStatistics::new(changed_pixels, total_pixels);
    info!(
        changed = statistics.changed_pixels,
        total = statistics.total_pixels,
        "Percentage changed: {:.2}%",
        statistics.change_percentage
    );

    Ok(ChangeDetection { map, statistics })
}

/// Change detection algorithm
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector;

impl Algorithm for ChangeDetector {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = ChangeDetection;
    type Params = ChangeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "LandCoverChangeDetector"
    }

    fn description(&self) -> &'static str {
        "Binary change map between two classified rasters"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (before, after) = input;
        change_detection(&before, &after, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use coopaccess_core::{GeoTransform, CRS};

    fn classes(values: Vec<u8>, rows: usize, cols: usize) -> Raster<u8> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(300_000.0, 9_900_000.0, 30.0, -30.0));
        r
    }

    #[test]
    fn test_identical_rasters() {
        let a = classes(vec![1, 2, 3, 4, 5, 6], 2, 3);
        let result = change_detection(&a, &a.clone(), ChangeParams::default()).unwrap();

        assert_eq!(result.statistics.changed_pixels, 0);
        assert_eq!(result.statistics.total_pixels, 6);
        assert_eq!(result.statistics.change_percentage, 0.0);
        assert!(result.map.data().iter().all(|&v| v == UNCHANGED));
    }

    #[test]
    fn test_all_different() {
        let a = classes(vec![1; 12], 3, 4);
        let b = classes(vec![2; 12], 3, 4);
        let result = change_detection(&a, &b, ChangeParams::default()).unwrap();

        assert_eq!(result.statistics.changed_pixels, 12);
        assert_relative_eq!(result.statistics.change_percentage, 100.0);
        assert!(result.map.data().iter().all(|&v| v == CHANGED));
    }

    #[test]
    fn test_partial_change_keeps_grid() {
        let mut a = classes(vec![1, 1, 2, 2], 2, 2);
        a.set_crs(Some(CRS::from_epsg(32736)));
        let b = classes(vec![1, 3, 2, 4], 2, 2);
        let result = change_detection(&a, &b, ChangeParams::default()).unwrap();

        assert_eq!(result.map.get(0, 1).unwrap(), CHANGED);
        assert_eq!(result.map.get(1, 0).unwrap(), UNCHANGED);
        assert_relative_eq!(result.statistics.change_percentage, 50.0);
        assert_eq!(result.map.transform(), a.transform());
        assert_eq!(result.map.crs().and_then(|c| c.epsg()), Some(32736));
    }

    #[test]
    fn test_mismatched_rasters() {
        let a = classes(vec![1; 6], 2, 3);
        let b = classes(vec![1; 6], 3, 2);
        assert!(matches!(
            change_detection(&a, &b, ChangeParams::default()),
            Err(Error::RasterMismatch(_))
        ));

        let mut c = classes(vec![1; 6], 2, 3);
        c.set_transform(GeoTransform::new(0.0, 0.0, 30.0, -30.0));
        assert!(matches!(
            change_detection(&a, &c, ChangeParams::default()),
            Err(Error::RasterMismatch(_))
        ));
    }

    #[test]
    fn test_empty_raster() {
        let a: Raster<u8> = Raster::new(0, 0);
        let result = change_detection(&a, &a.clone(), ChangeParams::default()).unwrap();
        assert_eq!(result.statistics.total_pixels, 0);
        assert_eq!(result.statistics.change_percentage, 0.0);
    }

    #[test]
    fn test_ignore_nodata() {
        let mut a = classes(vec![0, 1, 1, 1], 2, 2);
        a.set_nodata(Some(0));
        let b = classes(vec![5, 2, 1, 1], 2, 2);

        let counted = change_detection(&a, &b, ChangeParams::default()).unwrap();
        assert_eq!(counted.statistics.changed_pixels, 2);

        let ignored = change_detection(&a, &b, ChangeParams { ignore_nodata: true }).unwrap();
        assert_eq!(ignored.statistics.changed_pixels, 1);
        assert_eq!(ignored.statistics.total_pixels, 3);
        assert_eq!(ignored.map.get(0, 0).unwrap(), UNCHANGED);
    }

    #[test]
    fn test_float_nan_counts_as_change() {
        let a = Raster::from_vec(vec![1.0, f64::NAN], 1, 2).unwrap();
        let result = ChangeDetector.execute_default((a.clone(), a)).unwrap();
        assert_eq!(result.statistics.changed_pixels, 1);
    }
}
