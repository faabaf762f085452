//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// Coefficient tolerance used when deciding that two rasters share a grid.
const GRID_TOLERANCE: f64 = 1e-9;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a row-major 2D grid with
/// associated geographic metadata (transform, CRS, no-data value).
///
/// # Example
///
/// ```ignore
/// use coopaccess_core::Raster;
///
/// let mut landcover: Raster<u8> = Raster::new(100, 100);
/// landcover.set(10, 20, 3)?;
/// let class = landcover.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a zeroed raster with the same georeferencing but another cell type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Verify that `other` covers exactly the same grid: dimensions,
    /// geotransform and (when both declare one) CRS.
    pub fn check_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::RasterMismatch(format!(
                "dimensions {}x{} vs {}x{}",
                self.cols(),
                self.rows(),
                other.cols(),
                other.rows()
            )));
        }
        if !self.transform.approx_eq(other.transform(), GRID_TOLERANCE) {
            return Err(Error::RasterMismatch(format!(
                "geotransform {:?} vs {:?}",
                self.transform,
                other.transform()
            )));
        }
        if let (Some(a), Some(b)) = (self.crs(), other.crs()) {
            if !a.is_equivalent(b) {
                return Err(Error::RasterMismatch(format!("projection {} vs {}", a, b)));
            }
        }
        Ok(())
    }

    /// Calculate basic statistics (min, max, mean, count of valid cells)
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            min = match min {
                Some(m) if m <= value => Some(m),
                _ => Some(value),
            };
            max = match max {
                Some(m) if m >= value => Some(m),
                _ => Some(value),
            };

            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        let mean = if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        };

        RasterStatistics {
            min,
            max,
            mean,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<u8> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<u8> = Raster::new(10, 10);
        raster.set(5, 5, 4).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 4);
        assert!(raster.get(10, 0).is_err());
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let result = Raster::<u8>::from_vec(vec![1, 2, 3], 2, 2);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_raster_statistics_skips_nodata() {
        let mut raster = Raster::from_vec(vec![0u8, 1, 2, 3, 4, 5], 2, 3).unwrap();
        raster.set_nodata(Some(0));

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1));
        assert_eq!(stats.max, Some(5));
        assert_eq!(stats.valid_count, 5);
        assert_eq!(stats.nodata_count, 1);
    }

    #[test]
    fn test_check_same_grid() {
        let mut a: Raster<u8> = Raster::new(4, 4);
        a.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        let mut b: Raster<u8> = Raster::new(4, 4);
        b.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        assert!(a.check_same_grid(&b).is_ok());

        b.set_transform(GeoTransform::new(2.0, 4.0, 1.0, -1.0));
        assert!(matches!(a.check_same_grid(&b), Err(Error::RasterMismatch(_))));

        let c: Raster<u8> = Raster::new(4, 5);
        assert!(matches!(a.check_same_grid(&c), Err(Error::RasterMismatch(_))));
    }

    #[test]
    fn test_check_same_grid_crs() {
        let mut a: Raster<u8> = Raster::new(2, 2);
        let mut b: Raster<u8> = Raster::new(2, 2);
        a.set_crs(Some(CRS::from_epsg(32630)));
        assert!(a.check_same_grid(&b).is_ok(), "missing CRS is not a mismatch");

        b.set_crs(Some(CRS::from_epsg(32631)));
        assert!(a.check_same_grid(&b).is_err());
    }
}
