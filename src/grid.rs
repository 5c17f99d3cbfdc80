use std::ops::Index;

/// The nodata sentinel used throughout this tool. A cell either holds a
/// finite measurement or is exactly this value; no tolerance comparison is
/// ever used against it, matching the original tool's `== -9999.0` convention.
pub const NODATA: f64 = -9999.0;

/// A dense in-memory raster: 64-bit float cells plus the geospatial header
/// fields carried verbatim for round-trip output. Modeled on this codebase's
/// `Array2D`, with the addition of the header strings `Array2D` doesn't need.
#[derive(Clone, Debug)]
pub struct Grid {
    pub nrows: usize,
    pub ncols: usize,
    data: Vec<f64>,
    pub nodata: f64,
    /// Header fields preserved verbatim (not reparsed into floats) so that an
    /// unchanged round trip reproduces the exact original text.
    pub xllcorner: String,
    pub yllcorner: String,
    pub cellsize: String,
}

impl Grid {
    /// Builds a grid of the given dimensions, every cell initialized to `fill`.
    pub fn new(
        nrows: usize,
        ncols: usize,
        fill: f64,
        nodata: f64,
        xllcorner: String,
        yllcorner: String,
        cellsize: String,
    ) -> Grid {
        Grid {
            nrows,
            ncols,
            data: vec![fill; nrows * ncols],
            nodata,
            xllcorner,
            yllcorner,
            cellsize,
        }
    }

    /// Builds an output grid pre-filled with nodata, sharing the header of `other`.
    pub fn nodata_like(other: &Grid) -> Grid {
        Grid::new(
            other.nrows,
            other.ncols,
            NODATA,
            NODATA,
            other.xllcorner.clone(),
            other.yllcorner.clone(),
            other.cellsize.clone(),
        )
    }

    /// Out-of-bounds reads return nodata rather than panicking; every access
    /// inside the filter engine is guarded by the edge guard so this path is
    /// never taken there, but it keeps the type safe to index generically.
    #[inline]
    pub fn get(&self, row: isize, col: isize) -> f64 {
        if row < 0 || col < 0 || row as usize >= self.nrows || col as usize >= self.ncols {
            return self.nodata;
        }
        self.data[row as usize * self.ncols + col as usize]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.ncols + col] = value;
    }

    pub fn row_slice(&self, row: usize) -> &[f64] {
        let start = row * self.ncols;
        &self.data[start..start + self.ncols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The full flat row-major buffer, mutable. Used to hand out disjoint
    /// row-chunks to worker threads via `rayon::slice::ChunksMut` without any
    /// synchronization between them.
    pub fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(isize, isize)> for Grid {
    type Output = f64;

    fn index(&self, (row, col): (isize, isize)) -> &f64 {
        if row < 0 || col < 0 || row as usize >= self.nrows || col as usize >= self.ncols {
            return &self.nodata;
        }
        &self.data[row as usize * self.ncols + col as usize]
    }
}
