//! ArcInfo/Esri ASCII grid reader and writer.
//!
//! Grounded on this codebase's `arcascii_raster` reader/writer: header
//! keywords are located by case-insensitive match rather than fixed column
//! position, and the body is a flat whitespace-delimited token stream.
//! Unlike the original, every failure mode returns a `FilterError` instead of
//! `unwrap()`-ing the parse.

use crate::error::{FilterError, Result};
use crate::grid::{Grid, NODATA};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const REQUIRED_KEYS: [&str; 6] = ["ncols", "nrows", "xllcorner", "yllcorner", "cellsize", "nodata_value"];

/// A generous cap on `nrows * ncols`, chosen so a well-formed header never
/// trips it but a corrupted or malicious one (e.g. a header claiming
/// billions of columns) fails fast with `GridTooLarge` instead of driving an
/// attempted allocation of hundreds of gigabytes.
const MAX_GRID_CELLS: usize = 500_000_000;

pub fn read_arcascii<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let contents = fs::read_to_string(path.as_ref())?;
    let mut tokens = contents.split_whitespace();

    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut xllcorner: Option<String> = None;
    let mut yllcorner: Option<String> = None;
    let mut cellsize: Option<String> = None;
    let mut nodata_value: Option<f64> = None;

    let header_complete = |ncols: &Option<usize>,
                            nrows: &Option<usize>,
                            xllcorner: &Option<String>,
                            yllcorner: &Option<String>,
                            cellsize: &Option<String>,
                            nodata_value: &Option<f64>| {
        ncols.is_some()
            && nrows.is_some()
            && xllcorner.is_some()
            && yllcorner.is_some()
            && cellsize.is_some()
            && nodata_value.is_some()
    };

    while !header_complete(&ncols, &nrows, &xllcorner, &yllcorner, &cellsize, &nodata_value) {
        let key = tokens.next().ok_or_else(|| {
            FilterError::BadHeader(format!(
                "file ended before all required header keys were found ({})",
                REQUIRED_KEYS.join(", ")
            ))
        })?;
        let key_lc = key.to_lowercase();
        let value = tokens.next().ok_or_else(|| {
            FilterError::BadHeader(format!("header key '{}' has no value", key))
        })?;

        match key_lc.as_str() {
            "ncols" => {
                ncols = Some(value.parse::<usize>().map_err(|_| {
                    FilterError::BadHeader(format!("ncols value '{}' is not an integer", value))
                })?);
            }
            "nrows" => {
                nrows = Some(value.parse::<usize>().map_err(|_| {
                    FilterError::BadHeader(format!("nrows value '{}' is not an integer", value))
                })?);
            }
            "xllcorner" => xllcorner = Some(value.to_string()),
            "yllcorner" => yllcorner = Some(value.to_string()),
            "cellsize" => cellsize = Some(value.to_string()),
            "nodata_value" => {
                nodata_value = Some(value.parse::<f64>().map_err(|_| {
                    FilterError::BadHeader(format!("nodata_value '{}' is not a number", value))
                })?);
            }
            other => {
                return Err(FilterError::BadHeader(format!(
                    "unrecognized header keyword '{}'",
                    other
                )));
            }
        }
    }

    let nrows = nrows.unwrap();
    let ncols = ncols.unwrap();
    let source_nodata = nodata_value.unwrap();

    let expected = nrows.checked_mul(ncols).filter(|&cells| cells <= MAX_GRID_CELLS).ok_or(
        FilterError::GridTooLarge { rows: nrows, columns: ncols, max_cells: MAX_GRID_CELLS },
    )?;

    let mut data = Vec::with_capacity(expected);
    for tok in tokens.by_ref() {
        if data.len() == expected {
            break;
        }
        let v: f64 = tok
            .parse()
            .map_err(|_| FilterError::BadHeader(format!("body token '{}' is not a number", tok)))?;
        data.push(v);
    }

    if data.len() < expected {
        return Err(FilterError::TruncatedBody { expected, found: data.len() });
    }

    // Reader policy: normalize the sentinel to NODATA regardless of what the
    // source file declared, so downstream code can always compare against the
    // one canonical value.
    if source_nodata != NODATA {
        for v in data.iter_mut() {
            if *v == source_nodata {
                *v = NODATA;
            }
        }
    }

    let mut grid = Grid::new(
        nrows,
        ncols,
        0.0,
        NODATA,
        xllcorner.unwrap(),
        yllcorner.unwrap(),
        cellsize.unwrap(),
    );
    for (i, v) in data.into_iter().enumerate() {
        let row = i / ncols;
        let col = i % ncols;
        grid.set(row, col, v);
    }
    Ok(grid)
}

pub fn write_arcascii<P: AsRef<Path>>(path: P, grid: &Grid) -> Result<()> {
    let f = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(f);

    writeln!(writer, "ncols {}", grid.ncols)?;
    writeln!(writer, "nrows {}", grid.nrows)?;
    writeln!(writer, "xllcorner {}", grid.xllcorner)?;
    writeln!(writer, "yllcorner {}", grid.yllcorner)?;
    writeln!(writer, "cellsize {}", grid.cellsize)?;
    writeln!(writer, "NODATA_value {}", NODATA)?;

    for row in 0..grid.nrows {
        let slice = grid.row_slice(row);
        let mut line = String::with_capacity(slice.len() * 8);
        for (i, v) in slice.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&v.to_string());
        }
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}
