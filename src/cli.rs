//! Command-line argument parsing.
//!
//! Grounded on the standalone-binary CLI pattern used by this codebase's
//! plugin binaries (positional arguments, no flag parser dependency, `-h`/
//! `--help` and `-v`/`--version` short-circuits handled before anything else).

use crate::aggregate::Aggregate;
use crate::error::{FilterError, Result};

pub const USAGE: &str = "\
usage: filter <input.asc> <radius> <code> <output.asc> [coverage]

  input.asc   path to an ArcInfo/Esri ASCII grid
  radius      neighborhood radius in cells (non-negative, may be fractional)
  code        aggregate: m(ean) s(um) f(loor/min) c(eiling/max)
  output.asc  path to write the filtered grid
  coverage    optional minimum fraction [0.0, 1.0] of the window that must be
              valid data for a cell to be computed (default 1.0)
";

/// The fully parsed, not-yet-validated command line.
#[derive(Debug, Clone)]
pub struct Args {
    pub input_path: String,
    pub radius: f64,
    pub aggregate: Aggregate,
    pub output_path: String,
    pub coverage: f64,
}

pub fn parse(raw: &[String]) -> Result<Args> {
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        return Err(FilterError::Usage(USAGE.to_string()));
    }
    if raw.iter().any(|a| a == "-v" || a == "--version") {
        return Err(FilterError::Usage(format!("filter {}", env!("CARGO_PKG_VERSION"))));
    }

    if raw.len() != 4 && raw.len() != 5 {
        return Err(FilterError::Usage(format!(
            "expected 4 or 5 arguments, got {}\n\n{}",
            raw.len(),
            USAGE
        )));
    }

    let input_path = raw[0].clone();
    let radius: f64 = raw[1]
        .parse()
        .map_err(|_| FilterError::Usage(format!("radius '{}' is not a number", raw[1])))?;
    let aggregate = Aggregate::from_code(&raw[2])?;
    let output_path = raw[3].clone();
    let coverage: f64 = if raw.len() == 5 {
        raw[4]
            .parse()
            .map_err(|_| FilterError::Usage(format!("coverage '{}' is not a number", raw[4])))?
    } else {
        1.0
    };

    Ok(Args { input_path, radius, aggregate, output_path, coverage })
}
