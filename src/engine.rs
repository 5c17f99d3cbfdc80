//! The filter driver: validates parameters, builds the mask and edge lists,
//! computes the usable interior, and dispatches rows to worker threads.

use crate::aggregate::Aggregate;
use crate::config::RunSettings;
use crate::edge_lists::EdgeLists;
use crate::error::{FilterError, Result};
use crate::grid::{Grid, NODATA};
use crate::mask::CircularMask;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The validated set of user-facing parameters for one filter run.
#[derive(Clone, Copy, Debug)]
pub struct FilterConfig {
    pub radius: f64,
    pub aggregate: Aggregate,
    pub coverage_min: f64,
}

impl FilterConfig {
    pub fn new(radius: f64, aggregate: Aggregate, coverage_min: f64) -> Result<FilterConfig> {
        if !(0.0..=1.0).contains(&coverage_min) || !coverage_min.is_finite() {
            return Err(FilterError::Usage(format!(
                "coverage must be between 0.0 and 1.0, got {}",
                coverage_min
            )));
        }
        Ok(FilterConfig { radius, aggregate, coverage_min })
    }
}

/// Owns the immutable mask/edge-list state derived from a `FilterConfig` and
/// drives the parallel sliding-window pass over a `Grid`.
pub struct FilterEngine {
    mask: CircularMask,
    edges: EdgeLists,
    aggregate: Aggregate,
    required_count: usize,
    edge_guard: usize,
}

impl FilterEngine {
    pub fn new(config: &FilterConfig) -> Result<FilterEngine> {
        let mask = CircularMask::new(config.radius)?;
        let edges = EdgeLists::from_mask(&mask);
        let required_count = (config.coverage_min * mask.mask_sum as f64).ceil() as usize;
        let edge_guard = mask.edge_guard();
        Ok(FilterEngine { mask, edges, aggregate: config.aggregate, required_count, edge_guard })
    }

    pub fn edge_guard(&self) -> usize {
        self.edge_guard
    }

    pub fn mask_sum(&self) -> usize {
        self.mask.mask_sum
    }

    /// Runs the filter over `input`, returning a freshly allocated output
    /// grid of the same shape, pre-filled with nodata outside the processed
    /// interior.
    pub fn run(&self, input: &Grid, settings: &RunSettings) -> Result<Grid> {
        let row_start = self.edge_guard;
        let row_end = input.nrows.saturating_sub(self.edge_guard);
        let col_start = self.edge_guard;
        let col_end = input.ncols.saturating_sub(self.edge_guard);

        if row_start >= row_end || col_start >= col_end {
            return Err(FilterError::GridTooSmall {
                edge_guard: self.edge_guard,
                rows: input.nrows,
                columns: input.ncols,
            });
        }

        let mut output = Grid::nodata_like(input);
        let ncols = input.ncols;
        let chunk_rows = settings.chunk_size.max(1);
        let total_rows = row_end - row_start;
        let completed = AtomicUsize::new(0);
        let last_percent_printed = AtomicUsize::new(usize::MAX);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.resolved_num_threads())
            .build()
            .map_err(|e| FilterError::Usage(format!("failed to start worker pool: {}", e)))?;

        pool.install(|| {
            output
                .as_slice_mut()
                .par_chunks_mut(ncols * chunk_rows)
                .enumerate()
                .for_each(|(chunk_idx, chunk)| {
                    let chunk_first_row = chunk_idx * chunk_rows;
                    let rows_in_chunk = chunk.len() / ncols;
                    for local_row in 0..rows_in_chunk {
                        let row = chunk_first_row + local_row;
                        if row < row_start || row >= row_end {
                            continue;
                        }
                        let out_row = &mut chunk[local_row * ncols..local_row * ncols + ncols];
                        self.compute_row(input, row, col_start, col_end, out_row);

                        if settings.verbose {
                            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            let percent = (100 * done) / total_rows.max(1);
                            let prev = last_percent_printed.swap(percent, Ordering::Relaxed);
                            if prev != percent {
                                println!("Progress: {}%", percent);
                            }
                        }
                    }
                });
        });

        Ok(output)
    }

    /// Computes one output row using the seed-then-shift sliding window.
    fn compute_row(&self, input: &Grid, row: usize, col_start: usize, col_end: usize, out_row: &mut [f64]) {
        let row_i = row as isize;
        let mut state = self.aggregate.fresh_state();
        let mut coverage_count = 0usize;

        self.seed(input, row_i, col_start as isize, &mut state, &mut coverage_count);
        out_row[col_start] = self.emit(&state, coverage_count);

        for col in (col_start + 1)..col_end {
            let col_i = col as isize;
            let mut recompute = false;

            for k in 0..self.edges.len() {
                let t = self.edges.trailing[k];
                let (tr, tc) = (row_i + t.di, col_i + t.dj);
                let tval = input[(tr, tc)];
                if tval != NODATA {
                    coverage_count -= 1;
                    if state.retire(tval, tr, tc) {
                        recompute = true;
                    }
                }

                let l = self.edges.leading[k];
                let (lr, lc) = (row_i + l.di, col_i + l.dj);
                let lval = input[(lr, lc)];
                if lval != NODATA {
                    coverage_count += 1;
                    if !recompute {
                        state.admit(lval, lr, lc);
                    }
                }
            }

            if recompute {
                state.reset();
                coverage_count = 0;
                self.seed(input, row_i, col_i, &mut state, &mut coverage_count);
            }

            out_row[col] = self.emit(&state, coverage_count);
        }
    }

    /// A full window scan at `(row, col)`, used both for the leftmost column
    /// of a row and for a Min/Max reseed mid-row.
    fn seed(
        &self,
        input: &Grid,
        row: isize,
        col: isize,
        state: &mut crate::aggregate::AggregatorState,
        coverage_count: &mut usize,
    ) {
        let side = self.mask.side();
        let center = self.mask.center() as isize;
        for i in 0..side {
            let i_in = row + (i as isize - center);
            for j in 0..side {
                if !self.mask.included(i, j) {
                    continue;
                }
                let j_in = col + (j as isize - center);
                let v = input[(i_in, j_in)];
                if v != NODATA {
                    *coverage_count += 1;
                    state.admit(v, i_in, j_in);
                }
            }
        }
    }

    fn emit(&self, state: &crate::aggregate::AggregatorState, coverage_count: usize) -> f64 {
        if coverage_count > 0 && coverage_count >= self.required_count {
            state.value(self.aggregate, coverage_count)
        } else {
            NODATA
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&[f64]]) -> Grid {
        let nrows = rows.len();
        let ncols = rows[0].len();
        let mut g = Grid::new(nrows, ncols, 0.0, NODATA, "0".into(), "0".into(), "1".into());
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                g.set(r, c, *v);
            }
        }
        g
    }

    fn naive_engine(radius: f64, aggregate: Aggregate, coverage_min: f64) -> FilterEngine {
        let cfg = FilterConfig::new(radius, aggregate, coverage_min).unwrap();
        FilterEngine::new(&cfg).unwrap()
    }

    fn default_settings() -> RunSettings {
        RunSettings { verbose: false, chunk_size: 2, max_procs: Some(2) }
    }

    #[test]
    fn three_by_three_all_ones_mean_radius_one() {
        let input = grid_from_rows(&[&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]]);
        let engine = naive_engine(1.0, Aggregate::Mean, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        assert_eq!(out.get(1, 1), 1.0);
        for (r, c) in [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(out.get(r, c), NODATA, "border cell ({r},{c}) should be nodata");
        }
    }

    #[test]
    fn five_by_five_impulse_sum_radius_one() {
        let mut rows = vec![vec![0.0; 5]; 5];
        rows[2][2] = 10.0;
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(1.0, Aggregate::Sum, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        assert_eq!(out.get(2, 2), 10.0);
        assert_eq!(out.get(1, 2), 10.0);
        assert_eq!(out.get(3, 2), 10.0);
        assert_eq!(out.get(2, 1), 10.0);
        assert_eq!(out.get(2, 3), 10.0);
        // diagonal neighbors are outside the plus-shaped mask
        assert_eq!(out.get(1, 1), 0.0);
        assert_eq!(out.get(1, 3), 0.0);
        assert_eq!(out.get(3, 1), 0.0);
        assert_eq!(out.get(3, 3), 0.0);
    }

    #[test]
    fn five_by_five_ramp_row_min_radius_one() {
        let mut rows = vec![vec![0.0; 5]; 5];
        rows[2] = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(1.0, Aggregate::Min, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        assert_eq!(out.get(2, 1), 0.0);
        assert_eq!(out.get(2, 2), 0.0);
        assert_eq!(out.get(2, 3), 0.0);
    }

    #[test]
    fn coverage_min_zero_still_requires_at_least_one_valid_cell() {
        let rows = vec![vec![NODATA; 5]; 5];
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);

        for agg in [Aggregate::Sum, Aggregate::Mean, Aggregate::Min, Aggregate::Max] {
            let engine = naive_engine(1.0, agg, 0.0);
            let out = engine.run(&input, &default_settings()).unwrap();
            let guard = engine.edge_guard();
            assert_eq!(
                out.get(guard as isize, guard as isize),
                NODATA,
                "{:?} should stay nodata over an all-nodata window",
                agg
            );
        }
    }

    #[test]
    fn coverage_threshold_full_requires_complete_window() {
        let mut rows = vec![vec![1.0; 5]; 5];
        rows[2][2] = NODATA;
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(1.0, Aggregate::Mean, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        for (r, c) in [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(out.get(r, c), NODATA);
        }
    }

    #[test]
    fn coverage_threshold_partial_allows_mostly_covered_windows() {
        let mut rows = vec![vec![1.0; 5]; 5];
        rows[2][2] = NODATA;
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(1.0, Aggregate::Mean, 0.5);
        let out = engine.run(&input, &default_settings()).unwrap();
        assert_eq!(out.get(2, 2), 1.0);
    }

    #[test]
    fn row_index_field_max_radius_one_point_five() {
        let mut rows = Vec::new();
        for r in 0..10 {
            rows.push(vec![r as f64; 10]);
        }
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(1.5, Aggregate::Max, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        let guard = engine.edge_guard();
        for r in guard..(10 - guard) {
            for c in guard..(10 - guard) {
                assert_eq!(out.get(r as isize, c as isize), (r + 1) as f64);
            }
        }
    }

    #[test]
    fn constant_field_identity_for_all_aggregates() {
        let value = 3.0;
        let rows = vec![vec![value; 7]; 7];
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);

        for (agg, expect) in [
            (Aggregate::Mean, value),
            (Aggregate::Min, value),
            (Aggregate::Max, value),
        ] {
            let engine = naive_engine(2.0, agg, 1.0);
            let out = engine.run(&input, &default_settings()).unwrap();
            let guard = engine.edge_guard();
            assert_eq!(out.get(guard as isize, guard as isize), expect);
        }

        let engine = naive_engine(2.0, Aggregate::Sum, 1.0);
        let out = engine.run(&input, &default_settings()).unwrap();
        let guard = engine.edge_guard();
        assert_eq!(out.get(guard as isize, guard as isize), value * engine.mask_sum() as f64);
    }

    #[test]
    fn thread_count_does_not_change_result() {
        let mut rows = Vec::new();
        for r in 0..12 {
            rows.push((0..12).map(|c| ((r * 12 + c) % 7) as f64).collect::<Vec<_>>());
        }
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);
        let engine = naive_engine(2.0, Aggregate::Mean, 1.0);

        let one = engine
            .run(&input, &RunSettings { verbose: false, chunk_size: 3, max_procs: Some(1) })
            .unwrap();
        let many = engine
            .run(&input, &RunSettings { verbose: false, chunk_size: 3, max_procs: Some(4) })
            .unwrap();
        assert_eq!(one.as_slice(), many.as_slice());
    }

    #[test]
    fn sliding_window_matches_naive_full_scan() {
        let mut rows = Vec::new();
        for r in 0..15 {
            rows.push((0..15).map(|c| ((r + 2 * c) % 5) as f64 - 2.0).collect::<Vec<_>>());
        }
        let row_refs: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let input = grid_from_rows(&row_refs);

        for agg in [Aggregate::Sum, Aggregate::Mean, Aggregate::Min, Aggregate::Max] {
            let engine = naive_engine(2.5, agg, 1.0);
            let out = engine.run(&input, &default_settings()).unwrap();
            let guard = engine.edge_guard();
            let mask_side = (2.5_f64.ceil() as isize) * 2 + 1;
            let center = mask_side / 2;

            for r in guard..(15 - guard) {
                for c in guard..(15 - guard) {
                    let mut values = Vec::new();
                    for di in -center..=center {
                        for dj in -center..=center {
                            let dist = ((di * di + dj * dj) as f64).sqrt();
                            if dist <= 2.5 {
                                values.push(input.get(r as isize + di, c as isize + dj));
                            }
                        }
                    }
                    let naive = match agg {
                        Aggregate::Sum => values.iter().sum::<f64>(),
                        Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
                        Aggregate::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
                        Aggregate::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    };
                    let got = out.get(r as isize, c as isize);
                    assert!((got - naive).abs() < 1e-9, "{:?} mismatch at ({r},{c}): {got} vs {naive}", agg);
                }
            }
        }
    }
}
