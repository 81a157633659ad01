//! Cross-section tracer
//!
//! Walks outward from a stream cell, perpendicular (by octant) to the flow
//! direction, filling the valley cross-section with debris: the notional
//! fill level starts at the stream cell elevation and rises as the lower of
//! the two side profiles is consumed. Each height increase spends
//! cross-section area out of every nested scenario budget; cells wetted
//! along the way are claimed into the ownership grid.
//!
//! Tracing stops when the outermost (largest) budget is spent, when a side
//! runs off the DEM, or at a defensive step cap.

use tephra_core::Raster;

use super::direction::{CellMetric, FlowDir};

/// Ownership-grid value for cells no scenario has claimed.
pub const UNCLAIMED: u8 = 1;

/// How a single cross-section trace ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// All budgets consumed by rising fill level — the normal ending
    Completed,
    /// A side left the DEM before the budgets were satisfied; remaining
    /// budgets are force-exhausted so callers treat this like completion,
    /// but it is flagged for diagnostics
    RanOffGrid,
    /// The step cap was hit; indicates pathological inputs, never silent
    IterationCapExceeded,
}

/// The nested cross-section area budgets of one trace, largest first.
///
/// Mirrors the concentric scenario targets: entry 0 is the outermost
/// (largest-volume) scenario. Entries that drop to zero or below are pruned
/// from the tail — the innermost targets are satisfied first — except the
/// last entry, whose exhaustion ends the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBudgets {
    remaining: Vec<f64>,
}

impl SectionBudgets {
    /// Start a trace with the given targets (largest first).
    pub fn new(targets: &[f64]) -> Self {
        debug_assert!(!targets.is_empty());
        debug_assert!(
            targets.windows(2).all(|w| w[1] <= w[0]),
            "section budgets must be ordered largest first"
        );
        Self {
            remaining: targets.to_vec(),
        }
    }

    /// Number of still-active budget entries
    pub fn active(&self) -> usize {
        self.remaining.len()
    }

    /// Remaining budget values, largest first
    pub fn remaining(&self) -> &[f64] {
        &self.remaining
    }

    /// Whether the outermost budget is spent (trace is done)
    pub fn is_exhausted(&self) -> bool {
        self.remaining.first().map_or(true, |&b| b <= 0.0)
    }

    /// Subtract an area increment from every active entry, then prune
    /// satisfied entries from the tail.
    fn consume(&mut self, area: f64) {
        for b in &mut self.remaining {
            *b -= area;
        }
        while self.remaining.len() > 1 && self.remaining.last().is_some_and(|&b| b <= 0.0) {
            self.remaining.pop();
        }
    }

    /// Force every entry spent. Used when a side runs off the DEM: the
    /// cross-section cannot be completed, so the whole trace is abandoned.
    fn exhaust_all(&mut self) {
        for b in &mut self.remaining {
            *b = f64::NEG_INFINITY;
        }
    }
}

/// Shared read-only inputs of all traces within one run.
pub(crate) struct TraceContext<'a> {
    pub dem: &'a Raster<f64>,
    pub cell_width: f64,
    pub cell_diagonal: f64,
    /// Step cap per cross-section
    pub max_section_steps: usize,
}

impl TraceContext<'_> {
    fn cell_dimension(&self, dir: FlowDir) -> f64 {
        match dir.cell_metric() {
            CellMetric::Width => self.cell_width,
            CellMetric::Diagonal => self.cell_diagonal,
        }
    }
}

/// One side (left or right bank) of a cross-section being walked outward.
///
/// Off-grid is a tagged state: the cursor keeps its last coordinate and
/// reports an elevation of +∞, which no real terrain can match — the side
/// can never be "equal to fill" or "below fill" again, and any fill raise
/// toward it exhausts the budgets outright.
#[derive(Debug, Clone, Copy)]
struct SideCursor {
    row: isize,
    col: isize,
    elev: f64,
    off_grid: bool,
    /// +1 for the left bank, −1 for the right bank
    sign: isize,
}

impl SideCursor {
    fn seed(dem: &Raster<f64>, row: isize, col: isize, sign: isize) -> Self {
        if dem.contains(row, col) {
            let elev = unsafe { dem.get_unchecked(row as usize, col as usize) };
            Self {
                row,
                col,
                elev,
                off_grid: false,
                sign,
            }
        } else {
            Self {
                row,
                col,
                elev: f64::INFINITY,
                off_grid: true,
                sign,
            }
        }
    }

    /// Step one cell outward along the lateral operator. Leaving the valid
    /// window keeps the previous coordinate and flags the cursor off-grid.
    fn advance(&mut self, dem: &Raster<f64>, dir: FlowDir) {
        let (dr, dc) = dir.lateral_step();
        let next_row = self.row + self.sign * dr;
        let next_col = self.col + self.sign * dc;
        if dem.contains(next_row, next_col) {
            self.row = next_row;
            self.col = next_col;
            self.elev = unsafe { dem.get_unchecked(next_row as usize, next_col as usize) };
        } else {
            self.off_grid = true;
            self.elev = f64::INFINITY;
        }
    }
}

/// Claim a cell for the innermost still-active scenario.
///
/// The claim level is the count of active budgets plus one, so cells near
/// the stream (claimed while all budgets are live) carry the highest level.
/// An existing smaller claim is overwritten and its cell count re-assigned;
/// the reverse never happens, so per-cell claim levels are non-decreasing
/// within a run.
pub(crate) fn claim_cell(
    ownership: &mut Raster<u8>,
    counts: &mut [u64],
    row: usize,
    col: usize,
    active: usize,
) {
    // Levels fit a u8: ScenarioList construction caps the scenario count.
    debug_assert!(active >= 1 && active + 1 <= u8::MAX as usize);
    let level = (active + 1) as u8;
    let current = unsafe { ownership.get_unchecked(row, col) };

    if current == UNCLAIMED {
        unsafe { ownership.set_unchecked(row, col, level) };
        counts[level as usize - 2] += 1;
    } else if current < level {
        unsafe { ownership.set_unchecked(row, col, level) };
        counts[current as usize - 2] -= 1;
        counts[level as usize - 2] += 1;
    }
}

fn claim_side(ownership: &mut Raster<u8>, counts: &mut [u64], side: &SideCursor, active: usize) {
    // A cursor that was seeded outside the window has no cell to claim.
    if side.off_grid {
        return;
    }
    claim_cell(ownership, counts, side.row as usize, side.col as usize, active);
}

/// Trace one cross-section at a stream cell.
///
/// `budgets` is a fresh copy of the currently active cross-section targets;
/// `counts` is the run-wide per-scenario claimed-cell tally (full scenario
/// length, indexed by claim level − 2).
pub(crate) fn trace_cross_section(
    ctx: &TraceContext<'_>,
    dir: FlowDir,
    row: isize,
    col: isize,
    budgets: &mut SectionBudgets,
    ownership: &mut Raster<u8>,
    counts: &mut [u64],
) -> TraceOutcome {
    let cell_dimension = ctx.cell_dimension(dir);

    // Facing downstream: the stream cell itself anchors the right bank, one
    // lateral step out anchors the left bank.
    let (seed_dr, seed_dc) = dir.left_seed();
    let mut left = SideCursor::seed(ctx.dem, row + seed_dr, col + seed_dc, 1);
    let mut right = SideCursor::seed(ctx.dem, row, col, -1);

    let mut fill_level = right.elev;
    let mut elapsed_cells: usize = 0;

    for _ in 0..ctx.max_section_steps {
        if budgets.is_exhausted() {
            return TraceOutcome::Completed;
        }

        if left.elev == fill_level || right.elev == fill_level {
            // A side sits exactly at the fill level: extend the flat
            // baseline without spending budget. Left bank first.
            if left.elev == fill_level {
                claim_side(ownership, counts, &left, budgets.active());
                left.advance(ctx.dem, dir);
            } else {
                claim_side(ownership, counts, &right, budgets.active());
                right.advance(ctx.dem, dir);
            }
            elapsed_cells += 1;
        } else if right.elev < fill_level || left.elev < fill_level {
            // A side dips below the fill level: the dip volume comes out of
            // every budget. Right bank first.
            if right.elev < fill_level {
                budgets.consume((fill_level - right.elev) * cell_dimension);
                if !budgets.is_exhausted() {
                    claim_side(ownership, counts, &right, budgets.active());
                    right.advance(ctx.dem, dir);
                }
            } else {
                budgets.consume((fill_level - left.elev) * cell_dimension);
                if !budgets.is_exhausted() {
                    claim_side(ownership, counts, &left, budgets.active());
                    left.advance(ctx.dem, dir);
                }
            }
            elapsed_cells += 1;
        } else if right.elev == left.elev {
            // Both banks rise to the same height: raise the fill level to
            // it, spending the raise across the whole wetted width.
            let raise = (right.elev - fill_level) * cell_dimension * elapsed_cells as f64;
            budgets.consume(raise);
            if !budgets.is_exhausted() {
                fill_level = right.elev;
                claim_side(ownership, counts, &left, budgets.active());
                left.advance(ctx.dem, dir);
                claim_side(ownership, counts, &right, budgets.active());
                right.advance(ctx.dem, dir);
                elapsed_cells += 2;
            }
        } else {
            // Banks at different heights: raise the fill level to the lower
            // one and advance that side only.
            if right.elev > left.elev {
                let raise = (left.elev - fill_level) * cell_dimension * elapsed_cells as f64;
                budgets.consume(raise);
                if !budgets.is_exhausted() {
                    fill_level = left.elev;
                    claim_side(ownership, counts, &left, budgets.active());
                    left.advance(ctx.dem, dir);
                }
            } else {
                let raise = (right.elev - fill_level) * cell_dimension * elapsed_cells as f64;
                budgets.consume(raise);
                if !budgets.is_exhausted() {
                    fill_level = right.elev;
                    claim_side(ownership, counts, &right, budgets.active());
                    right.advance(ctx.dem, dir);
                }
            }
            elapsed_cells += 1;
        }

        if left.off_grid || right.off_grid {
            // The section ran off the DEM before its area was satisfied.
            budgets.exhaust_all();
            return TraceOutcome::RanOffGrid;
        }
    }

    TraceOutcome::IterationCapExceeded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_dem(rows: usize, cols: usize, elev: f64) -> Raster<f64> {
        Raster::filled(rows, cols, elev)
    }

    fn ctx<'a>(dem: &'a Raster<f64>, max_steps: usize) -> TraceContext<'a> {
        TraceContext {
            dem,
            cell_width: 1.0,
            cell_diagonal: std::f64::consts::SQRT_2,
            max_section_steps: max_steps,
        }
    }

    #[test]
    fn test_flat_dem_consumes_no_budget_and_hits_cap() {
        let dem = flat_dem(50, 50, 10.0);
        let ctx = ctx(&dem, 8);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64];
        let mut budgets = SectionBudgets::new(&[5.0]);

        let outcome = trace_cross_section(
            &ctx,
            FlowDir::East,
            25,
            25,
            &mut budgets,
            &mut ownership,
            &mut counts,
        );

        assert_eq!(outcome, TraceOutcome::IterationCapExceeded);
        // Flat terrain extends the baseline without spending budget
        assert_eq!(budgets.remaining(), &[5.0]);
        // Left bank of an eastward section walks up-grid, one claim per step
        assert_eq!(counts[0], 8);
        assert_eq!(ownership.get(24, 25).unwrap(), 2);
        assert_eq!(ownership.get(17, 25).unwrap(), 2);
    }

    #[test]
    fn test_edge_seed_forces_exhaustion() {
        // Start in the top row: the left anchor of an eastward section is
        // off-grid immediately.
        let dem = flat_dem(5, 5, 3.0);
        let ctx = ctx(&dem, 1000);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64];
        let mut budgets = SectionBudgets::new(&[100.0]);

        let outcome = trace_cross_section(
            &ctx,
            FlowDir::East,
            0,
            2,
            &mut budgets,
            &mut ownership,
            &mut counts,
        );

        assert_eq!(outcome, TraceOutcome::RanOffGrid);
        assert!(budgets.is_exhausted());
        // The stream cell itself was still claimed before the edge stop
        assert_eq!(ownership.get(0, 2).unwrap(), 2);
    }

    #[test]
    fn test_slot_channel_claims_only_channel_cell() {
        // A one-cell slot between high walls: the first wall raise costs
        // more than the whole budget.
        let mut dem = flat_dem(9, 9, 10.0);
        dem.set(4, 4, 0.0).unwrap();
        let ctx = ctx(&dem, 1000);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64];
        let mut budgets = SectionBudgets::new(&[3.0]);

        let outcome = trace_cross_section(
            &ctx,
            FlowDir::East,
            4,
            4,
            &mut budgets,
            &mut ownership,
            &mut counts,
        );

        // Step 1: right anchor (the channel cell) equals the fill level →
        // claimed, baseline extended. Step 2: both banks at 10.0 → the
        // raise (10 × width × 1 cell) exceeds the 3 m² budget.
        assert_eq!(outcome, TraceOutcome::Completed);
        assert_eq!(counts[0], 1);
        assert_eq!(ownership.get(4, 4).unwrap(), 2);
        for (r, c) in [(3, 4), (5, 4), (4, 3), (4, 5)] {
            assert_eq!(ownership.get(r, c).unwrap(), UNCLAIMED);
        }
    }

    #[test]
    fn test_v_profile_budget_arithmetic() {
        // V-shaped valley sloping 2 m per cell away from row 4, eastward
        // flow: sections run along a column. Fill raises cost
        // 2·w·(1, 3, 5, ...) as the wetted width grows.
        let mut dem = flat_dem(11, 11, 0.0);
        for row in 0..11 {
            for col in 0..11 {
                dem.set(row, col, (row as f64 - 4.0).abs() * 2.0).unwrap();
            }
        }
        let ctx = ctx(&dem, 1000);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64];
        // 2·1 + 2·3 = 8 spent after two raises; 9.0 survives the second
        // raise and dies on the third (2·5 = 10).
        let mut budgets = SectionBudgets::new(&[9.0]);

        let outcome = trace_cross_section(
            &ctx,
            FlowDir::East,
            4,
            5,
            &mut budgets,
            &mut ownership,
            &mut counts,
        );

        assert_eq!(outcome, TraceOutcome::Completed);
        // Claims: channel cell, then both banks twice (fill at 2 then 4)
        assert_eq!(counts[0], 5);
        for (r, c) in [(4, 5), (3, 5), (5, 5), (2, 5), (6, 5)] {
            assert_eq!(ownership.get(r, c).unwrap(), 2, "cell ({r}, {c})");
        }
        assert_eq!(ownership.get(1, 5).unwrap(), UNCLAIMED);
        assert_eq!(ownership.get(7, 5).unwrap(), UNCLAIMED);
    }

    #[test]
    fn test_nested_budgets_prune_from_tail() {
        // Same V valley, two nested budgets: inner spent on the first
        // raise, outer survives to the second.
        let mut dem = flat_dem(11, 11, 0.0);
        for row in 0..11 {
            for col in 0..11 {
                dem.set(row, col, (row as f64 - 4.0).abs() * 2.0).unwrap();
            }
        }
        let ctx = ctx(&dem, 1000);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64, 0u64];
        let mut budgets = SectionBudgets::new(&[7.0, 1.5]);

        let outcome = trace_cross_section(
            &ctx,
            FlowDir::East,
            4,
            5,
            &mut budgets,
            &mut ownership,
            &mut counts,
        );

        assert_eq!(outcome, TraceOutcome::Completed);
        // Channel cell claimed while both budgets live → level 3
        assert_eq!(ownership.get(4, 5).unwrap(), 3);
        // First raise (2 m²) kills the 1.5 budget; banks claimed at level 2
        assert_eq!(ownership.get(3, 5).unwrap(), 2);
        assert_eq!(ownership.get(5, 5).unwrap(), 2);
        assert_eq!(counts, [2, 1]);
    }

    #[test]
    fn test_claim_upgrade_is_monotone() {
        let dem = flat_dem(3, 3, 0.0);
        let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
        let mut counts = [0u64, 0u64, 0u64];

        // Outer claim (one active budget → level 2)
        claim_cell(&mut ownership, &mut counts, 1, 1, 1);
        assert_eq!(ownership.get(1, 1).unwrap(), 2);
        assert_eq!(counts, [1, 0, 0]);

        // Inner claim upgrades and re-assigns the tally
        claim_cell(&mut ownership, &mut counts, 1, 1, 3);
        assert_eq!(ownership.get(1, 1).unwrap(), 4);
        assert_eq!(counts, [0, 0, 1]);

        // Downgrade attempts are ignored
        claim_cell(&mut ownership, &mut counts, 1, 1, 2);
        assert_eq!(ownership.get(1, 1).unwrap(), 4);
        assert_eq!(counts, [0, 0, 1]);
    }
}
