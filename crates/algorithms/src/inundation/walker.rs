//! Stream walker
//!
//! Chains cross-sections along the D8 flow path from a start cell. At every
//! stream cell it traces the canonical section, the two adjacent-octant
//! supplementary sections and, for diagonal directions, one checkerboard
//! section at the offset cell. After each stream cell the claimed
//! planimetric area is re-tallied against every tracked scenario; scenarios
//! whose footprint target is met are pruned innermost-first, and the run
//! ends when the largest scenario's footprint is complete.

use std::time::{Duration, Instant};

use tephra_core::{Raster, Result};

use super::cross_section::{
    trace_cross_section, SectionBudgets, TraceContext, TraceOutcome,
};
use super::direction::FlowDir;
use super::scenario::ScenarioList;

/// Tuning knobs for a run.
#[derive(Debug, Clone)]
pub struct InundationParams {
    /// Step cap per cross-section trace. Exceeding it stops the run with
    /// [`StopReason::IterationCapExceeded`]; it should never fire on sane
    /// terrain.
    pub max_section_steps: usize,
    /// Cap on downstream advances per run; guards against flow-direction
    /// cycles.
    pub max_stream_cells: usize,
}

impl Default for InundationParams {
    fn default() -> Self {
        Self {
            max_section_steps: 1_000_000,
            max_stream_cells: 9_000_000,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The largest scenario's planimetric target was met — the normal end
    BudgetExhausted,
    /// A section step cap or the stream-cell cap was hit; the
    /// flow-direction input is likely malformed (e.g. a cycle)
    IterationCapExceeded,
    /// The flow path advanced off the DEM before the largest target was met
    FlowLeftGrid,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::BudgetExhausted => write!(f, "budget exhausted"),
            StopReason::IterationCapExceeded => write!(f, "iteration cap exceeded"),
            StopReason::FlowLeftGrid => write!(f, "flow path left the grid"),
        }
    }
}

/// Per-run audit trail: the inputs, one record of remaining planimetric
/// budgets per stream cell, and the stop condition.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLog {
    /// Input volumes, largest first
    pub volumes: Vec<f64>,
    /// Cross-section targets, largest first
    pub cross_section_targets: Vec<f64>,
    /// Planimetric targets, largest first
    pub planimetric_targets: Vec<f64>,
    /// Remaining planimetric budgets after each stream cell, in scenario
    /// order; entries shrink as scenarios are pruned
    pub records: Vec<Vec<f64>>,
    /// Why the run stopped
    pub stop: StopReason,
    /// Stream cells traversed
    pub cells_traversed: usize,
    /// Cross-sections that ran off the DEM before their area was satisfied
    pub off_grid_sections: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl AuditLog {
    /// Render the textual audit trail: a header listing the sorted inputs,
    /// one line of remaining planimetric budgets per stream cell, and a
    /// closing summary.
    pub fn render(&self, name: &str) -> String {
        fn join(values: &[f64]) -> String {
            values
                .iter()
                .map(|v| format!("{v}"))
                .collect::<Vec<_>>()
                .join(" : ")
        }

        let mut out = String::new();
        out.push_str(&format!("RUN NAME: {name}\n"));
        out.push_str("VALUES SORTED LARGEST TO SMALLEST\n");
        out.push_str(&format!("VOLUMES ENTERED:\n{}\n", join(&self.volumes)));
        out.push_str(&format!(
            "CROSS SECTION AREAS:\n{}\n",
            join(&self.cross_section_targets)
        ));
        out.push_str(&format!(
            "PLANIMETRIC AREAS:\n{}\n",
            join(&self.planimetric_targets)
        ));
        out.push_str("_________________________________________________________\n");
        out.push_str("DECREASING PLANIMETRIC AREAS LISTED BELOW\n");
        out.push_str("_________________________________________________________\n");
        for record in &self.records {
            let line = record
                .iter()
                .map(|v| format!("{v:.1}"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("STOP REASON: {}\n", self.stop));
        out.push_str(&format!(
            "TOTAL CELLS TRAVERSED: {} cells\n",
            self.cells_traversed
        ));
        if self.off_grid_sections > 0 {
            out.push_str(&format!(
                "SECTIONS OFF GRID: {}\n",
                self.off_grid_sections
            ));
        }
        out.push_str(&format!(
            "TOTAL TIME: {:.3} seconds\n",
            self.elapsed.as_secs_f64()
        ));
        out
    }
}

/// Walk the flow path from one start cell, growing the footprint into
/// `ownership`.
///
/// `ownership` must be an all-[`UNCLAIMED`](super::UNCLAIMED) grid of the
/// DEM's shape; the caller owns it and reads the finished claim levels out
/// of it afterwards. Grid shapes are validated by the orchestrator.
pub(crate) fn walk_from_start(
    dem: &Raster<f64>,
    flow_dir: &Raster<u8>,
    scenarios: &ScenarioList,
    start: (usize, usize),
    params: &InundationParams,
    ownership: &mut Raster<u8>,
) -> Result<AuditLog> {
    let started = Instant::now();

    let cell_width = dem.cell_size();
    let cell_area = cell_width * cell_width;
    let ctx = TraceContext {
        dem,
        cell_width,
        cell_diagonal: dem.transform().cell_diagonal(),
        max_section_steps: params.max_section_steps,
    };

    let n = scenarios.len();
    // Active target lists shrink from the tail as scenarios are pruned;
    // the claimed-cell tally keeps full scenario length for the whole run.
    let mut xsect_targets = scenarios.cross_section_targets();
    let mut plan_targets = scenarios.planimetric_targets();
    let mut remaining = plan_targets.clone();
    let mut counts = vec![0u64; n];

    let mut row = start.0 as isize;
    let mut col = start.1 as isize;

    let mut records: Vec<Vec<f64>> = Vec::new();
    let mut cells_traversed = 0usize;
    let mut off_grid_sections = 0usize;

    let stop = 'run: loop {
        let code = flow_dir.get(row as usize, col as usize)?;
        let dir = FlowDir::from_code(code, row as usize, col as usize)?;

        // Canonical section plus the two adjacent octants; a single octant
        // is rarely exactly perpendicular to the valley axis.
        let (supp_a, supp_b) = dir.supplementary_pair();
        for section_dir in [dir, supp_a, supp_b] {
            let mut budgets = SectionBudgets::new(&xsect_targets);
            match trace_cross_section(
                &ctx,
                section_dir,
                row,
                col,
                &mut budgets,
                ownership,
                &mut counts,
            ) {
                TraceOutcome::Completed => {}
                TraceOutcome::RanOffGrid => off_grid_sections += 1,
                TraceOutcome::IterationCapExceeded => break 'run StopReason::IterationCapExceeded,
            }
        }

        // Diagonal flow touches the grid like a checkerboard; one extra
        // section at the offset cell covers the skipped cells.
        if let Some((dr, dc)) = dir.checkerboard_offset() {
            let mut budgets = SectionBudgets::new(&xsect_targets);
            match trace_cross_section(
                &ctx,
                dir,
                row + dr,
                col + dc,
                &mut budgets,
                ownership,
                &mut counts,
            ) {
                TraceOutcome::Completed => {}
                TraceOutcome::RanOffGrid => off_grid_sections += 1,
                TraceOutcome::IterationCapExceeded => break 'run StopReason::IterationCapExceeded,
            }
        }

        // Re-tally the claimed footprint. A scenario's area includes every
        // inner scenario's cells: the footprints are nested.
        let mut cumulative = 0u64;
        let mut cumulative_cells = vec![0u64; n];
        for i in (0..n).rev() {
            cumulative += counts[i];
            cumulative_cells[i] = cumulative;
        }
        for (i, r) in remaining.iter_mut().enumerate() {
            *r = plan_targets[i] - cumulative_cells[i] as f64 * cell_area;
        }
        records.push(remaining.clone());

        // Prune satisfied scenarios innermost-first. The last one is never
        // pruned: its negative budget is the stop condition.
        while remaining.len() > 1 && remaining.last().is_some_and(|&r| r < 0.0) {
            remaining.pop();
            plan_targets.pop();
            xsect_targets.pop();
        }

        cells_traversed += 1;

        if remaining[0] < 0.0 {
            break StopReason::BudgetExhausted;
        }
        if cells_traversed >= params.max_stream_cells {
            break StopReason::IterationCapExceeded;
        }

        let (dr, dc) = dir.downstream_delta();
        row += dr;
        col += dc;
        if !dem.contains(row, col) {
            break StopReason::FlowLeftGrid;
        }
    };

    Ok(AuditLog {
        volumes: scenarios.volumes(),
        cross_section_targets: scenarios.cross_section_targets(),
        planimetric_targets: scenarios.planimetric_targets(),
        records,
        stop,
        cells_traversed,
        off_grid_sections,
        elapsed: started.elapsed(),
    })
}
