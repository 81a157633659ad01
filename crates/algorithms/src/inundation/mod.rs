//! Distal lahar inundation
//!
//! Maps the area a volcanic mass flow of a given volume would inundate
//! downstream of a start point, using the semi-empirical allometry of
//! Iverson, Schilling and Vallance (1998): cross-section area and
//! planimetric area both scale with volume to the two-thirds power. The
//! engine walks a D8 flow path from each start cell, fills valley
//! cross-sections until the per-scenario area targets are met, and
//! accumulates the claimed cells into an ownership grid of nested hazard
//! zones.

mod cross_section;
mod direction;
mod distal;
mod scenario;
mod walker;

pub use cross_section::{SectionBudgets, TraceOutcome, UNCLAIMED};
pub use direction::{CellMetric, FlowDir};
pub use distal::{distal_inundation, run_from_start, RunOutput, StartPoint};
pub use scenario::{FlowKind, Scenario, ScenarioList, MAX_SCENARIOS};
pub use walker::{AuditLog, InundationParams, StopReason};
