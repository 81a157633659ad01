//! # Tephra Algorithms
//!
//! Volcanic mass-flow inundation modelling.
//!
//! The `inundation` module implements the distal-zone inundation estimate:
//! given a DEM, a D8 flow-direction grid, a set of flow volumes and one or
//! more stream start points, it grows a nested planimetric footprint per
//! volume scenario by chaining terrain cross-sections along the flow path.
//!
//! DEM conditioning (sink filling, flow direction/accumulation, stream
//! thresholding) is expected to be done upstream by a conventional GIS
//! toolchain; this crate consumes the resulting grids as-is.

pub mod inundation;
pub mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::inundation::{
        distal_inundation, run_from_start, AuditLog, FlowDir, FlowKind, InundationParams,
        RunOutput, Scenario, ScenarioList, StartPoint, StopReason,
    };
    pub use tephra_core::prelude::*;
}
