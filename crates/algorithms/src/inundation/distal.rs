//! Run orchestration
//!
//! Validates the DEM / flow-direction pair, resolves start points to grid
//! cells, and executes one independent inundation run per start point.
//! Runs never share state: each gets a fresh ownership grid, so the
//! footprints of different start points can be compared or composited by
//! the caller.

use tephra_core::{Error, Raster, Result};

use super::cross_section::UNCLAIMED;
use super::scenario::ScenarioList;
use super::walker::{walk_from_start, AuditLog, InundationParams};
use crate::maybe_rayon::*;

/// Where a run starts, either in map units or directly as a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartPoint {
    /// Geographic coordinates in the DEM's spatial reference
    Geographic { x: f64, y: f64 },
    /// Direct (row, col) cell address
    Cell { row: usize, col: usize },
}

impl StartPoint {
    fn resolve(&self, dem: &Raster<f64>) -> Result<(usize, usize)> {
        match *self {
            StartPoint::Geographic { x, y } => dem
                .geo_to_cell(x, y)
                .ok_or(Error::StartPointOutsideExtent { x, y }),
            StartPoint::Cell { row, col } => {
                if row < dem.rows() && col < dem.cols() {
                    Ok((row, col))
                } else {
                    let (x, y) = dem.transform().pixel_to_geo(col, row);
                    Err(Error::StartPointOutsideExtent { x, y })
                }
            }
        }
    }
}

/// The result of one inundation run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The start cell the run was anchored at
    pub start_cell: (usize, usize),
    /// Claim levels per cell: [`UNCLAIMED`] background, higher values for
    /// smaller (inner) scenarios
    pub ownership: Raster<u8>,
    /// The run's audit trail
    pub audit: AuditLog,
}

fn validate_grids(dem: &Raster<f64>, flow_dir: &Raster<u8>) -> Result<()> {
    if dem.shape() != flow_dir.shape() {
        let (er, ec) = dem.shape();
        let (ar, ac) = flow_dir.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }
    Ok(())
}

/// Execute a single inundation run from one start point.
///
/// The ownership grid inherits the DEM's geotransform, so it can be written
/// straight back out as a georeferenced raster.
pub fn run_from_start(
    dem: &Raster<f64>,
    flow_dir: &Raster<u8>,
    scenarios: &ScenarioList,
    start: StartPoint,
    params: &InundationParams,
) -> Result<RunOutput> {
    validate_grids(dem, flow_dir)?;
    let start_cell = start.resolve(dem)?;

    let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
    let audit = walk_from_start(dem, flow_dir, scenarios, start_cell, params, &mut ownership)?;

    Ok(RunOutput {
        start_cell,
        ownership,
        audit,
    })
}

/// Execute one independent run per start point.
///
/// Start points are resolved up front, so a point outside the DEM extent
/// fails the whole call before any tracing happens. Runs execute in
/// parallel when the `parallel` feature is enabled; results are returned in
/// start-point order either way.
pub fn distal_inundation(
    dem: &Raster<f64>,
    flow_dir: &Raster<u8>,
    scenarios: &ScenarioList,
    starts: &[StartPoint],
    params: &InundationParams,
) -> Result<Vec<RunOutput>> {
    validate_grids(dem, flow_dir)?;
    if starts.is_empty() {
        return Err(Error::InvalidParameter {
            name: "starts",
            value: "[]".into(),
            reason: "at least one start point is required".into(),
        });
    }

    let start_cells = starts
        .iter()
        .map(|s| s.resolve(dem))
        .collect::<Result<Vec<_>>>()?;

    start_cells
        .into_par_iter()
        .map(|start_cell| {
            let mut ownership = dem.with_same_meta::<u8>(UNCLAIMED);
            let audit =
                walk_from_start(dem, flow_dir, scenarios, start_cell, params, &mut ownership)?;
            Ok(RunOutput {
                start_cell,
                ownership,
                audit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inundation::scenario::{FlowKind, Scenario};
    use tephra_core::raster::GeoTransform;

    fn channel_grids() -> (Raster<f64>, Raster<u8>) {
        let mut dem = Raster::filled(9, 20, 50.0);
        for col in 0..20 {
            dem.set(4, col, 0.0).unwrap();
        }
        dem.set_transform(GeoTransform::new(1000.0, 2000.0, 1.0, -1.0));
        let mut flow = dem.with_same_meta::<u8>(1); // east
        flow.set_transform(*dem.transform());
        (dem, flow)
    }

    fn scenarios() -> ScenarioList {
        ScenarioList::new(vec![Scenario {
            volume: 1.0e6,
            cross_section_area: 30.0,
            planimetric_area: 5.5,
        }])
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let (dem, _) = channel_grids();
        let flow = Raster::filled(9, 19, 1u8);
        let err = distal_inundation(
            &dem,
            &flow,
            &scenarios(),
            &[StartPoint::Cell { row: 4, col: 1 }],
            &InundationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn test_start_point_outside_extent_rejected() {
        let (dem, flow) = channel_grids();
        let err = run_from_start(
            &dem,
            &flow,
            &scenarios(),
            // West of the raster origin
            StartPoint::Geographic { x: 999.0, y: 1995.5 },
            &InundationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::StartPointOutsideExtent { .. }));

        let err = run_from_start(
            &dem,
            &flow,
            &scenarios(),
            StartPoint::Cell { row: 9, col: 0 },
            &InundationParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::StartPointOutsideExtent { .. }));
    }

    #[test]
    fn test_geographic_start_resolves_to_cell() {
        let (dem, flow) = channel_grids();
        // Cell (4, 2) spans x ∈ [1002, 1003), y ∈ (1995, 1996]
        let output = run_from_start(
            &dem,
            &flow,
            &scenarios(),
            StartPoint::Geographic {
                x: 1002.5,
                y: 1995.5,
            },
            &InundationParams::default(),
        )
        .unwrap();
        assert_eq!(output.start_cell, (4, 2));
        assert_eq!(output.ownership.get(4, 2).unwrap(), 2);
    }

    #[test]
    fn test_runs_are_independent_and_ordered() {
        let (dem, flow) = channel_grids();
        let starts = [
            StartPoint::Cell { row: 4, col: 1 },
            StartPoint::Cell { row: 4, col: 10 },
        ];
        let outputs = distal_inundation(
            &dem,
            &flow,
            &scenarios(),
            &starts,
            &InundationParams::default(),
        )
        .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].start_cell, (4, 1));
        assert_eq!(outputs[1].start_cell, (4, 10));
        // The second run's grid carries no claims from the first run
        assert_eq!(outputs[1].ownership.get(4, 1).unwrap(), UNCLAIMED);
        // Each run claims 6 channel cells against its 5.5 m² target
        assert_eq!(outputs[0].audit.cells_traversed, 6);
        assert_eq!(outputs[1].audit.cells_traversed, 6);
    }

    #[test]
    fn test_rerun_is_bitwise_identical() {
        let (dem, flow) = channel_grids();
        let scenarios = ScenarioList::from_volumes(
            &[5.0e6, 1.0e6],
            FlowKind::Lahar,
        )
        .unwrap();
        let start = StartPoint::Cell { row: 4, col: 1 };
        let params = InundationParams::default();

        let a = run_from_start(&dem, &flow, &scenarios, start, &params).unwrap();
        let b = run_from_start(&dem, &flow, &scenarios, start, &params).unwrap();

        assert_eq!(a.ownership.data(), b.ownership.data());
        assert_eq!(a.audit.records, b.audit.records);
        assert_eq!(a.audit.stop, b.audit.stop);
    }
}
