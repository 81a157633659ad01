//! Volume scenarios and allometric area targets
//!
//! Each flow volume V becomes one scenario with two area targets derived
//! from the semi-empirical allometry `Area = C · V^(2/3)`:
//! a maximum cross-section area (controls how far a section spreads
//! sideways) and a total planimetric area (controls how far the footprint
//! extends downstream). Coefficients follow the published calibration per
//! flow kind.
//!
//! Reference:
//! Iverson, R.M., Schilling, S.P., Vallance, J.W. (1998). Objective
//! delineation of lahar-inundation hazard zones.
//! *GSA Bulletin*, 110(8), 972-984.

use tephra_core::{Error, Result};

/// Kind of volcanic mass flow, selecting the allometric coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Lahar,
    DebrisFlow,
    RockAvalanche,
}

impl FlowKind {
    /// (cross-section, planimetric) coefficients for `C · V^(2/3)`
    pub fn coefficients(self) -> (f64, f64) {
        match self {
            FlowKind::Lahar => (0.05, 200.0),
            FlowKind::DebrisFlow => (0.1, 20.0),
            FlowKind::RockAvalanche => (0.2, 20.0),
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowKind::Lahar => write!(f, "lahar"),
            FlowKind::DebrisFlow => write!(f, "debris flow"),
            FlowKind::RockAvalanche => write!(f, "rock avalanche"),
        }
    }
}

/// One volume hypothesis with its derived area targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    /// Flow volume (m³)
    pub volume: f64,
    /// Maximum cross-section area (m²)
    pub cross_section_area: f64,
    /// Total planimetric area (m²)
    pub planimetric_area: f64,
}

/// An ordered set of scenarios, largest volume first.
///
/// The ordering is a structural invariant the tracer and walker rely on:
/// budgets are consumed as a nested list and exhausted entries are pruned
/// from the tail, so targets must be non-increasing with index.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioList {
    scenarios: Vec<Scenario>,
}

/// Upper bound on scenarios per run.
///
/// Claim levels live in a `u8` ownership grid: 1 is the unclaimed
/// background, levels 2..=N+1 mark the scenarios, and the top value stays
/// reserved for the nodata convention. Real volume sets hold a handful of
/// entries; the bound only guards the encoding.
pub const MAX_SCENARIOS: usize = 253;

impl ScenarioList {
    /// Build from explicit scenarios, validating the ordering invariant.
    ///
    /// Fails fast with [`Error::MalformedScenarioList`] on an empty list or
    /// on volumes/targets that are not non-increasing; this is a
    /// precondition violation, not something a run recovers from.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self> {
        if scenarios.is_empty() {
            return Err(Error::MalformedScenarioList(
                "at least one volume scenario is required".into(),
            ));
        }
        if scenarios.len() > MAX_SCENARIOS {
            return Err(Error::MalformedScenarioList(format!(
                "{} scenarios exceed the claim-level capacity of {}",
                scenarios.len(),
                MAX_SCENARIOS
            )));
        }
        for s in &scenarios {
            if !(s.volume > 0.0 && s.cross_section_area > 0.0 && s.planimetric_area > 0.0) {
                return Err(Error::MalformedScenarioList(format!(
                    "non-positive volume or target in scenario {:?}",
                    s
                )));
            }
        }
        for pair in scenarios.windows(2) {
            if pair[1].volume > pair[0].volume
                || pair[1].cross_section_area > pair[0].cross_section_area
                || pair[1].planimetric_area > pair[0].planimetric_area
            {
                return Err(Error::MalformedScenarioList(format!(
                    "scenarios must be ordered largest first: {:?} follows {:?}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(Self { scenarios })
    }

    /// Derive scenarios from raw volumes for a given flow kind.
    ///
    /// Targets are `C · V^(2/3)` rounded to the nearest integer, matching
    /// the published tables. This is the single place areas are rounded;
    /// tracing itself stays real-valued.
    pub fn from_volumes(volumes: &[f64], kind: FlowKind) -> Result<Self> {
        let (coeff_xs, coeff_plan) = kind.coefficients();
        let mut sorted = volumes.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let scenarios = sorted
            .iter()
            .map(|&v| {
                let v23 = v.powf(2.0 / 3.0);
                Scenario {
                    volume: v,
                    cross_section_area: (v23 * coeff_xs).round(),
                    planimetric_area: (v23 * coeff_plan).round(),
                }
            })
            .collect();

        Self::new(scenarios)
    }

    /// Scenarios, largest volume first
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Always false; construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Cross-section targets, largest first
    pub fn cross_section_targets(&self) -> Vec<f64> {
        self.scenarios.iter().map(|s| s.cross_section_area).collect()
    }

    /// Planimetric targets, largest first
    pub fn planimetric_targets(&self) -> Vec<f64> {
        self.scenarios.iter().map(|s| s.planimetric_area).collect()
    }

    /// Volumes, largest first
    pub fn volumes(&self) -> Vec<f64> {
        self.scenarios.iter().map(|s| s.volume).collect()
    }
}
