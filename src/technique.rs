//! The five separation techniques.
//!
//! They are not five algorithms: each is a [`SearchPlan`]
//! with a particular window geometry and metric.
//!
//! | technique               | geometry                 | metric     |
//! |-------------------------|--------------------------|------------|
//! | waterband               | whole band               | dispersion |
//! | standard                | sliding, full band width | smoothness |
//! | moving window           | sliding, one width       | dispersion |
//! | variable moving window  | sliding, stepped widths  | dispersion |
//! | multiple moving window  | sliding, several windows | dispersion |

use std::{fmt, str::FromStr};

use inflector::Inflector;
use serde_derive::*;

use crate::{
    error::{Result, TesError},
    metric::Metric,
    search::{Geometry, SearchPlan, TemperatureGrid, WindowSweep},
    spectrum::Window,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    Waterband,
    Standard,
    MovingWindow,
    VariableMovingWindow,
    MultipleMovingWindow,
}

impl Technique {
    pub const ALL: [Technique; 5] = [
        Technique::Waterband,
        Technique::Standard,
        Technique::MovingWindow,
        Technique::VariableMovingWindow,
        Technique::MultipleMovingWindow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Technique::Waterband => "waterband",
            Technique::Standard => "standard",
            Technique::MovingWindow => "moving-window",
            Technique::VariableMovingWindow => "variable-moving-window",
            Technique::MultipleMovingWindow => "multiple-moving-window",
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            Technique::Standard => Metric::Smoothness,
            _ => Metric::Dispersion,
        }
    }

    /// Build the search for this technique from its
    /// parameters.
    ///
    /// Missing window parameters fall back to a single window
    /// spanning the whole band with a width step of 1 um. A
    /// missing upper width equals the lower width.
    pub fn plan(self, params: &TechniqueParams) -> Result<SearchPlan> {
        let temperatures =
            TemperatureGrid::new(params.temperature.lower, params.temperature.upper)?;
        let band = Window::new(params.wavelength.lower, params.wavelength.upper).validated()?;

        let geometry = match self {
            Technique::Waterband => Geometry::Band,
            Technique::Standard | Technique::MovingWindow => {
                Geometry::Sliding(WindowSweep::fixed(
                    params.lower_window.unwrap_or_else(|| band.width()),
                ))
            }
            Technique::VariableMovingWindow => Geometry::Sliding(params.window_sweep(band, 1)?),
            Technique::MultipleMovingWindow => Geometry::Sliding(
                params.window_sweep(band, params.num_windows.unwrap_or(1))?,
            ),
        };

        Ok(SearchPlan {
            temperatures,
            band,
            geometry,
            metric: self.metric(),
        })
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Technique {
    type Err = TesError;

    /// Accepts kebab-case names as well as labels such as
    /// `"Variable Moving Window"`.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.to_kebab_case();
        Technique::ALL
            .iter()
            .copied()
            .find(|t| key == t.name() || key == format!("{}-technique", t.name()))
            .ok_or_else(|| TesError::param(format!("unknown technique `{}`", s)))
    }
}

/// Closed interval of two configured limits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub lower: f64,
    pub upper: f64,
}

impl Limits {
    pub fn new(lower: f64, upper: f64) -> Self {
        Limits { lower, upper }
    }
}

/// Parameters of one technique, as configured per technique
/// and overridden by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TechniqueParams {
    /// Largest acceptable coadd disagreement, in percent.
    pub tolerance: f64,
    /// Candidate temperature limits, in kelvin.
    pub temperature: Limits,
    /// Search band, in microns.
    pub wavelength: Limits,
    #[serde(default)]
    pub lower_window: Option<f64>,
    #[serde(default)]
    pub upper_window: Option<f64>,
    #[serde(default)]
    pub window_step: Option<f64>,
    #[serde(default)]
    pub num_windows: Option<usize>,
}

impl TechniqueParams {
    fn window_sweep(&self, band: Window, count: usize) -> Result<WindowSweep> {
        let lower = self.lower_window.unwrap_or_else(|| band.width());
        let upper = self.upper_window.unwrap_or(lower);
        let step = self.window_step.unwrap_or(1.);
        if !(step.is_finite() && step > 0.) {
            return Err(TesError::param(format!(
                "window step {} um is not positive",
                step
            )));
        }
        let steps = if upper == lower {
            1
        } else {
            ((upper - lower) / step + 1e-9).floor().max(0.) as usize + 1
        };
        Ok(WindowSweep {
            lower,
            upper,
            steps,
            count,
        })
    }
}
