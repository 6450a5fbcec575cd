//! Temperature (and window geometry) search.
//!
//! Every technique runs through a [`SearchPlan`]: a grid of
//! candidate temperatures, a search band, the window
//! geometry to score inside that band, and the metric. For
//! each candidate temperature the emissivity spectrum is
//! computed once and every window placement of the geometry
//! is scored; the best placement is kept for that
//! temperature. The estimate is then the temperature with the
//! lowest kept score, the lowest temperature winning ties.
//!
//! Candidates are evaluated in parallel. Each worker produces
//! its own [`TracePoint`]; the points are collected in grid
//! order and reduced sequentially afterwards.

use std::{iter::once, ops::ControlFlow};

use log::{debug, info};
use rayon::prelude::*;
use serde_derive::*;

use crate::{
    emissivity::emissivity_at,
    error::{Result, TesError},
    metric::Metric,
    spectrum::{Spectrum, Window},
};

/// Resolution of the temperature grid, in kelvin.
pub const TEMPERATURE_STEP: f64 = 0.1;

/// Temperature reported when no candidate could be scored.
pub const UNKNOWN_TEMPERATURE: f64 = 0.0;

// Slack when comparing wavelengths and grid positions.
const GRID_TOLERANCE: f64 = 1e-9;

/// Candidate temperatures `lower + i * TEMPERATURE_STEP` up to
/// and including `upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGrid {
    lower: f64,
    upper: f64,
}

impl TemperatureGrid {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(TesError::param(format!(
                "temperature limits [{}, {}] K are not finite",
                lower, upper
            )));
        }
        if lower <= 0. {
            return Err(TesError::param(format!(
                "lower temperature {} K is not positive",
                lower
            )));
        }
        if upper < lower {
            return Err(TesError::param(format!(
                "upper temperature {} K is below lower temperature {} K",
                upper, lower
            )));
        }
        Ok(TemperatureGrid { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn len(&self) -> usize {
        // the cast saturates for absurd ranges
        (((self.upper - self.lower) / TEMPERATURE_STEP + GRID_TOLERANCE).floor() as usize)
            .saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn at(&self, idx: usize) -> f64 {
        self.lower + idx as f64 * TEMPERATURE_STEP
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |idx| self.at(idx))
    }
}

/// Window widths and count for the windowed techniques.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WindowSweep {
    /// Narrowest window width, in microns.
    pub lower: f64,
    /// Widest window width, in microns.
    pub upper: f64,
    /// Number of widths from `lower` to `upper`, both included.
    pub steps: usize,
    /// Number of windows placed together.
    pub count: usize,
}

impl WindowSweep {
    /// A single window of `width`.
    pub fn fixed(width: f64) -> Self {
        WindowSweep {
            lower: width,
            upper: width,
            steps: 1,
            count: 1,
        }
    }

    fn validated(self) -> Result<Self> {
        if !(self.lower.is_finite() && self.upper.is_finite()) || self.lower <= 0. {
            return Err(TesError::param(format!(
                "window width {} um is not positive",
                self.lower
            )));
        }
        if self.upper < self.lower {
            return Err(TesError::param(format!(
                "upper window width {} um is below lower width {} um",
                self.upper, self.lower
            )));
        }
        if self.steps == 0 {
            return Err(TesError::param("window steps must be at least 1"));
        }
        if self.count == 0 {
            return Err(TesError::param("number of windows must be at least 1"));
        }
        Ok(self)
    }

    /// Widths stepped linearly from `lower` to `upper`.
    pub fn widths(&self) -> Vec<f64> {
        if self.steps <= 1 || self.lower == self.upper {
            return vec![self.lower];
        }
        let step = (self.upper - self.lower) / (self.steps - 1) as f64;
        (0..self.steps)
            .map(|k| self.lower + k as f64 * step)
            .collect()
    }

    /// Every placement of this sweep inside `band` for a
    /// spectrum sampled at `wavelengths`.
    ///
    /// The band is split into `count` equal slots and one
    /// window of the given width sits in each slot, all at the
    /// same offset from their slot start. The offset is zero or
    /// the offset of a sample wavelength, so windows slide one
    /// spectral sample at a time and never overlap or leave
    /// the band. Widths larger than a slot have no placement.
    pub fn placements(&self, band: Window, wavelengths: &[f64]) -> Vec<Vec<Window>> {
        let slot = band.width() / self.count as f64;
        let mut out = Vec::new();
        for width in self.widths() {
            if width > slot + GRID_TOLERANCE {
                debug!(
                    "window width {} um does not fit {} slot(s) of {} um",
                    width, self.count, slot
                );
                continue;
            }
            let width = width.min(slot);
            let room = slot - width;
            let offsets = once(0.).chain(
                wavelengths
                    .iter()
                    .map(|w| w - band.low)
                    .filter(|&o| o > 0. && o <= room + GRID_TOLERANCE),
            );
            for offset in offsets {
                let offset = offset.min(room);
                out.push(
                    (0..self.count)
                        .map(|i| {
                            let low = band.low + i as f64 * slot + offset;
                            Window::new(low, low + width)
                        })
                        .collect(),
                );
            }
        }
        out
    }
}

/// Window geometry scored at each candidate temperature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Score the whole band as a single window.
    Band,
    /// Slide the windows of a sweep across the band and keep
    /// the best placement per temperature.
    Sliding(WindowSweep),
}

/// One candidate temperature of a finished search.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TracePoint {
    pub temperature: f64,
    /// Best score at this temperature; `None` when no window
    /// placement could be scored.
    pub score: Option<f64>,
    /// Placement achieving `score`.
    pub windows: Vec<Window>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TesResult {
    /// Estimated temperature in kelvin, or
    /// [`UNKNOWN_TEMPERATURE`].
    pub temperature: f64,
    /// Windows selected at the estimated temperature.
    pub windows: Vec<Window>,
    /// Score of the selected windows at the estimated
    /// temperature.
    pub best_score: Option<f64>,
    /// One point per candidate temperature, in grid order.
    pub trace: Vec<TracePoint>,
}

impl TesResult {
    pub fn unknown() -> Self {
        TesResult {
            temperature: UNKNOWN_TEMPERATURE,
            windows: vec![],
            best_score: None,
            trace: vec![],
        }
    }

    pub fn estimate(&self) -> Option<f64> {
        (self.temperature != UNKNOWN_TEMPERATURE).then(|| self.temperature)
    }

    pub fn is_unknown(&self) -> bool {
        self.estimate().is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub temperatures: TemperatureGrid,
    pub band: Window,
    pub geometry: Geometry,
    pub metric: Metric,
}

impl SearchPlan {
    pub fn run(&self, sample: &Spectrum, downwelling: Option<&Spectrum>) -> Result<TesResult> {
        self.run_observed(sample, downwelling, |_| ControlFlow::Continue(()))
    }

    /// Run the search, calling `observe` with each candidate
    /// temperature before it is evaluated. Returning
    /// `ControlFlow::Break` stops the search with
    /// [`TesError::Cancelled`].
    pub fn run_observed<F>(
        &self,
        sample: &Spectrum,
        downwelling: Option<&Spectrum>,
        observe: F,
    ) -> Result<TesResult>
    where
        F: Fn(f64) -> ControlFlow<()> + Sync,
    {
        let band = self.band.validated()?;
        if let Some(down) = downwelling {
            if !sample.same_grid(down) {
                return Err(TesError::data(
                    "dwr",
                    "downwelling grid differs from the sample grid",
                ));
            }
        }

        let candidates = match &self.geometry {
            Geometry::Band => vec![vec![band]],
            Geometry::Sliding(sweep) => sweep.validated()?.placements(band, sample.wavelength()),
        };
        if candidates.is_empty() {
            return Err(TesError::param(format!(
                "no window of the requested widths fits inside {}",
                band
            )));
        }

        let grid = self.temperatures;
        info!(
            "searching {} candidate temperature(s) in [{}, {}] K, {} window placement(s) in {}, {} metric",
            grid.len(),
            grid.lower,
            grid.upper,
            candidates.len(),
            band,
            self.metric.description(),
        );

        let trace = (0..grid.len())
            .into_par_iter()
            .map(|idx| {
                let temperature = grid.at(idx);
                if observe(temperature).is_break() {
                    return Err(TesError::Cancelled);
                }
                self.evaluate(sample, downwelling, &candidates, temperature)
            })
            .collect::<Result<Vec<_>>>()?;

        let best = trace
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| p.score.map(|s| (idx, s)))
            .fold(None, |best: Option<(usize, f64)>, (idx, score)| match best {
                Some((_, b)) if b <= score => best,
                _ => Some((idx, score)),
            });

        match best {
            Some((idx, score)) => {
                let point = &trace[idx];
                debug!(
                    "best candidate {} K scored {:e} over {} window(s)",
                    point.temperature,
                    score,
                    point.windows.len()
                );
                Ok(TesResult {
                    temperature: point.temperature,
                    windows: point.windows.clone(),
                    best_score: Some(score),
                    trace,
                })
            }
            None => {
                info!("no candidate temperature produced a usable score");
                Ok(TesResult::unknown())
            }
        }
    }

    fn evaluate(
        &self,
        sample: &Spectrum,
        downwelling: Option<&Spectrum>,
        candidates: &[Vec<Window>],
        temperature: f64,
    ) -> Result<TracePoint> {
        let emissivity = emissivity_at(sample, downwelling, temperature)?;

        let mut best: Option<(f64, &Vec<Window>)> = None;
        for windows in candidates {
            let score = match self.metric.score(&emissivity, windows) {
                Ok(score) if score.is_finite() => score,
                Ok(_) | Err(TesError::InsufficientData { .. }) => continue,
                Err(e) => return Err(e),
            };
            if best.map_or(true, |(b, _)| score < b) {
                best = Some((score, windows));
            }
        }

        Ok(TracePoint {
            temperature,
            score: best.map(|(s, _)| s),
            windows: best.map(|(_, w)| w.clone()).unwrap_or_default(),
        })
    }
}

/// Score the whole `[lower_wave, upper_wave]` band with the
/// dispersion metric at every candidate temperature.
pub fn single_window_search(
    sample: &Spectrum,
    downwelling: Option<&Spectrum>,
    lower_temp: f64,
    upper_temp: f64,
    lower_wave: f64,
    upper_wave: f64,
) -> Result<TesResult> {
    SearchPlan {
        temperatures: TemperatureGrid::new(lower_temp, upper_temp)?,
        band: Window::new(lower_wave, upper_wave),
        geometry: Geometry::Band,
        metric: Metric::Dispersion,
    }
    .run(sample, downwelling)
}

/// Slide the windows of `sweep` across `[lower_wave,
/// upper_wave]`, keep the best placement per candidate
/// temperature and pick the best temperature.
#[allow(clippy::too_many_arguments)]
pub fn windowed_search(
    sample: &Spectrum,
    downwelling: Option<&Spectrum>,
    lower_temp: f64,
    upper_temp: f64,
    lower_wave: f64,
    upper_wave: f64,
    sweep: WindowSweep,
    metric: Metric,
) -> Result<TesResult> {
    SearchPlan {
        temperatures: TemperatureGrid::new(lower_temp, upper_temp)?,
        band: Window::new(lower_wave, upper_wave),
        geometry: Geometry::Sliding(sweep),
        metric,
    }
    .run(sample, downwelling)
}
