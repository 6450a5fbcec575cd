//! Flatness scores of an emissivity spectrum.
//!
//! Lower is better for both metrics. Invalid emissivity bins
//! are skipped; a window with fewer than [`MIN_POINTS`] valid
//! values cannot be scored.

use serde_derive::*;

use crate::{
    emissivity::Emissivity,
    error::{Result, TesError},
    spectrum::Window,
};

pub const MIN_POINTS: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Standard deviation of the values inside all windows.
    Dispersion,
    /// Mean squared second difference inside each window.
    Smoothness,
}

impl Metric {
    pub fn score(self, emissivity: &Emissivity, windows: &[Window]) -> Result<f64> {
        match self {
            Metric::Dispersion => dispersion(emissivity, windows),
            Metric::Smoothness => smoothness(emissivity, windows),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::Dispersion => "standard deviation",
            Metric::Smoothness => "average squared second derivative",
        }
    }
}

fn valid_points(emissivity: &Emissivity, window: Window) -> Result<Vec<f64>> {
    let values: Vec<f64> = emissivity.valid_in(window).collect();
    if values.len() < MIN_POINTS {
        return Err(TesError::InsufficientData {
            window,
            valid: values.len(),
        });
    }
    Ok(values)
}

/// Population standard deviation of the valid values of all
/// windows taken together.
pub fn dispersion(emissivity: &Emissivity, windows: &[Window]) -> Result<f64> {
    let mut values = Vec::new();
    for &window in windows {
        values.extend(valid_points(emissivity, window)?);
    }
    if values.is_empty() {
        return Err(TesError::param("no window to score"));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

/// Mean of `(e[i-1] - 2 e[i] + e[i+1])^2` over consecutive valid
/// values, computed per window and averaged over all windows'
/// terms.
pub fn smoothness(emissivity: &Emissivity, windows: &[Window]) -> Result<f64> {
    let mut sum = 0.;
    let mut count = 0usize;
    for &window in windows {
        let values = valid_points(emissivity, window)?;
        for w in values.windows(3) {
            sum += (w[0] - 2. * w[1] + w[2]).powi(2);
            count += 1;
        }
    }
    if count == 0 {
        return Err(TesError::param("no window to score"));
    }
    Ok(sum / count as f64)
}
