//! Per-technique defaults.
//!
//! The engine never reads configuration itself: binaries load
//! a [`TesConfig`], apply their overrides and pass the
//! resulting [`TechniqueParams`] to [`Technique::plan`]. A
//! configuration file is JSON with one block per technique;
//! missing blocks keep the built-in defaults.
//!
//! ```json
//! {
//!   "standard": {
//!     "tolerance": 1.0,
//!     "temperature": { "lower": 250.0, "upper": 350.0 },
//!     "wavelength": { "lower": 8.0, "upper": 14.0 }
//!   }
//! }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde_derive::*;

use crate::technique::{Limits, Technique, TechniqueParams};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct TesConfig {
    pub waterband: TechniqueParams,
    pub standard: TechniqueParams,
    pub moving_window: TechniqueParams,
    pub variable_moving_window: TechniqueParams,
    pub multiple_moving_window: TechniqueParams,
}

impl TesConfig {
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn params(&self, technique: Technique) -> &TechniqueParams {
        match technique {
            Technique::Waterband => &self.waterband,
            Technique::Standard => &self.standard,
            Technique::MovingWindow => &self.moving_window,
            Technique::VariableMovingWindow => &self.variable_moving_window,
            Technique::MultipleMovingWindow => &self.multiple_moving_window,
        }
    }
}

fn params(wavelength: Limits) -> TechniqueParams {
    TechniqueParams {
        tolerance: 1.,
        temperature: Limits::new(250., 350.),
        wavelength,
        lower_window: None,
        upper_window: None,
        window_step: None,
        num_windows: None,
    }
}

impl Default for TesConfig {
    fn default() -> Self {
        let window = Limits::new(8., 14.);
        TesConfig {
            waterband: params(Limits::new(5.6, 7.6)),
            standard: params(window),
            moving_window: TechniqueParams {
                lower_window: Some(1.),
                ..params(window)
            },
            variable_moving_window: TechniqueParams {
                lower_window: Some(0.5),
                upper_window: Some(2.),
                window_step: Some(0.5),
                ..params(window)
            },
            multiple_moving_window: TechniqueParams {
                lower_window: Some(0.5),
                upper_window: Some(1.),
                window_step: Some(0.25),
                num_windows: Some(2),
                ..params(window)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_plans() -> anyhow::Result<()> {
        let config = TesConfig::default();
        for technique in Technique::ALL.iter().copied() {
            let plan = technique.plan(config.params(technique))?;
            assert_eq!(plan.metric, technique.metric());
        }
        Ok(())
    }

    #[test]
    fn partial_file_keeps_defaults() -> anyhow::Result<()> {
        let config: TesConfig = serde_json::from_str(
            r#"{
                "standard": {
                    "tolerance": 2.5,
                    "temperature": { "lower": 270.0, "upper": 330.0 },
                    "wavelength": { "lower": 8.5, "upper": 13.5 }
                }
            }"#,
        )?;
        assert_eq!(config.standard.tolerance, 2.5);
        assert_eq!(config.standard.wavelength, Limits::new(8.5, 13.5));
        assert_eq!(config.moving_window, TesConfig::default().moving_window);
        Ok(())
    }

    #[test]
    fn round_trips_through_json() -> anyhow::Result<()> {
        let config = TesConfig::default();
        let text = serde_json::to_string_pretty(&config)?;
        assert_eq!(serde_json::from_str::<TesConfig>(&text)?, config);
        Ok(())
    }
}
