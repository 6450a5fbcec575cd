//! Temperature-emissivity separation (TES) of thermal
//! infrared spectra.
//!
//! The crate provides three functionalities:
//!
//! 1. [Calibrate](calibrate::calibrate) raw scans of a cold
//! and a warm blackbody, a sample and optionally the
//! downwelling sky radiance into spectral radiance, with a
//! consistency ratio per source computed from the repeated
//! scans (coadds).
//!
//! 2. Compute the [emissivity](emissivity::emissivity_at) of
//! the sample implied by any candidate temperature.
//!
//! 3. [Search](search) a temperature interval for the
//! temperature whose emissivity spectrum is the flattest
//! (least dispersed) or smoothest inside one or more
//! wavelength windows.
//!
//! # Usage
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use std::path::Path;
//! use tes::{calibrate, single_window_search, ScanSet};
//!
//! let cbb = ScanSet::from_json_path("cbb", Path::new("cbb.json"))?;
//! let wbb = ScanSet::from_json_path("wbb", Path::new("wbb.json"))?;
//! let sam = ScanSet::from_json_path("sam", Path::new("sam.json"))?;
//!
//! let cal = calibrate(None, &cbb, &wbb, &sam, None)?;
//! let result = single_window_search(&cal.sample, None, 280., 320., 8., 14.)?;
//! match result.estimate() {
//!     Some(t) => println!("{:.1} K", t),
//!     None => println!("unknown"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The five named search techniques are [`Technique`]s,
//! each mapping its parameters to one
//! [`SearchPlan`](search::SearchPlan).

pub mod blackbody;
pub mod calibrate;
pub mod config;
pub mod emissivity;
pub mod error;
pub mod metric;
pub mod scan;
pub mod search;
pub mod spectrum;
pub mod technique;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::calibrate::{calibrate, Calibration, ConsistencyReport, Source};
pub use crate::emissivity::{emissivity_at, Emissivity};
pub use crate::error::{Result, TesError};
pub use crate::metric::Metric;
pub use crate::scan::ScanSet;
pub use crate::search::{single_window_search, windowed_search, TesResult, WindowSweep};
pub use crate::spectrum::{Spectrum, Window};
pub use crate::technique::{Technique, TechniqueParams};
