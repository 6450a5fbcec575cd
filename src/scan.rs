//! Decoded instrument scans.
//!
//! A [`ScanSet`] is what the calibrator consumes for one
//! source: the wavelength grid, every repeated raw scan
//! (coadd) and the physical temperature of the source when
//! it is known. Vendor file decoding happens elsewhere; this
//! module only reads the JSON interchange form
//!
//! ```json
//! {
//!   "wavelength": [8.0, 8.1, ...],
//!   "coadds": [[1021.3, 1022.0, ...], [1020.9, 1021.7, ...]],
//!   "temperature": 300.0
//! }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use ndarray::{Array1, Array2, Axis};
use serde_derive::*;

use crate::{
    error::{Result, TesError},
    spectrum::validate_grid,
};

/// Raw scans of a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSet {
    wavelength: Vec<f64>,
    /// Coadds along axis 0, wavelength bins along axis 1.
    coadds: Array2<f64>,
    temperature: Option<f64>,
}

impl ScanSet {
    /// Build a scan set from a wavelength grid and a matrix of
    /// coadds (one row per scan).
    pub fn try_new(
        origin: &'static str,
        wavelength: Vec<f64>,
        coadds: Array2<f64>,
        temperature: Option<f64>,
    ) -> Result<Self> {
        validate_grid(origin, &wavelength)?;
        let (count, bins) = coadds.dim();
        if count == 0 {
            return Err(TesError::data(origin, "no coadds"));
        }
        if bins != wavelength.len() {
            return Err(TesError::data(
                origin,
                format!(
                    "coadds have {} bins for {} wavelengths",
                    bins,
                    wavelength.len()
                ),
            ));
        }
        if coadds.iter().any(|v| !v.is_finite()) {
            return Err(TesError::data(origin, "non-finite raw value"));
        }
        if let Some(t) = temperature {
            if !t.is_finite() || t <= 0. {
                return Err(TesError::data(
                    origin,
                    format!("reference temperature {} K is not positive", t),
                ));
            }
        }
        Ok(ScanSet {
            wavelength,
            coadds,
            temperature,
        })
    }

    /// Build a scan set from row vectors, one per coadd.
    pub fn from_rows(
        origin: &'static str,
        wavelength: Vec<f64>,
        rows: Vec<Vec<f64>>,
        temperature: Option<f64>,
    ) -> Result<Self> {
        let count = rows.len();
        let bins = wavelength.len();
        if let Some(idx) = rows.iter().position(|r| r.len() != bins) {
            return Err(TesError::data(
                origin,
                format!(
                    "coadd {} has {} bins for {} wavelengths",
                    idx,
                    rows[idx].len(),
                    bins
                ),
            ));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let coadds = Array2::from_shape_vec((count, bins), flat)
            .map_err(|e| TesError::data(origin, e.to_string()))?;
        Self::try_new(origin, wavelength, coadds, temperature)
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn coadds(&self) -> &Array2<f64> {
        &self.coadds
    }

    pub fn coadd_count(&self) -> usize {
        self.coadds.nrows()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Coadd-averaged raw values per wavelength bin.
    pub fn mean(&self) -> Array1<f64> {
        let n = self.coadds.nrows() as f64;
        self.coadds.sum_axis(Axis(0)) / n
    }

    /// Read a scan set from its JSON interchange form.
    pub fn from_json_path(origin: &'static str, path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let json: ScanSetJson = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(json.into_scan_set(origin)?)
    }
}

/// JSON form of a [`ScanSet`].
#[derive(Serialize, Deserialize, Debug)]
pub struct ScanSetJson {
    pub wavelength: Vec<f64>,
    pub coadds: Vec<Vec<f64>>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl ScanSetJson {
    pub fn into_scan_set(self, origin: &'static str) -> Result<ScanSet> {
        ScanSet::from_rows(origin, self.wavelength, self.coadds, self.temperature)
    }
}

impl TryFrom<ScanSetJson> for ScanSet {
    type Error = TesError;

    fn try_from(json: ScanSetJson) -> Result<Self> {
        json.into_scan_set("scan")
    }
}

impl From<&ScanSet> for ScanSetJson {
    fn from(scan: &ScanSet) -> Self {
        ScanSetJson {
            wavelength: scan.wavelength.clone(),
            coadds: scan.coadds.outer_iter().map(|row| row.to_vec()).collect(),
            temperature: scan.temperature,
        }
    }
}
