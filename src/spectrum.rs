//! Spectra and wavelength windows.

use std::fmt;

use serde_derive::*;

use crate::error::{Result, TesError};

/// An ordered wavelength / value curve.
///
/// Wavelengths are in microns and strictly increasing; both
/// sequences have the same, non-zero length and hold only
/// finite values. The fields are private so a constructed
/// spectrum always satisfies these invariants.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelength: Vec<f64>,
    value: Vec<f64>,
}

impl Spectrum {
    /// Validate and wrap a wavelength / value pair. `origin`
    /// names the data in the error, e.g. `"sam"`.
    pub fn try_new(origin: &'static str, wavelength: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        validate_grid(origin, &wavelength)?;
        if value.len() != wavelength.len() {
            return Err(TesError::data(
                origin,
                format!(
                    "{} values for {} wavelengths",
                    value.len(),
                    wavelength.len()
                ),
            ));
        }
        if let Some(idx) = value.iter().position(|v| !v.is_finite()) {
            return Err(TesError::data(
                origin,
                format!("non-finite value at index {}", idx),
            ));
        }
        Ok(Spectrum { wavelength, value })
    }

    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength.iter().copied().zip(self.value.iter().copied())
    }

    /// Whether `other` is sampled on exactly the same grid.
    pub fn same_grid(&self, other: &Spectrum) -> bool {
        self.wavelength == other.wavelength
    }
}

/// Check that a wavelength grid is non-empty, finite and
/// strictly increasing.
pub(crate) fn validate_grid(origin: &'static str, wavelength: &[f64]) -> Result<()> {
    if wavelength.is_empty() {
        return Err(TesError::data(origin, "empty wavelength grid"));
    }
    if let Some(idx) = wavelength.iter().position(|w| !w.is_finite() || *w <= 0.) {
        return Err(TesError::data(
            origin,
            format!("wavelength at index {} is not a positive number", idx),
        ));
    }
    if let Some(idx) = wavelength.windows(2).position(|w| w[1] <= w[0]) {
        return Err(TesError::data(
            origin,
            format!("wavelengths not strictly increasing at index {}", idx + 1),
        ));
    }
    Ok(())
}

/// Slack on window edges, in microns, far below any spectral
/// sampling interval.
pub const EDGE_TOLERANCE: f64 = 1e-9;

/// A closed wavelength interval `[low, high]` in microns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub low: f64,
    pub high: f64,
}

impl Window {
    pub fn new(low: f64, high: f64) -> Self {
        Window { low, high }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Whether `wavelength` lies in the window, allowing
    /// [`EDGE_TOLERANCE`] of rounding at either edge.
    #[inline]
    pub fn contains(&self, wavelength: f64) -> bool {
        wavelength >= self.low - EDGE_TOLERANCE && wavelength <= self.high + EDGE_TOLERANCE
    }

    /// Reject windows with non-finite or inverted bounds.
    pub fn validated(self) -> Result<Self> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(TesError::param(format!("window {} is not finite", self)));
        }
        if self.high <= self.low {
            return Err(TesError::param(format!("window {} has no width", self)));
        }
        Ok(self)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] um", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unordered_wavelengths() {
        let err = Spectrum::try_new("sam", vec![8., 9., 9.], vec![1., 1., 1.]).unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "sam", .. }));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Spectrum::try_new("cbb", vec![8., 9.], vec![1.]).unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "cbb", .. }));
    }

    #[test]
    fn rejects_empty() {
        assert!(Spectrum::try_new("wbb", vec![], vec![]).is_err());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = Window::new(8., 14.);
        assert!(w.contains(8.) && w.contains(14.));
        assert!(!w.contains(14.000001));
        // 0.1 + 0.2 rounds above 0.3
        assert!(Window::new(0.1 + 0.2, 0.6).contains(0.3));
        assert!(Window::new(10., 10.).validated().is_err());
    }
}
