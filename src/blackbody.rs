//! Planck blackbody radiance.
//!
//! Radiance is spectral radiance per unit wavelength per
//! steradian, in W m^-2 sr^-1 um^-1, with wavelengths in
//! microns and temperatures in kelvin.

/// First radiation constant for radiance, `2 h c^2`, in
/// W um^4 m^-2 sr^-1.
pub const C1: f64 = 1.191_042_972e8;

/// Second radiation constant, `h c / k`, in um K.
pub const C2: f64 = 14_387.773_6;

// Largest argument for which `exp` stays finite.
const MAX_EXPONENT: f64 = 709.;

/// Radiance of a blackbody at `temperature` for a single
/// wavelength.
///
/// Returns 0.0 when the exponential term would overflow
/// (temperature approaching zero) or when either argument is
/// not positive.
#[inline]
pub fn radiance_at(temperature: f64, wavelength: f64) -> f64 {
    if temperature <= 0. || wavelength <= 0. {
        return 0.;
    }
    // L = c1 / (l^5 (exp(c2 / (l T)) - 1))
    let exponent = C2 / (wavelength * temperature);
    if exponent > MAX_EXPONENT {
        return 0.;
    }
    C1 / (wavelength.powi(5) * exponent.exp_m1())
}

/// Radiance of a blackbody at `temperature` over a
/// wavelength grid.
pub fn radiance(temperature: f64, wavelengths: &[f64]) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&w| radiance_at(temperature, w))
        .collect()
}

/// Inverse of [`radiance_at`]: the temperature of the
/// blackbody emitting `radiance` at `wavelength`.
///
/// Returns `None` for non-positive inputs.
pub fn brightness_temperature(radiance: f64, wavelength: f64) -> Option<f64> {
    if radiance <= 0. || wavelength <= 0. {
        return None;
    }
    // T = c2 / (l ln(1 + c1 / (l^5 L)))
    let t = C2 / (wavelength * (C1 / (wavelength.powi(5) * radiance)).ln_1p());
    t.is_finite().then(|| t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (0..=170).map(|i| 3. + 0.1 * i as f64).collect()
    }

    #[test]
    fn positive_and_increasing_with_temperature() {
        let waves = grid();
        let mut prev = radiance(200., &waves);
        assert!(prev.iter().all(|&l| l > 0.));
        for step in 1..=200 {
            let t = 200. + step as f64;
            let curr = radiance(t, &waves);
            for (p, c) in prev.iter().zip(curr.iter()) {
                assert!(c > p, "radiance not increasing at {} K", t);
            }
            prev = curr;
        }
    }

    #[test]
    fn matches_reference_value() {
        // 300 K at 10 um is about 9.92 W m^-2 sr^-1 um^-1.
        let l = radiance_at(300., 10.);
        assert!((l - 9.924).abs() < 0.01, "got {}", l);
    }

    #[test]
    fn guards_against_overflow() {
        assert_eq!(radiance_at(1e-3, 3.), 0.);
        assert_eq!(radiance_at(0., 10.), 0.);
        assert!(radiance_at(1., 20.).is_finite());
    }

    #[test]
    fn brightness_temperature_inverts_radiance() {
        for &w in &[3.5, 8., 10.5, 14., 19.] {
            for &t in &[200., 273.15, 300., 400.] {
                let back = brightness_temperature(radiance_at(t, w), w).unwrap();
                assert!((back - t).abs() < 1e-8, "{} K at {} um gave {}", t, w, back);
            }
        }
        assert_eq!(brightness_temperature(0., 10.), None);
    }
}
