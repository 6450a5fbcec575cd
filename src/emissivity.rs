//! Emissivity of an opaque surface at a candidate temperature.

use crate::{
    blackbody,
    error::{Result, TesError},
    spectrum::{Spectrum, Window},
};

// Relative size below which the blackbody minus downwelling
// denominator is treated as zero.
const DENOMINATOR_EPSILON: f64 = 1e-12;

/// Emissivity over the sample's wavelength grid. Bins where
/// the inversion is undefined are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Emissivity {
    pub temperature: f64,
    wavelength: Vec<f64>,
    value: Vec<Option<f64>>,
}

impl Emissivity {
    pub fn wavelength(&self) -> &[f64] {
        &self.wavelength
    }

    pub fn value(&self) -> &[Option<f64>] {
        &self.value
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, Option<f64>)> + '_ {
        self.wavelength.iter().copied().zip(self.value.iter().copied())
    }

    /// Valid values whose wavelength lies inside `window`, in
    /// wavelength order.
    pub fn valid_in(&self, window: Window) -> impl Iterator<Item = f64> + '_ {
        self.iter()
            .filter(move |(w, _)| window.contains(*w))
            .filter_map(|(_, e)| e)
    }

    pub fn invalid_count(&self) -> usize {
        self.value.iter().filter(|e| e.is_none()).count()
    }
}

/// Invert the radiative transfer equation at `temperature`:
///
/// `e = (L_sample - L_down) / (B(T) - L_down)`
///
/// with `L_down` zero when no downwelling radiance is given.
pub fn emissivity_at(
    sample: &Spectrum,
    downwelling: Option<&Spectrum>,
    temperature: f64,
) -> Result<Emissivity> {
    if let Some(down) = downwelling {
        if !sample.same_grid(down) {
            return Err(TesError::data(
                "dwr",
                "downwelling grid differs from the sample grid",
            ));
        }
    }

    let down = downwelling.map(Spectrum::value);
    let value = sample
        .iter()
        .enumerate()
        .map(|(idx, (wavelength, l_sample))| {
            let l_down = down.map_or(0., |d| d[idx]);
            invert(
                l_sample,
                l_down,
                blackbody::radiance_at(temperature, wavelength),
            )
        })
        .collect();

    Ok(Emissivity {
        temperature,
        wavelength: sample.wavelength().to_vec(),
        value,
    })
}

#[inline]
fn invert(l_sample: f64, l_down: f64, l_bb: f64) -> Option<f64> {
    let denominator = l_bb - l_down;
    let scale = l_bb.abs().max(l_down.abs()).max(f64::MIN_POSITIVE);
    if denominator.abs() <= DENOMINATOR_EPSILON * scale {
        return None;
    }
    let e = (l_sample - l_down) / denominator;
    e.is_finite().then(|| e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackbody::radiance;

    fn grid() -> Vec<f64> {
        (0..=60).map(|i| 8. + 0.1 * i as f64).collect()
    }

    #[test]
    fn round_trips_synthetic_sample() -> anyhow::Result<()> {
        let w = grid();
        let t0 = 301.7;
        let eps0: Vec<f64> = w.iter().map(|x| 0.9 + 0.008 * (x - 8.)).collect();
        let down: Vec<f64> = w.iter().map(|x| 2. + 0.1 * (x - 8.).sin()).collect();
        let bb = radiance(t0, &w);
        let sam: Vec<f64> = (0..w.len())
            .map(|i| bb[i] * eps0[i] + (1. - eps0[i]) * down[i])
            .collect();

        let sample = Spectrum::try_new("sam", w.clone(), sam)?;
        let down = Spectrum::try_new("dwr", w, down)?;
        let e = emissivity_at(&sample, Some(&down), t0)?;
        for (got, want) in e.value().iter().zip(eps0.iter()) {
            assert!((got.unwrap() - want).abs() < 1e-6);
        }

        // no state carried between calls
        assert_eq!(emissivity_at(&sample, Some(&down), t0)?, e);
        Ok(())
    }

    #[test]
    fn without_downwelling_is_radiance_ratio() -> anyhow::Result<()> {
        let w = grid();
        let sam: Vec<f64> = radiance(290., &w).iter().map(|l| 0.95 * l).collect();
        let e = emissivity_at(&Spectrum::try_new("sam", w, sam)?, None, 290.)?;
        assert!(e.value().iter().all(|v| (v.unwrap() - 0.95).abs() < 1e-12));
        Ok(())
    }

    #[test]
    fn flags_collapsed_denominator() -> anyhow::Result<()> {
        let w = grid();
        let t = 280.;
        let mut down = vec![1.; w.len()];
        down[10] = radiance(t, &w)[10];
        let sample = Spectrum::try_new("sam", w.clone(), vec![5.; w.len()])?;
        let down = Spectrum::try_new("dwr", w, down)?;

        let e = emissivity_at(&sample, Some(&down), t)?;
        assert_eq!(e.value()[10], None);
        assert_eq!(e.invalid_count(), 1);
        assert!(e.value().iter().flatten().all(|v| v.is_finite()));
        Ok(())
    }

    #[test]
    fn rejects_mismatched_downwelling() -> anyhow::Result<()> {
        let sample = Spectrum::try_new("sam", vec![8., 9.], vec![5., 5.])?;
        let down = Spectrum::try_new("dwr", vec![8., 9.5], vec![1., 1.])?;
        assert!(emissivity_at(&sample, Some(&down), 300.).is_err());
        Ok(())
    }

    #[test]
    fn window_selection() -> anyhow::Result<()> {
        let w = grid();
        let n = w.len();
        let sample = Spectrum::try_new("sam", w, radiance(300., &grid()))?;
        let e = emissivity_at(&sample, None, 300.)?;
        assert_eq!(e.valid_in(Window::new(8., 14.)).count(), n);
        assert_eq!(e.valid_in(Window::new(9.95, 10.25)).count(), 3);
        Ok(())
    }
}
