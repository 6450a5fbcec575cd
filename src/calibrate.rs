//! Two-point blackbody radiometric calibration.
//!
//! The instrument response in each wavelength bin is taken
//! to be linear: `raw = gain * radiance + offset`. Viewing a
//! cold and a warm blackbody of known temperature gives two
//! points on that line, which is then inverted for the
//! sample and (optionally) the downwelling scans.

use std::fmt;

use log::debug;
use ndarray::{Array1, Axis, Zip};
use serde_derive::*;

use crate::{
    blackbody,
    error::{Result, TesError},
    scan::ScanSet,
    spectrum::Spectrum,
};

/// The scanned sources, in the order their consistency
/// ratios are reported.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cbb,
    Wbb,
    Sam,
    Dwr,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::Cbb => "cbb",
            Source::Wbb => "wbb",
            Source::Sam => "sam",
            Source::Dwr => "dwr",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coadd consistency of each scanned source.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub ratios: Vec<(Source, f64)>,
}

impl ConsistencyReport {
    pub fn ratio(&self, source: Source) -> Option<f64> {
        self.ratios
            .iter()
            .find_map(|&(s, r)| (s == source).then(|| r))
    }

    /// Sources whose coadds disagree by more than
    /// `tolerance_percent` percent.
    pub fn exceeding(&self, tolerance_percent: f64) -> Vec<Source> {
        self.ratios
            .iter()
            .filter(|(_, r)| 100. - r * 100. > tolerance_percent)
            .map(|&(s, _)| s)
            .collect()
    }

    pub fn exceeds_tolerance(&self, tolerance_percent: f64) -> bool {
        !self.exceeding(tolerance_percent).is_empty()
    }
}

/// Output of [`calibrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub sample: Spectrum,
    pub downwelling: Option<Spectrum>,
    pub consistency: ConsistencyReport,
}

/// Calibrate the sample (and downwelling) scans against the
/// cold and warm blackbody scans.
///
/// `plate_emissivity` is the emissivity of the reflector plate
/// the downwelling scan looks at, with the plate temperature
/// carried on the `dwr` scan set. `None` leaves the
/// downwelling radiance uncorrected.
pub fn calibrate(
    plate_emissivity: Option<f64>,
    cbb: &ScanSet,
    wbb: &ScanSet,
    sam: &ScanSet,
    dwr: Option<&ScanSet>,
) -> Result<Calibration> {
    let wavelength = cbb.wavelength();
    for (source, scan) in [(Source::Wbb, wbb), (Source::Sam, sam)]
        .into_iter()
        .chain(dwr.map(|d| (Source::Dwr, d)))
    {
        if scan.wavelength() != wavelength {
            return Err(TesError::data(
                source.name(),
                "wavelength grid differs from the cbb grid",
            ));
        }
    }

    let t_cold = reference_temperature(Source::Cbb, cbb)?;
    let t_warm = reference_temperature(Source::Wbb, wbb)?;
    if t_cold == t_warm {
        return Err(TesError::data(
            Source::Wbb.name(),
            format!("warm and cold blackbodies are both at {} K", t_warm),
        ));
    }

    let response = Response::from_blackbodies(wavelength, t_cold, &cbb.mean(), t_warm, &wbb.mean())?;

    let sample = Spectrum::try_new(
        Source::Sam.name(),
        wavelength.to_vec(),
        response.radiance(&sam.mean()).to_vec(),
    )?;

    let downwelling = dwr
        .map(|dwr| -> Result<Spectrum> {
            let mut radiance = response.radiance(&dwr.mean());
            if let Some(eps) = plate_emissivity {
                correct_for_plate(&mut radiance, wavelength, eps, dwr)?;
            }
            Spectrum::try_new(Source::Dwr.name(), wavelength.to_vec(), radiance.to_vec())
        })
        .transpose()?;

    let consistency = ConsistencyReport {
        ratios: [(Source::Cbb, cbb), (Source::Wbb, wbb), (Source::Sam, sam)]
            .into_iter()
            .chain(dwr.map(|d| (Source::Dwr, d)))
            .map(|(source, scan)| {
                let ratio = consistency_ratio(scan);
                debug!(
                    "{}: {} coadds, consistency ratio {:.6}",
                    source,
                    scan.coadd_count(),
                    ratio
                );
                (source, ratio)
            })
            .collect(),
    };

    Ok(Calibration {
        sample,
        downwelling,
        consistency,
    })
}

fn reference_temperature(source: Source, scan: &ScanSet) -> Result<f64> {
    scan.temperature()
        .ok_or_else(|| TesError::data(source.name(), "missing blackbody temperature"))
}

/// Per-bin linear instrument response.
struct Response {
    gain: Array1<f64>,
    offset: Array1<f64>,
}

impl Response {
    fn from_blackbodies(
        wavelength: &[f64],
        t_cold: f64,
        cold: &Array1<f64>,
        t_warm: f64,
        warm: &Array1<f64>,
    ) -> Result<Self> {
        let b_cold = Array1::from(blackbody::radiance(t_cold, wavelength));
        let b_warm = Array1::from(blackbody::radiance(t_warm, wavelength));

        if let Some(idx) = Zip::from(cold)
            .and(warm)
            .map_collect(|c, w| c == w)
            .iter()
            .position(|&same| same)
        {
            return Err(TesError::data(
                Source::Wbb.name(),
                format!(
                    "warm and cold raw signals are equal at {} um",
                    wavelength[idx]
                ),
            ));
        }
        if let Some(idx) = Zip::from(&b_cold)
            .and(&b_warm)
            .map_collect(|c, w| !(w - c).is_normal())
            .iter()
            .position(|&flat| flat)
        {
            return Err(TesError::data(
                Source::Cbb.name(),
                format!(
                    "reference radiances are indistinguishable at {} um",
                    wavelength[idx]
                ),
            ));
        }

        // gain = (W - C) / (B(Tw) - B(Tc)), offset = C - gain B(Tc)
        let gain = (warm - cold) / (&b_warm - &b_cold);
        let offset = cold - &(&gain * &b_cold);
        Ok(Response { gain, offset })
    }

    fn radiance(&self, raw: &Array1<f64>) -> Array1<f64> {
        (raw - &self.offset) / &self.gain
    }
}

// L = (1 - e) L_down + e B(Tp)  =>  L_down = (L - e B(Tp)) / (1 - e)
fn correct_for_plate(
    radiance: &mut Array1<f64>,
    wavelength: &[f64],
    emissivity: f64,
    dwr: &ScanSet,
) -> Result<()> {
    if !(0. ..1.).contains(&emissivity) {
        return Err(TesError::data(
            Source::Dwr.name(),
            format!("plate emissivity {} is outside [0, 1)", emissivity),
        ));
    }
    let t_plate = dwr
        .temperature()
        .ok_or_else(|| TesError::data(Source::Dwr.name(), "missing plate temperature"))?;
    let plate = Array1::from(blackbody::radiance(t_plate, wavelength));
    Zip::from(radiance)
        .and(&plate)
        .for_each(|l, &b| *l = (*l - emissivity * b) / (1. - emissivity));
    Ok(())
}

/// Agreement between the coadds of a scan set.
///
/// This is one minus the summed spread between the upper and
/// lower coadd envelopes relative to the summed upper
/// envelope magnitude; for positive signals it is the ratio
/// of the lower envelope to the upper envelope. Bit-identical
/// coadds give exactly 1.0 and any difference gives less.
pub fn consistency_ratio(scan: &ScanSet) -> f64 {
    let coadds = scan.coadds();
    let upper = coadds.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
    let lower = coadds.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
    let magnitude = coadds.fold_axis(Axis(0), 0., |&acc: &f64, &v: &f64| acc.max(v.abs()));

    let spread: f64 = (&upper - &lower).sum();
    if spread == 0. {
        return 1.;
    }
    let scale = magnitude.sum();
    (1. - spread / scale).clamp(0., 1. - f64::EPSILON / 2.)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (0..=60).map(|i| 8. + 0.1 * i as f64).collect()
    }

    // Raw counts for a given radiance with a wavelength dependent
    // gain and offset.
    fn raw_counts(radiance: &[f64], wavelength: &[f64]) -> Vec<f64> {
        radiance
            .iter()
            .zip(wavelength)
            .map(|(l, w)| (40. + 3. * w) * l + 150. - w)
            .collect()
    }

    fn blackbody_scan(origin: &'static str, t: f64) -> ScanSet {
        let w = grid();
        let raw = raw_counts(&blackbody::radiance(t, &w), &w);
        ScanSet::from_rows(origin, w, vec![raw.clone(), raw], Some(t)).unwrap()
    }

    fn radiance_scan(origin: &'static str, radiance: &[f64], t: Option<f64>) -> ScanSet {
        let w = grid();
        let raw = raw_counts(radiance, &w);
        ScanSet::from_rows(origin, w, vec![raw], t).unwrap()
    }

    #[test]
    fn recovers_sample_radiance() -> anyhow::Result<()> {
        let w = grid();
        let truth: Vec<f64> = blackbody::radiance(295., &w)
            .into_iter()
            .map(|l| 0.97 * l)
            .collect();
        let cal = calibrate(
            None,
            &blackbody_scan("cbb", 300.),
            &blackbody_scan("wbb", 310.),
            &radiance_scan("sam", &truth, None),
            None,
        )?;
        for (got, want) in cal.sample.value().iter().zip(truth.iter()) {
            assert!((got - want).abs() < 1e-9 * want.abs().max(1.));
        }
        assert!(cal.downwelling.is_none());
        assert_eq!(cal.consistency.ratios.len(), 3);
        Ok(())
    }

    #[test]
    fn plate_correction_recovers_downwelling() -> anyhow::Result<()> {
        let w = grid();
        let sky: Vec<f64> = w.iter().map(|x| 1.5 + 0.05 * x).collect();
        let eps = 0.04;
        let plate = blackbody::radiance(298., &w);
        let measured: Vec<f64> = sky
            .iter()
            .zip(plate.iter())
            .map(|(s, p)| (1. - eps) * s + eps * p)
            .collect();
        let sam = radiance_scan("sam", &blackbody::radiance(295., &w), None);
        let dwr = radiance_scan("dwr", &measured, Some(298.));
        let cbb = blackbody_scan("cbb", 300.);
        let wbb = blackbody_scan("wbb", 310.);

        let corrected = calibrate(Some(eps), &cbb, &wbb, &sam, Some(&dwr))?;
        let down = corrected.downwelling.unwrap();
        for (got, want) in down.value().iter().zip(sky.iter()) {
            assert!((got - want).abs() < 1e-9);
        }

        let uncorrected = calibrate(None, &cbb, &wbb, &sam, Some(&dwr))?;
        for (got, want) in uncorrected.downwelling.unwrap().value().iter().zip(measured.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn plate_correction_requires_plate_temperature() {
        let w = grid();
        let dwr = radiance_scan("dwr", &vec![1.; w.len()], None);
        let err = calibrate(
            Some(0.1),
            &blackbody_scan("cbb", 300.),
            &blackbody_scan("wbb", 310.),
            &radiance_scan("sam", &vec![5.; w.len()], None),
            Some(&dwr),
        )
        .unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "dwr", .. }));
    }

    #[test]
    fn rejects_mismatched_grid() {
        let sam = ScanSet::from_rows("sam", vec![8., 9.], vec![vec![1., 1.]], None).unwrap();
        let err = calibrate(
            None,
            &blackbody_scan("cbb", 300.),
            &blackbody_scan("wbb", 310.),
            &sam,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "sam", .. }));
    }

    #[test]
    fn rejects_missing_blackbody_temperature() {
        let w = grid();
        let cbb = ScanSet::from_rows("cbb", w.clone(), vec![vec![1.; w.len()]], None).unwrap();
        let err = calibrate(
            None,
            &cbb,
            &blackbody_scan("wbb", 310.),
            &blackbody_scan("sam", 295.),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "cbb", .. }));
    }

    #[test]
    fn rejects_equal_reference_signals() {
        let cbb = blackbody_scan("cbb", 300.);
        let w = grid();
        let wbb = ScanSet::from_rows("wbb", w, vec![cbb.mean().to_vec()], Some(310.)).unwrap();
        let err = calibrate(None, &cbb, &wbb, &blackbody_scan("sam", 295.), None).unwrap_err();
        assert!(matches!(err, TesError::Data { origin: "wbb", .. }));
    }

    #[test]
    fn identical_coadds_are_fully_consistent() -> anyhow::Result<()> {
        let scan = ScanSet::from_rows(
            "sam",
            vec![8., 9., 10.],
            vec![vec![3., 4., 5.], vec![3., 4., 5.], vec![3., 4., 5.]],
            None,
        )?;
        assert_eq!(consistency_ratio(&scan), 1.);

        let single = ScanSet::from_rows("sam", vec![8., 9.], vec![vec![3., -4.]], None)?;
        assert_eq!(consistency_ratio(&single), 1.);
        Ok(())
    }

    #[test]
    fn differing_coadds_are_less_consistent() -> anyhow::Result<()> {
        let scan = ScanSet::from_rows(
            "sam",
            vec![8., 9., 10.],
            vec![vec![3., 4., 5.], vec![3., 4., 5.000001]],
            None,
        )?;
        let ratio = consistency_ratio(&scan);
        assert!(ratio < 1.);
        assert!(ratio > 0.99);

        let scan = ScanSet::from_rows(
            "sam",
            vec![8., 9.],
            vec![vec![10., 10.], vec![5., 5.]],
            None,
        )?;
        assert!((consistency_ratio(&scan) - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn one_ulp_in_one_bin_is_inconsistent() -> anyhow::Result<()> {
        let w: Vec<f64> = (0..121).map(|i| 8. + 0.05 * i as f64).collect();
        let first = vec![1000.; 121];
        let mut second = first.clone();
        second[60] = f64::from_bits(1000f64.to_bits() + 1);
        let scan = ScanSet::from_rows("sam", w, vec![first, second], None)?;
        assert!(consistency_ratio(&scan) < 1.);
        Ok(())
    }

    #[test]
    fn tolerance_check() {
        let report = ConsistencyReport {
            ratios: vec![(Source::Cbb, 0.999), (Source::Sam, 0.95)],
        };
        assert_eq!(report.exceeding(1.), vec![Source::Sam]);
        assert!(report.exceeds_tolerance(1.));
        assert!(!report.exceeds_tolerance(5.));
        assert_eq!(report.ratio(Source::Sam), Some(0.95));
        assert_eq!(report.ratio(Source::Dwr), None);
    }
}
