use anyhow::{ensure, Result};
use itertools::iproduct;
use log::info;
use tes::{
    args_parser,
    cli::{parse_optional, ScanPaths},
    emissivity_at,
    opt,
    search::TemperatureGrid,
    Emissivity,
};

/// Print the emissivity of the calibrated sample at one
/// temperature, or at every candidate temperature of a
/// range, as `temperature,wavelength,emissivity` rows. Bins
/// where the emissivity is undefined have an empty value.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = ScanPaths::args(
        args_parser!("tes-emissivity")
            .about("Emissivity of the sample at candidate temperatures.")
            .arg(
                opt!("temperature")
                    .short("T")
                    .help("Temperature (K)"),
            )
            .arg(opt!("lower temp").help("Lowest temperature of a 0.1 K sweep (K)"))
            .arg(opt!("upper temp").help("Highest temperature of a 0.1 K sweep (K)")),
    )
    .get_matches();

    let scans = ScanPaths::from_matches(&matches)?;
    let temperature: Option<f64> = parse_optional(&matches, "temperature")?;
    let lower: Option<f64> = parse_optional(&matches, "lower temp")?;
    let upper: Option<f64> = parse_optional(&matches, "upper temp")?;

    let temperatures: Vec<f64> = match (temperature, lower, upper) {
        (Some(t), None, None) => vec![t],
        (None, Some(lower), Some(upper)) => TemperatureGrid::new(lower, upper)?.iter().collect(),
        _ => anyhow::bail!("give either `--temperature` or both `--lower-temp` and `--upper-temp`"),
    };
    ensure!(
        temperatures.iter().all(|t| *t > 0.),
        "temperatures must be positive"
    );

    let calibration = scans.calibrate()?;
    let curves = temperatures
        .iter()
        .map(|&t| emissivity_at(&calibration.sample, calibration.downwelling.as_ref(), t))
        .collect::<Result<Vec<Emissivity>, _>>()?;
    info!(
        "{} curve(s) over {} wavelengths",
        curves.len(),
        calibration.sample.len()
    );

    println!("temperature,wavelength,emissivity");
    for (curve, idx) in iproduct!(curves.iter(), 0..calibration.sample.len()) {
        let value = curve.value()[idx]
            .map(|e| e.to_string())
            .unwrap_or_default();
        println!("{},{},{}", curve.temperature, curve.wavelength()[idx], value);
    }

    Ok(())
}
