//! Helpers shared by the accompanying binaries.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::path::PathBuf;

use anyhow::{Context, Result};
pub use clap::{App, Arg, ArgMatches};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;

use crate::{
    calibrate::{calibrate, Calibration},
    scan::ScanSet,
};

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name).version(clap::crate_version!())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Scan files of one measurement.
pub struct ScanPaths {
    pub cbb: PathBuf,
    pub wbb: PathBuf,
    pub sam: PathBuf,
    pub dwr: Option<PathBuf>,
    pub plate_emissivity: Option<f64>,
}

impl ScanPaths {
    /// Add the scan file options to `app`.
    pub fn args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("cbb")
                .long("cbb")
                .value_name("CBB")
                .required(true)
                .help("Cold blackbody scans (json)"),
        )
        .arg(
            Arg::with_name("wbb")
                .long("wbb")
                .value_name("WBB")
                .required(true)
                .help("Warm blackbody scans (json)"),
        )
        .arg(
            Arg::with_name("sam")
                .long("sam")
                .value_name("SAM")
                .required(true)
                .help("Sample scans (json)"),
        )
        .arg(
            Arg::with_name("dwr")
                .long("dwr")
                .value_name("DWR")
                .help("Downwelling radiance scans off the reflector plate (json)"),
        )
        .arg(
            Arg::with_name("plate emissivity")
                .long("plate-emissivity")
                .short("p")
                .value_name("PLATE_EMISSIVITY")
                .help("Emissivity of the reflector plate.  Default is no plate correction"),
        )
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let path = |name: &str| matches.value_of(name).map(PathBuf::from);
        Ok(ScanPaths {
            cbb: path("cbb").context("missing `--cbb`")?,
            wbb: path("wbb").context("missing `--wbb`")?,
            sam: path("sam").context("missing `--sam`")?,
            dwr: path("dwr"),
            plate_emissivity: parse_optional(matches, "plate emissivity")?,
        })
    }

    /// Read every scan file and calibrate the sample.
    pub fn calibrate(&self) -> Result<Calibration> {
        let cbb = ScanSet::from_json_path("cbb", &self.cbb)?;
        let wbb = ScanSet::from_json_path("wbb", &self.wbb)?;
        let sam = ScanSet::from_json_path("sam", &self.sam)?;
        let dwr = self
            .dwr
            .as_ref()
            .map(|p| ScanSet::from_json_path("dwr", p))
            .transpose()?;
        calibrate(self.plate_emissivity, &cbb, &wbb, &sam, dwr.as_ref())
            .context("calibration failed")
    }
}

/// Parse an optional value, failing on a malformed one.
pub fn parse_optional<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .map(|v| {
            v.parse::<T>()
                .with_context(|| format!("invalid value `{}` for `{}`", v, name))
        })
        .transpose()
}

/// Progress bar over the candidate temperatures of a search.
pub fn sweep_progress(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7} K steps"),
    );
    bar
}
