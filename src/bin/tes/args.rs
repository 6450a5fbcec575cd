use std::path::PathBuf;

use anyhow::Result;
use tes::{
    args_parser,
    cli::{parse_optional, ScanPaths},
    opt, Technique, TechniqueParams,
};

/// Values given on the command line replace the configured
/// ones.
pub struct Overrides {
    pub tolerance: Option<f64>,
    pub lower_temp: Option<f64>,
    pub upper_temp: Option<f64>,
    pub lower_wave: Option<f64>,
    pub upper_wave: Option<f64>,
    pub lower_win: Option<f64>,
    pub upper_win: Option<f64>,
    pub window_step: Option<f64>,
    pub num_windows: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, mut params: TechniqueParams) -> TechniqueParams {
        if let Some(v) = self.tolerance {
            params.tolerance = v;
        }
        if let Some(v) = self.lower_temp {
            params.temperature.lower = v;
        }
        if let Some(v) = self.upper_temp {
            params.temperature.upper = v;
        }
        if let Some(v) = self.lower_wave {
            params.wavelength.lower = v;
        }
        if let Some(v) = self.upper_wave {
            params.wavelength.upper = v;
        }
        params.lower_window = self.lower_win.or(params.lower_window);
        params.upper_window = self.upper_win.or(params.upper_window);
        params.window_step = self.window_step.or(params.window_step);
        params.num_windows = self.num_windows.or(params.num_windows);
        params
    }
}

pub struct Args {
    pub scans: ScanPaths,
    pub technique: Technique,
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub trace: bool,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = ScanPaths::args(
            args_parser!("tes")
                .about("Estimate sample temperature and emissivity from calibrated spectra.")
                .arg(
                    opt!("technique")
                        .short("t")
                        .help("waterband, standard, moving-window, variable-moving-window or multiple-moving-window.  Default is standard"),
                )
                .arg(opt!("config").short("c").help("Technique defaults (json)"))
                .arg(opt!("tolerance").help("Acceptable coadd variation in percent"))
                .arg(opt!("lower temp").help("Lowest candidate temperature (K)"))
                .arg(opt!("upper temp").help("Highest candidate temperature (K)"))
                .arg(opt!("lower wave").help("Start of the search band (um)"))
                .arg(opt!("upper wave").help("End of the search band (um)"))
                .arg(opt!("lower win").help("Narrowest window width (um)"))
                .arg(opt!("upper win").help("Widest window width (um)"))
                .arg(opt!("window step").help("Window width step (um)"))
                .arg(opt!("num windows").help("Number of windows placed together"))
                .arg(
                    opt!("trace")
                        .takes_value(false)
                        .help("Include the per-temperature metric trace in the output"),
                ),
        )
        .get_matches();

        let technique = parse_optional(&matches, "technique")?.unwrap_or(Technique::Standard);
        let overrides = Overrides {
            tolerance: parse_optional(&matches, "tolerance")?,
            lower_temp: parse_optional(&matches, "lower temp")?,
            upper_temp: parse_optional(&matches, "upper temp")?,
            lower_wave: parse_optional(&matches, "lower wave")?,
            upper_wave: parse_optional(&matches, "upper wave")?,
            lower_win: parse_optional(&matches, "lower win")?,
            upper_win: parse_optional(&matches, "upper win")?,
            window_step: parse_optional(&matches, "window step")?,
            num_windows: parse_optional(&matches, "num windows")?,
        };

        Ok(Args {
            scans: ScanPaths::from_matches(&matches)?,
            technique,
            config: matches.value_of("config").map(PathBuf::from),
            overrides,
            trace: matches.is_present("trace"),
        })
    }
}
