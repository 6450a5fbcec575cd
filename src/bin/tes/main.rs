mod args;

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use serde_derive::*;

use tes::{
    cli::sweep_progress,
    config::TesConfig,
    search::TracePoint,
    ConsistencyReport, Source, Technique, Window,
};

use args::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::from_cmd_line()?;
    let calibration = args.scans.calibrate()?;

    let config = match &args.config {
        Some(path) => TesConfig::from_json_path(path)?,
        None => TesConfig::default(),
    };
    let params = args
        .overrides
        .apply(config.params(args.technique).clone());
    let plan = args
        .technique
        .plan(&params)
        .with_context(|| format!("invalid {} parameters", args.technique))?;

    let bar = sweep_progress(plan.temperatures.len());
    let result = plan.run_observed(
        &calibration.sample,
        calibration.downwelling.as_ref(),
        |_| {
            bar.inc(1);
            ControlFlow::Continue(())
        },
    )?;
    bar.finish_and_clear();

    let exceeding = calibration.consistency.exceeding(params.tolerance);
    if !exceeding.is_empty() {
        warn!(
            "coadd scans of {} vary by more than {}%, data may be inconsistent",
            exceeding.iter().join(", "),
            params.tolerance
        );
    }
    match result.estimate() {
        Some(t) => info!("estimated temperature: {:.1} K", t),
        None => warn!("temperature could not be determined"),
    }

    #[derive(Debug, Serialize)]
    struct OutputJson<'a> {
        technique: Technique,
        temperature: Option<f64>,
        windows: &'a [Window],
        score: Option<f64>,
        consistency: &'a ConsistencyReport,
        tolerance_exceeded: Vec<Source>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace: Option<&'a [TracePoint]>,
    }

    serde_json::to_writer(
        std::io::stdout().lock(),
        &OutputJson {
            technique: args.technique,
            temperature: result.estimate(),
            windows: &result.windows,
            score: result.best_score,
            consistency: &calibration.consistency,
            tolerance_exceeded: exceeding,
            trace: args.trace.then(|| result.trace.as_slice()),
        },
    )?;

    Ok(())
}
