use clap::Parser;
use log::{error, info};
use roi_volume::{
    TextReport, VolumeError, VolumeReport,
    cli::{Cli, Command, OutputFormat},
    traverse, volumer,
};
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let code = match &cli.command {
        Command::Compute {
            reference,
            mask,
            kind,
            labels,
        } => run_compute(reference, mask, kind, labels.as_deref(), cli.format),
        Command::Batch { root, roi, kind } => run_batch(root, roi, kind, cli.format),
    };
    process::exit(code);
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run_compute(
    reference: &Path,
    mask: &Path,
    kind: &str,
    labels: Option<&[i32]>,
    format: OutputFormat,
) -> i32 {
    let result =
        volumer::create(kind).and_then(|volumer| volumer.compute(reference, mask, labels));
    match result {
        Ok(report) => {
            output_report(&report, format);
            0
        }
        Err(e) => {
            output_error(&e, format);
            1
        }
    }
}

fn run_batch(root: &Path, roi: &Path, kind: &str, format: OutputFormat) -> i32 {
    let setup = volumer::create(kind).and_then(|v| Ok((v, traverse::batch_jobs(root, roi)?)));
    let (volumer, jobs) = match setup {
        Ok(setup) => setup,
        Err(e) => {
            output_error(&e, format);
            return 1;
        }
    };

    info!("Found {} series directories under {}", jobs.len(), root.display());

    let mut failures = 0;
    for job in &jobs {
        let result = volumer.compute(&job.directory, &job.mask, None);
        if let Err(e) = &result {
            failures += 1;
            error!("{}: {}", job.directory.display(), e);
        }
        match format {
            OutputFormat::Text => {
                println!("{}", job.directory.display());
                match &result {
                    Ok(report) => println!("{}", TextReport::new(report)),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            OutputFormat::Json => print_json_batch_entry(&job.directory, &result),
        }
    }

    info!("Processed {} directories, {} failed", jobs.len(), failures);
    if failures == jobs.len() && !jobs.is_empty() { 1 } else { 0 }
}

fn output_report(report: &VolumeReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", TextReport::new(report)),
        OutputFormat::Json => print_json_report(report),
    }
}

fn output_error(err: &VolumeError, format: OutputFormat) {
    error!("Volume computation failed: {}", err);
    match format {
        OutputFormat::Text => eprintln!("Error: {}", err),
        OutputFormat::Json => print_json_error(err),
    }
}

#[cfg(feature = "json")]
fn print_json_report(report: &VolumeReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize report: {}", e),
    }
}

#[cfg(feature = "json")]
fn print_json_error(err: &VolumeError) {
    let mut json = roi_volume::report::json_error(err);
    json["status"] = "error".into();
    println!("{}", json);
}

/// One compact object per line, so a batch run reads as JSON lines
#[cfg(feature = "json")]
fn print_json_batch_entry(directory: &Path, result: &roi_volume::Result<VolumeReport>) {
    println!("{}", roi_volume::report::json_batch_entry(directory, result));
}

#[cfg(not(feature = "json"))]
fn print_json_report(report: &VolumeReport) {
    eprintln!("Error: JSON output requires the 'json' feature");
    println!("{}", TextReport::new(report));
}

#[cfg(not(feature = "json"))]
fn print_json_error(err: &VolumeError) {
    eprintln!("Error: {}", err);
}

#[cfg(not(feature = "json"))]
fn print_json_batch_entry(directory: &Path, result: &roi_volume::Result<VolumeReport>) {
    println!("{}", directory.display());
    match result {
        Ok(report) => print_json_report(report),
        Err(e) => print_json_error(e),
    }
}
