use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;

use iimi_report::reference::write_all_otu_fasta;
use iimi_report::{build_report, ReportInputs};

/// Build the Iimi detection report from classifier output and a model release.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The model release's `reference.json.gz`
    #[arg(long)]
    reference: PathBuf,

    /// The model release's `reps_by_sequence.csv`
    #[arg(long)]
    reps_by_sequence: PathBuf,

    /// Directory holding coverage.csv, untrustworthy.csv and prediction_sequence.csv
    #[arg(long)]
    output_dir: PathBuf,

    /// Where to write the JSON report
    #[arg(long, default_value = "result.json")]
    result: PathBuf,

    /// Also write every reference sequence to this FASTA file
    #[arg(long)]
    all_otu_fasta: Option<PathBuf>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&format!("{{spinner:.{color}}} {{msg}}"))
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            log::warn!("Could not size the thread pool: {e}");
        }
    }

    let inputs = ReportInputs::from_output_dir(&args.reference, &args.reps_by_sequence, &args.output_dir);

    // 1. Reconcile predictions with the reference
    let spinner_build = spinner("green", "Building report...");
    let report = match build_report(&inputs) {
        Ok(report) => report,
        Err(e) => {
            spinner_build.abandon_with_message("Report failed.");
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    spinner_build.finish_with_message(format!(
        "Report built: {} OTUs, {} positive.",
        report.hits.len(),
        report.positive_count()
    ));

    // 2. Write the result document
    let spinner_write = spinner("yellow", "Writing report...");
    if let Err(e) = report.write_json(&args.result) {
        spinner_write.abandon_with_message("Writing failed.");
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    spinner_write.finish_with_message(format!("Report written to {}.", args.result.display()));

    // 3. Optionally dump the reference as FASTA
    if let Some(fasta) = &args.all_otu_fasta {
        let spinner_fasta = spinner("cyan", "Writing reference FASTA...");
        if let Err(e) = write_all_otu_fasta(&args.reference, fasta) {
            spinner_fasta.abandon_with_message("Writing FASTA failed.");
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
        spinner_fasta.finish_with_message(format!("FASTA written to {}.", fasta.display()));
    }

    ExitCode::SUCCESS
}
