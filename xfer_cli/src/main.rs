//! # Colxfer CLI Application
//!
//! Runs column load transfers against exported model snapshots.
//!
//! ```text
//! xfer_cli levels   --source building.json
//! xfer_cli cases    --source building.json --analysis-type "Linear Static"
//! xfer_cli layers   --target slab_L2.json
//! xfer_cli transfer --source building.json --target slab_L2.json \
//!     --level L2 --cases DL,LL --layer "Column Loads" \
//!     --source-pt1 0,0 --source-pt2 240,0 --target-pt1 120,60 --target-pt2 120,300
//! ```
//!
//! Calibration points are entered per run; nothing is remembered between runs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::info;

use xfer_core::loads::{AnalysisType, LoadCaseSelection};
use xfer_core::settings::load_settings;
use xfer_core::snapshot::{SourceSnapshot, TargetFile, TargetSnapshot};
use xfer_core::{
    CorrespondencePair, Point2D, SourceModel, TargetModel, TransferReport, TransferSession,
    TransferSettings, XferResult,
};

#[derive(Parser, Debug)]
#[command(
    name = "xfer_cli",
    version,
    about = "Transfer column axial loads onto a slab loading layer"
)]
struct Cli {
    /// Settings JSON file (defaults are used when omitted)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the source model's levels
    Levels {
        #[arg(long, value_name = "FILE")]
        source: PathBuf,
    },
    /// List the source model's load cases
    Cases {
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// Only cases of this analysis type (e.g. "Linear Static")
        #[arg(long, value_parser = parse_analysis_type)]
        analysis_type: Option<AnalysisType>,

        /// Ignore the configured analysis type and list every case
        #[arg(long, conflicts_with = "analysis_type")]
        all: bool,
    },
    /// List the target model's loading layers
    Layers {
        #[arg(long, value_name = "FILE")]
        target: PathBuf,
    },
    /// Calibrate, aggregate and write loads for one level
    Transfer(TransferArgs),
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long, value_name = "FILE")]
    source: PathBuf,

    #[arg(long, value_name = "FILE")]
    target: PathBuf,

    /// Source level whose columns are transferred
    #[arg(long)]
    level: String,

    /// Load cases, comma separated; more than one is summed
    #[arg(long, value_delimiter = ',', required = true)]
    cases: Vec<String>,

    /// Target loading layer receiving the point loads
    #[arg(long)]
    layer: String,

    /// Reference point 1 in source coordinates, "x,y"
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    source_pt1: String,

    /// Reference point 2 in source coordinates, "x,y"
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    source_pt2: String,

    /// Reference point 1 in target coordinates, "x,y"
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    target_pt1: String,

    /// Reference point 2 in target coordinates, "x,y"
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    target_pt2: String,

    /// Name recorded in the target lock file
    #[arg(long)]
    user: Option<String>,

    /// Compute and print the loads without touching the target file
    #[arg(long)]
    dry_run: bool,
}

fn parse_analysis_type(s: &str) -> Result<AnalysisType, String> {
    AnalysisType::from_name(s).ok_or_else(|| {
        let names: Vec<_> = AnalysisType::ALL.iter().map(|t| t.display_name()).collect();
        format!("unknown analysis type '{}', expected one of: {}", s, names.join(", "))
    })
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> XferResult<()> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => TransferSettings::default(),
    };

    match cli.command {
        Command::Levels { source } => {
            let source = SourceSnapshot::load(&source)?;
            for level in source.levels()? {
                println!("{}", level);
            }
        }
        Command::Cases {
            source,
            analysis_type,
            all,
        } => {
            let source = SourceSnapshot::load(&source)?;
            let filter = if all { None } else { analysis_type.or(settings.analysis_type) };
            for case in source.load_cases(filter)? {
                println!("{}", case);
            }
        }
        Command::Layers { target } => {
            let target = TargetSnapshot::load(&target)?;
            for layer in target.loading_layers()? {
                println!("{}", layer);
            }
        }
        Command::Transfer(args) => transfer(args, settings)?,
    }
    Ok(())
}

fn transfer(args: TransferArgs, settings: TransferSettings) -> XferResult<()> {
    // Validate everything typed by the user before opening either model
    let pair = CorrespondencePair::new(
        Point2D::parse_pair("source point 1", &args.source_pt1)?,
        Point2D::parse_pair("source point 2", &args.source_pt2)?,
        Point2D::parse_pair("target point 1", &args.target_pt1)?,
        Point2D::parse_pair("target point 2", &args.target_pt2)?,
    )?;
    let selection = LoadCaseSelection::new(args.cases.iter().map(|c| c.trim().to_string()))?;

    let source = SourceSnapshot::load(&args.source)?;

    let report = if args.dry_run {
        let target = TargetSnapshot::load(&args.target)?;
        let settings = TransferSettings {
            save_after_write: false,
            ..settings
        };
        run_session(source, target, settings, &pair, &args, &selection)?
    } else {
        let user = args.user.clone().unwrap_or_else(current_user);
        let target = TargetFile::open(&args.target, user)?;
        run_session(source, target, settings, &pair, &args, &selection)?
    };

    print_report(&report, args.dry_run);
    Ok(())
}

fn run_session<T: TargetModel>(
    source: SourceSnapshot,
    target: T,
    settings: TransferSettings,
    pair: &CorrespondencePair,
    args: &TransferArgs,
    selection: &LoadCaseSelection,
) -> XferResult<TransferReport> {
    let mut session = TransferSession::pull_data(source, target, settings)?;

    let calibration = session.calibrate(pair)?;
    println!("Calibration:");
    println!("  Rotation:    {:.4} deg", calibration.angle_degrees());
    println!("  Translation: {}", calibration.translation());
    println!(
        "  Point 2 residual: {:.3} (scale ratio {:.4})",
        calibration.quality.point2_error, calibration.quality.scale_ratio
    );
    println!();

    let report = session.transfer(&args.level, selection, &args.layer)?;

    let key = report.key.clone();
    let batch = session.preview(&args.level, &key)?;
    println!("{:<12} {:>12} {:>12} {:>14}", "Column", "X", "Y", key.display_name());
    let rows = batch.column_ids.iter().zip(&batch.xs).zip(&batch.ys).zip(&batch.values);
    for (((id, x), y), value) in rows {
        println!("{:<12} {:>12.2} {:>12.2} {:>14.1}", id, x, y, value);
    }
    println!();

    info!("Session {} finished", session.id());
    Ok(report)
}

fn print_report(report: &TransferReport, dry_run: bool) {
    println!("═══════════════════════════════════════");
    println!("  LOAD TRANSFER {}", if dry_run { "(DRY RUN)" } else { "COMPLETE" });
    println!("═══════════════════════════════════════");
    println!("  Level:   {}", report.level);
    println!("  Layer:   {}", report.layer);
    println!("  Key:     {}", report.key_name);
    println!("  Columns: {}", report.column_count);
    println!("  Total:   {:.1}", report.total);
    println!("  Saved:   {}", status_icon(report.saved));
    println!("═══════════════════════════════════════");

    println!();
    println!("JSON Output:");
    if let Ok(json) = serde_json::to_string_pretty(report) {
        println!("{}", json);
    }
}

fn status_icon(ok: bool) -> &'static str {
    if ok { "[OK]" } else { "[NO]" }
}
