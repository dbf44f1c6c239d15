use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use epu_report::config::ReportConfig;
use epu_report::report::ReportOptions;
use epu_report::session::DiscoveryRule;

mod config;
mod report;

use config::Config;

/// epu-report - RTF session reports from EPU image metadata
#[derive(Parser, Debug)]
#[command(name = "epu-report")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Top-level images directory [default: Images-Disc1]
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Magnification calibration table (magnification, pixel size in Å)
    #[arg(short, long, value_name = "FILE")]
    calibration: Option<PathBuf>,

    /// Output RTF report [default: report.rtf]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Skip counting frames in movie files
    #[arg(short = 'n', long = "no-scan", visible_alias = "no_scan")]
    no_scan: bool,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Verbosity level [0..4]: 1 summary, 2 directories, 3 files, 4 tags
    #[arg(
        short,
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=4)
    )]
    verbosity: u8,

    /// Debugging output: dump every parsed record, no progress bar
    #[arg(long)]
    debug: bool,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Merge command-line values over config file values over defaults
    fn report_config(&self, file: Config) -> ReportConfig {
        let defaults = ReportConfig::default();
        let session = file.session;

        let mut discovery = DiscoveryRule::default();
        if let Some(dir) = file.discovery.data_dir {
            discovery.data_dir = (!dir.is_empty()).then_some(dir);
        }
        if let Some(prefix) = file.discovery.file_prefix {
            discovery.file_prefix = prefix;
        }

        let options = ReportOptions::default();
        let report = ReportOptions {
            title: file.report.title.unwrap_or(options.title),
            microscope: file.report.microscope,
            collection_method: file.report.collection_method,
            spherical_aberration: file.report.spherical_aberration,
        };

        ReportConfig {
            directory: self
                .directory
                .clone()
                .or(session.directory)
                .unwrap_or(defaults.directory),
            calibration: self.calibration.clone().or(session.calibration),
            output: self
                .output
                .clone()
                .or(session.output)
                .unwrap_or(defaults.output),
            scan_movies: !(self.no_scan || session.no_scan.unwrap_or(false)),
            progress: self.progress || session.progress.unwrap_or(false),
            debug: self.debug,
            discovery,
            report,
        }
    }
}

/// Default log filter for a verbosity level
fn log_filter(verbosity: u8, debug: bool) -> &'static str {
    let verbosity = if debug { verbosity.max(3) } else { verbosity };
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "info,epu_report::session::discovery=debug",
        3 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbosity: u8, debug: bool) {
    let log_level = log_filter(verbosity, debug);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let config = cli.report_config(file);
    report::run(config, cli.verbosity > 0)
}
