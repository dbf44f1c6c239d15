use anyhow::{Context, Result};
use log::info;

use epu_report::config::ReportConfig;
use epu_report::pipeline;

/// Build the session report
pub fn run(config: ReportConfig, print_summary: bool) -> Result<()> {
    info!("EPU Session Report");
    info!("==================");
    info!("Directory: {}", config.directory.display());
    info!("Output: {}", config.output.display());
    match &config.calibration {
        Some(path) => info!("Calibration: {}", path.display()),
        None => info!("Calibration: none, using instrument pixel size"),
    }
    if !config.scan_movies {
        info!("Movie scanning disabled");
    }

    let outcome = pipeline::run(&config)
        .with_context(|| format!("Failed to build report for {}", config.directory.display()))?;

    if print_summary {
        // Use colorized output if available
        #[cfg(feature = "colorized_output")]
        {
            println!("{}", outcome.format_colored());
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            println!("{}", outcome);
        }
    }

    Ok(())
}
