//! ERP Monitor - daily equity risk premium report.
//!
//! Intended for a once-a-day scheduler: exits 0 after publishing, non-zero
//! with the error on stderr otherwise.

use anyhow::Result;
use erp_common::config::Config;
use erp_common::logging::init_logging;
use erp_monitor::sheets::render_table;
use erp_monitor::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let started = std::time::Instant::now();

    let config = Config::load_with_env()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("ERP Monitor v{}", env!("CARGO_PKG_VERSION"));
    config.log_rejected_overrides();

    config.validate()?;

    let pipeline = Pipeline::from_config(&config)?;
    let outcome = pipeline.run().await?;

    match &outcome.handle {
        Some(handle) => println!("{}", handle.url),
        None => print!("{}", render_table(&outcome.report)),
    }
    println!("{}", outcome.report.summary());

    tracing::info!(
        duration_ms = started.elapsed().as_millis() as u64,
        incomplete = outcome.report.is_incomplete(),
        "Run finished"
    );
    Ok(())
}
