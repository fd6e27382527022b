use eyre::{Result, WrapErr};
use pingsweep::pretty;
use pingsweep::{Interrupt, PingProber, ScanCoordinator, ScanError};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging first
    if let Err(e) = pingsweep::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    // Add a divider to separate runs
    log::info!("================================================================================");
    log::info!("NEW SWEEP SESSION STARTING");
    log::info!("================================================================================");

    let cli = pingsweep::cli::parse();

    let config = cli.scan_config();
    config.validate().wrap_err("Refusing to start scan")?;

    let list = pingsweep::load_ranges(&cli.input)?;
    pretty::print_range_errors(&list.errors);
    if list.is_empty() {
        eyre::bail!("No valid ranges found in {}", cli.input.display());
    }

    let interrupt = Interrupt::new();
    {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received - finishing in-flight probes and saving partial results...");
                interrupt.trigger();
            }
        });
    }

    let mut coordinator = ScanCoordinator::new(config.clone(), Arc::new(PingProber::default()), Box::new(cli.sink()));
    if !cli.quiet {
        coordinator = coordinator.with_progress(pretty::progress_printer(cli.progress_every));
    }

    let planned = coordinator.planned(&list.ranges)?;
    if !cli.quiet {
        pretty::print_plan(&config, list.ranges.len(), planned);
    }

    let destination = coordinator.sink_description();
    match coordinator.run(&list.ranges, &interrupt).await {
        Ok(report) => {
            pretty::print_summary(&report, &destination);
            Ok(())
        }
        Err(ScanError::ProbeInvocation { source, report }) => {
            pretty::print_summary(&report, &destination);
            Err(source).wrap_err("Scan aborted: the ping mechanism is unusable")
        }
        Err(ScanError::SinkWrite { source, report }) => {
            pretty::print_unsaved(&report);
            Err(source).wrap_err("Failed to save scan results")
        }
        Err(e) => Err(e.into()),
    }
}
