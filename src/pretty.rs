use crate::config::ScanConfig;
use crate::coordinator::{Progress, ProgressCallback};
use crate::error::RangeParseError;
use crate::types::{ScanReport, ScanState};
use std::time::Duration;

const SEPARATOR_WIDTH: usize = 80;
const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

pub fn print_separator() {
    println!("{}", "─".repeat(SEPARATOR_WIDTH));
}

pub fn print_range_errors(errors: &[RangeParseError]) {
    for error in errors {
        eprintln!("⚠️  Skipping {}", error);
    }
}

pub fn print_plan(config: &ScanConfig, ranges: usize, planned: u64) {
    println!(
        "Mode={}. Ranges={}. Candidate IPs to test: {}. Workers={}. Timeout={}",
        config.mode,
        ranges,
        planned,
        config.workers,
        format_timeout(config.timeout)
    );
    print_separator();
}

/// Formats one progress line, e.g. `[50/1200] 10.0.0.49 -> dead  (live 3, rate 71.3 ip/s)`.
pub fn format_progress(progress: &Progress) -> String {
    format!(
        "[{}/{}] {} -> {}  (live {}, rate {:.1} ip/s)",
        progress.processed,
        progress.planned,
        progress.address,
        if progress.reachable { "LIVE" } else { "dead" },
        progress.live,
        progress.rate()
    )
}

/// Prints every live host and every `every`-th processed address.
pub fn progress_printer(every: u64) -> ProgressCallback {
    Box::new(move |progress: &Progress| {
        let on_tick = every > 0 && progress.processed % every == 0;
        if progress.reachable || on_tick {
            println!("{}", format_progress(progress));
        }
    })
}

pub fn print_summary(report: &ScanReport, destination: &str) {
    println!();
    print_separator();

    let icon = match report.state {
        ScanState::Complete => "✅",
        ScanState::Interrupted => "⏸️",
        ScanState::Failed => "❌",
        ScanState::Idle | ScanState::Running => "🔄",
    };

    match report.state {
        ScanState::Complete => {
            println!("{} Finished. Live hosts found: {}", icon, report.live_count());
        }
        ScanState::Interrupted => {
            println!(
                "{} Interrupted after {}/{} addresses. Live hosts found so far: {}",
                icon,
                report.probed,
                report.planned,
                report.live_count()
            );
        }
        ScanState::Failed => {
            println!(
                "{} Aborted after {}/{} addresses. Live hosts found so far: {}",
                icon,
                report.probed,
                report.planned,
                report.live_count()
            );
            if let Some(failure) = &report.failure {
                println!("  └─ Cause: {}", failure);
            }
        }
        ScanState::Idle | ScanState::Running => {
            println!("{} Scan did not finish", icon);
        }
    }

    println!("  └─ Elapsed: {}", format_duration(report.elapsed));
    println!("Results saved to {}", destination);
}

pub fn print_unsaved(report: &ScanReport) {
    eprintln!("❌ Could not save results. {} live hosts found:", report.live_count());
    for host in &report.hosts {
        println!("{}\t{}", host.address, host.source_range);
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}s", timeout.as_secs_f64())
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < SECONDS_PER_MINUTE {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < SECONDS_PER_HOUR {
        format!("{}m {}s", secs / SECONDS_PER_MINUTE, secs % SECONDS_PER_MINUTE)
    } else {
        format!("{}h {}m", secs / SECONDS_PER_HOUR, (secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_format_progress() {
        let progress = Progress {
            processed: 50,
            planned: 1200,
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 49)),
            reachable: false,
            live: 3,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(format_progress(&progress), "[50/1200] 10.0.0.49 -> dead  (live 3, rate 25.0 ip/s)");

        let live = Progress { reachable: true, ..progress };
        assert!(format_progress(&live).contains("-> LIVE"));
    }

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(Duration::from_millis(700)), "0.7s");
        assert_eq!(format_timeout(Duration::from_secs(2)), "2s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600 + 120)), "3h 2m");
    }
}
