use std::fs;
use std::io::Write;
use std::path::PathBuf;

const APP_NAME: &str = "pingsweep";

/// Initialize logging to a system-specific log file
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let log_path = get_log_file_path()?;

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let filters = filter_spec(std::env::var("RUST_LOG").ok());

    env_logger::Builder::new()
        .parse_filters(&filters)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)?
        )))
        .try_init()?;

    log::info!("Logging initialized to: {}", log_path.display());
    log::info!("Log filters: {}", filters);

    Ok(())
}

/// `RUST_LOG` directives (e.g. `info,pingsweep::coordinator=trace`), or `info`.
fn filter_spec(env: Option<String>) -> String {
    env.map(|spec| spec.trim().to_string())
        .filter(|spec| !spec.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::getuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// Get the system-specific log file path
pub fn get_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = if cfg!(target_os = "macos") {
        // macOS: ~/Library/Logs/pingsweep/
        dirs::home_dir()
            .ok_or("Could not find home directory")?
            .join("Library")
            .join("Logs")
            .join(APP_NAME)
    } else if cfg!(target_os = "linux") && running_as_root() {
        PathBuf::from("/var/log").join(APP_NAME)
    } else {
        // Linux users and everything else: <data dir>/pingsweep/logs/
        dirs::data_local_dir()
            .ok_or("Could not find local data directory")?
            .join(APP_NAME)
            .join("logs")
    };

    Ok(log_dir.join(format!("{APP_NAME}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_generation() {
        let path = get_log_file_path().unwrap();
        assert!(path.to_string_lossy().contains(APP_NAME));
        assert!(path.to_string_lossy().ends_with("pingsweep.log"));
    }

    #[test]
    fn test_filter_spec_keeps_module_directives() {
        assert_eq!(filter_spec(None), "info");
        assert_eq!(filter_spec(Some("  ".to_string())), "info");
        assert_eq!(
            filter_spec(Some("warn,pingsweep::coordinator=debug".to_string())),
            "warn,pingsweep::coordinator=debug"
        );
    }
}
