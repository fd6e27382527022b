//! Persistence of discovered hosts.
//!
//! Every output file is rewritten whole on each flush: contents go to a
//! sibling `.tmp` file that is then renamed over the target, so a reader
//! never sees a half-written list and earlier runs are never appended to.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::types::LiveHost;

pub const DEFAULT_TXT_PATH: &str = "live_ips_partial.txt";
pub const DEFAULT_CSV_PATH: &str = "live_ips_partial.csv";

pub trait ResultSink: Send {
    /// Persist `hosts`, replacing whatever an earlier flush wrote.
    fn flush(&mut self, hosts: &[LiveHost]) -> Result<(), SinkError>;

    /// Where the results end up, for the final summary.
    fn describe(&self) -> String;
}

/// Writes live hosts as tab-separated text, CSV and/or JSON.
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    txt: Option<PathBuf>,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_txt(mut self, path: impl Into<PathBuf>) -> Self {
        self.txt = Some(path.into());
        self
    }

    pub fn with_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv = Some(path.into());
        self
    }

    pub fn with_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.json = Some(path.into());
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        [&self.txt, &self.csv, &self.json]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Runs `write` against a temp file and moves it over `path` once it succeeded.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), SinkError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), SinkError>,
{
    let tmp = tmp_path(path);
    let file = File::create(&tmp).map_err(io_err(&tmp))?;
    let mut writer = BufWriter::new(file);

    let written = write(&mut writer).and_then(|_| writer.flush().map_err(io_err(&tmp)));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    drop(writer);

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_err(path)(source)
    })
}

fn write_txt(path: &Path, hosts: &[LiveHost]) -> Result<(), SinkError> {
    write_atomic(path, |w| {
        for host in hosts {
            writeln!(w, "{}\t{}", host.address, host.source_range).map_err(io_err(path))?;
        }
        Ok(())
    })
}

fn write_csv(path: &Path, hosts: &[LiveHost]) -> Result<(), SinkError> {
    write_atomic(path, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        // Header goes out even for an empty result
        wtr.write_record(["ip", "source_range", "discovered_at"])?;
        for host in hosts {
            let discovered_at = host.discovered_at.to_rfc3339();
            wtr.write_record([
                host.address.to_string(),
                host.source_range.to_string(),
                discovered_at,
            ])?;
        }
        wtr.flush().map_err(io_err(path))?;
        Ok(())
    })
}

fn write_json(path: &Path, hosts: &[LiveHost]) -> Result<(), SinkError> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, hosts)?;
        writeln!(w).map_err(io_err(path))
    })
}

impl ResultSink for FileSink {
    fn flush(&mut self, hosts: &[LiveHost]) -> Result<(), SinkError> {
        log::debug!("[sink] flush: hosts={} txt={:?} csv={:?} json={:?}",
            hosts.len(), self.txt, self.csv, self.json);

        if let Some(path) = &self.txt {
            write_txt(path, hosts)?;
        }
        if let Some(path) = &self.csv {
            write_csv(path, hosts)?;
        }
        if let Some(path) = &self.json {
            write_json(path, hosts)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let paths: Vec<String> = self.paths().map(|p| p.display().to_string()).collect();
        if paths.is_empty() {
            "nowhere (no output configured)".to_string()
        } else {
            paths.join(" and ")
        }
    }
}
