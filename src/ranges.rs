//! Reads the range-list file.
//!
//! One range per line. Accepted shapes:
//! - `start<ws>end [extra columns]` (tab or space separated)
//! - `start-end`
//! - `a.b.c.d/prefix`
//! - a single address
//!
//! Blank lines and `#` comments are skipped. A line that fails to parse is
//! reported and skipped; parsing continues with the next line.

use eyre::{Result, WrapErr};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::error::RangeParseError;
use crate::types::AddressRange;

/// Ranges collected from an input, plus the lines that were rejected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RangeList {
    pub ranges: Vec<AddressRange>,
    pub errors: Vec<RangeParseError>,
}

impl RangeList {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

pub fn load_ranges(path: &Path) -> Result<RangeList> {
    log::debug!("[ranges] load_ranges: path={}", path.display());
    let bytes = std::fs::read(path)
        .wrap_err_with(|| format!("Failed to read range list {}", path.display()))?;
    // Exports from some tools are not clean UTF-8
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_ranges(&text))
}

pub fn parse_ranges(text: &str) -> RangeList {
    let mut list = RangeList::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(range) => list.ranges.push(range),
            Err(reason) => {
                log::warn!("[ranges] line_skipped: line={} reason={}", index + 1, reason);
                list.errors.push(RangeParseError {
                    line: index + 1,
                    content: line.to_string(),
                    reason,
                });
            }
        }
    }

    log::info!("[ranges] parse_completed: ranges={} rejected={}", list.ranges.len(), list.errors.len());
    list
}

fn parse_addr(token: &str) -> Result<Ipv4Addr, String> {
    token
        .parse::<Ipv4Addr>()
        .map_err(|_| format!("invalid IPv4 address `{token}`"))
}

/// Whether a second column is meant as an address rather than a label.
fn looks_like_address(token: &str) -> bool {
    token == "-" || token.contains('.')
}

fn parse_line(line: &str) -> Result<AddressRange, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if let [start, end, ..] = fields.as_slice() {
        if looks_like_address(end) {
            return match (parse_addr(start), parse_addr(end)) {
                (Ok(start), Ok(end)) => Ok(AddressRange::ordered(start, end)),
                (Err(reason), _) | (_, Err(reason)) => Err(reason),
            };
        }
        // Anything else in the second column is a label for the first field
    }

    let first = fields.first().copied().unwrap_or_default();

    if let Some((start, end)) = first.split_once('-') {
        return match (parse_addr(start), parse_addr(end)) {
            (Ok(start), Ok(end)) => Ok(AddressRange::ordered(start, end)),
            _ => Err(format!("invalid address range `{first}`")),
        };
    }

    if first.contains('/') {
        let network: Ipv4Network = first
            .parse()
            .map_err(|e| format!("invalid CIDR block `{first}`: {e}"))?;
        return Ok(AddressRange::ordered(network.network(), network.broadcast()));
    }

    parse_addr(first).map(AddressRange::single)
}
