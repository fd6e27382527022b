//! Turns an [`AddressRange`] into the addresses a scan mode wants probed.
//!
//! All three modes share one walk: emit the cursor, then advance it by the
//! stride, clamping at `end` so the upper boundary is always produced exactly
//! once. Edge-only uses a stride of the whole span, full uses a stride of 1.

use std::net::Ipv4Addr;

use crate::types::{AddressRange, SampleStep, ScanMode};

/// Lazy address sequence for one range. Cloning yields an independent
/// iterator from the same position, so a fresh [`expand`] call or a clone
/// taken before iteration replays the identical sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    cursor: u64,
    end: u64,
    stride: u64,
    done: bool,
}

pub fn expand(range: &AddressRange, mode: ScanMode, step: SampleStep) -> Expansion {
    let start = u64::from(u32::from(range.start()));
    let end = u64::from(u32::from(range.end()));

    let stride = match mode {
        ScanMode::EdgeOnly => (end - start).max(1),
        ScanMode::Sample => u64::from(step.get()),
        ScanMode::Full => 1,
    };

    log::trace!("[expand] expand: range={} mode={} stride={}", range, mode, stride);

    Expansion {
        cursor: start,
        end,
        stride,
        done: false,
    }
}

impl Expansion {
    /// Addresses still to be produced.
    pub fn remaining(&self) -> u64 {
        if self.done {
            return 0;
        }
        (self.end - self.cursor).div_ceil(self.stride) + 1
    }
}

impl Iterator for Expansion {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.done {
            return None;
        }

        // Cursor never exceeds end, so the cast back to u32 is lossless.
        let current = Ipv4Addr::from(self.cursor as u32);
        if self.cursor == self.end {
            self.done = true;
        } else {
            self.cursor = (self.cursor + self.stride).min(self.end);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl std::iter::FusedIterator for Expansion {}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(a: [u8; 4], b: [u8; 4]) -> AddressRange {
        AddressRange::new(Ipv4Addr::from(a), Ipv4Addr::from(b)).unwrap()
    }

    fn step(n: u32) -> SampleStep {
        SampleStep::try_from(n).unwrap()
    }

    #[test]
    fn test_edge_only_yields_both_boundaries() {
        let r = range([10, 0, 0, 1], [10, 0, 0, 200]);
        let got: Vec<_> = expand(&r, ScanMode::EdgeOnly, SampleStep::ONE).collect();
        assert_eq!(got, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 200)]);
    }

    #[test]
    fn test_edge_only_single_address_once() {
        let r = range([10, 0, 0, 1], [10, 0, 0, 1]);
        let got: Vec<_> = expand(&r, ScanMode::EdgeOnly, step(7)).collect();
        assert_eq!(got, vec![Ipv4Addr::new(10, 0, 0, 1)]);
    }

    #[test]
    fn test_edge_only_adjacent_addresses() {
        let r = range([10, 0, 0, 1], [10, 0, 0, 2]);
        assert_eq!(expand(&r, ScanMode::EdgeOnly, SampleStep::ONE).count(), 2);
    }

    #[test]
    fn test_full_is_ascending_and_complete() {
        let r = range([10, 0, 0, 250], [10, 0, 1, 5]);
        let got: Vec<u32> = expand(&r, ScanMode::Full, step(99)).map(u32::from).collect();
        assert_eq!(got.len() as u64, r.size());
        assert!(got.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(got[0], u32::from(r.start()));
        assert_eq!(*got.last().unwrap(), u32::from(r.end()));
    }

    #[test]
    fn test_sample_includes_end_when_off_stride() {
        let r = range([10, 0, 0, 0], [10, 0, 0, 10]);
        let got: Vec<_> = expand(&r, ScanMode::Sample, step(3)).collect();
        assert_eq!(
            got,
            vec![
                Ipv4Addr::new(10, 0, 0, 0),
                Ipv4Addr::new(10, 0, 0, 3),
                Ipv4Addr::new(10, 0, 0, 6),
                Ipv4Addr::new(10, 0, 0, 9),
                Ipv4Addr::new(10, 0, 0, 10),
            ]
        );
    }

    #[test]
    fn test_sample_end_on_stride_not_duplicated() {
        let r = range([10, 0, 0, 0], [10, 0, 0, 9]);
        let got: Vec<_> = expand(&r, ScanMode::Sample, step(3)).collect();
        assert_eq!(got.len(), 4);
        assert_eq!(got.last(), Some(&Ipv4Addr::new(10, 0, 0, 9)));
    }

    #[test]
    fn test_sample_boundaries_exactly_once() {
        for s in 1..=12u32 {
            for width in 0..=30u32 {
                let start = Ipv4Addr::new(172, 16, 0, 0);
                let end = Ipv4Addr::from(u32::from(start) + width);
                let r = AddressRange::new(start, end).unwrap();
                let got: Vec<_> = expand(&r, ScanMode::Sample, step(s)).collect();
                assert_eq!(got.iter().filter(|a| **a == start).count(), 1);
                assert_eq!(got.iter().filter(|a| **a == end).count(), 1);
                assert_eq!(got.len() as u64, expand(&r, ScanMode::Sample, step(s)).remaining());
            }
        }
    }

    #[test]
    fn test_step_larger_than_range() {
        let r = range([10, 0, 0, 0], [10, 0, 0, 5]);
        let got: Vec<_> = expand(&r, ScanMode::Sample, step(256)).collect();
        assert_eq!(got, vec![Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 5)]);
    }

    #[test]
    fn test_expansion_is_restartable() {
        let r = range([192, 168, 0, 0], [192, 168, 3, 255]);
        let first: Vec<_> = expand(&r, ScanMode::Sample, step(17)).collect();
        let second: Vec<_> = expand(&r, ScanMode::Sample, step(17)).collect();
        assert_eq!(first, second);

        let template = expand(&r, ScanMode::Full, SampleStep::ONE);
        assert_eq!(template.clone().count(), template.clone().count());
    }

    #[test]
    fn test_top_of_address_space_does_not_overflow() {
        let r = range([255, 255, 255, 250], [255, 255, 255, 255]);
        assert_eq!(expand(&r, ScanMode::Full, SampleStep::ONE).count(), 6);
        let got: Vec<_> = expand(&r, ScanMode::Sample, step(u32::MAX)).collect();
        assert_eq!(got, vec![r.start(), r.end()]);
    }

    #[test]
    fn test_full_over_slash_eight_is_lazy() {
        let r = range([10, 0, 0, 0], [10, 255, 255, 255]);
        let mut it = expand(&r, ScanMode::Full, SampleStep::ONE);
        assert_eq!(it.remaining(), 1 << 24);
        assert_eq!(it.nth(5), Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(it.size_hint(), ((1 << 24) - 6, Some((1 << 24) - 6)));
    }
}
