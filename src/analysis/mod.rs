//! Yearly per-station statistics derived from the observation tables
//!
//! Every metric is decoded on its own: a sentinel in one column of a row
//! does not hide the other columns of that row.

pub mod weather;
pub mod yields;

use anyhow::Result;

use crate::pipeline::PipelineKind;
use crate::writer::Database;

pub use weather::{aggregate_weather, compute_and_store_weather_stats};
pub use yields::{aggregate_yield, compute_and_store_yield_stats};

/// Reserved raw value meaning "measurement absent"
pub const MISSING: i64 = -9999;

/// Tenths of a unit to units (°C, bushels)
pub const TENTHS: f64 = 10.0;

/// Tenths of a millimetre to centimetres
pub const TENTHS_MM_PER_CM: f64 = 100.0;

/// Decode a stored fixed-point value, `None` for the missing sentinel
pub fn decode(raw: i64, scale: f64) -> Option<f64> {
    if raw == MISSING {
        None
    } else {
        Some(raw as f64 / scale)
    }
}

/// Arithmetic mean over present values only
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when no value was present
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Sum over present values; missing values add nothing
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Total {
    sum: f64,
    seen: bool,
}

impl Total {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.seen = true;
        }
    }

    /// `None` only when every value was missing
    pub fn value(&self) -> Option<f64> {
        self.seen.then_some(self.sum)
    }
}

/// Recompute and upsert the yearly stats of one pipeline.
///
/// Returns the number of stats rows written.
pub fn compute_and_store_stats(db: &mut Database, kind: PipelineKind) -> Result<usize> {
    match kind {
        PipelineKind::Weather => compute_and_store_weather_stats(db),
        PipelineKind::Yield => compute_and_store_yield_stats(db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode(-9999, TENTHS), None);
        assert_eq!(decode(250, TENTHS), Some(25.0));
        assert_eq!(decode(-22, TENTHS), Some(-2.2));
        assert_eq!(decode(0, TENTHS_MM_PER_CM), Some(0.0));
        assert_eq!(decode(150, TENTHS_MM_PER_CM), Some(1.5));
    }

    #[test]
    fn test_mean_ignores_missing() {
        let mut mean = Mean::default();
        for v in [Some(20.0), Some(30.0), None] {
            mean.push(v);
        }
        assert_eq!(mean.value(), Some(25.0));

        let mut empty = Mean::default();
        empty.push(None);
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn test_total_skips_missing() {
        let mut total = Total::default();
        for v in [Some(1.0), None, Some(2.0)] {
            total.push(v);
        }
        assert_eq!(total.value(), Some(3.0));

        let mut empty = Total::default();
        empty.push(None);
        empty.push(None);
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn test_total_of_zeros_is_present() {
        let mut total = Total::default();
        total.push(Some(0.0));
        assert_eq!(total.value(), Some(0.0));
    }
}
