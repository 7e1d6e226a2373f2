//! Tracking-code formatting and sequence-key construction.
//!
//! The functions here are pure: the caller supplies the date and the counter
//! value (normally from the atomic sequence store, or from
//! [`fallback_counter`] when that store is unreachable).

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rand::Rng;

/// The code formats the admin surface can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingFormat {
    Ord,
    Inv,
    Shop001,
}

impl TrackingFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingFormat::Ord => "ORD",
            TrackingFormat::Inv => "INV",
            TrackingFormat::Shop001 => "SHOP001",
        }
    }

    /// Parse the exact format token; anything else is rejected.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "ORD" => Some(TrackingFormat::Ord),
            "INV" => Some(TrackingFormat::Inv),
            "SHOP001" => Some(TrackingFormat::Shop001),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed, uppercased branch, or `None` when absent or blank.
fn normalized_branch(branch: Option<&str>) -> Option<String> {
    branch
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_uppercase)
}

/// Composite counter key: `FORMAT[:BRANCH]:YYYYMMDD`.
#[must_use]
pub fn sequence_key(format: TrackingFormat, branch: Option<&str>, date: NaiveDate) -> String {
    let date_part = date.format("%Y%m%d");
    match normalized_branch(branch) {
        Some(b) => format!("{}:{}:{}", format.as_str(), b, date_part),
        None => format!("{}:{}", format.as_str(), date_part),
    }
}

/// Render the visible code for one (format, date, counter, branch) tuple.
///
/// `INV` ignores the counter in its visible suffix (the counter is still
/// incremented by the caller for bookkeeping) and falls back to a random
/// 6-character base36 suffix when no branch is given.
#[must_use]
pub fn format_code(
    format: TrackingFormat,
    date: NaiveDate,
    counter: i64,
    branch: Option<&str>,
) -> String {
    let date_part = date.format("%Y%m%d");
    match format {
        TrackingFormat::Ord => format!("ORD-{date_part}-{counter:06}"),
        TrackingFormat::Inv => {
            let suffix = normalized_branch(branch).unwrap_or_else(random_base36_suffix);
            format!("INV-{date_part}-{suffix}")
        }
        TrackingFormat::Shop001 => {
            let prefix = normalized_branch(branch).unwrap_or_else(|| "SHOP001".to_string());
            format!("{prefix}-{date_part}-{:03}", counter % 1000)
        }
    }
}

/// Degraded-mode counter: epoch seconds modulo 1,000,000.
///
/// Used when the sequence store is unreachable. Sacrifices the global
/// uniqueness guarantee under concurrent failure but keeps code generation
/// available; callers log the degradation.
#[must_use]
pub fn fallback_counter(now: SystemTime) -> i64 {
    let epoch_secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(epoch_secs % 1_000_000).unwrap_or(0)
}

fn random_base36_suffix() -> String {
    const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::rng();
    (0..6)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
