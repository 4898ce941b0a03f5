//! Proposal-number sequencing.
//!
//! Proposal numbers are human-readable identifiers of the form
//! `BL-YYYYMM-NNNN`, unique and monotonically increasing within a calendar
//! month. These helpers are pure; the transactional lookup-and-increment
//! (with its uniqueness-violation retry) lives in the repository layer.

use chrono::{DateTime, Datelike, Utc};

/// Organisation prefix for generated proposal numbers.
pub const PROPOSAL_PREFIX: &str = "BL";

/// Month bucket for a proposal number, e.g. `BL-202608`.
pub fn month_prefix(now: DateTime<Utc>) -> String {
    format!("{PROPOSAL_PREFIX}-{:04}{:02}", now.year(), now.month())
}

/// Next proposal number for a month bucket, given the highest existing
/// number in that bucket (or `None` when the bucket is empty).
///
/// A stored number with an unparseable suffix restarts the sequence at 1;
/// the uniqueness constraint on the column catches any resulting collision.
pub fn next_number(prefix: &str, last: Option<&str>) -> String {
    let next = last.and_then(suffix_of).map_or(1, |n| n + 1);
    format!("{prefix}-{next:04}")
}

fn suffix_of(number: &str) -> Option<u32> {
    number.rsplit_once('-')?.1.parse().ok()
}
