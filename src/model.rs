use crate::error::{MergepulseError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One closed pull request as cached locally.
///
/// `merged_at` is `None` for PRs closed without merging; those rows stay
/// in the store (so they are never refetched) but never contribute to the
/// merge series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub author: String,
}

impl PullRequest {
    /// Checks the record-level invariants before it is allowed into the
    /// store: a positive id, and `merged_at >= created_at` when merged.
    pub fn validate(&self) -> Result<()> {
        if self.id <= 0 {
            return Err(MergepulseError::Invariant(format!(
                "PR #{} has invalid id {}",
                self.number, self.id
            )));
        }
        if let Some(merged_at) = self.merged_at {
            if merged_at < self.created_at {
                return Err(MergepulseError::Invariant(format!(
                    "PR #{} merged at {} before it was created at {}",
                    self.number, merged_at, self.created_at
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub day: NaiveDate,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterMarker {
    pub day: NaiveDate,
    pub label: String,
}

/// The two plotted series plus quarter boundary markers, derived
/// deterministically from the store's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSeries {
    pub cumulative: Vec<CumulativePoint>,
    pub daily: Vec<DailyCount>,
    pub quarters: Vec<QuarterMarker>,
}

impl MergeSeries {
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub cumulative: Vec<CumulativePoint>,
    pub daily: Vec<DailyCount>,
    pub quarters: Vec<QuarterMarker>,
}
