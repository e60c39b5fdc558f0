use crate::model::{CumulativePoint, DailyCount, MergeSeries, PullRequest, QuarterMarker};
use crate::util::{quarter_boundaries, quarter_label};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Derives the plotted series from the store's current contents.
///
/// Only merged records contribute. The series carry one point per distinct
/// merge day; days with zero merges are omitted, matching a bar chart where
/// empty days simply have no bar. Quarter markers cover every Jan/Apr/Jul/Oct
/// 1 within the merged span, endpoints inclusive.
pub fn aggregate(records: &[PullRequest]) -> MergeSeries {
    let mut merged: Vec<(DateTime<Utc>, i64)> = records
        .iter()
        .filter_map(|r| r.merged_at.map(|at| (at, r.id)))
        .collect();
    // Total order: merged_at ascending, ties broken by id.
    merged.sort_unstable();

    if merged.is_empty() {
        debug!("no merged records; series are empty");
        return MergeSeries::default();
    }

    let mut daily: Vec<DailyCount> = Vec::new();
    for (merged_at, _) in &merged {
        let day = merged_at.date_naive();
        match daily.last_mut() {
            Some(last) if last.day == day => last.count += 1,
            _ => daily.push(DailyCount { day, count: 1 }),
        }
    }

    let mut cumulative = Vec::with_capacity(daily.len());
    let mut total = 0u64;
    for day_count in &daily {
        total += u64::from(day_count.count);
        cumulative.push(CumulativePoint {
            day: day_count.day,
            total,
        });
    }

    let first = daily[0].day;
    let last = daily[daily.len() - 1].day;
    let quarters = quarter_boundaries(first, last)
        .into_iter()
        .map(|day| QuarterMarker {
            label: quarter_label(&day),
            day,
        })
        .collect();

    debug!(
        merged = merged.len(),
        days = daily.len(),
        "aggregated merge series"
    );
    MergeSeries {
        cumulative,
        daily,
        quarters,
    }
}
