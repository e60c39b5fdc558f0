use chrono::{Datelike, NaiveDate};

pub fn quarter_label(day: &NaiveDate) -> String {
    format!("Q{} {}", (day.month() - 1) / 3 + 1, day.year())
}

/// First days of Jan/Apr/Jul/Oct falling within `[start, end]` inclusive.
pub fn quarter_boundaries(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut boundaries = Vec::new();
    for year in start.year()..=end.year() {
        for month in [1, 4, 7, 10] {
            if let Some(q) = NaiveDate::from_ymd_opt(year, month, 1) {
                if q >= start && q <= end {
                    boundaries.push(q);
                }
            }
        }
    }
    boundaries
}
