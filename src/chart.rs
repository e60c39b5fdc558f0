use crate::cli::CommonArgs;
use crate::model::MergeSeries;
use anyhow::Context;
use chrono::Duration;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn exec(common: CommonArgs, out: PathBuf) -> anyhow::Result<()> {
    let (records, _report) = crate::sync::sync_and_scan(&common)?;
    let series = crate::aggregate::aggregate(&records);

    if series.is_empty() {
        warn!("no merged pull requests in the store; nothing to plot");
        println!("No merged pull requests to plot.");
        return Ok(());
    }

    render(&series, &common.repository(), &out).context("Failed to render chart")?;
    info!(path = %out.display(), "chart written");
    println!("Wrote {}", out.display());
    Ok(())
}

/// Draws the merge-activity chart as an SVG: cumulative step line on the
/// left axis, per-day bars on the right axis, dashed quarter boundaries.
/// An empty series is a valid nothing-to-show result and writes no file.
pub fn render(series: &MergeSeries, repository: &str, out: &Path) -> anyhow::Result<()> {
    let (first, last) = match (series.daily.first(), series.daily.last()) {
        (Some(first), Some(last)) => (first.day, last.day),
        _ => return Ok(()),
    };

    let y_max = series.cumulative.last().map(|p| p.total).unwrap_or(0) + 1;
    let y2_max = series.daily.iter().map(|d| d.count).max().unwrap_or(0) + 1;
    let x_range = first..(last + Duration::days(1));

    let root = SVGBackend::new(out, (1600, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .caption(
            format!("Merged PRs over time for {repository}"),
            ("sans-serif", 22),
        )
        .x_label_area_size(36)
        .y_label_area_size(48)
        .right_y_label_area_size(48)
        .build_cartesian_2d(x_range.clone(), 0u64..y_max)?
        .set_secondary_coord(x_range, 0u32..y2_max);

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Cumulative merged PR count")
        .x_labels(12)
        .x_label_formatter(&|day| day.format("%Y-%m-%d").to_string())
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Merged PRs per day")
        .draw()?;

    chart.draw_secondary_series(series.daily.iter().map(|day_count| {
        Rectangle::new(
            [
                (day_count.day, 0u32),
                (day_count.day + Duration::days(1), day_count.count),
            ],
            RGBColor(255, 140, 0).mix(0.35).filled(),
        )
    }))?;

    chart.draw_series(LineSeries::new(
        series.cumulative.iter().map(|point| (point.day, point.total)),
        &BLUE,
    ))?;

    for marker in &series.quarters {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(marker.day, 0u64), (marker.day, y_max)],
            BLACK.mix(0.25),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            marker.label.clone(),
            (marker.day, y_max),
            ("sans-serif", 12),
        )))?;
    }

    root.present()?;
    Ok(())
}
