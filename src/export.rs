use crate::cli::CommonArgs;
use crate::model::{MergeSeries, PullRequest, SeriesOutput, SCHEMA_VERSION};
use chrono::Utc;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let (records, _report) = crate::sync::sync_and_scan(&common)?;
    let series = crate::aggregate::aggregate(&records);

    if json {
        output_json(&series, &common)?;
    } else if ndjson {
        output_ndjson(&series)?;
    } else {
        output_summary(&series, &records)?;
    }

    Ok(())
}

fn output_json(series: &MergeSeries, common: &CommonArgs) -> anyhow::Result<()> {
    let output = SeriesOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository: common.repository(),
        cumulative: series.cumulative.clone(),
        daily: series.daily.clone(),
        quarters: series.quarters.clone(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(series: &MergeSeries) -> anyhow::Result<()> {
    for day_count in &series.daily {
        println!("{}", serde_json::to_string(day_count)?);
    }
    Ok(())
}

fn output_summary(series: &MergeSeries, records: &[PullRequest]) -> anyhow::Result<()> {
    use console::style;

    println!("{}", style("Merge Activity Summary").bold());
    println!("{}", "─".repeat(50));

    let total_merged: u64 = series.cumulative.last().map(|p| p.total).unwrap_or(0);
    let unmerged = records.iter().filter(|r| r.merged_at.is_none()).count();
    let busiest = series.daily.iter().max_by_key(|d| d.count);

    println!("Closed PRs cached: {}", style(records.len()).cyan());
    println!("Merged PRs: {}", style(total_merged).green());
    println!("Closed without merge: {}", style(unmerged).yellow());
    println!("Active days: {}", style(series.daily.len()).cyan());
    println!("Quarter boundaries spanned: {}", style(series.quarters.len()).cyan());

    if let (Some(first), Some(last)) = (series.daily.first(), series.daily.last()) {
        println!(
            "Merge span: {} to {}",
            style(first.day).dim(),
            style(last.day).dim()
        );
    }
    if let Some(busiest) = busiest {
        println!(
            "Busiest day: {} ({} merges)",
            style(busiest.day).cyan(),
            busiest.count
        );
    }

    println!("\nUse --json or --ndjson flags to export the raw series.");
    Ok(())
}
