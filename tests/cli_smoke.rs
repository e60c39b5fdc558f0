use assert_cmd::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use mergepulse::model::PullRequest;
use mergepulse::store::Store;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn merged_pr(id: i64, merged_at: DateTime<Utc>) -> PullRequest {
    PullRequest {
        id,
        number: id,
        title: format!("change {id}"),
        merged_at: Some(merged_at),
        created_at: utc(2023, 12, 1),
        closed_at: merged_at,
        author: "octocat".to_string(),
    }
}

fn seed_store(db_path: &Path, records: &[PullRequest]) {
    let mut store = Store::open(db_path).unwrap();
    for record in records {
        store.upsert(record).unwrap();
    }
}

fn mergepulse_offline(db_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mergepulse").unwrap();
    cmd.args(["--owner", "emeryberger", "--repo", "CSrankings", "--offline"])
        .arg("--db")
        .arg(db_path);
    cmd
}

#[test]
fn export_json_on_empty_store_exits_zero() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");

    let mut cmd = mergepulse_offline(&db);
    cmd.args(["export", "--json"]);
    let out = cmd.assert().success().get_output().stdout.clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["cumulative"].as_array().unwrap().len(), 0);
    assert_eq!(v["daily"].as_array().unwrap().len(), 0);
    assert_eq!(v["quarters"].as_array().unwrap().len(), 0);
}

#[test]
fn export_json_reports_seeded_series() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed_store(
        &db,
        &[
            merged_pr(1, utc(2024, 1, 5)),
            merged_pr(2, utc(2024, 1, 5)),
            merged_pr(3, utc(2024, 1, 7)),
        ],
    );

    let mut cmd = mergepulse_offline(&db);
    cmd.args(["export", "--json"]);
    let out = cmd.assert().success().get_output().stdout.clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let daily = v["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0]["day"], "2024-01-05");
    assert_eq!(daily[0]["count"], 2);
    assert_eq!(daily[1]["day"], "2024-01-07");
    assert_eq!(daily[1]["count"], 1);
    let cumulative = v["cumulative"].as_array().unwrap();
    assert_eq!(cumulative[1]["total"], 3);
}

#[test]
fn export_ndjson_emits_one_line_per_day() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed_store(
        &db,
        &[
            merged_pr(1, utc(2024, 1, 5)),
            merged_pr(2, utc(2024, 1, 7)),
        ],
    );

    let mut cmd = mergepulse_offline(&db);
    cmd.args(["export", "--ndjson"]);
    let out = cmd.assert().success().get_output().stdout.clone();

    let lines: Vec<&str> = std::str::from_utf8(&out)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(v["day"].is_string());
    }
}

#[test]
fn chart_writes_svg_for_seeded_store() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed_store(
        &db,
        &[
            merged_pr(1, utc(2024, 2, 1)),
            merged_pr(2, utc(2024, 8, 1)),
        ],
    );

    let out_path = dir.path().join("merges.svg");
    let mut cmd = mergepulse_offline(&db);
    cmd.arg("chart").arg("--out").arg(&out_path);
    cmd.assert().success();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert!(contents.contains("<svg"));
}

#[test]
fn chart_on_empty_store_exits_zero_without_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");

    let out_path = dir.path().join("merges.svg");
    let mut cmd = mergepulse_offline(&db);
    cmd.arg("chart").arg("--out").arg(&out_path);
    cmd.assert().success();

    assert!(!out_path.exists());
}

#[test]
fn sync_offline_prints_report() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed_store(&db, &[merged_pr(1, utc(2024, 1, 5))]);

    let mut cmd = mergepulse_offline(&db);
    cmd.arg("sync");
    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Sync Report"));
    assert!(text.contains("Total cached: 1"));
}
