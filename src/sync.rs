use crate::cli::CommonArgs;
use crate::error::Result;
use crate::github::GitHubClient;
use crate::model::PullRequest;
use crate::store::Store;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// One page of closed pull requests from the remote source.
pub struct Page {
    pub records: Vec<PullRequest>,
    pub has_next: bool,
}

/// Remote source capability: page through the repository's closed pull
/// requests, newest-first by id.
pub trait PullSource {
    fn fetch_closed_page(&self, page: u32) -> Result<Page>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No remote calls; use only what is already cached.
    Offline,
    /// Clear the cache, then sync from scratch.
    FullRefresh,
    /// Fetch only records newer than the cached watermark.
    Incremental,
}

impl SyncMode {
    pub fn from_flags(offline: bool, full_refresh: bool) -> Self {
        if offline && full_refresh {
            warn!("--offline and --full-refresh were both specified; offline mode wins");
        }
        if offline {
            SyncMode::Offline
        } else if full_refresh {
            SyncMode::FullRefresh
        } else {
            SyncMode::Incremental
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new_records: u64,
    pub pages_fetched: u32,
    pub skipped_invalid: u64,
}

/// Reconciles the remote source into the store.
///
/// The source lists closed PRs newest-first by id, so the loop stops at the
/// first record whose id is `<= max_known_id`: every record after it in the
/// listing is already cached. Records are upserted one at a time; a failure
/// mid-page leaves everything upserted so far durable, and the next run
/// resumes from the new watermark.
pub fn sync(
    store: &mut Store,
    source: &dyn PullSource,
    mode: SyncMode,
    show_progress: bool,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    match mode {
        SyncMode::Offline => {
            info!("offline mode: skipping all remote calls");
            return Ok(report);
        }
        SyncMode::FullRefresh => {
            warn!("full refresh requested: clearing cached pull requests");
            store.clear()?;
        }
        SyncMode::Incremental => {}
    }

    let watermark = store.max_known_id()?;
    info!(?watermark, "starting sync");

    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner());
        pb
    });

    let mut page = 1u32;
    loop {
        if let Some(pb) = &spinner {
            pb.set_message(format!("Fetching page {page}"));
            pb.tick();
        }
        debug!(page, "fetching page");
        let fetched = source.fetch_closed_page(page)?;
        report.pages_fetched += 1;

        if fetched.records.is_empty() {
            debug!("remote returned an empty page");
            break;
        }

        let mut caught_up = false;
        for record in &fetched.records {
            if let Some(max_id) = watermark {
                if record.id <= max_id {
                    debug!(id = record.id, "reached cached region; stopping");
                    caught_up = true;
                    break;
                }
            }
            if let Err(err) = record.validate() {
                warn!(id = record.id, %err, "skipping record that violates invariants");
                report.skipped_invalid += 1;
                continue;
            }
            store.upsert(record)?;
            report.new_records += 1;
        }

        if caught_up || !fetched.has_next {
            break;
        }
        page += 1;
    }

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    info!(
        new_records = report.new_records,
        pages = report.pages_fetched,
        skipped = report.skipped_invalid,
        "sync complete"
    );
    Ok(report)
}

/// Shared entry point for every subcommand: sync per the selected mode,
/// then scan the full store.
pub fn sync_and_scan(common: &CommonArgs) -> anyhow::Result<(Vec<PullRequest>, SyncReport)> {
    let mut store = Store::open(common.db_path()).context("Failed to open record store")?;
    let mode = SyncMode::from_flags(common.offline, common.full_refresh);

    let report = if mode == SyncMode::Offline {
        sync(&mut store, &NoRemote, mode, false)?
    } else {
        let client = GitHubClient::new(&common.owner, &common.repo, common.token.clone())
            .context("Failed to build GitHub client")?;
        sync(&mut store, &client, mode, true)
            .with_context(|| format!("Failed to sync {}", common.repository()))?
    };

    let records = store.scan_all().context("Failed to scan record store")?;
    info!(cached = records.len(), "loaded records from store");
    Ok((records, report))
}

/// Placeholder source for offline mode; the engine never calls it.
struct NoRemote;

impl PullSource for NoRemote {
    fn fetch_closed_page(&self, _page: u32) -> Result<Page> {
        Err(crate::error::MergepulseError::Remote(
            "remote access attempted in offline mode".to_string(),
        ))
    }
}

pub fn exec(common: CommonArgs) -> anyhow::Result<()> {
    use console::style;

    let (records, report) = sync_and_scan(&common)?;
    let merged = records.iter().filter(|r| r.merged_at.is_some()).count();

    println!("{}", style("Sync Report").bold());
    println!("{}", "─".repeat(50));
    println!("Repository: {}", style(common.repository()).cyan());
    println!("Pages fetched: {}", style(report.pages_fetched).cyan());
    println!("New records: {}", style(report.new_records).green());
    println!("Skipped (invalid): {}", style(report.skipped_invalid).yellow());
    println!("Total cached: {}", style(records.len()).cyan());
    println!("Merged: {}", style(merged).cyan());

    Ok(())
}
