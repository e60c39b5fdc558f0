use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mergepulse")]
#[command(about = "Analyze and chart merged pull requests for a GitHub repository")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "GitHub repository owner")]
    pub owner: String,

    #[arg(long, help = "GitHub repository name")]
    pub repo: String,

    #[arg(long, help = "Path to the cache database (defaults to <owner>-<repo>.db)")]
    pub db: Option<PathBuf>,

    #[arg(long, help = "Clear the cache and refetch everything", default_value_t = false)]
    pub full_refresh: bool,

    #[arg(long, help = "Skip all GitHub calls; use only cached data", default_value_t = false)]
    pub offline: bool,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub API token")]
    pub token: Option<String>,
}

impl CommonArgs {
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}-{}.db", self.owner, self.repo)))
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync (unless offline), then render the merge-activity chart
    Chart {
        #[arg(long, help = "Output image path", default_value = "merges.svg")]
        out: PathBuf,
    },
    /// Sync (unless offline), then emit the aggregated series
    Export {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Sync only and print a report
    Sync,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Chart { out } => crate::chart::exec(self.common, out),
            Commands::Export { json, ndjson } => crate::export::exec(self.common, json, ndjson),
            Commands::Sync => crate::sync::exec(self.common),
        }
    }
}
