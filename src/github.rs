use crate::error::{MergepulseError, Result};
use crate::model::PullRequest;
use crate::sync::{Page, PullSource};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

const API_ROOT: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;
const USER_AGENT: &str = concat!("mergepulse/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client for the closed-pull-request listing.
///
/// Pages are requested with `sort=created&direction=desc`, so records arrive
/// newest-first by id; the sync engine relies on that ordering for its
/// stop-when-caught-up rule.
pub struct GitHubClient {
    client: reqwest::blocking::Client,
    pulls_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(owner: &str, repo: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            pulls_url: format!("{API_ROOT}/repos/{owner}/{repo}/pulls"),
            token,
        })
    }
}

impl PullSource for GitHubClient {
    fn fetch_closed_page(&self, page: u32) -> Result<Page> {
        let mut request = self.client.get(&self.pulls_url).query(&[
            ("state", "closed".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MergepulseError::Remote(format!(
                "GitHub returned {status} for {}: {body}",
                self.pulls_url
            )));
        }

        let has_next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(|link| link.contains("rel=\"next\""))
            .unwrap_or(false);

        // Decode element by element so one malformed entry drops that
        // record instead of the whole page.
        let raw: Vec<serde_json::Value> = response.json()?;
        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<ApiPullRequest>(value) {
                Ok(pr) => records.push(pr.into_record()),
                Err(err) => warn!(%err, "dropping undecodable pull request entry"),
            }
        }

        debug!(page, count = records.len(), has_next, "fetched page");
        Ok(Page { records, has_next })
    }
}

/// The subset of the GitHub pull-request payload the cache keeps.
#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    id: i64,
    number: i64,
    title: Option<String>,
    merged_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

impl ApiPullRequest {
    fn into_record(self) -> PullRequest {
        // Closed PRs always carry closed_at; the fallback chain only guards
        // against an incomplete payload.
        let closed_at = self.closed_at.or(self.merged_at).unwrap_or(self.created_at);
        PullRequest {
            id: self.id,
            number: self.number,
            title: self.title.unwrap_or_default(),
            merged_at: self.merged_at,
            created_at: self.created_at,
            closed_at,
            author: self
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}
