//! Data Model: pre-fetched user dataset
//!
//! Mirrors the shape of the profile query result. Every field the
//! computation does not strictly need is defaulted so partial snapshots
//! still deserialize.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub user: User,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub followers: TotalCount,
    #[serde(default)]
    pub repositories: RepositoryList,
    #[serde(default)]
    pub contributions_collection: ContributionsCollection,
    #[serde(default)]
    pub calendar: UserCalendar,
}

/// GraphQL connection reduced to its count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    #[serde(default)]
    pub total_count: u64,
}

impl TotalCount {
    pub fn new(total_count: u64) -> Self {
        Self { total_count }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryList {
    #[serde(default)]
    pub nodes: Vec<Repository>,
    /// Disk usage in kilobytes
    #[serde(default)]
    pub total_disk_usage: u64,
}

/// Per-repository counters summed by the aggregation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryCounter {
    Watchers,
    Stargazers,
    IssuesOpen,
    IssuesClosed,
    PrOpen,
    PrClosed,
    PrMerged,
    Releases,
    Deployments,
    Environments,
}

impl RepositoryCounter {
    pub const ALL: [RepositoryCounter; 10] = [
        RepositoryCounter::Watchers,
        RepositoryCounter::Stargazers,
        RepositoryCounter::IssuesOpen,
        RepositoryCounter::IssuesClosed,
        RepositoryCounter::PrOpen,
        RepositoryCounter::PrClosed,
        RepositoryCounter::PrMerged,
        RepositoryCounter::Releases,
        RepositoryCounter::Deployments,
        RepositoryCounter::Environments,
    ];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub watchers: Option<TotalCount>,
    #[serde(default)]
    pub stargazers: Option<TotalCount>,
    #[serde(default, rename = "issues_open")]
    pub issues_open: Option<TotalCount>,
    #[serde(default, rename = "issues_closed")]
    pub issues_closed: Option<TotalCount>,
    #[serde(default, rename = "pr_open")]
    pub pr_open: Option<TotalCount>,
    #[serde(default, rename = "pr_closed")]
    pub pr_closed: Option<TotalCount>,
    #[serde(default, rename = "pr_merged")]
    pub pr_merged: Option<TotalCount>,
    #[serde(default)]
    pub releases: Option<TotalCount>,
    #[serde(default)]
    pub deployments: Option<TotalCount>,
    #[serde(default)]
    pub environments: Option<TotalCount>,
    #[serde(default)]
    pub fork_count: u64,
    #[serde(default)]
    pub is_fork: bool,
    #[serde(default)]
    pub license_info: Option<LicenseInfo>,
}

impl Repository {
    /// Value of a counter, zero when the connection is absent
    pub fn counter(&self, counter: RepositoryCounter) -> u64 {
        let count = match counter {
            RepositoryCounter::Watchers => self.watchers,
            RepositoryCounter::Stargazers => self.stargazers,
            RepositoryCounter::IssuesOpen => self.issues_open,
            RepositoryCounter::IssuesClosed => self.issues_closed,
            RepositoryCounter::PrOpen => self.pr_open,
            RepositoryCounter::PrClosed => self.pr_closed,
            RepositoryCounter::PrMerged => self.pr_merged,
            RepositoryCounter::Releases => self.releases,
            RepositoryCounter::Deployments => self.deployments,
            RepositoryCounter::Environments => self.environments,
        };
        count.map(|c| c.total_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    #[serde(default)]
    pub total_commit_contributions: u64,
    /// Contributions to private repositories, counted but not enumerable
    #[serde(default)]
    pub restricted_contributions_count: u64,
    #[serde(default)]
    pub total_pull_request_contributions: u64,
    #[serde(default)]
    pub total_issue_contributions: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCalendar {
    #[serde(default)]
    pub contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    #[serde(default)]
    pub weeks: Vec<CalendarWeek>,
}

impl ContributionCalendar {
    /// All days, oldest first
    pub fn days(&self) -> impl Iterator<Item = &ContributionDay> {
        self.weeks.iter().flat_map(|week| week.contribution_days.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeek {
    #[serde(default)]
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub color: String,
    #[serde(default)]
    pub contribution_count: u64,
    pub date: NaiveDate,
}
