//! Aggregate values derived from the dataset before plugins run
use crate::data_model::{ContributionDay, LicenseInfo, RepositoryCounter};
use metrics_rank::RankResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Computed {
    /// Commit contributions, restricted ones included
    pub commits: u64,
    pub sponsorships: u64,
    pub licenses: Licenses,
    pub token: TokenInfo,
    pub repositories: RepositoryTotals,
    /// Formatted total disk usage
    pub disk_usage: String,
    pub registered: Registered,
    /// Human readable account age ("3 years ago")
    pub registration: String,
    pub cakeday: bool,
    /// Last 14 days of the contribution calendar
    pub calendar: Vec<ContributionDay>,
    pub ranking: Option<RankResult>,
    /// Avatar, base64 encoded unless encoding is disabled
    pub avatar: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    /// Whole years plus leftover days over 365.25
    pub years: f64,
    pub months: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUsage {
    pub spdx_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licenses {
    pub favorite: String,
    /// Usage counts in first-seen order
    pub used: Vec<LicenseUsage>,
    pub about: BTreeMap<String, LicenseInfo>,
}

impl Licenses {
    /// Count one more repository using `info`
    pub fn record(&mut self, info: &LicenseInfo) {
        match self.used.iter_mut().find(|u| u.spdx_id == info.spdx_id) {
            Some(usage) => usage.count += 1,
            None => self.used.push(LicenseUsage {
                spdx_id: info.spdx_id.clone(),
                count: 1,
            }),
        }
        self.about.insert(info.spdx_id.clone(), info.clone());
    }

    pub fn count(&self, spdx_id: &str) -> u64 {
        self.used
            .iter()
            .find(|u| u.spdx_id == spdx_id)
            .map(|u| u.count)
            .unwrap_or(0)
    }

    /// Most used license; ties go to the one seen first
    pub fn most_used(&self) -> Option<&str> {
        let mut ranked: Vec<&LicenseUsage> = self.used.iter().collect();
        // sort_by is stable, so equal counts keep first-seen order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.first().map(|u| u.spdx_id.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTotals {
    pub watchers: u64,
    pub stargazers: u64,
    pub issues_open: u64,
    pub issues_closed: u64,
    pub pr_open: u64,
    pub pr_closed: u64,
    pub pr_merged: u64,
    pub forks: u64,
    pub forked: u64,
    pub releases: u64,
    pub deployments: u64,
    pub environments: u64,
}

impl RepositoryTotals {
    pub fn add(&mut self, counter: RepositoryCounter, value: u64) {
        let slot = match counter {
            RepositoryCounter::Watchers => &mut self.watchers,
            RepositoryCounter::Stargazers => &mut self.stargazers,
            RepositoryCounter::IssuesOpen => &mut self.issues_open,
            RepositoryCounter::IssuesClosed => &mut self.issues_closed,
            RepositoryCounter::PrOpen => &mut self.pr_open,
            RepositoryCounter::PrClosed => &mut self.pr_closed,
            RepositoryCounter::PrMerged => &mut self.pr_merged,
            RepositoryCounter::Releases => &mut self.releases,
            RepositoryCounter::Deployments => &mut self.deployments,
            RepositoryCounter::Environments => &mut self.environments,
        };
        *slot += value;
    }
}
