//! Aggregation Pass: sequential reduction of the dataset into `Computed`
//!
//! Each step reads the dataset and writes its own part of `Computed`; only
//! the ranking depends on earlier steps (repository totals and commits).

use chrono::{DateTime, Datelike, Utc};
use metrics_core::{
    Computed, ContributionDay, Dataset, Formatter, HttpClient, ImageEncoder, Registered,
    RepositoryCounter,
};
use metrics_rank::{calculate_rank, RankInput};
use tracing::debug;

/// Number of trailing calendar days kept
pub const CALENDAR_DAYS: usize = 14;

/// Header listing the OAuth scopes of the token
pub const SCOPES_HEADER: &str = "x-oauth-scopes";

/// 1x1 transparent PNG used when the avatar cannot be encoded
pub const AVATAR_PLACEHOLDER: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

const DAYS_PER_YEAR: f64 = 365.25;

pub struct AggregationPass<'a> {
    formatter: &'a dyn Formatter,
    now: DateTime<Utc>,
}

impl<'a> AggregationPass<'a> {
    pub fn new(formatter: &'a dyn Formatter, now: DateTime<Utc>) -> Self {
        Self { formatter, now }
    }

    /// Run every synchronous step
    pub fn run(&self, dataset: &Dataset) -> Computed {
        let mut computed = Computed::default();
        self.repositories(&mut computed, dataset);
        self.licenses(&mut computed, dataset);
        self.disk_usage(&mut computed, dataset);
        self.commits(&mut computed, dataset);
        self.registration(&mut computed, dataset);
        self.calendar(&mut computed, dataset);
        self.ranking(&mut computed, dataset);
        computed
    }

    pub fn repositories(&self, computed: &mut Computed, dataset: &Dataset) {
        for repository in &dataset.user.repositories.nodes {
            for counter in RepositoryCounter::ALL {
                computed.repositories.add(counter, repository.counter(counter));
            }
            computed.repositories.forks += repository.fork_count;
            if repository.is_fork {
                computed.repositories.forked += 1;
            }
        }
    }

    pub fn licenses(&self, computed: &mut Computed, dataset: &Dataset) {
        for repository in &dataset.user.repositories.nodes {
            if let Some(info) = &repository.license_info {
                computed.licenses.record(info);
            }
        }
        computed.licenses.favorite = computed
            .licenses
            .most_used()
            .map(str::to_string)
            .unwrap_or_default();
    }

    pub fn disk_usage(&self, computed: &mut Computed, dataset: &Dataset) {
        // reported in kilobytes
        let bytes = dataset.user.repositories.total_disk_usage.saturating_mul(1000);
        computed.disk_usage = self.formatter.bytes(bytes);
    }

    pub fn commits(&self, computed: &mut Computed, dataset: &Dataset) {
        let contributions = &dataset.user.contributions_collection;
        computed.commits +=
            contributions.total_commit_contributions + contributions.restricted_contributions_count;
    }

    pub fn registration(&self, computed: &mut Computed, dataset: &Dataset) {
        let age = RegistrationAge::between(dataset.user.created_at, self.now);
        computed.registered = age.registered();
        computed.registration = age.describe(self.formatter);
        computed.cakeday = age.is_cakeday();
    }

    pub fn calendar(&self, computed: &mut Computed, dataset: &Dataset) {
        computed.calendar = last_days(
            dataset.user.calendar.contribution_calendar.days().cloned().collect(),
            CALENDAR_DAYS,
        );
    }

    pub fn ranking(&self, computed: &mut Computed, dataset: &Dataset) {
        let contributions = &dataset.user.contributions_collection;
        let input = RankInput::new()
            .all_commits()
            .with_commits(computed.commits)
            .with_prs(contributions.total_pull_request_contributions)
            .with_issues(contributions.total_issue_contributions)
            .with_reviews(computed.repositories.pr_merged)
            .with_stars(computed.repositories.stargazers)
            .with_followers(dataset.user.followers.total_count);
        computed.ranking = Some(calculate_rank(&input));
    }
}

fn last_days(mut days: Vec<ContributionDay>, count: usize) -> Vec<ContributionDay> {
    let skip = days.len().saturating_sub(count);
    days.drain(..skip);
    days
}

/// Elapsed time since registration, split the way a calendar would
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationAge {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl RegistrationAge {
    /// Elapsed time laid out as a date counted from the Unix epoch.
    /// Registration dates in the future count as zero.
    pub fn between(created: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let elapsed = (now - created).num_milliseconds().max(0);
        let since_epoch = DateTime::<Utc>::from_timestamp_millis(elapsed).unwrap_or_default();
        Self {
            years: u32::try_from(since_epoch.year() - 1970).unwrap_or(0),
            months: since_epoch.month0(),
            days: since_epoch.day0(),
        }
    }

    pub fn registered(&self) -> Registered {
        Registered {
            years: f64::from(self.years) + f64::from(self.days) / DAYS_PER_YEAR,
            months: self.months,
        }
    }

    pub fn describe(&self, formatter: &dyn Formatter) -> String {
        let (count, unit) = if self.years > 0 {
            (self.years, "year")
        } else if self.months > 0 {
            (self.months, "month")
        } else {
            (self.days, "day")
        };
        format!("{} {}{} ago", count, unit, formatter.plural(u64::from(count)))
    }

    /// Exact whole number of years, at least one
    pub fn is_cakeday(&self) -> bool {
        self.years >= 1 && self.months == 0 && self.days == 0
    }
}

/// Encode the avatar, falling back to a placeholder image
pub async fn avatar(encoder: &dyn ImageEncoder, url: &str) -> String {
    match encoder.encode(url).await {
        Ok(encoded) if !encoded.is_empty() => encoded,
        Ok(_) => AVATAR_PLACEHOLDER.to_string(),
        Err(error) => {
            debug!("failed to encode avatar {}: {}", url, error);
            AVATAR_PLACEHOLDER.to_string()
        }
    }
}

/// OAuth scopes of the token; empty when disabled or when the lookup fails
pub async fn token_scopes(http: &dyn HttpClient, notoken: bool) -> Vec<String> {
    if notoken {
        return Vec::new();
    }
    match http.head("HEAD /").await {
        Ok(headers) => headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(SCOPES_HEADER))
            .map(|(_, value)| {
                value
                    .split(", ")
                    .filter(|scope| !scope.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        Err(error) => {
            debug!("failed to read token scopes: {}", error);
            Vec::new()
        }
    }
}
