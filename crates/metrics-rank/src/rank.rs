//! Activity ranking
//!
//! Blends six activity counters into a percentile and a letter grade.
//! Count-like activity goes through an exponential CDF, popularity
//! metrics through a log-normal approximation.

use serde::{Deserialize, Serialize};

/// Letter grade of a rank, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RankLevel {
    #[serde(rename = "S")]
    S,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
}

/// Upper percentile bound of each grade, ascending
pub const THRESHOLDS: [f64; 9] = [1.0, 12.5, 25.0, 37.5, 50.0, 62.5, 75.0, 87.5, 100.0];

/// Grades matching [`THRESHOLDS`] index for index
pub const LEVELS: [RankLevel; 9] = [
    RankLevel::S,
    RankLevel::APlus,
    RankLevel::A,
    RankLevel::AMinus,
    RankLevel::BPlus,
    RankLevel::B,
    RankLevel::BMinus,
    RankLevel::CPlus,
    RankLevel::C,
];

impl RankLevel {
    /// Grade for a percentile: first threshold the percentile does not exceed.
    ///
    /// Lower percentiles are better. Anything above 100 (or NaN) lands in `C`.
    pub fn from_percentile(percentile: f64) -> Self {
        THRESHOLDS
            .iter()
            .position(|threshold| percentile <= *threshold)
            .map(|index| LEVELS[index])
            .unwrap_or(RankLevel::C)
    }

    /// Percentile range `(exclusive lower, inclusive upper)` covered by this grade
    pub fn percentile_range(&self) -> (f64, f64) {
        let index = LEVELS.iter().position(|l| l == self).unwrap_or(LEVELS.len() - 1);
        let lower = if index == 0 { 0.0 } else { THRESHOLDS[index - 1] };
        (lower, THRESHOLDS[index])
    }
}

impl std::fmt::Display for RankLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            RankLevel::S => "S",
            RankLevel::APlus => "A+",
            RankLevel::A => "A",
            RankLevel::AMinus => "A-",
            RankLevel::BPlus => "B+",
            RankLevel::B => "B",
            RankLevel::BMinus => "B-",
            RankLevel::CPlus => "C+",
            RankLevel::C => "C",
        };
        write!(f, "{}", label)
    }
}

/// Rank of a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankResult {
    /// Letter grade
    pub level: RankLevel,
    /// Percentile (0-100), lower is better
    pub percentile: f64,
}

/// Activity counters fed to the calculator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInput {
    /// Use the all-time commit median (1000) instead of the yearly one (250)
    pub all_commits: bool,
    pub commits: u64,
    pub prs: u64,
    pub issues: u64,
    pub reviews: u64,
    pub stars: u64,
    pub followers: u64,
}

impl RankInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_commits(mut self) -> Self {
        self.all_commits = true;
        self
    }

    pub fn with_commits(mut self, commits: u64) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_prs(mut self, prs: u64) -> Self {
        self.prs = prs;
        self
    }

    pub fn with_issues(mut self, issues: u64) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_reviews(mut self, reviews: u64) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    pub fn with_followers(mut self, followers: u64) -> Self {
        self.followers = followers;
        self
    }
}

/// Median and weight of one counter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor {
    pub median: f64,
    pub weight: f64,
}

/// Rank calculator with the medians and weights used by the grading scale
#[derive(Debug, Clone)]
pub struct RankCalculator {
    pub commits: Factor,
    pub all_commits: Factor,
    pub prs: Factor,
    pub issues: Factor,
    pub reviews: Factor,
    pub stars: Factor,
    pub followers: Factor,
}

impl Default for RankCalculator {
    fn default() -> Self {
        Self {
            commits: Factor { median: 250.0, weight: 2.0 },
            all_commits: Factor { median: 1000.0, weight: 2.0 },
            prs: Factor { median: 50.0, weight: 3.0 },
            issues: Factor { median: 25.0, weight: 1.0 },
            reviews: Factor { median: 2.0, weight: 1.0 },
            stars: Factor { median: 50.0, weight: 4.0 },
            followers: Factor { median: 10.0, weight: 1.0 },
        }
    }
}

impl RankCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank the given counters
    pub fn calculate(&self, input: &RankInput) -> RankResult {
        let commits = if input.all_commits { self.all_commits } else { self.commits };

        let terms = [
            (commits, exponential_cdf(ratio(input.commits, commits))),
            (self.prs, exponential_cdf(ratio(input.prs, self.prs))),
            (self.issues, exponential_cdf(ratio(input.issues, self.issues))),
            (self.reviews, exponential_cdf(ratio(input.reviews, self.reviews))),
            (self.stars, log_normal_cdf(ratio(input.stars, self.stars))),
            (self.followers, log_normal_cdf(ratio(input.followers, self.followers))),
        ];

        let total_weight: f64 = terms.iter().map(|(factor, _)| factor.weight).sum();
        let weighted: f64 = terms.iter().map(|(factor, cdf)| factor.weight * cdf).sum();

        let percentile = ((1.0 - weighted / total_weight) * 100.0).clamp(0.0, 100.0);

        RankResult {
            level: RankLevel::from_percentile(percentile),
            percentile,
        }
    }
}

/// Rank counters with the default calculator
pub fn calculate_rank(input: &RankInput) -> RankResult {
    RankCalculator::default().calculate(input)
}

fn ratio(value: u64, factor: Factor) -> f64 {
    value as f64 / factor.median
}

/// `1 - 2^-x`
pub fn exponential_cdf(x: f64) -> f64 {
    1.0 - 2f64.powf(-x)
}

/// `x / (1 + x)`, a cheap stand-in for the log-normal CDF
pub fn log_normal_cdf(x: f64) -> f64 {
    x / (1.0 + x)
}
