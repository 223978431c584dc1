//! Metrics Rank: percentile and letter grade from activity counters
//!
//! # Example
//!
//! ```
//! use metrics_rank::{calculate_rank, RankInput, RankLevel};
//!
//! let input = RankInput::new()
//!     .all_commits()
//!     .with_commits(1000)
//!     .with_prs(50)
//!     .with_issues(25)
//!     .with_reviews(2)
//!     .with_stars(50)
//!     .with_followers(10);
//!
//! let rank = calculate_rank(&input);
//! assert_eq!(rank.level, RankLevel::BPlus);
//! println!("{} ({:.2}%)", rank.level, rank.percentile);
//! ```

pub mod rank;

pub use rank::{
    calculate_rank, exponential_cdf, log_normal_cdf, Factor, RankCalculator, RankInput,
    RankLevel, RankResult, LEVELS, THRESHOLDS,
};
