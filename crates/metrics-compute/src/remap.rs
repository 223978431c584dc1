//! Seasonal color remap and the post-processing barrier that applies it
//!
//! ```text
//!   dispatch(a, b)   schedule()            dispatch(c)
//!        │               │                      │
//!        │        snapshot [a, b] ──▶ spawn dflag.<season>
//!        │               │                      │
//!        ▼               ▼                      ▼
//!   a, b complete ─▶ remap plugin outputs    c is never remapped
//! ```
use metrics_core::{ContributionDay, PendingTaskSet, PluginOutcome, PluginOutputs};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde_json::Value;
use tracing::debug;

use crate::inputs::dflags;

static GRAPH_VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"--color-calendar-graph").unwrap());

/// Default calendar palette, lightest level first
static LEVEL_COLORS: Lazy<[Regex; 4]> = Lazy::new(|| {
    ["#9be9a8", "#40c463", "#30a14e", "#216e39"]
        .map(|hex| Regex::new(&format!("(?i){}", hex)).unwrap())
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Halloween,
    Winter,
}

impl Season {
    pub fn name(&self) -> &'static str {
        match self {
            Season::Halloween => "halloween",
            Season::Winter => "winter",
        }
    }

    /// First seasonal flag in flag order
    pub fn from_flags(flags: &[String]) -> Option<Self> {
        flags.iter().find_map(|flag| match flag.as_str() {
            dflags::HALLOWEEN => Some(Season::Halloween),
            dflags::WINTER => Some(Season::Winter),
            _ => None,
        })
    }

    /// Name of the deferred task that remaps plugin outputs
    pub fn task_name(&self) -> String {
        format!("dflag.{}", self.name())
    }
}

/// Ordered substitution table. Order matters: the variable rename runs
/// before the hex colors are turned into variables.
#[derive(Debug, Clone)]
pub struct ColorRemap {
    season: Season,
    rules: Vec<(&'static Regex, String)>,
}

impl ColorRemap {
    pub fn new(season: Season) -> Self {
        let name = season.name();
        let mut rules = vec![(
            &*GRAPH_VARIABLE,
            format!("--color-calendar-{}-graph", name),
        )];
        for (level, pattern) in LEVEL_COLORS.iter().enumerate() {
            rules.push((
                pattern,
                format!("var(--color-calendar-{}-graph-day-L{}-bg)", name, level + 1),
            ));
        }
        Self { season, rules }
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |text, (pattern, replacement)| {
                pattern
                    .replace_all(&text, NoExpand(replacement.as_str()))
                    .into_owned()
            })
    }

    pub fn apply_calendar(&self, days: &mut [ContributionDay]) {
        for day in days {
            day.color = self.apply(&day.color);
        }
    }

    /// Remap `isocalendar.svg` and every `calendar` day color, when present
    pub fn apply_plugin_outputs(&self, outputs: &PluginOutputs) {
        outputs.update_value("isocalendar", |value| {
            if let Some(Value::String(svg)) = value.get_mut("svg") {
                *svg = self.apply(svg);
            }
        });
        outputs.update_value("calendar", |value| {
            for color in calendar_colors(value) {
                if let Value::String(color) = color {
                    *color = self.apply(color);
                }
            }
        });
    }
}

fn calendar_colors(value: &mut Value) -> impl Iterator<Item = &mut Value> {
    value
        .get_mut("years")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(|year| year.get_mut("weeks").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(|week| week.get_mut("contributionDays").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(|day| day.get_mut("color"))
}

/// Push the barrier task onto `pending`.
///
/// The snapshot is taken before the barrier is pushed, so the barrier waits
/// on every task spawned so far and on nothing spawned afterwards. Returns
/// the barrier's task name.
pub fn schedule(remap: ColorRemap, outputs: &PluginOutputs, pending: &mut PendingTaskSet) -> String {
    let name = remap.season().task_name();
    let snapshot = pending.snapshot();
    let outputs = outputs.clone();
    let task_name = name.clone();

    pending.spawn(name.clone(), async move {
        debug!("{} > waiting for {} pending tasks", task_name, snapshot.len());
        snapshot.join().await;
        remap.apply_plugin_outputs(&outputs);
        debug!("{} > plugin outputs remapped", task_name);
        PluginOutcome::success(task_name, Value::Bool(true))
    });

    name
}
