//! Core inputs read from the query flags
use metrics_core::{flag_enabled, DisplayMode, QueryFlags};
use serde_json::Value;
use tracing::debug;

pub const ANIMATIONS: &str = "config.animations";
pub const DISPLAY: &str = "config.display";
pub const TIMEZONE: &str = "config.timezone";
pub const BASE64: &str = "config.base64";
pub const DEBUG_FLAGS: &str = "debug.flags";

/// Debug flags understood by the computation
pub mod dflags {
    pub const CAKEDAY: &str = "--cakeday";
    pub const HALLOWEEN: &str = "--halloween";
    pub const WINTER: &str = "--winter";
    pub const ERROR: &str = "--error";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreInputs {
    pub animations: bool,
    pub display: DisplayMode,
    pub timezone: Option<String>,
    pub base64: bool,
    pub debug_flags: Vec<String>,
}

impl Default for CoreInputs {
    fn default() -> Self {
        Self {
            animations: true,
            display: DisplayMode::Regular,
            timezone: None,
            base64: true,
            debug_flags: Vec::new(),
        }
    }
}

impl CoreInputs {
    /// Resolve inputs, falling back to defaults for absent or invalid flags
    pub fn resolve(query: &QueryFlags) -> Self {
        let defaults = Self::default();

        let display = match query.get(DISPLAY) {
            None | Some(Value::Null) => defaults.display,
            Some(value) => match value.as_str().and_then(DisplayMode::parse) {
                Some(display) => display,
                None => {
                    debug!("unsupported value for {}: {}, using {:?}", DISPLAY, value, defaults.display);
                    defaults.display
                }
            },
        };

        let timezone = match query.get(TIMEZONE) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        };

        Self {
            animations: query.get(ANIMATIONS).map(flag_enabled).unwrap_or(defaults.animations),
            display,
            timezone,
            base64: query.get(BASE64).map(flag_enabled).unwrap_or(defaults.base64),
            debug_flags: query.get(DEBUG_FLAGS).map(parse_debug_flags).unwrap_or_default(),
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.debug_flags.iter().any(|f| f == flag)
    }
}

/// Debug flags given as an array or a whitespace/comma separated string
pub fn parse_debug_flags(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, Value)]) -> QueryFlags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let inputs = CoreInputs::resolve(&QueryFlags::new());
        assert_eq!(inputs, CoreInputs::default());
    }

    #[test]
    fn test_resolve_all() {
        let inputs = CoreInputs::resolve(&query(&[
            (ANIMATIONS, json!("no")),
            (DISPLAY, json!("columns")),
            (TIMEZONE, json!(" Europe/Paris ")),
            (BASE64, json!(false)),
            (DEBUG_FLAGS, json!("--cakeday, --winter")),
        ]));
        assert!(!inputs.animations);
        assert_eq!(inputs.display, DisplayMode::Columns);
        assert_eq!(inputs.timezone.as_deref(), Some("Europe/Paris"));
        assert!(!inputs.base64);
        assert_eq!(inputs.debug_flags, vec!["--cakeday", "--winter"]);
        assert!(inputs.has_flag(dflags::WINTER));
        assert!(!inputs.has_flag(dflags::ERROR));
    }

    #[test]
    fn test_unsupported_display_falls_back_to_regular() {
        for value in [json!("tiny"), json!(3), json!(["large"])] {
            let inputs = CoreInputs::resolve(&query(&[(DISPLAY, value), (BASE64, json!(false))]));
            assert_eq!(inputs.display, DisplayMode::Regular);
            assert!(!inputs.base64);
        }
    }

    #[test]
    fn test_debug_flags_from_array() {
        assert_eq!(
            parse_debug_flags(&json!(["--error", " ", 3, "--halloween"])),
            vec!["--error", "--halloween"]
        );
        assert!(parse_debug_flags(&json!(null)).is_empty());
    }
}
