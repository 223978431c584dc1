//! Timezone resolution
//!
//! The offset is computed against the current wall clock: both the host
//! offset and the zone offset are read at resolution time, so results can
//! differ across a daylight saving transition. Tests inject the host offset
//! and use zones without DST.

use chrono::{FixedOffset, Local, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use metrics_core::TimezoneConfig;
use tracing::debug;

/// Environment variable consulted when no timezone is configured
pub const TZ_ENV: &str = "TZ";

const MILLIS_PER_SECOND: i64 = 1000;
const MILLIS_PER_HOUR: i64 = 60 * 60 * MILLIS_PER_SECOND;

#[derive(Debug, Clone, Copy)]
pub struct TimezoneResolver {
    host: FixedOffset,
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::from_host()
    }
}

impl TimezoneResolver {
    /// Resolver using the host's current local offset
    pub fn from_host() -> Self {
        Self {
            host: Local::now().offset().fix(),
        }
    }

    pub fn with_host_offset(host: FixedOffset) -> Self {
        Self { host }
    }

    pub fn host_offset(&self) -> FixedOffset {
        self.host
    }

    /// Resolve `name`. Never fails: an unknown zone yields a zero offset and an error message.
    pub fn resolve(&self, name: &str) -> TimezoneConfig {
        match name.parse::<Tz>() {
            Ok(tz) => {
                let zone = tz.offset_from_utc_datetime(&Utc::now().naive_utc()).fix();
                let offset_millis = i64::from(self.host.local_minus_utc() - zone.local_minus_utc())
                    * MILLIS_PER_SECOND;
                debug!(
                    "timezone set to {} ({}{} hours)",
                    name,
                    if offset_millis > 0 { "+" } else { "" },
                    (offset_millis as f64 / MILLIS_PER_HOUR as f64).round()
                );
                TimezoneConfig {
                    name: name.to_string(),
                    offset_millis,
                    error: None,
                }
            }
            Err(_) => {
                debug!("failed to use timezone \"{}\"", name);
                TimezoneConfig {
                    name: name.to_string(),
                    offset_millis: 0,
                    error: Some(format!("Failed to use timezone \"{}\"", name)),
                }
            }
        }
    }

    /// Resolve the configured zone, falling back to `$TZ`; `None` when neither is set.
    ///
    /// `$TZ` goes through [`resolve`](Self::resolve) like an explicit name, so an
    /// invalid `$TZ` reports an error instead of silently taking the host offset.
    pub fn resolve_configured(&self, explicit: Option<&str>) -> Option<TimezoneConfig> {
        self.resolve_with_fallback(explicit, std::env::var(TZ_ENV).ok())
    }

    pub fn resolve_with_fallback(
        &self,
        explicit: Option<&str>,
        fallback: Option<String>,
    ) -> Option<TimezoneConfig> {
        match explicit {
            Some(name) => Some(self.resolve(name)),
            None => fallback
                .filter(|name| !name.trim().is_empty())
                .map(|name| self.resolve(name.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_hours(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_host_zone_has_zero_offset() {
        let resolver = TimezoneResolver::with_host_offset(offset_hours(0));
        let tz = resolver.resolve("UTC");
        assert_eq!(tz.offset_millis, 0);
        assert!(tz.error.is_none());

        // Etc/GMT-3 is UTC+03:00
        let resolver = TimezoneResolver::with_host_offset(offset_hours(3));
        assert_eq!(resolver.resolve("Etc/GMT-3").offset_millis, 0);
    }

    #[test]
    fn test_offset_is_host_minus_zone() {
        let resolver = TimezoneResolver::with_host_offset(offset_hours(0));
        assert_eq!(resolver.resolve("Asia/Tokyo").offset_millis, -9 * MILLIS_PER_HOUR);
        assert_eq!(resolver.resolve("Etc/GMT+5").offset_millis, 5 * MILLIS_PER_HOUR);
    }

    #[test]
    fn test_unknown_zone_degrades() {
        let resolver = TimezoneResolver::with_host_offset(offset_hours(2));
        let tz = resolver.resolve("Mars/Olympus_Mons");
        assert_eq!(tz.name, "Mars/Olympus_Mons");
        assert_eq!(tz.offset_millis, 0);
        assert_eq!(tz.error.as_deref(), Some("Failed to use timezone \"Mars/Olympus_Mons\""));
    }

    #[test]
    fn test_fallback() {
        let resolver = TimezoneResolver::with_host_offset(offset_hours(0));
        let explicit = resolver.resolve_with_fallback(Some("UTC"), Some("Asia/Tokyo".to_string()));
        assert_eq!(explicit.unwrap().name, "UTC");

        let fallback = resolver.resolve_with_fallback(None, Some("Asia/Tokyo".to_string()));
        assert_eq!(fallback.unwrap().name, "Asia/Tokyo");

        let invalid = resolver
            .resolve_with_fallback(None, Some("Not/AZone".to_string()))
            .unwrap();
        assert_eq!(invalid.offset_millis, 0);
        assert!(invalid.error.is_some());

        assert!(resolver.resolve_with_fallback(None, None).is_none());
        assert!(resolver.resolve_with_fallback(None, Some("  ".to_string())).is_none());
    }

    #[test]
    fn test_from_host_resolves_utc_to_host_offset() {
        let resolver = TimezoneResolver::from_host();
        let expected = i64::from(resolver.host_offset().local_minus_utc()) * MILLIS_PER_SECOND;
        assert_eq!(resolver.resolve("UTC").offset_millis, expected);
    }
}
