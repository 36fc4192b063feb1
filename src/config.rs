use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::num::{NonZeroU32, NonZeroUsize};
use std::str::FromStr;

use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Everything the server reads from its environment, parsed once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listing page base url. Empty means the public food-services page.
    pub menu_url_base: String,
    pub addr: SocketAddr,
    pub cache_ttl: chrono::Duration,
    pub cache_capacity: NonZeroUsize,
    /// Zone that decides what "today" is.
    pub timezone: Tz,
    pub refresh_interval: std::time::Duration,
    pub requests_per_second: NonZeroU32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let port: u16 = parsed(&lookup, "PORT", 4000)?;
        let addr = SocketAddr::from_str(&format!("{host}:{port}"))
            .map_err(|e| Error::configuration_error(format!("Invalid HOST {host:?}: {e}")))?;
        let cache_ttl_secs: u32 = parsed(&lookup, "CACHE_TTL_SECS", 300)?;
        let refresh_secs: u64 = parsed(&lookup, "REFRESH_INTERVAL_SECS", 6 * 60 * 60)?;
        Ok(Self {
            menu_url_base: lookup("MENU_URL_BASE").unwrap_or_default(),
            addr,
            cache_ttl: chrono::Duration::seconds(i64::from(cache_ttl_secs)),
            cache_capacity: parsed(&lookup, "CACHE_CAPACITY", NonZeroUsize::MIN.saturating_add(63))?,
            timezone: parsed(&lookup, "MENU_TIMEZONE", chrono_tz::America::Toronto)?,
            refresh_interval: std::time::Duration::from_secs(refresh_secs),
            requests_per_second: parsed(&lookup, "REQUESTS_PER_SECOND", NonZeroU32::MIN.saturating_add(1))?,
        })
    }
}

fn parsed<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::configuration_error(format!("Invalid {key} {raw:?}: {e}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.menu_url_base, "");
        assert_eq!(config.addr.to_string(), "127.0.0.1:4000");
        assert_eq!(config.cache_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.cache_capacity.get(), 64);
        assert_eq!(config.timezone, chrono_tz::America::Toronto);
        assert_eq!(config.refresh_interval.as_secs(), 21600);
        assert_eq!(config.requests_per_second.get(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("MENU_URL_BASE", "menus.example.edu/daily"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("CACHE_TTL_SECS", "60"),
            ("MENU_TIMEZONE", "America/Vancouver"),
            ("REQUESTS_PER_SECOND", " 5 "),
        ])
        .unwrap();
        assert_eq!(config.menu_url_base, "menus.example.edu/daily");
        assert_eq!(config.addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.cache_ttl, chrono::Duration::seconds(60));
        assert_eq!(config.timezone, chrono_tz::America::Vancouver);
        assert_eq!(config.requests_per_second.get(), 5);
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("PORT", "eighty")],
            [("CACHE_CAPACITY", "0")],
            [("MENU_TIMEZONE", "Mars/Olympus_Mons")],
            [("REQUESTS_PER_SECOND", "0")],
            [("HOST", "not a host")],
        ] {
            let err = config(&vars).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{vars:?}");
        }
    }
}
