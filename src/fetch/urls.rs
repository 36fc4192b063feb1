use chrono::NaiveDate;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE: &str =
    "https://uwaterloo.ca/food-services-information/locations-and-hours/daily-menu";

/// Every page url the orchestrator may request, derived from one configured base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuUrls {
    base: Url,
}

impl MenuUrls {
    /// An empty base falls back to [`DEFAULT_BASE`]; a base without a scheme is assumed https.
    pub fn resolve(configured: &str) -> Result<Self> {
        let configured = configured.trim();
        let raw = if configured.is_empty() {
            DEFAULT_BASE
        } else {
            configured
        };
        let has_scheme = raw
            .get(..8)
            .is_some_and(|s| s.eq_ignore_ascii_case("https://"))
            || raw
                .get(..7)
                .is_some_and(|s| s.eq_ignore_ascii_case("http://"));
        let with_scheme = if has_scheme {
            raw.to_owned()
        } else {
            format!("https://{raw}")
        };
        let base = Url::parse(&with_scheme)
            .map_err(|e| Error::configuration_error(format!("Invalid MENU_URL_BASE {raw:?}: {e}")))?;
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(Error::configuration_error(format!(
                "Invalid MENU_URL_BASE {raw:?}: not an absolute url"
            )));
        }
        Ok(Self { base })
    }

    /// The unmodified base, which lists the recent daily menus.
    pub const fn listing(&self) -> &Url {
        &self.base
    }

    pub fn origin(&self) -> Url {
        let mut origin = self.base.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        origin
    }

    /// The page the site publishes for a single date, on the base's origin.
    pub fn date_page(&self, date: NaiveDate) -> Result<Url> {
        let path = format!("/food-services-information/content/daily-menu-{date}");
        Ok(self.origin().join(&path)?)
    }

    pub fn with_date_query(&self, date: NaiveDate) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("date", &date.to_string());
        url
    }

    /// Resolves a link found on the listing page against the origin.
    pub fn resolve_link(&self, href: &str) -> Result<Url> {
        Ok(self.origin().join(href)?)
    }
}
