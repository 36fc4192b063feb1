//! Tries the candidate pages for a date one after another until one of them parses to at
//! least one cafeteria:
//!
//! `DirectDatePage -> QueryParamPage -> ListingDiscovery -> Failed`
//!
//! A transport failure or an empty parse both move on to the next attempt. Once every
//! attempt is spent, the most recent transport failure is returned; if there never was one
//! the day simply has no menu and an empty snapshot comes back.
use chrono::NaiveDate;
use scraper::Html;
use tracing::instrument;

use super::{MenuUrls, Transport};
use crate::error::Result;
use crate::menu::MenuSnapshot;
use crate::parse::parse_menus_from_html;
use crate::static_selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    DirectDatePage,
    QueryParamPage,
    ListingDiscovery,
}

impl Attempt {
    const fn next(self) -> Option<Self> {
        match self {
            Self::DirectDatePage => Some(Self::QueryParamPage),
            Self::QueryParamPage => Some(Self::ListingDiscovery),
            Self::ListingDiscovery => None,
        }
    }
}

enum Outcome {
    Found(MenuSnapshot),
    /// The page was fetched but held nothing for us.
    NoContent(String),
}

#[instrument(skip(transport, urls), fields(date = %date))]
pub async fn fetch_menus<T: Transport>(
    transport: &T,
    urls: &MenuUrls,
    date: NaiveDate,
) -> Result<MenuSnapshot> {
    let mut last_error = None;
    let mut attempt = Some(Attempt::DirectDatePage);
    while let Some(current) = attempt {
        match run(transport, urls, date, current).await {
            Ok(Outcome::Found(snapshot)) => {
                log::info!(
                    "{current:?} found {} cafeterias for {date}",
                    snapshot.available_cafeterias().len()
                );
                return Ok(snapshot);
            }
            Ok(Outcome::NoContent(reason)) => log::debug!("{current:?}: {reason}"),
            Err(e) if e.is_transport() => {
                log::warn!("{current:?} failed for {date}: {e}");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
        attempt = current.next();
    }

    match last_error {
        Some(e) => Err(e),
        None => {
            log::info!("no menu published for {date}");
            Ok(MenuSnapshot::empty(date))
        }
    }
}

async fn run<T: Transport>(
    transport: &T,
    urls: &MenuUrls,
    date: NaiveDate,
    attempt: Attempt,
) -> Result<Outcome> {
    let url = match attempt {
        Attempt::DirectDatePage => urls.date_page(date)?,
        Attempt::QueryParamPage => urls.with_date_query(date),
        Attempt::ListingDiscovery => {
            let listing = transport.get(urls.listing()).await?;
            let Some(href) = find_date_link(&listing, date) else {
                return Ok(Outcome::NoContent(format!(
                    "no link to {date} on {}",
                    urls.listing()
                )));
            };
            urls.resolve_link(&href)?
        }
    };

    let html = transport.get(&url).await?;
    let snapshot = parse_menus_from_html(&html, date);
    if snapshot.is_empty() {
        Ok(Outcome::NoContent(format!("no menu parsed from {url}")))
    } else {
        Ok(Outcome::Found(snapshot))
    }
}

/// First link on the listing page pointing at the daily-menu page of `date`.
fn find_date_link(listing: &str, date: NaiveDate) -> Option<String> {
    static_selector!(DAILY_MENU_LINK <- "a[href*='content/daily-menu-']");
    let key = format!("daily-menu-{date}");
    let document = Html::parse_document(listing);
    let href = document
        .select(&DAILY_MENU_LINK)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| href.contains(&key))
        .map(str::to_owned);
    href
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::num::NonZeroU32;
    use std::sync::Mutex;

    use httpmock::prelude::*;
    use reqwest::StatusCode;
    use url::Url;

    use super::*;
    use crate::error::Error;
    use crate::fetch::Fetcher;

    const BASE: &str = "https://uwaterloo.ca/food-services-information/locations-and-hours/daily-menu";
    const DATE_PAGE: &str =
        "https://uwaterloo.ca/food-services-information/content/daily-menu-2024-03-01";
    const QUERY_PAGE: &str =
        "https://uwaterloo.ca/food-services-information/locations-and-hours/daily-menu?date=2024-03-01";
    const LINKED_PAGE: &str =
        "https://uwaterloo.ca/food-services-information/content/daily-menu-2024-03-01-0";

    const LISTING: &str = r#"<html><body><main>
        <a href="/food-services-information/content/daily-menu-2024-02-29">Thursday</a>
        <a href="/food-services-information/content/daily-menu-2024-03-01-0">Friday</a>
    </main></body></html>"#;
    const NO_MENU: &str = "<html><body><main><p>Menus are coming soon.</p></main></body></html>";

    enum Reply {
        Page(String),
        Status(StatusCode),
    }

    /// In-memory origin that records every url requested of it.
    #[derive(Default)]
    struct MockOrigin {
        replies: HashMap<&'static str, Reply>,
        requested: Mutex<Vec<String>>,
    }

    impl MockOrigin {
        fn page(mut self, url: &'static str, html: &str) -> Self {
            self.replies.insert(url, Reply::Page(html.to_owned()));
            self
        }

        fn status(mut self, url: &'static str, status: StatusCode) -> Self {
            self.replies.insert(url, Reply::Status(status));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl Transport for MockOrigin {
        async fn get(&self, url: &Url) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.replies.get(url.as_str()) {
                Some(Reply::Page(html)) => Ok(html.clone()),
                Some(Reply::Status(status)) => Err(Error::Status {
                    url: url.clone(),
                    status: *status,
                }),
                None => Err(Error::Status {
                    url: url.clone(),
                    status: StatusCode::NOT_FOUND,
                }),
            }
        }
    }

    fn grill_page() -> String {
        fs::read_to_string("./src/parse/html_examples/structured/grill.html").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn urls() -> MenuUrls {
        MenuUrls::resolve(BASE).unwrap()
    }

    #[tokio::test]
    async fn test_direct_page_short_circuits() {
        let origin = MockOrigin::default().page(DATE_PAGE, &grill_page());
        let snapshot = fetch_menus(&origin, &urls(), date()).await.unwrap();
        assert_eq!(snapshot.available_cafeterias(), ["cmh"]);
        assert_eq!(origin.requested(), [DATE_PAGE]);
    }

    #[tokio::test]
    async fn test_listing_discovery_after_two_not_found() {
        let origin = MockOrigin::default()
            .status(DATE_PAGE, StatusCode::NOT_FOUND)
            .status(QUERY_PAGE, StatusCode::NOT_FOUND)
            .page(BASE, LISTING)
            .page(LINKED_PAGE, &grill_page());

        let snapshot = fetch_menus(&origin, &urls(), date()).await.unwrap();
        let cmh = snapshot.cafeteria("cmh").unwrap();
        assert_eq!(cmh.stations()[0].name(), "Grill");
        assert_eq!(cmh.stations()[0].items().len(), 2);
        // the listing and the page it links to are the last two requests, nothing after
        assert_eq!(origin.requested(), [DATE_PAGE, QUERY_PAGE, BASE, LINKED_PAGE]);
    }

    #[tokio::test]
    async fn test_empty_pages_without_errors_give_empty_snapshot() {
        let origin = MockOrigin::default()
            .page(DATE_PAGE, NO_MENU)
            .page(QUERY_PAGE, NO_MENU)
            .page(BASE, NO_MENU);

        let snapshot = fetch_menus(&origin, &urls(), date()).await.unwrap();
        assert_eq!(snapshot, MenuSnapshot::empty(date()));
        assert_eq!(origin.requested(), [DATE_PAGE, QUERY_PAGE, BASE]);
    }

    #[tokio::test]
    async fn test_most_recent_transport_error_is_returned() {
        let origin = MockOrigin::default()
            .status(DATE_PAGE, StatusCode::INTERNAL_SERVER_ERROR)
            .status(QUERY_PAGE, StatusCode::NOT_FOUND)
            .page(BASE, NO_MENU);

        let err = fetch_menus(&origin, &urls(), date()).await.unwrap_err();
        match err {
            Error::Status { url, status } => {
                assert_eq!(url.as_str(), QUERY_PAGE);
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_linked_page_failure_is_returned() {
        let origin = MockOrigin::default()
            .page(DATE_PAGE, NO_MENU)
            .page(QUERY_PAGE, NO_MENU)
            .page(BASE, LISTING)
            .status(LINKED_PAGE, StatusCode::SERVICE_UNAVAILABLE);

        let err = fetch_menus(&origin, &urls(), date()).await.unwrap_err();
        assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_find_date_link() {
        assert_eq!(
            find_date_link(LISTING, date()).as_deref(),
            Some("/food-services-information/content/daily-menu-2024-03-01-0")
        );
        let other_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(find_date_link(LISTING, other_day), None);
        let unrelated = r#"<a href="/news/daily-menu-2024-03-01">not a menu page</a>"#;
        assert_eq!(find_date_link(unrelated, date()), None);
    }

    #[tokio::test]
    async fn test_fetch_through_http() {
        let server = MockServer::start_async().await;
        let date_page = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/food-services-information/content/daily-menu-2024-03-01");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body(grill_page());
            })
            .await;

        let urls = MenuUrls::resolve(
            &server.url("/food-services-information/locations-and-hours/daily-menu"),
        )
        .unwrap();
        let fetcher = Fetcher::new(NonZeroU32::new(100).unwrap()).unwrap();
        let snapshot = fetch_menus(&fetcher, &urls, date()).await.unwrap();
        assert_eq!(snapshot.available_cafeterias(), ["cmh"]);
        date_page.assert_hits_async(1).await;
    }
}
