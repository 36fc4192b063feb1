//! Talks to the food-services site. Every request goes through [`Fetcher`], which carries
//! the user agent, timeout and redirect policy and is rate limited so that concurrent
//! callers never hammer the origin.
mod orchestrator;
mod urls;

use std::future::Future;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Jitter, Quota, RateLimiter,
};
use reqwest::{header, redirect, Client};
use tracing::{instrument, Level};
use url::Url;

use crate::error::{Error, Result};

pub use orchestrator::fetch_menus;
pub use urls::MenuUrls;

pub const USER_AGENT: &str = "LooBitesBot/1.0 (+contact@loobites.local)";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const TIMEOUT: Duration = Duration::from_secs(20);
const MAX_REDIRECTS: usize = 5;
const DELAY_JITTER: Duration = Duration::from_millis(250);

/// Source of page bodies. Anything that can answer a GET with the page's html.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

pub fn make_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(TIMEOUT)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .build()?;
    Ok(client)
}

pub struct Fetcher {
    client: Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>,
}

impl Fetcher {
    pub fn new(requests_per_second: NonZeroU32) -> Result<Self> {
        Ok(Self {
            client: make_client()?,
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        })
    }
}

impl Transport for Fetcher {
    #[instrument(skip_all, fields(url = %url), level = Level::TRACE)]
    async fn get(&self, url: &Url) -> Result<String> {
        self.limiter
            .until_ready_with_jitter(Jitter::up_to(DELAY_JITTER))
            .await;
        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        // redirects are already followed, so anything below 400 carries a page
        if status.is_client_error() || status.is_server_error() {
            return Err(Error::Status {
                url: url.clone(),
                status,
            });
        }
        let text = response.text().await?;
        log::trace!("Got {url} ({status}) in \t {:?}", start.elapsed());
        Ok(text)
    }
}
