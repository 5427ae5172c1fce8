//! HTTP transport used by the media agent.
//!
//! Transfers run on libcurl easy handles inside `spawn_blocking`, so they
//! never stall the cooperative scheduler.

use std::future::Future;
use std::time::Duration;

use crate::config::MediaConfig;
use crate::retry::FetchError;

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two requests the media agent makes.
pub trait HttpTransport: Send + Sync + 'static {
    /// GET `url`, returning status and body. Non-2xx statuses are not errors here.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;

    /// POST an empty body to `url` with a bearer token; returns the status.
    fn post(&self, url: &str, bearer: &str) -> impl Future<Output = Result<u32, FetchError>> + Send;
}

/// libcurl options shared by every transfer.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(600),
        }
    }
}

/// [`HttpTransport`] over libcurl.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlOptions {
    pub fn from_config(cfg: &MediaConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
        }
    }
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

fn configure(easy: &mut curl::easy::Easy, url: &str, opts: CurlOptions) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(opts.transfer_timeout)?;
    Ok(())
}

fn blocking_get(url: &str, opts: CurlOptions) -> Result<HttpResponse, FetchError> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    Ok(HttpResponse { status, body })
}

fn blocking_post(url: &str, bearer: &str, opts: CurlOptions) -> Result<u32, FetchError> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts)?;
    easy.post(true)?;
    easy.post_fields_copy(&[])?;
    let mut headers = curl::easy::List::new();
    headers.append(&format!("Authorization: Bearer {}", bearer.trim()))?;
    easy.http_headers(headers)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| Ok(data.len()))?;
        transfer.perform()?;
    }
    Ok(easy.response_code()?)
}

impl HttpTransport for CurlTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let url = url.to_string();
        let opts = self.opts;
        tokio::task::spawn_blocking(move || blocking_get(&url, opts))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?
    }

    async fn post(&self, url: &str, bearer: &str) -> Result<u32, FetchError> {
        let url = url.to_string();
        let bearer = bearer.to_string();
        let opts = self.opts;
        tokio::task::spawn_blocking(move || blocking_post(&url, &bearer, opts))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?
    }
}
