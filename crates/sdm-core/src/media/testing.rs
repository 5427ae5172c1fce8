//! Scripted transport for agent and downloader tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{HttpResponse, HttpTransport};
use crate::retry::FetchError;

pub(crate) const XML_NOT_READY: &[u8] =
    b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>AccessDenied</Code></Error>";

pub(crate) fn audio(len: usize) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: vec![0xAB; len],
    }
}

pub(crate) fn not_ready() -> HttpResponse {
    HttpResponse {
        status: 200,
        body: XML_NOT_READY.to_vec(),
    }
}

/// Replays queued responses per URL; the last response of a queue repeats.
/// URLs with no script answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, String)>>,
    delays: HashMap<String, Duration>,
    post_outcome: PostOutcome,
}

/// What the conversion endpoint answers.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) enum PostOutcome {
    #[default]
    Accepted,
    Status(u32),
    Unreachable,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, url: &str, responses: Vec<HttpResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
        self
    }

    /// Every GET of `url` takes `delay` before answering.
    pub(crate) fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub(crate) fn post_outcome(mut self, outcome: PostOutcome) -> Self {
        self.post_outcome = outcome;
        self
    }

    pub(crate) fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub(crate) fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.gets.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        let resp = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        Ok(resp.unwrap_or(HttpResponse {
            status: 404,
            body: Vec::new(),
        }))
    }

    async fn post(&self, url: &str, bearer: &str) -> Result<u32, FetchError> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), bearer.to_string()));
        match self.post_outcome {
            PostOutcome::Accepted => Ok(202),
            PostOutcome::Status(status) => Ok(status),
            PostOutcome::Unreachable => Err(FetchError::Curl(curl::Error::new(7))),
        }
    }
}
