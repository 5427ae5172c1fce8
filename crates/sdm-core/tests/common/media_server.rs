//! Minimal HTTP/1.1 server standing in for the media CDN and API.
//!
//! Each path has a queue of scripted responses; the last one repeats.
//! Unscripted paths answer 404. Every request is recorded.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: Vec<u8>,
}

pub fn ok(body: Vec<u8>) -> Scripted {
    Scripted { status: 200, body }
}

/// The CDN's "not ready yet" answer: a small XML error with a 200 status.
pub fn xml_error() -> Scripted {
    ok(b"<?xml version=\"1.0\"?><Error><Code>AccessDenied</Code></Error>".to_vec())
}

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Scripted>>,
    hits: Vec<Hit>,
}

#[derive(Clone)]
pub struct MediaServer {
    pub base: String,
    state: Arc<Mutex<State>>,
}

impl MediaServer {
    /// Starts the server on a background thread; it runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn script(&self, path: &str, responses: Vec<Scripted>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(path.to_string(), responses.into());
    }

    pub fn hits(&self, path: &str) -> Vec<Hit> {
        self.state
            .lock()
            .unwrap()
            .hits
            .iter()
            .filter(|h| h.path == path)
            .cloned()
            .collect()
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let hit = parse_request(request);

    let reply = {
        let mut st = state.lock().unwrap();
        st.hits.push(hit.clone());
        match st.scripts.get_mut(&hit.path) {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        }
    }
    .unwrap_or(Scripted {
        status: 404,
        body: Vec::new(),
    });

    let head = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
}

fn parse_request(request: &str) -> Hit {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let authorization = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.trim().to_string());
    Hit {
        method,
        path,
        authorization,
    }
}
