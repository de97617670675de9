#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use deere_http::{Transport, TransportError, TransportRequest, TransportResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value as JsonValue;
use tokio::time::Instant;

#[derive(Clone, Debug)]
pub enum Step {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: String,
    },
    Hang,
    Network,
    Other,
}

impl Step {
    pub fn json(status: u16, body: JsonValue) -> Self {
        Self::Respond {
            status,
            headers: vec![("content-type", "application/json")],
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Respond {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        if let Self::Respond { headers, .. } = &mut self {
            headers.push((name, value));
        }
        self
    }
}

/// In-memory transport that replays a script and records every attempt.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    /// Scripts keyed by URL suffix; checked before `steps`.
    routes: Arc<Mutex<HashMap<&'static str, VecDeque<Step>>>>,
    fallback: Option<Step>,
    requests: Arc<Mutex<Vec<(Instant, TransportRequest)>>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Replays `step` forever once the script is exhausted.
    pub fn repeating(step: Step) -> Self {
        Self {
            fallback: Some(step),
            ..Self::default()
        }
    }

    /// Replays a separate script for each URL ending in the given suffix.
    pub fn routed(routes: impl IntoIterator<Item = (&'static str, Vec<Step>)>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(suffix, steps)| (suffix, steps.into_iter().collect()))
            .collect();
        Self {
            routes: Arc::new(Mutex::new(routes)),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempt_times_for("")
    }

    /// Start times of the attempts whose URL ends with `suffix`.
    pub fn attempt_times_for(&self, suffix: &str) -> Vec<Instant> {
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .iter()
            .filter(|(_, request)| request.url.ends_with(suffix))
            .map(|(at, _)| *at)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = request.url.clone();
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .push((Instant::now(), request));

        let routed = self
            .routes
            .lock()
            .expect("route table mutex must not be poisoned")
            .iter_mut()
            .find(|(suffix, _)| url.ends_with(**suffix))
            .map(|(_, steps)| steps.pop_front());
        let step = routed.unwrap_or_else(|| {
            self.steps
                .lock()
                .expect("step queue mutex must not be poisoned")
                .pop_front()
                .or_else(|| self.fallback.clone())
        });

        match step.unwrap_or_else(|| Step::json(500, serde_json::json!({"error": "script exhausted"}))) {
            Step::Respond {
                status,
                headers,
                body,
            } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    );
                }
                Ok(TransportResponse {
                    status,
                    status_text: reqwest::StatusCode::from_u16(status)
                        .ok()
                        .and_then(|code| code.canonical_reason())
                        .unwrap_or_default()
                        .to_owned(),
                    headers: map,
                    body,
                })
            }
            Step::Hang => std::future::pending().await,
            Step::Network => Err(TransportError::network("connection refused")),
            Step::Other => Err(TransportError::other("invalid request")),
        }
    }
}

pub fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}
