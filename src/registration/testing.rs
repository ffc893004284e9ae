//! Scripted collaborators shared by the registration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::environment::Environment;
use super::http::{HttpClient, HttpResponse};
use super::model::Registration;
use super::store::{MemoryStore, RegistrationStore};
use crate::error::{HttpError, StoreError};

pub(crate) const URL: &str = "https://example.com/";

pub(crate) fn registration() -> Registration {
    let mut body = Map::new();
    body.insert("customArgument".into(), json!("@tester"));
    Registration::new(URL, body)
}

/// Memory store that remembers every write.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<Option<String>>>,
}

impl RecordingStore {
    pub(crate) fn with_raw(raw: &str) -> Self {
        Self {
            inner: MemoryStore::with_value(raw),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_registration(registration: &Registration) -> Self {
        Self::with_raw(&registration.to_json().unwrap())
    }

    pub(crate) fn writes(&self) -> Vec<Option<String>> {
        self.writes.lock().unwrap().clone()
    }

    /// Pending token data of each write, in order (`None` for cleared or removed).
    pub(crate) fn pending_history(&self) -> Vec<Option<String>> {
        self.writes()
            .into_iter()
            .map(|w| {
                w.and_then(|raw| Registration::parse(&raw).unwrap().pending_token)
                    .map(|t| t.data)
            })
            .collect()
    }

    pub(crate) fn last_registration(&self) -> Option<Registration> {
        self.writes()
            .last()
            .cloned()
            .flatten()
            .map(|raw| Registration::parse(&raw).unwrap())
    }
}

#[async_trait]
impl RegistrationStore for RecordingStore {
    async fn get_registration(&self) -> Result<Option<String>, StoreError> {
        self.inner.get_registration().await
    }

    async fn set_registration(&self, value: Option<String>) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(value.clone());
        self.inner.set_registration(value).await
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SentRequest {
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: String,
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// HTTP client answering from a script; `200` once the script runs out.
#[derive(Default)]
pub(crate) struct ScriptedHttp {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    sent: Mutex<Vec<SentRequest>>,
    on_post: Mutex<Option<Hook>>,
}

impl ScriptedHttp {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, outcome: Result<HttpResponse, HttpError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn then_status(self, status: u16, body: &str) -> Self {
        self.then(Ok(HttpResponse::new(status, body)))
    }

    /// Runs `hook` inside every `post`, before it answers.
    pub(crate) fn on_post(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_post.lock().unwrap() = Some(Box::new(hook));
    }

    pub(crate) fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<HttpResponse, HttpError> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        });
        if let Some(hook) = self.on_post.lock().unwrap().as_ref() {
            hook();
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
    }
}

/// HTTP client that always rejects with `500`.
pub(crate) struct AlwaysFailing;

#[async_trait]
impl HttpClient for AlwaysFailing {
    async fn post(&self, _: &str, _: &[(&str, &str)], _: String) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::new(500, "Server error"))
    }
}

pub(crate) struct BrokenEnvironment;

#[async_trait]
impl Environment for BrokenEnvironment {
    async fn is_development(&self) -> anyhow::Result<bool> {
        anyhow::bail!("build constants unavailable")
    }
}

pub(crate) fn body_of(request: &SentRequest) -> Value {
    serde_json::from_str(&request.body).unwrap()
}
