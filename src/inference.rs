//! Remote video inference.
//!
//! The provider call is blocking: it returns only once the remote model has
//! finished, which can take minutes. Callers must run [`InferenceClient::run`]
//! on a blocking worker, never on the request-serving loop.

use crate::error::{GenerationError, GenerationResult};
use crate::io_struct::GenerationInput;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// A provider output object that knows where its file lives.
pub trait FileOutput: Send {
    fn url(&self) -> String;
}

/// JSON object with a `url` field, as returned for file outputs.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    url: String,
}

impl RemoteFile {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl FileOutput for RemoteFile {
    fn url(&self) -> String {
        self.url.clone()
    }
}

/// The shapes a provider may hand back for a finished generation.
pub enum InferenceOutput {
    Empty,
    Locator(String),
    Sequence(Vec<Value>),
    File(Box<dyn FileOutput>),
    Unsupported(Value),
}

impl std::fmt::Debug for InferenceOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceOutput::Empty => f.write_str("Empty"),
            InferenceOutput::Locator(url) => f.debug_tuple("Locator").field(url).finish(),
            InferenceOutput::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            InferenceOutput::File(file) => f.debug_tuple("File").field(&file.url()).finish(),
            InferenceOutput::Unsupported(value) => {
                f.debug_tuple("Unsupported").field(value).finish()
            }
        }
    }
}

impl From<Value> for InferenceOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => InferenceOutput::Empty,
            Value::String(s) if s.is_empty() => InferenceOutput::Empty,
            Value::String(s) => InferenceOutput::Locator(s),
            Value::Array(items) if items.is_empty() => InferenceOutput::Empty,
            Value::Array(items) => InferenceOutput::Sequence(items),
            Value::Object(map) => {
                let url = map.get("url").and_then(Value::as_str).map(str::to_string);
                match url {
                    Some(url) => InferenceOutput::File(Box::new(RemoteFile::new(url))),
                    None => InferenceOutput::Unsupported(Value::Object(map)),
                }
            }
            other => InferenceOutput::Unsupported(other),
        }
    }
}

impl InferenceOutput {
    /// Resolves the output to a single locator.
    ///
    /// An accessor wins over everything else, then the first element of a
    /// sequence, then the value itself.
    pub fn into_locator(self) -> GenerationResult<String> {
        let locator = match self {
            InferenceOutput::Empty => return Err(GenerationError::EmptyResult),
            InferenceOutput::File(file) => file.url(),
            InferenceOutput::Sequence(items) => match items.into_iter().next() {
                Some(Value::String(url)) => url,
                Some(Value::Object(map)) => {
                    match map.get("url").and_then(Value::as_str).map(str::to_string) {
                        Some(url) => url,
                        None => {
                            return Err(GenerationError::Inference(format!(
                                "unsupported output element: {}",
                                Value::Object(map)
                            )));
                        }
                    }
                }
                Some(other) => {
                    return Err(GenerationError::Inference(format!(
                        "unsupported output element: {}",
                        other
                    )));
                }
                None => return Err(GenerationError::EmptyResult),
            },
            InferenceOutput::Locator(url) => url,
            InferenceOutput::Unsupported(value) => {
                return Err(GenerationError::Inference(format!(
                    "unsupported output shape: {}",
                    value
                )));
            }
        };
        if locator.trim().is_empty() {
            return Err(GenerationError::EmptyResult);
        }
        Ok(locator)
    }
}

pub trait InferenceClient: Send + Sync {
    /// Runs `model` on `input` and blocks until the provider has an answer.
    fn run(&self, model: &str, input: &GenerationInput) -> GenerationResult<InferenceOutput>;
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    urls: Option<PredictionUrls>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    fn error_message(&self) -> String {
        match &self.error {
            Value::Null => format!("prediction {} {}", self.id, self.status),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Blocking client for the Replicate predictions API.
#[derive(Clone)]
pub struct ReplicateClient {
    api_token: String,
    base_url: String,
    poll_interval: Duration,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ReplicateClient {
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(1),
            request_timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Per-HTTP-request bound. Unset leaves each request unbounded.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Endpoint and body for creating a prediction of `model`.
    ///
    /// `owner/name` targets the model's latest version; `owner/name:version`
    /// pins a version.
    fn prediction_request(
        &self,
        model: &str,
        input: &GenerationInput,
    ) -> GenerationResult<(String, Value)> {
        let (name, version) = match model.split_once(':') {
            Some((name, version)) => (name, Some(version)),
            None => (model, None),
        };
        let Some((owner, model_name)) = name.split_once('/') else {
            return Err(GenerationError::Inference(format!(
                "invalid model reference '{}', expected owner/name[:version]",
                model
            )));
        };
        if owner.is_empty() || model_name.is_empty() {
            return Err(GenerationError::Inference(format!(
                "invalid model reference '{}'",
                model
            )));
        }
        Ok(match version {
            Some(version) => (
                format!("{}/predictions", self.base_url),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/{}/predictions", self.base_url, owner, model_name),
                json!({ "input": input }),
            ),
        })
    }

    fn read_prediction(resp: reqwest::blocking::Response) -> GenerationResult<Prediction> {
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GenerationError::Inference(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Inference(format!(
                "provider returned {}: {}",
                status, body
            )));
        }
        serde_json::from_str(&body).map_err(|e| {
            GenerationError::Inference(format!("malformed prediction response: {}", e))
        })
    }
}

impl InferenceClient for ReplicateClient {
    fn run(&self, model: &str, input: &GenerationInput) -> GenerationResult<InferenceOutput> {
        let (url, body) = self.prediction_request(model, input)?;

        // Built here so it is created and dropped on the blocking worker.
        // The blocking builder defaults to a 30s bound; `None` lifts it.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| GenerationError::Inference(e.to_string()))?;

        log::debug!("Creating prediction at {}", url);
        let resp = client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Inference(e.to_string()))?;
        let mut prediction = Self::read_prediction(resp)?;

        while !prediction.is_terminal() {
            let Some(poll_url) = prediction.urls.as_ref().and_then(|u| u.get.clone()) else {
                return Err(GenerationError::Inference(format!(
                    "prediction {} is {} but has no poll url",
                    prediction.id, prediction.status
                )));
            };
            std::thread::sleep(self.poll_interval);
            log::debug!("Polling prediction {} ({})", prediction.id, prediction.status);
            let resp = client
                .get(&poll_url)
                .bearer_auth(&self.api_token)
                .send()
                .map_err(|e| GenerationError::Inference(e.to_string()))?;
            prediction = Self::read_prediction(resp)?;
        }

        match prediction.status.as_str() {
            "succeeded" => {
                log::info!("Prediction {} succeeded", prediction.id);
                Ok(InferenceOutput::from(prediction.output))
            }
            _ => Err(GenerationError::Inference(prediction.error_message())),
        }
    }
}
