/// AI suggestion envelope.
///
/// The provider sits behind `SuggestionBackend` and reports failures as raw
/// strings; everything on this side classifies those strings exactly once
/// into `ErrorClass` and drives a bounded exponential-backoff retry loop.
/// Callers always receive a `SuggestionResponse` value — a present `error`
/// field is the definitive failure signal, nothing is thrown across the
/// boundary.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{Priority, Task};

/// Substrings (case-insensitive) marking a transient provider failure.
const TRANSIENT_MARKERS: &[&str] = &["503", "overloaded", "unavailable", "internal error", "timeout"];

/// Provider seam: one prompt in, one raw completion out.
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, String>;
}

/// Failure classification, derived once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying: the provider was briefly unhappy.
    Transient,
    /// Structurally present but semantically empty/invalid payload.
    /// Retryable up to the attempt budget.
    Malformed,
    /// Anything else: abort immediately.
    Fatal,
}

pub fn classify_error(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Fatal
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry N (1-based): base * 2^(N-1).
    fn delay_before_retry(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// What callers get back: a value or a terminal error message, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionResponse<T> {
    pub value: Option<T>,
    pub error: Option<String>,
}

impl<T> SuggestionResponse<T> {
    fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.value.is_some()
    }
}

/// Task metadata handed to the suggestion prompts.
#[derive(Debug, Clone, Default)]
pub struct SuggestionInput {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl SuggestionInput {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            tags: task.tags.clone(),
        }
    }

    fn context(&self) -> String {
        let mut out = format!("Title: {}", self.title);
        if let Some(description) = &self.description {
            out.push_str(&format!("\nDescription: {description}"));
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("\nTags: {}", self.tags.join(", ")));
        }
        out
    }
}

pub struct SuggestClient<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: SuggestionBackend> SuggestClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Drive the retry loop. `parse` turns the raw completion into a typed
    /// value; a parse error counts as a Malformed (retryable) failure.
    async fn complete_with_retry<T, F>(&self, prompt: &str, parse: F) -> SuggestionResponse<T>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        let mut last_error = String::from("no attempts made");
        for attempt in 1..=self.policy.attempts.max(1) {
            if attempt > 1 {
                let delay = self.policy.delay_before_retry(attempt - 1);
                log::info!(
                    "[boardstore.suggest.retry] Attempt {}/{} after {:?}: {}",
                    attempt,
                    self.policy.attempts,
                    delay,
                    last_error
                );
                tokio::time::sleep(delay).await;
            }
            match self.backend.complete(prompt).await {
                Ok(raw) => match parse(&raw) {
                    Ok(value) => return SuggestionResponse::ok(value),
                    Err(err) => {
                        log::warn!("[boardstore.suggest.parse] Malformed response: {}", err);
                        last_error = err;
                    }
                },
                Err(err) => match classify_error(&err) {
                    ErrorClass::Transient => last_error = err,
                    _ => {
                        log::warn!("[boardstore.suggest.fatal] Aborting: {}", err);
                        return SuggestionResponse::failed(err);
                    }
                },
            }
        }
        SuggestionResponse::failed(last_error)
    }

    pub async fn suggest_description(&self, input: &SuggestionInput) -> SuggestionResponse<String> {
        let prompt = format!(
            "Write a one-paragraph task description as JSON {{\"description\": \"...\"}}.\n{}",
            input.context()
        );
        self.complete_with_retry(&prompt, parse_description).await
    }

    pub async fn suggest_tags(&self, input: &SuggestionInput) -> SuggestionResponse<Vec<String>> {
        let prompt = format!(
            "Suggest short tags for this task as JSON {{\"tags\": [\"...\"]}}.\n{}",
            input.context()
        );
        self.complete_with_retry(&prompt, parse_tags).await
    }

    pub async fn suggest_subtasks(&self, input: &SuggestionInput) -> SuggestionResponse<Vec<String>> {
        let prompt = format!(
            "Break this task into subtasks as JSON {{\"subtasks\": [\"...\"]}}.\n{}",
            input.context()
        );
        self.complete_with_retry(&prompt, parse_subtasks).await
    }

    pub async fn suggest_priority(&self, input: &SuggestionInput) -> SuggestionResponse<Priority> {
        let prompt = format!(
            "Rate this task's priority as JSON {{\"priority\": \"low|medium|high\"}}.\n{}",
            input.context()
        );
        self.complete_with_retry(&prompt, parse_priority).await
    }

    /// Pick a focus batch: up to `size` task ids worth working on next.
    /// Ids the provider invents are dropped; an empty result after filtering
    /// counts as malformed.
    pub async fn suggest_focus_batch(
        &self,
        tasks: &[Task],
        size: usize,
    ) -> SuggestionResponse<Vec<String>> {
        let listing: Vec<String> = tasks
            .iter()
            .map(|t| format!("- {} [{}] priority {:?} due {:?}", t.id, t.title, t.priority, t.due_date))
            .collect();
        let prompt = format!(
            "Pick up to {} task ids to focus on as JSON {{\"taskIds\": [\"...\"]}}.\n{}",
            size,
            listing.join("\n")
        );
        let known: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        self.complete_with_retry(&prompt, move |raw| {
            let mut ids = parse_focus_batch(raw)?;
            ids.retain(|id| known.contains(id));
            ids.truncate(size);
            if ids.is_empty() {
                return Err("no known task ids in response".to_string());
            }
            Ok(ids)
        })
        .await
    }
}

#[derive(Deserialize)]
struct DescriptionPayload {
    description: String,
}

fn parse_description(raw: &str) -> Result<String, String> {
    let payload: DescriptionPayload =
        serde_json::from_str(raw).map_err(|e| format!("bad description payload: {e}"))?;
    if payload.description.trim().is_empty() {
        return Err("empty description in response".to_string());
    }
    Ok(payload.description)
}

#[derive(Deserialize)]
struct TagsPayload {
    tags: Vec<String>,
}

fn parse_tags(raw: &str) -> Result<Vec<String>, String> {
    let payload: TagsPayload =
        serde_json::from_str(raw).map_err(|e| format!("bad tags payload: {e}"))?;
    let tags: Vec<String> = payload
        .tags
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect();
    if tags.is_empty() {
        return Err("no tags in response".to_string());
    }
    Ok(tags)
}

#[derive(Deserialize)]
struct SubtasksPayload {
    subtasks: Vec<String>,
}

fn parse_subtasks(raw: &str) -> Result<Vec<String>, String> {
    let payload: SubtasksPayload =
        serde_json::from_str(raw).map_err(|e| format!("bad subtasks payload: {e}"))?;
    let subtasks: Vec<String> = payload
        .subtasks
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .collect();
    if subtasks.is_empty() {
        return Err("no subtasks in response".to_string());
    }
    Ok(subtasks)
}

#[derive(Deserialize)]
struct PriorityPayload {
    priority: Priority,
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    let payload: PriorityPayload =
        serde_json::from_str(raw).map_err(|e| format!("bad priority payload: {e}"))?;
    Ok(payload.priority)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FocusPayload {
    task_ids: Vec<String>,
}

fn parse_focus_batch(raw: &str) -> Result<Vec<String>, String> {
    let payload: FocusPayload =
        serde_json::from_str(raw).map_err(|e| format!("bad focus payload: {e}"))?;
    Ok(payload.task_ids)
}
