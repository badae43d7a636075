// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Async task polling.
//!
//! Long-running operations answer immediately and hand back a pointer to a
//! task that has to be polled. Services differ in how they say so: some
//! return `202 Accepted`, others return `200` with a self-referencing task
//! link in the body. They also differ in how they report completion: a bare
//! `200`, or a `status` field spelled `FINISHED` or `COMPLETED`.
//!
//! [`TaskSignal::detect`] classifies the initiating response once. After that
//! [`TaskPoller`] runs a single loop regardless of which signal fired:
//!
//! ```text
//! INITIATED -> POLLING -> FINISHED | FAILED | TIMED_OUT
//! ```

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SdkError};
use crate::retry::{Outcome, RetryPolicy, Step};
use crate::session::{RequestOptions, SessionManager};

/// Body fields that carry a follow-up task URL, by service convention.
pub const TASK_REFERENCE_FIELDS: &[&str] = &["selfLink", "self_link", "taskUrl"];

/// Status values that mean the task completed successfully.
pub const SUCCESS_STATUSES: &[&str] = &["FINISHED", "COMPLETED"];

/// Status value that means the task failed.
pub const FAILURE_STATUS: &str = "FAILED";

const HTTP_OK: u16 = 200;
const HTTP_ACCEPTED: u16 = 202;

/// How an initiating response announced itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSignal {
    /// `202 Accepted`.
    AcceptedByStatusCode,
    /// A task-reference field in the body.
    AcceptedByBodyField,
    /// The response already is the result.
    ImmediateSuccess,
}

impl TaskSignal {
    pub fn detect(status: u16, body: &Value) -> Self {
        if status == HTTP_ACCEPTED {
            TaskSignal::AcceptedByStatusCode
        } else if task_reference(body).is_some() {
            TaskSignal::AcceptedByBodyField
        } else {
            TaskSignal::ImmediateSuccess
        }
    }
}

/// Lifecycle of one polled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Initiated,
    Polling,
    Finished,
    Failed,
    TimedOut,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Initiated => "INITIATED",
            TaskState::Polling => "POLLING",
            TaskState::Finished => "FINISHED",
            TaskState::Failed => "FAILED",
            TaskState::TimedOut => "TIMED_OUT",
        };
        f.write_str(name)
    }
}

/// Where to poll, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReference {
    /// Device-relative path, e.g. `/mgmt/shared/iapp/package-management-tasks/<id>`.
    pub url: String,
    pub signal: TaskSignal,
}

impl TaskReference {
    /// Build a reference from an initiating response.
    ///
    /// Returns `Ok(None)` for [`TaskSignal::ImmediateSuccess`]. A `202` without
    /// any follow-up link is an unexpected response.
    pub fn from_response(status: u16, body: &Value) -> Result<Option<Self>> {
        let signal = TaskSignal::detect(status, body);
        if signal == TaskSignal::ImmediateSuccess {
            return Ok(None);
        }

        let url = task_reference(body).ok_or_else(|| {
            SdkError::UnexpectedResponse(format!(
                "HTTP {} response carries no task reference",
                status
            ))
        })?;
        Ok(Some(Self { url, signal }))
    }
}

/// Find a task-reference URL in `body` and reduce it to a device path.
///
/// `selfLink` is set on every iControl REST object, so only links that point
/// at a task resource count.
pub fn task_reference(body: &Value) -> Option<String> {
    TASK_REFERENCE_FIELDS
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .map(normalize_task_url)
        .find(|path| path.contains("task"))
}

/// `https://localhost/mgmt/shared/x?ver=1` → `/mgmt/shared/x?ver=1`.
pub fn normalize_task_url(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => link.to_string(),
    }
}

/// Verdict on one poll response.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision {
    Finished,
    Failed(String),
    Pending,
}

/// Read the task status from `status`, falling back to `result.status`.
fn status_field(body: &Value) -> Option<&str> {
    body.get("status")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/result/status").and_then(Value::as_str))
}

fn failure_message(body: &Value) -> String {
    ["/errorMessage", "/result/message", "/message"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .unwrap_or("task reported failure without a message")
        .to_string()
}

/// Decide whether a poll response is terminal.
///
/// - status absent or a success synonym (any casing) on HTTP 200: finished
/// - status `FAILED`: failed, with the server's message
/// - anything else: keep polling
pub fn evaluate(http_status: u16, body: &Value) -> PollDecision {
    match status_field(body) {
        Some(status) if status.eq_ignore_ascii_case(FAILURE_STATUS) => {
            PollDecision::Failed(failure_message(body))
        }
        Some(status)
            if SUCCESS_STATUSES
                .iter()
                .any(|success| status.eq_ignore_ascii_case(success)) =>
        {
            if http_status == HTTP_OK {
                PollDecision::Finished
            } else {
                PollDecision::Pending
            }
        }
        Some(_) => PollDecision::Pending,
        None if http_status == HTTP_OK => PollDecision::Finished,
        None => PollDecision::Pending,
    }
}

/// Polls task references through an authenticated session.
#[derive(Debug)]
pub struct TaskPoller<'a> {
    session: &'a SessionManager,
    policy: RetryPolicy,
}

impl<'a> TaskPoller<'a> {
    pub fn new(session: &'a SessionManager, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    /// Poller using the session's [`ClientConfig::task_retry`](crate::ClientConfig) budget.
    pub fn with_defaults(session: &'a SessionManager) -> Self {
        Self::new(session, session.config().task_retry)
    }

    /// Resolve the final result of an initiating response: return it as-is
    /// for immediate success, otherwise poll its task to completion.
    pub fn resolve(&self, status: u16, body: Value) -> Result<Value> {
        match TaskReference::from_response(status, &body)? {
            None => {
                debug!(status, "Response is final, no task to poll");
                Ok(body)
            }
            Some(reference) => self.poll(&reference),
        }
    }

    /// Poll `reference` until it finishes, fails, or exhausts the budget.
    pub fn poll(&self, reference: &TaskReference) -> Result<Value> {
        self.session.config().logger.scope(|| self.poll_task(reference))
    }

    #[instrument(name = "poll", skip(self, reference), fields(url = %reference.url, signal = ?reference.signal))]
    fn poll_task(&self, reference: &TaskReference) -> Result<Value> {
        info!(state = %TaskState::Polling, "Waiting for task");

        let outcome = self.policy.run(&reference.url, |attempt| {
            let (body, status) = self
                .session
                .authenticated_request_with_status(&reference.url, RequestOptions::get())?;

            match evaluate(status, &body) {
                PollDecision::Finished => Ok(Step::Done(body)),
                PollDecision::Failed(message) => Err(SdkError::TaskFailed {
                    url: reference.url.clone(),
                    message,
                }),
                PollDecision::Pending => {
                    debug!(attempt, status, task_status = ?status_field(&body), "Task still running");
                    Ok(Step::Pending)
                }
            }
        });

        match outcome {
            Ok(Outcome::Completed(body)) => {
                info!(state = %TaskState::Finished, "Task complete");
                Ok(body)
            }
            Ok(Outcome::Exhausted { attempts, .. }) => {
                warn!(state = %TaskState::TimedOut, attempts, "Task did not complete in time");
                Err(SdkError::TaskTimeout {
                    url: reference.url.clone(),
                    attempts,
                })
            }
            Err(err) => {
                warn!(state = %TaskState::Failed, error = %err, "Task failed");
                Err(err)
            }
        }
    }
}
