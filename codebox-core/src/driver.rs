//! Run lifecycle against the stateful remote API
//!
//! One call to [`RunDriver::drive`] appends the prompt to the session's
//! thread, runs it and classifies the terminal status:
//!
//! - `completed` ends the loop
//! - `failed` is retried on a fresh thread after a fixed backoff, until the
//!   retry budget is spent
//! - anything else is a contract violation and fails immediately

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::assistants::{AssistantsBackend, RunStatus};
use crate::error::{Error, Result};

/// Retry behaviour for failed runs
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (`2` means up to three attempts)
    pub max_retries: u32,
    /// Wait between a failed attempt and the next one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(3),
        }
    }
}

/// Remote identity of a stateful client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Assistant id, fixed for the lifetime of the client
    pub assistant_id: String,
    /// Thread id, replaced whenever a failed run is retried
    pub thread_id: String,
}

/// Outcome of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAttempt {
    /// Zero-based attempt index
    pub attempt_index: u32,
    /// Terminal status reported by the remote side
    pub status: RunStatus,
    /// Error detail reported with the status
    pub error_detail: Option<String>,
}

/// Drives runs for one session
pub struct RunDriver<'a, B: AssistantsBackend + ?Sized> {
    backend: &'a B,
    policy: &'a RetryPolicy,
    instructions: &'a str,
}

impl<'a, B: AssistantsBackend + ?Sized> RunDriver<'a, B> {
    /// Create a driver over `backend`
    pub fn new(backend: &'a B, policy: &'a RetryPolicy, instructions: &'a str) -> Self {
        Self {
            backend,
            policy,
            instructions,
        }
    }

    /// Run `prompt` until it completes, returning the completed attempt.
    ///
    /// On success `session.thread_id` names the thread holding the result.
    pub async fn drive(&self, session: &mut Session, prompt: &str) -> Result<RunAttempt> {
        let mut attempt_index = 0;
        loop {
            let attempt = self.attempt(session, prompt, attempt_index).await?;
            match attempt.status {
                RunStatus::Completed => {
                    debug!(attempt = attempt_index + 1, "Run completed");
                    return Ok(attempt);
                }
                RunStatus::Failed => {
                    warn!(
                        attempt = attempt_index + 1,
                        max_attempts = self.policy.max_retries + 1,
                        error = attempt.error_detail.as_deref().unwrap_or("none"),
                        "Run failed"
                    );
                    if attempt_index >= self.policy.max_retries {
                        return Err(Error::RunFailed {
                            attempts: attempt_index + 1,
                            detail: attempt.error_detail,
                        });
                    }
                    tokio::time::sleep(self.policy.backoff).await;
                    session.thread_id = self.backend.create_thread().await?;
                    info!(thread_id = %session.thread_id, "Retrying run on a new thread");
                    attempt_index += 1;
                }
                status => {
                    return Err(Error::UnexpectedRunStatus {
                        status: status.to_string(),
                        detail: attempt.error_detail,
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        session: &Session,
        prompt: &str,
        attempt_index: u32,
    ) -> Result<RunAttempt> {
        self.backend
            .create_message(&session.thread_id, prompt)
            .await?;
        let run = self
            .backend
            .create_and_poll_run(&session.thread_id, &session.assistant_id, self.instructions)
            .await?;
        debug!(run_id = %run.id, status = %run.status, "Run reached terminal status");

        Ok(RunAttempt {
            attempt_index,
            status: run.status,
            error_detail: run.last_error.map(|e| e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAssistants;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    fn session() -> Session {
        Session {
            assistant_id: "asst_1".to_string(),
            thread_id: "thread_0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_completes_first_try() {
        let backend = MockAssistants::new();
        backend.push_run(RunStatus::Completed, None);
        let policy = policy(2);
        let driver = RunDriver::new(&backend, &policy, "run it");

        let mut session = session();
        let attempt = driver.drive(&mut session, "print(1)").await.unwrap();

        assert_eq!(attempt.attempt_index, 0);
        assert_eq!(attempt.status, RunStatus::Completed);
        assert_eq!(session.thread_id, "thread_0");
        let calls = backend.calls();
        assert_eq!(calls.messages, 1);
        assert_eq!(calls.runs, 1);
        assert_eq!(calls.threads, 0);
    }

    #[tokio::test]
    async fn test_always_failing_exhausts_retries() {
        let backend = MockAssistants::new();
        for _ in 0..5 {
            backend.push_run(RunStatus::Failed, Some("server_error"));
        }
        let policy = policy(2);
        let driver = RunDriver::new(&backend, &policy, "run it");

        let mut session = session();
        let err = driver.drive(&mut session, "print(1)").await.unwrap_err();

        match err {
            Error::RunFailed { attempts, detail } => {
                assert_eq!(attempts, 3);
                assert_eq!(detail.as_deref(), Some("server_error"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let calls = backend.calls();
        assert_eq!(calls.messages, 3);
        assert_eq!(calls.runs, 3);
        // A new thread before each retry, none after the last failure
        assert_eq!(calls.threads, 2);
        assert_ne!(session.thread_id, "thread_0");
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let backend = MockAssistants::new();
        backend.push_run(RunStatus::Failed, None);
        backend.push_run(RunStatus::Completed, None);
        let policy = policy(0);
        let driver = RunDriver::new(&backend, &policy, "run it");

        let mut session = session();
        let err = driver.drive(&mut session, "print(1)").await.unwrap_err();

        assert!(matches!(err, Error::RunFailed { attempts: 1, .. }));
        let calls = backend.calls();
        assert_eq!(calls.messages, 1);
        assert_eq!(calls.runs, 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failure_on_new_thread() {
        let backend = MockAssistants::new();
        backend.push_run(RunStatus::Failed, Some("rate_limit_exceeded"));
        backend.push_run(RunStatus::Completed, None);
        let policy = policy(2);
        let driver = RunDriver::new(&backend, &policy, "run it");

        let mut session = session();
        let attempt = driver.drive(&mut session, "print(1)").await.unwrap();

        assert_eq!(attempt.attempt_index, 1);
        assert_eq!(session.assistant_id, "asst_1");
        assert_ne!(session.thread_id, "thread_0");
        // The retried message went to the new thread
        assert_eq!(backend.messages_in(&session.thread_id).len(), 1);
        assert_eq!(backend.messages_in("thread_0").len(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_status_is_not_retried() {
        let backend = MockAssistants::new();
        backend.push_run(RunStatus::Expired, None);
        backend.push_run(RunStatus::Completed, None);
        let policy = policy(5);
        let driver = RunDriver::new(&backend, &policy, "run it");

        let mut session = session();
        let err = driver.drive(&mut session, "print(1)").await.unwrap_err();

        match err {
            Error::UnexpectedRunStatus { status, .. } => assert_eq!(status, "expired"),
            other => panic!("unexpected error: {other}"),
        }
        let calls = backend.calls();
        assert_eq!(calls.runs, 1);
        assert_eq!(calls.threads, 0);
    }
}
