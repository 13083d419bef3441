//! Retry policy executor

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::RetryConfig;
use crate::domain::error::{ApiError, ErrorClass};

/// Decides whether a failure may be retried
pub type ErrorClassifier = fn(&ApiError) -> ErrorClass;

/// Callback notified of every attempt and every backoff delay
pub type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Observable step of a retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// An attempt is about to be made (1-indexed)
    Attempt { attempt: u32, max_attempts: u32 },
    /// The given attempt failed and the loop will sleep for `delay`
    Backoff { attempt: u32, delay: Duration },
}

/// Runs a remote call until it succeeds, fails with a non-retryable error,
/// or exhausts its attempt budget.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    classifier: ErrorClassifier,
    observer: Option<RetryObserver>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            classifier: ApiError::class,
            observer: None,
        }
    }

    /// Replaces the default status-based classification
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&RetryEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes `operation` with the configured attempt budget
    pub async fn execute<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.execute_with(label, self.config.max_attempts, operation)
            .await
    }

    /// Executes `operation` with an explicit attempt budget.
    ///
    /// Auth and client errors are returned after the first failure. Transient
    /// errors are retried; after the last attempt the last error is returned.
    pub async fn execute_with<T, F, Fut>(
        &self,
        label: &str,
        max_attempts: u32,
        mut operation: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(operation = label, attempt, max_attempts, "Attempting remote call");
            self.notify(RetryEvent::Attempt {
                attempt,
                max_attempts,
            });

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match (self.classifier)(&error) {
                ErrorClass::Auth | ErrorClass::Client => {
                    warn!(operation = label, attempt, error = %error, "Non-retryable failure");
                    return Err(error);
                }
                ErrorClass::Transient => {}
            }

            if attempt >= max_attempts {
                warn!(
                    operation = label,
                    attempts = attempt,
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }

            let delay = self.config.delay_for_attempt(attempt);
            warn!(
                operation = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Remote call failed, retrying"
            );
            self.notify(RetryEvent::Backoff { attempt, delay });

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn notify(&self, event: RetryEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn recording_policy(config: RetryConfig) -> (RetryPolicy, Arc<Mutex<Vec<RetryEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let policy = RetryPolicy::new(config)
            .with_observer(move |event| sink.lock().unwrap().push(event.clone()));

        (policy, events)
    }

    fn backoffs(events: &Mutex<Vec<RetryEvent>>) -> Vec<Duration> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                RetryEvent::Backoff { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let (policy, events) = recording_policy(RetryConfig::default());
        let calls = AtomicU32::new(0);

        let result = policy
            .execute("ok", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(7) }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(backoffs(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let (policy, events) = recording_policy(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = policy
            .execute("flaky", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Err(ApiError::status(503, "unavailable"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(backoffs(&events), vec![Duration::from_millis(1000)]);
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_not_retried() {
        let (policy, events) = recording_policy(RetryConfig::default());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute("auth", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::status(401, "unauthorized")) }
            })
            .await;

        assert_eq!(result, Err(ApiError::status(401, "unauthorized")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(backoffs(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_failure_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute("missing", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::status(404, "not found")) }
            })
            .await;

        assert_eq!(result.unwrap_err().status_code(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_is_not_retried() {
        let (policy, events) = recording_policy(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), _> = policy
            .execute("sign-in page", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::decode("expected value at line 1 column 1")) }
            })
            .await;

        assert!(matches!(result, Err(ApiError::Decode { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(backoffs(&events).is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let config = RetryConfig::new(5).with_max_delay(5000);
        let (policy, events) = recording_policy(config);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute("down", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(ApiError::network(format!("failure {}", n))) }
            })
            .await;

        assert_eq!(result, Err(ApiError::network("failure 5")));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            backoffs(&events),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
                Duration::from_millis(5000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute_with("slow", 2, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::timeout("connection aborted")) }
            })
            .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_events_are_reported() {
        let (policy, events) = recording_policy(RetryConfig::new(2));

        let _: Result<(), _> = policy
            .execute("down", || async { Err(ApiError::status(500, "boom")) })
            .await;

        let events = events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                RetryEvent::Attempt {
                    attempt: 1,
                    max_attempts: 2
                },
                RetryEvent::Backoff {
                    attempt: 1,
                    delay: Duration::from_millis(1000)
                },
                RetryEvent::Attempt {
                    attempt: 2,
                    max_attempts: 2
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_classifier() {
        fn never_retry(_: &ApiError) -> ErrorClass {
            ErrorClass::Client
        }

        let policy = RetryPolicy::default().with_classifier(never_retry);
        let calls = AtomicU32::new(0);

        let _: Result<(), _> = policy
            .execute("custom", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::status(500, "boom")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
