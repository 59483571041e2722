//! Exponential backoff around a [`ChatTransport`].

use std::time::Duration;

use tracing::{debug, warn};

use super::{ChatTransport, CompletionRequest, GenerationParams};
use crate::config::Config;
use crate::error::CompletionError;
use crate::prompt::{probe_transcript, PromptMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, attempt counted from zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// The completion client the engine talks to.
///
/// Callers see a single outcome: retryable failures are absorbed here until
/// the budget runs out, then the last classification is returned.
pub struct CompletionClient<T> {
    transport: T,
    policy: RetryPolicy,
    params: GenerationParams,
}

impl<T: ChatTransport> CompletionClient<T> {
    pub fn new(transport: T, policy: RetryPolicy, params: GenerationParams) -> Self {
        Self {
            transport,
            policy,
            params,
        }
    }

    pub fn from_config(transport: T, config: &Config) -> Self {
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            ..RetryPolicy::default()
        };
        Self::new(transport, policy, GenerationParams::from_config(config))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn complete(
        &self,
        api_key: &str,
        messages: Vec<PromptMessage>,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            messages,
            params: self.params,
        };

        let mut attempt = 0;
        loop {
            debug!(attempt, "completion attempt");
            match self.transport.send(api_key, &request).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "completion failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "completion failed");
                    return Err(err);
                }
            }
        }
    }

    /// Single attempt with a throwaway prompt, used to validate a key.
    pub async fn probe(&self, api_key: &str) -> Result<(), CompletionError> {
        let request = CompletionRequest {
            messages: probe_transcript(),
            params: GenerationParams::probe(),
        };
        self.transport.send(api_key, &request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use tokio::time::Instant;

    fn client(transport: ScriptedTransport) -> CompletionClient<ScriptedTransport> {
        CompletionClient::new(
            transport,
            RetryPolicy::default(),
            GenerationParams::from_config(&Config::default()),
        )
    }

    #[test]
    fn delays_double_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn two_rate_limits_then_success_waits_twice() {
        let transport = ScriptedTransport::new(vec![
            Err(CompletionError::RateLimited("busy".into())),
            Err(CompletionError::RateLimited("busy".into())),
            Ok("You're doing great.".into()),
        ]);
        let client = client(transport);

        let start = Instant::now();
        let result = client.complete("sk-test", vec![PromptMessage::user("hi")]).await;

        assert_eq!(result, Ok("You're doing great.".to_string()));
        assert_eq!(client.transport().calls(), 3);
        // 1s + 2s of backoff, and nothing for a third wait.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_fails_without_waiting() {
        let transport = ScriptedTransport::always(Err(CompletionError::Unauthorized(
            "bad key".into(),
        )));
        let client = client(transport);

        let start = Instant::now();
        let result = client.complete("sk-bad", vec![PromptMessage::user("hi")]).await;

        assert_eq!(result, Err(CompletionError::Unauthorized("bad key".into())));
        assert_eq!(client.transport().calls(), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_exhaust_the_budget() {
        let transport = ScriptedTransport::always(Err(CompletionError::Network("down".into())));
        let client = client(transport);

        let start = Instant::now();
        let result = client.complete("sk-test", vec![PromptMessage::user("hi")]).await;

        assert_eq!(result, Err(CompletionError::Network("down".into())));
        assert_eq!(client.transport().calls(), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(8), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(CompletionError::ServerError {
                status: 500,
                message: "oops".into(),
            }),
            Ok("unreachable".into()),
        ]);
        let client = client(transport);

        let result = client.complete("sk-test", vec![PromptMessage::user("hi")]).await;
        assert!(matches!(result, Err(CompletionError::ServerError { status: 500, .. })));
        assert_eq!(client.transport().calls(), 1);
    }

    #[tokio::test]
    async fn probe_uses_small_budget_and_no_retries() {
        let transport = ScriptedTransport::always(Err(CompletionError::RateLimited("busy".into())));
        let client = client(transport);

        let result = client.probe("sk-test").await;
        assert!(matches!(result, Err(CompletionError::RateLimited(_))));
        assert_eq!(client.transport().calls(), 1);

        let requests = client.transport().requests();
        assert_eq!(requests[0].params.max_tokens, 10);
        assert_eq!(requests[0].messages[1].content, "Test connection");
    }
}
