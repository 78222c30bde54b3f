use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::error::OracleError;
use super::CompletionOracle;

#[derive(Debug, Clone)]
enum MockBehavior {
    Reply(String),
    Fail,
    Hang(Duration),
}

/// Scriptable oracle for tests: replies with a fixed answer, fails, or
/// hangs past any reasonable timeout. Counts calls so tests can assert the
/// one-call-per-disambiguation contract.
#[derive(Debug, Clone)]
pub struct MockOracle {
    behavior: MockBehavior,
    calls: Arc<AtomicU64>,
}

impl MockOracle {
    pub fn replying(answer: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Reply(answer.into()),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Fail,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn hanging(duration: Duration) -> Self {
        Self {
            behavior: MockBehavior::Hang(duration),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CompletionOracle for MockOracle {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        match &self.behavior {
            MockBehavior::Reply(answer) => Ok(answer.clone()),
            MockBehavior::Fail => Err(OracleError::Provider {
                reason: "mock oracle configured to fail".to_string(),
            }),
            MockBehavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Err(OracleError::Provider {
                    reason: "mock oracle woke up after hang".to_string(),
                })
            }
        }
    }
}
