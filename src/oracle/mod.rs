//! Disambiguation fallback via an external completion oracle.
//!
//! When the ranker's best fused score lands below τ, the top candidates are
//! offered to an LLM in one bounded prompt. The oracle is advisory: a
//! timeout or provider failure degrades the result, it never fails the
//! query.

mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::OracleError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockOracle;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::constants::DEFAULT_ORACLE_MAX_TOKENS;

/// Degrade behavior when the oracle cannot produce a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Return the ranker's best candidate, confidence flagged low.
    BestAvailable,
    /// Report an explicit no-match.
    NoMatch,
}

/// Black-box completion boundary.
///
/// The core assumes nothing about the provider beyond "prompt in, text out";
/// answers are parsed leniently for a chosen identifier or "none".
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError>;
}

/// [`CompletionOracle`] backed by a `genai` chat client.
pub struct GenaiOracle {
    client: genai::Client,
    model: String,
}

impl GenaiOracle {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: genai::Client::default(),
            model: model.into(),
        }
    }
}

impl std::fmt::Debug for GenaiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiOracle")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionOracle for GenaiOracle {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let options = ChatOptions::default().with_max_tokens(max_tokens);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| OracleError::Provider {
                reason: e.to_string(),
            })?;

        response
            .first_text()
            .map(|t| t.to_string())
            .filter(|t| !t.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}

/// A candidate as presented to the oracle.
#[derive(Debug, Clone)]
pub struct OracleCandidate {
    pub record_id: u64,
    pub display_name: String,
}

/// What the oracle decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisambiguationOutcome {
    /// The oracle picked one of the offered candidates.
    Chosen(u64),
    /// The oracle explicitly declared no match.
    DeclaredNoMatch,
    /// Timeout, provider failure, or an unparseable answer.
    Unavailable,
}

/// Runs the single-call disambiguation protocol against an oracle.
pub struct Disambiguator {
    oracle: Arc<dyn CompletionOracle>,
    timeout: Duration,
    max_tokens: u32,
}

impl std::fmt::Debug for Disambiguator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disambiguator")
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl Disambiguator {
    pub fn new(oracle: Arc<dyn CompletionOracle>, timeout: Duration) -> Self {
        Self {
            oracle,
            timeout,
            max_tokens: DEFAULT_ORACLE_MAX_TOKENS,
        }
    }

    /// Asks the oracle to pick among `candidates` for `query`.
    ///
    /// Exactly one oracle call, wrapped in its own timeout (independent of
    /// the overall query budget). Any failure maps to
    /// [`DisambiguationOutcome::Unavailable`], never an error.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn disambiguate(
        &self,
        query: &str,
        candidates: &[OracleCandidate],
    ) -> DisambiguationOutcome {
        if candidates.is_empty() {
            return DisambiguationOutcome::DeclaredNoMatch;
        }

        let prompt = build_prompt(query, candidates);
        debug!(prompt_len = prompt.len(), "Calling disambiguation oracle");

        let completion =
            tokio::time::timeout(self.timeout, self.oracle.complete(&prompt, self.max_tokens))
                .await;

        match completion {
            Ok(Ok(answer)) => {
                let outcome = parse_answer(&answer, candidates);
                debug!(answer = %answer.trim(), ?outcome, "Oracle answered");
                outcome
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Oracle call failed, degrading");
                DisambiguationOutcome::Unavailable
            }
            Err(_) => {
                warn!(budget = ?self.timeout, "Oracle call timed out, degrading");
                DisambiguationOutcome::Unavailable
            }
        }
    }
}

/// One bounded prompt: the query plus a numbered candidate list.
fn build_prompt(query: &str, candidates: &[OracleCandidate]) -> String {
    use std::fmt::Write;

    let mut prompt = String::with_capacity(256);
    let _ = writeln!(
        prompt,
        "A user query must be matched to at most one canonical entity."
    );
    let _ = writeln!(prompt, "Query: {query:?}");
    let _ = writeln!(prompt, "Candidates:");
    for (pos, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", pos + 1, candidate.display_name);
    }
    let _ = write!(
        prompt,
        "Answer with the single number of the best match, or NONE if none of \
         the candidates is the queried entity."
    );
    prompt
}

/// Extracts a candidate choice or "none" from free-form oracle text.
fn parse_answer(answer: &str, candidates: &[OracleCandidate]) -> DisambiguationOutcome {
    let lowered = answer.to_lowercase();
    if lowered.contains("none") {
        return DisambiguationOutcome::DeclaredNoMatch;
    }

    // First integer in range wins; anything else is unusable.
    let mut digits = String::new();
    for c in answer.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }

    if let Ok(pos) = digits.parse::<usize>() {
        if (1..=candidates.len()).contains(&pos) {
            return DisambiguationOutcome::Chosen(candidates[pos - 1].record_id);
        }
    }

    DisambiguationOutcome::Unavailable
}
