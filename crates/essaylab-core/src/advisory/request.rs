use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EditAdvisor, EditSuggestion, FeedbackContext};
use crate::error::{EssayError, Result};

/// Identifies one advisory request. Tokens increase monotonically; only
/// the most recently issued one is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Tracks which advisory request is current so late responses from
/// superseded requests can be discarded.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: u64,
    in_flight: bool,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any in flight.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        self.in_flight = true;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight && token.0 == self.latest
    }

    /// Mark `token`'s response as received. Returns false for stale tokens,
    /// which leave the tracker untouched.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            debug!(token = token.0, latest = self.latest, "stale advisory response");
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Forget the request in flight; its response will be treated as stale.
    pub fn invalidate(&mut self) {
        self.in_flight = false;
    }

    /// A request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

/// Run `future` with a deadline. Expiry becomes [`EssayError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!("advisory request exceeded {}s", limit.as_secs());
            Err(EssayError::Timeout {
                seconds: limit.as_secs(),
            })
        }
    }
}

/// The outcome of an advisory call, tagged with the request it answers.
#[derive(Debug)]
pub struct AdvisoryResponse {
    pub token: RequestToken,
    pub result: Result<Vec<EditSuggestion>>,
}

/// Ask for one edit answering a free-form request.
pub async fn request_suggestions(
    advisor: &dyn EditAdvisor,
    token: RequestToken,
    essay_text: &str,
    user_request: &str,
    timeout: Duration,
) -> AdvisoryResponse {
    let result = with_timeout(timeout, advisor.suggest_edit(essay_text, user_request))
        .await
        .map(|suggestion| vec![suggestion]);
    AdvisoryResponse { token, result }
}

/// Ask for a batch of edits driven by essay feedback.
pub async fn request_feedback_edits(
    advisor: &dyn EditAdvisor,
    token: RequestToken,
    essay_text: &str,
    feedback: &FeedbackContext,
    timeout: Duration,
) -> AdvisoryResponse {
    let result = with_timeout(timeout, advisor.suggest_edits(essay_text, feedback)).await;
    AdvisoryResponse { token, result }
}
