use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    /// The endpoint answered, but with an error status or a fault body
    Fault,
    /// No usable answer: connection failure, timeout, unreadable body
    TransportError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Fault => "fault",
            Outcome::TransportError => "transport_error",
        }
    }
}

/// The outcome of one ping or one IndexNow submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// Ping service or search engine name
    pub target: String,
    /// The URL that was announced
    pub subject: String,
    pub http_status: Option<u16>,
    pub outcome: Outcome,
    pub detail: String,
}

pub type PingResult = BroadcastResult;
pub type SubmitResult = BroadcastResult;

/// Called with every result as soon as it is known.
pub type ResultCallback = Arc<dyn Fn(&BroadcastResult) + Send + Sync>;

impl BroadcastResult {
    pub fn success(target: &str, subject: &str, http_status: u16) -> Self {
        Self {
            target: target.to_string(),
            subject: subject.to_string(),
            http_status: Some(http_status),
            outcome: Outcome::Success,
            detail: String::new(),
        }
    }

    pub fn fault(target: &str, subject: &str, http_status: u16, detail: String) -> Self {
        Self {
            target: target.to_string(),
            subject: subject.to_string(),
            http_status: Some(http_status),
            outcome: Outcome::Fault,
            detail,
        }
    }

    pub fn transport_error(target: &str, subject: &str, error: String) -> Self {
        Self {
            target: target.to_string(),
            subject: subject.to_string(),
            http_status: None,
            outcome: Outcome::TransportError,
            detail: error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Counts of each outcome over a batch of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub success: usize,
    pub fault: usize,
    pub transport_error: usize,
}

impl Tally {
    pub fn of(results: &[BroadcastResult]) -> Self {
        results.iter().fold(Self::default(), |mut tally, r| {
            match r.outcome {
                Outcome::Success => tally.success += 1,
                Outcome::Fault => tally.fault += 1,
                Outcome::TransportError => tally.transport_error += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.success + self.fault + self.transport_error
    }

    pub fn failed(&self) -> usize {
        self.fault + self.transport_error
    }
}
