use std::time;

use thiserror::Error;

/// Why a single webhook delivery did not go through.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("the notification could not be delivered but may be retried later: {error}")]
    Retryable {
        error: reqwest::Error,
        retry_after: Option<time::Duration>,
    },
    #[error("the notification was rejected and will not be retried: {0}")]
    Rejected(reqwest::Error),
    #[error("delivery attempts exhausted after {attempts} tries: {error}")]
    AttemptsExhausted { attempts: u32, error: reqwest::Error },
}
