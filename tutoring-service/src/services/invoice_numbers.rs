//! Business-facing invoice number generation.

use backoffice_core::error::AppError;
use chrono::Utc;
use rand::Rng;

use crate::services::store::BackofficeStore;

const MAX_RANDOM_ATTEMPTS: u32 = 100;
const MAX_INCREMENT_ATTEMPTS: u32 = 1000;

/// Generate an unused 5-digit invoice number.
///
/// Probes random numbers first; after [`MAX_RANDOM_ATTEMPTS`] collisions,
/// falls back to the trailing digits of the current timestamp and probes
/// upward from there.
pub async fn generate_unique<S: BackofficeStore>(store: &S) -> Result<String, AppError> {
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let number = format!("{:05}", rand::thread_rng().gen_range(0..100_000));
        if !store.invoice_number_exists(&number).await? {
            return Ok(number);
        }
    }

    let timestamp = Utc::now().timestamp_millis().to_string();
    let tail = timestamp.len().saturating_sub(5);
    let fallback = format!("{:0>5}", &timestamp[tail..]);
    if !store.invoice_number_exists(&fallback).await? {
        return Ok(fallback);
    }

    let base: u32 = fallback.parse().unwrap_or(0);
    for increment in 1..=MAX_INCREMENT_ATTEMPTS {
        let candidate = format!("{:05}", (base + increment) % 100_000);
        if !store.invoice_number_exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(AppError::Conflict(anyhow::anyhow!(
        "Unable to generate a unique invoice number"
    )))
}
