use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiError, ScoringClient};
use crate::risk::{
    aggregate, count_unrecognized, validate_profile, CustomerRiskRecord, ManualInputProfile,
    RiskCountsSummary, RiskLevel, ScoringSession, SessionSource,
};
use crate::session::{SessionStore, Submission, SubmissionGate, Updated};

pub const UPLOAD_REJECTED: &str = "Please upload an Excel file (.xlsx or .xls)";

const EXCEL_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("{0}")]
    InvalidUpload(String),

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No results available. Score a file first.")]
    NoSession,

    #[error("Customer {0} is not in the stored results")]
    NotInSession(String),

    #[error("Failed to store results: {0:#}")]
    Store(anyhow::Error),
}

/// What became of a submission once its response arrived
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The response was current and has been applied
    Applied(T),
    /// The caller moved on while the request was in flight; nothing was stored
    Stale,
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Stale => None,
        }
    }
}

/// Reject anything that is not an existing Excel workbook before uploading it
pub fn check_upload(path: &Path) -> Result<(), WorkflowError> {
    let is_excel = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            EXCEL_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    if !is_excel {
        return Err(WorkflowError::InvalidUpload(UPLOAD_REJECTED.to_string()));
    }
    if !path.is_file() {
        return Err(WorkflowError::InvalidUpload(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(())
}

fn begin(gate: &Arc<SubmissionGate>) -> Result<Submission, WorkflowError> {
    gate.try_begin().ok_or(WorkflowError::Busy)
}

/// Log when the service's counts disagree with the records it sent
fn reconcile_counts(reported: &RiskCountsSummary, customers: &[CustomerRiskRecord]) {
    let computed = aggregate(customers);
    for level in &RiskLevel::KNOWN {
        let (service, local) = (reported.count(level), computed.count(level));
        if service != local {
            tracing::warn!(
                level = %level,
                service,
                local,
                "service risk counts disagree with returned records"
            );
        }
    }
    let unrecognized = count_unrecognized(customers);
    if unrecognized > 0 {
        tracing::warn!(records = unrecognized, "records with unrecognized risk level");
    }
}

/// Upload a workbook, and store the scored cohort as the live session.
pub async fn score_batch(
    client: &ScoringClient,
    store: &dyn SessionStore,
    gate: &Arc<SubmissionGate>,
    path: &Path,
) -> Result<Outcome<ScoringSession>, WorkflowError> {
    let submission = begin(gate)?;
    check_upload(path)?;

    let response = client.score_file(path).await?;
    if !submission.is_current() {
        tracing::info!("discarding batch result for an abandoned upload");
        return Ok(Outcome::Stale);
    }

    reconcile_counts(&response.risk_counts, &response.customers);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let session = ScoringSession::new(
        SessionSource::Batch { file_name },
        response.customers,
        response.risk_counts,
    );
    store.save(&session).map_err(WorkflowError::Store)?;

    tracing::info!(records = session.len(), "batch scored");
    Ok(Outcome::Applied(session))
}

/// Validate and score one hand-entered profile.
///
/// With `save`, the result replaces the live session as a one-record session.
pub async fn score_manual(
    client: &ScoringClient,
    store: &dyn SessionStore,
    gate: &Arc<SubmissionGate>,
    profile: &ManualInputProfile,
    save: bool,
) -> Result<Outcome<CustomerRiskRecord>, WorkflowError> {
    let submission = begin(gate)?;

    let errors = validate_profile(profile);
    if !errors.is_empty() {
        return Err(WorkflowError::Validation(errors));
    }

    let response = client.score_manual(profile).await?;
    if !submission.is_current() {
        tracing::info!("discarding manual result for an abandoned form");
        return Ok(Outcome::Stale);
    }

    if save {
        let session = ScoringSession::new(
            SessionSource::Manual,
            vec![response.customer.clone()],
            response.risk_counts,
        );
        store.save(&session).map_err(WorkflowError::Store)?;
    }

    Ok(Outcome::Applied(response.customer))
}

/// Re-fetch one customer from the service and swap it into the stored session.
pub async fn refresh_customer(
    client: &ScoringClient,
    store: &dyn SessionStore,
    gate: &Arc<SubmissionGate>,
    customer_id: &str,
) -> Result<Outcome<CustomerRiskRecord>, WorkflowError> {
    let submission = begin(gate)?;

    let session = store.load().ok_or(WorkflowError::NoSession)?;
    if session.find(customer_id).is_none() {
        return Err(WorkflowError::NotInSession(customer_id.to_string()));
    }

    let fresh = client.fetch_customer(customer_id).await?;
    if !submission.is_current() {
        return Ok(Outcome::Stale);
    }

    // Swap under the store lock so a session saved while we waited is kept
    let mut found = false;
    let updated = store
        .update(&mut |session| {
            let Some(slot) = session
                .customers
                .iter_mut()
                .find(|record| record.customer_id == customer_id)
            else {
                return false;
            };
            *slot = fresh.clone();
            session.risk_counts = aggregate(&session.customers);
            found = true;
            true
        })
        .map_err(WorkflowError::Store)?;

    match updated {
        Updated::NoSession => return Err(WorkflowError::NoSession),
        Updated::Unchanged if !found => {
            return Err(WorkflowError::NotInSession(customer_id.to_string()))
        }
        Updated::Unchanged | Updated::Saved => {}
    }

    Ok(Outcome::Applied(fresh))
}
