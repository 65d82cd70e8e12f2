//! Submission pipeline: assemble, validate, then write one row
//!
//! Every failure leaves the wizard where it was; callers only advance to
//! `Submitted` on `Ok`.

use chrono::NaiveDateTime;
use hildegard_common::{time, Catalog, Suggestion};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::rows::shape_row;
use crate::store::{Destination, SheetStore, StoreError};
use crate::validation::{validate, FieldError};
use crate::wizard::{WizardError, WizardState};

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Si è verificato un errore durante l'invio del suggerimento. Riprova tra qualche istante.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("wizard not ready: {0}")]
    NotReady(#[from] WizardError),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("destination unavailable: {0}")]
    DestinationUnavailable(String),

    #[error("table '{table}' unavailable: {cause}")]
    TableUnavailable { table: String, cause: String },

    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl SubmitError {
    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::NotReady(e) => e.to_string(),
            SubmitError::Validation(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            SubmitError::DestinationUnavailable(reason) => reason.clone(),
            SubmitError::TableUnavailable { cause, .. } => {
                format!("Errore nella creazione dei fogli di lavoro: {}", cause)
            }
            SubmitError::WriteFailed(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Field errors, when that is what went wrong
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            SubmitError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Validate the wizard's suggestion and send it to `destination`
pub async fn submit(
    wizard: &WizardState,
    catalog: &Catalog,
    destination: &Destination,
) -> Result<Suggestion, SubmitError> {
    let suggestion = wizard.suggestion(catalog)?;

    let errors = validate(&suggestion);
    if !errors.is_empty() {
        return Err(SubmitError::Validation(errors));
    }

    let store = match destination {
        Destination::Ready(store) => store,
        Destination::Unavailable { reason } => {
            warn!("Submission refused, no destination: {}", reason);
            return Err(SubmitError::DestinationUnavailable(reason.clone()));
        }
    };

    write_suggestion(store.as_ref(), &suggestion, time::now_local()).await?;
    Ok(suggestion)
}

/// Append `suggestion` as one row, creating its table if needed
pub async fn write_suggestion(
    store: &dyn SheetStore,
    suggestion: &Suggestion,
    timestamp: NaiveDateTime,
) -> Result<(), SubmitError> {
    let row = shape_row(suggestion, timestamp);

    let table = store.ensure_table(row.table).await.map_err(|e| {
        error!(table = row.table, "Table unavailable: {}", e);
        match e {
            StoreError::TableCreation { table, cause } => {
                SubmitError::TableUnavailable { table, cause }
            }
            other => SubmitError::WriteFailed(other.to_string()),
        }
    })?;

    store.append_row(&table, &row.values).await.map_err(|e| {
        error!(table = row.table, "Row append failed: {}", e);
        SubmitError::WriteFailed(e.to_string())
    })?;

    info!(
        table = row.table,
        title = %suggestion.song.title(),
        date = %suggestion.liturgy_date,
        "Suggestion recorded"
    );
    Ok(())
}
