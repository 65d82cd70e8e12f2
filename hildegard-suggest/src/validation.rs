//! Submission validation
//!
//! New songs need an author and a motivation; existing songs need nothing
//! beyond what the wizard guards already ensure.

use hildegard_common::{SongReference, Suggestion};
use serde::Serialize;

/// Form field a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Author,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Fields that must be filled in for this kind of song
pub fn required_fields(is_new: bool) -> &'static [Field] {
    if is_new {
        &[Field::Author, Field::Notes]
    } else {
        &[]
    }
}

/// Itemized field errors; empty means the suggestion can be sent
pub fn validate(suggestion: &Suggestion) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let SongReference::New(song) = &suggestion.song {
        if song.author.trim().is_empty() {
            errors.push(FieldError::new(
                Field::Author,
                "Per favore, inserisci l'autore del nuovo canto.",
            ));
        }
        if suggestion.notes.trim().is_empty() {
            errors.push(FieldError::new(
                Field::Notes,
                "Per favore, inserisci una motivazione per il nuovo canto.",
            ));
        }
    }

    errors
}
