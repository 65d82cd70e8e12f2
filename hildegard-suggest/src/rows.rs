//! Spreadsheet row shaping
//!
//! Existing songs go to `existing_songs`:
//! `[timestamp, date, id, title, "NN%", notes]`
//!
//! New songs go to `new_songs`:
//! `[timestamp, date, title, author, text_link, audio_link, notes, "NN%", "Nuovo"]`

use chrono::NaiveDateTime;
use hildegard_common::time::{format_sheet_date, format_timestamp};
use hildegard_common::{SongReference, Suggestion};

pub const EXISTING_SONGS_TABLE: &str = "existing_songs";
pub const NEW_SONGS_TABLE: &str = "new_songs";

/// A row ready to append, with the table it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub table: &'static str,
    pub values: Vec<String>,
}

/// Shape `suggestion` into its destination row, stamped with `timestamp`
pub fn shape_row(suggestion: &Suggestion, timestamp: NaiveDateTime) -> SheetRow {
    let timestamp = format_timestamp(timestamp);
    let date = format_sheet_date(suggestion.liturgy_date);
    let adequacy = suggestion.adequacy.to_string();

    match &suggestion.song {
        SongReference::Existing { title, id } => SheetRow {
            table: EXISTING_SONGS_TABLE,
            values: vec![
                timestamp,
                date,
                id.clone().unwrap_or_default(),
                title.clone(),
                adequacy,
                suggestion.notes.clone(),
            ],
        },
        SongReference::New(song) => SheetRow {
            table: NEW_SONGS_TABLE,
            values: vec![
                timestamp,
                date,
                song.title.clone(),
                song.author.clone(),
                song.text_link.clone(),
                song.audio_link.clone(),
                suggestion.notes.clone(),
                adequacy,
                suggestion.song.kind_label().to_string(),
            ],
        },
    }
}
