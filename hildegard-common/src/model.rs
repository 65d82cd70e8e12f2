//! Suggestion domain types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// User-estimated fitness of a song for a liturgy, 0–100 in steps of 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Adequacy(u8);

impl Adequacy {
    pub const STEP: u8 = 5;
    pub const MAX: u8 = 100;

    pub fn new(percent: u8) -> Result<Self> {
        if percent > Self::MAX || percent % Self::STEP != 0 {
            return Err(Error::InvalidInput(format!(
                "adequacy must be a multiple of {} between 0 and {}, got {}",
                Self::STEP,
                Self::MAX,
                percent
            )));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl Default for Adequacy {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<u8> for Adequacy {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Adequacy> for u8 {
    fn from(value: Adequacy) -> Self {
        value.0
    }
}

/// Rendered as the spreadsheet cell value, e.g. `75%`
impl fmt::Display for Adequacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Details of a song not yet in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub author: String,
    pub text_link: String,
    pub audio_link: String,
}

/// The song a suggestion refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SongReference {
    /// A catalog song; `id` is absent when the catalog has none for it
    Existing { title: String, id: Option<String> },
    New(NewSong),
}

impl SongReference {
    pub fn title(&self) -> &str {
        match self {
            SongReference::Existing { title, .. } => title,
            SongReference::New(song) => &song.title,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, SongReference::New(_))
    }

    /// Label written to the sheet and shown in summaries
    pub fn kind_label(&self) -> &'static str {
        if self.is_new() {
            "Nuovo"
        } else {
            "Esistente"
        }
    }
}

/// One user-submitted recommendation of a song for a liturgy date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub liturgy_date: NaiveDate,
    pub song: SongReference,
    pub adequacy: Adequacy,
    pub notes: String,
}
