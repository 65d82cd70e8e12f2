//! Song catalog
//!
//! Read-only reference table of known songs, parsed from the CSV registry
//! (`titolo`, `id_canti`, `autore`, `url`, `link_youtube`). Only `titolo` is
//! required; the other columns may be absent entirely or left blank per row.

use std::collections::HashSet;
use std::io::Read;

use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

const TITLE_COLUMN: &str = "titolo";
const ID_COLUMN: &str = "id_canti";
const AUTHOR_COLUMN: &str = "autore";
const TEXT_LINK_COLUMN: &str = "url";
const AUDIO_LINK_COLUMN: &str = "link_youtube";

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    pub title: String,
    pub id: Option<String>,
    pub author: Option<String>,
    pub text_link: Option<String>,
    pub audio_link: Option<String>,
}

/// Known songs, loaded once per cache period and never mutated
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    /// Unique titles in first-occurrence order
    titles: Vec<String>,
    has_id_column: bool,
}

impl Catalog {
    /// Catalog with no songs, used when every source failed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from already-parsed rows
    pub fn from_songs(songs: Vec<Song>, has_id_column: bool) -> Self {
        let mut seen = HashSet::new();
        let titles = songs
            .iter()
            .filter(|song| seen.insert(song.title.as_str()))
            .map(|song| song.title.clone())
            .collect();

        Self {
            songs,
            titles,
            has_id_column,
        }
    }

    /// Parse a comma-separated catalog with a header row
    ///
    /// Rows with a blank title are skipped. Blank cells in optional columns
    /// are treated as missing values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let title_idx = position(TITLE_COLUMN).ok_or_else(|| {
            Error::InvalidInput(format!("catalog has no '{}' column", TITLE_COLUMN))
        })?;
        let id_idx = position(ID_COLUMN);
        let author_idx = position(AUTHOR_COLUMN);
        let text_idx = position(TEXT_LINK_COLUMN);
        let audio_idx = position(AUDIO_LINK_COLUMN);

        let mut songs = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };

            let Some(title) = cell(Some(title_idx)) else {
                continue;
            };

            songs.push(Song {
                title,
                id: cell(id_idx),
                author: cell(author_idx),
                text_link: cell(text_idx),
                audio_link: cell(audio_idx),
            });
        }

        debug!(songs = songs.len(), has_id_column = id_idx.is_some(), "Parsed song catalog");
        Ok(Self::from_songs(songs, id_idx.is_some()))
    }

    /// Unique titles in catalog order, the candidate set for matching
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn has_id_column(&self) -> bool {
        self.has_id_column
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// First song whose title matches exactly
    pub fn find(&self, title: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.title == title)
    }

    /// Catalog id for `title`, if the catalog carries ids and this row has one
    ///
    /// Duplicate titles resolve to the first row.
    pub fn id_for(&self, title: &str) -> Option<&str> {
        if !self.has_id_column {
            return None;
        }
        self.find(title).and_then(|song| song.id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id_canti,titolo,autore,url,link_youtube
1,Resta Con Noi,Gen Rosso,https://example.org/resta,
2,Alleluia Passeranno,,,https://youtu.be/x
,Senza Id,,,
3,Resta Con Noi,Altro,,
";

    #[test]
    fn test_parse_full_catalog() {
        let catalog = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 4);
        assert!(catalog.has_id_column());
        assert_eq!(
            catalog.titles(),
            &["Resta Con Noi", "Alleluia Passeranno", "Senza Id"]
        );

        let song = catalog.find("Alleluia Passeranno").unwrap();
        assert_eq!(song.id.as_deref(), Some("2"));
        assert_eq!(song.author, None);
        assert_eq!(song.audio_link.as_deref(), Some("https://youtu.be/x"));
    }

    #[test]
    fn test_id_lookup_first_match_wins() {
        let catalog = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.id_for("Resta Con Noi"), Some("1"));
    }

    #[test]
    fn test_id_lookup_missing_value() {
        let catalog = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.id_for("Senza Id"), None);
        assert_eq!(catalog.id_for("Non Esiste"), None);
    }

    #[test]
    fn test_catalog_without_id_column() {
        let csv = "titolo,autore\nTe Lodiamo Trinità,Anonimo\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();

        assert!(!catalog.has_id_column());
        assert!(catalog.find("Te Lodiamo Trinità").is_some());
        assert_eq!(catalog.id_for("Te Lodiamo Trinità"), None);
    }

    #[test]
    fn test_blank_titles_skipped() {
        let csv = "titolo\n\n   \nAve Maria\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.titles(), &["Ave Maria"]);
    }

    #[test]
    fn test_missing_title_column_rejected() {
        let csv = "name,author\nx,y\n";
        let err = Catalog::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.titles().is_empty());
        assert!(!catalog.has_id_column());
    }
}
