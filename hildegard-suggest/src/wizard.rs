//! Suggestion wizard state machine
//!
//! Four linear steps plus an absorbing `Submitted` state:
//!
//! ```text
//! DateSelect(1) -> SongSearch(2) -> SongPick(3) -> DetailsSubmit(4) -> Submitted
//!      ^________________________________________________________________|
//!                              new_suggestion
//! ```
//!
//! Forward moves are guarded (date chosen, search term typed, song selected);
//! a failed guard leaves the state untouched. Backward moves are always
//! allowed from steps 2–4 and clear nothing, so earlier answers survive a
//! round trip. Nothing here performs I/O; matching and submission are driven
//! by the flow controller.

use chrono::NaiveDate;
use hildegard_common::{Adequacy, Catalog, NewSong, SongReference, Suggestion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::ScoredTitle;

/// Wizard position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DateSelect,
    SongSearch,
    SongPick,
    DetailsSubmit,
    Submitted,
}

impl Step {
    /// 1-based step number; `Submitted` stays on 4
    pub fn number(self) -> u8 {
        match self {
            Step::DateSelect => 1,
            Step::SongSearch => 2,
            Step::SongPick => 3,
            Step::DetailsSubmit | Step::Submitted => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::DateSelect => "Data della liturgia",
            Step::SongSearch => "Cerca canto",
            Step::SongPick => "Seleziona canto",
            Step::DetailsSubmit | Step::Submitted => "Completa e invia",
        }
    }

    /// Progress bar fraction, 0.0 on step 1 to 1.0 on step 4
    pub fn progress(self) -> f32 {
        f32::from(self.number() - 1) / 3.0
    }
}

/// Song chosen on the pick step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// A catalog title from the candidate list
    Existing { title: String },
    /// The "add as new song" option, bound to the search term
    New { title: String },
}

impl Selection {
    pub fn title(&self) -> &str {
        match self {
            Selection::Existing { title } | Selection::New { title } => title,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Selection::New { .. })
    }
}

/// Extra fields only asked for new songs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewSongDraft {
    pub author: String,
    pub text_link: String,
    pub audio_link: String,
}

/// Partial update of the step-4 form; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetailsUpdate {
    pub author: Option<String>,
    pub text_link: Option<String>,
    pub audio_link: Option<String>,
    pub adequacy: Option<Adequacy>,
    pub notes: Option<String>,
}

/// What the user sent, kept for the confirmation screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedSummary {
    pub liturgy_date: NaiveDate,
    pub title: String,
    pub kind: &'static str,
    pub adequacy: Adequacy,
    pub notes: String,
}

impl From<&Suggestion> for SubmittedSummary {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            liturgy_date: suggestion.liturgy_date,
            title: suggestion.song.title().to_string(),
            kind: suggestion.song.kind_label(),
            adequacy: suggestion.adequacy,
            notes: suggestion.notes.clone(),
        }
    }
}

/// Refused wizard operations; the state is unchanged when one is returned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Seleziona la data della liturgia per continuare.")]
    MissingDate,

    #[error("Inserisci il titolo del canto per continuare.")]
    EmptySearchTerm,

    #[error("Seleziona un canto esistente o aggiungi un nuovo canto per continuare.")]
    NoSelection,

    #[error("Il canto \"{0}\" non è tra quelli proposti.")]
    UnknownCandidate(String),

    #[error("Operazione non disponibile in questo passo ({step:?}): {operation}.")]
    WrongStep { operation: &'static str, step: Step },

    #[error("Il suggerimento è già stato inviato.")]
    AlreadySubmitted,
}

/// One user's in-progress suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    step: Step,
    liturgy_date: Option<NaiveDate>,
    search_term: String,
    selection: Option<Selection>,
    new_song: NewSongDraft,
    adequacy: Adequacy,
    notes: String,
    candidates: Vec<ScoredTitle>,
    submitted: Option<SubmittedSummary>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: Step::DateSelect,
            liturgy_date: None,
            search_term: String::new(),
            selection: None,
            new_song: NewSongDraft::default(),
            adequacy: Adequacy::default(),
            notes: String::new(),
            candidates: Vec::new(),
            submitted: None,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn liturgy_date(&self) -> Option<NaiveDate> {
        self.liturgy_date
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn new_song(&self) -> &NewSongDraft {
        &self.new_song
    }

    pub fn adequacy(&self) -> Adequacy {
        self.adequacy
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Catalog candidates computed when the pick step was entered
    pub fn candidates(&self) -> &[ScoredTitle] {
        &self.candidates
    }

    pub fn submitted(&self) -> Option<&SubmittedSummary> {
        self.submitted.as_ref()
    }

    fn require_step(&self, expected: Step, operation: &'static str) -> Result<(), WizardError> {
        if self.step == Step::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.step != expected {
            return Err(WizardError::WrongStep {
                operation,
                step: self.step,
            });
        }
        Ok(())
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        self.require_step(Step::DateSelect, "set_date")?;
        self.liturgy_date = Some(date);
        Ok(())
    }

    /// Changing the term drops a selection made for the previous term
    pub fn set_search_term(&mut self, term: &str) -> Result<(), WizardError> {
        self.require_step(Step::SongSearch, "set_search_term")?;
        if term != self.search_term {
            self.search_term = term.to_string();
            self.selection = None;
            self.candidates.clear();
        }
        Ok(())
    }

    /// Replace the pick-step candidate list
    pub fn set_candidates(&mut self, candidates: Vec<ScoredTitle>) {
        self.candidates = candidates;
    }

    pub fn select_existing(&mut self, title: &str) -> Result<(), WizardError> {
        self.require_step(Step::SongPick, "select_existing")?;
        if !self.candidates.iter().any(|c| c.title == title) {
            return Err(WizardError::UnknownCandidate(title.to_string()));
        }
        self.selection = Some(Selection::Existing {
            title: title.to_string(),
        });
        Ok(())
    }

    /// Choose the synthetic "add as new song" option
    pub fn declare_new(&mut self) -> Result<(), WizardError> {
        self.require_step(Step::SongPick, "declare_new")?;
        let title = self.search_term.trim();
        if title.is_empty() {
            return Err(WizardError::EmptySearchTerm);
        }
        self.selection = Some(Selection::New {
            title: title.to_string(),
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), WizardError> {
        self.require_step(Step::SongPick, "clear_selection")?;
        self.selection = None;
        Ok(())
    }

    pub fn update_details(&mut self, update: DetailsUpdate) -> Result<(), WizardError> {
        self.require_step(Step::DetailsSubmit, "update_details")?;
        if let Some(author) = update.author {
            self.new_song.author = author;
        }
        if let Some(text_link) = update.text_link {
            self.new_song.text_link = text_link;
        }
        if let Some(audio_link) = update.audio_link {
            self.new_song.audio_link = audio_link;
        }
        if let Some(adequacy) = update.adequacy {
            self.adequacy = adequacy;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        Ok(())
    }

    /// Guarded forward transition; returns the new step
    pub fn next(&mut self) -> Result<Step, WizardError> {
        let target = match self.step {
            Step::DateSelect if self.liturgy_date.is_none() => return Err(WizardError::MissingDate),
            Step::DateSelect => Step::SongSearch,
            Step::SongSearch if self.search_term.trim().is_empty() => {
                return Err(WizardError::EmptySearchTerm)
            }
            Step::SongSearch => Step::SongPick,
            Step::SongPick if self.selection.is_none() => return Err(WizardError::NoSelection),
            Step::SongPick => Step::DetailsSubmit,
            Step::DetailsSubmit => {
                return Err(WizardError::WrongStep {
                    operation: "next",
                    step: self.step,
                })
            }
            Step::Submitted => return Err(WizardError::AlreadySubmitted),
        };
        self.step = target;
        Ok(target)
    }

    /// Step back one screen, keeping every answer
    pub fn back(&mut self) -> Result<Step, WizardError> {
        let target = match self.step {
            Step::DateSelect => {
                return Err(WizardError::WrongStep {
                    operation: "back",
                    step: self.step,
                })
            }
            Step::SongSearch => Step::DateSelect,
            Step::SongPick => Step::SongSearch,
            Step::DetailsSubmit => Step::SongPick,
            Step::Submitted => return Err(WizardError::AlreadySubmitted),
        };
        self.step = target;
        Ok(target)
    }

    /// Assemble the suggestion for submission
    ///
    /// Existing songs take their id from `catalog` (first exact title match).
    /// Free-text values are trimmed.
    pub fn suggestion(&self, catalog: &Catalog) -> Result<Suggestion, WizardError> {
        self.require_step(Step::DetailsSubmit, "submit")?;
        let liturgy_date = self.liturgy_date.ok_or(WizardError::MissingDate)?;
        let selection = self.selection.as_ref().ok_or(WizardError::NoSelection)?;

        let song = match selection {
            Selection::Existing { title } => SongReference::Existing {
                title: title.clone(),
                id: catalog.id_for(title).map(str::to_string),
            },
            Selection::New { title } => SongReference::New(NewSong {
                title: title.clone(),
                author: self.new_song.author.trim().to_string(),
                text_link: self.new_song.text_link.trim().to_string(),
                audio_link: self.new_song.audio_link.trim().to_string(),
            }),
        };

        Ok(Suggestion {
            liturgy_date,
            song,
            adequacy: self.adequacy,
            notes: self.notes.trim().to_string(),
        })
    }

    /// Enter the absorbing `Submitted` state after a successful write
    pub fn mark_submitted(&mut self, summary: SubmittedSummary) -> Result<(), WizardError> {
        self.require_step(Step::DetailsSubmit, "mark_submitted")?;
        self.submitted = Some(summary);
        self.step = Step::Submitted;
        Ok(())
    }

    /// Start over from step 1 with every field cleared
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn candidates(titles: &[&str]) -> Vec<ScoredTitle> {
        titles
            .iter()
            .map(|t| ScoredTitle {
                title: t.to_string(),
                score: 90,
            })
            .collect()
    }

    fn catalog() -> Catalog {
        Catalog::from_csv_reader("id_canti,titolo\n7,Resta Con Noi\n".as_bytes()).unwrap()
    }

    /// Walk to the pick step with the given term and candidate list
    fn at_pick(term: &str, titles: &[&str]) -> WizardState {
        let mut state = WizardState::new();
        state.set_date(date()).unwrap();
        state.next().unwrap();
        state.set_search_term(term).unwrap();
        state.next().unwrap();
        state.set_candidates(candidates(titles));
        state
    }

    #[test]
    fn test_next_without_date_is_noop() {
        let mut state = WizardState::new();
        let before = state.clone();

        assert_eq!(state.next(), Err(WizardError::MissingDate));
        assert_eq!(state, before);
    }

    #[test]
    fn test_next_with_blank_search_is_noop() {
        let mut state = WizardState::new();
        state.set_date(date()).unwrap();
        state.next().unwrap();
        state.set_search_term("   ").unwrap();

        assert_eq!(state.next(), Err(WizardError::EmptySearchTerm));
        assert_eq!(state.step(), Step::SongSearch);
    }

    #[test]
    fn test_next_without_selection_is_noop() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        assert_eq!(state.next(), Err(WizardError::NoSelection));
        assert_eq!(state.step(), Step::SongPick);
    }

    #[test]
    fn test_full_forward_path() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        state.select_existing("Resta Con Noi").unwrap();

        assert_eq!(state.next(), Ok(Step::DetailsSubmit));
        assert_eq!(state.step().number(), 4);
        assert_eq!(state.step().label(), "Completa e invia");
    }

    #[test]
    fn test_back_keeps_answers() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        state.select_existing("Resta Con Noi").unwrap();
        state.next().unwrap();
        state
            .update_details(DetailsUpdate {
                notes: Some("ben adatto".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(state.back(), Ok(Step::SongPick));
        assert_eq!(state.back(), Ok(Step::SongSearch));
        assert_eq!(state.back(), Ok(Step::DateSelect));

        assert_eq!(state.liturgy_date(), Some(date()));
        assert_eq!(state.search_term(), "resta");
        assert_eq!(state.selection().map(Selection::title), Some("Resta Con Noi"));
        assert_eq!(state.notes(), "ben adatto");

        // Re-advance without re-entering anything
        state.next().unwrap();
        state.next().unwrap();
        assert_eq!(state.next(), Ok(Step::DetailsSubmit));
    }

    #[test]
    fn test_back_from_first_step_refused() {
        let mut state = WizardState::new();
        assert!(matches!(state.back(), Err(WizardError::WrongStep { .. })));
        assert_eq!(state.step(), Step::DateSelect);
    }

    #[test]
    fn test_changing_search_term_drops_selection() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        state.declare_new().unwrap();
        state.back().unwrap();

        state.set_search_term("resta").unwrap();
        assert!(state.selection().is_some());

        state.set_search_term("gloria").unwrap();
        assert!(state.selection().is_none());
        assert!(state.candidates().is_empty());
    }

    #[test]
    fn test_select_unknown_candidate_refused() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        assert_eq!(
            state.select_existing("Alleluia"),
            Err(WizardError::UnknownCandidate("Alleluia".to_string()))
        );
        assert!(state.selection().is_none());
    }

    #[test]
    fn test_declare_new_binds_search_term() {
        let mut state = at_pick("  Canto Nuovo ", &[]);
        state.declare_new().unwrap();
        assert_eq!(
            state.selection(),
            Some(&Selection::New {
                title: "Canto Nuovo".to_string()
            })
        );
    }

    #[test]
    fn test_inputs_only_accepted_on_their_step() {
        let mut state = WizardState::new();
        assert!(matches!(
            state.set_search_term("x"),
            Err(WizardError::WrongStep { .. })
        ));
        assert!(matches!(
            state.update_details(DetailsUpdate::default()),
            Err(WizardError::WrongStep { .. })
        ));
    }

    #[test]
    fn test_suggestion_for_existing_song_resolves_id() {
        let mut state = at_pick("resta", &["Resta Con Noi"]);
        state.select_existing("Resta Con Noi").unwrap();
        state.next().unwrap();
        state
            .update_details(DetailsUpdate {
                adequacy: Some(Adequacy::new(75).unwrap()),
                notes: Some(" ben adatto ".to_string()),
                author: Some("ignored for existing songs".to_string()),
                ..Default::default()
            })
            .unwrap();

        let suggestion = state.suggestion(&catalog()).unwrap();
        assert_eq!(
            suggestion.song,
            SongReference::Existing {
                title: "Resta Con Noi".to_string(),
                id: Some("7".to_string()),
            }
        );
        assert_eq!(suggestion.adequacy.percent(), 75);
        assert_eq!(suggestion.notes, "ben adatto");
    }

    #[test]
    fn test_suggestion_for_new_song_carries_details() {
        let mut state = at_pick("Canto Nuovo", &[]);
        state.declare_new().unwrap();
        state.next().unwrap();
        state
            .update_details(DetailsUpdate {
                author: Some(" M. Rossi ".to_string()),
                notes: Some("proposta".to_string()),
                ..Default::default()
            })
            .unwrap();

        let suggestion = state.suggestion(&Catalog::empty()).unwrap();
        assert_eq!(
            suggestion.song,
            SongReference::New(NewSong {
                title: "Canto Nuovo".to_string(),
                author: "M. Rossi".to_string(),
                text_link: String::new(),
                audio_link: String::new(),
            })
        );
    }

    #[test]
    fn test_submitted_is_absorbing_until_reset() {
        let mut state = at_pick("Canto Nuovo", &[]);
        state.declare_new().unwrap();
        state.next().unwrap();
        let suggestion = state.suggestion(&Catalog::empty()).unwrap();
        state.mark_submitted(SubmittedSummary::from(&suggestion)).unwrap();

        assert_eq!(state.step(), Step::Submitted);
        assert_eq!(state.back(), Err(WizardError::AlreadySubmitted));
        assert_eq!(state.next(), Err(WizardError::AlreadySubmitted));
        assert_eq!(state.submitted().map(|s| s.kind), Some("Nuovo"));
        // Answers stay until the user asks for a new suggestion
        assert_eq!(state.liturgy_date(), Some(date()));

        state.reset();
        assert_eq!(state, WizardState::default());
        assert_eq!(state.adequacy().percent(), 50);
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(Step::DateSelect.progress(), 0.0);
        assert_eq!(Step::DetailsSubmit.progress(), 1.0);
        assert_eq!(Step::Submitted.number(), 4);
    }
}
