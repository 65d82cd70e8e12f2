//! Step flow controller
//!
//! Applies one user action to a session's [`WizardState`] and renders the
//! resulting [`WizardView`]. Matching runs when the user enters the pick
//! step; submission runs the validator and the sheet writer. Refused actions
//! come back as feedback with the state unchanged.

use chrono::NaiveDate;
use hildegard_common::time::{format_date_italian, parse_date};
use hildegard_common::{Adequacy, Catalog};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::{TitleMatcher, PICK_LIMIT, PICK_SCORE_CUTOFF};
use crate::store::Destination;
use crate::submit::submit;
use crate::validation::{required_fields, Field, FieldError};
use crate::wizard::{
    DetailsUpdate, NewSongDraft, Selection, Step, SubmittedSummary, WizardError, WizardState,
};

pub const SUCCESS_MESSAGE: &str = "✅ Grazie! Il tuo suggerimento è stato inviato con successo.";
pub const NO_CANDIDATES_MESSAGE: &str =
    "Nessun canto simile trovato nel catalogo. Puoi aggiungerlo come nuovo canto.";

/// One user action, as posted by the UI
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    /// `YYYY-MM-DD` or `dd/mm/yyyy`
    SetDate { date: String },
    SetSearchTerm { search_term: String },
    SelectExisting { title: String },
    DeclareNew,
    ClearSelection,
    UpdateDetails(DetailsUpdate),
    Next,
    Back,
    Submit,
    NewSuggestion,
}

/// Shared read-only inputs for applying actions
pub struct FlowContext<'a> {
    pub catalog: &'a Catalog,
    pub matcher: &'a dyn TitleMatcher,
    pub destination: &'a Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FeedbackLevel::Error,
            message: message.into(),
        }
    }
}

/// What the last action reported back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub feedback: Option<Feedback>,
    pub field_errors: Vec<FieldError>,
}

impl ActionOutcome {
    fn with(feedback: Feedback) -> Self {
        Self {
            feedback: Some(feedback),
            field_errors: Vec::new(),
        }
    }

    fn refused(err: WizardError) -> Self {
        Self::with(Feedback::error(err.to_string()))
    }
}

/// Apply `action` to `wizard`
pub async fn apply(
    wizard: &mut WizardState,
    action: WizardAction,
    ctx: &FlowContext<'_>,
) -> ActionOutcome {
    debug!(?action, step = ?wizard.step(), "Applying wizard action");

    let result = match action {
        WizardAction::SetDate { date } => match parse_date(&date) {
            Ok(date) => wizard.set_date(date),
            Err(_) => {
                return ActionOutcome::with(Feedback::error(format!(
                    "Data non valida: \"{}\".",
                    date
                )))
            }
        },
        WizardAction::SetSearchTerm { search_term } => wizard.set_search_term(&search_term),
        WizardAction::SelectExisting { title } => wizard.select_existing(&title),
        WizardAction::DeclareNew => wizard.declare_new(),
        WizardAction::ClearSelection => wizard.clear_selection(),
        WizardAction::UpdateDetails(update) => wizard.update_details(update),
        WizardAction::Next => return advance(wizard, ctx),
        WizardAction::Back => wizard.back().map(|_| ()),
        WizardAction::Submit => return send(wizard, ctx).await,
        WizardAction::NewSuggestion => {
            wizard.reset();
            Ok(())
        }
    };

    match result {
        Ok(()) => ActionOutcome::default(),
        Err(err) => ActionOutcome::refused(err),
    }
}

fn advance(wizard: &mut WizardState, ctx: &FlowContext<'_>) -> ActionOutcome {
    match wizard.next() {
        Ok(Step::SongPick) => {
            let candidates = ctx.matcher.find(
                wizard.search_term().trim(),
                ctx.catalog.titles(),
                PICK_LIMIT,
                PICK_SCORE_CUTOFF,
            );
            debug!(
                query = %wizard.search_term(),
                matches = candidates.len(),
                "Candidates computed"
            );
            let empty = candidates.is_empty();
            wizard.set_candidates(candidates);
            if empty {
                ActionOutcome::with(Feedback::info(NO_CANDIDATES_MESSAGE))
            } else {
                ActionOutcome::default()
            }
        }
        Ok(_) => ActionOutcome::default(),
        Err(err) => ActionOutcome::refused(err),
    }
}

async fn send(wizard: &mut WizardState, ctx: &FlowContext<'_>) -> ActionOutcome {
    match submit(wizard, ctx.catalog, ctx.destination).await {
        Ok(suggestion) => match wizard.mark_submitted(SubmittedSummary::from(&suggestion)) {
            Ok(()) => ActionOutcome::with(Feedback::success(SUCCESS_MESSAGE)),
            Err(err) => ActionOutcome::refused(err),
        },
        Err(err) => ActionOutcome {
            feedback: Some(Feedback::error(err.user_message())),
            field_errors: err.field_errors().to_vec(),
        },
    }
}

/// One entry of the pick-step option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickOption {
    pub label: String,
    pub title: String,
    pub score: Option<u8>,
    pub is_new: bool,
}

/// Candidates followed by the synthetic "add as new song" option
pub fn pick_options(wizard: &WizardState) -> Vec<PickOption> {
    let mut options: Vec<PickOption> = wizard
        .candidates()
        .iter()
        .map(|candidate| PickOption {
            label: candidate.title.clone(),
            title: candidate.title.clone(),
            score: Some(candidate.score),
            is_new: false,
        })
        .collect();

    let search = wizard.search_term().trim();
    if !search.is_empty() {
        options.push(PickOption {
            label: format!("➕ Aggiungi \"{}\" come nuovo canto", search),
            title: search.to_string(),
            score: None,
            is_new: true,
        });
    }
    options
}

#[derive(Debug, Clone, Serialize)]
pub struct Answers {
    pub liturgy_date: Option<NaiveDate>,
    pub liturgy_date_display: Option<String>,
    pub search_term: String,
    pub selection: Option<Selection>,
    pub new_song: NewSongDraft,
    pub adequacy: Adequacy,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedView {
    #[serde(flatten)]
    pub summary: SubmittedSummary,
    pub liturgy_date_display: String,
}

/// Everything the UI needs to render the current step
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: u8,
    pub state: Step,
    pub label: &'static str,
    pub progress: f32,
    pub answers: Answers,
    /// Only populated on the pick step
    pub options: Vec<PickOption>,
    pub required_fields: Vec<Field>,
    pub submitted: Option<SubmittedView>,
    pub can_submit: bool,
    pub destination_message: Option<String>,
    pub feedback: Option<Feedback>,
    pub field_errors: Vec<FieldError>,
}

impl WizardView {
    pub fn render(wizard: &WizardState, destination: &Destination, outcome: ActionOutcome) -> Self {
        let step = wizard.step();
        let is_new = wizard.selection().map_or(false, Selection::is_new);

        let options = if step == Step::SongPick {
            pick_options(wizard)
        } else {
            Vec::new()
        };
        let required = if step == Step::DetailsSubmit {
            required_fields(is_new).to_vec()
        } else {
            Vec::new()
        };
        let destination_message = match destination {
            Destination::Ready(_) => None,
            Destination::Unavailable { reason } => Some(reason.clone()),
        };

        Self {
            step: step.number(),
            state: step,
            label: step.label(),
            progress: step.progress(),
            answers: Answers {
                liturgy_date: wizard.liturgy_date(),
                liturgy_date_display: wizard.liturgy_date().map(format_date_italian),
                search_term: wizard.search_term().to_string(),
                selection: wizard.selection().cloned(),
                new_song: wizard.new_song().clone(),
                adequacy: wizard.adequacy(),
                notes: wizard.notes().to_string(),
            },
            options,
            required_fields: required,
            submitted: wizard.submitted().map(|summary| SubmittedView {
                liturgy_date_display: format_date_italian(summary.liturgy_date),
                summary: summary.clone(),
            }),
            can_submit: step == Step::DetailsSubmit && destination.is_ready(),
            destination_message,
            feedback: outcome.feedback,
            field_errors: outcome.field_errors,
        }
    }
}
