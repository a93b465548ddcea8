//! Property-panel state for the selected survey.
//!
//! The panel keeps a local draft of the form fields and mirrors every change
//! into the committed survey straight away. There is no save step: each form
//! event yields the `SurveyEdit` the host should apply. Selecting another
//! element resynchronizes the draft from that element.

use crate::editing::{FormOption, SurveyEdit, SurveyForm};
use crate::models::{create_survey_option, Element, BLANK_OPTION_TEXT, DEFAULT_QUESTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    // Nothing to edit: the selection holds no survey
    Hidden,
    Editing,
    EditingWithResults,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent<'a> {
    SelectionChanged(Option<&'a Element>),
    QuestionChanged(String),
    QuestionCommitted,
    OptionChanged { index: usize, text: String },
    OptionAdded,
    OptionRemoved { index: usize },
    AllowMultipleVotesToggled(bool),
    AnonymousToggled(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub element_id: Option<String>,
    pub draft: Option<SurveyForm>,
    pub mode: PanelMode,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            element_id: None,
            draft: None,
            mode: PanelMode::Hidden,
        }
    }
}

impl PanelState {
    pub fn for_selection(element: Option<&Element>) -> Self {
        Self::default().reduce(PanelEvent::SelectionChanged(element)).0
    }

    /// Placeholder shown in an empty option row, by 0-based row index.
    pub fn option_placeholder(index: usize) -> String {
        format!("{BLANK_OPTION_TEXT} {}", index + 1)
    }

    /// Remove buttons are only offered while more than one option is left.
    pub fn can_remove_options(&self) -> bool {
        self.draft.as_ref().is_some_and(|d| d.options.len() > 1)
    }

    /// Advances the panel by one event. Returns the next state and, for form
    /// events, the edit that commits the change to the survey.
    pub fn reduce(self, event: PanelEvent<'_>) -> (Self, Option<SurveyEdit>) {
        if let PanelEvent::SelectionChanged(element) = event {
            return (Self::resync(element), None);
        }

        let Some(mut draft) = self.draft.clone() else {
            // Form events without a selected survey have nothing to commit to
            return (self, None);
        };

        let edit = match event {
            PanelEvent::SelectionChanged(_) => None,
            PanelEvent::QuestionChanged(text) => {
                draft.question.clone_from(&text);
                Some(SurveyEdit::SetQuestion { text })
            }
            PanelEvent::QuestionCommitted => Some(SurveyEdit::CommitQuestion),
            PanelEvent::OptionChanged { index, text } => match draft.options.get_mut(index) {
                Some(row) => {
                    row.text.clone_from(&text);
                    row.id.clone().map(|option_id| SurveyEdit::SetOptionText { index, option_id, text })
                }
                None => None,
            },
            PanelEvent::OptionAdded => {
                // The row carries the id the committed option will get
                let option = create_survey_option(Self::option_placeholder(draft.options.len()));
                draft.options.push(FormOption {
                    id: Some(option.id.clone()),
                    text: option.text,
                });
                Some(SurveyEdit::AddOption { option_id: option.id })
            }
            PanelEvent::OptionRemoved { index } => {
                if draft.options.len() > 1 && index < draft.options.len() {
                    let row = draft.options.remove(index);
                    row.id.map(|option_id| SurveyEdit::RemoveOption { index, option_id })
                } else {
                    None
                }
            }
            PanelEvent::AllowMultipleVotesToggled(value) => {
                draft.allow_multiple_votes = value;
                Some(SurveyEdit::SetAllowMultipleVotes { value })
            }
            PanelEvent::AnonymousToggled(value) => {
                draft.is_anonymous = value;
                Some(SurveyEdit::SetIsAnonymous { value })
            }
        };

        if matches!(edit, Some(SurveyEdit::CommitQuestion)) && draft.question.is_empty() {
            draft.question = DEFAULT_QUESTION.to_string();
        }

        (
            Self {
                draft: Some(draft),
                ..self
            },
            edit,
        )
    }

    fn resync(element: Option<&Element>) -> Self {
        match element.and_then(|e| e.as_survey().map(|s| (e, s))) {
            Some((element, survey)) => Self {
                element_id: Some(element.id.clone()),
                draft: Some(SurveyForm::from_survey(survey)),
                mode: if survey.votes.is_empty() {
                    PanelMode::Editing
                } else {
                    PanelMode::EditingWithResults
                },
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::edit_element;
    use crate::models::Survey;
    use crate::voting::record_vote;

    fn survey_element() -> Element {
        Element::survey(Survey::starter())
    }

    #[test]
    fn non_survey_selection_hides_panel() {
        assert_eq!(PanelState::for_selection(None).mode, PanelMode::Hidden);
        let shape = Element::shape("rectangle");
        let state = PanelState::for_selection(Some(&shape));
        assert_eq!(state.mode, PanelMode::Hidden);
        assert!(state.draft.is_none());
    }

    #[test]
    fn selection_loads_draft_from_survey() {
        let element = survey_element();
        let state = PanelState::for_selection(Some(&element));
        assert_eq!(state.mode, PanelMode::Editing);
        assert_eq!(state.element_id.as_deref(), Some(element.id.as_str()));
        let draft = state.draft.unwrap();
        assert_eq!(draft.question, "What's your opinion?");
        assert_eq!(draft.option_texts(), vec!["Option 1", "Option 2"]);
    }

    #[test]
    fn survey_with_votes_shows_results() {
        let survey = Survey::starter();
        let voted = record_vote(&survey, Some("u1"), &survey.options[0].id).unwrap();
        let element = Element::survey(voted);
        assert_eq!(PanelState::for_selection(Some(&element)).mode, PanelMode::EditingWithResults);
    }

    #[test]
    fn every_form_event_emits_an_edit_that_matches_the_draft() {
        let mut element = survey_element();
        let mut state = PanelState::for_selection(Some(&element));
        let events = vec![
            PanelEvent::QuestionChanged("Lunch?".into()),
            PanelEvent::OptionChanged { index: 0, text: "Soup".into() },
            PanelEvent::OptionAdded,
            PanelEvent::OptionRemoved { index: 1 },
            PanelEvent::AllowMultipleVotesToggled(true),
            PanelEvent::AnonymousToggled(true),
        ];

        for event in events {
            let (next, edit) = state.reduce(event);
            let edit = edit.expect("form events commit immediately");
            element = edit_element(&element, &edit);
            state = next;
        }

        let committed = SurveyForm::from_survey(element.as_survey().unwrap());
        assert_eq!(state.draft.unwrap(), committed);
        assert_eq!(committed.option_texts(), vec!["Soup", "Option 3"]);
    }

    #[test]
    fn option_edits_name_the_option_they_saw() {
        let survey = Survey::starter();
        let element = Element::survey(survey.clone());
        let state = PanelState::for_selection(Some(&element));

        let (state, edit) = state.reduce(PanelEvent::OptionChanged { index: 1, text: "Two".into() });
        assert_eq!(
            edit,
            Some(SurveyEdit::SetOptionText {
                index: 1,
                option_id: survey.options[1].id.clone(),
                text: "Two".into(),
            })
        );
        let (_, edit) = state.reduce(PanelEvent::OptionRemoved { index: 0 });
        assert_eq!(
            edit,
            Some(SurveyEdit::RemoveOption {
                index: 0,
                option_id: survey.options[0].id.clone(),
            })
        );
    }

    #[test]
    fn removing_last_option_emits_nothing() {
        let element = Element::survey(Survey::new("One?", vec!["Only".into()]));
        let state = PanelState::for_selection(Some(&element));
        assert!(!state.can_remove_options());
        let (state, edit) = state.reduce(PanelEvent::OptionRemoved { index: 0 });
        assert!(edit.is_none());
        assert_eq!(state.draft.unwrap().options.len(), 1);
    }

    #[test]
    fn empty_question_is_kept_until_commit() {
        let state = PanelState::for_selection(Some(&survey_element()));
        let (state, _) = state.reduce(PanelEvent::QuestionChanged(String::new()));
        assert_eq!(state.draft.as_ref().unwrap().question, "");
        let (state, edit) = state.reduce(PanelEvent::QuestionCommitted);
        assert_eq!(edit, Some(SurveyEdit::CommitQuestion));
        assert_eq!(state.draft.unwrap().question, DEFAULT_QUESTION);
    }

    #[test]
    fn selection_change_replaces_draft() {
        let first = survey_element();
        let second = Element::survey(Survey::new("Other?", vec!["X".into()]));
        let state = PanelState::for_selection(Some(&first));
        let (state, _) = state.reduce(PanelEvent::QuestionChanged("typing".into()));

        let (state, edit) = state.reduce(PanelEvent::SelectionChanged(Some(&second)));
        assert!(edit.is_none());
        assert_eq!(state.element_id.as_deref(), Some(second.id.as_str()));
        assert_eq!(state.draft.unwrap().question, "Other?");
    }

    #[test]
    fn form_events_without_selection_are_ignored() {
        let (state, edit) = PanelState::default().reduce(PanelEvent::OptionAdded);
        assert!(edit.is_none());
        assert_eq!(state, PanelState::default());
    }

    #[test]
    fn out_of_range_option_change_is_ignored() {
        let state = PanelState::for_selection(Some(&survey_element()));
        let (_, edit) = state.reduce(PanelEvent::OptionChanged { index: 9, text: "x".into() });
        assert!(edit.is_none());
    }
}
