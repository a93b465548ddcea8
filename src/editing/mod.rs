use crate::models::{
    create_survey_option, Element, ElementKind, Survey, SurveyOption, BLANK_OPTION_TEXT, DEFAULT_QUESTION,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One authoring change to a survey, as produced by the property panel.
///
/// Option edits name the option by position and by the id the editor saw
/// there. If the survey has changed underneath and that id is no longer at
/// that position, the edit does nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum SurveyEdit {
    SetQuestion { text: String },
    CommitQuestion,
    SetOptionText { index: usize, option_id: String, text: String },
    AddOption { option_id: String },
    RemoveOption { index: usize, option_id: String },
    SetAllowMultipleVotes { value: bool },
    SetIsAnonymous { value: bool },
}

impl SurveyEdit {
    /// Adds an option under a freshly generated id.
    pub fn add_option() -> Self {
        Self::AddOption {
            option_id: Uuid::new_v4().to_string(),
        }
    }

    /// Removes whatever option `survey` currently holds at `index`.
    pub fn remove_option_at(survey: &Survey, index: usize) -> Option<Self> {
        survey.options.get(index).map(|option| Self::RemoveOption {
            index,
            option_id: option.id.clone(),
        })
    }

    /// Whether the option this edit addresses is still where the editor saw it.
    /// Edits that do not address an option always apply.
    pub fn applies_to(&self, survey: &Survey) -> bool {
        match self {
            Self::SetOptionText { index, option_id, .. } | Self::RemoveOption { index, option_id } => {
                survey.options.get(*index).is_some_and(|option| option.id == *option_id)
            }
            _ => true,
        }
    }
}

/// One option row of the panel form. `id` is `None` for a row the survey
/// does not have yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOption {
    pub id: Option<String>,
    pub text: String,
}

impl FormOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }
}

/// Whole-form snapshot of the panel fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyForm {
    pub question: String,
    pub options: Vec<FormOption>,
    pub allow_multiple_votes: bool,
    pub is_anonymous: bool,
}

impl SurveyForm {
    pub fn from_survey(survey: &Survey) -> Self {
        Self {
            question: survey.question.clone(),
            options: survey
                .options
                .iter()
                .map(|o| FormOption {
                    id: Some(o.id.clone()),
                    text: o.text.clone(),
                })
                .collect(),
            allow_multiple_votes: survey.allow_multiple_votes,
            is_anonymous: survey.is_anonymous,
        }
    }

    pub fn option_texts(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.text.as_str()).collect()
    }
}

// Interactive typing keeps whatever the user has entered, even an empty string
pub fn set_question(survey: &Survey, text: &str) -> Survey {
    Survey {
        question: text.to_string(),
        ..survey.clone()
    }
}

pub fn commit_question(survey: &Survey) -> Survey {
    if survey.question.is_empty() {
        set_question(survey, DEFAULT_QUESTION)
    } else {
        survey.clone()
    }
}

/// Replaces the text of the option at `index`.
///
/// # Panics
///
/// Panics if `index` is out of range; callers only pass indices of options
/// they are displaying.
pub fn set_option_text(survey: &Survey, index: usize, text: &str) -> Survey {
    assert!(
        index < survey.options.len(),
        "option index {index} out of range for {} options",
        survey.options.len()
    );
    let mut next = survey.clone();
    next.options[index].text = text.to_string();
    next
}

fn next_option_label(survey: &Survey) -> String {
    format!("{BLANK_OPTION_TEXT} {}", survey.options.len() + 1)
}

pub fn add_option(survey: &Survey) -> Survey {
    let mut next = survey.clone();
    next.options.push(create_survey_option(next_option_label(survey)));
    next
}

// Adding an id the survey already has is a no-op, so replays are harmless
fn add_option_with_id(survey: &Survey, option_id: &str) -> Survey {
    let mut next = survey.clone();
    if !survey.has_option(option_id) {
        next.options.push(SurveyOption {
            id: option_id.to_string(),
            text: next_option_label(survey),
        });
    }
    next
}

/// Removes the option at `index` unless it is the last one left.
/// Votes for the removed option stay in the vote list as orphans.
pub fn remove_option(survey: &Survey, index: usize) -> Survey {
    if survey.options.len() <= 1 || index >= survey.options.len() {
        return survey.clone();
    }
    let mut next = survey.clone();
    next.options.remove(index);
    next
}

pub fn set_allow_multiple_votes(survey: &Survey, value: bool) -> Survey {
    Survey {
        allow_multiple_votes: value,
        ..survey.clone()
    }
}

pub fn set_is_anonymous(survey: &Survey, value: bool) -> Survey {
    Survey {
        is_anonymous: value,
        ..survey.clone()
    }
}

/// Applies a full form.
///
/// Rows are matched to options by id, so votes follow the option they were
/// cast for whatever the row order. A row without an id, or whose option has
/// since been removed, becomes a new option; options with no row are removed
/// and their votes become orphans.
pub fn apply_form(survey: &Survey, form: &SurveyForm) -> Survey {
    let question = if form.question.is_empty() {
        DEFAULT_QUESTION.to_string()
    } else {
        form.question.clone()
    };

    let mut claimed = HashSet::new();
    let mut options: Vec<_> = form
        .options
        .iter()
        .map(|row| {
            let text = if row.text.is_empty() { BLANK_OPTION_TEXT } else { row.text.as_str() };
            match row.id.as_deref() {
                Some(id) if survey.has_option(id) && claimed.insert(id) => SurveyOption {
                    id: id.to_string(),
                    text: text.to_string(),
                },
                _ => create_survey_option(text),
            }
        })
        .collect();
    if options.is_empty() {
        options = survey.options.clone();
    }

    Survey {
        question,
        options,
        allow_multiple_votes: form.allow_multiple_votes,
        is_anonymous: form.is_anonymous,
        ..survey.clone()
    }
}

pub fn apply_edit(survey: &Survey, edit: &SurveyEdit) -> Survey {
    if !edit.applies_to(survey) {
        return survey.clone();
    }
    match edit {
        SurveyEdit::SetQuestion { text } => set_question(survey, text),
        SurveyEdit::CommitQuestion => commit_question(survey),
        SurveyEdit::SetOptionText { index, text, .. } => set_option_text(survey, *index, text),
        SurveyEdit::AddOption { option_id } => add_option_with_id(survey, option_id),
        SurveyEdit::RemoveOption { index, .. } => remove_option(survey, *index),
        SurveyEdit::SetAllowMultipleVotes { value } => set_allow_multiple_votes(survey, *value),
        SurveyEdit::SetIsAnonymous { value } => set_is_anonymous(survey, *value),
    }
}

/// Applies `edit` to a survey element; any other element comes back unchanged.
pub fn edit_element(element: &Element, edit: &SurveyEdit) -> Element {
    match &element.kind {
        ElementKind::Survey(survey) => Element {
            id: element.id.clone(),
            kind: ElementKind::Survey(apply_edit(survey, edit)),
        },
        ElementKind::Shape { .. } => element.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::is_survey_element;
    use crate::voting::{get_survey_results, record_vote};

    #[test]
    fn set_question_keeps_empty_text_while_typing() {
        let survey = set_question(&Survey::starter(), "");
        assert_eq!(survey.question, "");
        assert_eq!(commit_question(&survey).question, DEFAULT_QUESTION);
    }

    #[test]
    fn commit_question_leaves_real_text_alone() {
        let survey = set_question(&Survey::starter(), "Lunch?");
        assert_eq!(commit_question(&survey).question, "Lunch?");
    }

    #[test]
    fn set_option_text_replaces_only_that_option() {
        let survey = Survey::starter();
        let next = set_option_text(&survey, 1, "Tacos");
        assert_eq!(next.options[1].text, "Tacos");
        assert_eq!(next.options[1].id, survey.options[1].id);
        assert_eq!(next.options[0], survey.options[0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_option_text_out_of_range_panics() {
        let _ = set_option_text(&Survey::starter(), 5, "nope");
    }

    #[test]
    fn add_option_appends_one_with_fresh_id_and_position_label() {
        let survey = Survey::starter();
        let next = add_option(&survey);
        assert_eq!(next.options.len(), survey.options.len() + 1);
        let added = next.options.last().unwrap();
        assert_eq!(added.text, "Option 3");
        assert!(survey.options.iter().all(|o| o.id != added.id));

        let ids: HashSet<&str> = next.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), next.options.len());
    }

    #[test]
    fn remove_option_on_single_option_is_noop() {
        let survey = remove_option(&Survey::starter(), 0);
        assert_eq!(survey.options.len(), 1);
        let again = remove_option(&survey, 0);
        assert_eq!(again, survey);
    }

    #[test]
    fn remove_option_out_of_range_is_noop() {
        let survey = Survey::starter();
        assert_eq!(remove_option(&survey, 9), survey);
    }

    #[test]
    fn toggling_flags_does_not_touch_votes() {
        let base = Survey::starter();
        let voted = record_vote(&base, Some("u1"), &base.options[0].id).unwrap();
        let toggled = set_is_anonymous(&set_allow_multiple_votes(&voted, true), true);
        assert!(toggled.allow_multiple_votes);
        assert!(toggled.is_anonymous);
        assert_eq!(toggled.votes, voted.votes);
    }

    #[test]
    fn apply_form_matches_rows_by_id_and_fills_blanks() {
        let survey = Survey::starter();
        let form = SurveyForm {
            question: String::new(),
            options: vec![
                FormOption {
                    id: Some(survey.options[1].id.clone()),
                    text: String::new(),
                },
                FormOption {
                    id: Some(survey.options[0].id.clone()),
                    text: "Red".into(),
                },
                FormOption::new("Blue"),
            ],
            allow_multiple_votes: true,
            is_anonymous: false,
        };
        let next = apply_form(&survey, &form);
        assert_eq!(next.question, DEFAULT_QUESTION);
        assert_eq!(next.options[0].id, survey.options[1].id);
        assert_eq!(next.options[0].text, BLANK_OPTION_TEXT);
        assert_eq!(next.options[1].id, survey.options[0].id);
        assert_eq!(next.options[1].text, "Red");
        assert_eq!(next.options[2].text, "Blue");
        assert!(!survey.has_option(&next.options[2].id));
        assert!(next.allow_multiple_votes);
    }

    #[test]
    fn apply_form_dropping_first_row_orphans_its_votes() {
        let survey = Survey::new("Pizza?", vec!["Yes".into(), "No".into()]);
        let voted = record_vote(&survey, Some("u1"), &survey.options[0].id).unwrap();
        let mut form = SurveyForm::from_survey(&voted);
        form.options.remove(0);

        let next = apply_form(&voted, &form);
        assert_eq!(next.options.len(), 1);
        assert_eq!(next.options[0].id, survey.options[1].id);
        assert_eq!(next.orphaned_votes(), 1);

        let results = get_survey_results(&next);
        assert_eq!(results.total_votes, 0);
        assert_eq!(results.results[0].votes, 0);
    }

    #[test]
    fn apply_form_gives_repeated_or_unknown_ids_fresh_options() {
        let survey = Survey::starter();
        let first = survey.options[0].id.clone();
        let mut form = SurveyForm::from_survey(&survey);
        form.options = vec![
            FormOption {
                id: Some(first.clone()),
                text: "A".into(),
            },
            FormOption {
                id: Some(first.clone()),
                text: "B".into(),
            },
            FormOption {
                id: Some("removed-elsewhere".into()),
                text: "C".into(),
            },
        ];

        let next = apply_form(&survey, &form);
        assert_eq!(next.options[0].id, first);
        assert_ne!(next.options[1].id, first);
        assert_ne!(next.options[2].id, "removed-elsewhere");
        let ids: HashSet<&str> = next.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn whitespace_question_is_kept_on_commit() {
        let survey = set_question(&Survey::starter(), "  ");
        assert_eq!(commit_question(&survey).question, "  ");
    }

    #[test]
    fn option_edit_against_moved_option_is_noop() {
        let survey = Survey::new("Pick", vec!["A".into(), "B".into(), "C".into()]);
        let seen_b = SurveyEdit::remove_option_at(&survey, 1).unwrap();
        let rename_b = SurveyEdit::SetOptionText {
            index: 1,
            option_id: survey.options[1].id.clone(),
            text: "Bee".into(),
        };

        // Someone else removed B, so C now sits at index 1
        let shifted = remove_option(&survey, 1);
        assert!(!seen_b.applies_to(&shifted));
        assert_eq!(apply_edit(&shifted, &seen_b), shifted);
        assert_eq!(apply_edit(&shifted, &rename_b), shifted);
        assert_eq!(apply_edit(&survey, &seen_b).options.len(), 2);
    }

    #[test]
    fn add_option_edit_is_idempotent() {
        let survey = Survey::starter();
        let edit = SurveyEdit::add_option();
        let once = apply_edit(&survey, &edit);
        assert_eq!(once.options.len(), 3);
        assert_eq!(once.options[2].text, "Option 3");
        assert_eq!(apply_edit(&once, &edit), once);
    }

    #[test]
    fn apply_form_with_no_options_keeps_existing_ones() {
        let survey = Survey::starter();
        let mut form = SurveyForm::from_survey(&survey);
        form.options.clear();
        assert_eq!(apply_form(&survey, &form).options, survey.options);
    }

    #[test]
    fn edit_element_passes_non_surveys_through() {
        let shape = Element::shape("arrow");
        assert_eq!(edit_element(&shape, &SurveyEdit::add_option()), shape);

        let element = Element::survey(Survey::starter());
        let edited = edit_element(&element, &SurveyEdit::add_option());
        assert!(is_survey_element(&edited));
        assert_eq!(edited.id, element.id);
        assert_eq!(edited.as_survey().unwrap().options.len(), 3);
    }

    #[test]
    fn apply_edit_dispatches_every_variant() {
        let survey = Survey::starter();
        let (first, second) = (survey.options[0].id.clone(), survey.options[1].id.clone());
        let edits = [
            SurveyEdit::SetQuestion { text: String::new() },
            SurveyEdit::CommitQuestion,
            SurveyEdit::SetOptionText {
                index: 0,
                option_id: first,
                text: "First".into(),
            },
            SurveyEdit::add_option(),
            SurveyEdit::RemoveOption {
                index: 1,
                option_id: second,
            },
            SurveyEdit::SetAllowMultipleVotes { value: true },
            SurveyEdit::SetIsAnonymous { value: true },
        ];
        let result = edits.iter().fold(survey, |s, e| apply_edit(&s, e));
        assert_eq!(result.question, DEFAULT_QUESTION);
        let texts: Vec<&str> = result.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Option 3"]);
        assert!(result.allow_multiple_votes && result.is_anonymous);
    }
}
