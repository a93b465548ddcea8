use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Placeholder used when a question is committed empty
pub const DEFAULT_QUESTION: &str = "Survey Question";
// Question and options of a freshly inserted survey element
pub const NEW_SURVEY_QUESTION: &str = "What's your opinion?";
pub const NEW_SURVEY_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];
// Label given to an option whose text was left blank in the form
pub const BLANK_OPTION_TEXT: &str = "Option";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub id: String,
    pub text: String,
}

/// Who cast a vote, as retained in the vote list.
///
/// Anonymous surveys never store the raw user id; they store a pseudonym that
/// is stable for one user within one survey so the one-vote rule still holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Voter {
    User(String),
    Pseudonym(String),
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Voter,
    pub option_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub question: String,
    pub options: Vec<SurveyOption>,
    pub allow_multiple_votes: bool,
    pub is_anonymous: bool,
    pub votes: Vec<Vote>,
}

/// Canvas element as seen by survey logic. Only the survey payload is
/// modelled; every other shape is carried through opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Survey(Survey),
    Shape { shape: String },
}

/// A value read from a store together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

pub fn create_survey_option(text: impl Into<String>) -> SurveyOption {
    SurveyOption {
        id: Uuid::new_v4().to_string(),
        text: text.into(),
    }
}

pub fn is_survey_element(element: &Element) -> bool {
    matches!(element.kind, ElementKind::Survey(_))
}

impl Element {
    pub fn survey(survey: Survey) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: ElementKind::Survey(survey),
        }
    }

    pub fn shape(shape: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: ElementKind::Shape { shape: shape.into() },
        }
    }

    pub fn as_survey(&self) -> Option<&Survey> {
        match &self.kind {
            ElementKind::Survey(survey) => Some(survey),
            ElementKind::Shape { .. } => None,
        }
    }
}

impl Survey {
    /// Builds a survey with fresh ids. An empty option list gets a single
    /// default option so the survey is never optionless.
    pub fn new(question: impl Into<String>, options: Vec<String>) -> Self {
        let mut options: Vec<SurveyOption> = options.into_iter().map(create_survey_option).collect();
        if options.is_empty() {
            options.push(create_survey_option(format!("{BLANK_OPTION_TEXT} 1")));
        }

        Self {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            options,
            allow_multiple_votes: false,
            is_anonymous: false,
            votes: Vec::new(),
        }
    }

    /// The survey a user gets when dropping a new survey element on the canvas.
    pub fn starter() -> Self {
        Self::new(
            NEW_SURVEY_QUESTION,
            NEW_SURVEY_OPTIONS.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    pub fn option(&self, option_id: &str) -> Option<&SurveyOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.option(option_id).is_some()
    }

    // Pseudonyms are scoped to this survey so they cannot be joined across surveys
    pub fn pseudonym_for(&self, user_id: &str) -> String {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, self.id.as_bytes());
        Uuid::new_v5(&namespace, user_id.as_bytes()).to_string()
    }

    /// The voter record a new vote from `user_id` would carry.
    pub fn voter_for(&self, user_id: Option<&str>) -> Voter {
        match user_id {
            None => Voter::Anonymous,
            Some(user_id) if self.is_anonymous => Voter::Pseudonym(self.pseudonym_for(user_id)),
            Some(user_id) => Voter::User(user_id.to_string()),
        }
    }

    /// Whether `vote` was cast by `user_id`. Matches both forms so that
    /// toggling anonymity does not forget earlier votes.
    pub fn is_vote_by(&self, vote: &Vote, user_id: &str) -> bool {
        match &vote.voter {
            Voter::User(id) => id == user_id,
            Voter::Pseudonym(pseudonym) => *pseudonym == self.pseudonym_for(user_id),
            Voter::Anonymous => false,
        }
    }

    pub fn has_voted(&self, user_id: &str) -> bool {
        self.votes.iter().any(|vote| self.is_vote_by(vote, user_id))
    }

    pub fn voted_for(&self, user_id: &str, option_id: &str) -> bool {
        self.votes
            .iter()
            .any(|vote| vote.option_id == option_id && self.is_vote_by(vote, user_id))
    }

    pub fn orphaned_votes(&self) -> usize {
        self.votes.iter().filter(|vote| !self.has_option(&vote.option_id)).count()
    }
}
