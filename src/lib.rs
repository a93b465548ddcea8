//! Survey elements for a collaborative canvas: vote tallies, the voting
//! policy, authoring edits, the property-panel reducer and a versioned store
//! that records votes as a compare-and-append.

pub mod commands;
pub mod config;
pub mod db;
pub mod display;
pub mod editing;
pub mod error;
pub mod handlers;
pub mod models;
pub mod panel;
pub mod voting;

pub use config::Config;
pub use error::{CommandError, ConfigError, StoreError};
pub use models::{create_survey_option, is_survey_element, Element, Survey, SurveyOption, Vote, Voter};
pub use voting::{get_survey_results, record_vote, SurveyResult, SurveyResults, VoteRejected};
