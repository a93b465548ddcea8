pub mod policy;
pub mod tally;

pub use policy::{record_vote, VoteRejected};
pub use tally::get_survey_results;

use serde::Serialize;

// Tally for the whole survey, one entry per option in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResults {
    pub total_votes: usize,
    pub results: Vec<SurveyResult>,
}

// Vote count for a single option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResult {
    pub id: String,
    pub text: String,
    pub votes: usize,
    pub percentage: f64,
}

impl SurveyResults {
    /// Options holding the highest count. Empty when nobody voted; more than
    /// one entry on a tie.
    pub fn leaders(&self) -> Vec<&SurveyResult> {
        if self.total_votes == 0 {
            return Vec::new();
        }
        let top = self.results.iter().map(|r| r.votes).max().unwrap_or(0);
        self.results.iter().filter(|r| r.votes == top).collect()
    }

    pub fn get(&self, option_id: &str) -> Option<&SurveyResult> {
        self.results.iter().find(|r| r.id == option_id)
    }
}
