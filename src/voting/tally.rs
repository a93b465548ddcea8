use crate::models::Survey;
use crate::voting::{SurveyResult, SurveyResults};
use std::collections::HashMap;

/// Counts votes per option and derives percentages.
///
/// Votes pointing at an option that no longer exists are dropped from both the
/// option counts and `total_votes`, so the counts always add up to the total
/// and the percentages to 100 whenever anyone voted.
pub fn get_survey_results(survey: &Survey) -> SurveyResults {
    // Initialize all options with 0 votes
    let mut vote_counts: HashMap<&str, usize> = survey
        .options
        .iter()
        .map(|option| (option.id.as_str(), 0))
        .collect();

    let mut total_votes = 0;
    for vote in &survey.votes {
        if let Some(count) = vote_counts.get_mut(vote.option_id.as_str()) {
            *count += 1;
            total_votes += 1;
        }
    }

    // Keep display order, no sorting by popularity
    let results = survey
        .options
        .iter()
        .map(|option| {
            let votes = vote_counts.get(option.id.as_str()).copied().unwrap_or(0);
            SurveyResult {
                id: option.id.clone(),
                text: option.text.clone(),
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    SurveyResults { total_votes, results }
}

fn percentage(votes: usize, total_votes: usize) -> f64 {
    if total_votes == 0 {
        0.0
    } else {
        votes as f64 / total_votes as f64 * 100.0
    }
}
