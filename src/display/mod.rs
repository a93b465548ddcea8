use crate::models::Survey;
use crate::voting::{get_survey_results, SurveyResults};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRow {
    pub id: String,
    pub text: String,
    pub votes: usize,
    pub percentage: f64,
    // Result bar width in percent; absent until somebody has voted
    pub bar_width: Option<f64>,
    pub checked: bool,
}

/// What the survey widget on the canvas shows for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyView {
    pub question: String,
    pub rows: Vec<OptionRow>,
    pub total_votes: usize,
    pub has_voted: bool,
    pub can_vote: bool,
    pub footer: String,
    pub status: Option<String>,
}

impl SurveyView {
    pub fn build(survey: &Survey, interactive: bool, voter: Option<&str>) -> Self {
        let results = get_survey_results(survey);
        let has_voted = voter.is_some_and(|user_id| survey.has_voted(user_id));
        let can_vote = interactive && (survey.allow_multiple_votes || !has_voted);
        let show_results = results.total_votes > 0;

        let rows = results
            .results
            .iter()
            .map(|result| OptionRow {
                id: result.id.clone(),
                text: result.text.clone(),
                votes: result.votes,
                percentage: result.percentage,
                bar_width: show_results.then_some(result.percentage),
                checked: voter.is_some_and(|user_id| survey.voted_for(user_id, &result.id)),
            })
            .collect();

        let status = interactive.then(|| {
            if has_voted {
                "You have voted"
            } else if can_vote {
                "Click an option to vote"
            } else {
                "Viewing results"
            }
            .to_string()
        });

        Self {
            question: survey.question.clone(),
            rows,
            total_votes: results.total_votes,
            has_voted,
            can_vote,
            footer: footer(survey, results.total_votes),
            status,
        }
    }

    /// Whether a click on `option_id` should be forwarded as a vote.
    pub fn accepts_vote(&self, option_id: &str) -> bool {
        self.can_vote && self.rows.iter().any(|row| row.id == option_id)
    }
}

fn footer(survey: &Survey, total_votes: usize) -> String {
    let mut footer = format!("{} {}", total_votes, if total_votes == 1 { "vote" } else { "votes" });
    if survey.is_anonymous {
        footer.push_str(" • Anonymous");
    }
    if survey.allow_multiple_votes {
        footer.push_str(" • Multiple votes allowed");
    }
    footer
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultLine {
    pub id: String,
    pub text: String,
    pub label: String,
    pub bar_width: f64,
}

/// Read-only results block shown next to the editing form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsPanel {
    pub heading: String,
    pub lines: Vec<ResultLine>,
}

impl ResultsPanel {
    /// `None` while the survey has no votes.
    pub fn build(survey: &Survey) -> Option<Self> {
        if survey.votes.is_empty() {
            return None;
        }
        let results = get_survey_results(survey);
        Some(Self {
            heading: format!("Results ({} votes)", results.total_votes),
            lines: results
                .results
                .iter()
                .map(|r| ResultLine {
                    id: r.id.clone(),
                    text: r.text.clone(),
                    label: format!("{} ({:.1}%)", r.votes, r.percentage),
                    bar_width: r.percentage,
                })
                .collect(),
        })
    }
}

/// Plain-text rendering of a survey and its tally. Leading options are bold.
pub fn render_summary(survey: &Survey, results: &SurveyResults) -> String {
    let leaders: Vec<&str> = results.leaders().iter().map(|r| r.id.as_str()).collect();
    let mut summary = format!("**{}**\n", survey.question);

    for result in &results.results {
        let line = if leaders.contains(&result.id.as_str()) {
            format!("**{}**: {} votes ({:.1}%)", result.text, result.votes, result.percentage)
        } else {
            format!("{}: {} votes ({:.1}%)", result.text, result.votes, result.percentage)
        };
        summary.push_str(&line);
        summary.push('\n');
    }

    summary.push('\n');
    summary.push_str(&footer(survey, results.total_votes));
    let orphaned = survey.orphaned_votes();
    if orphaned > 0 {
        summary.push_str(&format!(" ({orphaned} for removed options not counted)"));
    }
    summary
}
