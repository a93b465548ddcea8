use crate::models::{Survey, Vote};
use chrono::Utc;
use log::debug;

/// Why a vote was not recorded. Rejections leave the survey untouched; the
/// caller decides whether to tell the voter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteRejected {
    #[error("you already voted in this survey")]
    AlreadyVoted,
    #[error("option {0} no longer exists")]
    UnknownOption(String),
}

/// Appends a vote for `option_id` if the survey's voting policy allows it.
///
/// A missing `user_id` is recorded as an anonymous vote and is never subject
/// to the one-vote rule, since there is nothing to match it against. For
/// anonymous surveys the user id is only used to derive the stored pseudonym.
///
/// # Errors
///
/// Returns `AlreadyVoted` when multiple votes are disallowed and `user_id`
/// already voted, and `UnknownOption` when the option is gone.
pub fn record_vote(survey: &Survey, user_id: Option<&str>, option_id: &str) -> Result<Survey, VoteRejected> {
    if let Some(user_id) = user_id {
        if !survey.allow_multiple_votes && survey.has_voted(user_id) {
            debug!("Rejecting repeat vote in survey {}", survey.id);
            return Err(VoteRejected::AlreadyVoted);
        }
    }

    if !survey.has_option(option_id) {
        debug!("Rejecting vote for unknown option {} in survey {}", option_id, survey.id);
        return Err(VoteRejected::UnknownOption(option_id.to_string()));
    }

    let mut next = survey.clone();
    next.votes.push(Vote {
        voter: survey.voter_for(user_id),
        option_id: option_id.to_string(),
        timestamp: Utc::now(),
    });
    Ok(next)
}
