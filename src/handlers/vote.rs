use crate::db::SurveyStore;
use crate::error::StoreError;
use crate::handlers::SurveyService;
use crate::models::{Survey, Versioned};
use crate::voting::{record_vote, VoteRejected};
use log::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Recorded(Versioned<Survey>),
    Rejected(VoteRejected),
}

impl<S: SurveyStore> SurveyService<S> {
    /// Records a vote as a compare-and-append against the stored vote list.
    ///
    /// The voting policy always runs on the freshest copy: if another vote
    /// lands between the read and the append, the append fails on its version
    /// and the whole check is repeated.
    ///
    /// # Errors
    ///
    /// Store failures, or `Conflict` once the retries are used up. Policy
    /// rejections are not errors; they come back as `VoteOutcome::Rejected`.
    pub async fn cast_vote(
        &self,
        survey_id: &str,
        user_id: Option<&str>,
        option_id: &str,
    ) -> Result<VoteOutcome, StoreError> {
        info!("Recording vote: survey_id={}, option_id={}", survey_id, option_id);

        let mut attempt = 0;
        loop {
            let current = self.store.get_survey(survey_id).await?;
            let next = match record_vote(&current.value, user_id, option_id) {
                Ok(next) => next,
                Err(rejected) => {
                    info!("Vote in survey {} rejected: {}", survey_id, rejected);
                    return Ok(VoteOutcome::Rejected(rejected));
                }
            };

            let Some(vote) = next.votes.last() else {
                return Err(StoreError::Corrupt(format!("vote for survey {survey_id} was not recorded")));
            };

            match self.store.append_vote(survey_id, vote, current.version).await {
                Ok(version) => return Ok(VoteOutcome::Recorded(Versioned { value: next, version })),
                Err(StoreError::Conflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Vote in survey {} conflicted, retrying ({}/{})", survey_id, attempt, self.max_retries);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
