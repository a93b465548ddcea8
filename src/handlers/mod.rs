mod vote;

pub use vote::VoteOutcome;

use crate::config::Config;
use crate::db::SurveyStore;
use crate::editing::{apply_edit, apply_form, SurveyEdit, SurveyForm};
use crate::error::StoreError;
use crate::models::{Survey, Versioned};
use crate::voting::{get_survey_results, SurveyResults};
use log::{info, warn};
use std::sync::Arc;

/// Entry point the host calls for survey reads and writes. Every write is
/// validated against the latest stored survey and retried on a version
/// conflict, up to the configured number of retries.
pub struct SurveyService<S> {
    store: Arc<S>,
    max_retries: u32,
}

impl<S> Clone for SurveyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_retries: self.max_retries,
        }
    }
}

impl<S: SurveyStore> SurveyService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            max_retries: config.max_vote_retries,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create_survey(&self, survey: &Survey) -> Result<Versioned<Survey>, StoreError> {
        self.store.create_survey(survey).await
    }

    pub async fn results(&self, survey_id: &str) -> Result<SurveyResults, StoreError> {
        let survey = self.store.get_survey(survey_id).await?;
        Ok(get_survey_results(&survey.value))
    }

    /// Applies one authoring edit to the latest version of the survey.
    ///
    /// The edit is checked again on every retry. An option edit whose option
    /// has moved or been removed by someone else since the panel rendered
    /// becomes a no-op.
    pub async fn apply_edit(&self, survey_id: &str, edit: &SurveyEdit) -> Result<Versioned<Survey>, StoreError> {
        self.update(survey_id, |survey| {
            if edit.applies_to(survey) {
                Some(apply_edit(survey, edit))
            } else {
                warn!("Ignoring {:?} in survey {}: option moved or no longer exists", edit, survey_id);
                None
            }
        })
        .await
    }

    pub async fn apply_form(&self, survey_id: &str, form: &SurveyForm) -> Result<Versioned<Survey>, StoreError> {
        self.update(survey_id, |survey| Some(apply_form(survey, form))).await
    }

    // Read, transform, write-if-unchanged; `None` or an identical survey skips the write
    async fn update<F>(&self, survey_id: &str, transform: F) -> Result<Versioned<Survey>, StoreError>
    where
        F: Fn(&Survey) -> Option<Survey> + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let current = self.store.get_survey(survey_id).await?;
            let next = match transform(&current.value) {
                Some(next) if next != current.value => next,
                _ => return Ok(current),
            };

            match self.store.save_survey(&next, current.version).await {
                Ok(version) => {
                    info!("Updated survey {} to version {}", survey_id, version);
                    return Ok(Versioned { value: next, version });
                }
                Err(StoreError::Conflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Edit of survey {} conflicted, retrying ({}/{})", survey_id, attempt, self.max_retries);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
