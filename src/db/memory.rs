use crate::db::SurveyStore;
use crate::error::StoreError;
use crate::models::{Survey, Versioned, Vote};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Survey store held in process memory.
///
/// The version check and the write happen under one lock, so the check cannot
/// go stale between validation and append.
#[derive(Default)]
pub struct MemoryStore {
    surveys: Mutex<HashMap<String, Versioned<Survey>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(entry: &Versioned<Survey>, survey_id: &str, expected: i64) -> Result<(), StoreError> {
    if entry.version == expected {
        Ok(())
    } else {
        Err(StoreError::Conflict {
            survey_id: survey_id.to_string(),
            expected,
            current: entry.version,
        })
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn create_survey(&self, survey: &Survey) -> Result<Versioned<Survey>, StoreError> {
        let created = Versioned {
            value: survey.clone(),
            version: 1,
        };
        self.surveys.lock().await.insert(survey.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_survey(&self, survey_id: &str) -> Result<Versioned<Survey>, StoreError> {
        self.surveys
            .lock()
            .await
            .get(survey_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(survey_id.to_string()))
    }

    async fn list_surveys(&self) -> Result<Vec<Versioned<Survey>>, StoreError> {
        let mut surveys: Vec<_> = self.surveys.lock().await.values().cloned().collect();
        surveys.sort_by(|a, b| a.value.id.cmp(&b.value.id));
        Ok(surveys)
    }

    async fn save_survey(&self, survey: &Survey, expected_version: i64) -> Result<i64, StoreError> {
        let mut surveys = self.surveys.lock().await;
        let entry = surveys
            .get_mut(&survey.id)
            .ok_or_else(|| StoreError::NotFound(survey.id.clone()))?;
        check_version(entry, &survey.id, expected_version)?;

        // Votes stay as stored; only the authored fields are replaced
        entry.value = Survey {
            votes: std::mem::take(&mut entry.value.votes),
            ..survey.clone()
        };
        entry.version += 1;
        debug!("Saved survey {} at version {}", survey.id, entry.version);
        Ok(entry.version)
    }

    async fn append_vote(&self, survey_id: &str, vote: &Vote, expected_version: i64) -> Result<i64, StoreError> {
        let mut surveys = self.surveys.lock().await;
        let entry = surveys
            .get_mut(survey_id)
            .ok_or_else(|| StoreError::NotFound(survey_id.to_string()))?;
        check_version(entry, survey_id, expected_version)?;

        entry.value.votes.push(vote.clone());
        entry.version += 1;
        debug!("Appended vote to survey {} at version {}", survey_id, entry.version);
        Ok(entry.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::set_question;
    use crate::voting::record_vote;

    #[tokio::test]
    async fn create_and_get() {
        let store = MemoryStore::new();
        let survey = Survey::starter();
        store.create_survey(&survey).await.unwrap();
        let loaded = store.get_survey(&survey.id).await.unwrap();
        assert_eq!(loaded.value, survey);
        assert_eq!(loaded.version, 1);
        assert!(matches!(store.get_survey("missing").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn stale_append_is_rejected_without_change() {
        let store = MemoryStore::new();
        let survey = Survey::starter();
        store.create_survey(&survey).await.unwrap();
        let voted = record_vote(&survey, Some("u1"), &survey.options[0].id).unwrap();

        assert_eq!(store.append_vote(&survey.id, &voted.votes[0], 1).await.unwrap(), 2);
        let err = store.append_vote(&survey.id, &voted.votes[0], 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 1, current: 2, .. }));
        assert_eq!(store.get_survey(&survey.id).await.unwrap().value.votes.len(), 1);
    }

    #[tokio::test]
    async fn save_keeps_stored_votes() {
        let store = MemoryStore::new();
        let survey = Survey::starter();
        store.create_survey(&survey).await.unwrap();
        let voted = record_vote(&survey, Some("u1"), &survey.options[0].id).unwrap();
        store.append_vote(&survey.id, &voted.votes[0], 1).await.unwrap();

        // Edit based on a snapshot without the vote
        let edited = set_question(&survey, "New?");
        assert_eq!(store.save_survey(&edited, 2).await.unwrap(), 3);
        let loaded = store.get_survey(&survey.id).await.unwrap().value;
        assert_eq!(loaded.question, "New?");
        assert_eq!(loaded.votes.len(), 1);
    }
}
