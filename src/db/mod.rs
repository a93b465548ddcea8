pub mod memory;

pub use memory::MemoryStore;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Survey, SurveyOption, Versioned, Vote, Voter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow},
    Row, Sqlite, Transaction,
};

/// Authoritative home of survey elements.
///
/// Every write carries the version the caller read. A write against any other
/// version fails with `StoreError::Conflict` and changes nothing, which is
/// what makes vote recording a compare-and-append.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn create_survey(&self, survey: &Survey) -> Result<Versioned<Survey>, StoreError>;

    async fn get_survey(&self, survey_id: &str) -> Result<Versioned<Survey>, StoreError>;

    async fn list_surveys(&self) -> Result<Vec<Versioned<Survey>>, StoreError>;

    /// Writes question, options and flags. Votes are append-only and are
    /// never touched by this call. Returns the new version.
    async fn save_survey(&self, survey: &Survey, expected_version: i64) -> Result<i64, StoreError>;

    /// Appends one vote. Returns the new version.
    async fn append_vote(&self, survey_id: &str, vote: &Vote, expected_version: i64) -> Result<i64, StoreError>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self, StoreError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(&config.database_url).await.unwrap_or(false) {
            info!("Creating database at {}", config.database_url);
            Sqlite::create_database(&config.database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS surveys (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                allow_multiple_votes BOOLEAN NOT NULL DEFAULT FALSE,
                is_anonymous BOOLEAN NOT NULL DEFAULT FALSE,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS survey_options (
                id TEXT NOT NULL,
                survey_id TEXT NOT NULL,
                text TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (survey_id, id),
                FOREIGN KEY (survey_id) REFERENCES surveys(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // No foreign key on option_id: votes outlive removed options as orphans
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                survey_id TEXT NOT NULL,
                voter_kind TEXT NOT NULL,
                voter_id TEXT,
                option_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (survey_id) REFERENCES surveys(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn insert_options(
        tx: &mut Transaction<'_, Sqlite>,
        survey_id: &str,
        options: &[SurveyOption],
    ) -> Result<(), StoreError> {
        for (i, option) in options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO survey_options (id, survey_id, text, position)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&option.id)
            .bind(survey_id)
            .bind(&option.text)
            .bind(i64::try_from(i).unwrap_or(i64::MAX))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn insert_vote(tx: &mut Transaction<'_, Sqlite>, survey_id: &str, vote: &Vote) -> Result<(), StoreError> {
        let (voter_kind, voter_id) = match &vote.voter {
            Voter::User(id) => ("user", Some(id.as_str())),
            Voter::Pseudonym(id) => ("pseudonym", Some(id.as_str())),
            Voter::Anonymous => ("anonymous", None),
        };

        sqlx::query(
            r#"
            INSERT INTO votes (survey_id, voter_kind, voter_id, option_id, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(survey_id)
        .bind(voter_kind)
        .bind(voter_id)
        .bind(&vote.option_id)
        .bind(vote.timestamp.to_rfc3339())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // Claims the next version; zero rows means someone else got there first
    async fn bump_version(
        tx: &mut Transaction<'_, Sqlite>,
        survey_id: &str,
        expected_version: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE surveys
            SET version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(survey_id)
        .bind(expected_version)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn conflict_or_missing(&self, survey_id: &str, expected: i64) -> StoreError {
        let current = sqlx::query("SELECT version FROM surveys WHERE id = ?")
            .bind(survey_id)
            .fetch_optional(&self.pool)
            .await;

        match current {
            Ok(Some(row)) => match row.try_get::<i64, _>("version") {
                Ok(current) => StoreError::Conflict {
                    survey_id: survey_id.to_string(),
                    expected,
                    current,
                },
                Err(e) => e.into(),
            },
            Ok(None) => StoreError::NotFound(survey_id.to_string()),
            Err(e) => e.into(),
        }
    }

    async fn load_survey(&self, row: &SqliteRow) -> Result<Versioned<Survey>, StoreError> {
        let id: String = row.try_get("id")?;

        let options = sqlx::query(
            r#"
            SELECT id, text
            FROM survey_options
            WHERE survey_id = ?
            ORDER BY position
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<SurveyOption, sqlx::Error> {
            Ok(SurveyOption {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let votes = sqlx::query(
            r#"
            SELECT voter_kind, voter_id, option_id, timestamp
            FROM votes
            WHERE survey_id = ?
            ORDER BY seq
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(vote_from_row)
        .collect::<Result<Vec<_>, StoreError>>()?;

        if options.is_empty() {
            return Err(StoreError::Corrupt(format!("survey {id} has no options")));
        }

        Ok(Versioned {
            value: Survey {
                question: row.try_get("question")?,
                allow_multiple_votes: row.try_get("allow_multiple_votes")?,
                is_anonymous: row.try_get("is_anonymous")?,
                options,
                votes,
                id,
            },
            version: row.try_get("version")?,
        })
    }
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote, StoreError> {
    let voter_kind: String = row.try_get("voter_kind")?;
    let voter_id: Option<String> = row.try_get("voter_id")?;
    let voter = match (voter_kind.as_str(), voter_id) {
        ("user", Some(id)) => Voter::User(id),
        ("pseudonym", Some(id)) => Voter::Pseudonym(id),
        ("anonymous", _) => Voter::Anonymous,
        (kind, _) => return Err(StoreError::Corrupt(format!("unknown voter kind: {kind}"))),
    };

    let timestamp_str: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| StoreError::Corrupt(format!("failed to parse vote timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(Vote {
        voter,
        option_id: row.try_get("option_id")?,
        timestamp,
    })
}

#[async_trait]
impl SurveyStore for Database {
    async fn create_survey(&self, survey: &Survey) -> Result<Versioned<Survey>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO surveys (id, question, allow_multiple_votes, is_anonymous, version, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&survey.id)
        .bind(&survey.question)
        .bind(survey.allow_multiple_votes)
        .bind(survey.is_anonymous)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        Self::insert_options(&mut tx, &survey.id, &survey.options).await?;
        for vote in &survey.votes {
            Self::insert_vote(&mut tx, &survey.id, vote).await?;
        }

        tx.commit().await?;
        info!("Created survey {} with {} option(s)", survey.id, survey.options.len());

        Ok(Versioned {
            value: survey.clone(),
            version: 1,
        })
    }

    async fn get_survey(&self, survey_id: &str) -> Result<Versioned<Survey>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, question, allow_multiple_votes, is_anonymous, version
            FROM surveys
            WHERE id = ?
            "#,
        )
        .bind(survey_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(survey_id.to_string()))?;

        self.load_survey(&row).await
    }

    async fn list_surveys(&self) -> Result<Vec<Versioned<Survey>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, question, allow_multiple_votes, is_anonymous, version
            FROM surveys
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut surveys = Vec::with_capacity(rows.len());
        for row in &rows {
            surveys.push(self.load_survey(row).await?);
        }
        Ok(surveys)
    }

    async fn save_survey(&self, survey: &Survey, expected_version: i64) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !Self::bump_version(&mut tx, &survey.id, expected_version).await? {
            tx.rollback().await?;
            return Err(self.conflict_or_missing(&survey.id, expected_version).await);
        }

        sqlx::query(
            r#"
            UPDATE surveys
            SET question = ?, allow_multiple_votes = ?, is_anonymous = ?
            WHERE id = ?
            "#,
        )
        .bind(&survey.question)
        .bind(survey.allow_multiple_votes)
        .bind(survey.is_anonymous)
        .bind(&survey.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM survey_options WHERE survey_id = ?")
            .bind(&survey.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_options(&mut tx, &survey.id, &survey.options).await?;

        tx.commit().await?;
        debug!("Saved survey {} at version {}", survey.id, expected_version + 1);
        Ok(expected_version + 1)
    }

    async fn append_vote(&self, survey_id: &str, vote: &Vote, expected_version: i64) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !Self::bump_version(&mut tx, survey_id, expected_version).await? {
            tx.rollback().await?;
            return Err(self.conflict_or_missing(survey_id, expected_version).await);
        }

        Self::insert_vote(&mut tx, survey_id, vote).await?;
        tx.commit().await?;
        debug!("Appended vote to survey {} at version {}", survey_id, expected_version + 1);
        Ok(expected_version + 1)
    }
}
