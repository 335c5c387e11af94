use advault_core::models::{Ad, AdType, Hook, Shot, ShotType, Tactic, WhyItWorked};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres};

use super::transaction::TransactionGuard;
use crate::store::AdStore;
use crate::StoreError;

/// Row type for the ads table
#[derive(Debug, sqlx::FromRow)]
struct AdRow {
    id: String,
    title: String,
    video_src: String,
    source: String,
    creator: String,
    product: String,
    vertical: String,
    ad_type: String,
    hook_text_overlay: String,
    hook_spoken: String,
    full_transcript: String,
    why_summary: String,
    why_key_lesson: String,
    tags: Vec<String>,
    date_added: NaiveDate,
}

#[derive(Debug, sqlx::FromRow)]
struct TacticRow {
    name: String,
    description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ShotRow {
    shot_number: i32,
    start_time: f64,
    end_time: f64,
    timestamp_label: String,
    shot_type: String,
    thumbnail: Option<String>,
    description: String,
    transcript: String,
    text_overlay: String,
    purpose: String,
}

impl ShotRow {
    fn into_shot(self, ad_id: &str) -> Result<Shot, StoreError> {
        let id = u32::try_from(self.shot_number).map_err(|_| StoreError::Corrupt {
            id: ad_id.to_string(),
            reason: format!("negative shot number {}", self.shot_number),
        })?;
        let shot_type = self.shot_type.parse::<ShotType>().unwrap_or_else(|e| {
            tracing::warn!(ad_id = %ad_id, error = %e, "Unknown shot type, treating as video");
            ShotType::Video
        });
        Ok(Shot {
            id,
            start_time: self.start_time,
            end_time: self.end_time,
            timestamp: self.timestamp_label,
            shot_type,
            thumbnail: self.thumbnail,
            description: self.description,
            transcript: self.transcript,
            text_overlay: self.text_overlay,
            purpose: self.purpose,
        })
    }
}

impl AdRow {
    fn into_ad(self, tactics: Vec<Tactic>, shots: Vec<Shot>) -> Ad {
        let ad_type = self.ad_type.parse::<AdType>().unwrap_or_else(|e| {
            tracing::warn!(ad_id = %self.id, error = %e, "Unknown ad type in database");
            AdType::Unknown
        });
        Ad {
            id: self.id,
            title: self.title,
            video_src: self.video_src,
            source: self.source,
            creator: self.creator,
            product: self.product,
            vertical: self.vertical,
            ad_type,
            hook: Hook {
                text_overlay: self.hook_text_overlay,
                spoken: self.hook_spoken,
            },
            full_transcript: self.full_transcript,
            why_it_worked: WhyItWorked {
                summary: self.why_summary,
                tactics,
                key_lesson: self.why_key_lesson,
            },
            shots,
            tags: self.tags,
            date_added: self.date_added,
        }
    }
}

/// Repository for ads and their tactic and shot rows
#[derive(Clone)]
pub struct AdRepository {
    pool: PgPool,
}

impl AdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert an ad with all of its tactics and shots in one transaction.
    ///
    /// Returns `StoreError::Conflict` when an ad with the same id exists,
    /// including when a concurrent writer got there first.
    #[tracing::instrument(skip(self, ad), fields(db.table = "ads", db.operation = "insert", db.record_id = %ad.id))]
    pub async fn create_ad(&self, ad: &Ad) -> Result<String, StoreError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let inserted = sqlx::query_scalar::<Postgres, String>(
            r#"
            INSERT INTO ads (
                id, title, video_src, source, creator, product, vertical, ad_type,
                hook_text_overlay, hook_spoken, full_transcript, why_summary,
                why_key_lesson, tags, date_added
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&ad.id)
        .bind(&ad.title)
        .bind(&ad.video_src)
        .bind(&ad.source)
        .bind(&ad.creator)
        .bind(&ad.product)
        .bind(&ad.vertical)
        .bind(ad.ad_type.to_string())
        .bind(&ad.hook.text_overlay)
        .bind(&ad.hook.spoken)
        .bind(&ad.full_transcript)
        .bind(&ad.why_it_worked.summary)
        .bind(&ad.why_it_worked.key_lesson)
        .bind(&ad.tags)
        .bind(ad.date_added)
        .fetch_optional(tx.conn()?)
        .await
        .map_err(|e| map_unique_violation(e, &ad.id))?;

        if inserted.is_none() {
            tx.rollback().await?;
            return Err(StoreError::Conflict(ad.id.clone()));
        }

        for (sort_order, tactic) in ad.why_it_worked.tactics.iter().enumerate() {
            sqlx::query(
                "INSERT INTO ad_tactics (ad_id, name, description, sort_order) VALUES ($1, $2, $3, $4)",
            )
            .bind(&ad.id)
            .bind(&tactic.name)
            .bind(&tactic.description)
            .bind(sort_order as i32)
            .execute(tx.conn()?)
            .await?;
        }

        for shot in &ad.shots {
            sqlx::query(
                r#"
                INSERT INTO ad_shots (
                    ad_id, shot_number, start_time, end_time, timestamp_label, shot_type,
                    thumbnail, description, transcript, text_overlay, purpose
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(&ad.id)
            .bind(shot.id as i32)
            .bind(shot.start_time)
            .bind(shot.end_time)
            .bind(&shot.timestamp)
            .bind(shot.shot_type.to_string())
            .bind(&shot.thumbnail)
            .bind(&shot.description)
            .bind(&shot.transcript)
            .bind(&shot.text_overlay)
            .bind(&shot.purpose)
            .execute(tx.conn()?)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            ad_id = %ad.id,
            tactics = ad.why_it_worked.tactics.len(),
            shots = ad.shots.len(),
            "Ad persisted"
        );

        Ok(ad.id.clone())
    }

    /// Get an ad with its tactics (by sort order) and shots (by shot number)
    #[tracing::instrument(skip(self), fields(db.table = "ads", db.operation = "select", db.record_id = %id))]
    pub async fn get_ad_by_id(&self, id: &str) -> Result<Option<Ad>, StoreError> {
        let row = sqlx::query_as::<Postgres, AdRow>(
            r#"
            SELECT id, title, video_src, source, creator, product, vertical, ad_type,
                   hook_text_overlay, hook_spoken, full_transcript, why_summary,
                   why_key_lesson, tags, date_added
            FROM ads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tactics = sqlx::query_as::<Postgres, TacticRow>(
            "SELECT name, description FROM ad_tactics WHERE ad_id = $1 ORDER BY sort_order ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|t| Tactic {
            name: t.name,
            description: t.description,
        })
        .collect();

        let shots = sqlx::query_as::<Postgres, ShotRow>(
            r#"
            SELECT shot_number, start_time, end_time, timestamp_label, shot_type, thumbnail,
                   description, transcript, text_overlay, purpose
            FROM ad_shots
            WHERE ad_id = $1
            ORDER BY shot_number ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|s| s.into_shot(id))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(row.into_ad(tactics, shots)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "ads", db.operation = "select", db.record_id = %id))]
    pub async fn ad_exists(&self, id: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<Postgres, bool>("SELECT EXISTS(SELECT 1 FROM ads WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Delete an ad; child rows go with it via ON DELETE CASCADE
    #[tracing::instrument(skip(self), fields(db.table = "ads", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_ad(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error, id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(id.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AdStore for AdRepository {
    async fn create_ad(&self, ad: &Ad) -> Result<String, StoreError> {
        AdRepository::create_ad(self, ad).await
    }

    async fn get_ad_by_id(&self, id: &str) -> Result<Option<Ad>, StoreError> {
        AdRepository::get_ad_by_id(self, id).await
    }

    async fn ad_exists(&self, id: &str) -> Result<bool, StoreError> {
        AdRepository::ad_exists(self, id).await
    }

    async fn delete_ad(&self, id: &str) -> Result<bool, StoreError> {
        AdRepository::delete_ad(self, id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        AdRepository::health_check(self).await
    }
}
