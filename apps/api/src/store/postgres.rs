//! PostgreSQL adapter. Every statement carries the owner predicate.
//!
//! `list` and `delete` are generic over the table descriptor. Insert and update
//! are per entity, since their column lists differ. Partial updates use
//! `COALESCE($n, column)`, so an absent patch field keeps the stored value.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::models::application::{JobApplicationPatch, NewJobApplication};
use crate::models::contact::{ContactPatch, NewContact};
use crate::models::cover_letter::{CoverLetterPatch, NewCoverLetter};
use crate::models::profile::{NewProfile, ProfilePatch, DEFAULT_ROLE};
use crate::models::skill::{NewSkill, SkillPatch};
use crate::models::{Contact, CoverLetter, JobApplication, Profile, Skill};
use crate::store::{Entity, EntityStore, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Per-entity SQL for the statements whose column lists differ.
#[async_trait]
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> {
    async fn insert_row(pool: &PgPool, id: Uuid, owner: Uuid, draft: &Self::Draft)
        -> sqlx::Result<Self>;

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &Self::Patch,
    ) -> sqlx::Result<Option<Self>>;
}

fn map_db_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            StoreError::Rejected(db.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl<E: PgEntity> EntityStore<E> for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<E>, StoreError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 ORDER BY created_at DESC",
            E::TABLE,
            E::OWNER_COLUMN
        );
        let rows = sqlx::query_as::<_, E>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        debug!("Listed {} {} for owner {owner}", rows.len(), E::PLURAL);
        Ok(rows)
    }

    async fn insert(&self, owner: Uuid, draft: E::Draft) -> Result<E, StoreError> {
        E::validate_draft(&draft).map_err(StoreError::Rejected)?;
        E::insert_row(&self.pool, E::new_id(owner), owner, &draft)
            .await
            .map_err(map_db_error)
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: E::Patch) -> Result<E, StoreError> {
        E::validate_patch(&patch).map_err(StoreError::Rejected)?;
        E::update_row(&self.pool, owner, id, &patch)
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND {} = $2",
            E::TABLE,
            E::OWNER_COLUMN
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PgEntity for JobApplication {
    async fn insert_row(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        draft: &NewJobApplication,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications
                (id, user_id, company_name, position_title, status,
                 application_date, job_url, salary_range, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.company_name)
        .bind(&draft.position_title)
        .bind(draft.status.as_str())
        .bind(draft.application_date)
        .bind(&draft.job_url)
        .bind(&draft.salary_range)
        .bind(&draft.location)
        .bind(&draft.notes)
        .fetch_one(pool)
        .await
    }

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &JobApplicationPatch,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications SET
                company_name     = COALESCE($3, company_name),
                position_title   = COALESCE($4, position_title),
                status           = COALESCE($5, status),
                application_date = COALESCE($6, application_date),
                job_url          = COALESCE($7, job_url),
                salary_range     = COALESCE($8, salary_range),
                location         = COALESCE($9, location),
                notes            = COALESCE($10, notes),
                updated_at       = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.company_name)
        .bind(&patch.position_title)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.application_date)
        .bind(&patch.job_url)
        .bind(&patch.salary_range)
        .bind(&patch.location)
        .bind(&patch.notes)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl PgEntity for Contact {
    async fn insert_row(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        draft: &NewContact,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts
                (id, user_id, name, email, phone, company, position,
                 linkedin_url, notes, connection_strength, last_contact_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.company)
        .bind(&draft.position)
        .bind(&draft.linkedin_url)
        .bind(&draft.notes)
        .bind(draft.connection_strength.as_str())
        .bind(draft.last_contact_date)
        .fetch_one(pool)
        .await
    }

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &ContactPatch,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                name                = COALESCE($3, name),
                email               = COALESCE($4, email),
                phone               = COALESCE($5, phone),
                company             = COALESCE($6, company),
                position            = COALESCE($7, position),
                linkedin_url        = COALESCE($8, linkedin_url),
                notes               = COALESCE($9, notes),
                connection_strength = COALESCE($10, connection_strength),
                last_contact_date   = COALESCE($11, last_contact_date),
                updated_at          = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.company)
        .bind(&patch.position)
        .bind(&patch.linkedin_url)
        .bind(&patch.notes)
        .bind(patch.connection_strength.map(|s| s.as_str()))
        .bind(patch.last_contact_date)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl PgEntity for Skill {
    async fn insert_row(pool: &PgPool, id: Uuid, owner: Uuid, draft: &NewSkill) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (id, user_id, name, category, proficiency_level, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.name)
        .bind(&draft.category)
        .bind(draft.proficiency_level)
        .bind(&draft.notes)
        .fetch_one(pool)
        .await
    }

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &SkillPatch,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills SET
                name              = COALESCE($3, name),
                category          = COALESCE($4, category),
                proficiency_level = COALESCE($5, proficiency_level),
                notes             = COALESCE($6, notes),
                updated_at        = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.name)
        .bind(&patch.category)
        .bind(patch.proficiency_level)
        .bind(&patch.notes)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl PgEntity for CoverLetter {
    async fn insert_row(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        draft: &NewCoverLetter,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, CoverLetter>(
            r#"
            INSERT INTO cover_letters
                (id, user_id, title, company_name, position_title, content,
                 job_description, tone, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.company_name)
        .bind(&draft.position_title)
        .bind(&draft.content)
        .bind(&draft.job_description)
        .bind(&draft.tone)
        .bind(&draft.status)
        .fetch_one(pool)
        .await
    }

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &CoverLetterPatch,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, CoverLetter>(
            r#"
            UPDATE cover_letters SET
                title      = COALESCE($3, title),
                content    = COALESCE($4, content),
                tone       = COALESCE($5, tone),
                status     = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(&patch.tone)
        .bind(&patch.status)
        .fetch_optional(pool)
        .await
    }
}

#[async_trait]
impl PgEntity for Profile {
    async fn insert_row(
        pool: &PgPool,
        id: Uuid,
        _owner: Uuid,
        draft: &NewProfile,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&draft.email)
        .bind(&draft.full_name)
        .bind(DEFAULT_ROLE)
        .fetch_one(pool)
        .await
    }

    async fn update_row(
        pool: &PgPool,
        owner: Uuid,
        id: Uuid,
        patch: &ProfilePatch,
    ) -> sqlx::Result<Option<Self>> {
        // A profile's id is its owner; both predicates must name the same row.
        if id != owner {
            return Ok(None);
        }
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                email      = COALESCE($2, email),
                full_name  = COALESCE($3, full_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(&patch.email)
        .bind(&patch.full_name)
        .fetch_optional(pool)
        .await
    }
}
