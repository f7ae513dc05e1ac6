use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{Lead, LeadDocument};
use crate::store::LeadStore;

/// Partial unique index on `data ->> 'email'` for live rows.
pub const ACTIVE_EMAIL_CONSTRAINT: &str = "leads_active_email_key";

fn is_email_constraint(constraint: Option<&str>) -> bool {
    constraint == Some(ACTIVE_EMAIL_CONSTRAINT)
}

/// Postgres adapter for the `leads` table.
///
/// All statements are parameterized; the email lookup reads the JSONB
/// `data ->> 'email'` path, which the partial unique index
/// `leads_active_email_key` also covers.
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_lead_row(row: PgRow) -> Result<Lead, sqlx::Error> {
        let data: Json<LeadDocument> = row.try_get("data")?;
        Ok(Lead {
            id: row.try_get("id")?,
            data: data.0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_date: row.try_get("deleted_date")?,
        })
    }

    /// Maps a violation of the live-email index to `EmailAlreadyExists`;
    /// this is what catches two concurrent creates that both passed the
    /// count check. Other constraint failures stay database errors.
    fn map_write_error(err: sqlx::Error, email: Option<&str>) -> AppError {
        match err {
            sqlx::Error::Database(ref db)
                if db.is_unique_violation() && is_email_constraint(db.constraint()) =>
            {
                tracing::warn!("Email is taken (unique index) -> {:?}", email);
                AppError::EmailAlreadyExists(email.unwrap_or_default().to_string())
            }
            other => AppError::DatabaseError(other),
        }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn find_all(&self) -> Result<Vec<Lead>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, data, created_at, updated_at, deleted_date
            FROM leads
            WHERE deleted_date IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list leads")?;

        rows.into_iter()
            .map(Self::map_lead_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode lead rows")
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, data, created_at, updated_at, deleted_date
            FROM leads
            WHERE id = $1 AND deleted_date IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load lead {}", id))?;

        row.map(Self::map_lead_row)
            .transpose()
            .with_context(|| format!("Failed to decode lead {}", id))
    }

    async fn create(&self, lead: Lead) -> Result<Lead, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO leads (id, data, created_at, updated_at, deleted_date)
            VALUES ($1, $2, $3, $4, NULL)
            RETURNING id, data, created_at, updated_at, deleted_date
            "#,
        )
        .bind(lead.id)
        .bind(Json(&lead.data))
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, lead.email()))?;

        Self::map_lead_row(row).context("Failed to decode inserted lead")
    }

    async fn save(&self, lead: Lead) -> Result<Lead, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE leads
            SET data = $2,
                updated_at = now()
            WHERE id = $1 AND deleted_date IS NULL
            RETURNING id, data, created_at, updated_at, deleted_date
            "#,
        )
        .bind(lead.id)
        .bind(Json(&lead.data))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, lead.email()))?
        .ok_or(AppError::LeadNotFound(lead.id))?;

        Self::map_lead_row(row).context("Failed to decode updated lead")
    }

    async fn merge_data(
        &self,
        id: Uuid,
        incoming: &LeadDocument,
    ) -> Result<Option<Lead>, AppError> {
        // jsonb `||` lets the right-hand side win, so stored keys keep
        // precedence; the row lock of the UPDATE serializes concurrent merges.
        let row = sqlx::query(
            r#"
            UPDATE leads
            SET data = $2::jsonb || data,
                updated_at = now()
            WHERE id = $1 AND deleted_date IS NULL
            RETURNING id, data, created_at, updated_at, deleted_date
            "#,
        )
        .bind(id)
        .bind(Json(incoming))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Self::map_write_error(e, incoming.get("email").and_then(|v| v.as_str()))
        })?;

        row.map(Self::map_lead_row)
            .transpose()
            .with_context(|| format!("Failed to decode merged lead {}", id))
    }

    async fn count_active_by_email(&self, email: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leads
            WHERE data ->> 'email' = $1
              AND deleted_date IS NULL
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count leads by email")
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET deleted_date = now(),
                updated_at = now()
            WHERE id = $1 AND deleted_date IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to soft-delete lead {}", id))?;

        Ok(result.rows_affected() > 0)
    }
}
