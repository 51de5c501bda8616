//! Postgres-backed sheet store.
//!
//! `sheets` holds one header per table, `sheet_rows` the data rows keyed by
//! `(sheet, row_index)`. Appends compute the next index inside the same
//! transaction as the inserts; two concurrent appends to one sheet collide on
//! the primary key instead of overwriting each other.

use async_trait::async_trait;
use ordersheet_core::{Sheet, Table};
use sqlx::PgPool;

use crate::store::{check_widths, AppendOutcome, TableStore};
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct PgSheetStore {
    pool: PgPool,
}

impl PgSheetStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts the canonical header of every table that has none yet.
    ///
    /// Returns the number of headers created. Existing headers are left as
    /// they are, even when they differ from the canonical layout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if any insert fails; the whole batch is
    /// rolled back.
    pub async fn ensure_headers(&self) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0usize;

        for table in Table::ALL {
            let result = sqlx::query(
                "INSERT INTO sheets (name, columns) VALUES ($1, $2) \
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(table.sheet_name())
            .bind(canonical_columns(table))
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                created += 1;
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Names of every sheet present in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn list_sheets(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM sheets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}

fn canonical_columns(table: Table) -> Vec<String> {
    table.columns().iter().map(|c| (*c).to_string()).collect()
}

#[async_trait]
impl TableStore for PgSheetStore {
    async fn read_table(&self, table: Table) -> Result<Sheet, StoreError> {
        let columns: Option<Vec<String>> =
            sqlx::query_scalar("SELECT columns FROM sheets WHERE name = $1")
                .bind(table.sheet_name())
                .fetch_optional(&self.pool)
                .await?;

        let Some(columns) = columns else {
            return Ok(Sheet::for_table(table));
        };

        let rows: Vec<Vec<String>> = sqlx::query_scalar(
            "SELECT cells FROM sheet_rows WHERE sheet = $1 ORDER BY row_index",
        )
        .bind(table.sheet_name())
        .fetch_all(&self.pool)
        .await?;

        Ok(Sheet::new(columns).with_rows(rows))
    }

    async fn append_rows(
        &self,
        table: Table,
        rows: &[Vec<String>],
    ) -> Result<AppendOutcome, StoreError> {
        if rows.is_empty() {
            return Ok(AppendOutcome::NothingToDo);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sheets (name, columns) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(table.sheet_name())
        .bind(canonical_columns(table))
        .execute(&mut *tx)
        .await?;

        let header_len: i32 = sqlx::query_scalar(
            "SELECT COALESCE(array_length(columns, 1), 0) FROM sheets WHERE name = $1",
        )
        .bind(table.sheet_name())
        .fetch_one(&mut *tx)
        .await?;
        check_widths(table, usize::try_from(header_len).unwrap_or(0), rows)?;

        let last_index: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(row_index), 0) FROM sheet_rows WHERE sheet = $1",
        )
        .bind(table.sheet_name())
        .fetch_one(&mut *tx)
        .await?;

        let mut next_index = last_index;
        for row in rows {
            next_index += 1;
            sqlx::query("INSERT INTO sheet_rows (sheet, row_index, cells) VALUES ($1, $2, $3)")
                .bind(table.sheet_name())
                .bind(next_index)
                .bind(row)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            table = %table,
            first_row = last_index + 1,
            rows = rows.len(),
            "appended rows"
        );

        Ok(AppendOutcome::Appended {
            first_row: usize::try_from(last_index + 1).unwrap_or(usize::MAX),
            rows: rows.len(),
        })
    }
}
