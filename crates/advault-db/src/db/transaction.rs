//! Database transaction utilities

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::StoreError;

/// A database transaction wrapper with explicit commit/rollback
///
/// Dropping the guard without committing rolls the transaction back (sqlx
/// does this when the connection returns to the pool) and logs a warning.
///
/// # Example
///
/// ```ignore
/// use advault_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), advault_db::StoreError> {
///     let mut tx = TransactionGuard::begin(pool).await?;
///     sqlx::query("INSERT INTO ...").execute(tx.conn()?).await?;
///     tx.commit().await?;
///     Ok(())
/// }
/// ```
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a new database transaction
    pub async fn begin(pool: &'a PgPool) -> Result<Self, StoreError> {
        let transaction = pool.begin().await?;

        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Connection to run statements on inside the transaction
    pub fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        self.transaction
            .as_mut()
            .map(|tx| &mut **tx)
            .ok_or_else(|| {
                StoreError::Unavailable("Transaction was already committed or rolled back".to_string())
            })
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl<'a> Drop for TransactionGuard<'a> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::warn!(
                "Transaction was dropped without explicit commit or rollback - rolling back"
            );
        }
    }
}
