use async_trait::async_trait;
use diesel::prelude::*;
use thiserror::Error;

use crate::db::PgPool;
use crate::models::AssignmentRecord;
use crate::schema::assignments;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("query timed out after {}s", .0.as_secs())]
    TimedOut(std::time::Duration),
    #[error("query task failed: {0}")]
    TaskFailed(String),
}

/// Read side of the relational assignment table.
#[async_trait]
pub trait AssignmentRepository: Send + Sync + 'static {
    async fn select_all_assignments(&self) -> Result<Vec<AssignmentRecord>, RepositoryError>;
}

pub struct DieselAssignmentRepository {
    pool: PgPool,
}

impl DieselAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn select_all_assignments(&self) -> Result<Vec<AssignmentRecord>, RepositoryError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| RepositoryError::Pool(err.to_string()))?;
            let rows = assignments::table
                .order(assignments::id.asc())
                .load::<AssignmentRecord>(&mut conn)?;
            Ok(rows)
        })
        .await
        .map_err(|err| RepositoryError::TaskFailed(err.to_string()))?
    }
}
