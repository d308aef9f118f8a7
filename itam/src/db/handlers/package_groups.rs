//! Database repository for package groups.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::package_groups::{PackageGroupCreateDBRequest, PackageGroupDBResponse, PackageGroupUpdateDBRequest},
};
use crate::types::PackageGroupId;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing package groups
#[derive(Debug, Clone)]
pub struct PackageGroupFilter {
    pub skip: i64,
    pub limit: i64,
}

impl PackageGroupFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

#[derive(Debug, Clone, FromRow)]
struct PackageGroup {
    pub id: PackageGroupId,
    pub label: String,
}

impl From<PackageGroup> for PackageGroupDBResponse {
    fn from(group: PackageGroup) -> Self {
        Self {
            id: group.id,
            label: group.label,
        }
    }
}

pub struct PackageGroups<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for PackageGroups<'c> {
    type CreateRequest = PackageGroupCreateDBRequest;
    type UpdateRequest = PackageGroupUpdateDBRequest;
    type Response = PackageGroupDBResponse;
    type Id = PackageGroupId;
    type Filter = PackageGroupFilter;

    #[instrument(skip(self, request), fields(label = %request.label), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, PackageGroup>("INSERT INTO package_groups (label) VALUES (?) RETURNING *")
            .bind(&request.label)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(PackageGroupDBResponse::from(group))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let group = sqlx::query_as::<_, PackageGroup>("SELECT * FROM package_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group.map(PackageGroupDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let groups = sqlx::query_as::<_, PackageGroup>("SELECT * FROM package_groups ORDER BY id LIMIT ? OFFSET ?")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups.into_iter().map(PackageGroupDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM package_groups WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, PackageGroup>("UPDATE package_groups SET label = COALESCE(?, label) WHERE id = ? RETURNING *")
            .bind(&request.label)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(PackageGroupDBResponse::from(group))
    }
}

impl<'c> PackageGroups<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}
