//! Database repository for device groups.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::device_groups::{DeviceGroupCreateDBRequest, DeviceGroupDBResponse, DeviceGroupUpdateDBRequest},
};
use crate::types::DeviceGroupId;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing device groups
#[derive(Debug, Clone)]
pub struct DeviceGroupFilter {
    pub skip: i64,
    pub limit: i64,
}

impl DeviceGroupFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

#[derive(Debug, Clone, FromRow)]
struct DeviceGroup {
    pub id: DeviceGroupId,
    pub label: String,
}

impl From<DeviceGroup> for DeviceGroupDBResponse {
    fn from(group: DeviceGroup) -> Self {
        Self {
            id: group.id,
            label: group.label,
        }
    }
}

pub struct DeviceGroups<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for DeviceGroups<'c> {
    type CreateRequest = DeviceGroupCreateDBRequest;
    type UpdateRequest = DeviceGroupUpdateDBRequest;
    type Response = DeviceGroupDBResponse;
    type Id = DeviceGroupId;
    type Filter = DeviceGroupFilter;

    #[instrument(skip(self, request), fields(label = %request.label), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, DeviceGroup>("INSERT INTO device_groups (label) VALUES (?) RETURNING *")
            .bind(&request.label)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(DeviceGroupDBResponse::from(group))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let group = sqlx::query_as::<_, DeviceGroup>("SELECT * FROM device_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(group.map(DeviceGroupDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let groups = sqlx::query_as::<_, DeviceGroup>("SELECT * FROM device_groups ORDER BY id LIMIT ? OFFSET ?")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(groups.into_iter().map(DeviceGroupDBResponse::from).collect())
    }

    /// Devices and packages targeting the group are detached, not deleted.
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM device_groups WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let group = sqlx::query_as::<_, DeviceGroup>("UPDATE device_groups SET label = COALESCE(?, label) WHERE id = ? RETURNING *")
            .bind(&request.label)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(DeviceGroupDBResponse::from(group))
    }
}

impl<'c> DeviceGroups<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Devices;
    use crate::db::models::devices::DeviceCreateDBRequest;
    use crate::test_utils::create_test_pool;

    #[test_log::test(tokio::test)]
    async fn test_crud_roundtrip() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DeviceGroups::new(&mut conn);

        let group = repo
            .create(&DeviceGroupCreateDBRequest {
                label: "Classroom A".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(group.label, "Classroom A");

        let renamed = repo
            .update(
                group.id,
                &DeviceGroupUpdateDBRequest {
                    label: Some("Classroom B".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.label, "Classroom B");

        let unchanged = repo.update(group.id, &DeviceGroupUpdateDBRequest { label: None }).await.unwrap();
        assert_eq!(unchanged.label, "Classroom B");

        assert!(repo.delete(group.id).await.unwrap());
        assert!(repo.get_by_id(group.id).await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_detaches_member_devices() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let group = DeviceGroups::new(&mut conn)
            .create(&DeviceGroupCreateDBRequest {
                label: "Lab".to_string(),
            })
            .await
            .unwrap();
        let device = Devices::new(&mut conn)
            .create(&DeviceCreateDBRequest {
                name: "pc-01".to_string(),
                os: "linux".to_string(),
                group_id: Some(group.id),
            })
            .await
            .unwrap();

        DeviceGroups::new(&mut conn).delete(group.id).await.unwrap();

        let device = Devices::new(&mut conn).get_by_id(device.id).await.unwrap().unwrap();
        assert_eq!(device.group_id, None);
    }
}
