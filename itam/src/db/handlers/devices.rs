//! Database repository for devices.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::devices::{DeviceCreateDBRequest, DeviceDBResponse, DeviceUpdateDBRequest},
};
use crate::types::{DeviceGroupId, DeviceId};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

/// Filter for listing devices
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    pub skip: i64,
    pub limit: i64,
    pub group_id: Option<DeviceGroupId>,
}

impl DeviceFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, group_id: None }
    }

    pub fn with_group(mut self, group_id: DeviceGroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Device {
    pub id: DeviceId,
    pub name: String,
    pub os: String,
    pub group_id: Option<DeviceGroupId>,
}

impl From<Device> for DeviceDBResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            os: device.os,
            group_id: device.group_id,
        }
    }
}

pub struct Devices<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Devices<'c> {
    type CreateRequest = DeviceCreateDBRequest;
    type UpdateRequest = DeviceUpdateDBRequest;
    type Response = DeviceDBResponse;
    type Id = DeviceId;
    type Filter = DeviceFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, Device>("INSERT INTO devices (name, os, group_id) VALUES (?, ?, ?) RETURNING *")
            .bind(&request.name)
            .bind(&request.os)
            .bind(request.group_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(DeviceDBResponse::from(device))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(device.map(DeviceDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM devices WHERE 1=1");

        if let Some(group_id) = filter.group_id {
            query.push(" AND group_id = ");
            query.push_bind(group_id);
        }

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let devices = query.build_query_as::<Device>().fetch_all(&mut *self.db).await?;

        Ok(devices.into_iter().map(DeviceDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            UPDATE devices SET
                name = COALESCE(?, name),
                os = COALESCE(?, os),
                group_id = CASE WHEN ? THEN ? ELSE group_id END
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.os)
        .bind(request.group_id.is_some())
        .bind(request.group_id.flatten())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(DeviceDBResponse::from(device))
    }
}

impl<'c> Devices<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::DeviceGroups;
    use crate::db::models::device_groups::DeviceGroupCreateDBRequest;
    use crate::test_utils::create_test_pool;

    fn device(name: &str, group_id: Option<DeviceGroupId>) -> DeviceCreateDBRequest {
        DeviceCreateDBRequest {
            name: name.to_string(),
            os: "windows".to_string(),
            group_id,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_group_is_foreign_key_violation() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Devices::new(&mut conn);

        let err = repo.create(&device("pc-01", Some(999))).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_group_membership() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let group = DeviceGroups::new(&mut conn)
            .create(&DeviceGroupCreateDBRequest { label: "Lab".to_string() })
            .await
            .unwrap();

        let mut repo = Devices::new(&mut conn);
        let created = repo.create(&device("pc-01", None)).await.unwrap();

        // Attach
        let attached = repo
            .update(
                created.id,
                &DeviceUpdateDBRequest {
                    group_id: Some(Some(group.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(attached.group_id, Some(group.id));

        // Untouched when omitted
        let renamed = repo
            .update(
                created.id,
                &DeviceUpdateDBRequest {
                    name: Some("pc-02".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "pc-02");
        assert_eq!(renamed.group_id, Some(group.id));

        // Detach
        let detached = repo
            .update(
                created.id,
                &DeviceUpdateDBRequest {
                    group_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(detached.group_id, None);
        assert_eq!(detached.os, "windows");
    }

    #[test_log::test(tokio::test)]
    async fn test_list_filters_by_group() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let group = DeviceGroups::new(&mut conn)
            .create(&DeviceGroupCreateDBRequest { label: "Lab".to_string() })
            .await
            .unwrap();

        let mut repo = Devices::new(&mut conn);
        repo.create(&device("in-1", Some(group.id))).await.unwrap();
        repo.create(&device("out", None)).await.unwrap();
        repo.create(&device("in-2", Some(group.id))).await.unwrap();

        let all = repo.list(&DeviceFilter::new(0, 10)).await.unwrap();
        assert_eq!(all.len(), 3);

        let members = repo.list(&DeviceFilter::new(0, 10).with_group(group.id)).await.unwrap();
        assert_eq!(members.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["in-1", "in-2"]);
    }
}
