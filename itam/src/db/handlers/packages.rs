//! Database repository for packages.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::packages::{PackageCreateDBRequest, PackageDBResponse, PackageUpdateDBRequest},
};
use crate::types::{DeviceGroupId, DeviceId, PackageGroupId, PackageId};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

/// Filter for listing packages
#[derive(Debug, Clone)]
pub struct PackageFilter {
    pub skip: i64,
    pub limit: i64,
    pub device_id: Option<DeviceId>,
    pub group_id: Option<DeviceGroupId>,
    pub package_group_id: Option<PackageGroupId>,
}

impl PackageFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            device_id: None,
            group_id: None,
            package_group_id: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Package {
    pub id: PackageId,
    pub name: String,
    pub kind: String,
    pub os_supported: String,
    pub file: Option<String>,
    pub device_id: Option<DeviceId>,
    pub group_id: Option<DeviceGroupId>,
    pub package_group_id: Option<PackageGroupId>,
}

impl From<Package> for PackageDBResponse {
    fn from(package: Package) -> Self {
        Self {
            id: package.id,
            name: package.name,
            kind: package.kind,
            os_supported: package.os_supported,
            file: package.file,
            device_id: package.device_id,
            group_id: package.group_id,
            package_group_id: package.package_group_id,
        }
    }
}

pub struct Packages<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Packages<'c> {
    type CreateRequest = PackageCreateDBRequest;
    type UpdateRequest = PackageUpdateDBRequest;
    type Response = PackageDBResponse;
    type Id = PackageId;
    type Filter = PackageFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let package = sqlx::query_as::<_, Package>(
            r#"
            INSERT INTO packages (name, kind, os_supported, file, device_id, group_id, package_group_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.kind)
        .bind(&request.os_supported)
        .bind(&request.file)
        .bind(request.device_id)
        .bind(request.group_id)
        .bind(request.package_group_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(PackageDBResponse::from(package))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let package = sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(package.map(PackageDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM packages WHERE 1=1");

        if let Some(device_id) = filter.device_id {
            query.push(" AND device_id = ");
            query.push_bind(device_id);
        }
        if let Some(group_id) = filter.group_id {
            query.push(" AND group_id = ");
            query.push_bind(group_id);
        }
        if let Some(package_group_id) = filter.package_group_id {
            query.push(" AND package_group_id = ");
            query.push_bind(package_group_id);
        }

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let packages = query.build_query_as::<Package>().fetch_all(&mut *self.db).await?;

        Ok(packages.into_iter().map(PackageDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM packages WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let package = sqlx::query_as::<_, Package>(
            r#"
            UPDATE packages SET
                name = COALESCE(?, name),
                kind = COALESCE(?, kind),
                os_supported = COALESCE(?, os_supported),
                file = CASE WHEN ? THEN ? ELSE file END,
                device_id = CASE WHEN ? THEN ? ELSE device_id END,
                group_id = CASE WHEN ? THEN ? ELSE group_id END,
                package_group_id = CASE WHEN ? THEN ? ELSE package_group_id END
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.kind)
        .bind(&request.os_supported)
        .bind(request.file.is_some())
        .bind(request.file.clone().flatten())
        .bind(request.device_id.is_some())
        .bind(request.device_id.flatten())
        .bind(request.group_id.is_some())
        .bind(request.group_id.flatten())
        .bind(request.package_group_id.is_some())
        .bind(request.package_group_id.flatten())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(PackageDBResponse::from(package))
    }
}

impl<'c> Packages<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Packages to install on a device: those targeting it directly plus those targeting its group.
    #[instrument(skip(self), err)]
    pub async fn targeting_device(&mut self, device_id: DeviceId, group_id: Option<DeviceGroupId>) -> Result<Vec<PackageDBResponse>> {
        let packages = sqlx::query_as::<_, Package>(
            r#"
            SELECT * FROM packages
            WHERE device_id = ? OR (? IS NOT NULL AND group_id = ?)
            ORDER BY id
            "#,
        )
        .bind(device_id)
        .bind(group_id)
        .bind(group_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(packages.into_iter().map(PackageDBResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{DeviceGroups, Devices, PackageGroups};
    use crate::db::models::{
        device_groups::DeviceGroupCreateDBRequest, devices::DeviceCreateDBRequest, package_groups::PackageGroupCreateDBRequest,
    };
    use crate::test_utils::create_test_pool;

    fn package(name: &str) -> PackageCreateDBRequest {
        PackageCreateDBRequest {
            name: name.to_string(),
            kind: "msi".to_string(),
            os_supported: "windows".to_string(),
            file: Some(format!("{name}.msi")),
            device_id: None,
            group_id: None,
            package_group_id: None,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_targeting_device_includes_group_packages() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let lab = DeviceGroups::new(&mut conn)
            .create(&DeviceGroupCreateDBRequest { label: "Lab".to_string() })
            .await
            .unwrap();
        let other = DeviceGroups::new(&mut conn)
            .create(&DeviceGroupCreateDBRequest { label: "Office".to_string() })
            .await
            .unwrap();
        let pc = Devices::new(&mut conn)
            .create(&DeviceCreateDBRequest {
                name: "pc-01".to_string(),
                os: "windows".to_string(),
                group_id: Some(lab.id),
            })
            .await
            .unwrap();

        let mut repo = Packages::new(&mut conn);
        repo.create(&PackageCreateDBRequest {
            device_id: Some(pc.id),
            ..package("direct")
        })
        .await
        .unwrap();
        repo.create(&PackageCreateDBRequest {
            group_id: Some(lab.id),
            ..package("via-group")
        })
        .await
        .unwrap();
        repo.create(&PackageCreateDBRequest {
            group_id: Some(other.id),
            ..package("elsewhere")
        })
        .await
        .unwrap();
        repo.create(&package("untargeted")).await.unwrap();

        let names = |packages: Vec<PackageDBResponse>| packages.into_iter().map(|p| p.name).collect::<Vec<_>>();

        let targeted = repo.targeting_device(pc.id, Some(lab.id)).await.unwrap();
        assert_eq!(names(targeted), vec!["direct", "via-group"]);

        // Without a group only direct targeting applies
        let targeted = repo.targeting_device(pc.id, None).await.unwrap();
        assert_eq!(names(targeted), vec!["direct"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_update_clears_and_sets_references() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let bundle = PackageGroups::new(&mut conn)
            .create(&PackageGroupCreateDBRequest { label: "Office".to_string() })
            .await
            .unwrap();

        let mut repo = Packages::new(&mut conn);
        let created = repo.create(&package("word")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &PackageUpdateDBRequest {
                    file: Some(None),
                    package_group_id: Some(Some(bundle.id)),
                    kind: Some("exe".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.file, None);
        assert_eq!(updated.package_group_id, Some(bundle.id));
        assert_eq!(updated.kind, "exe");
        assert_eq!(updated.name, "word");
        assert_eq!(updated.os_supported, "windows");

        let listed = repo
            .list(&PackageFilter {
                package_group_id: Some(bundle.id),
                ..PackageFilter::new(0, 10)
            })
            .await
            .unwrap();
        assert_eq!(listed, vec![updated]);
    }

    #[test_log::test(tokio::test)]
    async fn test_dangling_reference_is_rejected() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Packages::new(&mut conn);

        let err = repo
            .create(&PackageCreateDBRequest {
                device_id: Some(12),
                ..package("orphan")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
