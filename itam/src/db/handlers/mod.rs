//! Repository implementations for database access.
//!
//! Each repository borrows a [`sqlx::SqliteConnection`] for its lifetime and implements the
//! [`Repository`] trait for typed CRUD operations. Callers pick the connection: a pooled one
//! for single statements, or a transaction when several writes must succeed together.
//!
//! ```ignore
//! use itam::db::handlers::{Devices, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let device = Devices::new(&mut conn).get_by_id(id).await?;
//! ```
//!
//! [`file_storage`] is the odd one out: it stores package files on disk, not in the database.

pub mod device_groups;
pub mod devices;
pub mod file_storage;
pub mod package_groups;
pub mod packages;
pub mod repository;
pub mod users;

pub use device_groups::DeviceGroups;
pub use devices::Devices;
pub use package_groups::PackageGroups;
pub use packages::Packages;
pub use repository::Repository;
pub use users::Users;
