//! Database record models.
//!
//! Each repository in [`crate::db::handlers`] accepts `*CreateDBRequest` / `*UpdateDBRequest`
//! values and returns `*DBResponse` values. These are kept separate from the API models so the
//! storage and wire representations can evolve independently; API models convert into requests
//! with `From`, and responses convert into API models the same way.

pub mod device_groups;
pub mod devices;
pub mod file_storage;
pub mod package_groups;
pub mod packages;
pub mod users;
