//! API request and response data models.
//!
//! These types define the public HTTP contract and are kept separate from the database models
//! in [`crate::db::models`], so the stored representation can change without breaking clients.
//! Everything here derives `utoipa::ToSchema` or `IntoParams` for the generated OpenAPI document.
//!
//! - [`auth`]: Login form, issued tokens and self-registration
//! - [`users`]: Accounts and the resolved [`users::CurrentUser`]
//! - [`devices`], [`device_groups`]: Device inventory
//! - [`packages`], [`package_groups`]: Package inventory
//! - [`files`]: Uploaded deployment files
//! - [`deploy`]: Per-device deployment manifests
//! - [`pagination`]: `skip`/`limit` query parameters shared by list endpoints

pub mod auth;
pub mod deploy;
pub mod device_groups;
pub mod devices;
pub mod files;
pub mod package_groups;
pub mod packages;
pub mod pagination;
pub mod users;
