//! HTTP request handlers for all API endpoints.
//!
//! Handlers are organized by resource. Each one declares the tier it needs through its
//! [`RequiresTier`](crate::auth::current_user::RequiresTier) extractor, so authentication and
//! authorization have already happened by the time the handler body runs. Bodies then talk to
//! the repositories in [`crate::db::handlers`] and convert the results into API models.
//!
//! - [`auth`]: Login, current user and self-registration
//! - [`users`]: User administration (admin only, except reading and re-passwording oneself)
//! - [`devices`]: Device inventory and per-device deployment manifests
//! - [`device_groups`], [`package_groups`]: Grouping of devices and packages
//! - [`packages`]: Package inventory
//! - [`files`]: Upload, download and removal of installer files
//!
//! Handlers return [`crate::errors::Error`], which renders the status code and a user-safe body.

pub mod auth;
pub mod device_groups;
pub mod devices;
pub mod files;
pub mod package_groups;
pub mod packages;
pub mod users;
