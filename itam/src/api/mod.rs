//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/auth/*`): Login, current user, registration
//! - **Users** (`/users/*`): Account management
//! - **Devices** (`/devices/*`, `/devicegroups/*`): Device inventory and deployment manifests
//! - **Packages** (`/packages/*`, `/packagegroups/*`): Package inventory
//! - **Files** (`/files/*`): Installer uploads served to devices
//!
//! All endpoints are documented with `utoipa`; the rendered reference is served at `/docs`.

pub mod handlers;
pub mod models;
