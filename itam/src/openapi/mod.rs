//! OpenAPI documentation for the HTTP API.
//!
//! [`ApiDoc`] collects every handler's `#[utoipa::path]` annotation. The document is served as
//! JSON at `/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token from `POST /auth/login`. Include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "itam",
        description = "IT asset management: devices, packages, their groups, installer files and the users allowed to manage them."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::auth::register,
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::devices::list_devices,
        api::handlers::devices::create_device,
        api::handlers::devices::get_device,
        api::handlers::devices::update_device,
        api::handlers::devices::delete_device,
        api::handlers::devices::deploy_device,
        api::handlers::device_groups::list_device_groups,
        api::handlers::device_groups::create_device_group,
        api::handlers::device_groups::get_device_group,
        api::handlers::device_groups::update_device_group,
        api::handlers::device_groups::delete_device_group,
        api::handlers::packages::list_packages,
        api::handlers::packages::create_package,
        api::handlers::packages::get_package,
        api::handlers::packages::update_package,
        api::handlers::packages::delete_package,
        api::handlers::package_groups::list_package_groups,
        api::handlers::package_groups::create_package_group,
        api::handlers::package_groups::get_package_group,
        api::handlers::package_groups::update_package_group,
        api::handlers::package_groups::delete_package_group,
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
        api::handlers::files::download_file,
        api::handlers::files::delete_file,
    ),
    components(
        schemas(
            api::models::auth::LoginForm,
            api::models::auth::TokenResponse,
            api::models::auth::RegisterRequest,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
            api::models::devices::DeviceCreate,
            api::models::devices::DeviceUpdate,
            api::models::devices::DeviceResponse,
            api::models::device_groups::DeviceGroupCreate,
            api::models::device_groups::DeviceGroupUpdate,
            api::models::device_groups::DeviceGroupResponse,
            api::models::packages::PackageCreate,
            api::models::packages::PackageUpdate,
            api::models::packages::PackageResponse,
            api::models::package_groups::PackageGroupCreate,
            api::models::package_groups::PackageGroupUpdate,
            api::models::package_groups::PackageGroupResponse,
            api::models::files::FileResponse,
            api::models::deploy::DeploymentItem,
            api::models::deploy::DeploymentManifest,
            crate::types::Tier,
        )
    ),
    tags(
        (name = "authentication", description = "Obtain and inspect bearer tokens. Tokens expire and are checked against the live user record on every request."),
        (name = "users", description = "User accounts and their privilege tier (0 = admin, 1 = manager, 2 = operator, 3 = viewer)."),
        (name = "devices", description = "Managed devices and the packages deployed to them."),
        (name = "device-groups", description = "Groups of devices that packages can target together."),
        (name = "packages", description = "Installable software targeted at devices or device groups."),
        (name = "package-groups", description = "Named collections of packages."),
        (name = "files", description = "Installer files referenced by packages."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        for path in ["/auth/login", "/users/{id}", "/devices/{id}/deploy", "/files/{name}", "/packagegroups"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
