use crate::routes::{album, root};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::health_check,
        // Album handlers
        album::handlers::get_albums_handler,
        album::handlers::create_album_handler,
        album::handlers::get_album_statistics_handler,
        album::handlers::add_assets_to_albums_handler,
        album::handlers::get_album_handler,
        album::handlers::update_album_handler,
        album::handlers::delete_album_handler,
        album::handlers::add_assets_handler,
        album::handlers::remove_assets_handler,
        album::handlers::add_users_handler,
        album::handlers::update_user_handler,
        album::handlers::remove_user_handler,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Album", description = "Albums, their assets and their collaborators"),
        (name = "System", description = "Health check"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
