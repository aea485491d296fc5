use crate::api_state::ApiContext;
use crate::routes::album::handlers::{
    add_assets_handler, add_assets_to_albums_handler, add_users_handler, create_album_handler,
    delete_album_handler, get_album_handler, get_album_statistics_handler, get_albums_handler,
    remove_assets_handler, remove_user_handler, update_album_handler, update_user_handler,
};
use axum::{
    Router,
    routing::{get, put},
};

pub fn album_protected_router() -> Router<ApiContext> {
    Router::new()
        .route(
            "/albums",
            get(get_albums_handler).post(create_album_handler),
        )
        .route("/albums/statistics", get(get_album_statistics_handler))
        .route("/albums/assets", put(add_assets_to_albums_handler))
        .route(
            "/albums/{album_id}",
            get(get_album_handler)
                .patch(update_album_handler)
                .delete(delete_album_handler),
        )
        .route(
            "/albums/{album_id}/assets",
            put(add_assets_handler).delete(remove_assets_handler),
        )
        .route("/albums/{album_id}/users", put(add_users_handler))
        .route(
            "/albums/{album_id}/user/{user_id}",
            put(update_user_handler).delete(remove_user_handler),
        )
}
