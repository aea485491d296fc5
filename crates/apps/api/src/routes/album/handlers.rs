use crate::api_state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common_services::access::Principal;
use common_services::api::album::error::AlbumError;
use common_services::api::album::interfaces::{
    AddUsersRequest, AlbumInfoParams, AlbumResponse, AlbumStatisticsResponse,
    AlbumsAddAssetsRequest, AlbumsAddAssetsResponse, BulkIdResponse, BulkIdsRequest,
    CreateAlbumRequest, GetAlbumsParams, UpdateAlbumRequest, UpdateAlbumUserRequest,
};
use tracing::info;

/// List albums visible to the current user.
///
/// Without filters this returns the albums the user owns. `shared` switches to
/// shared or unshared albums, `assetId` to albums containing that asset.
#[utoipa::path(
    get,
    path = "/albums",
    tag = "Album",
    params(GetAlbumsParams),
    responses(
        (status = 200, description = "Matching albums with their live roster.", body = Vec<AlbumResponse>),
        (status = 502, description = "The sharing authority could not be reached."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_albums_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Query(params): Query<GetAlbumsParams>,
) -> Result<Json<Vec<AlbumResponse>>, AlbumError> {
    let albums = context.album_service.get_all(&auth, &params).await?;
    Ok(Json(albums))
}

/// Create a new album owned by the current user.
#[utoipa::path(
    post,
    path = "/albums",
    tag = "Album",
    request_body = CreateAlbumRequest,
    responses(
        (status = 201, description = "Album created successfully.", body = AlbumResponse),
        (status = 400, description = "The album cannot be shared with its owner."),
        (status = 404, description = "A listed user does not exist."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_album_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Json(payload): Json<CreateAlbumRequest>,
) -> Result<(StatusCode, Json<AlbumResponse>), AlbumError> {
    info!("Create album handler {:?}", payload.album_name);
    let album = context.album_service.create(&auth, payload).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// Count the albums the current user owns, shares and keeps private.
#[utoipa::path(
    get,
    path = "/albums/statistics",
    tag = "Album",
    responses(
        (status = 200, description = "Album counts.", body = AlbumStatisticsResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_album_statistics_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
) -> Result<Json<AlbumStatisticsResponse>, AlbumError> {
    let statistics = context.album_service.get_statistics(&auth).await?;
    Ok(Json(statistics))
}

/// Add the same assets to several albums at once.
#[utoipa::path(
    put,
    path = "/albums/assets",
    tag = "Album",
    request_body = AlbumsAddAssetsRequest,
    responses(
        (status = 200, description = "Aggregate result over all albums.", body = AlbumsAddAssetsResponse),
        (status = 403, description = "The user is not the original owner of every album."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_assets_to_albums_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Json(payload): Json<AlbumsAddAssetsRequest>,
) -> Result<Json<AlbumsAddAssetsResponse>, AlbumError> {
    let response = context
        .album_service
        .add_assets_to_albums(&auth, &payload)
        .await?;
    Ok(Json(response))
}

/// Get a single album.
#[utoipa::path(
    get,
    path = "/albums/{album_id}",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album."),
        AlbumInfoParams,
    ),
    responses(
        (status = 200, description = "The album with its live roster.", body = AlbumResponse),
        (status = 403, description = "The user may not read this album."),
        (status = 404, description = "Album not found."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_album_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
    Query(params): Query<AlbumInfoParams>,
) -> Result<Json<AlbumResponse>, AlbumError> {
    let album = context
        .album_service
        .get(&auth, &album_id, params.without_assets.unwrap_or(false))
        .await?;
    Ok(Json(album))
}

/// Update an album's details.
///
/// Only fields present in the body change. A new thumbnail must already be in
/// the album.
#[utoipa::path(
    patch,
    path = "/albums/{album_id}",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album to update.")
    ),
    request_body = UpdateAlbumRequest,
    responses(
        (status = 200, description = "Album updated successfully.", body = AlbumResponse),
        (status = 400, description = "The thumbnail is not part of the album."),
        (status = 403, description = "The user may not update this album."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_album_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
    Json(payload): Json<UpdateAlbumRequest>,
) -> Result<Json<AlbumResponse>, AlbumError> {
    let album = context
        .album_service
        .update(&auth, &album_id, payload)
        .await?;
    Ok(Json(album))
}

/// Delete an album. Only the owner may do this.
#[utoipa::path(
    delete,
    path = "/albums/{album_id}",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album to delete.")
    ),
    responses(
        (status = 204, description = "Album deleted."),
        (status = 403, description = "The user may not delete this album."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_album_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
) -> Result<StatusCode, AlbumError> {
    context.album_service.delete(&auth, &album_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add assets to an album, reporting a result per asset id.
#[utoipa::path(
    put,
    path = "/albums/{album_id}/assets",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album.")
    ),
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "One result per requested id.", body = Vec<BulkIdResponse>),
        (status = 403, description = "The user may not add assets to this album."),
        (status = 404, description = "Album not found."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_assets_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
    Json(payload): Json<BulkIdsRequest>,
) -> Result<Json<Vec<BulkIdResponse>>, AlbumError> {
    let results = context
        .album_service
        .add_assets(&auth, &album_id, &payload.ids)
        .await?;
    Ok(Json(results))
}

/// Remove assets from an album, reporting a result per asset id.
#[utoipa::path(
    delete,
    path = "/albums/{album_id}/assets",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album.")
    ),
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "One result per requested id.", body = Vec<BulkIdResponse>),
        (status = 403, description = "The user may not remove assets from this album."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_assets_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
    Json(payload): Json<BulkIdsRequest>,
) -> Result<Json<Vec<BulkIdResponse>>, AlbumError> {
    let results = context
        .album_service
        .remove_assets(&auth, &album_id, &payload.ids)
        .await?;
    Ok(Json(results))
}

/// Share an album with more users.
#[utoipa::path(
    put,
    path = "/albums/{album_id}/users",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album.")
    ),
    request_body = AddUsersRequest,
    responses(
        (status = 200, description = "The album with its updated roster.", body = AlbumResponse),
        (status = 400, description = "The album cannot be shared with its owner."),
        (status = 409, description = "The user was already added."),
        (status = 502, description = "The sharing authority rejected the share."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_users_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path(album_id): Path<String>,
    Json(payload): Json<AddUsersRequest>,
) -> Result<Json<AlbumResponse>, AlbumError> {
    let album = context
        .album_service
        .add_users(&auth, &album_id, &payload)
        .await?;
    Ok(Json(album))
}

/// Change a collaborator's role.
#[utoipa::path(
    put,
    path = "/albums/{album_id}/user/{user_id}",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album."),
        ("user_id" = String, Path, description = "The collaborator to update."),
    ),
    request_body = UpdateAlbumUserRequest,
    responses(
        (status = 204, description = "Role updated."),
        (status = 404, description = "Album not shared with user."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path((album_id, user_id)): Path<(String, String)>,
    Json(payload): Json<UpdateAlbumUserRequest>,
) -> Result<StatusCode, AlbumError> {
    context
        .album_service
        .update_user(&auth, &album_id, &user_id, payload.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a collaborator from an album. `me` removes the current user.
#[utoipa::path(
    delete,
    path = "/albums/{album_id}/user/{user_id}",
    tag = "Album",
    params(
        ("album_id" = String, Path, description = "The unique ID of the album."),
        ("user_id" = String, Path, description = "The collaborator to remove, or `me`."),
    ),
    responses(
        (status = 204, description = "Collaborator removed."),
        (status = 400, description = "The album owner cannot be removed."),
        (status = 403, description = "The user may not remove other collaborators."),
        (status = 502, description = "The sharing authority rejected the removal."),
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_user_handler(
    State(context): State<ApiContext>,
    Extension(auth): Extension<Principal>,
    Path((album_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AlbumError> {
    context
        .album_service
        .remove_user(&auth, &album_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
