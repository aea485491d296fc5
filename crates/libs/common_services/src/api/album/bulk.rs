use crate::access::{AccessFilter, Permission, Principal};
use crate::api::album::error::AlbumError;
use crate::api::album::interfaces::{BulkIdErrorReason, BulkIdResponse};
use crate::database::MembershipStore;
use tracing::{debug, instrument};

/// Adds `asset_ids` to an album, one result per input id in input order.
///
/// Members already in the album, and ids repeated in the input, report
/// `duplicate`. Ids the principal may not share report `no_permission`.
/// Everything new is written in a single call.
#[instrument(skip(store, access, auth), fields(user_id = %auth.user_id))]
pub async fn add_assets(
    store: &dyn MembershipStore,
    access: &AccessFilter,
    auth: &Principal,
    album_id: &str,
    asset_ids: &[String],
) -> Result<Vec<BulkIdResponse>, AlbumError> {
    let mut existing = store.get_asset_ids(album_id, asset_ids).await?;
    let not_present: Vec<String> = asset_ids
        .iter()
        .filter(|id| !existing.contains(*id))
        .cloned()
        .collect();
    let allowed = access
        .filter(auth, Permission::AssetShare, &not_present)
        .await?;

    let mut results = Vec::with_capacity(asset_ids.len());
    let mut added = Vec::new();
    for asset_id in asset_ids {
        if existing.contains(asset_id) {
            results.push(BulkIdResponse::failed(asset_id, BulkIdErrorReason::Duplicate));
            continue;
        }
        if !allowed.contains(asset_id) {
            results.push(BulkIdResponse::failed(
                asset_id,
                BulkIdErrorReason::NoPermission,
            ));
            continue;
        }
        existing.insert(asset_id.clone());
        added.push(asset_id.clone());
        results.push(BulkIdResponse::ok(asset_id));
    }

    if !added.is_empty() {
        store.add_asset_ids(album_id, &added).await?;
    }
    debug!("Added {} of {} assets", added.len(), asset_ids.len());
    Ok(results)
}

/// Removes `asset_ids` from an album, one result per input id in input order.
///
/// Non-members report `not_found`. Holders of `can_always_remove` on the
/// album may remove any member; everyone else only assets they may share.
#[instrument(skip(store, access, auth), fields(user_id = %auth.user_id))]
pub async fn remove_assets(
    store: &dyn MembershipStore,
    access: &AccessFilter,
    auth: &Principal,
    album_id: &str,
    asset_ids: &[String],
    can_always_remove: Permission,
) -> Result<Vec<BulkIdResponse>, AlbumError> {
    let mut existing = store.get_asset_ids(album_id, asset_ids).await?;
    let always_allowed = !access
        .filter(auth, can_always_remove, &[album_id.to_owned()])
        .await?
        .is_empty();
    let allowed = if always_allowed {
        existing.clone()
    } else {
        let members: Vec<String> = existing.iter().cloned().collect();
        access
            .filter(auth, Permission::AssetShare, &members)
            .await?
    };

    let mut results = Vec::with_capacity(asset_ids.len());
    let mut removed = Vec::new();
    for asset_id in asset_ids {
        if !existing.contains(asset_id) {
            results.push(BulkIdResponse::failed(asset_id, BulkIdErrorReason::NotFound));
            continue;
        }
        if !allowed.contains(asset_id) {
            results.push(BulkIdResponse::failed(
                asset_id,
                BulkIdErrorReason::NoPermission,
            ));
            continue;
        }
        existing.remove(asset_id);
        removed.push(asset_id.clone());
        results.push(BulkIdResponse::ok(asset_id));
    }

    if !removed.is_empty() {
        store.remove_asset_ids(album_id, &removed).await?;
    }
    debug!("Removed {} of {} assets", removed.len(), asset_ids.len());
    Ok(results)
}
