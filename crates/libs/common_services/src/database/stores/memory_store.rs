use crate::access::{AccessRepository, Permission};
use crate::database::DbError;
use crate::database::album::album::{
    Album, AlbumAssetCount, AlbumAssetPair, AlbumRow, AlbumUpdate, ContributorCount, NewAlbum,
};
use crate::database::album::album_user::{AlbumUser, AlbumUserGrant, AlbumUserRole};
use crate::database::app_user::{User, UserPreferences};
use crate::database::asset::Asset;
use crate::database::{MembershipStore, UserStore};
use crate::utils::nice_id;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    preferences: HashMap<String, UserPreferences>,
    assets: HashMap<String, Asset>,
    albums: HashMap<String, AlbumRow>,
    /// Member asset ids per album, in insertion order.
    album_assets: HashMap<String, Vec<String>>,
    album_users: Vec<AlbumUser>,
    shared_links: HashMap<String, Vec<String>>,
}

impl MemoryState {
    fn members(&self, album_id: &str) -> &[String] {
        self.album_assets.get(album_id).map_or(&[], Vec::as_slice)
    }

    fn is_shared(&self, album_id: &str) -> bool {
        self.album_users.iter().any(|u| u.album_id == album_id)
            || self
                .shared_links
                .get(album_id)
                .is_some_and(|links| !links.is_empty())
    }

    fn role_of(&self, album_id: &str, user_id: &str) -> Option<AlbumUserRole> {
        self.album_users
            .iter()
            .find(|u| u.album_id == album_id && u.user_id == user_id)
            .map(|u| u.role)
    }

    fn hydrate(&self, row: &AlbumRow, with_assets: bool) -> Album {
        let asset_ids = if with_assets {
            self.members(&row.id).to_vec()
        } else {
            Vec::new()
        };
        let album_users = self
            .album_users
            .iter()
            .filter(|u| u.album_id == row.id)
            .cloned()
            .collect();
        let shared_link_ids = self.shared_links.get(&row.id).cloned().unwrap_or_default();
        Album::from_row(row.clone(), asset_ids, album_users, shared_link_ids)
    }

    /// Hydrates matching albums, newest first.
    fn collect(&self, predicate: impl Fn(&AlbumRow) -> bool) -> Vec<Album> {
        let mut rows: Vec<&AlbumRow> = self.albums.values().filter(|row| predicate(row)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        rows.into_iter().map(|row| self.hydrate(row, false)).collect()
    }

    fn add_member(&mut self, album_id: &str, asset_id: &str) {
        let members = self.album_assets.entry(album_id.to_owned()).or_default();
        if !members.iter().any(|id| id == asset_id) {
            members.push(asset_id.to_owned());
        }
    }

    /// Newest member by file creation date, the repair target for a thumbnail.
    fn newest_member(&self, album_id: &str) -> Option<String> {
        self.members(album_id)
            .iter()
            .max_by_key(|id| self.assets.get(*id).map(|asset| asset.file_created_at))
            .cloned()
    }
}

/// A [`MembershipStore`], [`UserStore`] and [`AccessRepository`] kept entirely in memory.
///
/// Users and assets are seeded through the `insert_*` methods; everything
/// album related goes through the store traits.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    album_id_length: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(album_id_length: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            album_id_length,
        }
    }

    pub async fn insert_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.users.insert(user.id.clone(), user);
    }

    pub async fn set_preferences(&self, user_id: &str, preferences: UserPreferences) {
        let mut state = self.state.write().await;
        state.preferences.insert(user_id.to_owned(), preferences);
    }

    pub async fn insert_asset(&self, asset: Asset) {
        let mut state = self.state.write().await;
        state.assets.insert(asset.id.clone(), asset);
    }

    pub async fn insert_shared_link(&self, album_id: &str, link_id: &str) {
        let mut state = self.state.write().await;
        state
            .shared_links
            .entry(album_id.to_owned())
            .or_default()
            .push(link_id.to_owned());
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn get_by_id(
        &self,
        album_id: &str,
        with_assets: bool,
    ) -> Result<Option<Album>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .albums
            .get(album_id)
            .map(|row| state.hydrate(row, with_assets)))
    }

    async fn create(
        &self,
        album: NewAlbum,
        asset_ids: &[String],
        album_users: &[AlbumUserGrant],
    ) -> Result<Album, DbError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let row = AlbumRow {
            id: nice_id(self.album_id_length),
            owner_id: album.owner_id,
            album_name: album.album_name,
            description: album.description,
            asset_order: album.order,
            album_thumbnail_asset_id: album.album_thumbnail_asset_id,
            is_activity_enabled: true,
            created_at: now,
            updated_at: now,
        };

        for asset_id in asset_ids {
            state.add_member(&row.id, asset_id);
        }
        for grant in album_users {
            if state.role_of(&row.id, &grant.user_id).is_some() {
                return Err(DbError::UniqueViolation(format!(
                    "album_user ({}, {})",
                    row.id, grant.user_id
                )));
            }
            state.album_users.push(AlbumUser {
                album_id: row.id.clone(),
                user_id: grant.user_id.clone(),
                role: grant.role,
            });
        }

        let album = state.hydrate(&row, true);
        state.albums.insert(row.id.clone(), row);
        Ok(album)
    }

    async fn update(&self, album_id: &str, update: AlbumUpdate) -> Result<Album, DbError> {
        let mut state = self.state.write().await;
        let row = state
            .albums
            .get_mut(album_id)
            .ok_or_else(|| DbError::NotFound(format!("album {album_id}")))?;

        if let Some(album_name) = update.album_name {
            row.album_name = album_name;
        }
        if let Some(description) = update.description {
            row.description = description;
        }
        if let Some(thumbnail_id) = update.album_thumbnail_asset_id {
            row.album_thumbnail_asset_id = Some(thumbnail_id);
        }
        if let Some(is_activity_enabled) = update.is_activity_enabled {
            row.is_activity_enabled = is_activity_enabled;
        }
        if let Some(order) = update.order {
            row.asset_order = order;
        }
        row.updated_at = update.updated_at.unwrap_or_else(Utc::now);

        let row = row.clone();
        Ok(state.hydrate(&row, false))
    }

    async fn delete(&self, album_id: &str) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        state.albums.remove(album_id);
        state.album_assets.remove(album_id);
        state.shared_links.remove(album_id);
        state.album_users.retain(|u| u.album_id != album_id);
        Ok(())
    }

    async fn get_by_asset_id(&self, user_id: &str, asset_id: &str) -> Result<Vec<Album>, DbError> {
        let state = self.state.read().await;
        Ok(state.collect(|row| {
            (row.owner_id == user_id || state.role_of(&row.id, user_id).is_some())
                && state.members(&row.id).iter().any(|id| id == asset_id)
        }))
    }

    async fn get_owned(&self, owner_id: &str) -> Result<Vec<Album>, DbError> {
        let state = self.state.read().await;
        Ok(state.collect(|row| row.owner_id == owner_id))
    }

    async fn get_shared(&self, user_id: &str) -> Result<Vec<Album>, DbError> {
        let state = self.state.read().await;
        Ok(state.collect(|row| {
            (row.owner_id == user_id && state.is_shared(&row.id))
                || state.role_of(&row.id, user_id).is_some()
        }))
    }

    async fn get_not_shared(&self, owner_id: &str) -> Result<Vec<Album>, DbError> {
        let state = self.state.read().await;
        Ok(state.collect(|row| row.owner_id == owner_id && !state.is_shared(&row.id)))
    }

    async fn get_metadata_for_ids(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumAssetCount>, DbError> {
        let state = self.state.read().await;
        let metadata = album_ids
            .iter()
            .filter(|album_id| state.albums.contains_key(*album_id))
            .map(|album_id| {
                let assets: Vec<&Asset> = state
                    .members(album_id)
                    .iter()
                    .filter_map(|id| state.assets.get(id))
                    .collect();
                AlbumAssetCount {
                    album_id: album_id.clone(),
                    asset_count: state.members(album_id).len() as i64,
                    start_date: assets.iter().map(|a| a.file_created_at).min(),
                    end_date: assets.iter().map(|a| a.file_created_at).max(),
                    last_modified_asset_timestamp: assets.iter().map(|a| a.updated_at).max(),
                }
            })
            .collect();
        Ok(metadata)
    }

    async fn get_contributor_counts(
        &self,
        album_id: &str,
    ) -> Result<Vec<ContributorCount>, DbError> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for asset in state
            .members(album_id)
            .iter()
            .filter_map(|id| state.assets.get(id))
        {
            *counts.entry(asset.owner_id.as_str()).or_default() += 1;
        }

        let mut counts: Vec<ContributorCount> = counts
            .into_iter()
            .map(|(user_id, asset_count)| ContributorCount {
                user_id: user_id.to_owned(),
                asset_count,
            })
            .collect();
        counts.sort_by(|a, b| b.asset_count.cmp(&a.asset_count).then(a.user_id.cmp(&b.user_id)));
        Ok(counts)
    }

    async fn get_asset_ids(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<HashSet<String>, DbError> {
        let state = self.state.read().await;
        let members = state.members(album_id);
        Ok(asset_ids
            .iter()
            .filter(|id| members.contains(id))
            .cloned()
            .collect())
    }

    async fn add_asset_ids(&self, album_id: &str, asset_ids: &[String]) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        for asset_id in asset_ids {
            state.add_member(album_id, asset_id);
        }
        Ok(())
    }

    async fn remove_asset_ids(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        if let Some(members) = state.album_assets.get_mut(album_id) {
            members.retain(|id| !asset_ids.contains(id));
        }
        Ok(())
    }

    async fn add_asset_ids_to_albums(&self, values: &[AlbumAssetPair]) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        for pair in values {
            state.add_member(&pair.album_id, &pair.asset_id);
        }
        Ok(())
    }

    async fn update_thumbnails(&self) -> Result<u64, DbError> {
        let mut state = self.state.write().await;
        let stale: Vec<(String, Option<String>)> = state
            .albums
            .values()
            .filter(|row| {
                row.album_thumbnail_asset_id
                    .as_ref()
                    .is_none_or(|thumb| !state.members(&row.id).contains(thumb))
            })
            .map(|row| (row.id.clone(), state.newest_member(&row.id)))
            .filter(|(album_id, replacement)| {
                state
                    .albums
                    .get(album_id)
                    .is_some_and(|row| row.album_thumbnail_asset_id != *replacement)
            })
            .collect();

        for (album_id, replacement) in &stale {
            if let Some(row) = state.albums.get_mut(album_id) {
                row.album_thumbnail_asset_id.clone_from(replacement);
            }
        }
        Ok(stale.len() as u64)
    }

    async fn create_album_user(&self, album_user: &AlbumUser) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        if state
            .role_of(&album_user.album_id, &album_user.user_id)
            .is_some()
        {
            return Err(DbError::UniqueViolation(format!(
                "album_user ({}, {})",
                album_user.album_id, album_user.user_id
            )));
        }
        state.album_users.push(album_user.clone());
        Ok(())
    }

    async fn update_album_user(
        &self,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<bool, DbError> {
        let mut state = self.state.write().await;
        let entry = state
            .album_users
            .iter_mut()
            .find(|u| u.album_id == album_id && u.user_id == user_id);
        Ok(entry.map(|u| u.role = role).is_some())
    }

    async fn delete_album_user(&self, album_id: &str, user_id: &str) -> Result<bool, DbError> {
        let mut state = self.state.write().await;
        let before = state.album_users.len();
        state
            .album_users
            .retain(|u| !(u.album_id == album_id && u.user_id == user_id));
        Ok(state.album_users.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>, DbError> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).cloned())
    }

    async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences, DbError> {
        let state = self.state.read().await;
        Ok(state.preferences.get(user_id).copied().unwrap_or_default())
    }
}

#[async_trait]
impl AccessRepository for MemoryStore {
    async fn check_access(
        &self,
        user_id: &str,
        permission: Permission,
        ids: &HashSet<String>,
    ) -> Result<HashSet<String>, DbError> {
        let state = self.state.read().await;
        let allowed = ids.iter().filter(|id| match permission {
            Permission::AssetShare => state
                .assets
                .get(*id)
                .is_some_and(|asset| asset.owner_id == user_id),
            _ => state.albums.get(*id).is_some_and(|row| {
                if row.owner_id == user_id {
                    return true;
                }
                match state.role_of(&row.id, user_id) {
                    _ if permission.is_owner_only() => false,
                    Some(AlbumUserRole::Editor) => true,
                    Some(AlbumUserRole::Viewer) => permission == Permission::AlbumRead,
                    None => false,
                }
            }),
        });
        Ok(allowed.cloned().collect())
    }
}
