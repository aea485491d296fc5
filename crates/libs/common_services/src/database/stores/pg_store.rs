use crate::access::{AccessRepository, Permission};
use crate::database::DbError;
use crate::database::album::album::{
    Album, AlbumAssetCount, AlbumAssetPair, AlbumRow, AlbumUpdate, ContributorCount, NewAlbum,
};
use crate::database::album::album_user::{AlbumUser, AlbumUserGrant, AlbumUserRole};
use crate::database::app_user::{User, UserPreferences};
use crate::database::{MembershipStore, UserStore};
use crate::utils::nice_id;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::{HashMap, HashSet};

const ALBUM_COLUMNS: &str = "a.id, a.owner_id, a.album_name, a.description, a.asset_order, \
     a.album_thumbnail_asset_id, a.is_activity_enabled, a.created_at, a.updated_at";

#[derive(FromRow)]
struct SharedLinkRow {
    id: String,
    album_id: String,
}

#[derive(FromRow)]
struct AlbumAssetRow {
    album_id: String,
    asset_id: String,
}

/// Postgres-backed stores. One pool serves albums, users and access checks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    album_id_length: usize,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool, album_id_length: usize) -> Self {
        Self {
            pool,
            album_id_length,
        }
    }

    /// Attaches collaborators, share links and optionally member assets to album rows.
    async fn hydrate(&self, rows: Vec<AlbumRow>, with_assets: bool) -> Result<Vec<Album>, DbError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let album_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

        let album_users = sqlx::query_as::<_, AlbumUser>(
            "SELECT album_id, user_id, role FROM album_user WHERE album_id = ANY($1) ORDER BY user_id",
        )
        .bind(&album_ids)
        .fetch_all(&self.pool)
        .await?;
        let mut users_by_album: HashMap<String, Vec<AlbumUser>> = HashMap::new();
        for album_user in album_users {
            users_by_album
                .entry(album_user.album_id.clone())
                .or_default()
                .push(album_user);
        }

        let links = sqlx::query_as::<_, SharedLinkRow>(
            "SELECT id, album_id FROM shared_link WHERE album_id = ANY($1) ORDER BY created_at",
        )
        .bind(&album_ids)
        .fetch_all(&self.pool)
        .await?;
        let mut links_by_album: HashMap<String, Vec<String>> = HashMap::new();
        for link in links {
            links_by_album.entry(link.album_id).or_default().push(link.id);
        }

        let mut assets_by_album: HashMap<String, Vec<String>> = HashMap::new();
        if with_assets {
            let members = sqlx::query_as::<_, AlbumAssetRow>(
                "SELECT album_id, asset_id FROM album_asset WHERE album_id = ANY($1) ORDER BY created_at, asset_id",
            )
            .bind(&album_ids)
            .fetch_all(&self.pool)
            .await?;
            for member in members {
                assets_by_album
                    .entry(member.album_id)
                    .or_default()
                    .push(member.asset_id);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let asset_ids = assets_by_album.remove(&row.id).unwrap_or_default();
                let album_users = users_by_album.remove(&row.id).unwrap_or_default();
                let shared_link_ids = links_by_album.remove(&row.id).unwrap_or_default();
                Album::from_row(row, asset_ids, album_users, shared_link_ids)
            })
            .collect())
    }

    async fn list(&self, predicate: &str, user_id: &str) -> Result<Vec<Album>, DbError> {
        let query = format!(
            "SELECT {ALBUM_COLUMNS} FROM album a WHERE {predicate} ORDER BY a.created_at DESC, a.id"
        );
        let rows = sqlx::query_as::<_, AlbumRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows, false).await
    }
}

const IS_SHARED: &str = "(EXISTS (SELECT 1 FROM album_user au WHERE au.album_id = a.id) \
     OR EXISTS (SELECT 1 FROM shared_link sl WHERE sl.album_id = a.id))";

#[async_trait]
impl MembershipStore for PgStore {
    async fn get_by_id(
        &self,
        album_id: &str,
        with_assets: bool,
    ) -> Result<Option<Album>, DbError> {
        let query = format!("SELECT {ALBUM_COLUMNS} FROM album a WHERE a.id = $1");
        let row = sqlx::query_as::<_, AlbumRow>(&query)
            .bind(album_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row], with_assets).await?.pop())
    }

    async fn create(
        &self,
        album: NewAlbum,
        asset_ids: &[String],
        album_users: &[AlbumUserGrant],
    ) -> Result<Album, DbError> {
        let mut tx = self.pool.begin().await?;
        let album_id = nice_id(self.album_id_length);

        let row = sqlx::query_as::<_, AlbumRow>(
            r"
            INSERT INTO album (id, owner_id, album_name, description, asset_order, album_thumbnail_asset_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, album_name, description, asset_order,
                      album_thumbnail_asset_id, is_activity_enabled, created_at, updated_at
            ",
        )
        .bind(&album_id)
        .bind(&album.owner_id)
        .bind(&album.album_name)
        .bind(&album.description)
        .bind(album.order)
        .bind(&album.album_thumbnail_asset_id)
        .fetch_one(&mut *tx)
        .await?;

        if !asset_ids.is_empty() {
            sqlx::query(
                r"
                INSERT INTO album_asset (album_id, asset_id)
                SELECT $1, asset_id FROM UNNEST($2::text[]) AS t(asset_id)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(&album_id)
            .bind(asset_ids)
            .execute(&mut *tx)
            .await?;
        }

        for grant in album_users {
            sqlx::query("INSERT INTO album_user (album_id, user_id, role) VALUES ($1, $2, $3)")
                .bind(&album_id)
                .bind(&grant.user_id)
                .bind(grant.role)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.hydrate(vec![row], true)
            .await?
            .pop()
            .ok_or_else(|| DbError::NotFound(format!("album {album_id}")))
    }

    async fn update(&self, album_id: &str, update: AlbumUpdate) -> Result<Album, DbError> {
        let row = sqlx::query_as::<_, AlbumRow>(
            r"
            UPDATE album
            SET
                album_name = COALESCE($1, album_name),
                description = COALESCE($2, description),
                album_thumbnail_asset_id = COALESCE($3, album_thumbnail_asset_id),
                is_activity_enabled = COALESCE($4, is_activity_enabled),
                asset_order = COALESCE($5, asset_order),
                updated_at = COALESCE($6, now())
            WHERE id = $7
            RETURNING id, owner_id, album_name, description, asset_order,
                      album_thumbnail_asset_id, is_activity_enabled, created_at, updated_at
            ",
        )
        .bind(update.album_name)
        .bind(update.description)
        .bind(update.album_thumbnail_asset_id)
        .bind(update.is_activity_enabled)
        .bind(update.order)
        .bind(update.updated_at)
        .bind(album_id)
        .fetch_one(&self.pool)
        .await?;

        self.hydrate(vec![row], false)
            .await?
            .pop()
            .ok_or_else(|| DbError::NotFound(format!("album {album_id}")))
    }

    async fn delete(&self, album_id: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM album WHERE id = $1")
            .bind(album_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_asset_id(&self, user_id: &str, asset_id: &str) -> Result<Vec<Album>, DbError> {
        let query = format!(
            r"
            SELECT {ALBUM_COLUMNS}
            FROM album a
            JOIN album_asset aa ON aa.album_id = a.id AND aa.asset_id = $2
            WHERE a.owner_id = $1
               OR EXISTS (SELECT 1 FROM album_user au WHERE au.album_id = a.id AND au.user_id = $1)
            ORDER BY a.created_at DESC, a.id
            "
        );
        let rows = sqlx::query_as::<_, AlbumRow>(&query)
            .bind(user_id)
            .bind(asset_id)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows, false).await
    }

    async fn get_owned(&self, owner_id: &str) -> Result<Vec<Album>, DbError> {
        self.list("a.owner_id = $1", owner_id).await
    }

    async fn get_shared(&self, user_id: &str) -> Result<Vec<Album>, DbError> {
        let predicate = format!(
            "(a.owner_id = $1 AND {IS_SHARED}) \
             OR EXISTS (SELECT 1 FROM album_user au WHERE au.album_id = a.id AND au.user_id = $1)"
        );
        self.list(&predicate, user_id).await
    }

    async fn get_not_shared(&self, owner_id: &str) -> Result<Vec<Album>, DbError> {
        self.list(&format!("a.owner_id = $1 AND NOT {IS_SHARED}"), owner_id)
            .await
    }

    async fn get_metadata_for_ids(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumAssetCount>, DbError> {
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, AlbumAssetCount>(
            r"
            SELECT
                a.id AS album_id,
                COUNT(s.id) AS asset_count,
                MIN(s.file_created_at) AS start_date,
                MAX(s.file_created_at) AS end_date,
                MAX(s.updated_at) AS last_modified_asset_timestamp
            FROM album a
            LEFT JOIN album_asset aa ON aa.album_id = a.id
            LEFT JOIN asset s ON s.id = aa.asset_id
            WHERE a.id = ANY($1)
            GROUP BY a.id
            ",
        )
        .bind(album_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_contributor_counts(
        &self,
        album_id: &str,
    ) -> Result<Vec<ContributorCount>, DbError> {
        Ok(sqlx::query_as::<_, ContributorCount>(
            r"
            SELECT s.owner_id AS user_id, COUNT(*) AS asset_count
            FROM album_asset aa
            JOIN asset s ON s.id = aa.asset_id
            WHERE aa.album_id = $1
            GROUP BY s.owner_id
            ORDER BY asset_count DESC, user_id
            ",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_asset_ids(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<HashSet<String>, DbError> {
        if asset_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT asset_id FROM album_asset WHERE album_id = $1 AND asset_id = ANY($2)",
        )
        .bind(album_id)
        .bind(asset_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn add_asset_ids(&self, album_id: &str, asset_ids: &[String]) -> Result<(), DbError> {
        if asset_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r"
            INSERT INTO album_asset (album_id, asset_id)
            SELECT $1, asset_id FROM UNNEST($2::text[]) AS t(asset_id)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(album_id)
        .bind(asset_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_asset_ids(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<(), DbError> {
        if asset_ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM album_asset WHERE album_id = $1 AND asset_id = ANY($2)")
            .bind(album_id)
            .bind(asset_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_asset_ids_to_albums(&self, values: &[AlbumAssetPair]) -> Result<(), DbError> {
        if values.is_empty() {
            return Ok(());
        }
        let (album_ids, asset_ids): (Vec<String>, Vec<String>) = values
            .iter()
            .map(|pair| (pair.album_id.clone(), pair.asset_id.clone()))
            .unzip();
        sqlx::query(
            r"
            INSERT INTO album_asset (album_id, asset_id)
            SELECT * FROM UNNEST($1::text[], $2::text[])
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(&album_ids)
        .bind(&asset_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_thumbnails(&self) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            UPDATE album a
            SET album_thumbnail_asset_id = (
                SELECT aa.asset_id
                FROM album_asset aa
                JOIN asset s ON s.id = aa.asset_id
                WHERE aa.album_id = a.id
                ORDER BY s.file_created_at DESC
                LIMIT 1
            )
            WHERE (
                a.album_thumbnail_asset_id IS NULL
                AND EXISTS (SELECT 1 FROM album_asset aa WHERE aa.album_id = a.id)
            ) OR (
                a.album_thumbnail_asset_id IS NOT NULL
                AND NOT EXISTS (
                    SELECT 1 FROM album_asset aa
                    WHERE aa.album_id = a.id AND aa.asset_id = a.album_thumbnail_asset_id
                )
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn create_album_user(&self, album_user: &AlbumUser) -> Result<(), DbError> {
        sqlx::query("INSERT INTO album_user (album_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(&album_user.album_id)
            .bind(&album_user.user_id)
            .bind(album_user.role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_album_user(
        &self,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<bool, DbError> {
        let result =
            sqlx::query("UPDATE album_user SET role = $3 WHERE album_id = $1 AND user_id = $2")
                .bind(album_id)
                .bind(user_id)
                .bind(role)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_album_user(&self, album_id: &str, user_id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM album_user WHERE album_id = $1 AND user_id = $2")
            .bind(album_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>, DbError> {
        Ok(sqlx::query_as::<_, User>(
            r"
            SELECT id, name, email, avatar_color, profile_image_path, profile_changed_at
            FROM app_user
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences, DbError> {
        let preferences = sqlx::query_as::<_, UserPreferences>(
            "SELECT album_default_order FROM app_user WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(preferences.unwrap_or_default())
    }
}

#[async_trait]
impl AccessRepository for PgStore {
    async fn check_access(
        &self,
        user_id: &str,
        permission: Permission,
        ids: &HashSet<String>,
    ) -> Result<HashSet<String>, DbError> {
        let query = match permission {
            Permission::AssetShare => "SELECT id FROM asset WHERE id = ANY($1) AND owner_id = $2",
            Permission::AlbumUpdate | Permission::AlbumDelete | Permission::AlbumShare => {
                "SELECT id FROM album WHERE id = ANY($1) AND owner_id = $2"
            }
            Permission::AlbumRead => {
                r"
                SELECT a.id FROM album a
                WHERE a.id = ANY($1)
                  AND (a.owner_id = $2 OR EXISTS (
                      SELECT 1 FROM album_user au WHERE au.album_id = a.id AND au.user_id = $2
                  ))
                "
            }
            Permission::AlbumAssetCreate | Permission::AlbumAssetDelete => {
                r"
                SELECT a.id FROM album a
                WHERE a.id = ANY($1)
                  AND (a.owner_id = $2 OR EXISTS (
                      SELECT 1 FROM album_user au
                      WHERE au.album_id = a.id AND au.user_id = $2 AND au.role = 'editor'
                  ))
                "
            }
        };

        let ids: Vec<String> = ids.iter().cloned().collect();
        let rows: Vec<(String,)> = sqlx::query_as(query)
            .bind(&ids)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
