use app_state::AppSettings;
use axum::extract::FromRef;
use common_services::api::album::service::AlbumService;
use common_services::events::BroadcastEmitter;
use sqlx::PgPool;

#[derive(Clone)]
pub struct ApiContext {
    pub pool: PgPool,
    pub album_service: AlbumService,
    pub settings: AppSettings,
    pub events: BroadcastEmitter,
}

// Lets extractors pull a single part of the state.
impl FromRef<ApiContext> for PgPool {
    fn from_ref(state: &ApiContext) -> Self {
        state.pool.clone()
    }
}

impl FromRef<ApiContext> for AlbumService {
    fn from_ref(state: &ApiContext) -> Self {
        state.album_service.clone()
    }
}

impl FromRef<ApiContext> for AppSettings {
    fn from_ref(state: &ApiContext) -> Self {
        state.settings.clone()
    }
}
