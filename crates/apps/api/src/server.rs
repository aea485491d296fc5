use crate::api_state::ApiContext;
use crate::create_router;
use app_state::AppSettings;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use common_services::api::album::service::AlbumService;
use common_services::database::{PgStore, get_db_pool};
use common_services::events::{AlbumEvent, BroadcastEmitter};
use common_services::sharing::SharingClient;
use http::{HeaderValue, header};
use reqwest::Client;
use std::iter::once;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub async fn serve(settings: AppSettings) -> Result<()> {
    // --- Server Startup ---
    info!("🚀 Initializing server...");
    let pool = get_db_pool(&settings).await?;
    let store = Arc::new(PgStore::new(pool.clone(), settings.database.album_id_length));
    let authority = SharingClient::new(Client::new(), &settings.sharing)
        .wrap_err("Sharing authority is not configured correctly")?;

    let events = BroadcastEmitter::new(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(log_album_events(events.subscribe()));

    let album_service = AlbumService::builder()
        .albums(store.clone())
        .users(store.clone())
        .access(store)
        .authority(Arc::new(authority))
        .events(Arc::new(events.clone()))
        .build();

    let api_state = ApiContext {
        pool,
        album_service,
        settings: settings.clone(),
        events,
    };

    // --- CORS Configuration ---
    let allowed_origins: Vec<HeaderValue> = settings
        .api
        .allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(hv) => Some(hv),
            Err(e) => {
                error!("Invalid CORS origin configured: {} - Error: {}", s, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(allowed_origins)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    // --- Create Router ---
    let app = create_router(api_state)
        .layer(TraceLayer::new_for_http().on_request(()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SetSensitiveRequestHeadersLayer::new(once(
            header::AUTHORIZATION,
        )));

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port)
        .parse()
        .map_err(|e| eyre!("Invalid address: {}", e))?;
    let listener = TcpListener::bind(addr).await?;

    info!("🐸 Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Stand-in consumer for album notifications until a push channel subscribes.
async fn log_album_events(mut receiver: broadcast::Receiver<AlbumEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => info!("Album event: {:?}", event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Album event logger lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
