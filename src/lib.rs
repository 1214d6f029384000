use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::info;

pub mod api;
pub mod cache;
pub mod catalog;
pub mod photodex;
pub mod photos;
pub mod security;
pub mod source;
pub mod startup_checks;
pub mod static_files;
pub mod templating;
pub mod viewer;

use catalog::{Catalog, CatalogError, CatalogRange};
use source::{FlickrConfig, SourceError};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub flickr: FlickrConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Usernames showcased on the home page.
    #[serde(default)]
    pub featured_trainers: Vec<String>,
}

/// Time-to-live, in seconds, for each cache category. Zero disables a category.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_lookup_seconds")]
    pub user_lookup_seconds: u64,
    #[serde(default = "default_lookup_seconds")]
    pub album_lookup_seconds: u64,
    #[serde(default = "default_home_page_seconds")]
    pub home_page_seconds: u64,
    #[serde(default = "default_trainer_page_seconds")]
    pub trainer_page_seconds: u64,
}

impl CacheConfig {
    pub fn lookup_ttl(&self) -> cache::LookupTtl {
        cache::LookupTtl {
            user: Duration::from_secs(self.user_lookup_seconds),
            album: Duration::from_secs(self.album_lookup_seconds),
        }
    }

    pub fn home_page_ttl(&self) -> Duration {
        Duration::from_secs(self.home_page_seconds)
    }

    pub fn trainer_page_ttl(&self) -> Duration {
        Duration::from_secs(self.trainer_page_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_lookup_seconds: default_lookup_seconds(),
            album_lookup_seconds: default_lookup_seconds(),
            home_page_seconds: default_home_page_seconds(),
            trainer_page_seconds: default_trainer_page_seconds(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// Redirect plain-HTTP requests (as reported by a proxy) to HTTPS.
    #[serde(default)]
    pub enforce_https: bool,
    /// Shared password for the admin endpoints; admin is disabled when unset.
    #[serde(default)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

/// Replaces the built-in generation list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub regions: Vec<CatalogRange>,
    #[serde(default)]
    pub unobtainable: Vec<u16>,
}

fn default_subtitle() -> String {
    "Gotta snap 'em all!".to_string()
}

fn default_lookup_seconds() -> u64 {
    1
}

fn default_home_page_seconds() -> u64 {
    60
}

fn default_trainer_page_seconds() -> u64 {
    30
}

impl Config {
    /// Applies the environment knobs on top of the file configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("FLICKR_API_KEY").filter(|v| !v.is_empty()) {
            info!("Using Flickr API key from FLICKR_API_KEY");
            self.flickr.api_key = Some(key);
        }
        if let Some(password) = var("PHOTODEX_ADMIN_PASSWORD").filter(|v| !v.is_empty()) {
            info!("Using admin password from PHOTODEX_ADMIN_PASSWORD");
            self.security.admin_password = Some(password);
        }
        if let Some(flag) = var("PHOTODEX_ENFORCE_HTTPS") {
            self.security.enforce_https = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(port) = var("PORT").and_then(|p| p.trim().parse().ok()) {
            info!("Using port {} from PORT", port);
            self.server.port = port;
        }
    }

    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(custom) => Catalog::new(custom.regions.clone(), custom.unobtainable.clone()),
            None => Ok(Catalog::standard()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            app: AppConfig {
                name: "Photódex".to_string(),
                subtitle: default_subtitle(),
                base_url: None,
                featured_trainers: Vec::new(),
            },
            flickr: FlickrConfig::default(),
            cache: CacheConfig::default(),
            security: SecurityConfig::default(),
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
            catalog: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Photo source error: {0}")]
    Source(#[from] SourceError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub photodex: photodex::SharedPhotodexService,
    pub pages: Arc<cache::PageCache>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, source: source::DynPhotoSource) -> Result<Self, AppError> {
        let catalog = config.catalog()?;

        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
        ));

        let static_handler =
            static_files::StaticFileHandler::new(config.static_files.directory.clone());

        let photodex = Arc::new(photodex::PhotodexService::new(
            source,
            catalog,
            config.cache.lookup_ttl(),
            config.flickr.page_size(),
        ));

        Ok(Self {
            template_engine,
            static_handler,
            photodex,
            pages: Arc::new(cache::PageCache::new()),
            config,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StaticQuery {
    v: Option<String>,
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<StaticQuery>,
) -> impl IntoResponse {
    app_state
        .static_handler
        .serve(&path, query.v.is_some())
        .await
}

pub async fn create_app(config: Config) -> Result<Router, AppError> {
    let source = source::create_source(&config.flickr).await?;
    create_app_with_source(config, source)
}

pub fn create_app_with_source(
    config: Config,
    source: source::DynPhotoSource,
) -> Result<Router, AppError> {
    Ok(create_router(AppState::new(config, source)?))
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(photodex::home_handler))
        .route(
            "/api/trainers/{username}",
            axum::routing::get(api::trainer_api_handler),
        )
        .route(
            "/admin/cache",
            axum::routing::get(api::admin_cache_handler).delete(api::admin_clear_handler),
        )
        .route(
            "/admin/cache/{username}",
            axum::routing::delete(api::admin_invalidate_handler),
        )
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .route("/{trainer}", axum::routing::get(photodex::trainer_handler))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            security::https_redirect,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
