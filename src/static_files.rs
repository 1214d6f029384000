use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};
use tokio::{fs::File, sync::RwLock};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct StaticFileHandler {
    pub static_dir: PathBuf,
    file_versions: Arc<RwLock<HashMap<String, u64>>>,
}

impl StaticFileHandler {
    pub fn new(static_dir: PathBuf) -> Self {
        Self {
            static_dir,
            file_versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records the modification time of each top-level stylesheet and script.
    pub async fn refresh_file_versions(&self) {
        info!("Refreshing static file versions");
        let mut versions = self.file_versions.write().await;
        versions.clear();

        let Ok(mut entries) = tokio::fs::read_dir(&self.static_dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if let Ok(metadata) = entry.metadata().await
                && metadata.is_file()
                && let Some(ext) = path.extension()
                && (ext == "css" || ext == "js")
                && let Ok(modified) = metadata.modified()
                && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
                && let Some(file_name) = path.file_name().and_then(|n| n.to_str())
            {
                versions.insert(file_name.to_string(), duration.as_secs());
                debug!("File version: {} -> {}", file_name, duration.as_secs());
            }
        }
    }

    /// Appends `?v=<mtime>` when the file's version is known.
    pub async fn versioned_url(&self, path: &str) -> String {
        let filename = path.rsplit('/').next().unwrap_or(path);
        let versions = self.file_versions.read().await;
        match versions.get(filename) {
            Some(version) => format!("{}?v={}", path, version),
            None => path.to_string(),
        }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            .then(|| self.static_dir.join(relative))
    }

    pub async fn serve(&self, path: &str, has_version: bool) -> Response {
        let Some(file_path) = self.resolve(path) else {
            error!("Path traversal attempt: {:?}", path);
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        };

        debug!("Attempting to serve static file: {:?}", file_path);

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
            Err(e) => {
                debug!("Failed to get metadata for {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open file {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let cache_control = if has_version {
            "public, max-age=31536000, immutable"
        } else if content_type.starts_with("image/") {
            "public, max-age=86400"
        } else if content_type.starts_with("text/css")
            || content_type.starts_with("application/javascript")
            || content_type.starts_with("text/javascript")
        {
            "public, max-age=300, must-revalidate"
        } else {
            "public, max-age=3600"
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control);

        if let Ok(modified) = metadata.modified()
            && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
        {
            response = response
                .header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified))
                .header(
                    header::ETAG,
                    format!("\"{}-{}\"", duration.as_secs(), metadata.len()),
                );
        }

        let body = Body::from_stream(ReaderStream::new(file));
        response.body(body).unwrap_or_else(|e| {
            error!("Failed to build static response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StaticFileHandler) {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("dex.css"), "body {}").unwrap();
        std::fs::create_dir(temp_dir.path().join("img")).unwrap();
        std::fs::write(temp_dir.path().join("img/ball.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let handler = StaticFileHandler::new(temp_dir.path().to_path_buf());
        (temp_dir, handler)
    }

    #[tokio::test]
    async fn test_serves_files_with_headers() {
        let (_temp_dir, handler) = setup();

        let response = handler.serve("dex.css", false).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=300, must-revalidate"
        );
        assert!(response.headers().contains_key(header::ETAG));
        assert!(response.headers().contains_key(header::LAST_MODIFIED));

        let image = handler.serve("/img/ball.png", true).await;
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(
            image.headers()[header::CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_rejects_traversal_and_missing_files() {
        let (_temp_dir, handler) = setup();

        let traversal = handler.serve("../secret.txt", false).await;
        assert_eq!(traversal.status(), StatusCode::FORBIDDEN);

        let missing = handler.serve("nope.css", false).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let directory = handler.serve("img", false).await;
        assert_eq!(directory.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_versioned_urls() {
        let (_temp_dir, handler) = setup();
        assert_eq!(handler.versioned_url("/static/dex.css").await, "/static/dex.css");

        handler.refresh_file_versions().await;
        let url = handler.versioned_url("/static/dex.css").await;
        assert!(url.starts_with("/static/dex.css?v="));
        assert_eq!(handler.versioned_url("/static/img/ball.png").await, "/static/img/ball.png");
    }
}
