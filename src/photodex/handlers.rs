use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use futures::future::join_all;
use liquid::model::Value;
use serde::Serialize;
use tracing::{debug, error};

const HOME_PAGE_KEY: &str = "/";

#[derive(Debug, Serialize)]
struct FeaturedTrainer {
    username: String,
    trainer: String,
    preview_thumb_url: Option<String>,
    count: usize,
}

fn page_key(trainer: &str) -> String {
    format!("/{}", trainer.to_lowercase())
}

/// Embeds JSON in a `<script>` block without letting it close the block.
fn script_safe_json(value: &impl Serialize) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/")
}

async fn render(
    app_state: &AppState,
    template: &str,
    mut globals: liquid::Object,
) -> Result<String, Response> {
    let stylesheet_url = app_state
        .static_handler
        .versioned_url("/static/dex.css")
        .await;
    globals.insert(
        "app_name".into(),
        Value::scalar(app_state.config.app.name.clone()),
    );
    globals.insert("stylesheet_url".into(), Value::scalar(stylesheet_url));

    app_state
        .template_engine
        .render_template(template, globals)
        .await
        .map_err(|e| {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        })
}

pub async fn home_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    if let Some(html) = app_state.pages.get(HOME_PAGE_KEY).await {
        debug!("Serving cached home page");
        return Html(html).into_response();
    }

    let featured = &app_state.config.app.featured_trainers;
    let loaded = join_all(
        featured
            .iter()
            .map(|username| app_state.photodex.load(username)),
    )
    .await;

    // Featured trainers that fail to load are left off the page.
    let trainers: Vec<FeaturedTrainer> = loaded
        .into_iter()
        .filter_map(Result::ok)
        .map(|dex| FeaturedTrainer {
            preview_thumb_url: dex.preview.map(|p| p.thumb_url),
            username: dex.username,
            trainer: dex.trainer,
            count: dex.snap_count,
        })
        .collect();

    let globals = liquid::object!({
        "page_title": app_state.config.app.name,
        "subtitle": app_state.config.app.subtitle,
        "trainers": trainers,
    });

    match render(&app_state, "home.html.liquid", globals).await {
        Ok(html) => {
            app_state
                .pages
                .insert(HOME_PAGE_KEY, html.clone(), app_state.config.cache.home_page_ttl())
                .await;
            Html(html).into_response()
        }
        Err(response) => response,
    }
}

pub async fn trainer_handler(
    State(app_state): State<AppState>,
    Path(trainer): Path<String>,
) -> impl IntoResponse {
    let key = page_key(&trainer);
    if let Some(html) = app_state.pages.get(&key).await {
        debug!(key = %key, "Serving cached Photodex page");
        return Html(html).into_response();
    }

    let dex = match app_state.photodex.load(&trainer).await {
        Ok(dex) => dex,
        Err(e) => {
            let globals = liquid::object!({
                "page_title": "Photódex not found",
                "subtitle": app_state.config.app.subtitle,
                "trainer": trainer,
                "message": e.to_string(),
            });
            return match render(&app_state, "not_found.html.liquid", globals).await {
                Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                Err(response) => response,
            };
        }
    };

    let viewer_script_url = app_state
        .static_handler
        .versioned_url("/static/dex.js")
        .await;

    let globals = liquid::object!({
        "page_title": format!("{}'s Photódex", dex.trainer),
        "subtitle": format!("Snapped: {}", dex.snap_count),
        "trainer": dex.trainer,
        "username": dex.username,
        "album_url": dex.album_url,
        "regions": dex.regions,
        "photo_map_json": script_safe_json(&dex.photo_map),
        "viewer_script_url": viewer_script_url,
    });

    match render(&app_state, "dex.html.liquid", globals).await {
        Ok(html) => {
            app_state
                .pages
                .insert(key, html.clone(), app_state.config.cache.trainer_page_ttl())
                .await;
            Html(html).into_response()
        }
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_keys_ignore_case() {
        assert_eq!(page_key("AshK"), "/ashk");
        assert_eq!(page_key("ashk"), page_key("ASHK"));
    }

    #[test]
    fn test_script_safe_json() {
        let value = serde_json::json!({ "title": "</script><script>alert(1)" });
        let json = script_safe_json(&value);
        assert!(!json.contains("</script>"));
        assert_eq!(json, r#"{"title":"<\/script><script>alert(1)"}"#);
    }
}
