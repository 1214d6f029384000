use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

type Partials = liquid::partials::EagerCompiler<liquid::partials::InMemorySource>;

/// Templates every page can `{% include %}`.
pub const PARTIALS: &[&str] = &["_header.html.liquid", "_footer.html.liquid"];

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn template_dir(&self) -> &PathBuf {
        &self.template_dir
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    async fn load_partials(&self) -> Partials {
        let mut partials = Partials::empty();
        for name in PARTIALS {
            match self.load_template(name).await {
                Ok(content) => {
                    partials.add(*name, content);
                }
                Err(e) => {
                    error!("Failed to load partial: {}", e);
                    partials.add(*name, String::new());
                }
            }
        }
        partials
    }

    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(self.load_partials().await)
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        template
            .render(&globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_templates() -> (TempDir, TemplateEngine) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path();

        fs::write(
            path.join("_header.html.liquid"),
            "<title>{{ page_title }}</title>",
        )
        .unwrap();
        fs::write(path.join("_footer.html.liquid"), "<footer>{{ app_name }}</footer>").unwrap();
        fs::write(
            path.join("page.html.liquid"),
            r#"{% include "_header.html.liquid" %}<p>{{ body }}</p>{% include "_footer.html.liquid" %}"#,
        )
        .unwrap();

        let engine = TemplateEngine::new(path.to_path_buf());
        (temp_dir, engine)
    }

    #[tokio::test]
    async fn test_render_with_partials() {
        let (_temp_dir, engine) = setup_test_templates();

        let globals = liquid::object!({
            "page_title": "Red",
            "body": "Snapped: 3",
            "app_name": "Photódex",
        });
        let html = engine.render_template("page.html.liquid", globals).await.unwrap();
        assert_eq!(
            html,
            "<title>Red</title><p>Snapped: 3</p><footer>Photódex</footer>"
        );
    }

    #[tokio::test]
    async fn test_template_changes_are_picked_up() {
        let (temp_dir, engine) = setup_test_templates();
        let path = temp_dir.path().join("simple.html.liquid");

        fs::write(&path, "one").unwrap();
        let first = engine
            .render_template("simple.html.liquid", liquid::Object::new())
            .await
            .unwrap();
        assert_eq!(first, "one");

        // Make sure the modification time moves forward.
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        fs::write(&path, "two").unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = engine
            .render_template("simple.html.liquid", liquid::Object::new())
            .await
            .unwrap();
        assert_eq!(second, "two");
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let (_temp_dir, engine) = setup_test_templates();
        let result = engine
            .render_template("missing.html.liquid", liquid::Object::new())
            .await;
        assert!(result.unwrap_err().contains("missing.html.liquid"));
    }
}
