use crate::Config;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

/// Page templates the router renders, besides the shared partials.
pub const REQUIRED_TEMPLATES: &[&str] = &[
    "home.html.liquid",
    "dex.html.liquid",
    "not_found.html.liquid",
];

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Templates directory does not exist: {0}")]
    TemplatesDirectoryMissing(String),

    #[error("Required template missing: {0}")]
    RequiredTemplateMissing(String),

    #[error("No photo source configured: set FLICKR_API_KEY or flickr.fixture")]
    SourceNotConfigured,

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] crate::catalog::CatalogError),
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.is_dir() {
        error!("Templates directory does not exist: {:?}", templates_dir);
        errors.push(StartupCheckError::TemplatesDirectoryMissing(
            templates_dir.display().to_string(),
        ));
    } else {
        info!("Templates directory exists: {:?}", templates_dir);

        let required = REQUIRED_TEMPLATES
            .iter()
            .chain(crate::templating::PARTIALS.iter());
        for template in required {
            let path = templates_dir.join(template);
            if tokio::fs::metadata(&path).await.is_ok() {
                info!("Required template found: {:?}", path);
            } else {
                error!("Required template missing: {:?}", path);
                errors.push(StartupCheckError::RequiredTemplateMissing(
                    template.to_string(),
                ));
            }
        }
    }

    // Pages still render without styles.
    let static_dir = Path::new(&config.static_files.directory);
    if !static_dir.is_dir() {
        warn!("Static files directory does not exist: {:?}", static_dir);
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    match (&config.flickr.fixture, config.flickr.api_key.as_deref()) {
        (Some(fixture), _) => info!("Using photo fixture {:?}", fixture),
        (None, Some(key)) if !key.trim().is_empty() => info!("Flickr API key configured"),
        _ => {
            error!("No Flickr API key or fixture configured");
            errors.push(StartupCheckError::SourceNotConfigured);
        }
    }

    if let Err(e) = config.catalog() {
        error!("Catalog configuration is invalid: {}", e);
        errors.push(e.into());
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.templates.directory = dir.join("templates");
        config.static_files.directory = dir.join("static");
        config.flickr.api_key = Some("key".to_string());
        config
    }

    #[tokio::test]
    async fn test_complete_setup_passes() {
        let temp_dir = TempDir::new().unwrap();
        let templates = temp_dir.path().join("templates");
        std::fs::create_dir(&templates).unwrap();
        for name in REQUIRED_TEMPLATES.iter().chain(crate::templating::PARTIALS) {
            std::fs::write(templates.join(name), "").unwrap();
        }

        // A missing static directory only warns.
        assert!(perform_startup_checks(&config_in(temp_dir.path())).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_pieces_are_reported() {
        let temp_dir = TempDir::new().unwrap();
        let templates = temp_dir.path().join("templates");
        std::fs::create_dir(&templates).unwrap();
        std::fs::write(templates.join("home.html.liquid"), "").unwrap();

        let mut config = config_in(temp_dir.path());
        config.flickr.api_key = None;

        let errors = perform_startup_checks(&config).await.unwrap_err();
        let missing: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                StartupCheckError::RequiredTemplateMissing(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            missing,
            vec![
                "dex.html.liquid",
                "not_found.html.liquid",
                "_header.html.liquid",
                "_footer.html.liquid",
            ]
        );
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, StartupCheckError::SourceNotConfigured))
        );
    }

    #[tokio::test]
    async fn test_missing_templates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let errors = perform_startup_checks(&config_in(temp_dir.path()))
            .await
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            StartupCheckError::TemplatesDirectoryMissing(_)
        ));
    }
}
