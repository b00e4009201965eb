use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::model::{Catalog, Entry};
use directories::ProjectDirs;
use log::{info, warn};
use regex::Regex;
use std::path::PathBuf;

pub mod file;
pub mod seed;

use file::FileSource;
use seed::SeedSource;

pub trait CatalogSource {
    fn name(&self) -> &str;
    fn load(&self) -> Result<Vec<Entry>, CatalogError>;
}

/// A catalog plus the message to show when it could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub notice: Option<String>,
}

pub fn default_catalog_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "mcp-registry", "mcp-registry")
        .map(|dirs| dirs.config_dir().join("catalog.toml"))
}

/// Explicit path first, then `catalog.toml` next to the config if it exists.
fn resolve_path(config: &CatalogConfig) -> Option<PathBuf> {
    config
        .path
        .clone()
        .or_else(|| default_catalog_path().filter(|p| p.exists()))
}

pub fn load_catalog(config: &CatalogConfig) -> LoadedCatalog {
    let source: Box<dyn CatalogSource> = match resolve_path(config) {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(SeedSource),
    };
    load_from(source.as_ref(), config.exclude.as_deref())
}

/// Loads `source`, dropping entries whose name matches an exclude pattern.
/// A failing source yields an empty catalog and a notice instead of an error.
pub fn load_from(source: &dyn CatalogSource, exclude: Option<&[String]>) -> LoadedCatalog {
    let entries = match source.load() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Catalog unavailable ({} source): {}", source.name(), e);
            return LoadedCatalog {
                catalog: Catalog::default(),
                notice: Some(format!("Catalog unavailable: {}", e)),
            };
        }
    };

    let patterns: Vec<Regex> = exclude
        .unwrap_or_default()
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring exclude pattern {:?}: {}", p, e);
                None
            }
        })
        .collect();

    let total = entries.len();
    let entries: Vec<Entry> = entries
        .into_iter()
        .filter(|e| !patterns.iter().any(|re| re.is_match(&e.name)))
        .collect();

    info!(
        "Catalog: loaded {} entries from {} source ({} excluded)",
        entries.len(),
        source.name(),
        total - entries.len()
    );

    LoadedCatalog {
        catalog: Catalog::new(entries),
        notice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl CatalogSource for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn load(&self) -> Result<Vec<Entry>, CatalogError> {
            Err(CatalogError::EmptyName { index: 3 })
        }
    }

    #[test]
    fn test_seed_loads_without_notice() {
        let loaded = load_from(&SeedSource, None);
        assert_eq!(loaded.catalog.len(), 12);
        assert!(loaded.notice.is_none());
    }

    #[test]
    fn test_failing_source_degrades_to_empty_catalog() {
        let loaded = load_from(&Broken, None);
        assert!(loaded.catalog.is_empty());
        let notice = loaded.notice.unwrap();
        assert!(notice.starts_with("Catalog unavailable"));
        assert!(notice.contains("#3"));
    }

    #[test]
    fn test_exclude_drops_matching_names_and_keeps_order() {
        let exclude = vec!["^(Debug|Testing) ".to_string()];
        let loaded = load_from(&SeedSource, Some(&exclude));
        let names: Vec<&str> = loaded.catalog.get_all().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 10);
        assert!(!names.contains(&"Debug Server"));
        assert!(!names.contains(&"Testing Server"));
        assert_eq!(names[0], "Example Server");
        assert_eq!(names[9], "Analytics Server");
    }

    #[test]
    fn test_invalid_exclude_pattern_is_ignored() {
        let exclude = vec!["(unclosed".to_string(), "^Cluster".to_string()];
        let loaded = load_from(&SeedSource, Some(&exclude));
        assert_eq!(loaded.catalog.len(), 11);
        assert!(loaded.notice.is_none());
    }

    #[test]
    fn test_configured_missing_file_gives_notice() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig {
            path: Some(dir.path().join("missing.toml")),
            exclude: None,
        };
        let loaded = load_catalog(&config);
        assert!(loaded.catalog.is_empty());
        assert!(loaded.notice.is_some());
    }
}
