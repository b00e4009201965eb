use crate::catalog::CatalogSource;
use crate::error::CatalogError;
use crate::model::Entry;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Default)]
struct CatalogFile {
    #[serde(default)]
    servers: Vec<Entry>,
}

/// Catalog read from a TOML file with one `[[servers]]` table per entry.
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Vec<Entry>, CatalogError> {
        debug!("Reading catalog from {:?}", self.path);
        let content = fs::read_to_string(&self.path).map_err(|source| CatalogError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if let Some(index) = file.servers.iter().position(|e| e.name.is_empty()) {
            return Err(CatalogError::EmptyName { index });
        }
        Ok(file.servers)
    }
}
