use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::agents::WorkCategory;

pub const BUILTIN_WORK_CATALOG: &str = include_str!("data/work_catalog.json");

/// Catalog schema version this build understands.
pub const SUPPORTED_WORK_CATALOG_VERSION: u32 = 1;

/// Per-category scheduling configuration.
///
/// `base_priority` is consumed by the category scan order (and any external
/// scheduler); the engine itself attaches no other meaning to it.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkCategoryConfig {
    pub debug_label: String,
    pub refresh_interval_ticks: u64,
    pub distance_thresholds_sq: Vec<f32>,
    pub base_priority: f32,
}

/// Catalog of every configured work category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkCatalog {
    pub version: u32,
    categories: BTreeMap<WorkCategory, WorkCategoryConfig>,
}

impl Default for WorkCatalog {
    fn default() -> Self {
        Self {
            version: SUPPORTED_WORK_CATALOG_VERSION,
            categories: BTreeMap::new(),
        }
    }
}

impl WorkCatalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_WORK_CATALOG)
                .expect("builtin work catalog should parse and validate"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, WorkCatalogError> {
        let catalog: WorkCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, WorkCatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| WorkCatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn config(&self, category: WorkCategory) -> Option<&WorkCategoryConfig> {
        self.categories.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (WorkCategory, &WorkCategoryConfig)> {
        self.categories
            .iter()
            .map(|(category, config)| (*category, config))
    }

    /// Misconfiguration is rejected at load time with a descriptive
    /// diagnostic; the engine never self-corrects a bad catalog.
    fn validate(&self) -> Result<(), WorkCatalogError> {
        if self.version != SUPPORTED_WORK_CATALOG_VERSION {
            return Err(WorkCatalogError::UnsupportedVersion {
                version: self.version,
            });
        }
        for (category, config) in &self.categories {
            if config.refresh_interval_ticks == 0 {
                return Err(WorkCatalogError::InvalidInterval {
                    category: *category,
                });
            }
            let thresholds = &config.distance_thresholds_sq;
            if thresholds.iter().any(|threshold| *threshold < 0.0) {
                return Err(WorkCatalogError::NegativeThreshold {
                    category: *category,
                });
            }
            if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(WorkCatalogError::ThresholdsNotAscending {
                    category: *category,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum WorkCatalogError {
    #[error("failed to parse work catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read work catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported work catalog version {version}")]
    UnsupportedVersion { version: u32 },
    #[error("work category {category} has a non-positive refresh interval")]
    InvalidInterval { category: WorkCategory },
    #[error("work category {category} has a negative distance threshold")]
    NegativeThreshold { category: WorkCategory },
    #[error("work category {category} distance thresholds are not strictly ascending")]
    ThresholdsNotAscending { category: WorkCategory },
}

/// Shared handle to the active catalog, hot-swappable on reload.
#[derive(Resource, Debug, Clone)]
pub struct WorkCatalogHandle(pub Arc<WorkCatalog>);

impl WorkCatalogHandle {
    pub fn new(catalog: Arc<WorkCatalog>) -> Self {
        Self(catalog)
    }

    pub fn catalog(&self) -> &WorkCatalog {
        &self.0
    }

    pub fn replace(&mut self, catalog: Arc<WorkCatalog>) {
        self.0 = catalog;
    }
}

/// Load the catalog from `WORK_CATALOG_PATH` when set, falling back to the
/// builtin on any failure.
pub fn load_work_catalog_from_env() -> Arc<WorkCatalog> {
    let Some(path) = env::var("WORK_CATALOG_PATH").ok().map(PathBuf::from) else {
        tracing::info!(target: "work_engine::config", "work_catalog.loaded=builtin");
        return WorkCatalog::builtin();
    };
    match WorkCatalog::from_file(&path) {
        Ok(catalog) => {
            tracing::info!(
                target: "work_engine::config",
                path = %path.display(),
                "work_catalog.loaded=file"
            );
            Arc::new(catalog)
        }
        Err(err) => {
            tracing::warn!(
                target: "work_engine::config",
                path = %path.display(),
                error = %err,
                "work_catalog.load_failed"
            );
            WorkCatalog::builtin()
        }
    }
}
