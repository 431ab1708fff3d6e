//! Catalog seed file (`config/catalog.yaml`).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::slug::{base_slug, SlugScope};
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    /// Explicit slug; derived from `name` when omitted.
    pub slug: Option<String>,
    pub icon: Option<String>,
}

impl CategorySeed {
    /// Slug this category is stored under.
    #[must_use]
    pub fn slug(&self) -> String {
        base_slug(self.slug.as_deref().unwrap_or(&self.name), SlugScope::Category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySeed {
    pub name: String,
    pub whatsapp: String,
    pub instagram: String,
    pub address: Option<String>,
    pub facebook_pixel_id: Option<String>,
    pub google_analytics_id: Option<String>,
    pub map_iframe: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub finishings: Vec<String>,
    pub company: Option<CompanySeed>,
}

/// Load and validate the catalog seed from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog_seed(path: &Path) -> Result<CatalogSeed, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_catalog_seed(&content)
}

/// Parse and validate seed YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is invalid or fails validation.
pub fn parse_catalog_seed(content: &str) -> Result<CatalogSeed, ConfigError> {
    let seed: CatalogSeed = serde_yaml::from_str(content).map_err(ConfigError::SeedFileParse)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &CatalogSeed) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for category in &seed.categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name: {name}"
            )));
        }
        let slug = category.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: {slug}"
            )));
        }
    }

    let mut seen_finishings = HashSet::new();
    for finishing in &seed.finishings {
        let name = finishing.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "finishing name must be non-empty".to_string(),
            ));
        }
        if !seen_finishings.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate finishing: {name}"
            )));
        }
    }

    if let Some(company) = &seed.company {
        if company.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "company name must be non-empty".to_string(),
            ));
        }
    }

    Ok(())
}
