//! Plotter configuration.
//!
//! Read once at startup from `plotter.yaml`. `${VAR}` and `${VAR:-default}`
//! references are substituted from the environment before parsing, and the
//! result is validated before any worker starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use frame_common::{PlotError, PlotResult};
use renderer::{Layout, SchemeDefinition, SchemeRegistry, SurfaceSpec};
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration types
// ============================================================================

/// One map projection: where its frames go and how big they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Output subfolder below `output_dir`
    pub subfolder: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Map extent as [min_x, min_y, max_x, max_y]; the grid's extent when absent
    #[serde(default)]
    pub extent: Option<[f64; 4]>,
    /// Label the map edges with projected coordinates
    #[serde(default)]
    pub labels: bool,
}

fn default_width() -> u32 {
    900
}

fn default_height() -> u32 {
    760
}

fn default_pool_size() -> usize {
    4
}

fn default_projection() -> String {
    "de".to_string()
}

impl ProjectionConfig {
    pub fn surface(&self) -> SurfaceSpec {
        SurfaceSpec {
            width: self.width,
            height: self.height,
            extent: self.extent.map(|[a, b, c, d]| (a, b, c, d)),
            axis_labels: self.labels,
        }
    }
}

/// Immutable configuration of one plotter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotterConfig {
    pub output_dir: PathBuf,
    #[serde(default = "default_projection")]
    pub default_projection: String,
    /// Maximum number of chunks rendered at once
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Frames per chunk; balanced over the pool when absent
    #[serde(default)]
    pub chunk_size: Option<usize>,
    pub projections: BTreeMap<String, ProjectionConfig>,
    /// Color schemes added to (or overriding) the built-in ones
    #[serde(default)]
    pub schemes: Vec<SchemeDefinition>,
    /// Products added to (or overriding) the built-in ones
    #[serde(default)]
    pub products: Vec<Layout>,
}

// ============================================================================
// Loading
// ============================================================================

impl PlotterConfig {
    pub fn load(path: impl AsRef<Path>) -> PlotResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PlotError::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> PlotResult<Self> {
        let expanded = expand_env_vars(content)?;
        let config: PlotterConfig = serde_yaml::from_str(&expanded)
            .map_err(|e| PlotError::config(format!("invalid config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlotResult<()> {
        if self.pool_size == 0 {
            return Err(PlotError::config("pool_size must be at least 1"));
        }
        if self.chunk_size == Some(0) {
            return Err(PlotError::config("chunk_size must be at least 1"));
        }
        if self.projections.is_empty() {
            return Err(PlotError::config("no projections configured"));
        }
        self.projection(&self.default_projection)?;

        for (name, projection) in &self.projections {
            if projection.subfolder.trim().is_empty() {
                return Err(PlotError::config(format!(
                    "projection '{}' needs a subfolder",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Look up a projection by name.
    pub fn projection(&self, name: &str) -> PlotResult<&ProjectionConfig> {
        self.projections.get(name).ok_or_else(|| {
            PlotError::config(format!(
                "unknown projection '{}', configured: {:?}",
                name,
                self.projections.keys().collect::<Vec<_>>()
            ))
        })
    }

    pub fn output_folder(&self, projection: &ProjectionConfig) -> PathBuf {
        self.output_dir.join(&projection.subfolder)
    }

    /// Built-in schemes plus the configured ones.
    pub fn scheme_registry(&self) -> PlotResult<SchemeRegistry> {
        SchemeRegistry::builtin().with_definitions(&self.schemes)
    }

    /// Apply command-line overrides, then validate again.
    pub fn with_overrides(mut self, pool_size: Option<usize>, chunk_size: Option<usize>) -> PlotResult<Self> {
        if let Some(pool_size) = pool_size {
            self.pool_size = pool_size;
        }
        if chunk_size.is_some() {
            self.chunk_size = chunk_size;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn expand_env_vars(content: &str) -> PlotResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut expr = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => expr.push(c),
                None => {
                    return Err(PlotError::config(format!(
                        "unclosed variable substitution: ${{{}",
                        expr
                    )))
                }
            }
        }

        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr.as_str(), None),
        };
        match (std::env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                return Err(PlotError::config(format!(
                    "environment variable '{}' is not set",
                    name
                )))
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_default() {
        let out = expand_env_vars("dir: ${PLOTTER_TEST_SURELY_UNSET:-/tmp/out}").unwrap();
        assert_eq!(out, "dir: /tmp/out");
    }

    #[test]
    fn test_expand_missing_without_default() {
        assert!(expand_env_vars("dir: ${PLOTTER_TEST_SURELY_UNSET}").is_err());
    }

    #[test]
    fn test_expand_unclosed() {
        assert!(expand_env_vars("dir: ${OPEN").is_err());
    }

    #[test]
    fn test_plain_dollar_kept() {
        assert_eq!(expand_env_vars("cost: $5").unwrap(), "cost: $5");
    }
}
