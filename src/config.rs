//! Run configuration.
//!
//! A run configuration ties a tagged mesh to a schema and a workflow and sets
//! solver options. Relative paths are resolved against the directory of the
//! configuration file.
//!
//! ```toml
//! mesh = "atrium.ply"
//! output = "out"
//!
//! [tags]
//! scalar = "anatomical_tags"
//! association = "face"
//!
//! [feature_tags]
//! MV = 1
//! LAA = 2
//!
//! [harmonic]
//! weights = "cotangent"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::algo::harmonic::HarmonicOptions;
use crate::algo::route::RouteOptions;
use crate::error::{Result, UacError};
use crate::mesh::TagAssociation;
use crate::schema::Schema;
use crate::workflow::Workflow;

/// Where the anatomical tags are read from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagSource {
    /// Name of the scalar property holding the tags.
    pub scalar: String,
    /// Element the scalar is attached to.
    pub association: TagAssociation,
}

impl Default for TagSource {
    fn default() -> Self {
        Self {
            scalar: "anatomical_tags".to_string(),
            association: TagAssociation::Face,
        }
    }
}

/// Settings of one pipeline run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Input mesh file.
    pub mesh: PathBuf,
    /// Schema file; the bundled left-atrium schema when absent.
    #[serde(default)]
    pub schema: Option<PathBuf>,
    /// Workflow file; the bundled left-atrium workflow when absent.
    #[serde(default)]
    pub workflow: Option<PathBuf>,
    /// Output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Tag property settings.
    #[serde(default)]
    pub tags: TagSource,
    /// Feature name to tag value.
    pub feature_tags: BTreeMap<String, i32>,
    /// Harmonic solver options.
    #[serde(default)]
    pub harmonic: HarmonicOptions,
    /// Shortest path options.
    #[serde(default)]
    pub routing: RouteOptions,
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

impl RunConfig {
    /// Parse a configuration from TOML text, resolving paths against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self> {
        let mut config: RunConfig = toml::from_str(text).map_err(|e| UacError::Config {
            path: base_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, base_dir).map_err(|e| match e {
            UacError::Config { message, .. } => UacError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };
        self.mesh = resolve(&self.mesh);
        self.output = resolve(&self.output);
        self.schema = self.schema.as_deref().map(resolve);
        self.workflow = self.workflow.as_deref().map(resolve);
    }

    /// Load the configured schema.
    pub fn load_schema(&self) -> Result<Schema> {
        match &self.schema {
            Some(path) => Schema::load(path),
            None => Schema::left_atrium(),
        }
    }

    /// Load the configured workflow.
    pub fn load_workflow(&self) -> Result<Workflow> {
        match &self.workflow {
            Some(path) => Workflow::load(path),
            None => Workflow::left_atrium(),
        }
    }

    /// Check that every feature tag named by the schema has a value.
    pub fn check_feature_tags(&self, schema: &Schema) -> Result<()> {
        let missing: Vec<&str> = schema
            .feature_tag_names()
            .into_iter()
            .filter(|name| !self.feature_tags.contains_key(*name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(UacError::Config {
                path: schema.origin().to_path_buf(),
                message: format!("no tag value configured for features: {}", missing.join(", ")),
            })
        }
    }
}
