//! Anatomical schema.
//!
//! The schema names every path, marker, parameterization, coordinate anchor
//! list and submesh of a coordinate system and states how they reference each
//! other. It is plain data read from TOML: each section is a tree of nested
//! tables whose leaves are records, and a leaf is addressed by its dotted name
//! sequence as a [`KeyPath`].
//!
//! ```toml
//! [paths.LIPV.inner]
//! type = "boundary"
//! feature_tag = "LIPV"
//!
//! [markers.LIPV.inner.anchor]
//! path = ["anchor", "LIPV_LAA"]
//! position_type = "index"
//! position = 0
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UacError};
use crate::store::{ArtifactKind, KeyPath};

/// Bundled schema of the left atrium.
pub const LEFT_ATRIUM_SCHEMA: &str = include_str!("../schemas/left_atrium/schema.toml");

/// One end of a connection path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// A single marker vertex.
    Marker(KeyPath),
    /// Every vertex of a raw path.
    Path(KeyPath),
}

/// Definition of a boundary path extracted from anatomical tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundaryConfig {
    /// Name of the feature tag, resolved through the run configuration.
    pub feature_tag: String,
    /// Keep the part of the feature boundary that lies on the mesh boundary.
    #[serde(default)]
    pub coincides_with_mesh_boundary: bool,
}

/// Definition of a constrained shortest path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Where the path starts.
    pub start: Endpoint,
    /// Where the path ends.
    pub end: Endpoint,
    /// Paths whose vertices the route may not touch.
    #[serde(default)]
    pub inadmissible_contact: Vec<KeyPath>,
    /// Paths whose edges the route may not run along.
    #[serde(default)]
    pub inadmissible_along: Vec<KeyPath>,
}

/// A raw path entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathConfig {
    /// Ordered boundary of a tagged region.
    Boundary(BoundaryConfig),
    /// Shortest path between two vertex subsets.
    Connection(ConnectionConfig),
}

/// How a marker position is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerPosition {
    /// Index into a raw path; negative values count from the end.
    Index(i64),
    /// Relative length on a parameterized path.
    Relative(f64),
}

/// A marker entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMarkerConfig")]
pub struct MarkerConfig {
    /// Raw path (index mode) or parameterized path (relative mode).
    pub path: KeyPath,
    /// Position on that path.
    pub position: MarkerPosition,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum PositionType {
    Index,
    Relative,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMarkerConfig {
    path: KeyPath,
    position_type: PositionType,
    position: Number,
}

impl TryFrom<RawMarkerConfig> for MarkerConfig {
    type Error = String;

    fn try_from(raw: RawMarkerConfig) -> std::result::Result<Self, Self::Error> {
        let position = match (raw.position_type, raw.position) {
            (PositionType::Index, Number::Integer(i)) => MarkerPosition::Index(i),
            (PositionType::Index, Number::Float(x)) => {
                return Err(format!("index position must be an integer, got {x}"))
            }
            (PositionType::Relative, Number::Integer(i)) => MarkerPosition::Relative(i as f64),
            (PositionType::Relative, Number::Float(x)) => MarkerPosition::Relative(x),
        };
        Ok(MarkerConfig {
            path: raw.path,
            position,
        })
    }
}

/// A path parameterization entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterizationConfig {
    /// Raw path to parameterize.
    pub path: KeyPath,
    /// Markers in target order.
    pub markers: Vec<KeyPath>,
    /// Target relative length of each marker.
    pub marker_relative_positions: Vec<f64>,
}

/// A coordinate assignment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateConfig {
    /// Parameterized path to assign coordinates on.
    pub path: KeyPath,
    /// Anchor relative lengths.
    pub relative_positions: Vec<f64>,
    /// Anchor `(alpha, beta)` values.
    pub coordinates: Vec<[f64; 2]>,
}

/// A submesh entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmeshConfig {
    /// Coordinate paths forming the boundary loop.
    pub boundary_paths: Vec<KeyPath>,
    /// Relative-length interval kept from each boundary path.
    pub portions: Vec<[f64; 2]>,
    /// A raw path known to lie outside the submesh.
    pub outside_path: KeyPath,
}

/// A complete anatomical schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Raw path definitions.
    pub paths: BTreeMap<KeyPath, PathConfig>,
    /// Marker definitions.
    pub markers: BTreeMap<KeyPath, MarkerConfig>,
    /// Parameterization definitions.
    pub parameterizations: BTreeMap<KeyPath, ParameterizationConfig>,
    /// Coordinate anchor definitions.
    pub coordinates: BTreeMap<KeyPath, CoordinateConfig>,
    /// Submesh definitions.
    pub submeshes: BTreeMap<KeyPath, SubmeshConfig>,
    origin: PathBuf,
}

/// Flatten one section of nested tables into key paths.
///
/// A table is a leaf when it contains `leaf_field`.
fn flatten_section<T>(
    section: &str,
    table: &toml::Table,
    leaf_field: &str,
    prefix: &mut Vec<String>,
    out: &mut BTreeMap<KeyPath, T>,
) -> std::result::Result<(), String>
where
    T: for<'de> Deserialize<'de>,
{
    for (name, value) in table {
        prefix.push(name.clone());
        let key = KeyPath::new(prefix.iter().cloned());
        match value {
            toml::Value::Table(child) if child.contains_key(leaf_field) => {
                let record = T::deserialize(value.clone())
                    .map_err(|e| format!("{section}.{}: {}", prefix.join("."), e.message()))?;
                out.insert(key, record);
            }
            toml::Value::Table(child) => flatten_section(section, child, leaf_field, prefix, out)?,
            other => {
                return Err(format!(
                    "{section}.{}: expected a table, found {}",
                    prefix.join("."),
                    other.type_str()
                ))
            }
        }
        prefix.pop();
    }
    Ok(())
}

fn section<T>(root: &toml::Table, name: &str, leaf_field: &str) -> std::result::Result<BTreeMap<KeyPath, T>, String>
where
    T: for<'de> Deserialize<'de>,
{
    let mut out = BTreeMap::new();
    match root.get(name) {
        None => {}
        Some(toml::Value::Table(table)) => {
            flatten_section(name, table, leaf_field, &mut Vec::new(), &mut out)?
        }
        Some(other) => return Err(format!("{name}: expected a table, found {}", other.type_str())),
    }
    Ok(out)
}

impl Schema {
    const SECTIONS: [&'static str; 5] = ["paths", "markers", "parameterizations", "coordinates", "submeshes"];

    /// Parse a schema from TOML text. `origin` labels errors.
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let config_error = |message: String| UacError::Config {
            path: origin.clone(),
            message,
        };

        let root: toml::Table = text.parse().map_err(|e: toml::de::Error| config_error(e.to_string()))?;
        if let Some(unknown) = root.keys().find(|k| !Self::SECTIONS.contains(&k.as_str())) {
            return Err(config_error(format!("unknown section '{unknown}'")));
        }

        Ok(Schema {
            paths: section(&root, "paths", "type").map_err(config_error)?,
            markers: section(&root, "markers", "position_type").map_err(config_error)?,
            parameterizations: section(&root, "parameterizations", "markers").map_err(config_error)?,
            coordinates: section(&root, "coordinates", "relative_positions").map_err(config_error)?,
            submeshes: section(&root, "submeshes", "boundary_paths").map_err(config_error)?,
            origin,
        })
    }

    /// Load a schema file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text, path)
    }

    /// The bundled left-atrium schema.
    pub fn left_atrium() -> Result<Self> {
        Self::from_toml_str(LEFT_ATRIUM_SCHEMA, "<left_atrium schema>")
    }

    /// Where the schema was read from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Whether the schema declares an artifact slot.
    pub fn declares(&self, kind: ArtifactKind, key: &KeyPath) -> bool {
        match kind {
            ArtifactKind::RawPath => self.paths.contains_key(key),
            ArtifactKind::Marker => self.markers.contains_key(key),
            ArtifactKind::ParameterizedPath => self.parameterizations.contains_key(key),
            ArtifactKind::CoordinatePath => self.coordinates.contains_key(key),
            ArtifactKind::SubmeshBoundary | ArtifactKind::Submesh | ArtifactKind::CoordinateSubmesh => {
                self.submeshes.contains_key(key)
            }
        }
    }

    /// All keys of the section backing an artifact namespace, in key order.
    pub fn keys(&self, kind: ArtifactKind) -> Vec<KeyPath> {
        match kind {
            ArtifactKind::RawPath => self.paths.keys().cloned().collect(),
            ArtifactKind::Marker => self.markers.keys().cloned().collect(),
            ArtifactKind::ParameterizedPath => self.parameterizations.keys().cloned().collect(),
            ArtifactKind::CoordinatePath => self.coordinates.keys().cloned().collect(),
            ArtifactKind::SubmeshBoundary | ArtifactKind::Submesh | ArtifactKind::CoordinateSubmesh => {
                self.submeshes.keys().cloned().collect()
            }
        }
    }

    /// Feature tag names referenced by boundary paths.
    pub fn feature_tag_names(&self) -> BTreeSet<&str> {
        self.paths
            .values()
            .filter_map(|p| match p {
                PathConfig::Boundary(b) => Some(b.feature_tag.as_str()),
                PathConfig::Connection(_) => None,
            })
            .collect()
    }

    /// Check referential integrity and value ranges without a mesh.
    ///
    /// All problems are reported together.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Problems::default();

        for (key, path) in &self.paths {
            if let PathConfig::Connection(c) = path {
                for endpoint in [&c.start, &c.end] {
                    match endpoint {
                        Endpoint::Marker(m) => problems.reference(key, "marker", m, self.markers.contains_key(m)),
                        Endpoint::Path(p) => problems.reference(key, "path", p, self.paths.contains_key(p)),
                    }
                }
                for p in c.inadmissible_contact.iter().chain(&c.inadmissible_along) {
                    problems.reference(key, "path", p, self.paths.contains_key(p));
                }
            }
        }

        for (key, marker) in &self.markers {
            match marker.position {
                MarkerPosition::Index(_) => {
                    problems.reference(key, "path", &marker.path, self.paths.contains_key(&marker.path))
                }
                MarkerPosition::Relative(t) => {
                    problems.reference(
                        key,
                        "parameterization",
                        &marker.path,
                        self.parameterizations.contains_key(&marker.path),
                    );
                    if !(0.0..=1.0).contains(&t) {
                        problems.push(key, format!("relative position {t} outside [0, 1]"));
                    }
                }
            }
        }

        for (key, param) in &self.parameterizations {
            problems.reference(key, "path", &param.path, self.paths.contains_key(&param.path));
            for m in &param.markers {
                problems.reference(key, "marker", m, self.markers.contains_key(m));
            }
            if param.markers.len() != param.marker_relative_positions.len() {
                problems.push(key, "markers and marker_relative_positions differ in length".to_string());
            }
            if param.markers.is_empty() {
                problems.push(key, "no markers".to_string());
            }
            problems.positions(key, &param.marker_relative_positions);
        }

        for (key, coords) in &self.coordinates {
            problems.reference(
                key,
                "parameterization",
                &coords.path,
                self.parameterizations.contains_key(&coords.path),
            );
            if coords.relative_positions.len() != coords.coordinates.len() {
                problems.push(key, "relative_positions and coordinates differ in length".to_string());
            }
            if coords.relative_positions.len() < 2 {
                problems.push(key, "at least two anchors are required".to_string());
            }
            problems.positions(key, &coords.relative_positions);
        }

        for (key, submesh) in &self.submeshes {
            for p in &submesh.boundary_paths {
                problems.reference(key, "coordinate path", p, self.coordinates.contains_key(p));
            }
            problems.reference(key, "path", &submesh.outside_path, self.paths.contains_key(&submesh.outside_path));
            if submesh.boundary_paths.len() != submesh.portions.len() {
                problems.push(key, "boundary_paths and portions differ in length".to_string());
            }
            if submesh.boundary_paths.is_empty() {
                problems.push(key, "no boundary paths".to_string());
            }
            for &[lo, hi] in &submesh.portions {
                if !(0.0 <= lo && lo <= hi && hi <= 1.0) {
                    problems.push(key, format!("portion [{lo}, {hi}] is not an interval in [0, 1]"));
                }
            }
        }

        problems.into_result(&self.origin)
    }
}

#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, key: &KeyPath, message: String) {
        self.0.push(format!("{key}: {message}"));
    }

    fn reference(&mut self, key: &KeyPath, what: &str, target: &KeyPath, exists: bool) {
        if !exists {
            self.push(key, format!("references undeclared {what} {target}"));
        }
    }

    fn positions(&mut self, key: &KeyPath, values: &[f64]) {
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            self.push(key, "relative positions must lie in [0, 1]".to_string());
        }
        if values.windows(2).any(|w| w[0] >= w[1]) {
            self.push(key, "relative positions must be strictly increasing".to_string());
        }
    }

    fn into_result(self, origin: &Path) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(UacError::Config {
                path: origin.to_path_buf(),
                message: self.0.join("; "),
            })
        }
    }
}

impl fmt::Display for MarkerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerPosition::Index(i) => write!(f, "index {i}"),
            MarkerPosition::Relative(t) => write!(f, "relative {t}"),
        }
    }
}
