//! Hierarchical artifact store.
//!
//! Artifacts are addressed by an [`ArtifactKind`] namespace and a [`KeyPath`]
//! of nested names mirroring the schema, e.g. `raw path LIPV/inner`. Every slot
//! the pipeline may write is declared up front from the schema; a slot moves
//! from empty to filled exactly once per run, and reading an empty slot fails
//! with [`UacError::MissingArtifact`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::artifact::{
    Artifact, CoordinatePath, CoordinateSubmesh, Marker, ParameterizedPath, RawPath, Submesh,
    SubmeshBoundary,
};
use crate::error::{Result, UacError};
use crate::schema::Schema;

/// A nested name sequence such as `["LIPV", "inner"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Build a key path from its components.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The name components.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Append a component, returning the extended key.
    pub fn child(&self, name: &str) -> Self {
        let mut parts = self.0.clone();
        parts.push(name.to_string());
        Self(parts)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(parts: [&str; N]) -> Self {
        Self::new(parts)
    }
}

impl From<&str> for KeyPath {
    fn from(name: &str) -> Self {
        Self::new([name])
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Single(String),
            Nested(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Single(name) => Ok(KeyPath(vec![name])),
            Repr::Nested(parts) if parts.is_empty() => {
                Err(serde::de::Error::custom("key path must not be empty"))
            }
            Repr::Nested(parts) => Ok(KeyPath(parts)),
        }
    }
}

/// Artifact namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Ordered vertex curves.
    RawPath,
    /// Single vertices.
    Marker,
    /// Paths with relative lengths.
    ParameterizedPath,
    /// Paths with UAC values.
    CoordinatePath,
    /// Stitched loops.
    SubmeshBoundary,
    /// Extracted regions.
    Submesh,
    /// Regions with UAC values.
    CoordinateSubmesh,
}

impl ArtifactKind {
    /// All namespaces in pipeline order.
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::RawPath,
        ArtifactKind::Marker,
        ArtifactKind::ParameterizedPath,
        ArtifactKind::CoordinatePath,
        ArtifactKind::SubmeshBoundary,
        ArtifactKind::Submesh,
        ArtifactKind::CoordinateSubmesh,
    ];

    fn label(self) -> &'static str {
        match self {
            ArtifactKind::RawPath => "raw path",
            ArtifactKind::Marker => "marker",
            ArtifactKind::ParameterizedPath => "parameterized path",
            ArtifactKind::CoordinatePath => "coordinate path",
            ArtifactKind::SubmeshBoundary => "submesh boundary",
            ArtifactKind::Submesh => "submesh",
            ArtifactKind::CoordinateSubmesh => "coordinate submesh",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Store of every artifact produced by a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    slots: BTreeMap<(ArtifactKind, KeyPath), Option<Artifact>>,
}

impl ArtifactStore {
    /// Create a store with no declared slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one empty slot per schema entry.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut store = Self::new();
        for key in schema.paths.keys() {
            store.declare(ArtifactKind::RawPath, key.clone());
        }
        for key in schema.markers.keys() {
            store.declare(ArtifactKind::Marker, key.clone());
        }
        for key in schema.parameterizations.keys() {
            store.declare(ArtifactKind::ParameterizedPath, key.clone());
        }
        for key in schema.coordinates.keys() {
            store.declare(ArtifactKind::CoordinatePath, key.clone());
        }
        for key in schema.submeshes.keys() {
            store.declare(ArtifactKind::SubmeshBoundary, key.clone());
            store.declare(ArtifactKind::Submesh, key.clone());
            store.declare(ArtifactKind::CoordinateSubmesh, key.clone());
        }
        store
    }

    /// Declare an empty slot. Existing slots are left untouched.
    pub fn declare(&mut self, kind: ArtifactKind, key: KeyPath) {
        self.slots.entry((kind, key)).or_insert(None);
    }

    /// Whether a slot exists for the key.
    pub fn is_declared(&self, kind: ArtifactKind, key: &KeyPath) -> bool {
        self.slots.contains_key(&(kind, key.clone()))
    }

    /// Whether the slot for the key has been filled.
    pub fn contains(&self, kind: ArtifactKind, key: &KeyPath) -> bool {
        matches!(self.slots.get(&(kind, key.clone())), Some(Some(_)))
    }

    /// Store an artifact in its declared slot.
    ///
    /// A filled slot is replaced as a whole.
    pub fn insert(&mut self, key: KeyPath, artifact: Artifact) -> Result<()> {
        let kind = artifact.kind();
        match self.slots.get_mut(&(kind, key.clone())) {
            None => Err(UacError::UnknownKey { kind, key }),
            Some(slot) => {
                if slot.is_some() {
                    log::warn!("replacing {} {}", kind, key);
                }
                *slot = Some(artifact);
                Ok(())
            }
        }
    }

    /// Look up a produced artifact.
    pub fn get(&self, kind: ArtifactKind, key: &KeyPath) -> Result<&Artifact> {
        match self.slots.get(&(kind, key.clone())) {
            None => Err(UacError::UnknownKey {
                kind,
                key: key.clone(),
            }),
            Some(None) => Err(UacError::MissingArtifact {
                kind,
                key: key.clone(),
            }),
            Some(Some(artifact)) => Ok(artifact),
        }
    }

    /// Declared keys of one namespace, in key order.
    pub fn keys(&self, kind: ArtifactKind) -> impl Iterator<Item = &KeyPath> + '_ {
        self.slots
            .keys()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, key)| key)
    }

    /// Produced artifacts of one namespace, in key order.
    pub fn produced(&self, kind: ArtifactKind) -> impl Iterator<Item = (&KeyPath, &Artifact)> + '_ {
        self.slots
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .filter_map(|((_, key), slot)| slot.as_ref().map(|a| (key, a)))
    }

    /// Number of filled slots.
    pub fn num_produced(&self) -> usize {
        self.slots.values().filter(|s| s.is_some()).count()
    }

    /// Number of declared slots.
    pub fn num_declared(&self) -> usize {
        self.slots.len()
    }

    fn mismatch(key: &KeyPath, expected: ArtifactKind, found: &Artifact) -> UacError {
        UacError::ArtifactKindMismatch {
            key: key.clone(),
            expected,
            found: found.kind(),
        }
    }

    /// Look up a raw path.
    pub fn raw_path(&self, key: &KeyPath) -> Result<&RawPath> {
        match self.get(ArtifactKind::RawPath, key)? {
            Artifact::RawPath(path) => Ok(path),
            other => Err(Self::mismatch(key, ArtifactKind::RawPath, other)),
        }
    }

    /// Look up a marker vertex.
    pub fn marker(&self, key: &KeyPath) -> Result<Marker> {
        match self.get(ArtifactKind::Marker, key)? {
            Artifact::Marker { vertex } => Ok(*vertex),
            other => Err(Self::mismatch(key, ArtifactKind::Marker, other)),
        }
    }

    /// Look up a parameterized path.
    pub fn parameterized_path(&self, key: &KeyPath) -> Result<&ParameterizedPath> {
        match self.get(ArtifactKind::ParameterizedPath, key)? {
            Artifact::ParameterizedPath(path) => Ok(path),
            other => Err(Self::mismatch(key, ArtifactKind::ParameterizedPath, other)),
        }
    }

    /// Look up a coordinate path.
    pub fn coordinate_path(&self, key: &KeyPath) -> Result<&CoordinatePath> {
        match self.get(ArtifactKind::CoordinatePath, key)? {
            Artifact::CoordinatePath(path) => Ok(path),
            other => Err(Self::mismatch(key, ArtifactKind::CoordinatePath, other)),
        }
    }

    /// Look up a submesh boundary.
    pub fn submesh_boundary(&self, key: &KeyPath) -> Result<&SubmeshBoundary> {
        match self.get(ArtifactKind::SubmeshBoundary, key)? {
            Artifact::SubmeshBoundary(boundary) => Ok(boundary),
            other => Err(Self::mismatch(key, ArtifactKind::SubmeshBoundary, other)),
        }
    }

    /// Look up a submesh.
    pub fn submesh(&self, key: &KeyPath) -> Result<&Submesh> {
        match self.get(ArtifactKind::Submesh, key)? {
            Artifact::Submesh(submesh) => Ok(submesh),
            other => Err(Self::mismatch(key, ArtifactKind::Submesh, other)),
        }
    }

    /// Look up a coordinate submesh.
    pub fn coordinate_submesh(&self, key: &KeyPath) -> Result<&CoordinateSubmesh> {
        match self.get(ArtifactKind::CoordinateSubmesh, key)? {
            Artifact::CoordinateSubmesh(submesh) => Ok(submesh),
            other => Err(Self::mismatch(key, ArtifactKind::CoordinateSubmesh, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{vertex_ids, VertexId};

    fn store() -> ArtifactStore {
        let mut store = ArtifactStore::new();
        store.declare(ArtifactKind::RawPath, KeyPath::from(["LIPV", "inner"]));
        store.declare(ArtifactKind::Marker, KeyPath::from(["LIPV", "inner", "anchor"]));
        store
    }

    #[test]
    fn test_read_before_write_fails() {
        let store = store();
        let key = KeyPath::from(["LIPV", "inner"]);
        assert!(store.is_declared(ArtifactKind::RawPath, &key));
        assert!(matches!(
            store.raw_path(&key),
            Err(UacError::MissingArtifact { kind: ArtifactKind::RawPath, .. })
        ));
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = store();
        let key = KeyPath::from(["LIPV", "inner"]);
        let path = RawPath::closed(vertex_ids(&[1, 2, 3]));
        store.insert(key.clone(), Artifact::RawPath(path.clone())).unwrap();

        assert!(store.contains(ArtifactKind::RawPath, &key));
        assert_eq!(store.raw_path(&key).unwrap(), &path);
        assert_eq!(store.num_produced(), 1);
        assert_eq!(store.produced(ArtifactKind::RawPath).count(), 1);

        // Full replacement is allowed.
        let replacement = RawPath::closed(vertex_ids(&[3, 2, 1]));
        store.insert(key.clone(), Artifact::RawPath(replacement.clone())).unwrap();
        assert_eq!(store.raw_path(&key).unwrap(), &replacement);
    }

    #[test]
    fn test_undeclared_key_rejected() {
        let mut store = store();
        let key = KeyPath::from(["nowhere"]);
        let result = store.insert(key.clone(), Artifact::Marker { vertex: VertexId::new(0) });
        assert!(matches!(result, Err(UacError::UnknownKey { kind: ArtifactKind::Marker, .. })));
        assert!(matches!(store.marker(&key), Err(UacError::UnknownKey { .. })));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut store = store();
        // The same key in a different namespace is a different slot.
        let key = KeyPath::from(["LIPV", "inner"]);
        let result = store.insert(key, Artifact::Marker { vertex: VertexId::new(0) });
        assert!(result.is_err());
    }

    #[test]
    fn test_key_path_forms() {
        #[derive(Deserialize)]
        struct Holder {
            a: KeyPath,
            b: KeyPath,
        }
        let holder: Holder = toml::from_str(
            r#"
            a = "MV"
            b = ["LIPV", "inner"]
            "#,
        )
        .unwrap();
        assert_eq!(holder.a, KeyPath::from("MV"));
        assert_eq!(holder.b.to_string(), "LIPV/inner");
        assert_eq!(holder.b.child("anchor"), KeyPath::from(["LIPV", "inner", "anchor"]));
        assert_eq!(ArtifactKind::CoordinateSubmesh.to_string(), "coordinate submesh");
    }
}
