//! JSON export of pipeline artifacts.
//!
//! Key paths are written as `/`-joined strings. Every artifact object carries
//! a `kind` field naming its namespace.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::artifact::{Artifact, CoordinateSubmesh};
use crate::error::Result;
use crate::store::{ArtifactKind, ArtifactStore};

#[derive(Serialize)]
struct StoreDump<'a> {
    artifacts: Vec<Entry<'a>>,
}

#[derive(Serialize)]
struct Entry<'a> {
    key: String,
    #[serde(flatten)]
    artifact: &'a Artifact,
}

/// Write every produced artifact, grouped by namespace in pipeline order.
pub fn write_store<W: Write>(writer: W, store: &ArtifactStore) -> Result<()> {
    let artifacts = ArtifactKind::ALL
        .iter()
        .flat_map(|&kind| store.produced(kind))
        .map(|(key, artifact)| Entry {
            key: key.to_string(),
            artifact,
        })
        .collect();
    serde_json::to_writer_pretty(writer, &StoreDump { artifacts }).map_err(std::io::Error::from)?;
    Ok(())
}

/// Write the coordinate submeshes as one object keyed by submesh name.
pub fn write_coordinate_submeshes<W: Write>(writer: W, store: &ArtifactStore) -> Result<()> {
    let submeshes: BTreeMap<String, &CoordinateSubmesh> = store
        .produced(ArtifactKind::CoordinateSubmesh)
        .filter_map(|(key, artifact)| match artifact {
            Artifact::CoordinateSubmesh(c) => Some((key.to_string(), c)),
            _ => None,
        })
        .collect();
    serde_json::to_writer_pretty(writer, &submeshes).map_err(std::io::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::RawPath;
    use crate::mesh::{vertex_ids, VertexId};
    use crate::store::KeyPath;

    fn store() -> ArtifactStore {
        let mut store = ArtifactStore::new();
        store.declare(ArtifactKind::RawPath, KeyPath::from(["LIPV", "inner"]));
        store.declare(ArtifactKind::Marker, KeyPath::from(["LIPV", "anterior"]));
        store.declare(ArtifactKind::Marker, KeyPath::from(["LIPV", "posterior"]));
        store
            .insert(
                KeyPath::from(["LIPV", "inner"]),
                Artifact::RawPath(RawPath::closed(vertex_ids(&[3, 4, 5]))),
            )
            .unwrap();
        store
            .insert(
                KeyPath::from(["LIPV", "anterior"]),
                Artifact::Marker {
                    vertex: VertexId::new(4),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn test_store_dump_lists_produced_artifacts() {
        let mut out = Vec::new();
        write_store(&mut out, &store()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        let artifacts = value["artifacts"].as_array().unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0]["key"], "LIPV/inner");
        assert_eq!(artifacts[0]["kind"], "raw_path");
        assert_eq!(artifacts[0]["closed"], true);
        assert_eq!(artifacts[1]["kind"], "marker");
        assert_eq!(artifacts[1]["vertex"], 4);
    }

    #[test]
    fn test_no_coordinate_submeshes() {
        let mut out = Vec::new();
        write_coordinate_submeshes(&mut out, &store()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{}");
    }
}
