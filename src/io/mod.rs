//! Mesh input and result output.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | PLY | `.ply` | ✓ | ✓ | Tag scalars on vertices or faces; results carry `alpha`, `beta` |
//! | JSON | `.json` | ✗ | ✓ | Artifact store and coordinate submeshes |
//!
//! # Usage
//!
//! ```no_run
//! use atrium::io::{load_tagged, save_results};
//! use atrium::mesh::TagAssociation;
//! use atrium::store::ArtifactStore;
//!
//! let mesh = load_tagged("atrium.ply", "anatomical_tags", TagAssociation::Vertex).unwrap();
//! let store = ArtifactStore::new();
//! save_results(&mesh, &store, "output").unwrap();
//! ```

pub mod json;
pub mod ply;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::artifact::Artifact;
use crate::error::{Result, UacError};
use crate::mesh::{HalfEdgeMesh, TagAssociation};
use crate::store::{ArtifactKind, ArtifactStore};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| UacError::UnsupportedFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            })
    }
}

/// Load an untagged mesh with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Ply => ply::load(path),
    }
}

/// Load a mesh together with its anatomical tag scalar.
pub fn load_tagged<P: AsRef<Path>>(path: P, scalar: &str, association: TagAssociation) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let tags = ply::TagProperty {
        name: scalar,
        association,
    };
    match Format::from_path(path)? {
        Format::Ply => ply::load_tagged(path, tags),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| UacError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write all results into `dir`, creating it if needed.
///
/// Writes `artifacts.json` with every produced artifact,
/// `coordinates.json` with the coordinate submeshes and one PLY file per
/// coordinate submesh, named after its key. Returns the written paths.
pub fn save_results<P: AsRef<Path>>(mesh: &HalfEdgeMesh, store: &ArtifactStore, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| UacError::SaveError {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut written = Vec::new();

    let path = dir.join("artifacts.json");
    let mut writer = create(&path)?;
    json::write_store(&mut writer, store)?;
    writer.flush()?;
    written.push(path);

    let path = dir.join("coordinates.json");
    let mut writer = create(&path)?;
    json::write_coordinate_submeshes(&mut writer, store)?;
    writer.flush()?;
    written.push(path);

    for (key, artifact) in store.produced(ArtifactKind::CoordinateSubmesh) {
        if let Artifact::CoordinateSubmesh(result) = artifact {
            let path = dir.join(format!("{}.ply", key.parts().join("_")));
            ply::save_coordinate_submesh(mesh, result, &path)?;
            written.push(path);
        }
    }

    log::info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}
