//! The coordinate pipeline driver.
//!
//! [`UacConstructor`] runs schedule steps over a tagged mesh. Every step reads
//! its inputs from the artifact store, calls the matching algorithm and
//! stores the result under the entry's key. A failing entry aborts the run
//! with the stage and key attached; artifacts stored before the failure stay
//! in place for inspection.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use atrium::construct::UacConstructor;
//! use atrium::schema::Schema;
//! use atrium::workflow::Workflow;
//!
//! let mesh = atrium::io::load_tagged("atrium.ply", "anatomical_tags", Default::default()).unwrap();
//! let schema = Schema::left_atrium().unwrap();
//! let tags: BTreeMap<String, i32> = [("MV", 1), ("LAA", 2), ("LIPV", 3), ("LSPV", 4), ("RSPV", 5), ("RIPV", 6)]
//!     .into_iter()
//!     .map(|(name, tag)| (name.to_string(), tag))
//!     .collect();
//!
//! let mut constructor = UacConstructor::new(&mesh, &schema).with_feature_tags(tags);
//! constructor.construct_segmentation(&Workflow::left_atrium().unwrap()).unwrap();
//! constructor.construct_uacs().unwrap();
//! println!("{} artifacts", constructor.store().num_produced());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::algo::boundary::feature_boundary;
use crate::algo::coordinates::assign_coordinates;
use crate::algo::harmonic::{harmonic_extension, HarmonicOptions};
use crate::algo::marker::{marker_at_index, marker_at_relative};
use crate::algo::parameterize::parameterize_path;
use crate::algo::region::extract_region;
use crate::algo::route::{constrained_shortest_path, Admissibility, RouteOptions};
use crate::algo::stitch::stitch_boundary;
use crate::algo::Progress;
use crate::artifact::Artifact;
use crate::error::{Result, UacError};
use crate::mesh::{HalfEdgeMesh, VertexId};
use crate::schema::{Endpoint, MarkerPosition, PathConfig, Schema, SubmeshConfig};
use crate::store::{ArtifactKind, ArtifactStore, KeyPath};
use crate::workflow::{StageKind, Step, Workflow};

/// Runs pipeline stages and owns their artifacts.
#[derive(Debug)]
pub struct UacConstructor<'a> {
    mesh: &'a HalfEdgeMesh,
    schema: &'a Schema,
    feature_tags: BTreeMap<String, i32>,
    harmonic: HarmonicOptions,
    routing: RouteOptions,
    store: ArtifactStore,
    progress: Progress,
}

impl<'a> UacConstructor<'a> {
    /// Create a constructor with an empty store declared from `schema`.
    pub fn new(mesh: &'a HalfEdgeMesh, schema: &'a Schema) -> Self {
        Self {
            mesh,
            schema,
            feature_tags: BTreeMap::new(),
            harmonic: HarmonicOptions::default(),
            routing: RouteOptions::default(),
            store: ArtifactStore::from_schema(schema),
            progress: Progress::none(),
        }
    }

    /// Set the integer value of each feature tag name.
    pub fn with_feature_tags(mut self, feature_tags: BTreeMap<String, i32>) -> Self {
        self.feature_tags = feature_tags;
        self
    }

    /// Set the harmonic solver options.
    pub fn with_harmonic_options(mut self, options: HarmonicOptions) -> Self {
        self.harmonic = options;
        self
    }

    /// Set the path router options.
    pub fn with_route_options(mut self, options: RouteOptions) -> Self {
        self.routing = options;
        self
    }

    /// Report one tick per processed entry.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Continue from previously produced artifacts.
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = store;
        self
    }

    /// The artifacts produced so far.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Consume the constructor and return its artifacts.
    pub fn into_store(self) -> ArtifactStore {
        self.store
    }

    /// Run every step of a segmentation schedule in order.
    pub fn construct_segmentation(&mut self, workflow: &Workflow) -> Result<()> {
        let total = workflow.steps.len();
        for (i, step) in workflow.steps.iter().enumerate() {
            log::info!("step {}/{}: {} ({})", i + 1, total, step.id, step.kind);
            if !step.description.is_empty() {
                log::debug!("{}", step.description);
            }
            self.run_step(step)?;
        }
        Ok(())
    }

    /// Assign coordinates, stitch boundaries, extract submeshes and extend
    /// coordinates over them, for every declared entry.
    pub fn construct_uacs(&mut self) -> Result<()> {
        for step in &Workflow::uac_stages().steps {
            log::info!("{}", step.kind);
            self.run_step(step)?;
        }
        Ok(())
    }

    /// Run one step over its entries.
    pub fn run_step(&mut self, step: &Step) -> Result<()> {
        let keys = step.keys(self.schema);
        let total = keys.len();
        for (i, key) in keys.iter().enumerate() {
            match self.run_stage(step.kind, key).map_err(|e| e.in_stage(step.kind, key))? {
                Some(artifact) => {
                    log::info!("{} {}", step.kind, key);
                    self.store
                        .insert(key.clone(), artifact)
                        .map_err(|e| e.in_stage(step.kind, key))?;
                }
                None => log::debug!("{} skips {}", step.kind, key),
            }
            self.progress.report(i + 1, total, &format!("{} {}", step.kind, key));
        }
        Ok(())
    }

    /// Compute the artifact of one stage for one key without storing it.
    ///
    /// Path stages return `None` for keys of the other path type.
    pub fn run_stage(&self, kind: StageKind, key: &KeyPath) -> Result<Option<Artifact>> {
        match kind {
            StageKind::FeatureExtraction => self.extract_feature(key),
            StageKind::ShortestPathConstruction => self.construct_shortest_path(key),
            StageKind::MarkerExtraction => self.extract_marker(key).map(Some),
            StageKind::PathParameterization => self.parameterize(key).map(Some),
            StageKind::CoordinateAssignment => self.assign_coordinates(key).map(Some),
            StageKind::SubmeshBoundaryExtraction => self.extract_submesh_boundary(key).map(Some),
            StageKind::SubmeshExtraction => self.extract_submesh(key).map(Some),
            StageKind::HarmonicExtension => self.extend_harmonically(key).map(Some),
        }
    }

    fn unknown(kind: ArtifactKind, key: &KeyPath) -> UacError {
        UacError::UnknownKey {
            kind,
            key: key.clone(),
        }
    }

    fn path_config(&self, key: &KeyPath) -> Result<&'a PathConfig> {
        self.schema
            .paths
            .get(key)
            .ok_or_else(|| Self::unknown(ArtifactKind::RawPath, key))
    }

    fn extract_feature(&self, key: &KeyPath) -> Result<Option<Artifact>> {
        let PathConfig::Boundary(config) = self.path_config(key)? else {
            return Ok(None);
        };
        let tag = *self
            .feature_tags
            .get(&config.feature_tag)
            .ok_or_else(|| UacError::Config {
                path: self.schema.origin().to_path_buf(),
                message: format!("no tag value configured for feature '{}'", config.feature_tag),
            })?;
        let path = feature_boundary(self.mesh, tag, config.coincides_with_mesh_boundary)?;
        log::debug!("{}: {} boundary vertices", key, path.len());
        Ok(Some(Artifact::RawPath(path)))
    }

    fn endpoint_vertices(&self, endpoint: &Endpoint) -> Result<Vec<VertexId>> {
        match endpoint {
            Endpoint::Marker(key) => Ok(vec![self.store.marker(key)?]),
            Endpoint::Path(key) => Ok(self.store.raw_path(key)?.vertices.clone()),
        }
    }

    fn path_union(&self, keys: &[KeyPath]) -> Result<BTreeSet<VertexId>> {
        let mut union = BTreeSet::new();
        for key in keys {
            union.extend(self.store.raw_path(key)?.vertices.iter().copied());
        }
        Ok(union)
    }

    fn construct_shortest_path(&self, key: &KeyPath) -> Result<Option<Artifact>> {
        let PathConfig::Connection(config) = self.path_config(key)? else {
            return Ok(None);
        };
        let start = self.endpoint_vertices(&config.start)?;
        let end = self.endpoint_vertices(&config.end)?;
        let admissibility = Admissibility::new()
            .with_contact(self.path_union(&config.inadmissible_contact)?)
            .with_along(self.path_union(&config.inadmissible_along)?);
        let path = constrained_shortest_path(self.mesh, &start, &end, &admissibility, &self.routing)?;
        Ok(Some(Artifact::RawPath(path)))
    }

    fn extract_marker(&self, key: &KeyPath) -> Result<Artifact> {
        let config = self
            .schema
            .markers
            .get(key)
            .ok_or_else(|| Self::unknown(ArtifactKind::Marker, key))?;
        let vertex = match config.position {
            MarkerPosition::Index(i) => marker_at_index(self.store.raw_path(&config.path)?, i)?,
            MarkerPosition::Relative(t) => {
                marker_at_relative(self.store.parameterized_path(&config.path)?, t)?
            }
        };
        log::debug!("{} -> vertex {}", key, vertex);
        Ok(Artifact::Marker { vertex })
    }

    fn parameterize(&self, key: &KeyPath) -> Result<Artifact> {
        let config = self
            .schema
            .parameterizations
            .get(key)
            .ok_or_else(|| Self::unknown(ArtifactKind::ParameterizedPath, key))?;
        let path = self.store.raw_path(&config.path)?;
        let markers = config
            .markers
            .iter()
            .map(|m| self.store.marker(m))
            .collect::<Result<Vec<_>>>()?;
        let parameterized = parameterize_path(self.mesh, path, &markers, &config.marker_relative_positions)?;
        Ok(Artifact::ParameterizedPath(parameterized))
    }

    fn assign_coordinates(&self, key: &KeyPath) -> Result<Artifact> {
        let config = self
            .schema
            .coordinates
            .get(key)
            .ok_or_else(|| Self::unknown(ArtifactKind::CoordinatePath, key))?;
        let path = self.store.parameterized_path(&config.path)?;
        let coordinates = assign_coordinates(path, &config.relative_positions, &config.coordinates)?;
        Ok(Artifact::CoordinatePath(coordinates))
    }

    fn submesh_config(&self, kind: ArtifactKind, key: &KeyPath) -> Result<&'a SubmeshConfig> {
        self.schema
            .submeshes
            .get(key)
            .ok_or_else(|| Self::unknown(kind, key))
    }

    fn extract_submesh_boundary(&self, key: &KeyPath) -> Result<Artifact> {
        let config = self.submesh_config(ArtifactKind::SubmeshBoundary, key)?;
        if config.boundary_paths.len() != config.portions.len() {
            return Err(UacError::invalid_param(
                "portions",
                config.portions.len(),
                "must have one portion per boundary path",
            ));
        }
        let segments = config
            .boundary_paths
            .iter()
            .zip(&config.portions)
            .map(|(path, &[lo, hi])| self.store.coordinate_path(path)?.portion(lo, hi))
            .collect::<Result<Vec<_>>>()?;
        Ok(Artifact::SubmeshBoundary(stitch_boundary(segments)?))
    }

    fn extract_submesh(&self, key: &KeyPath) -> Result<Artifact> {
        let config = self.submesh_config(ArtifactKind::Submesh, key)?;
        let boundary = self.store.submesh_boundary(key)?;
        let outside_path = self.store.raw_path(&config.outside_path)?;

        let on_loop: BTreeSet<VertexId> = boundary.vertices.iter().copied().collect();
        let outside = outside_path
            .vertices
            .iter()
            .copied()
            .find(|v| !on_loop.contains(v))
            .ok_or_else(|| UacError::RegionNotFound {
                reason: format!("every vertex of {} lies on the boundary loop", config.outside_path),
            })?;

        let submesh = extract_region(self.mesh, &boundary.vertices, outside)?;
        log::debug!(
            "{}: {} faces, {} vertices",
            key,
            submesh.faces.len(),
            submesh.vertices.len()
        );
        Ok(Artifact::Submesh(submesh))
    }

    fn extend_harmonically(&self, key: &KeyPath) -> Result<Artifact> {
        let boundary = self.store.submesh_boundary(key)?;
        let submesh = self.store.submesh(key)?;
        let extended = harmonic_extension(self.mesh, submesh, boundary, &self.harmonic)?;
        Ok(Artifact::CoordinateSubmesh(extended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{tagged_grid, HOLE_TAG, MV_TAG};
    use crate::mesh::vertex_ids;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SCHEMA: &str = r#"
        [paths.MV]
        type = "boundary"
        feature_tag = "MV"
        coincides_with_mesh_boundary = true

        [paths.hole]
        type = "boundary"
        feature_tag = "HOLE"

        [paths.spoke]
        type = "connection"
        start = { marker = ["hole", "start"] }
        end = { path = "MV" }
        inadmissible_along = ["hole", "MV"]

        [markers.hole.start]
        path = "hole"
        position_type = "index"
        position = 0

        [markers.hole.corner]
        path = "hole"
        position_type = "index"
        position = 2

        [markers.spoke.middle]
        path = "spoke"
        position_type = "relative"
        position = 0.4

        [parameterizations.hole]
        path = "hole"
        markers = [["hole", "start"], ["hole", "corner"]]
        marker_relative_positions = [0.0, 0.25]

        [parameterizations.spoke]
        path = "spoke"
        markers = [["hole", "start"]]
        marker_relative_positions = [0.0]

        [coordinates.hole]
        path = "hole"
        relative_positions = [0.0, 0.25, 0.5, 0.75, 1.0]
        coordinates = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]

        [submeshes.inner]
        boundary_paths = ["hole"]
        portions = [[0.0, 1.0]]
        outside_path = "MV"
    "#;

    const WORKFLOW: &str = r#"
        [[steps]]
        id = "features"
        type = "feature_extraction"
        apply_to = "all"

        [[steps]]
        id = "hole_markers"
        type = "marker_extraction"
        apply_to = [["hole", "start"], ["hole", "corner"]]

        [[steps]]
        id = "spokes"
        type = "shortest_path_construction"

        [[steps]]
        id = "parameterization"
        type = "path_parameterization"

        [[steps]]
        id = "spoke_markers"
        type = "marker_extraction"
        apply_to = [["spoke", "middle"]]
    "#;

    fn tags() -> BTreeMap<String, i32> {
        BTreeMap::from([("MV".to_string(), MV_TAG), ("HOLE".to_string(), HOLE_TAG)])
    }

    #[test]
    fn test_full_pipeline_on_tagged_grid() {
        let mesh = tagged_grid();
        let schema = Schema::from_toml_str(SCHEMA, "test schema").unwrap();
        schema.validate().unwrap();
        let workflow = Workflow::from_toml_str(WORKFLOW, "test workflow").unwrap();
        workflow.validate(&schema).unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let progress = Progress::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let mut constructor = UacConstructor::new(&mesh, &schema)
            .with_feature_tags(tags())
            .with_progress(progress);
        constructor.construct_segmentation(&workflow).unwrap();

        let store = constructor.store();
        assert_eq!(
            store.raw_path(&KeyPath::from("hole")).unwrap().vertices,
            vertex_ids(&[16, 17, 18, 25, 32, 31, 30, 23])
        );
        assert_eq!(
            store.raw_path(&KeyPath::from("spoke")).unwrap().vertices,
            vertex_ids(&[16, 9, 2])
        );
        assert_eq!(store.marker(&KeyPath::from(["hole", "corner"])).unwrap(), VertexId::new(18));
        assert_eq!(store.marker(&KeyPath::from(["spoke", "middle"])).unwrap(), VertexId::new(9));

        let hole = store.parameterized_path(&KeyPath::from("hole")).unwrap();
        assert_eq!(hole.vertices.len(), 9);
        for (i, &r) in hole.relative_lengths.iter().enumerate() {
            assert_relative_eq!(r, i as f64 / 8.0, epsilon = 1e-12);
        }

        constructor.construct_uacs().unwrap();
        let store = constructor.store();

        let boundary = store.submesh_boundary(&KeyPath::from("inner")).unwrap();
        assert_eq!(boundary.vertices.len(), 8);

        let result = store.coordinate_submesh(&KeyPath::from("inner")).unwrap();
        assert_eq!(result.submesh.faces.len(), 8);
        assert_eq!(result.submesh.vertices.len(), 9);
        let centre = result.submesh.local_index(VertexId::new(24)).unwrap();
        assert_relative_eq!(result.alpha[centre], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.beta[centre], 0.5, epsilon = 1e-9);

        // 11 segmentation entries and one per coordinate stage.
        assert_eq!(ticks.load(Ordering::Relaxed), 15);
        assert_eq!(store.num_produced(), store.num_declared());
    }

    #[test]
    fn test_reading_before_producing_names_stage_and_key() {
        let mesh = tagged_grid();
        let schema = Schema::from_toml_str(SCHEMA, "test schema").unwrap();
        let mut constructor = UacConstructor::new(&mesh, &schema).with_feature_tags(tags());

        let err = constructor.construct_uacs().unwrap_err();
        match &err {
            UacError::Stage { stage, key, .. } => {
                assert_eq!(*stage, StageKind::CoordinateAssignment);
                assert_eq!(*key, KeyPath::from("hole"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            err.root_cause(),
            UacError::MissingArtifact {
                kind: ArtifactKind::ParameterizedPath,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_keeps_earlier_artifacts() {
        let mesh = tagged_grid();
        let schema = Schema::from_toml_str(SCHEMA, "test schema").unwrap();
        // HOLE has no configured value.
        let only_mv = BTreeMap::from([("MV".to_string(), MV_TAG)]);
        let mut constructor = UacConstructor::new(&mesh, &schema).with_feature_tags(only_mv);

        let err = constructor.run_step(&Step::all(StageKind::FeatureExtraction)).unwrap_err();
        assert!(matches!(err.root_cause(), UacError::Config { .. }));
        assert!(constructor.store().contains(ArtifactKind::RawPath, &KeyPath::from("MV")));
        assert!(!constructor.store().contains(ArtifactKind::RawPath, &KeyPath::from("hole")));
    }

    #[test]
    fn test_mismatched_path_types_are_skipped() {
        let mesh = tagged_grid();
        let schema = Schema::from_toml_str(SCHEMA, "test schema").unwrap();
        let constructor = UacConstructor::new(&mesh, &schema).with_feature_tags(tags());

        let spoke = KeyPath::from("spoke");
        assert!(constructor
            .run_stage(StageKind::FeatureExtraction, &spoke)
            .unwrap()
            .is_none());
        assert!(constructor
            .run_stage(StageKind::ShortestPathConstruction, &KeyPath::from("MV"))
            .unwrap()
            .is_none());
        assert!(matches!(
            constructor.run_stage(StageKind::MarkerExtraction, &spoke),
            Err(UacError::UnknownKey { .. })
        ));
    }
}
