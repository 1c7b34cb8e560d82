//! Pipeline schedule.
//!
//! A workflow is an ordered list of steps. Each step names a stage kind and
//! the schema entries it processes, or `"all"` for every entry of the stage's
//! section:
//!
//! ```toml
//! [[steps]]
//! id = "boundary_extraction"
//! type = "feature_extraction"
//! apply_to = "all"
//!
//! [[steps]]
//! id = "roof"
//! type = "shortest_path_construction"
//! apply_to = [["roof", "LIPV_LSPV"], ["roof", "LSPV_RSPV"]]
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, UacError};
use crate::schema::Schema;
use crate::store::{ArtifactKind, KeyPath};

/// Bundled segmentation schedule of the left atrium.
pub const LEFT_ATRIUM_WORKFLOW: &str = include_str!("../schemas/left_atrium/workflow.toml");

/// The kinds of pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Boundary paths from anatomical tags.
    FeatureExtraction,
    /// Markers on raw or parameterized paths.
    MarkerExtraction,
    /// Constrained shortest paths.
    ShortestPathConstruction,
    /// Relative arc-length parameterization.
    PathParameterization,
    /// Piecewise-linear UAC values along paths.
    CoordinateAssignment,
    /// Stitched submesh boundary loops.
    SubmeshBoundaryExtraction,
    /// Flood-filled submeshes.
    SubmeshExtraction,
    /// Harmonic UAC values over submeshes.
    HarmonicExtension,
}

impl StageKind {
    /// The stages run by `construct_uacs`, in order.
    pub const UAC_STAGES: [StageKind; 4] = [
        StageKind::CoordinateAssignment,
        StageKind::SubmeshBoundaryExtraction,
        StageKind::SubmeshExtraction,
        StageKind::HarmonicExtension,
    ];

    /// The artifact namespace this stage writes.
    pub fn produces(self) -> ArtifactKind {
        match self {
            StageKind::FeatureExtraction | StageKind::ShortestPathConstruction => ArtifactKind::RawPath,
            StageKind::MarkerExtraction => ArtifactKind::Marker,
            StageKind::PathParameterization => ArtifactKind::ParameterizedPath,
            StageKind::CoordinateAssignment => ArtifactKind::CoordinatePath,
            StageKind::SubmeshBoundaryExtraction => ArtifactKind::SubmeshBoundary,
            StageKind::SubmeshExtraction => ArtifactKind::Submesh,
            StageKind::HarmonicExtension => ArtifactKind::CoordinateSubmesh,
        }
    }

    fn name(self) -> &'static str {
        match self {
            StageKind::FeatureExtraction => "feature_extraction",
            StageKind::MarkerExtraction => "marker_extraction",
            StageKind::ShortestPathConstruction => "shortest_path_construction",
            StageKind::PathParameterization => "path_parameterization",
            StageKind::CoordinateAssignment => "coordinate_assignment",
            StageKind::SubmeshBoundaryExtraction => "submesh_boundary_extraction",
            StageKind::SubmeshExtraction => "submesh_extraction",
            StageKind::HarmonicExtension => "harmonic_extension",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which entries a step processes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ApplyTo {
    /// Every entry of the stage's schema section.
    #[default]
    All,
    /// The listed entries, in order.
    Keys(Vec<KeyPath>),
}

impl<'de> Deserialize<'de> for ApplyTo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Word(String),
            Keys(Vec<KeyPath>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Word(word) if word == "all" => Ok(ApplyTo::All),
            Repr::Word(word) => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of key paths, found \"{word}\""
            ))),
            Repr::Keys(keys) => Ok(ApplyTo::Keys(keys)),
        }
    }
}

/// One scheduled stage invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Unique step name.
    pub id: String,
    /// Stage to run.
    #[serde(rename = "type")]
    pub kind: StageKind,
    /// Free-form description for logs.
    #[serde(default)]
    pub description: String,
    /// Entries to process.
    #[serde(default)]
    pub apply_to: ApplyTo,
}

impl Step {
    /// A step applying a stage to every entry.
    pub fn all(kind: StageKind) -> Self {
        Self {
            id: kind.to_string(),
            kind,
            description: String::new(),
            apply_to: ApplyTo::All,
        }
    }

    /// Resolve the keys this step processes against a schema.
    pub fn keys(&self, schema: &Schema) -> Vec<KeyPath> {
        match &self.apply_to {
            ApplyTo::All => schema.keys(self.kind.produces()),
            ApplyTo::Keys(keys) => keys.clone(),
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(skip)]
    origin: PathBuf,
}

impl Workflow {
    /// Parse a workflow from TOML text. `origin` labels errors.
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let mut workflow: Workflow = toml::from_str(text).map_err(|e| UacError::Config {
            path: origin.clone(),
            message: e.to_string(),
        })?;
        workflow.origin = origin;
        Ok(workflow)
    }

    /// Load a workflow file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text, path)
    }

    /// The bundled left-atrium segmentation schedule.
    pub fn left_atrium() -> Result<Self> {
        Self::from_toml_str(LEFT_ATRIUM_WORKFLOW, "<left_atrium workflow>")
    }

    /// Build a workflow from steps.
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            origin: PathBuf::from("<in-memory workflow>"),
        }
    }

    /// The fixed schedule of the coordinate stages.
    pub fn uac_stages() -> Self {
        Self::from_steps(StageKind::UAC_STAGES.into_iter().map(Step::all).collect())
    }

    /// Check step ids are unique and every listed key is declared for its stage.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                problems.push(format!("duplicate step id '{}'", step.id));
            }
            if let ApplyTo::Keys(keys) = &step.apply_to {
                let kind = step.kind.produces();
                for key in keys.iter().filter(|k| !schema.declares(kind, k)) {
                    problems.push(format!("step '{}': {} {} is not declared", step.id, kind, key));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(UacError::Config {
                path: self.origin.clone(),
                message: problems.join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let workflow = Workflow::from_toml_str(
            r#"
            [[steps]]
            id = "boundaries"
            type = "feature_extraction"
            apply_to = "all"

            [[steps]]
            id = "markers"
            type = "marker_extraction"
            description = "hole markers"
            apply_to = [["hole", "start"], "other"]
            "#,
            "test.toml",
        )
        .unwrap();

        assert_eq!(workflow.steps.len(), 2);
        assert_eq!(workflow.steps[0].kind, StageKind::FeatureExtraction);
        assert_eq!(workflow.steps[0].apply_to, ApplyTo::All);
        assert_eq!(
            workflow.steps[1].apply_to,
            ApplyTo::Keys(vec![KeyPath::from(["hole", "start"]), KeyPath::from("other")])
        );
    }

    #[test]
    fn test_rejects_unknown_stage_and_word() {
        let bad_stage = "[[steps]]\nid = \"x\"\ntype = \"smoothing\"\n";
        assert!(Workflow::from_toml_str(bad_stage, "bad.toml").is_err());

        let bad_word = "[[steps]]\nid = \"x\"\ntype = \"feature_extraction\"\napply_to = \"some\"\n";
        assert!(Workflow::from_toml_str(bad_word, "bad.toml").is_err());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(StageKind::PathParameterization.to_string(), "path_parameterization");
        assert_eq!(StageKind::HarmonicExtension.produces(), ArtifactKind::CoordinateSubmesh);
        let uac = Workflow::uac_stages();
        assert_eq!(uac.steps.len(), 4);
        assert_eq!(uac.steps[0].id, "coordinate_assignment");
    }

    #[test]
    fn test_left_atrium_workflow_matches_schema() {
        let schema = Schema::left_atrium().unwrap();
        let workflow = Workflow::left_atrium().unwrap();
        workflow.validate(&schema).unwrap();
        assert_eq!(workflow.steps.len(), 10);
        assert_eq!(workflow.steps[0].keys(&schema).len(), schema.paths.len());
    }

    #[test]
    fn test_validate_flags_undeclared_keys() {
        let schema = Schema::left_atrium().unwrap();
        let workflow = Workflow::from_steps(vec![
            Step {
                id: "a".to_string(),
                kind: StageKind::MarkerExtraction,
                description: String::new(),
                apply_to: ApplyTo::Keys(vec![KeyPath::from(["LIPV", "inner"])]),
            },
            Step::all(StageKind::FeatureExtraction),
            Step::all(StageKind::FeatureExtraction),
        ]);
        let message = workflow.validate(&schema).unwrap_err().to_string();
        assert!(message.contains("marker LIPV/inner is not declared"));
        assert!(message.contains("duplicate step id"));
    }
}
