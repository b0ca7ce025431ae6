use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The closed set of design artifacts the orchestrator can produce. Adding a
/// kind means adding a variant plus its prompt builder; dispatch is matched
/// exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SequenceDiagram,
    ArchitectureDiagram,
    SchemaDiagram,
    ApiDesign,
    DeploymentDiagram,
    DesignDocument,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::SequenceDiagram,
        ArtifactKind::ArchitectureDiagram,
        ArtifactKind::SchemaDiagram,
        ArtifactKind::ApiDesign,
        ArtifactKind::DeploymentDiagram,
        ArtifactKind::DesignDocument,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::SequenceDiagram => "sequence diagram",
            ArtifactKind::ArchitectureDiagram => "architecture diagram",
            ArtifactKind::SchemaDiagram => "schema diagram",
            ArtifactKind::ApiDesign => "API design",
            ArtifactKind::DeploymentDiagram => "deployment diagram",
            ArtifactKind::DesignDocument => "design document",
        }
    }
}

/// The artifact kinds a caller asked for. Absent preferences mean the full
/// default set; an explicitly empty list stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSelection(BTreeSet<ArtifactKind>);

impl Default for ArtifactSelection {
    fn default() -> Self {
        Self(ArtifactKind::ALL.into_iter().collect())
    }
}

impl ArtifactSelection {
    pub fn from_kinds(kinds: Vec<ArtifactKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn from_preferences(preferences: Option<Vec<ArtifactKind>>) -> Self {
        preferences.map_or_else(Self::default, Self::from_kinds)
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of one orchestrator run: the kinds that generated successfully and
/// the recorded fault for each kind that did not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactBundle {
    pub artifacts: BTreeMap<ArtifactKind, String>,
    pub failures: BTreeMap<ArtifactKind, String>,
}

impl ArtifactBundle {
    pub fn record_success(&mut self, kind: ArtifactKind, content: String) {
        self.artifacts.insert(kind, content);
    }

    pub fn record_failure(&mut self, kind: ArtifactKind, reason: String) {
        self.failures.insert(kind, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_covers_every_kind() {
        let selection = ArtifactSelection::default();

        assert_eq!(selection.len(), ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            assert!(selection.contains(kind));
        }
    }

    #[test]
    fn test_absent_preferences_fall_back_to_default() {
        let selection = ArtifactSelection::from_preferences(None);
        assert_eq!(selection, ArtifactSelection::default());
    }

    #[test]
    fn test_explicit_empty_preferences_stay_empty() {
        let selection = ArtifactSelection::from_preferences(Some(Vec::new()));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_duplicate_kinds_collapse() {
        let selection = ArtifactSelection::from_kinds(vec![
            ArtifactKind::DesignDocument,
            ArtifactKind::DesignDocument,
        ]);

        assert_eq!(selection.len(), 1);
        assert!(selection.contains(ArtifactKind::DesignDocument));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ArtifactKind::SequenceDiagram).expect("serialize");
        assert_eq!(json, "\"sequence_diagram\"");
    }
}
