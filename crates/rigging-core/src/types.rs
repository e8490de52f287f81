use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// TemplateType
// ---------------------------------------------------------------------------

pub const GO_TEMPLATE: &str = "GoTemplate";
pub const SPIFF: &str = "Spiff";
pub const LITERAL: &str = "Literal";

/// Tag selecting the rendering backend of a template executor.
///
/// Any string parses; whether a backend exists for it is decided when the
/// executor is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateType(String);

impl TemplateType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn go_template() -> Self {
        Self::new(GO_TEMPLATE)
    }

    pub fn spiff() -> Self {
        Self::new(SPIFF)
    }

    pub fn literal() -> Self {
        Self::new(LITERAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ExecutionPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionPhase {
    #[default]
    Init,
    Progressing,
    Succeeded,
    Failed,
    DeletionPending,
    Deleting,
    DeleteFailed,
}

impl ExecutionPhase {
    pub fn all() -> &'static [ExecutionPhase] {
        &[
            ExecutionPhase::Init,
            ExecutionPhase::Progressing,
            ExecutionPhase::Succeeded,
            ExecutionPhase::Failed,
            ExecutionPhase::DeletionPending,
            ExecutionPhase::Deleting,
            ExecutionPhase::DeleteFailed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionPhase::Init => "Init",
            ExecutionPhase::Progressing => "Progressing",
            ExecutionPhase::Succeeded => "Succeeded",
            ExecutionPhase::Failed => "Failed",
            ExecutionPhase::DeletionPending => "DeletionPending",
            ExecutionPhase::Deleting => "Deleting",
            ExecutionPhase::DeleteFailed => "DeleteFailed",
        }
    }

    /// Phases the reconciliation loop does not leave on its own.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            ExecutionPhase::Succeeded | ExecutionPhase::Failed | ExecutionPhase::DeleteFailed
        )
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionPhase {
    type Err = crate::error::RiggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutionPhase::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::error::RiggingError::InvalidPhase(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ConditionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ConditionStatus {
    type Err = crate::error::RiggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "true" => Ok(ConditionStatus::True),
            "false" => Ok(ConditionStatus::False),
            "unknown" => Ok(ConditionStatus::Unknown),
            _ => Err(crate::error::RiggingError::InvalidCondition(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Object metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default)]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// `namespace/name`, the key objects are stored under.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
