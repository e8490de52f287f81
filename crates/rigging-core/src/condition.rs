use crate::error::{Result, RiggingError};
use crate::types::ConditionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub last_transition_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            condition_type: condition_type.into(),
            status,
            last_transition_time: now,
            last_update_time: now,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Parse `type=status[:reason[:message]]` as given on the command line.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || RiggingError::InvalidCondition(spec.to_string());
        let (condition_type, rest) = spec.split_once('=').ok_or_else(invalid)?;
        if condition_type.is_empty() {
            return Err(invalid());
        }
        let mut parts = rest.splitn(3, ':');
        let status = parts
            .next()
            .unwrap_or_default()
            .parse::<ConditionStatus>()
            .map_err(|_| invalid())?;
        let reason = parts.next().unwrap_or_default();
        let message = parts.next().unwrap_or_default();
        Ok(Self::new(condition_type, status, reason, message))
    }
}

/// Merge `updated` into `existing` by condition type.
///
/// Known types are replaced in place, keeping the old transition time when
/// the status did not change; unknown types are appended in order.
pub fn merge_conditions(
    existing: &mut Vec<Condition>,
    updated: impl IntoIterator<Item = Condition>,
) {
    for mut cond in updated {
        match existing
            .iter_mut()
            .find(|c| c.condition_type == cond.condition_type)
        {
            Some(current) => {
                if current.status == cond.status {
                    cond.last_transition_time = current.last_transition_time;
                }
                *current = cond;
            }
            None => existing.push(cond),
        }
    }
}
