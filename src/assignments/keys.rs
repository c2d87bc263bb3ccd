use std::fmt;

use serde::Deserialize;

use crate::error::AssignmentError;

const KEY_PREFIX: &str = "assignment-";
const KEY_SUFFIX: &str = ".json";

/// Identifier of an assignment payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentId(String);

/// An id as it arrives in a request body, before validation. Accepts JSON
/// strings and integers so `{"id": 7}` and `{"id": "7"}` address the same object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssignmentIdInput {
    Text(String),
    Number(i64),
}

impl TryFrom<AssignmentIdInput> for AssignmentId {
    type Error = AssignmentError;

    fn try_from(input: AssignmentIdInput) -> Result<Self, Self::Error> {
        match input {
            AssignmentIdInput::Text(value) => AssignmentId::parse(&value),
            AssignmentIdInput::Number(value) => AssignmentId::parse(&value.to_string()),
        }
    }
}

impl AssignmentId {
    pub fn parse(raw: &str) -> Result<Self, AssignmentError> {
        let reject = |reason| AssignmentError::InvalidId {
            id: raw.to_string(),
            reason,
        };

        if raw.trim().is_empty() {
            return Err(reject("must not be empty"));
        }
        if raw.trim() != raw {
            return Err(reject("must not have surrounding whitespace"));
        }
        if raw.contains('/') {
            return Err(reject("must not contain '/'"));
        }
        if raw.chars().any(char::is_control) {
            return Err(reject("must not contain control characters"));
        }

        Ok(Self(raw.to_string()))
    }

    /// `assignment-{id}.json`
    pub fn object_key(&self) -> String {
        format!("{KEY_PREFIX}{}{KEY_SUFFIX}", self.0)
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
