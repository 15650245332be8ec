//! Tool selection

use pixlab_remote::{OperationId, Parameters};
use std::fmt;

/// The active tool of the editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tool {
    /// Pointer; no operation attached
    #[default]
    Select,
    /// A processing tool with its panel parameters
    Operation {
        id: OperationId,
        parameters: Parameters,
    },
}

impl Tool {
    /// Processing tool with default parameters
    #[must_use]
    pub fn operation(id: OperationId) -> Self {
        Self::Operation {
            id,
            parameters: Parameters::new(),
        }
    }

    /// Processing tool with explicit parameters
    #[must_use]
    pub fn with_parameters(id: OperationId, parameters: Parameters) -> Self {
        Self::Operation { id, parameters }
    }

    /// Operation and parameters, unless this is `Select`
    #[must_use]
    pub fn as_operation(&self) -> Option<(OperationId, &Parameters)> {
        match self {
            Self::Select => None,
            Self::Operation { id, parameters } => Some((*id, parameters)),
        }
    }

    /// Update parameters of a processing tool; no-op on `Select`
    pub fn set_parameter(&mut self, key: &str, value: impl ToString) {
        if let Self::Operation { parameters, .. } = self {
            parameters.insert(key, value);
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => f.write_str("select"),
            Self::Operation { id, .. } => write!(f, "{id}"),
        }
    }
}
