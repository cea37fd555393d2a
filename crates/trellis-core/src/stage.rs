/*
 * stage.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! Lifecycle stages at which attribute values are realized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// When an attribute's value is meant to be read.
///
/// Stages are totally ordered, `Creation < Activation < Update`. A macro
/// chain takes the latest stage of its macros so that it is never read
/// before every macro in it can produce a meaningful value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Read once while the element is being constructed.
    #[default]
    Creation,
    /// Read when the element's host object is created.
    Activation,
    /// Read every time the host object refreshes.
    Update,
}

impl Stage {
    /// The latest stage among `stages`; `Creation` when empty.
    pub fn latest(stages: impl IntoIterator<Item = Stage>) -> Stage {
        stages.into_iter().max().unwrap_or_default()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Creation => "creation",
            Stage::Activation => "activation",
            Stage::Update => "update",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Stage::Creation < Stage::Activation);
        assert!(Stage::Activation < Stage::Update);
    }

    #[test]
    fn test_latest() {
        assert_eq!(Stage::latest([]), Stage::Creation);
        assert_eq!(Stage::latest([Stage::Update, Stage::Creation]), Stage::Update);
        assert_eq!(
            Stage::latest([Stage::Creation, Stage::Activation, Stage::Creation]),
            Stage::Activation
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Stage::Activation).unwrap();
        assert_eq!(json, "\"Activation\"");
    }
}
