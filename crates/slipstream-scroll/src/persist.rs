//! Persisted scroll state.
//!
//! A flat dictionary round-tripped through JSON; key order immaterial.

use serde::{Deserialize, Serialize};

use crate::ScrollError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    /// Relative scroll position in `[0, 1]`.
    pub value: f32,
    /// First id of the resident slice.
    pub start: u64,
    /// Length of the resident slice.
    pub len: usize,
}

impl PersistentState {
    pub fn to_value(&self) -> serde_json::Value {
        // A flat struct of plain fields cannot fail to serialize.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, ScrollError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip() {
        let state = PersistentState {
            value: 0.25,
            start: 488,
            len: 24,
        };
        let restored = PersistentState::from_value(&state.to_value()).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn key_order_is_immaterial() {
        let value = json!({ "len": 24, "value": 0.5, "start": 100 });
        let state = PersistentState::from_value(&value).unwrap();
        assert_eq!(state.start, 100);
        assert_eq!(state.len, 24);
        assert_eq!(state.value, 0.5);
    }

    #[test]
    fn malformed_state_is_an_error() {
        let value = json!({ "value": "not-a-number" });
        assert!(PersistentState::from_value(&value).is_err());
    }
}
