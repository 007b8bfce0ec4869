use serde::{Deserialize, Serialize};
use substream_common::{Result, error::Error};

/// Settings that shape the codec tree built for a data type and the
/// behavior of bulk reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// Stamped on every tuple element codec: write `%2E` instead of `.`
    /// between a tuple and its element in physical stream names.
    pub escape_tuple_delimiter: bool,
    /// Expected average size of a variable-size value, in bytes.
    pub avg_value_size_hint: f64,
    /// A scalar column whose fraction of default values reaches this
    /// threshold is stored sparsely. Values above `1.0` disable sparse
    /// serialization.
    pub ratio_of_defaults_for_sparse: f64,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        SerializationConfig {
            escape_tuple_delimiter: true,
            avg_value_size_hint: 0.0,
            ratio_of_defaults_for_sparse: 0.9375,
        }
    }
}

impl SerializationConfig {
    pub fn from_json(json: &str) -> Result<SerializationConfig> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_format("serialization config", e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::invalid_format("serialization config", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::SerializationConfig;

    #[test]
    fn test_partial_json() {
        let config = SerializationConfig::from_json(r#"{ "escape_tuple_delimiter": false }"#).unwrap();
        assert!(!config.escape_tuple_delimiter);
        assert_eq!(config.ratio_of_defaults_for_sparse, 0.9375);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SerializationConfig {
            ratio_of_defaults_for_sparse: 0.5,
            avg_value_size_hint: 12.0,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SerializationConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        assert!(SerializationConfig::from_json("{ \"avg_value_size_hint\": \"x\" }").is_err());
    }
}
