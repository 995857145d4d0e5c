//! Runtime parameter system
//!
//! A key-value store for the controller's configuration. The avoidance node
//! reads it once when it is constructed; later writes never reach a running
//! policy.

use crate::error::AvoidResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Default location of the parameter file, relative to the working directory
pub const DEFAULT_PARAMS_PATH: &str = "config/params.yaml";

/// Simple runtime parameter store
pub struct RuntimeParams {
    /// Parameter storage - BTreeMap maintains sorted order
    params: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl RuntimeParams {
    /// Create a store holding only the built-in defaults
    pub fn new() -> Self {
        Self {
            params: Arc::new(RwLock::new(default_params())),
        }
    }

    /// Create a store from a YAML file, falling back to defaults for keys
    /// the file does not set
    pub fn from_file(path: &Path) -> AvoidResult<Self> {
        let params = Self::new();
        params.load_from_disk(path)?;
        Ok(params)
    }

    /// Like [`RuntimeParams::from_file`], but a missing file is not an error
    pub fn init(path: &Path) -> AvoidResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Get a parameter value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let params = self.params.read();
        let value = params.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Get parameter with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get parameter as f64 with default
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    /// Set a parameter value
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> AvoidResult<()> {
        let json_value = serde_json::to_value(value)?;
        self.params.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.read().contains_key(key)
    }

    /// Remove a parameter
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.write().remove(key)
    }

    /// Merge parameters from a YAML file over the current values
    pub fn load_from_disk(&self, path: &Path) -> AvoidResult<()> {
        let yaml_str = std::fs::read_to_string(path)?;
        let loaded: BTreeMap<String, Value> = serde_yaml::from_str(&yaml_str)?;

        let mut params = self.params.write();
        params.extend(loaded);
        Ok(())
    }
}

fn default_params() -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();

    // Avoidance defaults
    params.insert("safety_threshold".to_string(), Value::from(0.4));
    params.insert("forward_speed".to_string(), Value::from(0.2));
    params.insert("turn_rate".to_string(), Value::from(0.5));
    params.insert("beams_per_revolution".to_string(), Value::from(360));
    params.insert("malformed_scan_policy".to_string(), Value::from("safe_stop"));

    // Topic defaults
    params.insert("scan_topic".to_string(), Value::from("scan"));
    params.insert("cmd_topic".to_string(), Value::from("cmd_vel"));
    params.insert("scan_queue_depth".to_string(), Value::from(5));
    params.insert("cmd_queue_depth".to_string(), Value::from(10));

    // System defaults
    params.insert("tick_rate".to_string(), Value::from(10));

    params
}

impl Clone for RuntimeParams {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
        }
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let params = RuntimeParams::new();

        // Test defaults
        assert_eq!(params.get_f64("safety_threshold", 0.0), 0.4);
        assert_eq!(params.get::<usize>("beams_per_revolution"), Some(360));
        assert_eq!(params.get_or("cmd_topic", String::new()), "cmd_vel");

        // Test set/get
        params.set("test_value", 42.5).unwrap();
        assert_eq!(params.get::<f64>("test_value"), Some(42.5));

        // Test overwrite
        params.set("safety_threshold", 0.6).unwrap();
        assert_eq!(params.get_f64("safety_threshold", 0.0), 0.6);

        assert!(params.remove("test_value").is_some());
        assert!(!params.has("test_value"));
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let params = RuntimeParams::new();
        params.set("forward_speed", "fast").unwrap();
        assert_eq!(params.get_f64("forward_speed", 0.2), 0.2);
    }

    #[test]
    fn test_clones_share_storage() {
        let params = RuntimeParams::new();
        let clone = params.clone();
        clone.set("turn_rate", 0.8).unwrap();
        assert_eq!(params.get_f64("turn_rate", 0.0), 0.8);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "safety_threshold: 0.5\n").unwrap();

        let params = RuntimeParams::from_file(&path).unwrap();
        assert_eq!(params.get_f64("safety_threshold", 0.0), 0.5);
        assert_eq!(params.get_f64("forward_speed", 0.0), 0.2);
    }

    #[test]
    fn test_init_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let params = RuntimeParams::init(&path).unwrap();
        assert_eq!(params.get_f64("safety_threshold", 0.0), 0.4);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(RuntimeParams::from_file(&path).is_err());
    }
}
