//! Stable YAML rendering of generated files

use serde::Serialize;
use serde_yaml::Value;

use crate::manifest::Manifest;
use crate::{Error, Result};

/// First line of every generated file
pub const BANNER: &str = "# This file has been generated by ksgen. DO NOT EDIT.\n";

/// Render a manifest with the banner, minus zero-value noise fields
pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    let mut value = manifest.to_yaml_value()?;
    strip_noise(&mut value);
    render_value(&value)
        .map_err(|e| Error::serialization_for_kind(manifest.kind().kind_str(), e.to_string()))
}

/// Render any serializable document with the banner
pub fn render<T: Serialize>(document: &T) -> Result<String> {
    let value = serde_yaml::to_value(document).map_err(|e| Error::serialization(e.to_string()))?;
    render_value(&value).map_err(|e| Error::serialization(e.to_string()))
}

fn render_value(value: &Value) -> std::result::Result<String, serde_yaml::Error> {
    let body = serde_yaml::to_string(value)?;
    Ok(format!("{BANNER}{body}"))
}

/// Remove `metadata.creationTimestamp: null` and an empty `user: {}`.
fn strip_noise(value: &mut Value) {
    let Some(root) = value.as_mapping_mut() else {
        return;
    };
    if let Some(metadata) = root.get_mut("metadata").and_then(Value::as_mapping_mut) {
        if metadata.get("creationTimestamp").is_some_and(Value::is_null) {
            metadata.remove("creationTimestamp");
        }
    }
    if root
        .get("user")
        .and_then(Value::as_mapping)
        .is_some_and(|user| user.is_empty())
    {
        root.remove("user");
    }
}
