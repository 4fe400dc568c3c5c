//! Reading and writing mechanism text.
//!
//! Mechanism files are YAML (JSON is accepted too, being a subset of YAML). The document is
//! converted into `serde_json::Value`, which every `from_serde` constructor of the crate consumes.
use log::{info, warn};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use yaml_rust::{Yaml, YamlLoader};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML syntax error: {0}")]
    Syntax(String),
    #[error("mechanism text contains no document")]
    Empty,
    #[error("unsupported YAML value: {0}")]
    Unsupported(String),
    #[error("invalid mechanism: {0}")]
    Invalid(String),
}

/// converts a yaml-rust node into serde_json Value. Integers stay integers, reals stay reals
pub fn yaml_to_value(node: &Yaml) -> Result<Value, LoadError> {
    Ok(match node {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(*b),
        Yaml::Integer(i) => Value::Number(Number::from(*i)),
        Yaml::Real(text) => {
            let x = node
                .as_f64()
                .ok_or_else(|| LoadError::Unsupported(format!("real '{}'", text)))?;
            match Number::from_f64(x) {
                Some(n) => Value::Number(n),
                // .inf and .nan have no JSON number
                None => Value::String(text.clone()),
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Array(list) => Value::Array(list.iter().map(yaml_to_value).collect::<Result<_, _>>()?),
        Yaml::Hash(hash) => {
            let mut map = Map::new();
            for (key, value) in hash {
                let key = match key {
                    Yaml::String(s) => s.clone(),
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r.clone(),
                    Yaml::Boolean(b) => b.to_string(),
                    other => return Err(LoadError::Unsupported(format!("mapping key {:?}", other))),
                };
                map.insert(key, yaml_to_value(value)?);
            }
            Value::Object(map)
        }
        Yaml::Alias(_) | Yaml::BadValue => {
            return Err(LoadError::Unsupported(format!("{:?}", node)));
        }
    })
}

/// parses mechanism text (YAML or JSON) into a serde_json Value
pub fn load_mechanism_from_str(text: &str) -> Result<Value, LoadError> {
    let docs = YamlLoader::load_from_str(text).map_err(|e| LoadError::Syntax(e.to_string()))?;
    let doc = docs.first().ok_or(LoadError::Empty)?;
    yaml_to_value(doc)
}

pub fn load_mechanism_from_file(path: &Path) -> Result<Value, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loading mechanism from '{}'", path.display());
    load_mechanism_from_str(&text)
}

/// writes mechanism text to a file as is
pub fn write_mechanism_text(path: &Path, text: &str) -> Result<(), LoadError> {
    fs::write(path, text).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("mechanism text written to '{}'", path.display());
    Ok(())
}

/// checks the top level layout of a mechanism. Missing `phases` or `species` is an error;
/// empty sections and reactions without equation are only reported
pub fn validate_mechanism(mechanism: &Value) -> Result<(), LoadError> {
    let Some(root) = mechanism.as_object() else {
        return Err(LoadError::Invalid("top level must be a mapping".to_string()));
    };
    for key in ["phases", "species"] {
        match root.get(key) {
            None => return Err(LoadError::Invalid(format!("missing '{}' section", key))),
            Some(Value::Array(list)) if list.is_empty() => warn!("section '{}' is empty", key),
            Some(Value::Array(_)) => {}
            Some(_) => return Err(LoadError::Invalid(format!("'{}' must be a list", key))),
        }
    }
    match root.get("reactions") {
        None => warn!("mechanism has no 'reactions' section"),
        Some(Value::Array(list)) => {
            if list.is_empty() {
                warn!("section 'reactions' is empty");
            }
            for (i, reaction) in list.iter().enumerate() {
                if reaction.get("equation").is_none() {
                    warn!("reaction {} has no 'equation' field", i);
                }
            }
        }
        Some(_) => return Err(LoadError::Invalid("'reactions' must be a list".to_string())),
    }
    if let Some(Value::Array(phases)) = root.get("phases") {
        for (i, phase) in phases.iter().enumerate() {
            if phase.get("name").and_then(Value::as_str).is_none() {
                return Err(LoadError::Invalid(format!("phase {} has no name", i)));
            }
        }
    }
    Ok(())
}
