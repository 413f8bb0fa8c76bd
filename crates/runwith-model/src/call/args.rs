use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{ModelError, ModelResult};

/// Positional and keyword arguments bound to a function call.
///
/// Values are kept as [`serde_json::Value`] so the call can be encoded by any
/// codec and decoded again on the execution side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    positional: Vec<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.positional.push(value.into());
    }

    /// Set a keyword argument, replacing any earlier value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.keyword.insert(name.into(), value.into());
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Decode the positional argument at `idx` into `T`.
    pub fn arg<T: DeserializeOwned>(&self, idx: usize) -> ModelResult<T> {
        let raw = self.positional.get(idx).ok_or(ModelError::MissingArg(idx))?;
        T::deserialize(raw).map_err(|e| ModelError::ArgType {
            name: format!("#{idx}"),
            reason: e.to_string(),
        })
    }

    /// Decode the keyword argument `name` into `T`.
    pub fn kwarg<T: DeserializeOwned>(&self, name: &str) -> ModelResult<T> {
        let raw = self
            .keyword
            .get(name)
            .ok_or_else(|| ModelError::MissingKwarg(name.to_string()))?;
        T::deserialize(raw).map_err(|e| ModelError::ArgType {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Like [`CallArgs::kwarg`], but falls back to `default` when the keyword is absent.
    pub fn kwarg_or<T: DeserializeOwned>(&self, name: &str, default: T) -> ModelResult<T> {
        match self.keyword.get(name) {
            Some(_) => self.kwarg(name),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CallArgs;
    use crate::ModelError;

    #[test]
    fn positional_and_keyword_access() {
        let mut args = CallArgs::new();
        args.push(3);
        args.push("three");
        args.insert("scale", 1.5);

        assert_eq!(args.arg::<i64>(0).unwrap(), 3);
        assert_eq!(args.arg::<String>(1).unwrap(), "three");
        assert_eq!(args.kwarg::<f64>("scale").unwrap(), 1.5);
        assert!(!args.is_empty());
    }

    #[test]
    fn missing_arguments_are_reported() {
        let args = CallArgs::new();
        assert!(matches!(args.arg::<i64>(0), Err(ModelError::MissingArg(0))));
        assert!(matches!(
            args.kwarg::<i64>("a"),
            Err(ModelError::MissingKwarg(name)) if name == "a"
        ));
        assert_eq!(args.kwarg_or("a", 9_i64).unwrap(), 9);
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut args = CallArgs::new();
        args.insert("n", "not-a-number");
        assert!(matches!(args.kwarg::<u32>("n"), Err(ModelError::ArgType { .. })));
    }

    #[test]
    fn empty_sections_are_omitted_from_json() {
        let mut args = CallArgs::new();
        args.insert("a", 1);
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"{"keyword":{"a":1}}"#);
    }
}
