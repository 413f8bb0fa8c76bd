use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::OptionValue;

/// Filtered directive mapping handed to the scheduler backend.
///
/// Keys are the scheduler's long option names (`cpus-per-task`, `mem`, ...).
/// Only explicitly set directives are ever present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directives(BTreeMap<String, OptionValue>);

impl Directives {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert or overwrite a directive.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate over directives in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Render as command-line arguments.
    ///
    /// `--name=value` for text and integers, bare `--name` for enabled flags.
    /// Disabled flags produce nothing.
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|(name, value)| match value {
                OptionValue::Flag(true) => Some(format!("--{name}")),
                OptionValue::Flag(false) => None,
                OptionValue::Int(v) => Some(format!("--{name}={v}")),
                OptionValue::Text(v) => Some(format!("--{name}={v}")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Directives;

    #[test]
    fn to_args_renders_each_kind() {
        let mut d = Directives::new();
        d.insert("job-name", "train");
        d.insert("ntasks", 4_i64);
        d.insert("hold", true);
        d.insert("requeue", false);

        assert_eq!(
            d.to_args(),
            vec!["--hold", "--job-name=train", "--ntasks=4"]
        );
        assert_eq!(d.len(), 4);
        assert!(d.contains("requeue"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut d = Directives::new();
        d.insert("mem", "1000M");
        d.insert("nice", 5_i64);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"mem":"1000M","nice":5}"#);
    }
}
