use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CallArgs, ModelError, ModelResult};

/// A function reference bound to its arguments: a deferred unit of work.
///
/// The function is referenced by name and resolved on the execution side, so the
/// name also becomes the file stem of every generated artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundCall {
    function: String,
    #[serde(default)]
    args: CallArgs,
}

impl BoundCall {
    /// Bind `function` with no arguments.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: CallArgs::new(),
        }
    }

    /// Bind `function` with a prepared argument set.
    pub fn with_args(function: impl Into<String>, args: CallArgs) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value);
        self
    }

    /// Add a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name, value);
        self
    }

    /// Append any serializable value as a positional argument.
    pub fn try_arg<T: Serialize>(self, value: &T) -> ModelResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| ModelError::ArgType {
            name: "positional".into(),
            reason: e.to_string(),
        })?;
        Ok(self.arg(value))
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Check that the function name can be used as a file stem.
    ///
    /// The name is spliced verbatim into generated scripts. Rules:
    /// - not empty;
    /// - only ASCII letters, digits, `_`, `-` and `.`;
    /// - no leading dot.
    pub fn validate(&self) -> ModelResult<()> {
        let name = self.function.as_str();
        let bad = name.is_empty()
            || name.starts_with('.')
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if bad {
            return Err(ModelError::InvalidFunctionName(self.function.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for BoundCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        let mut first = true;
        for v in self.args.positional() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
            first = false;
        }
        for (k, v) in self.args.keyword() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::BoundCall;

    #[test]
    fn builder_collects_arguments() {
        let call = BoundCall::new("add").arg(1).arg(2).kwarg("scale", 10);
        assert_eq!(call.function(), "add");
        assert_eq!(call.args().positional().len(), 2);
        assert_eq!(call.args().kwarg::<i64>("scale").unwrap(), 10);
    }

    #[test]
    fn display_reads_like_a_call() {
        let call = BoundCall::new("f").arg(1).kwarg("b", "x");
        assert_eq!(call.to_string(), r#"f(1, b="x")"#);
        assert_eq!(BoundCall::new("g").to_string(), "g()");
    }

    #[test]
    fn validate_rejects_path_like_names() {
        for bad in ["", "   ", "../up", "a/b", ".hidden", "a\\b", "nul\0"] {
            assert!(BoundCall::new(bad).validate().is_err(), "accepted {bad:?}");
        }
        for good in ["train_model", "step-2", "model.fit", "F1"] {
            assert!(BoundCall::new(good).validate().is_ok(), "rejected {good:?}");
        }
    }

    #[test]
    fn validate_rejects_shell_metacharacters() {
        for bad in ["x$(touch mark)", "x`id`", "say\"hi", "two words", "a;b", "é"] {
            assert!(BoundCall::new(bad).validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn try_arg_accepts_structs() {
        #[derive(serde::Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let call = BoundCall::new("norm").try_arg(&Point { x: 3, y: 4 }).unwrap();
        let back: serde_json::Value = call.args().arg(0).unwrap();
        assert_eq!(back["x"], 3);
    }

    #[test]
    fn serde_roundtrip_preserves_call() {
        let call = BoundCall::new("f").kwarg("a", 1).kwarg("b", 2);
        let json = serde_json::to_vec(&call).unwrap();
        let back: BoundCall = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, call);
    }
}
