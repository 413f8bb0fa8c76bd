//! Named functions that bound calls resolve to on the execution side.
use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use runwith_model::{BoundCall, CallArgs, ModelError};

use crate::error::CoreError;

/// Failure raised by a registered function.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Args(#[from] ModelError),

    #[error("{0}")]
    Failed(String),
}

impl CallError {
    pub fn failed(reason: impl Into<String>) -> Self {
        CallError::Failed(reason.into())
    }
}

type JobFn = Arc<dyn Fn(&CallArgs) -> Result<Value, CallError> + Send + Sync>;

/// Registry mapping function names to callables.
///
/// The same registry must be built by the submitting program and by the worker
/// that executes entry scripts; calls carry only the function name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    fns: HashMap<String, JobFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`.
    ///
    /// The return value is converted to JSON when the call completes.
    pub fn register<F, R>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self, CoreError>
    where
        F: Fn(&CallArgs) -> Result<R, CallError> + Send + Sync + 'static,
        R: Serialize,
    {
        let name = name.into();
        if self.fns.contains_key(&name) {
            return Err(CoreError::DuplicateFunction(name));
        }
        let wrapped: JobFn = Arc::new(move |args: &CallArgs| {
            let ret = f(args)?;
            serde_json::to_value(ret).map_err(|e| CallError::failed(format!("cannot encode return value: {e}")))
        });
        self.fns.insert(name, wrapped);
        Ok(self)
    }

    /// Register `f` with its arguments decoded into `A`.
    ///
    /// Keyword arguments decode as a map (e.g. into a struct), positional ones as a
    /// sequence (e.g. into a tuple), no arguments as unit. A call that mixes both
    /// kinds is rejected.
    pub fn register_typed<A, F, R>(&mut self, name: impl Into<String>, f: F) -> Result<&mut Self, CoreError>
    where
        A: DeserializeOwned,
        F: Fn(A) -> Result<R, CallError> + Send + Sync + 'static,
        R: Serialize,
    {
        self.register(name, move |args: &CallArgs| f(decode_args(args)?))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }

    /// Invoke the function a bound call refers to.
    pub fn invoke(&self, call: &BoundCall) -> Result<Value, CoreError> {
        let f = self
            .fns
            .get(call.function())
            .ok_or_else(|| CoreError::UnknownFunction(call.function().to_string()))?;

        debug!(function = call.function(), "invoking bound call");
        f(call.args()).map_err(|e| CoreError::CallFailed {
            function: call.function().to_string(),
            reason: e.to_string(),
        })
    }
}

fn decode_args<A: DeserializeOwned>(args: &CallArgs) -> Result<A, CallError> {
    let raw = match (args.positional().is_empty(), args.keyword().is_empty()) {
        (true, true) => Value::Null,
        (false, true) => Value::Array(args.positional().to_vec()),
        (true, false) => Value::Object(
            args.keyword()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        (false, false) => {
            return Err(CallError::failed(
                "typed functions take positional or keyword arguments, not both",
            ));
        }
    };
    serde_json::from_value(raw).map_err(|e| CallError::failed(format!("cannot decode arguments: {e}")))
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.fns.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::{JsonCodec, decode_call, encode_call};

    fn registry() -> FunctionRegistry {
        let mut reg = FunctionRegistry::new();
        reg.register("add", |args: &CallArgs| {
            Ok(args.kwarg::<i64>("a")? + args.kwarg::<i64>("b")?)
        })
        .unwrap()
        .register("concat", |args: &CallArgs| {
            let parts: Vec<String> = args
                .positional()
                .iter()
                .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()))
                .collect();
            Ok(parts.join("-"))
        })
        .unwrap()
        .register("boom", |_: &CallArgs| -> Result<(), CallError> {
            Err(CallError::failed("exploded"))
        })
        .unwrap();
        reg
    }

    #[test]
    fn invoke_resolves_by_name() {
        let reg = registry();
        let out = reg.invoke(&BoundCall::new("add").kwarg("a", 1).kwarg("b", 2)).unwrap();
        assert_eq!(out, json!(3));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn decoded_call_matches_direct_invocation() {
        let reg = registry();
        let calls = [
            BoundCall::new("add").kwarg("a", 40).kwarg("b", 2),
            BoundCall::new("concat").arg("a").arg(1).arg(true),
        ];
        for call in calls {
            let direct = reg.invoke(&call).unwrap();
            let bytes = encode_call(&JsonCodec, &call).unwrap();
            let restored = decode_call(&JsonCodec, &bytes).unwrap();
            assert_eq!(reg.invoke(&restored).unwrap(), direct, "mismatch for {call}");
        }
    }

    #[test]
    fn unknown_function_is_an_error() {
        let err = registry().invoke(&BoundCall::new("missing")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownFunction(name) if name == "missing"));
    }

    #[test]
    fn failures_carry_the_function_name() {
        let reg = registry();
        match reg.invoke(&BoundCall::new("boom")).unwrap_err() {
            CoreError::CallFailed { function, reason } => {
                assert_eq!(function, "boom");
                assert_eq!(reason, "exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            reg.invoke(&BoundCall::new("add").kwarg("a", 1)),
            Err(CoreError::CallFailed { .. })
        ));
    }

    #[derive(serde::Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn typed_functions_decode_their_arguments() {
        let mut reg = FunctionRegistry::new();
        reg.register_typed("manhattan", |p: Point| Ok(p.x.abs() + p.y.abs()))
            .unwrap()
            .register_typed("mul", |(a, b): (i64, i64)| Ok(a * b))
            .unwrap()
            .register_typed("ping", |(): ()| Ok("pong"))
            .unwrap();

        let out = reg
            .invoke(&BoundCall::new("manhattan").kwarg("x", -3).kwarg("y", 4))
            .unwrap();
        assert_eq!(out, json!(7));
        assert_eq!(reg.invoke(&BoundCall::new("mul").arg(6).arg(7)).unwrap(), json!(42));
        assert_eq!(reg.invoke(&BoundCall::new("ping")).unwrap(), json!("pong"));
    }

    #[test]
    fn typed_functions_reject_mixed_or_mistyped_arguments() {
        let mut reg = FunctionRegistry::new();
        reg.register_typed("mul", |(a, b): (i64, i64)| Ok(a * b)).unwrap();

        for call in [
            BoundCall::new("mul").arg(1).kwarg("b", 2),
            BoundCall::new("mul").arg("six").arg(7),
        ] {
            assert!(matches!(reg.invoke(&call), Err(CoreError::CallFailed { .. })));
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = registry();
        let err = reg.register("add", |_: &CallArgs| Ok(0)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateFunction(name) if name == "add"));
    }
}
