//! Functions this binary can execute when started as an entry worker.
use runwith_core::{error::CoreError, registry::{CallError, FunctionRegistry}};
use runwith_model::CallArgs;

pub fn registry() -> Result<FunctionRegistry, CoreError> {
    let mut reg = FunctionRegistry::new();
    reg.register("add", add)?
        .register("sum", sum)?
        .register("greet", greet)?
        .register("fail", fail)?;
    Ok(reg)
}

/// `add(a=<int>, b=<int>)`
fn add(args: &CallArgs) -> Result<i64, CallError> {
    let a: i64 = args.kwarg("a")?;
    let b: i64 = args.kwarg("b")?;
    a.checked_add(b)
        .ok_or_else(|| CallError::failed(format!("{a} + {b} overflows")))
}

/// Sum of all positional numbers.
fn sum(args: &CallArgs) -> Result<f64, CallError> {
    (0..args.positional().len())
        .map(|i| args.arg::<f64>(i).map_err(CallError::from))
        .sum()
}

fn greet(args: &CallArgs) -> Result<String, CallError> {
    let name: String = args.kwarg("name")?;
    let greeting: String = args.kwarg_or("greeting", "hello".to_string())?;
    Ok(format!("{greeting}, {name}"))
}

fn fail(args: &CallArgs) -> Result<(), CallError> {
    let reason: String = args.kwarg_or("reason", "requested failure".to_string())?;
    Err(CallError::failed(reason))
}
