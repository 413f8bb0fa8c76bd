//! Execution side of an entry script.
//!
//! The default entry template runs `<worker> __runwith-entry <dump> <ret>`. A program
//! acting as worker calls [`dispatch`] at the top of `main` and exits with its
//! outcome when it returns `Some`.
use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    codec::{Codec, decode_call},
    error::CoreError,
    registry::FunctionRegistry,
};

/// Command-line flag that switches a program into entry-worker mode.
pub const ENTRY_FLAG: &str = "__runwith-entry";

/// Load the bound call from `dump`, invoke it and write the encoded result to `ret`.
///
/// The result is written to a sibling temporary file and renamed into place, so a
/// reader never observes a partially written result. Nothing is written on failure.
pub fn run_entry(
    registry: &FunctionRegistry,
    codec: &dyn Codec,
    dump: &Path,
    ret: &Path,
) -> Result<(), CoreError> {
    let bytes = fs::read(dump)?;
    let call = decode_call(codec, &bytes)?;
    trace!(call = %call, dump = %dump.display(), "entry loaded bound call");

    let value = registry.invoke(&call)?;
    let encoded = codec.encode(&value)?;

    let mut partial = ret.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);
    fs::write(&partial, encoded)?;
    fs::rename(&partial, ret)?;

    debug!(function = call.function(), ret = %ret.display(), "entry wrote result");
    Ok(())
}

/// Run as an entry worker if `args` (without the program name) start with [`ENTRY_FLAG`].
///
/// Returns `None` when the flag is absent, so the program continues normally.
/// Arguments need not be valid UTF-8.
pub fn dispatch<I, S>(args: I, registry: &FunctionRegistry, codec: &dyn Codec) -> Option<Result<(), CoreError>>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    if args.next().as_deref() != Some(OsStr::new(ENTRY_FLAG)) {
        return None;
    }
    let (Some(dump), Some(ret)) = (args.next(), args.next()) else {
        return Some(Err(CoreError::EntryUsage(format!(
            "expected `{ENTRY_FLAG} <dump> <ret>`"
        ))));
    };
    Some(run_entry(registry, codec, Path::new(&dump), Path::new(&ret)))
}

/// [`dispatch`] over the arguments of the current process.
pub fn dispatch_env(registry: &FunctionRegistry, codec: &dyn Codec) -> Option<Result<(), CoreError>> {
    dispatch(std::env::args_os().skip(1), registry, codec)
}
