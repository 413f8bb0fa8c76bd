//! Ephemeral job artifacts.
//!
//! One [`AssetSet`] owns the five files of a single job invocation, all sharing a
//! stem inside one private directory:
//!
//! ```text
//! runwith_<id>/<function>.target   entry script
//! runwith_<id>/<function>.dump     encoded bound call
//! runwith_<id>/<function>.ret      encoded return value
//! runwith_<id>/<function>.sh       launcher script
//! runwith_<id>/<function>.log      execution backend output
//! ```
mod id;
pub use id::{ID_LEN, IdGenerator, RandomIds};

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{codec::Codec, error::CoreError};

/// Files of one job invocation.
///
/// Cleanup is explicit ([`AssetSet::cleanup`]). Dropping a set that was neither
/// cleaned up nor retained triggers a single cleanup attempt as a backstop.
#[derive(Debug)]
pub struct AssetSet {
    dir: PathBuf,
    target: PathBuf,
    dump: PathBuf,
    ret: PathBuf,
    exec: PathBuf,
    log: PathBuf,
    released: bool,
    retained: bool,
}

impl AssetSet {
    /// Derive the five artifact paths from `base` and create their directory.
    ///
    /// `base` is `<dir>/<stem>`; each artifact is `<dir>/<stem>.<suffix>`.
    /// Files already present are touched (mtime bumped) but never truncated.
    pub fn create(base: impl AsRef<Path>) -> io::Result<Self> {
        let base = std::path::absolute(base.as_ref())?;
        let dir = base
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "asset base has no parent"))?;
        let stem = base
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "asset base has no file name"))?
            .to_string_lossy()
            .into_owned();

        fs::create_dir_all(&dir)?;
        let with = |suffix: &str| dir.join(format!("{stem}.{suffix}"));

        let assets = Self {
            target: with("target"),
            dump: with("dump"),
            ret: with("ret"),
            exec: with("sh"),
            log: with("log"),
            dir,
            released: false,
            retained: false,
        };
        for path in assets.files() {
            if path.exists() {
                touch(path)?;
            }
        }
        trace!(dir = %assets.dir.display(), "asset set created");
        Ok(assets)
    }

    /// Private working directory holding every artifact.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry script.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Encoded bound call.
    pub fn dump(&self) -> &Path {
        &self.dump
    }

    /// Encoded return value.
    pub fn ret(&self) -> &Path {
        &self.ret
    }

    /// Launcher script.
    pub fn exec(&self) -> &Path {
        &self.exec
    }

    pub fn log(&self) -> &Path {
        &self.log
    }

    /// All tracked artifacts.
    pub fn files(&self) -> [&Path; 5] {
        [
            self.target.as_path(),
            self.dump.as_path(),
            self.ret.as_path(),
            self.exec.as_path(),
            self.log.as_path(),
        ]
    }

    /// Returns `true` once [`AssetSet::cleanup`] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Keep the files on disk when this value is dropped.
    ///
    /// Used for asynchronously submitted jobs whose output has not been produced yet.
    /// The owner becomes responsible for calling [`AssetSet::cleanup`] later.
    pub fn retain(&mut self) {
        self.retained = true;
    }

    /// Returns `true` if the result file exists and is not empty.
    pub fn has_result(&self) -> bool {
        fs::metadata(&self.ret).map(|m| m.len() > 0).unwrap_or(false)
    }

    /// Read and decode the result file.
    pub fn load_result(&self, codec: &dyn Codec) -> Result<Value, CoreError> {
        let unreadable = |reason: String| CoreError::ResultUnreadable {
            path: self.ret.clone(),
            reason,
        };
        let bytes = fs::read(&self.ret).map_err(|e| unreadable(e.to_string()))?;
        codec.decode(&bytes).map_err(|e| unreadable(e.to_string()))
    }

    /// Delete every artifact, then the directory if it ended up empty.
    ///
    /// A directory that still holds untracked files is left in place and reported
    /// at warn level; this is not an error. Runs at most once.
    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        for path in self.files() {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        if !self.dir.exists() {
            return Ok(());
        }
        match fs::remove_dir(&self.dir) {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "assets cleaned up");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
                let leftovers: Vec<String> = fs::read_dir(&self.dir)
                    .map(|rd| {
                        rd.filter_map(Result::ok)
                            .map(|e| e.file_name().to_string_lossy().into_owned())
                            .collect()
                    })
                    .unwrap_or_default();
                warn!(
                    dir = %self.dir.display(),
                    leftovers = ?leftovers,
                    "asset directory not empty after cleanup; leaving it in place",
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for AssetSet {
    fn drop(&mut self) {
        if self.released || self.retained || !self.dir.exists() {
            return;
        }
        debug!(dir = %self.dir.display(), "asset set dropped without cleanup; cleaning up");
        if let Err(e) = self.cleanup() {
            warn!(dir = %self.dir.display(), "backstop cleanup failed: {e}");
        }
    }
}

fn touch(path: &Path) -> io::Result<()> {
    let file: File = OpenOptions::new().append(true).open(path)?;
    file.set_modified(SystemTime::now())
}
