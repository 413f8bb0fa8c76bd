//! Turns a bound call plus a template pair into a ready [`AssetSet`].
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use runwith_model::BoundCall;

use crate::{
    assets::{AssetSet, IdGenerator, RandomIds},
    codec::{Codec, JsonCodec, encode_call},
    error::CoreError,
    template::TemplatePair,
};

/// Prefix of every per-invocation working directory.
pub const WORKDIR_PREFIX: &str = "runwith_";

/// Materializer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    /// Directory under which `runwith_<id>` directories are created.
    ///
    /// Must be visible to wherever the launcher runs (e.g. shared storage for cluster jobs).
    pub work_root: PathBuf,
    /// Worker executable substituted for `{worker}` in entry templates.
    ///
    /// If `None`, the current executable is used.
    pub worker: Option<PathBuf>,
    /// Echo generated scripts at info level.
    pub verbose: bool,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("."),
            worker: None,
            verbose: true,
        }
    }
}

/// Prepares job assets: working directory, dump, entry script and launcher.
#[derive(Clone)]
pub struct Materializer {
    cfg: MaterializerConfig,
    codec: Arc<dyn Codec>,
    ids: Arc<dyn IdGenerator>,
}

impl Materializer {
    /// Create a materializer with the JSON codec and random directory ids.
    pub fn new(cfg: MaterializerConfig) -> Self {
        Self {
            cfg,
            codec: Arc::new(JsonCodec),
            ids: Arc::new(RandomIds),
        }
    }

    /// Replace the codec and return the updated materializer.
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the id generator and return the updated materializer.
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.cfg
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    /// Materialize `call` with `templates`.
    ///
    /// Templates, the call and the generated paths (which must be valid UTF-8) are
    /// validated before anything touches the filesystem.
    /// If a later step fails, the partially written assets are removed before the
    /// error is returned.
    pub fn prepare(&self, call: &BoundCall, templates: &TemplatePair) -> Result<AssetSet, CoreError> {
        templates.validate()?;
        call.validate()?;
        let worker = if templates.needs_worker() {
            Some(self.worker()?)
        } else {
            None
        };

        let base = std::path::absolute(&self.cfg.work_root)?
            .join(format!("{WORKDIR_PREFIX}{}", self.ids.next_id()))
            .join(call.function());
        for path in std::iter::once(base.as_path()).chain(worker.as_deref()) {
            if path.to_str().is_none() {
                return Err(CoreError::NonUtf8Path(path.to_path_buf()));
            }
        }
        let mut assets = AssetSet::create(&base)?;

        if let Err(e) = self.write_assets(&assets, call, templates, worker.as_deref()) {
            if let Err(ce) = assets.cleanup() {
                warn!(dir = %assets.dir().display(), "asset cleanup failed: {ce}");
            }
            return Err(e);
        }
        debug!(call = %call, dir = %assets.dir().display(), "job materialized");
        Ok(assets)
    }

    fn write_assets(
        &self,
        assets: &AssetSet,
        call: &BoundCall,
        templates: &TemplatePair,
        worker: Option<&Path>,
    ) -> Result<(), CoreError> {
        fs::write(assets.dump(), encode_call(self.codec(), call)?)?;
        self.echo("dumped bound call", &assets.dump().display().to_string());

        let entry = templates.render_entry(assets.dump(), assets.ret(), worker);
        fs::write(assets.target(), &entry)?;
        self.echo("generated entry script", &entry);

        let launcher = templates.render_launcher(assets.target());
        fs::write(assets.exec(), &launcher)?;
        make_executable(assets.exec())?;
        self.echo("generated launcher script", &launcher);
        Ok(())
    }

    fn worker(&self) -> Result<PathBuf, CoreError> {
        match &self.cfg.worker {
            Some(w) => Ok(w.clone()),
            None => std::env::current_exe().map_err(|e| CoreError::Worker(e.to_string())),
        }
    }

    fn echo(&self, what: &str, content: &str) {
        if self.cfg.verbose {
            info!("{what}:\n{content}");
        } else {
            trace!("{what}:\n{content}");
        }
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(MaterializerConfig::default())
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("cfg", &self.cfg)
            .field("codec", &self.codec.name())
            .finish()
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
