//! Helper lifecycle: keeps the compiled gateway binary current.
//!
//! A [`HelperManager`] owns one artifact path. [`HelperManager::ensure_ready`]
//! rebuilds the artifact when it is missing or older than any of its sources.
//! Callers that arrive while a build is running join it instead of starting
//! another, and every one of them sees the same outcome. The finished binary
//! is copied to a temporary name next to the artifact and renamed over it,
//! so the artifact path never holds a partial file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant, SystemTime};

use crate::config::{BuildConfig, GatewayConfig};
use crate::error::{ReminderError, Result};
use crate::process::{self, Outcome};

/// File name of the gateway binary.
pub fn gateway_file_name() -> String {
    format!("reminder-gateway{}", std::env::consts::EXE_SUFFIX)
}

/// A command that produces the gateway binary.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecipe {
    /// Program name or path; looked up on `PATH` when relative.
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Where the command leaves the binary.
    pub output: PathBuf,
    /// Files or directories whose modification makes the artifact stale.
    pub sources: Vec<PathBuf>,
    pub timeout: Duration,
}

impl BuildRecipe {
    /// `cargo build --release --bin reminder-gateway` for the crate at
    /// `source_dir`, with build products under `target_dir`.
    pub fn cargo(source_dir: &Path, target_dir: &Path, timeout: Duration) -> Self {
        let manifest = source_dir.join("Cargo.toml");
        Self {
            program: PathBuf::from("cargo"),
            args: vec![
                "build".to_owned(),
                "--release".to_owned(),
                "--bin".to_owned(),
                "reminder-gateway".to_owned(),
                "--manifest-path".to_owned(),
                manifest.display().to_string(),
                "--target-dir".to_owned(),
                target_dir.display().to_string(),
            ],
            output: target_dir.join("release").join(gateway_file_name()),
            sources: vec![manifest, source_dir.join("src")],
            timeout,
        }
    }

    pub fn from_config(build: &BuildConfig, timeout: Duration) -> Self {
        Self {
            program: PathBuf::from(&build.program),
            args: build.args.clone(),
            output: build.output.clone(),
            sources: build.sources.clone(),
            timeout,
        }
    }

    fn describe(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// One in-flight build, shared by everyone waiting on it.
struct BuildFlight {
    outcome: Mutex<Option<Result<PathBuf>>>,
    done: Condvar,
}

impl BuildFlight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn finish(&self, outcome: Result<PathBuf>) {
        if let Ok(mut slot) = self.outcome.lock() {
            *slot = Some(outcome);
        }
        self.done.notify_all();
    }

    fn wait(&self) -> Result<PathBuf> {
        let mut slot = self.outcome.lock().map_err(|_| poisoned())?;
        loop {
            if let Some(ref outcome) = *slot {
                return outcome.clone();
            }
            slot = self.done.wait(slot).map_err(|_| poisoned())?;
        }
    }
}

fn poisoned() -> ReminderError {
    ReminderError::Build("helper build state lock poisoned".to_owned())
}

/// Keeps one gateway artifact fresh.
pub struct HelperManager {
    artifact: PathBuf,
    /// `None` for a prebuilt binary that is never rebuilt.
    recipe: Option<BuildRecipe>,
    flight: Mutex<Option<Arc<BuildFlight>>>,
    builds: AtomicUsize,
}

type Registry = Mutex<HashMap<PathBuf, Arc<HelperManager>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

impl HelperManager {
    /// A manager private to the caller.
    pub fn new(artifact: impl Into<PathBuf>, recipe: Option<BuildRecipe>) -> Self {
        Self {
            artifact: artifact.into(),
            recipe,
            flight: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// The process-wide manager for `artifact`, created on first use.
    ///
    /// Later calls for the same path return the existing manager and ignore
    /// `recipe`.
    pub fn shared(artifact: &Path, recipe: Option<BuildRecipe>) -> Arc<Self> {
        let mut managers = match registry().lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        managers
            .entry(artifact.to_path_buf())
            .or_insert_with(|| Arc::new(Self::new(artifact, recipe)))
            .clone()
    }

    /// The shared manager described by a gateway config section.
    pub fn for_config(config: &GatewayConfig) -> Arc<Self> {
        if let Some(ref binary) = config.binary {
            return Self::shared(binary, None);
        }
        let recipe = match config.build {
            Some(ref build) => BuildRecipe::from_config(build, config.build_timeout()),
            None => BuildRecipe::cargo(
                &config.source_dir(),
                &crate::bridge_dirs::build_target_dir(),
                config.build_timeout(),
            ),
        };
        let artifact = crate::bridge_dirs::helper_bin_dir().join(gateway_file_name());
        Self::shared(&artifact, Some(recipe))
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Builds this manager has started.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Whether the artifact must be rebuilt before use.
    pub fn is_stale(&self) -> bool {
        let Some(ref recipe) = self.recipe else {
            return false;
        };
        let Some(built) = modified(&self.artifact) else {
            return true;
        };
        newest_modification(&recipe.sources).is_some_and(|source| source > built)
    }

    /// Return the artifact path, rebuilding first if it is stale.
    ///
    /// # Errors
    ///
    /// [`ReminderError::Build`] if the build fails or a prebuilt binary is
    /// missing. Every caller joined to a failed build receives the error.
    pub fn ensure_ready(&self) -> Result<PathBuf> {
        if self.recipe.is_none() {
            return if self.artifact.is_file() {
                Ok(self.artifact.clone())
            } else {
                Err(ReminderError::Build(format!(
                    "gateway binary {} does not exist",
                    self.artifact.display()
                )))
            };
        }
        if !self.is_stale() {
            return Ok(self.artifact.clone());
        }

        let (flight, leader) = {
            let mut slot = self.flight.lock().map_err(|_| poisoned())?;
            match *slot {
                Some(ref flight) => (Arc::clone(flight), false),
                None => {
                    // A build may have finished between the check above and
                    // taking the lock.
                    if !self.is_stale() {
                        return Ok(self.artifact.clone());
                    }
                    let flight = Arc::new(BuildFlight::new());
                    *slot = Some(Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        if !leader {
            tracing::debug!(path = %self.artifact.display(), "joining in-flight helper build");
            return flight.wait();
        }

        let outcome = self.build();
        flight.finish(outcome.clone());
        if let Ok(mut slot) = self.flight.lock() {
            *slot = None;
        }
        outcome
    }

    fn build(&self) -> Result<PathBuf> {
        let Some(ref recipe) = self.recipe else {
            return Err(ReminderError::Build("no build recipe configured".to_owned()));
        };
        self.builds.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();
        tracing::info!(path = %self.artifact.display(), command = %recipe.describe(), "building gateway helper");

        let program = which::which(&recipe.program).map_err(|e| {
            ReminderError::Build(format!(
                "build tool {} not found: {e}",
                recipe.program.display()
            ))
        })?;
        let mut cmd = Command::new(program);
        cmd.args(&recipe.args);

        let finished = match process::run_bounded(cmd, recipe.timeout) {
            Ok(Outcome::Finished(done)) => done,
            Ok(Outcome::TimedOut) => {
                return Err(ReminderError::Build(format!(
                    "helper build timed out after {}s",
                    recipe.timeout.as_secs()
                )));
            }
            Err(e) => {
                return Err(ReminderError::Build(format!(
                    "failed to start `{}`: {e}",
                    recipe.describe()
                )));
            }
        };
        if !finished.status.success() {
            let code = finished.status.code().unwrap_or(-1);
            tracing::warn!(code, "gateway helper build failed");
            return Err(ReminderError::Build(format!(
                "`{}` exited with status {code}: {}",
                recipe.describe(),
                process::excerpt(&finished.stderr)
            )));
        }
        if !recipe.output.is_file() {
            return Err(ReminderError::Build(format!(
                "build finished but produced no binary at {}",
                recipe.output.display()
            )));
        }

        install(&recipe.output, &self.artifact)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(path = %self.artifact.display(), elapsed_ms, "gateway helper ready");
        Ok(self.artifact.clone())
    }
}

/// Copy `built` next to `artifact` under a temporary name, then rename it
/// into place.
fn install(built: &Path, artifact: &Path) -> Result<()> {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let parent = artifact.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| {
        ReminderError::Build(format!("cannot create {}: {e}", parent.display()))
    })?;
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(gateway_file_name);
    let staging = parent.join(format!(
        ".{name}.{}-{}.tmp",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));

    let result = std::fs::copy(built, &staging)
        .and_then(|_| std::fs::rename(&staging, artifact))
        .map_err(|e| {
            ReminderError::Build(format!("cannot install {}: {e}", artifact.display()))
        });
    if result.is_err() {
        let _ = std::fs::remove_file(&staging);
    }
    result
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Newest modification time among `paths`, descending into directories.
fn newest_modification(paths: &[PathBuf]) -> Option<SystemTime> {
    let mut newest: Option<SystemTime> = None;
    let mut pending: Vec<PathBuf> = paths.to_vec();
    while let Some(path) = pending.pop() {
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        if let Ok(time) = meta.modified() {
            newest = Some(newest.map_or(time, |n| n.max(time)));
        }
        if meta.is_dir()
            && let Ok(entries) = std::fs::read_dir(&path)
        {
            pending.extend(entries.flatten().map(|e| e.path()));
        }
    }
    newest
}
