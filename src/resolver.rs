use std::fs;
use std::path::{Path, PathBuf};

/// File name of the vault client executable.
pub const BINARY_NAME: &str = "bw";

/// Locates the bundled vault client executable.
///
/// Search order, first match wins: `<plugin_dir>/backend/bin/bw`, then the
/// legacy `<plugin_dir>/bin/bw`. Environment variables and PATH are
/// deliberately never consulted: the plugin owns its binary and loads it from
/// a known relative location so behavior is identical in every deployment.
///
/// The first successful resolution is cached for the lifetime of the resolver;
/// [`BinaryResolver::reset`] clears the cache and forces re-probing.
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    plugin_dir: PathBuf,
    cached: Option<PathBuf>,
}

impl BinaryResolver {
    /// Creates a resolver rooted at the plugin installation directory.
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            cached: None,
        }
    }

    /// Plugin installation directory this resolver probes under.
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Resolves the executable path, probing the filesystem at most once
    /// after construction or a reset.
    pub fn resolve(&mut self) -> Option<PathBuf> {
        if let Some(path) = &self.cached {
            return Some(path.clone());
        }

        for candidate in self.candidates() {
            if is_executable_file(&candidate) {
                self.cached = Some(candidate.clone());
                return Some(candidate);
            }
        }
        None
    }

    /// Clears the cached location so the next [`BinaryResolver::resolve`]
    /// re-probes. Used after environment reconfiguration and in tests.
    pub fn reset(&mut self) {
        self.cached = None;
    }

    /// Expected bundled location, used in missing-binary guidance messages.
    pub fn bundled_path(&self) -> PathBuf {
        self.plugin_dir.join("backend").join("bin").join(BINARY_NAME)
    }

    fn candidates(&self) -> [PathBuf; 2] {
        [
            self.bundled_path(),
            self.plugin_dir.join("bin").join(BINARY_NAME),
        ]
    }
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    true
}
