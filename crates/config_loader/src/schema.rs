//! Federation configuration schema

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default anti-affinity window (milliseconds)
pub const DEFAULT_ANTI_AFFINITY_MS: u64 = 10_000;

fn default_anti_affinity_ms() -> u64 {
    DEFAULT_ANTI_AFFINITY_MS
}

/// Top-level configuration of a federation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FederationConfig {
    /// Samples of one series closer than this are duplicates
    #[serde(default = "default_anti_affinity_ms")]
    pub anti_affinity_ms: u64,

    /// Deadline of one logical call (absent or 0 = none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Ordered backend list; the index is the metric attribution key
    #[validate(length(min = 1, message = "at least one backend is required"), nested)]
    pub backends: Vec<BackendConfig>,
}

/// One backend, served from a fixture snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    #[validate(length(min = 1, message = "backend name cannot be empty"))]
    pub name: String,

    /// Path of the JSON snapshot
    #[validate(length(min = 1, message = "fixture path cannot be empty"))]
    pub fixture: String,
}

impl FederationConfig {
    pub fn anti_affinity(&self) -> Duration {
        Duration::from_millis(self.anti_affinity_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name.clone()).collect()
    }

    /// Rebase relative fixture paths onto `base_dir`
    pub fn resolve_fixtures(&mut self, base_dir: &Path) {
        for backend in &mut self.backends {
            let path = Path::new(&backend.fixture);
            if path.is_relative() {
                backend.fixture = base_dir.join(path).to_string_lossy().into_owned();
            }
        }
    }
}

impl BackendConfig {
    pub fn fixture_path(&self) -> PathBuf {
        PathBuf::from(&self.fixture)
    }
}
