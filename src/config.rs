use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::BundleMap;
use crate::error::{Result, SnapError};
use crate::filters::FilterRules;
use crate::skeleton::{SkeletonProfile, SkeletonRules};

pub const CONFIG_FILE_NAME: &str = "treesnap.json";
pub const DEFAULT_OUTPUT_DIR: &str = "Debug";

const IGNORED_DIRS: &[&str] = &[
    // version control & tooling
    ".git", ".github", ".vscode", ".idea", "__pycache__", ".pytest_cache",
    "node_modules", ".dart_tool", ".pub", "venv", "env", ".venv",
    // build output
    "build", "dist", DEFAULT_OUTPUT_DIR, ".flutter-plugins", ".flutter-plugins-dependencies",
    // platform subtrees
    "android", "ios", "linux", "macos", "windows", "web",
];

const ALLOWED_EXTENSIONS: &[&str] = &[".py", ".json", ".yaml", ".yml", ".txt", ".md", ".dart", ".sql"];

const IGNORED_FILES: &[&str] = &[
    ".env", ".env.local", ".env.development", ".env.production", ".env.test",
    "secrets.json", "credentials.json", "service-account.json",
    "google-services.json", "client_secret.json",
];

const BUNDLES: &[(&str, &str)] = &[
    ("main.py", "01_main.json"),
    ("entities.py", "02_entities.json"),
    ("services.py", "03_services.json"),
    ("routes.py", "04_routes.json"),
    ("run_backend.py", "05_bootstrap.json"),
    ("core.json", "10_souls_core.json"),
    ("context.json", "11_souls_context.json"),
    ("metadata.json", "12_souls_metadata.json"),
    ("main.dart", "20_flutter_main.json"),
    ("app.dart", "21_flutter_app.json"),
    ("readme.md", "30_docs.json"),
    ("full_concept.txt", "31_design_docs.json"),
];

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub ignored_dirs: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub ignored_files: Vec<String>,
    /// Glob patterns matched against the slash-normalized relative path.
    pub exclusions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            ignored_dirs: strings(IGNORED_DIRS),
            allowed_extensions: strings(ALLOWED_EXTENSIONS),
            ignored_files: strings(IGNORED_FILES),
            exclusions: Vec::new(),
        }
    }
}

/// Everything the pipeline and the explorer need. Any field missing from a
/// config file keeps its default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SnapConfig {
    pub root_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub filters: FilterConfig,
    pub bundles: BTreeMap<String, String>,
    pub skeleton_profile: SkeletonProfile,
}

impl Default for SnapConfig {
    fn default() -> Self {
        SnapConfig {
            root_path: PathBuf::from("."),
            output_path: None,
            filters: FilterConfig::default(),
            bundles: BUNDLES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            skeleton_profile: SkeletonProfile::default(),
        }
    }
}

impl SnapConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path).map_err(|e| SnapError::io(path, e))?;
        serde_json::from_str(&txt).map_err(|e| SnapError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// An explicit path must exist. Without one, `treesnap.json` in the
    /// working directory is used when present.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return SnapConfig::load(path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            log::debug!("Loading config from {}", local.display());
            SnapConfig::load(local)
        } else {
            Ok(SnapConfig::default())
        }
    }

    /// Moves the workspace root. An unset `output_path` follows it, so
    /// snapshots land in `<root>/Debug`.
    pub fn rooted_at(mut self, root: PathBuf) -> Self {
        self.root_path = root;
        self
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.root_path.join(DEFAULT_OUTPUT_DIR))
    }

    pub fn filter_rules(&self) -> FilterRules {
        FilterRules::new(
            &self.filters.ignored_dirs,
            &self.filters.allowed_extensions,
            &self.filters.ignored_files,
        )
        .with_exclusions(&self.filters.exclusions)
    }

    pub fn bundle_map(&self) -> BundleMap {
        BundleMap::new(self.bundles.iter().map(|(k, v)| (k, v.clone())))
    }

    pub fn skeleton_rules(&self) -> SkeletonRules {
        SkeletonRules::for_profile(self.skeleton_profile)
    }
}
