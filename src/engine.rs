use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::bundle::find_bundle;
use crate::config::SnapConfig;
use crate::error::{Result, SnapError};
use crate::filters::{
    is_allowed_extension, is_denied_file, matches_exclusion, should_ignore_dir, FilterRules,
};
use crate::models::{
    Assembly, ExportReport, FileRecord, Metadata, SkippedFile, SnapshotDocument, SnapshotMode,
    Stats,
};
use crate::skeleton::skeletonize;

// -----------------------------------------------------------------------------
// Public helpers
// -----------------------------------------------------------------------------

/// `<output_root>/<folder>/<folder>_snapshot.json`, or `_blueprint.json` for
/// the reduced modes.
pub fn default_output_path(output_root: &Path, folder_name: &str, mode: SnapshotMode) -> PathBuf {
    let suffix = if mode.is_reduced() { "blueprint" } else { "snapshot" };
    output_root
        .join(folder_name)
        .join(format!("{folder_name}_{suffix}.json"))
}

pub fn format_languages(stats: &Stats) -> String {
    if stats.by_language.is_empty() {
        return "none".into();
    }
    stats
        .by_language
        .iter()
        .map(|(lang, n)| format!("{lang}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| root.display().to_string())
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn relative_to(root: &Path, path: &Path) -> String {
    slash_path(path.strip_prefix(root).unwrap_or(path))
}

/// Lowercase, with the leading dot. Empty when there is none.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

// -----------------------------------------------------------------------------
// Ordering
// -----------------------------------------------------------------------------

/// Directories first, then case-insensitive name, then exact name.
pub fn entry_order(a_is_dir: bool, a_name: &OsStr, b_is_dir: bool, b_name: &OsStr) -> Ordering {
    b_is_dir
        .cmp(&a_is_dir)
        .then_with(|| {
            a_name
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b_name.to_string_lossy().to_lowercase())
        })
        .then_with(|| a_name.cmp(b_name))
}

fn walk_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    entry_order(
        a.file_type().is_dir(),
        a.file_name(),
        b.file_type().is_dir(),
        b.file_name(),
    )
}

// -----------------------------------------------------------------------------
// Listing (explorer side)
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// One level of `dir`, sorted like the export walk. Ignored directories are
/// hidden; files are listed unfiltered.
pub fn list_directory(dir: &Path, filters: &FilterRules) -> Result<DirListing> {
    let mut entries: Vec<(bool, PathBuf)> = fs::read_dir(dir)
        .map_err(|e| SnapError::io(dir, e))?
        .flatten()
        .map(|e| {
            let path = e.path();
            (path.is_dir(), path)
        })
        .collect();

    entries.sort_by(|(a_dir, a), (b_dir, b)| {
        entry_order(
            *a_dir,
            a.file_name().unwrap_or_default(),
            *b_dir,
            b.file_name().unwrap_or_default(),
        )
    });

    let mut listing = DirListing::default();
    for (is_dir, path) in entries {
        let name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
        if is_dir {
            if !should_ignore_dir(&name, filters) {
                listing.dirs.push(path);
            }
        } else if path.is_file() {
            listing.files.push(path);
        }
    }
    Ok(listing)
}

/// Project folders directly under `root`, skipping hidden ones and the
/// export output folder.
pub fn list_projects(root: &Path, output_dir_name: &str) -> Result<Vec<PathBuf>> {
    let mut projects: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| SnapError::io(root, e))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            let name = p.file_name().unwrap_or_default().to_string_lossy();
            name != output_dir_name && !name.starts_with('.')
        })
        .collect();

    projects.sort_by(|a, b| {
        entry_order(
            true,
            a.file_name().unwrap_or_default(),
            true,
            b.file_name().unwrap_or_default(),
        )
    });
    Ok(projects)
}

// -----------------------------------------------------------------------------
// Assembly
// -----------------------------------------------------------------------------

pub fn assemble_snapshot(root: &Path, mode: SnapshotMode, config: &SnapConfig) -> Result<Assembly> {
    assemble(root, mode, config, None)
}

/// `skip` is the canonical path of a previous snapshot that lives inside the
/// tree; it never feeds into the next one.
fn assemble(
    root: &Path,
    mode: SnapshotMode,
    config: &SnapConfig,
    skip: Option<&Path>,
) -> Result<Assembly> {
    if !root.is_dir() {
        return Err(SnapError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let filters = config.filter_rules();
    let bundles = config.bundle_map();
    let skeleton_rules = config.skeleton_rules();

    let mut files = Vec::new();
    let mut stats = Stats::default();
    let mut skipped = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by(walk_order)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !should_ignore_dir(&e.file_name().to_string_lossy(), &filters)
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                // Unreadable directory: walkdir already dropped its subtree.
                let rel = err
                    .path()
                    .map(|p| relative_to(root, p))
                    .unwrap_or_default();
                log::warn!("Skipping {rel}: {err}");
                skipped.push(SkippedFile {
                    path: rel,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(skip) = skip {
            if path.file_name() == skip.file_name()
                && path.canonicalize().map_or(false, |p| p == skip)
            {
                log::debug!("Not including own output {}", path.display());
                continue;
            }
        }

        let name = entry.file_name().to_string_lossy();
        if is_denied_file(&name, &filters) {
            log::debug!("Denylisted: {}", path.display());
            continue;
        }

        let ext = dotted_extension(path);
        if !is_allowed_extension(&ext, &filters) {
            continue;
        }

        let rel = relative_to(root, path);
        if matches_exclusion(&rel, &filters) {
            continue;
        }

        let raw = match fs::read_to_string(path) {
            Ok(txt) => txt,
            Err(e) => {
                log::warn!("Could not read {rel}: {e}");
                skipped.push(SkippedFile {
                    path: rel,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let (content, imports) = if mode.is_reduced() {
            let sk = skeletonize(&raw, &ext, &name, &skeleton_rules);
            (sk.content, sk.imports)
        } else {
            (raw, Vec::new())
        };

        let language = ext.trim_start_matches('.').to_string();
        stats.record(&language);
        log::debug!("Included {rel} ({language})");

        files.push(FileRecord {
            path: rel,
            bundle: find_bundle(&name, &bundles).to_string(),
            language,
            content,
            imports,
        });
    }

    Ok(Assembly {
        document: SnapshotDocument {
            metadata: Metadata {
                project_name: project_name(root),
                mode,
            },
            files,
            stats,
        },
        skipped,
    })
}

// -----------------------------------------------------------------------------
// Serialization
// -----------------------------------------------------------------------------

/// Pretty JSON through a sibling temp file and a rename, so the destination
/// is either the old file or the complete new one.
pub fn write_snapshot(document: &SnapshotDocument, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SnapError::io(parent, e))?;
        }
    }

    let data = serde_json::to_vec_pretty(document)?;

    let mut tmp_name = destination.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = destination.with_file_name(tmp_name);

    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(&data)?;
        f.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(SnapError::io(&tmp, e));
    }

    fs::rename(&tmp, destination).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        SnapError::io(destination, e)
    })
}

// -----------------------------------------------------------------------------
// Export
// -----------------------------------------------------------------------------

pub fn export_snapshot(
    root: &Path,
    output: &Path,
    mode: SnapshotMode,
    config: &SnapConfig,
) -> Result<ExportReport> {
    let own_output = output.canonicalize().ok();
    let Assembly { document, skipped } = assemble(root, mode, config, own_output.as_deref())?;
    write_snapshot(&document, output)?;

    log::info!(
        "Exported {} files ({} mode) to {}",
        document.stats.total_files,
        mode,
        output.display()
    );
    if !skipped.is_empty() {
        log::warn!("{} entries could not be read", skipped.len());
    }

    Ok(ExportReport {
        stats: document.stats,
        skipped,
        output: output.to_path_buf(),
    })
}
