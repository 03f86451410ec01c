//! Delivery archive assembly
//!
//! Walks a project tree, filters out build output and local state, and
//! writes the remainder into a timestamped tar.gz with a small manifest.

use crate::error::{DeliveryError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use glob::Pattern;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Builder;

/// Directories never shipped, wherever they appear in the tree.
const EXCLUDED_DIRS: &[&str] = &[
    "target",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".terraform",
];

/// File patterns never shipped.
const EXCLUDED_FILES: &[&str] = &["*.pyc", "*.tfstate*", ".env*", "*.tar.gz"];

/// Hidden directories that still ship.
const KEPT_HIDDEN_DIRS: &[&str] = &[".github"];

/// Summary of a produced archive.
#[derive(Debug, Clone)]
pub struct DeliveryManifest {
    pub archive_path: PathBuf,
    pub file_count: usize,
    pub total_bytes: u64,
}

/// File-filtering archive writer.
pub struct DeliveryPackager {
    project_root: PathBuf,
    excludes: Vec<Pattern>,
}

impl DeliveryPackager {
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self> {
        let project_root = project_root.as_ref().to_path_buf();
        if !project_root.is_dir() {
            return Err(DeliveryError::InvalidRoot(
                project_root.display().to_string(),
            ));
        }

        let excludes = EXCLUDED_FILES
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            project_root,
            excludes,
        })
    }

    /// Add extra exclude patterns on top of the defaults.
    pub fn with_excludes(mut self, patterns: &[&str]) -> Result<Self> {
        for pattern in patterns {
            self.excludes.push(Pattern::new(pattern)?);
        }
        Ok(self)
    }

    /// Write the archive into `output_dir`, named
    /// `<name>-delivery_<timestamp>.tar.gz`.
    pub fn package(&self, output_dir: &Path, name: &str) -> Result<DeliveryManifest> {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let archive_path = output_dir.join(format!("{}-delivery_{}.tar.gz", name, timestamp));

        tracing::info!("Creating delivery package: {}", archive_path.display());

        let mut files = Vec::new();
        self.collect_files(&self.project_root, &mut files)?;
        files.sort();

        let file = File::create(&archive_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut tar = Builder::new(encoder);

        for relative in &files {
            let absolute = self.project_root.join(relative);
            tar.append_path_with_name(&absolute, relative)?;
            tracing::debug!("Added to package: {}", relative.display());
        }

        let encoder = tar.into_inner()?;
        encoder.finish()?;

        let total_bytes = std::fs::metadata(&archive_path)?.len();
        tracing::info!(
            "Delivery package created: {} files, {} bytes",
            files.len(),
            total_bytes
        );

        Ok(DeliveryManifest {
            archive_path,
            file_count: files.len(),
            total_bytes,
        })
    }

    /// Write the accompanying delivery note next to the archive.
    pub fn write_delivery_readme(&self, manifest: &DeliveryManifest) -> Result<PathBuf> {
        let readme_path = manifest
            .archive_path
            .parent()
            .unwrap_or(Path::new("."))
            .join("DELIVERY.md");

        let archive_name = manifest
            .archive_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let content = format!(
            "# Delivery package\n\n\
             **Date:** {}\n\
             **Archive:** {}\n\
             **Files:** {}\n\
             **Size:** {:.2} MB\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            archive_name,
            manifest.file_count,
            manifest.total_bytes as f64 / (1024.0 * 1024.0),
        );

        std::fs::write(&readme_path, content)?;
        Ok(readme_path)
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            let name = entry.file_name().to_string_lossy().to_string();

            if file_type.is_dir() {
                if self.skip_dir(&name) {
                    tracing::debug!("Skipping directory: {}", path.display());
                    continue;
                }
                self.collect_files(&path, files)?;
            } else if file_type.is_file() {
                // The walk started at project_root, so the prefix holds.
                if let Ok(relative) = path.strip_prefix(&self.project_root) {
                    if !self.skip_file(relative, &name) {
                        files.push(relative.to_path_buf());
                    }
                }
            }
            // Symlinks are left out of delivery packages.
        }
        Ok(())
    }

    fn skip_dir(&self, name: &str) -> bool {
        if EXCLUDED_DIRS.contains(&name) {
            return true;
        }
        name.starts_with('.') && !KEPT_HIDDEN_DIRS.contains(&name)
    }

    fn skip_file(&self, relative: &Path, name: &str) -> bool {
        let relative = relative.to_string_lossy();
        self.excludes
            .iter()
            .any(|p| p.matches(&relative) || p.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use tar::Archive;
    use tempfile::tempdir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn archive_entries(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = Archive::new(GzDecoder::new(file));
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_package_filters_junk() {
        let project = tempdir().unwrap();
        let out = tempdir().unwrap();
        let root = project.path();

        touch(&root.join("README.md"), "# demo");
        touch(&root.join("src/main.rs"), "fn main() {}");
        touch(&root.join(".github/workflows/ci.yml"), "on: push");
        touch(&root.join("target/debug/app"), "binary");
        touch(&root.join("scripts/cache.pyc"), "junk");
        touch(&root.join(".env"), "SECRET=1");
        touch(&root.join(".git/HEAD"), "ref: main");
        touch(&root.join("infra/prod.tfstate.backup"), "{}");

        let packager = DeliveryPackager::new(root).unwrap();
        let manifest = packager.package(out.path(), "demo").unwrap();

        let entries = archive_entries(&manifest.archive_path);
        assert_eq!(
            entries,
            vec![
                ".github/workflows/ci.yml".to_string(),
                "README.md".to_string(),
                "src/main.rs".to_string(),
            ]
        );
        assert_eq!(manifest.file_count, 3);
        assert!(manifest.total_bytes > 0);
    }

    #[test]
    fn test_extra_excludes() {
        let project = tempdir().unwrap();
        let out = tempdir().unwrap();
        let root = project.path();

        touch(&root.join("keep.md"), "keep");
        touch(&root.join("notes.draft"), "drop");

        let packager = DeliveryPackager::new(root)
            .unwrap()
            .with_excludes(&["*.draft"])
            .unwrap();
        let manifest = packager.package(out.path(), "demo").unwrap();

        assert_eq!(archive_entries(&manifest.archive_path), vec!["keep.md"]);
    }

    #[test]
    fn test_archive_name_has_timestamp() {
        let project = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(&project.path().join("a.txt"), "a");

        let packager = DeliveryPackager::new(project.path()).unwrap();
        let manifest = packager.package(out.path(), "demo").unwrap();

        let name = manifest
            .archive_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(name.starts_with("demo-delivery_"));
        assert!(name.ends_with(".tar.gz"));
    }

    #[test]
    fn test_delivery_readme() {
        let project = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(&project.path().join("a.txt"), "a");

        let packager = DeliveryPackager::new(project.path()).unwrap();
        let manifest = packager.package(out.path(), "demo").unwrap();
        let readme = packager.write_delivery_readme(&manifest).unwrap();

        let content = fs::read_to_string(readme).unwrap();
        assert!(content.contains("Delivery package"));
        assert!(content.contains("**Files:** 1"));
    }

    #[test]
    fn test_invalid_root() {
        let err = DeliveryPackager::new("/definitely/not/here").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidRoot(_)));
    }
}
