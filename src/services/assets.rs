//! Text-asset loading for prompt enrichment.
//!
//! Style guides, brainstorms, or brand notes dropped into the assets
//! directory are folded into the prompt-optimization context. A missing
//! directory is not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Loads text assets from a local directory tree.
pub struct AssetsLoader {
    assets_dir: PathBuf,
}

impl AssetsLoader {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        let assets_dir = assets_dir.into();
        if !assets_dir.exists() {
            tracing::warn!(dir = %assets_dir.display(), "assets directory does not exist");
        }
        Self { assets_dir }
    }

    /// Load all non-empty text files, keyed by file name. Unreadable files
    /// are skipped with a warning.
    pub fn load_all(&self) -> BTreeMap<String, String> {
        let mut assets = BTreeMap::new();
        if !self.assets_dir.exists() {
            return assets;
        }

        for path in collect_text_files(&self.assets_dir) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match std::fs::read_to_string(&path) {
                Ok(content) if !content.trim().is_empty() => {
                    tracing::debug!(file = %name, chars = content.len(), "loaded text asset");
                    assets.insert(name, content);
                }
                Ok(_) => tracing::warn!(file = %name, "skipped empty asset"),
                Err(e) => tracing::warn!(file = %name, error = %e, "failed to load asset"),
            }
        }
        assets
    }

    /// Format loaded assets into a prompt-enrichment block.
    pub fn format_for_prompt(assets: &BTreeMap<String, String>) -> String {
        assets
            .iter()
            .map(|(name, content)| format!("From {name}:\n{}", content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn collect_text_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read assets directory");
            return files;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_text_files(&path));
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        {
            files.push(path);
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_yields_no_assets() {
        let loader = AssetsLoader::new("/nonexistent/assets/dir");
        assert!(loader.load_all().is_empty());
    }

    #[test]
    fn loads_text_files_recursively_and_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("style")).unwrap();
        std::fs::write(dir.path().join("brand.md"), "Bold, energetic visuals").unwrap();
        std::fs::write(dir.path().join("style/palette.txt"), "Use warm tones").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   ").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8; 4]).unwrap();

        let assets = AssetsLoader::new(dir.path()).load_all();
        assert_eq!(assets.len(), 2);
        assert!(assets.contains_key("brand.md"));
        assert!(assets.contains_key("palette.txt"));

        let formatted = AssetsLoader::format_for_prompt(&assets);
        assert!(formatted.contains("From brand.md:"));
        assert!(formatted.contains("Use warm tones"));
    }
}
