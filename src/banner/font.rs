use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where a resolved face came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOrigin {
    /// The user-supplied font file
    Override(PathBuf),
    /// A system font matched by file name
    System(PathBuf),
    /// The built-in bitmap font
    Builtin,
}

/// A face the banner renderer can draw with
pub enum FontFace {
    Outline(Box<Font>),
    Builtin,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(font) => f.debug_tuple("Outline").field(&font.name()).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

/// Resolved face plus its origin, for logging
#[derive(Debug)]
pub struct ResolvedFont {
    pub face: FontFace,
    pub origin: FontOrigin,
}

/// Ordered font fallback chain: override file, system candidates, built-in font.
///
/// Resolution never fails; every rejected candidate is logged and skipped.
pub struct FontResolver {
    override_path: Option<PathBuf>,
    candidates: Vec<String>,
    search_dirs: Vec<PathBuf>,
}

impl FontResolver {
    pub fn new(override_path: Option<PathBuf>, candidates: Vec<String>) -> Self {
        Self {
            override_path,
            candidates,
            search_dirs: system_font_dirs(),
        }
    }

    /// Replace the directories searched for candidate names
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn resolve(&self) -> ResolvedFont {
        if let Some(path) = &self.override_path {
            if path.is_file() {
                if let Some(font) = load_font(path) {
                    info!("Using font file {}", path.display());
                    return ResolvedFont {
                        face: FontFace::Outline(Box::new(font)),
                        origin: FontOrigin::Override(path.clone()),
                    };
                }
            } else {
                warn!("Font file {} does not exist, trying system fonts", path.display());
            }
        }

        let index = self.index_font_files();
        for name in &self.candidates {
            let Some(path) = index.get(&name.to_lowercase()) else {
                debug!("System font {} not found", name);
                continue;
            };
            if let Some(font) = load_font(path) {
                info!("Using system font {}", path.display());
                return ResolvedFont {
                    face: FontFace::Outline(Box::new(font)),
                    origin: FontOrigin::System(path.clone()),
                };
            }
        }

        warn!("No usable font found, falling back to the built-in bitmap font");
        ResolvedFont {
            face: FontFace::Builtin,
            origin: FontOrigin::Builtin,
        }
    }

    /// Map lowercase file name to the first matching path under the search dirs
    fn index_font_files(&self) -> HashMap<String, PathBuf> {
        let mut index = HashMap::new();
        if self.candidates.is_empty() {
            return index;
        }

        for dir in self.search_dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .max_depth(6)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if let Some(name) = entry.file_name().to_str() {
                    index
                        .entry(name.to_lowercase())
                        .or_insert_with(|| entry.path().to_path_buf());
                }
            }
        }

        debug!("Indexed {} font files", index.len());
        index
    }
}

fn load_font(path: &Path) -> Option<Font> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read font {}: {}", path.display(), e);
            return None;
        }
    };

    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Could not parse font {}: {}", path.display(), e);
            None
        }
    }
}

/// Conventional font directories for the current platform
fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join("Library").join("Fonts"));
        }
    } else {
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".local").join("share").join("fonts"));
            dirs.push(home.join(".fonts"));
        }
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
    }

    dirs
}
