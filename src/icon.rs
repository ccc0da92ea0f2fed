//! Icon lookup.
//!
//! A button's icon reference is either a path to an existing file, a
//! `theme:name` pair, or a bare `name` looked up in the default theme.
//! Themed lookups follow the freedesktop directory convention
//! `<base>/<theme>/<W>x<H>/...` and search each size directory recursively.
//!
//! Size directories are visited in whatever order the filesystem returns
//! them, so when several sizes contain the icon the winner is not fixed.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Resolves icon references to concrete image files.
#[derive(Debug, Clone)]
pub struct IconResolver {
    base_dir: PathBuf,
    default_theme: String,
    max_width: u32,
}

impl IconResolver {
    /// Create a resolver searching `base_dir`, using `default_theme` for bare
    /// names and ignoring size directories wider than `max_width`.
    pub fn new(base_dir: impl Into<PathBuf>, default_theme: impl Into<String>, max_width: u32) -> Self {
        Self {
            base_dir: base_dir.into(),
            default_theme: default_theme.into(),
            max_width,
        }
    }

    /// Resolve `reference` to an image file.
    ///
    /// Never fails: an empty reference or a miss yields `None`, which the
    /// UI renders as "no image".
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let path = Path::new(reference);
        if path.is_file() {
            return Some(std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()));
        }

        let (theme, name) = split_theme(reference).unwrap_or((self.default_theme.as_str(), reference));
        let found = self.find_icon(theme, name);
        match &found {
            Some(p) => debug!("icon {:?} -> {}", reference, p.display()),
            None => warn!("icon {:?} not found in theme {:?}", reference, theme),
        }
        found
    }

    fn find_icon(&self, theme: &str, name: &str) -> Option<PathBuf> {
        let wanted = icon_stem(name);
        if wanted.is_empty() {
            return None;
        }

        let theme_dir = self.base_dir.join(theme);
        let dirs = std::fs::read_dir(&theme_dir).ok()?;
        for dir in dirs.flatten() {
            let dir_path = dir.path();
            if !dir_path.is_dir() {
                continue;
            }
            let Some(width) = dir.file_name().to_str().and_then(size_dir_width) else {
                continue;
            };
            if width > self.max_width {
                continue;
            }
            if let Some(found) = search_dir(&dir_path, &wanted) {
                return Some(found);
            }
        }
        None
    }
}

/// Split `theme:name`; `None` when there is no theme prefix.
fn split_theme(reference: &str) -> Option<(&str, &str)> {
    let (theme, name) = reference.split_once(':')?;
    let (theme, name) = (theme.trim(), name.trim());
    let is_word = !theme.is_empty() && theme.chars().all(|c| c.is_alphanumeric() || c == '_');
    (is_word && !name.is_empty()).then_some((theme, name))
}

/// Lower-cased name with a trailing `.ext` removed.
fn icon_stem(name: &str) -> String {
    let name = name.to_lowercase();
    match split_extension(&name) {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let is_word = !ext.is_empty() && ext.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_word.then_some((stem, ext))
}

/// Width of a `<W>x<H>` directory name.
fn size_dir_width(name: &str) -> Option<u32> {
    let (w, h) = name.split_once('x')?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(w) || !digits(h) {
        return None;
    }
    w.parse().ok()
}

/// Top-down walk: files of `dir` first, then its subdirectories.
fn search_dir(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let entries: Vec<_> = std::fs::read_dir(dir).ok()?.flatten().collect();
    let mut subdirs = Vec::new();
    for entry in &entries {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_lowercase();
        if let Some((stem, _)) = split_extension(&file_name) {
            if stem == wanted {
                return Some(path);
            }
        }
    }
    subdirs.iter().find_map(|sub| search_dir(sub, wanted))
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// A fresh, empty icon base directory.
    fn tmp_base() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("btngrid-icons-{}-{}", std::process::id(), id));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"png").unwrap();
    }

    #[test]
    fn existing_file_is_returned_absolute() {
        let base = tmp_base();
        let file = base.join("lock.png");
        touch(&file);
        let r = IconResolver::new(&base, "hicolor", 256);
        let resolved = r.resolve(file.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, file);
    }

    #[test]
    fn bare_name_searches_default_theme_case_insensitively() {
        let base = tmp_base();
        let icon = base.join("hicolor/48x48/apps/System-Reboot.PNG");
        touch(&icon);
        let r = IconResolver::new(&base, "hicolor", 256);
        assert_eq!(r.resolve("system-reboot.svg"), Some(icon));
    }

    #[test]
    fn theme_prefix_selects_theme() {
        let base = tmp_base();
        touch(&base.join("hicolor/32x32/apps/term.png"));
        let themed = base.join("Adwaita/32x32/apps/term.png");
        touch(&themed);
        let r = IconResolver::new(&base, "hicolor", 256);
        assert_eq!(r.resolve("Adwaita:term"), Some(themed));
    }

    #[test]
    fn oversized_and_non_size_dirs_are_skipped() {
        let base = tmp_base();
        touch(&base.join("hicolor/512x512/apps/big.png"));
        touch(&base.join("hicolor/scalable/apps/big.svg"));
        let r = IconResolver::new(&base, "hicolor", 256);
        assert_eq!(r.resolve("big"), None);

        let r = IconResolver::new(&base, "hicolor", 512);
        assert_eq!(r.resolve("big"), Some(base.join("hicolor/512x512/apps/big.png")));
    }

    #[test]
    fn misses_and_empty_references_yield_none() {
        let base = tmp_base();
        let r = IconResolver::new(&base, "hicolor", 256);
        assert_eq!(r.resolve(""), None);
        assert_eq!(r.resolve("nothing-here"), None);
        assert_eq!(r.resolve("missing-theme:thing"), None);
    }

    #[test]
    fn size_dir_names() {
        assert_eq!(size_dir_width("48x48"), Some(48));
        assert_eq!(size_dir_width("48x48@2"), None);
        assert_eq!(size_dir_width("scalable"), None);
        assert_eq!(size_dir_width("x48"), None);
    }

    #[test]
    fn theme_split() {
        assert_eq!(split_theme("hicolor:firefox"), Some(("hicolor", "firefox")));
        assert_eq!(split_theme(" breeze : kate "), Some(("breeze", "kate")));
        assert_eq!(split_theme("firefox"), None);
        assert_eq!(split_theme("a-b:c"), None);
    }
}
