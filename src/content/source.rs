//! Raw content enumeration.
//!
//! A [`ContentSource`] yields every raw item of the corpus in a stable order.
//! Failing to enumerate the source at all is a [`LoadError`]; failing to read a
//! single item is carried inside that item and reported later as an item error.

use crate::error::LoadError;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

/// One unparsed content unit.
#[derive(Debug)]
pub struct RawItem {
    pub path: PathBuf,
    pub text: io::Result<String>,
    pub modified: Option<SystemTime>,
}

impl RawItem {
    #[cfg(test)]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: Ok(text.into()),
            modified: None,
        }
    }

    /// File stem, used to derive a slug when front matter has none.
    pub fn stem(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
    }
}

/// Enumerates the raw items of a corpus.
pub trait ContentSource: Send + Sync {
    fn read_all(&self) -> Result<Vec<RawItem>, LoadError>;

    /// Human readable origin for log lines.
    fn describe(&self) -> String;
}

/// Markdown files under a directory, walked recursively in file-name order.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_content_file(&self, path: &Path) -> bool {
        if is_hidden(path) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl ContentSource for FsSource {
    fn read_all(&self) -> Result<Vec<RawItem>, LoadError> {
        let meta = fs::metadata(&self.root).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => LoadError::Missing(self.root.clone()),
            _ => LoadError::Io(self.root.clone(), err),
        })?;
        if !meta.is_dir() {
            return Err(LoadError::NotADirectory(self.root.clone()));
        }

        let mut items = Vec::new();
        // The root may itself be dot-named (temp dirs), so only prune below it
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // The root itself was checked above, so this is a nested entry
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    items.push(RawItem {
                        path,
                        text: Err(io::Error::other(err)),
                        modified: None,
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_content_file(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
            let text = fs::read_to_string(&path);
            items.push(RawItem {
                path,
                text,
                modified,
            });
        }

        Ok(items)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Dotfiles and dot-directories (`.git`, `.obsidian`, editor swap files).
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// In-memory source whose contents and failure mode can be swapped between reloads.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySource {
    items: parking_lot::Mutex<Vec<(PathBuf, String)>>,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemorySource {
    pub(crate) fn new(items: &[(&str, &str)]) -> Self {
        let source = Self::default();
        source.set(items);
        source
    }

    pub(crate) fn set(&self, items: &[(&str, &str)]) {
        *self.items.lock() = items
            .iter()
            .map(|(path, text)| (PathBuf::from(path), (*text).to_owned()))
            .collect();
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl ContentSource for MemorySource {
    fn read_all(&self) -> Result<Vec<RawItem>, LoadError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(LoadError::Missing(PathBuf::from("memory")));
        }
        Ok(self
            .items
            .lock()
            .iter()
            .map(|(path, text)| RawItem::new(path.clone(), text.clone()))
            .collect())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn md_extensions() -> Vec<String> {
        vec!["md".into(), "markdown".into()]
    }

    #[test]
    fn test_missing_root_is_terminal() {
        let source = FsSource::new("/no/such/content/dir", &md_extensions());
        assert!(matches!(source.read_all(), Err(LoadError::Missing(_))));
    }

    #[test]
    fn test_file_root_is_terminal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("post.md");
        fs::write(&file, "---\n---\n").unwrap();

        let source = FsSource::new(&file, &md_extensions());
        assert!(matches!(source.read_all(), Err(LoadError::NotADirectory(_))));
    }

    #[test]
    fn test_walks_recursively_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2024")).unwrap();
        fs::write(dir.path().join("b.md"), "b").unwrap();
        fs::write(dir.path().join("a.markdown"), "a").unwrap();
        fs::write(dir.path().join("2024/c.MD"), "c").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::write(dir.path().join(".hidden.md"), "skip").unwrap();

        let source = FsSource::new(dir.path(), &md_extensions());
        let items = source.read_all().unwrap();
        let names: Vec<_> = items.iter().map(RawItem::stem).collect();

        assert_eq!(names, ["c", "a", "b"]);
        assert!(items.iter().all(|i| i.text.is_ok() && i.modified.is_some()));
    }

    #[test]
    fn test_hidden_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        for sub in [".git", ".obsidian/templates", "posts/.drafts", "posts"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join(".git/HEAD.md"), "skip").unwrap();
        fs::write(dir.path().join(".obsidian/templates/daily.md"), "skip").unwrap();
        fs::write(dir.path().join("posts/.drafts/wip.md"), "skip").unwrap();
        fs::write(dir.path().join("posts/kept.md"), "kept").unwrap();

        let items = FsSource::new(dir.path(), &md_extensions()).read_all().unwrap();
        let names: Vec<_> = items.iter().map(RawItem::stem).collect();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn test_dot_named_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".content");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("post.md"), "text").unwrap();

        let items = FsSource::new(&root, &md_extensions()).read_all().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_extensions_are_normalized() {
        let source = FsSource::new(".", &[".MD".to_string()]);
        assert!(source.is_content_file(Path::new("post.md")));
        assert!(!source.is_content_file(Path::new("post.txt")));
    }

    #[test]
    fn test_memory_source_failure_toggle() {
        let source = MemorySource::new(&[("a.md", "text")]);
        assert_eq!(source.read_all().unwrap().len(), 1);

        source.set_failing(true);
        assert!(source.read_all().is_err());
    }
}
