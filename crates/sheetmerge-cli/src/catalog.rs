use sheetmerge_core::TemplateCatalog;
use std::path::{Path, PathBuf};

/// Templates stored as `*.xlsx` files in one directory, addressed by file name.
#[derive(Debug, Clone)]
pub struct DirCatalog {
    root: PathBuf,
}

impl DirCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_template(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
    }
}

impl TemplateCatalog for DirCatalog {
    fn template_ids(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %self.root.display(), %err, "cannot list templates");
                return Vec::new();
            }
        };
        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| Self::is_template(path))
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        ids.sort();
        ids
    }

    fn load(&self, id: &str) -> Option<Vec<u8>> {
        // Identifiers are bare file names; anything that could leave the
        // directory is unknown.
        if id.is_empty() || Path::new(id).components().count() != 1 || id == ".." {
            return None;
        }
        let path = self.root.join(id);
        if !Self::is_template(&path) {
            return None;
        }
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot read template");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_xlsx_files_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.xlsx"), b"b").unwrap();
        std::fs::write(dir.path().join("a.XLSX"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        std::fs::create_dir(dir.path().join("nested.xlsx")).unwrap();

        let catalog = DirCatalog::new(dir.path());
        assert_eq!(catalog.template_ids(), vec!["a.XLSX", "b.xlsx"]);
        assert_eq!(catalog.load("b.xlsx"), Some(b"b".to_vec()));
        assert!(catalog.load("notes.txt").is_none());
        assert!(catalog.load("missing.xlsx").is_none());
        assert!(catalog.load("../b.xlsx").is_none());
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let catalog = DirCatalog::new("/definitely/not/here");
        assert!(catalog.template_ids().is_empty());
        assert!(!catalog.contains("a.xlsx"));
    }
}
