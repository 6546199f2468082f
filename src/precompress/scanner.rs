//! Deterministic discovery of files eligible for precompression.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::ELIGIBLE_EXTENSIONS;
use crate::error::{Error, Result};

/// True if the file extension is on the allow-list (case-insensitive).
pub fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ELIGIBLE_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Lists eligible regular files under `root` in lexicographic tree order.
///
/// Symlinks are not followed. The first unreadable entry aborts the scan.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, io::Error::from(e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if is_eligible(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case("main.dart.js", true)]
    #[case("styles.CSS", true)]
    #[case("index.html", true)]
    #[case("manifest.json", true)]
    #[case("canvaskit.wasm", true)]
    #[case("image.png", false)]
    #[case("app.js.gz", false)]
    #[case("app.js.br", false)]
    #[case("index.htm", false)]
    #[case("LICENSE", false)]
    fn filters_extensions(#[case] name: &str, #[case] eligible: bool) {
        assert_eq!(is_eligible(Path::new(name)), eligible);
    }

    #[test]
    fn walks_tree_in_lexicographic_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/nested")).unwrap();
        for name in ["b.js", "a.js", "a/z.css", "a/nested/x.json", "a/logo.png", "c.html"] {
            fs::write(root.join(name), "x").unwrap();
        }

        let files: Vec<PathBuf> = scan(root)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        let expected: Vec<PathBuf> = ["a/nested/x.json", "a/z.css", "a.js", "b.js", "c.html"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = scan(&temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
