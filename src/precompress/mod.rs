//! Batch precompression of a build output directory.
//!
//! Every eligible file gets a `.gz` sibling and, when brotli support is
//! available, a `.br` sibling. Existing siblings are overwritten.

pub mod encode;
pub mod report;
pub mod scanner;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::logging::Logger;
use encode::{encode_brotli, encode_gzip};

pub const GZIP_LEVEL: u32 = 9;
pub const BROTLI_QUALITY: u32 = 11;

/// Extensions (without the dot) that get compressed siblings.
pub const ELIGIBLE_EXTENSIONS: [&str; 5] = ["js", "css", "html", "json", "wasm"];

/// Whether this build can produce brotli output.
pub fn brotli_available() -> bool {
    cfg!(feature = "brotli")
}

/// One report row per compressed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionEntry {
    pub relative_path: PathBuf,
    pub original_size: u64,
    pub gzip_size: u64,
    pub brotli_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub root: PathBuf,
    pub brotli_available: bool,
    pub entries: Vec<CompressionEntry>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub struct CompressionPass {
    root: PathBuf,
    brotli: bool,
    logger: Logger,
}

impl CompressionPass {
    /// `brotli` is the capability decided at startup; asking for it in a
    /// build without brotli support is a configuration error.
    pub fn new(root: impl Into<PathBuf>, brotli: bool, logger: Logger) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Configuration(format!(
                "Directory not found: {}",
                root.display()
            )));
        }
        if brotli && !brotli_available() {
            return Err(Error::Configuration(
                "brotli output requested but this build has no brotli support".to_string(),
            ));
        }
        Ok(Self {
            root,
            brotli,
            logger,
        })
    }

    pub fn run(&self) -> Result<PassReport> {
        self.run_with(|_| {})
    }

    /// Runs the pass, calling `on_entry` as each file completes.
    /// Stops at the first failing file.
    pub fn run_with<F>(&self, mut on_entry: F) -> Result<PassReport>
    where
        F: FnMut(&CompressionEntry),
    {
        let files = scanner::scan(&self.root)?;
        self.logger.debug(format_args!(
            "Found {} eligible files under {}",
            files.len(),
            self.root.display()
        ));

        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            let entry = self.compress_file(&path)?;
            on_entry(&entry);
            entries.push(entry);
        }

        self.logger.info(format_args!(
            "Compressed {} files in {}",
            entries.len(),
            self.root.display()
        ));
        Ok(PassReport {
            root: self.root.clone(),
            brotli_available: self.brotli,
            entries,
        })
    }

    fn compress_file(&self, path: &Path) -> Result<CompressionEntry> {
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        let subject = relative_path.display();

        let data = fs::read(path).map_err(|e| Error::io(path, e))?;

        let gz_path = sibling(path, ".gz");
        let gzip_size = self.logger.log_operation("gzip", &subject, || {
            let compressed = encode_gzip(&data, GZIP_LEVEL).map_err(|e| Error::io(path, e))?;
            fs::write(&gz_path, &compressed).map_err(|e| Error::io(&gz_path, e))?;
            Ok::<_, Error>(compressed.len() as u64)
        })?;

        let brotli_size = if self.brotli {
            let br_path = sibling(path, ".br");
            let size = self.logger.log_operation("brotli", &subject, || {
                let compressed =
                    encode_brotli(&data, BROTLI_QUALITY).map_err(|e| Error::io(path, e))?;
                fs::write(&br_path, &compressed).map_err(|e| Error::io(&br_path, e))?;
                Ok::<_, Error>(compressed.len() as u64)
            })?;
            Some(size)
        } else {
            None
        };

        Ok(CompressionEntry {
            relative_path,
            original_size: data.len() as u64,
            gzip_size,
            brotli_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use log::LevelFilter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn build_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("assets")).unwrap();
        fs::write(root.join("index.html"), "<html><body>app</body></html>".repeat(20)).unwrap();
        fs::write(root.join("main.dart.js"), "console.log('main');\n".repeat(100)).unwrap();
        fs::write(root.join("assets/image.png"), [0x89, b'P', b'N', b'G']).unwrap();
        temp_dir
    }

    #[test]
    fn missing_directory_is_a_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = CompressionPass::new(temp_dir.path().join("nope"), false, Logger::discard())
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn compresses_eligible_files_only() {
        let dir = build_dir();
        let root = dir.path();

        let report = CompressionPass::new(root, false, Logger::discard())
            .unwrap()
            .run()
            .unwrap();

        let paths: Vec<_> = report.entries.iter().map(|e| e.relative_path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("index.html"), PathBuf::from("main.dart.js")]);
        assert!(root.join("main.dart.js.gz").is_file());
        assert!(!root.join("assets/image.png.gz").exists());
        assert!(!root.join("main.dart.js.br").exists());

        let js = &report.entries[1];
        assert_eq!(js.original_size, fs::metadata(root.join("main.dart.js")).unwrap().len());
        assert_eq!(js.gzip_size, fs::metadata(root.join("main.dart.js.gz")).unwrap().len());
        assert!(js.gzip_size < js.original_size);
        assert_eq!(js.brotli_size, None);
        assert!(!report.brotli_available);
    }

    #[test]
    fn on_entry_sees_rows_in_order() {
        let dir = build_dir();
        let mut seen = Vec::new();

        CompressionPass::new(dir.path(), false, Logger::discard())
            .unwrap()
            .run_with(|entry| seen.push(entry.relative_path.clone()))
            .unwrap();

        assert_eq!(seen, vec![PathBuf::from("index.html"), PathBuf::from("main.dart.js")]);
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn writes_brotli_siblings_when_available() {
        let dir = build_dir();
        let report = CompressionPass::new(dir.path(), true, Logger::discard())
            .unwrap()
            .run()
            .unwrap();

        for entry in &report.entries {
            let br = sibling(&dir.path().join(&entry.relative_path), ".br");
            assert_eq!(entry.brotli_size, Some(fs::metadata(br).unwrap().len()));
        }
    }

    #[cfg(not(feature = "brotli"))]
    #[test]
    fn brotli_request_without_support_is_rejected() {
        let dir = build_dir();
        assert!(CompressionPass::new(dir.path(), true, Logger::discard()).is_err());
    }

    #[test]
    fn failed_write_aborts_the_pass() {
        let dir = build_dir();
        let root = dir.path();
        fs::write(root.join("a.js"), "first()").unwrap();
        fs::write(root.join("b.js"), "second()").unwrap();
        // The gzip sibling of a.js cannot be written over a directory
        fs::create_dir(root.join("a.js.gz")).unwrap();

        let sink = Arc::new(MemoryLog::new(LevelFilter::Debug));
        let err = CompressionPass::new(root, false, Logger::new(sink.clone()))
            .unwrap()
            .run()
            .unwrap_err();

        match &err {
            Error::Io { path, .. } => assert_eq!(path.file_name().unwrap(), "a.js.gz"),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        assert_eq!(err.exit_code(), 1);
        assert_eq!(sink.matching("Failed gzip on a.js").len(), 1);
        // Nothing after the failing file was written
        assert!(!root.join("b.js.gz").exists());
        assert!(!root.join("index.html.gz").exists());
    }
}
