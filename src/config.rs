use std::fs;
use std::path::PathBuf;

use crate::args::ServeArgs;
use crate::error::{Error, Result};
use crate::file_serving::path_utils::normalize_url_prefix;

/// Server settings, fixed once the server starts.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Canonical path of the served directory.
    pub root_directory: PathBuf,
    pub host: String,
    pub port: u16,
    /// Always `/` or `/segment[/segment...]` without a trailing slash.
    pub url_prefix: String,
    pub auto_open_browser: bool,
    pub strict_prefix: bool,
    pub precompressed: bool,
}

impl ServeConfig {
    pub fn new(root_directory: impl Into<PathBuf>, url_prefix: &str) -> Result<Self> {
        let root_directory = root_directory.into();
        if !root_directory.is_dir() {
            return Err(Error::Configuration(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }
        let root_directory =
            fs::canonicalize(&root_directory).map_err(|e| Error::io(&root_directory, e))?;

        Ok(Self {
            root_directory,
            host: "0.0.0.0".to_string(),
            port: 8080,
            url_prefix: normalize_url_prefix(url_prefix),
            auto_open_browser: false,
            strict_prefix: false,
            precompressed: false,
        })
    }

    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let mut config = Self::new(&args.dir, &args.url_prefix)?;
        config.host = args.host.clone();
        config.port = args.port;
        config.auto_open_browser = args.open;
        config.strict_prefix = args.strict_prefix;
        config.precompressed = args.precompressed;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn has_root_index(&self) -> bool {
        self.root_directory.join("index.html").is_file()
    }
}
