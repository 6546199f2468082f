pub mod handlers;
pub mod listing;
pub mod path_utils;
pub mod response;
pub mod spa;

use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::compression::ContentEncoding;
use crate::error::ClientRequestError;
use crate::logging::Logger;

pub struct PrecompressedFile {
    pub path: PathBuf,
    pub encoding: ContentEncoding,
}

/// A filesystem location a request mapped onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub filesystem_path: PathBuf,
    pub exists: bool,
    pub is_directory: bool,
}

impl ResolvedFile {
    pub fn probe(filesystem_path: PathBuf) -> Self {
        let metadata = fs::metadata(&filesystem_path).ok();
        Self {
            exists: metadata.is_some(),
            is_directory: metadata.map(|m| m.is_dir()).unwrap_or(false),
            filesystem_path,
        }
    }

    pub fn is_file(&self) -> bool {
        self.exists && !self.is_directory
    }
}

/// What to answer for one request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve the file with a success status. `spa_fallback` marks the root
    /// index standing in for a path that does not exist.
    File {
        file: ResolvedFile,
        spa_fallback: bool,
    },
    /// Directory requested without its trailing slash.
    Redirect { location: String },
    /// Directory with no index document.
    Listing {
        directory: ResolvedFile,
        display_path: String,
    },
    NotFound,
}

/// Maps request targets onto the filesystem. The serving loop is generic
/// over this so routing policy can be tested without sockets.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, target: &str) -> Result<Resolution, ClientRequestError>;
}

impl<F> PathResolver for F
where
    F: Fn(&str) -> Result<Resolution, ClientRequestError> + Send + Sync,
{
    fn resolve(&self, target: &str) -> Result<Resolution, ClientRequestError> {
        self(target)
    }
}
