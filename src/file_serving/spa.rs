use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::path_utils::{decode_path, sanitize_path, split_query, strip_url_prefix};
use super::{PathResolver, Resolution, ResolvedFile};
use crate::config::ServeConfig;
use crate::error::ClientRequestError;
use crate::logging::Logger;

/// Index documents looked up inside a requested directory, in order.
pub const INDEX_DOCUMENTS: [&str; 2] = ["index.html", "index.htm"];

/// Root document served for unmatched paths.
pub const SPA_INDEX: &str = "index.html";

/// Static-file resolution with URL prefix stripping and SPA fallback.
#[derive(Debug, Clone)]
pub struct SpaResolver {
    config: Arc<ServeConfig>,
    logger: Logger,
}

impl SpaResolver {
    pub fn new(config: Arc<ServeConfig>, logger: Logger) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    /// Regular file at `path` whose canonical form stays under the root.
    fn contained_file(&self, path: &Path) -> Option<ResolvedFile> {
        let canonical = fs::canonicalize(path).ok()?;
        if !canonical.starts_with(&self.config.root_directory) {
            self.logger.warn(format_args!(
                "Index document escapes base directory: {} -> {}",
                path.display(),
                canonical.display()
            ));
            return None;
        }
        Some(ResolvedFile::probe(canonical)).filter(ResolvedFile::is_file)
    }

    fn fallback(&self, request_path: &str) -> Resolution {
        match self.contained_file(&self.config.root_directory.join(SPA_INDEX)) {
            Some(index) => {
                self.logger
                    .debug(format_args!("Fallback to {} for path: {}", SPA_INDEX, request_path));
                Resolution::File {
                    file: index,
                    spa_fallback: true,
                }
            }
            None => Resolution::NotFound,
        }
    }

    fn resolve_directory(&self, directory: ResolvedFile, display_path: String) -> Resolution {
        for name in INDEX_DOCUMENTS {
            if let Some(candidate) = self.contained_file(&directory.filesystem_path.join(name)) {
                return Resolution::File {
                    file: candidate,
                    spa_fallback: false,
                };
            }
        }
        Resolution::Listing {
            directory,
            display_path,
        }
    }
}

impl PathResolver for SpaResolver {
    fn resolve(&self, target: &str) -> Result<Resolution, ClientRequestError> {
        let (raw_path, query) = split_query(target);
        if !raw_path.starts_with('/') {
            return Err(ClientRequestError::BadPath(target.to_string()));
        }

        let (path, redirect_prefix) = match strip_url_prefix(&self.config.url_prefix, raw_path) {
            Some(stripped) if self.config.url_prefix != "/" => {
                (stripped, self.config.url_prefix.as_str())
            }
            Some(stripped) => (stripped, ""),
            None if self.config.strict_prefix => {
                self.logger.debug(format_args!(
                    "Path {} is outside prefix {}",
                    raw_path, self.config.url_prefix
                ));
                return Ok(Resolution::NotFound);
            }
            // Outside the prefix: served as if no prefix were configured
            None => (raw_path, ""),
        };

        let decoded = decode_path(path)?;
        let Some(filesystem_path) =
            sanitize_path(&self.config.root_directory, &decoded, &self.logger)
        else {
            return Ok(Resolution::NotFound);
        };
        let resolved = ResolvedFile::probe(filesystem_path);
        let trailing_slash = decoded.ends_with('/');

        if resolved.is_directory {
            if !trailing_slash {
                let mut location = format!("{}{}/", redirect_prefix, path);
                if let Some(query) = query {
                    location.push('?');
                    location.push_str(query);
                }
                return Ok(Resolution::Redirect { location });
            }
            let display_path = decode_path(raw_path).unwrap_or_else(|_| raw_path.to_string());
            return Ok(self.resolve_directory(resolved, display_path));
        }

        // A trailing slash after a file name names nothing
        if resolved.is_file() && !trailing_slash {
            return Ok(Resolution::File {
                file: resolved,
                spa_fallback: false,
            });
        }

        Ok(self.fallback(&decoded))
    }
}
