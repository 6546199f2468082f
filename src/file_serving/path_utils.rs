use super::*;
use crate::compression::AcceptedEncodings;
use crate::error::ClientRequestError;
use std::ffi::OsString;

/// Forces a leading `/` and drops trailing slashes unless the prefix is root.
pub fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut prefix = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    while prefix.len() > 1 && prefix.ends_with('/') {
        prefix.pop();
    }
    prefix
}

/// Strips `prefix` from `path`. Returns `None` if the path lies outside it.
///
/// Matching is segment-aware: `/app` covers `/app` and `/app/x`, not `/apple`.
pub fn strip_url_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Splits a request target into its path and query, dropping any fragment.
pub fn split_query(target: &str) -> (&str, Option<&str>) {
    let without_fragment = target.split('#').next().unwrap_or(target);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

pub fn decode_path(path: &str) -> Result<String, ClientRequestError> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ClientRequestError::BadPath(path.to_string()))?;
    if decoded.contains('\0') {
        return Err(ClientRequestError::BadPath(path.to_string()));
    }
    Ok(decoded.into_owned())
}

/// Maps a decoded request path below `canonical_root`.
///
/// `.`, `..` and root components are discarded before joining, and the
/// joined path is canonicalized so symlinks cannot lead outside the root.
/// Returns `None` when the target escapes.
pub fn sanitize_path(canonical_root: &Path, decoded_path: &str, logger: &Logger) -> Option<PathBuf> {
    let cleaned_path = Path::new(decoded_path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();
    logger.debug(format_args!("Cleaned path: {}", cleaned_path.display()));

    let requested_path = canonical_root.join(&cleaned_path);

    match fs::canonicalize(&requested_path) {
        Ok(path) if path.starts_with(canonical_root) => Some(path),
        Ok(path) => {
            logger.warn(format_args!(
                "Path escapes base directory: {} -> {}",
                decoded_path,
                path.display()
            ));
            None
        }
        Err(e) => {
            // Nothing on disk there (or not reachable); the cleaned join
            // still cannot leave the root.
            logger.debug(format_args!(
                "Using non-canonicalized path {}: {}",
                requested_path.display(),
                e
            ));
            Some(requested_path)
        }
    }
}

/// Finds an existing `.br`/`.gz` sibling of `path` the client accepts.
pub fn find_precompressed(
    canonical_root: &Path,
    path: &Path,
    accepted: AcceptedEncodings,
    logger: &Logger,
) -> Option<PrecompressedFile> {
    if !accepted.any() {
        return None;
    }

    for encoding in accepted.preferred() {
        let Some(suffix) = encoding.sibling_suffix() else {
            continue;
        };
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        let candidate = PathBuf::from(name);
        logger.debug(format_args!("Checking compressed path: {}", candidate.display()));

        match fs::canonicalize(&candidate) {
            Ok(resolved) if resolved.starts_with(canonical_root) && resolved.is_file() => {
                return Some(PrecompressedFile {
                    path: resolved,
                    encoding,
                });
            }
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::ContentEncoding;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("gametest", "/gametest")]
    #[case("/gametest/", "/gametest")]
    #[case("/gametest", "/gametest")]
    #[case("a/b//", "/a/b")]
    #[case("/", "/")]
    #[case("", "/")]
    fn normalizes_prefix(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_url_prefix(raw), expected);
    }

    #[rstest]
    #[case("/", "/main.dart.js", Some("/main.dart.js"))]
    #[case("/gametest", "/gametest", Some("/"))]
    #[case("/gametest", "/gametest/", Some("/"))]
    #[case("/gametest", "/gametest/assets/a.png", Some("/assets/a.png"))]
    #[case("/gametest", "/gametester", None)]
    #[case("/gametest", "/other/index.html", None)]
    fn strips_prefix(#[case] prefix: &str, #[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(strip_url_prefix(prefix, path), expected);
    }

    #[test]
    fn splits_query_and_fragment() {
        assert_eq!(split_query("/a.js?v=1#top"), ("/a.js", Some("v=1")));
        assert_eq!(split_query("/route#frag"), ("/route", None));
        assert_eq!(split_query("/"), ("/", None));
    }

    #[test]
    fn decode_rejects_bad_encodings() {
        assert_eq!(decode_path("/a%20b.js").unwrap(), "/a b.js");
        assert!(decode_path("/%ff%fe").is_err());
        assert!(decode_path("/index.html%00.js").is_err());
    }

    #[test]
    fn sanitize_drops_parent_segments() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let logger = Logger::discard();

        let resolved = sanitize_path(&root, "/../../etc/passwd", &logger).unwrap();
        assert!(resolved.starts_with(&root));
        assert_eq!(resolved, root.join("etc/passwd"));
    }

    #[cfg(unix)]
    #[test]
    fn sanitize_denies_symlink_escape() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();

        assert_eq!(sanitize_path(&root, "/link/secret.txt", &Logger::discard()), None);
    }

    #[test]
    fn finds_preferred_sibling() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let file = root.join("app.js");
        fs::write(&file, "console.log(1)").unwrap();
        fs::write(root.join("app.js.gz"), "gz").unwrap();
        fs::write(root.join("app.js.br"), "br").unwrap();
        let logger = Logger::discard();

        let both = AcceptedEncodings { brotli: true, gzip: true };
        let found = find_precompressed(&root, &file, both, &logger).unwrap();
        assert_eq!(found.encoding, ContentEncoding::Brotli);
        assert_eq!(found.path, root.join("app.js.br"));

        let gzip_only = AcceptedEncodings { brotli: false, gzip: true };
        let found = find_precompressed(&root, &file, gzip_only, &logger).unwrap();
        assert_eq!(found.encoding, ContentEncoding::Gzip);

        assert!(find_precompressed(&root, &file, AcceptedEncodings::default(), &logger).is_none());
    }
}
