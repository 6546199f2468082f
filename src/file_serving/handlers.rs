use std::io::{self, BufRead, Read};
use std::net::TcpStream;
use std::sync::Arc;

use mime_guess::from_path;

use super::listing::render_listing;
use super::path_utils::find_precompressed;
use super::response::{reason_phrase, HttpResponse};
use super::*;
use crate::compression::determine_compression;

const MAX_HEADERS: usize = 100;

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: u64 = 8 * 1024;

/// Request line and headers of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub line: String,
    pub headers: Vec<(String, String)>,
}

impl RawRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn head_too_large() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, ClientRequestError::HeadTooLarge)
}

fn read_line_lossy<R: BufRead>(
    reader: &mut io::Take<R>,
    buf: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    buf.clear();
    let read = reader.read_until(b'\n', buf)?;
    if reader.limit() == 0 && !buf.ends_with(b"\n") {
        return Err(head_too_large());
    }
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).trim_end().to_string()))
}

/// Reads the request head, at most [`MAX_HEAD_BYTES`] of it. `None` if the
/// peer closed without sending anything.
pub fn read_request<R: BufRead>(reader: &mut R) -> io::Result<Option<RawRequest>> {
    let mut limited = reader.by_ref().take(MAX_HEAD_BYTES);
    let mut buf = Vec::new();
    let Some(line) = read_line_lossy(&mut limited, &mut buf)? else {
        return Ok(None);
    };

    let mut headers = Vec::new();
    while let Some(header_line) = read_line_lossy(&mut limited, &mut buf)? {
        if header_line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(head_too_large());
        }
        if let Some((key, value)) = header_line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok(Some(RawRequest { line, headers }))
}

/// Splits `METHOD target [HTTP/x.y]`.
pub fn parse_request_line(line: &str) -> Result<(&str, &str), ClientRequestError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [method, target] => Ok((*method, *target)),
        [method, target, version] if version.starts_with("HTTP/") => Ok((*method, *target)),
        _ => Err(ClientRequestError::MalformedRequest(line.to_string())),
    }
}

/// Turns resolutions into responses. Shared read-only by all workers.
pub struct FileHandler {
    resolver: Arc<dyn PathResolver>,
    precompressed_root: Option<PathBuf>,
    logger: Logger,
}

impl FileHandler {
    pub fn new(resolver: Arc<dyn PathResolver>, logger: Logger) -> Self {
        Self {
            resolver,
            precompressed_root: None,
            logger,
        }
    }

    /// Serve `.br`/`.gz` siblings found under `canonical_root`.
    pub fn with_precompressed(mut self, canonical_root: PathBuf) -> Self {
        self.precompressed_root = Some(canonical_root);
        self
    }

    pub fn respond(&self, method: &str, target: &str, accept_encoding: &str) -> HttpResponse {
        if method != "GET" && method != "HEAD" {
            return HttpResponse::error(ClientRequestError::UnsupportedMethod(method.into()).status());
        }

        let resolution = match self.resolver.resolve(target) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.logger.warn(format_args!("Rejected {}: {}", target, e));
                return HttpResponse::error(e.status());
            }
        };

        match resolution {
            Resolution::File { file, .. } => self.serve_file(&file.filesystem_path, accept_encoding),
            Resolution::Redirect { location } => {
                HttpResponse::new(301, "text/plain; charset=utf-8", reason_phrase(301).into())
                    .with_header("Location", location)
            }
            Resolution::Listing {
                directory,
                display_path,
            } => match render_listing(&directory.filesystem_path, &display_path) {
                Ok(html) => HttpResponse::new(200, "text/html; charset=utf-8", html.into_bytes()),
                Err(e) => {
                    self.logger.warn(format_args!(
                        "No permission to list directory {}: {}",
                        directory.filesystem_path.display(),
                        e
                    ));
                    HttpResponse::error(404)
                }
            },
            Resolution::NotFound => HttpResponse::error(404),
        }
    }

    fn serve_file(&self, path: &Path, accept_encoding: &str) -> HttpResponse {
        let mime_type = from_path(path).first_or_octet_stream().to_string();

        if let Some(root) = &self.precompressed_root {
            let accepted = determine_compression(accept_encoding);
            if let Some(precompressed) = find_precompressed(root, path, accepted, &self.logger) {
                match fs::read(&precompressed.path) {
                    Ok(content) => {
                        self.logger.debug(format_args!(
                            "Using pre-compressed file: {} ({:?})",
                            precompressed.path.display(),
                            precompressed.encoding
                        ));
                        let mut response = HttpResponse::new(200, &mime_type, content)
                            .with_header("Vary", "Accept-Encoding");
                        if let Some(value) = precompressed.encoding.header_value() {
                            response = response.with_header("Content-Encoding", value);
                        }
                        return response;
                    }
                    Err(e) => self.logger.warn(format_args!(
                        "Failed to read {}: {}",
                        precompressed.path.display(),
                        e
                    )),
                }
            }
        }

        match fs::read(path) {
            Ok(content) => {
                let response = HttpResponse::new(200, &mime_type, content);
                if self.precompressed_root.is_some() {
                    response.with_header("Vary", "Accept-Encoding")
                } else {
                    response
                }
            }
            Err(e) => {
                self.logger
                    .warn(format_args!("Failed to read {}: {}", path.display(), e));
                HttpResponse::error(404)
            }
        }
    }

    /// Answers one request on `client` and logs it.
    pub fn handle_connection(&self, client: &TcpStream, peer: &str) -> io::Result<()> {
        let mut reader = io::BufReader::new(client);
        let request = match read_request(&mut reader) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                self.logger.warn(format_args!("{}: {}", peer, e));
                self.logger.info(format_args!("{} - \"<oversized head>\" 400", peer));
                let mut writer = client;
                return HttpResponse::error(400).write_to(&mut writer, false);
            }
            Err(e) => return Err(e),
        };
        self.logger
            .debug(format_args!("{} headers: {:?}", peer, request.headers));

        let (response, head_only) = match parse_request_line(&request.line) {
            Ok((method, target)) => (
                self.respond(method, target, request.header("accept-encoding").unwrap_or("")),
                method == "HEAD",
            ),
            Err(e) => {
                self.logger.warn(format_args!("{}: {}", peer, e));
                (HttpResponse::error(e.status()), false)
            }
        };

        self.logger.info(format_args!(
            "{} - \"{}\" {}",
            peer, request.line, response.status
        ));

        let mut writer = client;
        response.write_to(&mut writer, head_only)
    }
}
