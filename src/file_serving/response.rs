use std::io::{self, Write};

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body,
        }
    }

    /// Plain-text response whose body is the reason phrase.
    pub fn error(status: u16) -> Self {
        Self::new(
            status,
            "text/plain; charset=utf-8",
            reason_phrase(status).as_bytes().to_vec(),
        )
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Writes status line, headers and, unless `head_only`, the body.
    pub fn write_to<W: Write>(&self, out: &mut W, head_only: bool) -> io::Result<()> {
        write!(out, "HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status))?;
        for (key, value) in &self.headers {
            write!(out, "{}: {}\r\n", key, value)?;
        }
        out.write_all(b"X-Content-Type-Options: nosniff\r\n")?;
        write!(out, "Content-Length: {}\r\n", self.body.len())?;
        out.write_all(b"Connection: close\r\n")?;
        out.write_all(b"\r\n")?;
        if !head_only {
            out.write_all(&self.body)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_full_response() {
        let response = HttpResponse::new(200, "text/javascript", b"main()".to_vec())
            .with_header("Vary", "Accept-Encoding");
        let mut out = Vec::new();
        response.write_to(&mut out, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/javascript\r\n"));
        assert!(text.contains("Vary: Accept-Encoding\r\n"));
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.ends_with("\r\n\r\nmain()"));
    }

    #[test]
    fn head_only_omits_body_but_keeps_length() {
        let mut out = Vec::new();
        HttpResponse::error(404).write_to(&mut out, true).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse::error(400).with_header("Location", "/docs/");
        assert_eq!(response.header("location"), Some("/docs/"));
        assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));
    }
}
