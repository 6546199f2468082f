#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ContentEncoding {
    Brotli,
    Gzip,
    Identity,
}

impl ContentEncoding {
    /// Value for the `Content-Encoding` header, if any.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            ContentEncoding::Brotli => Some("br"),
            ContentEncoding::Gzip => Some("gzip"),
            ContentEncoding::Identity => None,
        }
    }

    /// Suffix appended to a file name for its precompressed sibling.
    pub fn sibling_suffix(self) -> Option<&'static str> {
        match self {
            ContentEncoding::Brotli => Some(".br"),
            ContentEncoding::Gzip => Some(".gz"),
            ContentEncoding::Identity => None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct AcceptedEncodings {
    pub brotli: bool,
    pub gzip: bool,
}

impl AcceptedEncodings {
    pub fn any(self) -> bool {
        self.brotli || self.gzip
    }

    /// Accepted encodings in order of preference (brotli first).
    pub fn preferred(self) -> Vec<ContentEncoding> {
        let mut encodings = Vec::new();
        if self.brotli {
            encodings.push(ContentEncoding::Brotli);
        }
        if self.gzip {
            encodings.push(ContentEncoding::Gzip);
        }
        encodings
    }
}

pub fn determine_compression(accept_encoding: &str) -> AcceptedEncodings {
    let mut accepted = AcceptedEncodings::default();
    for item in accept_encoding.split(',') {
        let mut params = item.split(';').map(str::trim);
        let name = params.next().unwrap_or("").to_lowercase();
        // An explicit q=0 means "not acceptable"
        let refused = params
            .filter_map(|p| p.strip_prefix("q="))
            .any(|q| q.trim().parse::<f32>().map(|q| q <= 0.0).unwrap_or(false));
        if refused {
            continue;
        }
        match name.as_str() {
            "br" => accepted.brotli = true,
            "gzip" | "x-gzip" => accepted.gzip = true,
            "*" => {
                accepted.brotli = true;
                accepted.gzip = true;
            }
            _ => {}
        }
    }
    accepted
}
