use flate2::write::GzEncoder;
use flate2::Compression as GzipCompression;
use std::io::{self, Write};

/// Brotli sliding window, log2 of bytes.
pub const BROTLI_WINDOW: u32 = 22;

/// gzip with an empty header (no name, mtime 0), so equal input gives equal output.
pub fn encode_gzip(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), GzipCompression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(feature = "brotli")]
pub fn encode_brotli(data: &[u8], quality: u32) -> io::Result<Vec<u8>> {
    let mut compressed = Vec::new();
    {
        let mut compressor =
            brotli::CompressorWriter::new(&mut compressed, 4096, quality, BROTLI_WINDOW);
        compressor.write_all(data)?;
        compressor.flush()?;
        // Dropping the writer finishes the stream
    }
    Ok(compressed)
}

#[cfg(not(feature = "brotli"))]
pub fn encode_brotli(_data: &[u8], _quality: u32) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "built without brotli support",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    const SAMPLE: &[u8] = b"function main() { return document.querySelector('body'); }\n";

    #[test]
    fn gzip_round_trips_and_is_deterministic() {
        let first = encode_gzip(SAMPLE, 9).unwrap();
        let second = encode_gzip(SAMPLE, 9).unwrap();
        assert_eq!(first, second);

        let mut decoded = Vec::new();
        GzDecoder::new(first.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn brotli_round_trips_and_is_deterministic() {
        let first = encode_brotli(SAMPLE, 11).unwrap();
        assert_eq!(first, encode_brotli(SAMPLE, 11).unwrap());

        let mut decoded = Vec::new();
        brotli::Decompressor::new(first.as_slice(), 4096)
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[cfg(not(feature = "brotli"))]
    #[test]
    fn brotli_is_unsupported_without_feature() {
        let err = encode_brotli(SAMPLE, 11).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn empty_input_still_produces_a_stream() {
        let gz = encode_gzip(b"", 9).unwrap();
        assert!(!gz.is_empty());
    }
}
