use std::path::Path;

use super::{CompressionEntry, PassReport};

pub const SERVE_GUIDANCE: &str = "Done. To serve precompressed files, configure your web server \
(nginx/Apache) to prefer .br/.gz responses via Accept-Encoding negotiation.";

/// Base-1024 size with one decimal, e.g. `12.3KB`.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}TB", size)
}

pub fn header(root: &Path, brotli_available: bool) -> String {
    format!(
        "Precompressing files in {}\nBrotli available: {}",
        root.display(),
        if brotli_available { "yes" } else { "no" }
    )
}

pub fn format_entry(entry: &CompressionEntry) -> String {
    let mut row = format!(
        "{:60}  {:>8}  gz: {:>8}",
        entry.relative_path.display().to_string(),
        human_size(entry.original_size),
        human_size(entry.gzip_size)
    );
    if let Some(brotli_size) = entry.brotli_size {
        row.push_str(&format!("  br: {:>8}", human_size(brotli_size)));
    }
    row
}

pub fn summary(report: &PassReport) -> String {
    let count = report.entries.len();
    format!(
        "\nCompressed {} file{}.\n{}",
        count,
        if count == 1 { "" } else { "s" },
        SERVE_GUIDANCE
    )
}

/// Full human-readable report.
pub fn render(report: &PassReport) -> String {
    let mut out = header(&report.root, report.brotli_available);
    out.push('\n');
    for entry in &report.entries {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    out.push_str(&summary(report));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case(0, "0.0B")]
    #[case(1023, "1023.0B")]
    #[case(1024, "1.0KB")]
    #[case(1536, "1.5KB")]
    #[case(5 * 1024 * 1024, "5.0MB")]
    #[case(3 * 1024 * 1024 * 1024, "3.0GB")]
    #[case(2 * 1024 * 1024 * 1024 * 1024, "2.0TB")]
    fn formats_sizes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(human_size(bytes), expected);
    }

    fn entry(path: &str, brotli_size: Option<u64>) -> CompressionEntry {
        CompressionEntry {
            relative_path: PathBuf::from(path),
            original_size: 2048,
            gzip_size: 512,
            brotli_size,
        }
    }

    #[test]
    fn rows_include_brotli_only_when_present() {
        let with_br = format_entry(&entry("main.dart.js", Some(400)));
        assert!(with_br.starts_with("main.dart.js "));
        assert!(with_br.ends_with("     2.0KB  gz:   512.0B  br:   400.0B"));

        let without_br = format_entry(&entry("main.dart.js", None));
        assert!(!without_br.contains("br:"));
    }

    #[test]
    fn render_lists_every_entry_and_guidance() {
        let report = PassReport {
            root: PathBuf::from("build/web"),
            brotli_available: false,
            entries: vec![entry("index.html", None), entry("main.dart.js", None)],
        };

        let text = render(&report);
        assert!(text.starts_with("Precompressing files in build/web\nBrotli available: no\n"));
        assert!(text.contains("index.html"));
        assert!(text.contains("Compressed 2 files."));
        assert!(text.ends_with(SERVE_GUIDANCE));
    }
}
