use clap::Parser;
use std::path::PathBuf;

/// Serve a directory (default: build/web) with SPA fallback
#[derive(Parser, Debug, Clone)]
#[command(author, version, long_about = None)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(long, default_value = "build/web")]
    pub dir: PathBuf,

    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Open the default browser after the server starts
    #[arg(long)]
    pub open: bool,

    /// URL prefix to strip before looking up files (e.g. /gametest)
    #[arg(long, default_value = "/")]
    pub url_prefix: String,

    /// Answer 404 for requests outside the URL prefix instead of serving them unchanged
    #[arg(long)]
    pub strict_prefix: bool,

    /// Serve existing .br/.gz siblings to clients that accept them
    #[arg(long)]
    pub precompressed: bool,
}

/// Precompress files in a directory for production serving
#[derive(Parser, Debug, Clone)]
#[command(author, version, long_about = None)]
pub struct PrecompressArgs {
    /// Build output directory to compress in place
    pub directory: PathBuf,

    /// Skip brotli output even when brotli support is compiled in
    #[arg(long)]
    pub no_brotli: bool,
}
