use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::args::ServeArgs;
use crate::browser::open_browser;
use crate::config::ServeConfig;
use crate::error::{Error, Result};
use crate::file_serving::handlers::FileHandler;
use crate::file_serving::spa::SpaResolver;
use crate::logging::Logger;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stops a running [`Server`] from any thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Accept loop handing each connection to its own thread.
pub struct Server {
    listener: TcpListener,
    handler: Arc<FileHandler>,
    logger: Logger,
    shutdown: ShutdownHandle,
}

impl Server {
    pub fn bind(addr: &str, handler: FileHandler, logger: Logger) -> Result<Self> {
        let bind_error = |source| Error::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_error)?;
        // Polled so the shutdown flag is seen without a pending connection
        listener.set_nonblocking(true).map_err(bind_error)?;

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            logger,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Binds `config.bind_addr()` with SPA resolution over `config`.
    pub fn from_config(config: Arc<ServeConfig>, logger: Logger) -> Result<Self> {
        let resolver = SpaResolver::new(Arc::clone(&config), logger.scoped("spadev::resolver"));
        let mut handler = FileHandler::new(Arc::new(resolver), logger.scoped("spadev::http"));
        if config.precompressed {
            handler = handler.with_precompressed(config.root_directory.clone());
        }
        Self::bind(&config.bind_addr(), handler, logger)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serves until the shutdown handle fires, then closes the listener.
    /// In-flight workers are left to finish on their own.
    pub fn run(self) {
        while !self.shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        self.logger
                            .warn(format_args!("Dropping connection from {}: {}", peer, e));
                        continue;
                    }
                    let handler = Arc::clone(&self.handler);
                    let logger = self.logger.clone();
                    thread::spawn(move || {
                        if let Err(e) = handler.handle_connection(&stream, &peer.to_string()) {
                            logger.warn(format_args!("Error handling connection from {}: {}", peer, e));
                        }
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.logger.warn(format_args!("Accept failed: {}", e));
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
        self.logger.info(format_args!("Shutting down server..."));
    }
}

/// URL a browser should use to reach the server.
pub fn served_url(addr: SocketAddr, url_prefix: &str) -> String {
    let host = match addr.ip() {
        ip if ip.is_unspecified() || ip.is_loopback() => "localhost".to_string(),
        IpAddr::V6(ip) => format!("[{}]", ip),
        IpAddr::V4(ip) => ip.to_string(),
    };
    let path = if url_prefix == "/" {
        "/".to_string()
    } else {
        format!("{}/", url_prefix)
    };
    format!("http://{}:{}{}", host, addr.port(), path)
}

/// Runs the dev server until interrupted.
pub fn start_server(args: ServeArgs, logger: Logger) -> Result<()> {
    let config = Arc::new(ServeConfig::from_args(&args)?);
    if !config.has_root_index() {
        logger.warn(format_args!(
            "index.html not found in {}. SPA apps usually require index.html",
            config.root_directory.display()
        ));
    }

    let server = Server::from_config(Arc::clone(&config), logger.clone())?;
    let local_addr = server
        .local_addr()
        .map_err(|source| Error::Bind {
            addr: config.bind_addr(),
            source,
        })?;
    let url = served_url(local_addr, &config.url_prefix);
    logger.info(format_args!(
        "Serving {} at {}",
        config.root_directory.display(),
        url
    ));
    if config.url_prefix != "/" {
        logger.info(format_args!("Stripping URL prefix {}", config.url_prefix));
    }

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || shutdown.trigger()) {
        logger.warn(format_args!("Failed to install interrupt handler: {}", e));
    }

    if config.auto_open_browser {
        open_browser(&url, &logger);
    }

    server.run();
    Ok(())
}
