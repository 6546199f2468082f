use std::process::{Command, Stdio};
use std::thread;

use crate::logging::Logger;

/// Platform command that opens `url` in the default browser.
pub fn opener_command(url: &str) -> Command {
    #[cfg(target_os = "windows")]
    let command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(url);
        command
    };
    #[cfg(target_os = "macos")]
    let command = {
        let mut command = Command::new("open");
        command.arg(url);
        command
    };
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let command = {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    };
    command
}

/// Best effort; a missing opener is only a warning.
pub fn open_browser(url: &str, logger: &Logger) {
    let spawned = opener_command(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(mut child) => {
            logger.debug(format_args!("Opening browser at {}", url));
            // Reap the opener once it exits
            thread::spawn(move || child.wait());
        }
        Err(e) => logger.warn(format_args!("Failed to open browser: {}", e)),
    }
}
