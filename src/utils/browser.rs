//! Opening the served site in the system browser.

use anyhow::{Result, bail};
use std::process::{Command, Stdio};

/// Launcher commands to try, first match wins.
#[cfg(target_os = "macos")]
const LAUNCHERS: &[(&str, &[&str])] = &[("open", &[])];
#[cfg(target_os = "windows")]
const LAUNCHERS: &[(&str, &[&str])] = &[("cmd", &["/C", "start", ""])];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const LAUNCHERS: &[(&str, &[&str])] = &[("xdg-open", &[]), ("gio", &["open"]), ("sensible-browser", &[])];

/// Spawn the browser on `url` without waiting for it.
pub fn open(url: &str) -> Result<()> {
    let Some((program, args)) = LAUNCHERS
        .iter()
        .find(|(program, _)| which::which(program).is_ok())
    else {
        bail!("no browser launcher found");
    };

    Command::new(program)
        .args(*args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
