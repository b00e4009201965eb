use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use anyhow::{Context, Result};
use crate::config::GeneralConfig;

/// Result of a background copy, handed back to the event loop.
#[derive(Debug)]
pub struct CopyOutcome {
    pub text: String,
    pub result: Result<()>,
}

/// Pipes `text` into the configured clipboard helper (`wl-copy` by default)
/// and waits for it to exit.
pub fn copy_to_clipboard(text: &str, config: &GeneralConfig) -> Result<()> {
    let parts: Vec<&str> = config.clipboard_command.split_whitespace().collect();
    let Some((program, args)) = parts.split_first() else {
        log::warn!("No clipboard command configured, not copying");
        return Ok(());
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawning clipboard command {:?}", program))?;

    // Dropping stdin closes the pipe so the helper sees EOF.
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        anyhow::bail!("clipboard command {:?} exited with {}", program, status);
    }

    log::debug!("Copied {} bytes with {:?}", text.len(), program);
    Ok(())
}

/// Runs `copy_to_clipboard` on a helper thread so a slow or long-lived
/// helper never stalls the caller; `on_done` receives the outcome.
pub fn copy_in_background<F>(text: String, config: &GeneralConfig, on_done: F)
where
    F: FnOnce(CopyOutcome) + Send + 'static,
{
    let config = config.clone();
    thread::spawn(move || {
        let result = copy_to_clipboard(&text, &config);
        on_done(CopyOutcome { text, result });
    });
}
