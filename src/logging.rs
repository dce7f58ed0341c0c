use anyhow::{Context, Result};
use env_logger::{Env, Target};
use std::{fs::OpenOptions, path::Path};

/// Route `log` output to a file. Writing to stderr would corrupt the
/// alternate screen, so the terminal is never a target.
pub fn init(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("initialising logger")?;

    log::info!("logging to {}", path.display());
    Ok(())
}
