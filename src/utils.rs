use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use path_absolutize::Absolutize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type DynResult<T> = anyhow::Result<T>;

pub const LOG_ENV: &str = "DEFINITION_WRITER_LOG";

/// Installs a stderr subscriber unless the host already has one.
pub fn init_logger() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("definition_writer=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Best-effort absolute form of `path` for log lines. Falls back to the
/// path as given.
pub fn display_path(path: &Path) -> Cow<'_, Path> {
    path.absolutize().unwrap_or(Cow::Borrowed(path))
}

#[cfg(unix)]
pub fn path_from_bytes(bytes: &[u8]) -> DynResult<PathBuf> {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
pub fn path_from_bytes(bytes: &[u8]) -> DynResult<PathBuf> {
    use anyhow::Context;

    let path = std::str::from_utf8(bytes).context("destination path is not valid UTF-8")?;
    Ok(PathBuf::from(path))
}
