use std::{fs::OpenOptions, io::Write, path::Path};

use anyhow::Context;

use crate::{
    record::DefinitionRecord,
    utils::{display_path, DynResult},
};

/// Result code handed back across the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Failed = 1,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<DynResult<()>> for Status {
    fn from(result: DynResult<()>) -> Self {
        match result {
            Ok(()) => Status::Ok,
            Err(err) => {
                tracing::error!("definition write failed: {err:#}");
                Status::Failed
            }
        }
    }
}

/// Writes the payload carried by `raw` to `path`, creating or truncating it.
pub fn write_definition(raw: impl AsRef<[u8]>, path: impl AsRef<Path>) -> DynResult<()> {
    let path = path.as_ref();
    let record = DefinitionRecord::from_raw(raw);

    tracing::debug!(
        "writing {} bytes of definition to {}",
        record.len(),
        display_path(path).display()
    );

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(record.payload())
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    tracing::info!(
        "wrote {} bytes of definition to {}",
        record.len(),
        display_path(path).display()
    );
    Ok(())
}

pub fn write(raw: impl AsRef<[u8]>, path: impl AsRef<Path>) -> Status {
    write_definition(raw, path).into()
}
