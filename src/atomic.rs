//! Crash-safe file commits.
//!
//! Content is written to a temp file next to the target, flushed and synced,
//! given the target's permissions, then renamed over the target. Until the
//! rename succeeds the original file is untouched; on any earlier failure the
//! temp file is removed.

use crate::error::{RepforError, Result};
use crate::transform::LineEnding;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

const TEMP_PREFIX: &str = ".repfor-";
const TEMP_SUFFIX: &str = ".tmp";

/// Content to commit.
#[derive(Debug, Clone, Copy)]
pub enum WriteContent<'a> {
    /// Lines without terminators, joined with `ending`.
    Lines {
        lines: &'a [Vec<u8>],
        ending: LineEnding,
        trailing_newline: bool,
    },
    /// Raw bytes written as-is.
    Bytes(&'a [u8]),
}

impl WriteContent<'_> {
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        match *self {
            WriteContent::Lines {
                lines,
                ending,
                trailing_newline,
            } => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.write_all(ending.as_bytes())?;
                    }
                    out.write_all(line)?;
                }
                if trailing_newline && !lines.is_empty() {
                    out.write_all(ending.as_bytes())?;
                }
                Ok(())
            }
            WriteContent::Bytes(bytes) => out.write_all(bytes),
        }
    }

    /// Renders the content into one buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }
}

/// Resolves symlinks to the file that will actually be replaced.
///
/// A path that does not exist yet is used as given.
pub fn resolve_target(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(e.into()),
    }
}

/// Atomically replaces the file at `path` (or its symlink target).
pub fn write_atomic(path: &Path, content: WriteContent<'_>) -> Result<()> {
    let target = resolve_target(path)?;
    commit(&target, |out| content.write_to(out))
}

/// Writes through a temp file in the target's directory and renames it into
/// place. `target` must already be resolved.
pub(crate) fn commit<F>(target: &Path, write_body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let permissions = target_permissions(target)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_err = |source| RepforError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(write_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_body(&mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Some(permissions) = permissions {
        fs::set_permissions(tmp.path(), permissions).map_err(write_err)?;
    }

    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Returns the permissions the committed file must carry.
///
/// Existing files keep theirs and must be owner-writable; new files get
/// 0644 on Unix.
fn target_permissions(target: &Path) -> Result<Option<fs::Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => {
            let permissions = meta.permissions();
            if !owner_writable(&permissions) {
                return Err(RepforError::ReadOnly(target.to_path_buf()));
            }
            Ok(Some(permissions))
        }
        Err(_) => Ok(default_permissions()),
    }
}

#[cfg(unix)]
fn owner_writable(permissions: &fs::Permissions) -> bool {
    use std::os::unix::fs::PermissionsExt;
    permissions.mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn owner_writable(permissions: &fs::Permissions) -> bool {
    !permissions.readonly()
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
