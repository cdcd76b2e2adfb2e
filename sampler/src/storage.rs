use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{SamplerError, SamplerResult};

/// Prefix for run directories; runs land in `Logs/Rep1`, `Logs/Rep2`, ...
pub const DEFAULT_RUN_DIRECTORY_BASE: &str = "Logs/Rep";

/// Create and return the first unused `{base}{n}` directory, n starting at 1.
///
/// Existing directories are never reused, so an earlier run's log is never
/// overwritten.
pub fn allocate_run_directory(base: impl AsRef<Path>) -> SamplerResult<PathBuf> {
    let base = base.as_ref();
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
    }

    for n in 1u32.. {
        let mut name = OsString::from(base.as_os_str());
        name.push(n.to_string());
        let candidate = PathBuf::from(name);

        match fs::create_dir(&candidate) {
            Ok(()) => {
                info!("allocated run directory {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(SamplerError::io(candidate, e)),
        }
    }

    Err(SamplerError::io(
        base,
        std::io::Error::new(ErrorKind::Other, "run directory numbers exhausted"),
    ))
}
