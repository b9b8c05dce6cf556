// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output writer: all-or-nothing file creation in the output directory.
//
// Bytes go to a temporary file in the destination directory, are flushed to
// disk and only then renamed over the final path. A crash or a full disk
// leaves the previous file (or no file) at the target, never a truncated one.

use std::io::Write;
use std::path::{Path, PathBuf};

use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::Artifact;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

const TEMP_PREFIX: &str = ".docforge-";
const TEMP_SUFFIX: &str = ".tmp";

/// Writes artifacts into one destination directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path an artifact with this file name ends up at.
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Persist a rendered artifact as `<id>.<ext>`, replacing any previous
    /// file of that name.
    #[instrument(skip_all, fields(id = %artifact.document_id, bytes_len = artifact.bytes.len()))]
    pub fn write(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.write_bytes(&artifact.file_name(), &artifact.bytes)?;
        info!(path = %path.display(), kind = %artifact.kind, "artifact written");
        Ok(path)
    }

    /// Atomically write `bytes` to `file_name` inside the output directory.
    pub fn write_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.persist_with(file_name, |temp_path| {
            let mut file = std::fs::OpenOptions::new().write(true).open(temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            Ok(())
        })
    }

    /// Let `fill` produce the file at a temporary path, then move it into
    /// place. Nothing reaches the final path if `fill` fails.
    ///
    /// Used directly by the database export, where SQLite needs a real path
    /// to build the file in.
    pub fn persist_with<F>(&self, file_name: &str, fill: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let target = self.target_path(file_name);
        check_file_name(file_name, &target)?;

        std::fs::create_dir_all(&self.dir).map_err(|err| write_err(&self.dir, err))?;
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|err| write_err(&target, err))?;
        debug!(temp = %temp.path().display(), target = %target.display(), "temporary file created");

        // The temporary file is removed on drop if `fill` fails.
        fill(temp.path()).map_err(|err| match err {
            DocforgeError::Io(source) => write_err(&target, source),
            other => other,
        })?;
        persist(temp, &target)?;
        Ok(target)
    }
}

fn persist(temp: NamedTempFile, target: &Path) -> Result<()> {
    let file = temp.persist(target).map_err(|err| write_err(target, err.error))?;
    file.sync_all().map_err(|err| write_err(target, err))
}

fn check_file_name(file_name: &str, target: &Path) -> Result<()> {
    let plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(write_err(
            target,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{file_name:?} is not a plain file name"),
            ),
        ))
    }
}

fn write_err(path: &Path, source: std::io::Error) -> DocforgeError {
    DocforgeError::Write {
        path: path.to_path_buf(),
        source,
    }
}
