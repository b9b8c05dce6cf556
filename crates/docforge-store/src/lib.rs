// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docforge-store: everything that touches the output directory.
//
// Artifacts are written atomically (temporary file, fsync, rename), the
// optional relational export is built into a temporary SQLite file and moved
// into place the same way, and the manifest records a SHA-256 per artifact.

pub mod database;
pub mod manifest;
pub mod writer;

pub use database::{DatabaseExport, DatabaseSpec, TableCount};
pub use manifest::{Manifest, ManifestEntry, hash_bytes, verify_hash};
pub use writer::OutputWriter;
