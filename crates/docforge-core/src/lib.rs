// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docforge-core: core types, corpus loading, configuration and error definitions
// shared across all crates.

pub mod config;
pub mod corpus;
pub mod error;
pub mod types;

pub use config::{GenerateConfig, ParamRange, ScanConfig};
pub use corpus::Corpus;
pub use error::{DocforgeError, DocumentFailure, ErrorClass};
pub use types::*;
