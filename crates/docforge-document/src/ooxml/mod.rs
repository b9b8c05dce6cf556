// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office Open XML renderers. Word-processing, spreadsheet and presentation
// packages built from quick-xml parts inside a zip container.

pub mod core_props;
pub mod docx;
pub mod package;
pub mod pptx;
pub mod xlsx;
pub mod xml;

pub use core_props::CoreProperties;
