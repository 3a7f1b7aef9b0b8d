// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! Diagnostic trouble code sources.
//!
//! The `CodeCatalog` is the primary code source of a trip. Describers turn a
//! code into a human readable title for the log and never influence the
//! simulation.

mod catalog;
mod describe;

pub use self::catalog::CodeCatalog;
pub use self::describe::{info_url, ChainDescriber, CsvDescriber, HeuristicDescriber};

/// Base address of the code reference pages.
pub const INFO_BASE_URL: &str = "https://club.autodoc.se/obd-codes";
