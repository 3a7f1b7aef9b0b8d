// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

/// The `autosim` library provides the vehicle trip simulation engine.
///
/// The `sim` module contains the models that advance the vehicle state on
/// every tick: the trip simulator itself, the engine temperature model, the
/// fault injector deciding when a diagnostic trouble code is asserted and the
/// dead-reckoning GPS navigator. The `runtime` module drives these models
/// from a fixed-interval simulation clock and hands every reading to a
/// publisher on a separate task.
///
/// The `core` module holds the value objects shared by all crates in the
/// workspace, such as the `Reading` and `DiagnosticCode`. Readings can be
/// sent over any byte stream with the framing in the `protocol` module.
pub mod core;
pub mod net;
pub mod protocol;
pub mod sim;

#[macro_use]
extern crate log;

mod config;

pub use self::config::*;

pub use rand;

pub mod runtime;
pub use self::runtime::Error;
pub use self::runtime::Runtime;

/// Autosim runtime module containing various constants.
pub mod consts {
    /// Autosim runtime version.
    ///
    /// # Example
    ///
    /// ```
    /// use autosim::consts::VERSION;
    ///
    /// println!("Autosim runtime version: {}", VERSION);
    /// ```
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Autosim default network port for the reading collector.
    ///
    /// # Example
    ///
    /// ```
    /// use autosim::consts::DEFAULT_NETWORK_PORT;
    ///
    /// println!("Autosim default network port: {}", DEFAULT_NETWORK_PORT);
    /// ```
    pub const DEFAULT_NETWORK_PORT: u16 = 30_061;

    /// Autosim maximum number of simultaneous collector sessions.
    pub const NETWORK_MAX_CLIENTS: usize = 8;

    /// Autosim queue size for readings waiting to be published.
    ///
    /// # Remarks
    ///
    /// When the queue is full the simulation clock waits for the publisher
    /// before the next tick is computed. Readings are never dropped.
    pub const QUEUE_SIZE_READING: usize = 16;
}

/// Read a configuration file from disk.
///
/// The file is expected to be in TOML format. Any missing section falls back
/// to its default when the target type allows it.
pub fn from_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<std::path::Path>,
) -> std::io::Result<T> {
    let contents = std::fs::read_to_string(path)?;

    toml::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
