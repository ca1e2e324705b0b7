//! Backend configuration and the command-line interface.
//!
//! Callers hand the factory an [`OptionBag`]: string keys mapped to string
//! or integer values. [`BackendConfig::resolve`] turns it into one typed
//! configuration struct per backend, eagerly:
//!
//! - unknown keys are ignored
//! - absent or blank keys take the default from the static table
//!   ([`options_for`])
//! - 0/1 flags holding any other value take the default
//! - a required option with no default (`path`, `uri`, `bucket`,
//!   `instance`) fails with a configuration error
//!
//! # Example
//!
//! ```
//! use raster_catalog::config::{BackendConfig, OptionBag};
//! use raster_catalog::BackendKind;
//!
//! let options = OptionBag::new().with("hosts", "cassandra-1,cassandra-2");
//! let config = BackendConfig::resolve(BackendKind::Cassandra, &options).unwrap();
//! match config {
//!     BackendConfig::Cassandra(c) => assert_eq!(c.local_dc, "datacenter1"),
//!     _ => unreachable!(),
//! }
//! ```

mod backends;
mod cli;
mod options;

pub use backends::*;
pub use cli::{BackendArgs, Cli, Command, LayerArgs, TileArgs};
pub use options::{OptionBag, OptionValue};
