//! chordnet-node
//! ===============
//! Process side of a chordnet ring member.
//!
//! - [config] reads and writes the YAML config file of the node.
//! - [logging] sets up `tracing` output and the panic hook.
//! - [console] parses the interactive commands accepted by `chordnet run`.
//! - [prelude] re-exports the core types a node needs.

pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod util;

