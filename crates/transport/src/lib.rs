#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
pub mod callback;
pub mod connections;
pub mod core;
pub mod error;
pub mod pool;

pub use crate::connections::TcpConnection;
pub use crate::connections::TcpTransport;
pub use crate::connections::TransportConfig;
