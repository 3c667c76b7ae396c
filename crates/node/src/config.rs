//! YAML config file of a node.
use std::fs;
use std::io;
use std::net::SocketAddr;

use chordnet_core::config::ProtocolConfig;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::logging::LogLevel;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

pub const DEFAULT_CONFIG_PATH: &str = "~/.chordnet/config.yaml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:50000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub bind_addr: String,
    /// Endpoint announced to other nodes, the bind address when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<String>,
    /// Any node of the ring to join. A new ring is created when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<String>,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            external_address: None,
            bootstrap: None,
            log_level: LogLevel::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|_| Error::InvalidAddress(addr.to_string()))
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        parse_addr(&self.bind_addr)
    }

    pub fn external_address(&self) -> Result<Option<SocketAddr>> {
        self.external_address.as_deref().map(parse_addr).transpose()
    }

    pub fn bootstrap(&self) -> Result<Option<SocketAddr>> {
        self.bootstrap.as_deref().map(parse_addr).transpose()
    }

    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self).map_err(|e| Error::EncodeError(e.to_string()))?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        serde_yaml::from_reader(f_rdr).map_err(|e| Error::DecodeError(e.to_string()))
    }
}
