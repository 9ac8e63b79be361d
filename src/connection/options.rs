use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    cassandra::types::ConsistencyLevel,
    thrift::{DEFAULT_MAX_FRAME_SIZE, SocketOptions},
    util::{Result, Status},
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9160;

/// Options for opening a [`crate::Connection`].
///
/// Every field has a default, so a JSON file only needs the keys it
/// changes:
///
/// ```json
/// { "host": "cass-1.internal", "framed": true, "read_timeout_ms": 2000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    /// Length-prefix every message (required by Cassandra 0.7 and later)
    pub framed: bool,
    /// Level every request is issued at
    pub consistency_level: ConsistencyLevel,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    /// Largest reply frame or value accepted from the server
    pub max_frame_size: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framed: false,
            consistency_level: ConsistencyLevel::One,
            connect_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE, // 16MB
        }
    }
}

impl ConnectOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ConnectOptions {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: ConnectOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Status::io_error(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Status::invalid_argument("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Status::invalid_argument("port must not be 0"));
        }
        if self.max_frame_size == 0 {
            return Err(Status::invalid_argument("max_frame_size must be positive"));
        }
        Ok(())
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions {
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
            write_timeout: self.write_timeout_ms.map(Duration::from_millis),
            framed: self.framed,
            max_frame_size: self.max_frame_size,
        }
    }
}
