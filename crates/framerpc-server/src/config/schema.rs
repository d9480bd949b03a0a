use serde::Deserialize;
use framerpc_core::error::{Result, RpcError};

use crate::dispatch::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_IN_FLIGHT};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub ops: Option<OpsSection>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RpcError::UnsupportedVersion);
        }
        self.server.validate()?;
        if let Some(ops) = &self.ops {
            if ops.listen == self.server.listen {
                return Err(RpcError::Config(
                    "ops.listen must differ from server.listen".into(),
                ));
            }
        }
        Ok(())
    }
}

/// How handler/decode errors are rendered on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFormat {
    /// The error's display string.
    #[default]
    Message,
    /// `{code, desc}` map with stable codes.
    Status,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default)]
    pub error_format: ErrorFormat,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_frame_bytes: default_max_frame_bytes(),
            max_in_flight: default_max_in_flight(),
            error_format: ErrorFormat::default(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1024..=64 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(RpcError::Config(
                "server.max_frame_bytes must be between 1024 and 67108864".into(),
            ));
        }
        if !(1..=65536).contains(&self.max_in_flight) {
            return Err(RpcError::Config(
                "server.max_in_flight must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:7070".into()
}
fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}
