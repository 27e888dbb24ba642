use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use scriptgate_core::config::{parse_or, ConfigError, GatewayConfig};

/// Which front ends the binary starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Grpc,
    Both,
}

impl Transport {
    pub fn serves_http(self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }

    pub fn serves_grpc(self) -> bool {
        matches!(self, Self::Grpc | Self::Both)
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "grpc" => Ok(Self::Grpc),
            "both" => Ok(Self::Both),
            other => Err(format!("'{other}' is not one of http, grpc, both")),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
            Self::Both => "both",
        })
    }
}

/// Server configuration loaded from environment variables.
///
/// Listener settings live here; everything the execution pipeline needs is
/// in [`GatewayConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: IpAddr,
    /// HTTP bind port (default: `8000`).
    pub http_port: u16,
    /// gRPC bind port (default: `50051`).
    pub grpc_port: u16,
    /// Front ends to start (default: both).
    pub transport: Transport,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Execution pipeline settings.
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                           | Default    |
    /// |-----------------------------------|------------|
    /// | `SCRIPTGATE_HOST`                 | `0.0.0.0`  |
    /// | `SCRIPTGATE_HTTP_PORT`            | `8000`     |
    /// | `SCRIPTGATE_GRPC_PORT`            | `50051`    |
    /// | `SCRIPTGATE_TRANSPORT`            | `both`     |
    /// | `SCRIPTGATE_REQUEST_TIMEOUT_SECS` | `30`       |
    ///
    /// plus the gateway variables documented on [`GatewayConfig`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_or(&lookup, "SCRIPTGATE_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let http_port = parse_or(&lookup, "SCRIPTGATE_HTTP_PORT", 8000)?;
        let grpc_port = parse_or(&lookup, "SCRIPTGATE_GRPC_PORT", 50051)?;
        let transport = parse_or(&lookup, "SCRIPTGATE_TRANSPORT", Transport::Both)?;

        if transport == Transport::Both && http_port == grpc_port && http_port != 0 {
            return Err(ConfigError::Invalid {
                key: "SCRIPTGATE_GRPC_PORT",
                message: format!("port {grpc_port} is already used by HTTP"),
            });
        }

        let request_timeout_secs = parse_or(&lookup, "SCRIPTGATE_REQUEST_TIMEOUT_SECS", 30)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SCRIPTGATE_REQUEST_TIMEOUT_SECS",
                message: "must be greater than zero".into(),
            });
        }

        let gateway = GatewayConfig::from_lookup(lookup)?;

        Ok(Self {
            host,
            http_port,
            grpc_port,
            transport,
            request_timeout_secs,
            gateway,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.http_port)
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.grpc_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
