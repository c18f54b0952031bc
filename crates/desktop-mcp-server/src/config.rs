//! Command line and environment configuration

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use clap::{Parser, ValueEnum};

/// How MCP messages reach the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Streamable HTTP on host:port
    Http,
    /// A single session over stdin/stdout
    Stdio,
}

#[derive(Parser, Debug)]
#[command(name = "desktop-mcp-server", version, about, long_about = None)]
pub struct Config {
    /// Transport to serve MCP over
    #[arg(long, value_enum, env = "DESKTOP_MCP_TRANSPORT", default_value = "http")]
    pub transport: Transport,

    /// Address to listen on (http transport)
    #[arg(long, env = "DESKTOP_MCP_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on (http transport)
    #[arg(long, env = "DESKTOP_MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["desktop-mcp-server"]).unwrap();
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.bind_address(), "127.0.0.1:8792");
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "desktop-mcp-server",
            "--transport",
            "stdio",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ])
        .unwrap();
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_rejects_unknown_transport() {
        assert!(Config::try_parse_from(["desktop-mcp-server", "--transport", "sse"]).is_err());
    }
}
