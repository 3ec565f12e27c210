use clap::Parser;

pub const DEFAULT_PORT: u16 = 9877;

/// Real-time scene bridge between the authoring tool, the web editor and AI agents.
#[derive(Debug, Clone, Parser)]
#[command(name = "bridge-server", version)]
pub struct Config {
    /// Port to listen on.
    #[arg(short, long, env = "BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Port given as a bare argument. Takes precedence over `--port`.
    #[arg(value_name = "PORT")]
    port_arg: Option<u16>,

    /// Address to bind.
    #[arg(long, env = "BRIDGE_HOST", default_value = "0.0.0.0")]
    pub host: String,
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port_arg.unwrap_or(self.port)
    }
}
