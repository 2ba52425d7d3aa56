use std::time::Duration;

use clap::Parser;
use system::{tick_period, DEFAULT_TICK_RATE};

/// Command line and environment configuration of the whiteboard server.
#[derive(Debug, Clone, Parser)]
#[command(name = "whiteboard-server")]
#[command(about = "Real-time collaborative whiteboard over WebSocket")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "WHITEBOARD_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "WHITEBOARD_PORT", default_value_t = 3030)]
    pub port: u16,

    /// Broadcast ticks per second
    #[arg(
        long,
        env = "WHITEBOARD_TICK_RATE",
        default_value_t = DEFAULT_TICK_RATE,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    pub tick_rate: u32,

    /// Maximum simultaneous connections from one remote address
    #[arg(long, env = "WHITEBOARD_CONNECTION_LIMIT", default_value_t = 10)]
    pub connection_limit: usize,

    /// Outbound messages queued per connection before frames are dropped
    #[arg(long, env = "WHITEBOARD_OUTBOUND_BUFFER", default_value_t = 256)]
    pub outbound_buffer: usize,

    /// Keep sessions alive after their last player left
    #[arg(long, env = "WHITEBOARD_KEEP_EMPTY_SESSIONS")]
    pub keep_empty_sessions: bool,
}

impl Config {
    pub fn bind_address(&self) -> (String, u16) {
        (self.bind.clone(), self.port)
    }

    pub fn tick_period(&self) -> Duration {
        tick_period(self.tick_rate)
    }
}
