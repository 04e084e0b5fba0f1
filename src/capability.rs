//! Optional transport capabilities, queried through the ports.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    WebSockets,
    ServerSentEvents,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::WebSockets => f.write_str("WebSockets"),
            Capability::ServerSentEvents => f.write_str("server-sent events"),
        }
    }
}
