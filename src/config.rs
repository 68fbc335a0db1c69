//! Small value types shared between the builder, the connection, and the
//! command surface: the `TYPE` reply mapping and the connection's tunables.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use derive_more::Display as DeriveDisplay;

pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_WRITE_BUFFER_SIZE: usize = 4096;

/// The key type reported by Redis's `TYPE` command.
///
/// An unrecognized status string decodes to `None` rather than a protocol
/// error, the same permissive fallback the implementation this mapping
/// traces back to used for any `type` string it didn't recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveDisplay)]
pub enum RedisType {
    #[display("none")]
    None,
    #[display("string")]
    String,
    #[display("list")]
    List,
    #[display("set")]
    Set,
    #[display("zset")]
    ZSet,
    #[display("hash")]
    Hash,
}

impl FromStr for RedisType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "string" => RedisType::String,
            "list" => RedisType::List,
            "set" => RedisType::Set,
            "zset" => RedisType::ZSet,
            "hash" => RedisType::Hash,
            _ => RedisType::None,
        })
    }
}

/// Connection-time options gathered by [`crate::builder::ConnectionBuilder`]
/// before the socket is opened.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionConfig {
    pub(crate) password: Option<String>,
    pub(crate) database: Option<i64>,
    pub(crate) tcp_nodelay: bool,
    pub(crate) write_buffer_size: usize,
    pub(crate) connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            password: None,
            database: None,
            tcp_nodelay: true,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "database={:?} tcp_nodelay={} write_buffer_size={} connect_timeout={:?}",
            self.database, self.tcp_nodelay, self.write_buffer_size, self.connect_timeout
        )
    }
}
