//! Type-state builder for opening a [`Connection`]: pick a transport
//! (`with_tcp`/`with_unix`), optionally tune the connection, then `build()`.
//! The marker-type states exist so `.build()` only appears once a transport
//! has actually been chosen.

use std::marker::PhantomData;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::transport::Stream;
use crate::{Error, Result};

/// Initial builder state: no transport chosen yet.
pub struct Init;
/// A TCP address has been chosen.
pub struct Tcp;
/// A UNIX-domain socket path has been chosen.
#[cfg(unix)]
pub struct Unix;

enum Target {
    Tcp(SocketAddr),
    #[cfg(unix)]
    Unix(PathBuf),
}

/// Builds a [`Connection`] over TCP or a UNIX-domain socket.
pub struct ConnectionBuilder<State = Init> {
    target: Option<Target>,
    config: ConnectionConfig,
    _marker: PhantomData<State>,
}

impl Default for ConnectionBuilder<Init> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionBuilder<Init> {
    pub fn new() -> Self {
        Self {
            target: None,
            config: ConnectionConfig::default(),
            _marker: PhantomData,
        }
    }

    /// Resolves `addr` (e.g. `"127.0.0.1:6379"`) and moves to the TCP state.
    pub fn with_tcp(self, addr: impl AsRef<str>) -> Result<ConnectionBuilder<Tcp>> {
        let resolved = addr
            .as_ref()
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("invalid address {:?}: {e}", addr.as_ref())))?
            .next()
            .ok_or_else(|| Error::Config(format!("no address resolved for {:?}", addr.as_ref())))?;
        Ok(ConnectionBuilder {
            target: Some(Target::Tcp(resolved)),
            config: self.config,
            _marker: PhantomData,
        })
    }

    #[cfg(unix)]
    pub fn with_unix(self, path: impl AsRef<Path>) -> ConnectionBuilder<Unix> {
        ConnectionBuilder {
            target: Some(Target::Unix(path.as_ref().to_path_buf())),
            config: self.config,
            _marker: PhantomData,
        }
    }
}

macro_rules! impl_shared_tuning {
    ($state:ty) => {
        impl ConnectionBuilder<$state> {
            /// Sets the `AUTH` password sent immediately after connecting.
            pub fn password(mut self, password: impl Into<String>) -> Self {
                self.config.password = Some(password.into());
                self
            }

            /// Sets the logical database selected via `SELECT` after connecting.
            pub fn database(mut self, index: i64) -> Self {
                self.config.database = Some(index);
                self
            }

            /// Toggles `TCP_NODELAY`. No-op for UNIX-domain sockets.
            pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
                self.config.tcp_nodelay = enabled;
                self
            }

            /// Sets the initial capacity of the outgoing write buffer.
            pub fn write_buffer_size(mut self, bytes: usize) -> Self {
                self.config.write_buffer_size = bytes;
                self
            }

            /// Sets the TCP connect timeout. No-op for UNIX-domain sockets.
            pub fn connect_timeout(mut self, timeout: Duration) -> Self {
                self.config.connect_timeout = timeout;
                self
            }
        }
    };
}

impl_shared_tuning!(Tcp);
#[cfg(unix)]
impl_shared_tuning!(Unix);

impl ConnectionBuilder<Tcp> {
    /// Connects and returns the established [`Connection`].
    pub fn build(self) -> Result<Connection> {
        let Some(Target::Tcp(addr)) = self.target else {
            unreachable!("ConnectionBuilder<Tcp> always carries a Target::Tcp")
        };
        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout)?;
        stream.set_nodelay(self.config.tcp_nodelay)?;
        finish(Stream::Tcp(stream), self.config)
    }
}

#[cfg(unix)]
impl ConnectionBuilder<Unix> {
    /// Connects and returns the established [`Connection`].
    pub fn build(self) -> Result<Connection> {
        let Some(Target::Unix(path)) = self.target else {
            unreachable!("ConnectionBuilder<Unix> always carries a Target::Unix")
        };
        let stream = UnixStream::connect(&path)?;
        finish(Stream::Unix(stream), self.config)
    }
}

fn finish(stream: Stream, config: ConnectionConfig) -> Result<Connection> {
    let conn = Connection::with_write_buffer_size(stream, config.write_buffer_size)?;
    if let Some(password) = &config.password {
        conn.auth(password).result()?;
    }
    if let Some(index) = config.database {
        conn.select(index).result()?;
    }
    Ok(conn)
}
