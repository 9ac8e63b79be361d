/// Connection factory
///
/// ```text
/// connect(options)
///  └─→ Connection::open ──→ ThriftClient ──→ SocketTransport ──→ host:port
///        └─→ Connection::catalog ──→ describe_keyspaces
/// ```
///
/// One [`Connection`] owns one socket for its whole life. Every catalog,
/// keyspace, column family and row handle holds a clone of it.
#[allow(clippy::module_inception)]
mod connection;
pub mod options;

pub use connection::Connection;
pub use options::{ConnectOptions, DEFAULT_HOST, DEFAULT_PORT};

use crate::{catalog::KeyspaceCatalog, util::Result};

/// Open a connection and return the catalog of keyspaces on the server.
pub fn connect(options: ConnectOptions) -> Result<KeyspaceCatalog> {
    Connection::open(options)?.catalog()
}

pub fn connect_to(host: &str, port: u16) -> Result<KeyspaceCatalog> {
    connect(ConnectOptions::new(host, port))
}

/// `localhost:9160` with default options.
pub fn connect_default() -> Result<KeyspaceCatalog> {
    connect(ConnectOptions::default())
}
