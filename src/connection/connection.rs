use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::{
    catalog::KeyspaceCatalog,
    cassandra::{
        client::CassandraClient,
        thrift_client::ThriftClient,
        types::{
            ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, KeyspaceDescription,
            SlicePredicate,
        },
    },
    connection::ConnectOptions,
    statistics::Statistics,
    util::{Result, Status},
};

/// One physical connection, shared by every handle derived from it.
///
/// Cloning is a reference count bump. The client sits behind a mutex, so
/// handles may move between threads; concurrent callers are serialized one
/// request at a time over the single socket.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    /// `None` once closed
    client: Mutex<Option<Box<dyn CassandraClient>>>,
    options: ConnectOptions,
    statistics: Statistics,
}

impl Connection {
    /// Open a Thrift connection to `options.host:options.port`.
    pub fn open(options: ConnectOptions) -> Result<Self> {
        options.validate()?;

        let client = match ThriftClient::connect(
            &options.host,
            options.port,
            &options.socket_options(),
        ) {
            Ok(client) => client,
            Err(err) => {
                error!(endpoint = %options.endpoint(), %err, "Thrift: failed to open transport");
                return Err(err);
            }
        };

        info!(endpoint = %options.endpoint(), framed = options.framed, "connected");
        Ok(Connection::with_client(client, options))
    }

    /// Bind an already constructed client, e.g. a
    /// [`crate::cassandra::MemoryCluster`].
    pub fn with_client<C: CassandraClient + 'static>(client: C, options: ConnectOptions) -> Self {
        Connection {
            inner: Arc::new(Inner {
                client: Mutex::new(Some(Box::new(client))),
                options,
                statistics: Statistics::new(),
            }),
        }
    }

    /// Fetch the keyspace list and wrap it with this connection.
    pub fn catalog(&self) -> Result<KeyspaceCatalog> {
        KeyspaceCatalog::load(self.clone())
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.inner.options
    }

    pub fn consistency_level(&self) -> ConsistencyLevel {
        self.inner.options.consistency_level
    }

    pub fn statistics(&self) -> &Statistics {
        &self.inner.statistics
    }

    /// Drop the client and its socket. Every handle sharing this
    /// connection fails with `IOError` afterwards.
    ///
    /// Also happens on its own when a call fails with `IOError` or
    /// `Corruption`, since the stream position is then unknown.
    pub fn close(&self) {
        if self.inner.client.lock().take().is_some() {
            info!(endpoint = %self.inner.options.endpoint(), "connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.client.lock().is_none()
    }

    /// Run one RPC with exclusive access to the client.
    fn with_client_locked<T>(
        &self,
        method: &'static str,
        f: impl FnOnce(&mut dyn CassandraClient) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.client.lock();
        let Some(client) = guard.as_deref_mut() else {
            self.inner.statistics.record_error();
            return Err(Status::io_error(format!("{method} on a closed connection")));
        };

        let result = f(client);
        if let Err(err) = &result {
            self.inner.statistics.record_error();
            if err.is_io_error() || err.is_corruption() {
                guard.take();
                error!(
                    endpoint = %self.inner.options.endpoint(),
                    method,
                    %err,
                    "stream out of sync, connection closed"
                );
            } else {
                debug!(method, %err, "rpc failed");
            }
        }
        result
    }

    pub(crate) fn describe_keyspaces(&self) -> Result<Vec<String>> {
        self.inner.statistics.record_describe();
        debug!("describe_keyspaces");
        self.with_client_locked("describe_keyspaces", |c| c.describe_keyspaces())
    }

    pub(crate) fn describe_keyspace(&self, keyspace: &str) -> Result<KeyspaceDescription> {
        self.inner.statistics.record_describe();
        debug!(keyspace, "describe_keyspace");
        self.with_client_locked("describe_keyspace", |c| c.describe_keyspace(keyspace))
    }

    pub(crate) fn get_slice(
        &self,
        keyspace: &str,
        key: &str,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
    ) -> Result<Vec<ColumnOrSuperColumn>> {
        self.inner.statistics.record_get_slice();
        debug!(keyspace, key, column_family = %parent.column_family, "get_slice");
        let level = self.consistency_level();
        let items = self.with_client_locked("get_slice", |c| {
            c.get_slice(keyspace, key, parent, predicate, level)
        })?;

        let (columns, bytes) = items.iter().fold((0u64, 0u64), |(n, b), item| {
            let (dn, db) = payload_size(item);
            (n + dn, b + db)
        });
        self.inner.statistics.record_columns_read(columns, bytes);
        Ok(items)
    }

    pub(crate) fn get_count(&self, keyspace: &str, key: &str, parent: &ColumnParent) -> Result<i32> {
        self.inner.statistics.record_get_count();
        debug!(keyspace, key, column_family = %parent.column_family, "get_count");
        let level = self.consistency_level();
        self.with_client_locked("get_count", |c| c.get_count(keyspace, key, parent, level))
    }

    pub(crate) fn insert(
        &self,
        keyspace: &str,
        key: &str,
        path: &ColumnPath,
        value: &[u8],
        timestamp: i64,
    ) -> Result<()> {
        self.inner.statistics.record_insert(value.len() as u64);
        debug!(keyspace, key, column_family = %path.column_family, timestamp, "insert");
        let level = self.consistency_level();
        self.with_client_locked("insert", |c| {
            c.insert(keyspace, key, path, value, timestamp, level)
        })
    }

    pub(crate) fn remove(
        &self,
        keyspace: &str,
        key: &str,
        path: &ColumnPath,
        timestamp: i64,
    ) -> Result<()> {
        self.inner.statistics.record_remove();
        debug!(keyspace, key, column_family = %path.column_family, timestamp, "remove");
        let level = self.consistency_level();
        self.with_client_locked("remove", |c| c.remove(keyspace, key, path, timestamp, level))
    }
}

/// (columns, value bytes) carried by one returned item.
fn payload_size(item: &ColumnOrSuperColumn) -> (u64, u64) {
    let mut columns = 0;
    let mut bytes = 0;
    if let Some(c) = &item.column {
        columns += 1;
        bytes += c.value.size() as u64;
    }
    if let Some(sc) = &item.super_column {
        columns += sc.columns.len() as u64;
        bytes += sc.columns.iter().map(|c| c.value.size() as u64).sum::<u64>();
    }
    (columns, bytes)
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.inner.options.endpoint())
            .field("consistency_level", &self.inner.options.consistency_level)
            .field("closed", &self.is_closed())
            .finish()
    }
}
