use std::{fmt, sync::Arc};

use crate::{
    cassandra::types::ColumnPath,
    column_family::ColumnFamilyDescriptor,
    connection::Connection,
    row::RowAccessor,
    util::{Result, now_micros},
};

/// Handle to a Column Family
///
/// A lightweight view: the keyspace name, the descriptor fetched when the
/// keyspace was selected, and a reference to the shared connection. Cloning
/// is cheap and never opens a socket.
///
/// # Example
///
/// ```ignore
/// let users = catalog.keyspace("MyDatabase")?.column_family("Users")?;
///
/// users.row("joe").super_column("personalInfo").insert("emailAddress", "joe@abc.com")?;
/// users.remove_row("joe")?;
/// ```
#[derive(Clone)]
pub struct ColumnFamily {
    connection: Connection,

    /// Keyspace the column family belongs to
    keyspace: Arc<str>,

    descriptor: Arc<ColumnFamilyDescriptor>,
}

impl ColumnFamily {
    pub(crate) fn new(
        connection: Connection,
        keyspace: Arc<str>,
        descriptor: ColumnFamilyDescriptor,
    ) -> Self {
        ColumnFamily {
            connection,
            keyspace,
            descriptor: Arc::new(descriptor),
        }
    }

    /// Get the column family name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn descriptor(&self) -> &ColumnFamilyDescriptor {
        &self.descriptor
    }

    pub fn is_super(&self) -> bool {
        self.descriptor.is_super()
    }

    /// Accessor for row `key`. Issues no request.
    pub fn row(&self, key: impl Into<String>) -> RowAccessor {
        RowAccessor::new(
            self.connection.clone(),
            Arc::clone(&self.keyspace),
            Arc::from(self.name()),
            Arc::from(key.into()),
        )
    }

    /// Delete every column of row `key` written before now.
    pub fn remove_row(&self, key: &str) -> Result<()> {
        let path = ColumnPath::new(self.name(), None, None);
        self.connection
            .remove(&self.keyspace, key, &path, now_micros())
    }
}

impl fmt::Debug for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamily")
            .field("keyspace", &self.keyspace)
            .field("name", &self.descriptor.name)
            .field("column_type", &self.descriptor.column_type)
            .finish()
    }
}

impl fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<keyspace: {}, column family: {}>", self.keyspace, self.name())
    }
}
