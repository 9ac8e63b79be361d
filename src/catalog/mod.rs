use std::fmt;

use crate::{
    connection::Connection,
    keyspace::Keyspace,
    util::{Result, Status},
};

/// Keyspaces present on the server when the catalog was loaded.
///
/// The name list is a snapshot; [`KeyspaceCatalog::refresh`] fetches a new
/// one.
#[derive(Clone)]
pub struct KeyspaceCatalog {
    connection: Connection,
    keyspaces: Vec<String>,
}

impl KeyspaceCatalog {
    pub(crate) fn load(connection: Connection) -> Result<Self> {
        let keyspaces = connection.describe_keyspaces()?;
        Ok(KeyspaceCatalog {
            connection,
            keyspaces,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn keyspaces(&self) -> &[String] {
        &self.keyspaces
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keyspaces.iter().any(|ks| ks == name)
    }

    /// Select keyspace `name`, fetching its column families.
    ///
    /// Fails with `NotFound` if `name` was not in the snapshot.
    pub fn keyspace(&self, name: &str) -> Result<Keyspace> {
        if !self.contains(name) {
            return Err(Status::not_found(format!("Keyspace `{name}` does not exist")));
        }
        Keyspace::load(self.connection.clone(), name)
    }

    pub fn refresh(&self) -> Result<Self> {
        KeyspaceCatalog::load(self.connection.clone())
    }
}

impl fmt::Debug for KeyspaceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyspaceCatalog")
            .field("keyspaces", &self.keyspaces)
            .finish()
    }
}

impl fmt::Display for KeyspaceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<keyspaces: {:?}>", self.keyspaces)
    }
}
