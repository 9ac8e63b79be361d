use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    column_family::{ColumnFamily, ColumnFamilyDescriptor},
    connection::Connection,
    util::{Result, Status},
};

/// A selected keyspace and the column families it had when selected.
#[derive(Clone)]
pub struct Keyspace {
    connection: Connection,
    name: Arc<str>,
    column_families: BTreeMap<String, ColumnFamilyDescriptor>,
}

impl Keyspace {
    /// Describe `name` on the server and cache its column families.
    pub(crate) fn load(connection: Connection, name: &str) -> Result<Self> {
        let description = connection.describe_keyspace(name)?;
        let column_families = description
            .into_iter()
            .map(|(cf, properties)| {
                let descriptor = ColumnFamilyDescriptor::from_properties(cf.clone(), properties);
                (cf, descriptor)
            })
            .collect();

        Ok(Keyspace {
            connection,
            name: Arc::from(name),
            column_families,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column family names, in name order.
    pub fn column_families(&self) -> impl Iterator<Item = &str> {
        self.column_families.keys().map(String::as_str)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ColumnFamilyDescriptor> {
        self.column_families.get(name)
    }

    /// Select column family `name`.
    ///
    /// Fails with `NotFound` if the keyspace had no such column family when
    /// it was selected.
    pub fn column_family(&self, name: &str) -> Result<ColumnFamily> {
        let descriptor = self
            .column_families
            .get(name)
            .ok_or_else(|| Status::not_found(format!("ColumnFamily `{name}` does not exist")))?;

        Ok(ColumnFamily::new(
            self.connection.clone(),
            Arc::clone(&self.name),
            descriptor.clone(),
        ))
    }
}

impl fmt::Debug for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace")
            .field("name", &self.name)
            .field("column_families", &self.column_families.keys())
            .finish()
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.column_families().collect();
        write!(f, "<keyspace: {}, column families: {:?}>", self.name, names)
    }
}
