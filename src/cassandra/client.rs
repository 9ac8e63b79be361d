use crate::{
    cassandra::types::{
        ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, KeyspaceDescription,
        SlicePredicate,
    },
    util::Result,
};

/// The subset of Cassandra's Thrift service this crate issues.
///
/// Every method is one blocking round trip. Implementations are not
/// expected to be shareable; [`crate::Connection`] serializes access.
pub trait CassandraClient: Send {
    /// Names of all keyspaces on the cluster.
    fn describe_keyspaces(&mut self) -> Result<Vec<String>>;

    /// Column families of `keyspace` with their properties.
    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription>;

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency_level: ConsistencyLevel,
    ) -> Result<Vec<ColumnOrSuperColumn>>;

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        consistency_level: ConsistencyLevel,
    ) -> Result<i32>;

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        value: &[u8],
        timestamp: i64,
        consistency_level: ConsistencyLevel,
    ) -> Result<()>;

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        timestamp: i64,
        consistency_level: ConsistencyLevel,
    ) -> Result<()>;
}
