/// Cassandra Thrift interface
///
/// [`CassandraClient`] is the seam between the handles and whatever answers
/// the six calls this crate issues:
///
/// - [`ThriftClient`] talks to a real node over a socket
/// - [`MemoryCluster`] answers in-process, for tests and local development
pub mod client;
pub mod memory;
pub mod thrift_client;
pub mod types;

pub use client::CassandraClient;
pub use memory::MemoryCluster;
pub use thrift_client::ThriftClient;
pub use types::{
    Column, ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, KeyspaceDescription,
    SlicePredicate, SliceRange, SuperColumn,
};
