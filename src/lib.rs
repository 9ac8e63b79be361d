//! Cassandra abstraction layer.
//!
//! Selection of keyspace, column family, row and super column is a chain of
//! lightweight handles over one shared connection; every data operation on
//! the innermost handle is exactly one Thrift call.
//!
//! ```ignore
//! use cassal::connect_default;
//!
//! let users = connect_default()?.keyspace("MyDatabase")?.column_family("Users")?;
//!
//! users.row("joe").super_column("personalInfo").insert("emailAddress", "joe@abc.com")?;
//! let info = users.row("joe").super_column("personalInfo").get_all()?;
//! let n = users.row("joe").count()?;
//! users.row("joe").remove("personalInfo")?;
//! users.remove_row("joe")?;
//! ```

pub mod cassandra;
pub mod catalog;
pub mod column_family;
pub mod connection;
pub mod keyspace;
pub mod row;
pub mod statistics;
pub mod thrift;
pub mod util;

pub use cassandra::{CassandraClient, Column, ConsistencyLevel, MemoryCluster, SuperColumn};
pub use catalog::KeyspaceCatalog;
pub use column_family::{ColumnFamily, ColumnFamilyDescriptor, ColumnType};
pub use connection::{ConnectOptions, Connection, connect, connect_default, connect_to};
pub use keyspace::Keyspace;
pub use row::{GetOptions, RowAccessor, SliceItem, SliceResult};
pub use statistics::Statistics;
pub use util::{Code, Result, Slice, Status};
