/// Column Family module
///
/// A column family lives in exactly one keyspace. Rows are addressed by
/// (keyspace, column family, row key); in a Super column family a column is
/// further addressed by (super column, column name).
///
/// # Architecture
///
/// ```text
/// Keyspace("MyDatabase")
///  ├─→ ColumnFamily("Users", Super)
///  │    └─→ row "joe"
///  │         ├─→ super column "personalInfo"
///  │         │    └─→ column "emailAddress" = "joe@abc.com"
///  │         └─→ super column "prefs"
///  │              └─→ ...
///  └─→ ColumnFamily("Sessions", Standard)
///       └─→ row "s-1"
///            └─→ column "user" = "joe"
/// ```
///
/// # Usage
///
/// ```ignore
/// use cassal::connect_default;
///
/// let users = connect_default()?.keyspace("MyDatabase")?.column_family("Users")?;
///
/// let info = users.row("joe").super_column("personalInfo");
/// info.insert("emailAddress", "joe@abc.com")?;
/// let columns = info.get_all()?;
/// ```
pub mod column_family_descriptor;
pub mod column_family_handle;

pub use column_family_descriptor::{ColumnFamilyDescriptor, ColumnType};
pub use column_family_handle::ColumnFamily;
