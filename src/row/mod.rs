/// Row access
///
/// ```text
/// ColumnFamily::row(key)            → RowAccessor { parent: (cf, -) }
///   └─→ .super_column(name)         → RowAccessor { parent: (cf, name) }
///
/// get / count    → get_slice / get_count on the parent
/// insert(c, v)   → insert at (cf, parent super column, c)
/// remove(k)      → with super column s: remove (cf, s, k)
///                  without:             remove (cf, k, -)
/// ```
pub mod accessor;
pub mod slice_result;

pub use accessor::{DEFAULT_GET_LIMIT, GetOptions, RowAccessor};
pub use slice_result::{SliceItem, SliceResult};
