use std::{fmt, sync::Arc};

use crate::{
    cassandra::types::{ColumnParent, ColumnPath, SlicePredicate, SliceRange},
    connection::Connection,
    row::SliceResult,
    util::{Result, Slice, now_micros},
};

/// Default cap on columns returned by a range `get`
pub const DEFAULT_GET_LIMIT: i32 = 100;

/// What a `get` selects.
///
/// A non-empty `columns` list selects exactly those names and the range
/// fields are ignored. Otherwise the range `[start, finish]` is read, at most
/// `limit` entries, descending when `reversed`. Empty bounds are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    pub columns: Vec<Slice>,
    pub start: Slice,
    pub finish: Slice,
    pub limit: i32,
    pub reversed: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        GetOptions {
            columns: Vec::new(),
            start: Slice::empty(),
            finish: Slice::empty(),
            limit: DEFAULT_GET_LIMIT,
            reversed: false,
        }
    }
}

impl GetOptions {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Slice>,
    {
        GetOptions {
            columns: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn range(start: impl Into<Slice>, finish: impl Into<Slice>) -> Self {
        GetOptions {
            start: start.into(),
            finish: finish.into(),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn predicate(&self) -> SlicePredicate {
        if !self.columns.is_empty() {
            return SlicePredicate::ColumnNames(self.columns.clone());
        }
        SlicePredicate::Range(SliceRange {
            start: self.start.clone(),
            finish: self.finish.clone(),
            reversed: self.reversed,
            count: self.limit,
        })
    }
}

/// Accessor for one row, optionally narrowed to one super column.
///
/// Immutable: [`RowAccessor::super_column`] returns a new accessor and
/// leaves the receiver addressing the whole row, so accessors captured at
/// different points never change meaning.
#[derive(Clone)]
pub struct RowAccessor {
    connection: Connection,
    keyspace: Arc<str>,
    column_family: Arc<str>,
    key: Arc<str>,
    super_column: Option<Slice>,
}

impl RowAccessor {
    pub(crate) fn new(
        connection: Connection,
        keyspace: Arc<str>,
        column_family: Arc<str>,
        key: Arc<str>,
    ) -> Self {
        RowAccessor {
            connection,
            keyspace,
            column_family,
            key,
            super_column: None,
        }
    }

    /// The same row narrowed to super column `name`.
    pub fn super_column(&self, name: impl Into<Slice>) -> RowAccessor {
        RowAccessor {
            super_column: Some(name.into()),
            ..self.clone()
        }
    }

    pub fn selected_super_column(&self) -> Option<&Slice> {
        self.super_column.as_ref()
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn parent(&self) -> ColumnParent {
        ColumnParent::new(&*self.column_family, self.super_column.clone())
    }

    /// One `get_slice` over the current parent.
    pub fn get(&self, options: &GetOptions) -> Result<SliceResult> {
        let items = self.connection.get_slice(
            &self.keyspace,
            &self.key,
            &self.parent(),
            &options.predicate(),
        )?;
        SliceResult::from_wire(items)
    }

    /// Up to [`DEFAULT_GET_LIMIT`] entries from the start of the parent.
    pub fn get_all(&self) -> Result<SliceResult> {
        self.get(&GetOptions::default())
    }

    pub fn get_columns<I, S>(&self, names: I) -> Result<SliceResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<Slice>,
    {
        self.get(&GetOptions::columns(names))
    }

    /// Number of entries under the current parent, as the server counts
    /// them.
    pub fn count(&self) -> Result<i32> {
        self.connection
            .get_count(&self.keyspace, &self.key, &self.parent())
    }

    /// Write column `name` under the current parent, timestamped now.
    pub fn insert(&self, name: impl Into<Slice>, value: impl Into<Slice>) -> Result<()> {
        let path = ColumnPath::new(
            &*self.column_family,
            self.super_column.clone(),
            Some(name.into()),
        );
        let value = value.into();
        self.connection
            .insert(&self.keyspace, &self.key, &path, value.data(), now_micros())
    }

    /// Remove `sub_key` relative to the current selection.
    ///
    /// With a super column selected, `sub_key` names a column inside it.
    /// Without one, `sub_key` names a whole super column.
    pub fn remove(&self, sub_key: impl Into<Slice>) -> Result<()> {
        let sub_key = sub_key.into();
        let path = match &self.super_column {
            Some(sc) => ColumnPath::new(&*self.column_family, Some(sc.clone()), Some(sub_key)),
            None => ColumnPath::new(&*self.column_family, Some(sub_key), None),
        };
        self.connection
            .remove(&self.keyspace, &self.key, &path, now_micros())
    }
}

impl fmt::Debug for RowAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAccessor")
            .field("keyspace", &self.keyspace)
            .field("column_family", &self.column_family)
            .field("key", &self.key)
            .field("super_column", &self.super_column)
            .finish()
    }
}

impl fmt::Display for RowAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<keyspace: {}, column family: {}, row: {}",
            self.keyspace, self.column_family, self.key
        )?;
        match &self.super_column {
            Some(sc) => write!(f, ", super column: {sc}>"),
            None => write!(f, ">"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_predicate_is_open_range() {
        let predicate = GetOptions::default().predicate();
        assert_eq!(predicate, SlicePredicate::Range(SliceRange::default()));
    }

    #[test]
    fn test_names_take_precedence_over_range() {
        let mut options = GetOptions::range("a", "z");
        options.columns = vec![Slice::from("m")];
        assert_eq!(
            options.predicate(),
            SlicePredicate::ColumnNames(vec![Slice::from("m")])
        );
    }

    #[test]
    fn test_range_builder() {
        let options = GetOptions::range("b", "d").limit(2).reversed(true);
        match options.predicate() {
            SlicePredicate::Range(range) => {
                assert_eq!(range.start, "b");
                assert_eq!(range.finish, "d");
                assert_eq!(range.count, 2);
                assert!(range.reversed);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }
}
