use crate::{
    cassandra::types::{Column, ColumnOrSuperColumn, SuperColumn},
    util::{Result, Slice, Status},
};

/// One element of a `get` result.
///
/// A super column family read without a selected super column yields
/// `SuperColumn` items; everything else yields `Column` items. A server may
/// in principle mix both in one reply, so each item carries its own shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceItem {
    Column(Column),
    SuperColumn(SuperColumn),
}

impl SliceItem {
    /// Convert the wire union, preferring the column member if both are set.
    pub fn from_wire(item: ColumnOrSuperColumn) -> Result<Self> {
        match item {
            ColumnOrSuperColumn {
                column: Some(column),
                ..
            } => Ok(SliceItem::Column(column)),
            ColumnOrSuperColumn {
                super_column: Some(super_column),
                ..
            } => Ok(SliceItem::SuperColumn(super_column)),
            _ => Err(Status::corruption(
                "ColumnOrSuperColumn with neither member set",
            )),
        }
    }

    pub fn name(&self) -> &Slice {
        match self {
            SliceItem::Column(c) => &c.name,
            SliceItem::SuperColumn(sc) => &sc.name,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            SliceItem::Column(c) => Some(c),
            SliceItem::SuperColumn(_) => None,
        }
    }

    pub fn as_super_column(&self) -> Option<&SuperColumn> {
        match self {
            SliceItem::Column(_) => None,
            SliceItem::SuperColumn(sc) => Some(sc),
        }
    }
}

/// Items of one `get`, in the order the server returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceResult {
    items: Vec<SliceItem>,
}

impl SliceResult {
    pub fn new(items: Vec<SliceItem>) -> Self {
        SliceResult { items }
    }

    pub(crate) fn from_wire(items: Vec<ColumnOrSuperColumn>) -> Result<Self> {
        let items = items
            .into_iter()
            .map(SliceItem::from_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(SliceResult { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[SliceItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SliceItem> {
        self.items.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &Slice> {
        self.items.iter().map(SliceItem::name)
    }

    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&SliceItem> {
        let name = name.as_ref();
        self.items.iter().find(|item| item.name().data() == name)
    }

    /// Plain column `name`, if the result holds one.
    pub fn column(&self, name: impl AsRef<[u8]>) -> Option<&Column> {
        self.get(name).and_then(SliceItem::as_column)
    }

    /// Super column `name`, if the result holds one.
    pub fn super_column(&self, name: impl AsRef<[u8]>) -> Option<&SuperColumn> {
        self.get(name).and_then(SliceItem::as_super_column)
    }

    pub fn value(&self, name: impl AsRef<[u8]>) -> Option<&Slice> {
        self.column(name).map(|c| &c.value)
    }
}

impl IntoIterator for SliceResult {
    type Item = SliceItem;
    type IntoIter = std::vec::IntoIter<SliceItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a SliceResult {
    type Item = &'a SliceItem;
    type IntoIter = std::slice::Iter<'a, SliceItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
