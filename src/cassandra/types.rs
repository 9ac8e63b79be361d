use std::{collections::BTreeMap, io::Read};

use serde::{Deserialize, Serialize};

use crate::{
    thrift::{BinaryDecoder, BinaryEncoder, TType},
    util::{Result, Slice, Status},
};

/// Column family name → property name → property value, as returned by
/// `describe_keyspace`.
pub type KeyspaceDescription = BTreeMap<String, BTreeMap<String, String>>;

/// Number of replicas that must acknowledge a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i32)]
pub enum ConsistencyLevel {
    Zero = 0,
    #[default]
    One = 1,
    Quorum = 2,
    DcQuorum = 3,
    DcQuorumSync = 4,
    All = 5,
    Any = 6,
}

impl ConsistencyLevel {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ConsistencyLevel::Zero),
            1 => Some(ConsistencyLevel::One),
            2 => Some(ConsistencyLevel::Quorum),
            3 => Some(ConsistencyLevel::DcQuorum),
            4 => Some(ConsistencyLevel::DcQuorumSync),
            5 => Some(ConsistencyLevel::All),
            6 => Some(ConsistencyLevel::Any),
            _ => None,
        }
    }
}

/// Container a slice or count reads from: a column family, or one super
/// column inside a super column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnParent {
    pub column_family: String,
    pub super_column: Option<Slice>,
}

impl ColumnParent {
    pub fn new(column_family: impl Into<String>, super_column: Option<Slice>) -> Self {
        ColumnParent {
            column_family: column_family.into(),
            super_column,
        }
    }

    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        enc.write_field_begin(TType::String, 3);
        enc.write_string(&self.column_family)?;
        if let Some(sc) = &self.super_column {
            enc.write_field_begin(TType::String, 4);
            enc.write_binary(sc.data())?;
        }
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut column_family = None;
        let mut super_column = None;
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (3, TType::String) => {
                column_family = Some(dec.read_string()?);
                Ok(())
            }
            (4, TType::String) => {
                super_column = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            _ => dec.skip(ty),
        })?;

        Ok(ColumnParent {
            column_family: column_family
                .ok_or_else(|| Status::corruption("ColumnParent without column_family"))?,
            super_column,
        })
    }
}

/// Address of a single column, a super column, or a whole row when both
/// optional parts are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    pub column_family: String,
    pub super_column: Option<Slice>,
    pub column: Option<Slice>,
}

impl ColumnPath {
    pub fn new(
        column_family: impl Into<String>,
        super_column: Option<Slice>,
        column: Option<Slice>,
    ) -> Self {
        ColumnPath {
            column_family: column_family.into(),
            super_column,
            column,
        }
    }

    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        enc.write_field_begin(TType::String, 3);
        enc.write_string(&self.column_family)?;
        if let Some(sc) = &self.super_column {
            enc.write_field_begin(TType::String, 4);
            enc.write_binary(sc.data())?;
        }
        if let Some(c) = &self.column {
            enc.write_field_begin(TType::String, 5);
            enc.write_binary(c.data())?;
        }
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut column_family = None;
        let mut super_column = None;
        let mut column = None;
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (3, TType::String) => {
                column_family = Some(dec.read_string()?);
                Ok(())
            }
            (4, TType::String) => {
                super_column = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            (5, TType::String) => {
                column = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            _ => dec.skip(ty),
        })?;

        Ok(ColumnPath {
            column_family: column_family
                .ok_or_else(|| Status::corruption("ColumnPath without column_family"))?,
            super_column,
            column,
        })
    }
}

/// Lexical column range. Empty `start`/`finish` mean unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceRange {
    pub start: Slice,
    pub finish: Slice,
    pub reversed: bool,
    pub count: i32,
}

impl Default for SliceRange {
    fn default() -> Self {
        SliceRange {
            start: Slice::empty(),
            finish: Slice::empty(),
            reversed: false,
            count: 100,
        }
    }
}

impl SliceRange {
    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        enc.write_field_begin(TType::String, 1);
        enc.write_binary(self.start.data())?;
        enc.write_field_begin(TType::String, 2);
        enc.write_binary(self.finish.data())?;
        enc.write_field_begin(TType::Bool, 3);
        enc.write_bool(self.reversed);
        enc.write_field_begin(TType::I32, 4);
        enc.write_i32(self.count);
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut range = SliceRange::default();
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (1, TType::String) => {
                range.start = Slice::from(dec.read_binary()?);
                Ok(())
            }
            (2, TType::String) => {
                range.finish = Slice::from(dec.read_binary()?);
                Ok(())
            }
            (3, TType::Bool) => {
                range.reversed = dec.read_bool()?;
                Ok(())
            }
            (4, TType::I32) => {
                range.count = dec.read_i32()?;
                Ok(())
            }
            _ => dec.skip(ty),
        })?;
        Ok(range)
    }
}

/// Which columns a `get_slice` returns. On the wire this is a struct with
/// two optional fields of which exactly one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlicePredicate {
    ColumnNames(Vec<Slice>),
    Range(SliceRange),
}

impl SlicePredicate {
    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        match self {
            SlicePredicate::ColumnNames(names) => {
                enc.write_field_begin(TType::List, 1);
                enc.write_list_begin(TType::String, names.len())?;
                for name in names {
                    enc.write_binary(name.data())?;
                }
            }
            SlicePredicate::Range(range) => {
                enc.write_field_begin(TType::Struct, 2);
                range.write(enc)?;
            }
        }
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut predicate = None;
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (1, TType::List) => {
                let (element_type, size) = dec.read_list_begin()?;
                dec.expect(element_type, TType::String, "column_names")?;
                let mut names = Vec::with_capacity(size);
                for _ in 0..size {
                    names.push(Slice::from(dec.read_binary()?));
                }
                predicate = Some(SlicePredicate::ColumnNames(names));
                Ok(())
            }
            (2, TType::Struct) => {
                predicate = Some(SlicePredicate::Range(SliceRange::read(dec)?));
                Ok(())
            }
            _ => dec.skip(ty),
        })?;
        predicate.ok_or_else(|| Status::corruption("SlicePredicate with neither field set"))
    }
}

/// A column as stored: name, opaque value and write timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: Slice,
    pub value: Slice,
    pub timestamp: i64,
}

impl Column {
    pub fn new(name: impl Into<Slice>, value: impl Into<Slice>, timestamp: i64) -> Self {
        Column {
            name: name.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        enc.write_field_begin(TType::String, 1);
        enc.write_binary(self.name.data())?;
        enc.write_field_begin(TType::String, 2);
        enc.write_binary(self.value.data())?;
        enc.write_field_begin(TType::I64, 3);
        enc.write_i64(self.timestamp);
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut name = None;
        let mut value = None;
        let mut timestamp = None;
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (1, TType::String) => {
                name = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            (2, TType::String) => {
                value = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            (3, TType::I64) => {
                timestamp = Some(dec.read_i64()?);
                Ok(())
            }
            _ => dec.skip(ty),
        })?;

        match (name, value, timestamp) {
            (Some(name), Some(value), Some(timestamp)) => Ok(Column {
                name,
                value,
                timestamp,
            }),
            _ => Err(Status::corruption("Column missing a required field")),
        }
    }
}

/// A named group of columns inside a super column family row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperColumn {
    pub name: Slice,
    pub columns: Vec<Column>,
}

impl SuperColumn {
    pub fn new(name: impl Into<Slice>, columns: Vec<Column>) -> Self {
        SuperColumn {
            name: name.into(),
            columns,
        }
    }

    /// Column `name` within this group.
    pub fn column(&self, name: impl AsRef<[u8]>) -> Option<&Column> {
        let name = name.as_ref();
        self.columns.iter().find(|c| c.name.data() == name)
    }

    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        enc.write_field_begin(TType::String, 1);
        enc.write_binary(self.name.data())?;
        enc.write_field_begin(TType::List, 2);
        enc.write_list_begin(TType::Struct, self.columns.len())?;
        for column in &self.columns {
            column.write(enc)?;
        }
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut name = None;
        let mut columns = Vec::new();
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (1, TType::String) => {
                name = Some(Slice::from(dec.read_binary()?));
                Ok(())
            }
            (2, TType::List) => {
                let (element_type, size) = dec.read_list_begin()?;
                dec.expect(element_type, TType::Struct, "columns")?;
                columns.reserve(size);
                for _ in 0..size {
                    columns.push(Column::read(dec)?);
                }
                Ok(())
            }
            _ => dec.skip(ty),
        })?;

        Ok(SuperColumn {
            name: name.ok_or_else(|| Status::corruption("SuperColumn without name"))?,
            columns,
        })
    }
}

/// Wire union returned by `get_slice`: exactly one member should be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOrSuperColumn {
    pub column: Option<Column>,
    pub super_column: Option<SuperColumn>,
}

impl ColumnOrSuperColumn {
    pub fn from_column(column: Column) -> Self {
        ColumnOrSuperColumn {
            column: Some(column),
            super_column: None,
        }
    }

    pub fn from_super_column(super_column: SuperColumn) -> Self {
        ColumnOrSuperColumn {
            column: None,
            super_column: Some(super_column),
        }
    }

    pub fn write(&self, enc: &mut BinaryEncoder) -> Result<()> {
        if let Some(column) = &self.column {
            enc.write_field_begin(TType::Struct, 1);
            column.write(enc)?;
        }
        if let Some(super_column) = &self.super_column {
            enc.write_field_begin(TType::Struct, 2);
            super_column.write(enc)?;
        }
        enc.write_field_stop();
        Ok(())
    }

    pub fn read<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<Self> {
        let mut cosc = ColumnOrSuperColumn::default();
        dec.read_struct(|dec, ty, id| match (id, ty) {
            (1, TType::Struct) => {
                cosc.column = Some(Column::read(dec)?);
                Ok(())
            }
            (2, TType::Struct) => {
                cosc.super_column = Some(SuperColumn::read(dec)?);
                Ok(())
            }
            _ => dec.skip(ty),
        })?;
        Ok(cosc)
    }
}
