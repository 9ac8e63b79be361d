use std::{collections::BTreeMap, ops::Bound};

use tracing::trace;

use crate::{
    cassandra::{
        client::CassandraClient,
        types::{
            Column, ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel,
            KeyspaceDescription, SlicePredicate, SliceRange, SuperColumn,
        },
    },
    column_family::{ColumnFamilyDescriptor, ColumnType},
    util::{Result, Slice, Status},
};

/// In-process stand-in for a single Cassandra node.
///
/// Keeps rows in ordered maps and answers the same six calls the Thrift
/// client issues, with the server's validation rules: bytewise column order,
/// last write wins by timestamp, and a delete at time `t` removing every
/// column written at or before `t`. Deletes leave no tombstone, so a later
/// insert carrying an older timestamp is visible again.
///
/// # Example
///
/// ```ignore
/// let cluster = MemoryCluster::new()
///     .with_keyspace("MyDatabase", [ColumnFamilyDescriptor::super_family("Users")]);
/// let catalog = cassal::Connection::with_client(cluster, Default::default()).catalog()?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryCluster {
    keyspaces: BTreeMap<String, MemoryKeyspace>,
}

#[derive(Debug, Default)]
struct MemoryKeyspace {
    column_families: BTreeMap<String, MemoryColumnFamily>,
}

#[derive(Debug)]
struct MemoryColumnFamily {
    descriptor: ColumnFamilyDescriptor,
    rows: BTreeMap<String, Row>,
}

#[derive(Debug)]
enum Row {
    Standard(BTreeMap<Slice, Column>),
    Super(BTreeMap<Slice, BTreeMap<Slice, Column>>),
}

impl Row {
    fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Standard => Row::Standard(BTreeMap::new()),
            ColumnType::Super => Row::Super(BTreeMap::new()),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Row::Standard(columns) => columns.is_empty(),
            Row::Super(groups) => groups.is_empty(),
        }
    }
}

impl MemoryCluster {
    pub fn new() -> Self {
        MemoryCluster::default()
    }

    /// Declare a keyspace and its column families.
    pub fn with_keyspace<I>(mut self, name: impl Into<String>, column_families: I) -> Self
    where
        I: IntoIterator<Item = ColumnFamilyDescriptor>,
    {
        self.add_keyspace(name, column_families);
        self
    }

    pub fn add_keyspace<I>(&mut self, name: impl Into<String>, column_families: I)
    where
        I: IntoIterator<Item = ColumnFamilyDescriptor>,
    {
        let keyspace = self.keyspaces.entry(name.into()).or_default();
        for descriptor in column_families {
            keyspace.column_families.insert(
                descriptor.name.clone(),
                MemoryColumnFamily {
                    descriptor,
                    rows: BTreeMap::new(),
                },
            );
        }
    }

    fn column_family(&self, keyspace: &str, name: &str) -> Result<&MemoryColumnFamily> {
        self.keyspaces
            .get(keyspace)
            .ok_or_else(|| Status::invalid_request(format!("Keyspace {keyspace} does not exist")))?
            .column_families
            .get(name)
            .ok_or_else(|| Status::invalid_request(format!("unconfigured columnfamily {name}")))
    }

    fn column_family_mut(&mut self, keyspace: &str, name: &str) -> Result<&mut MemoryColumnFamily> {
        self.keyspaces
            .get_mut(keyspace)
            .ok_or_else(|| Status::invalid_request(format!("Keyspace {keyspace} does not exist")))?
            .column_families
            .get_mut(name)
            .ok_or_else(|| Status::invalid_request(format!("unconfigured columnfamily {name}")))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Status::invalid_request("Key may not be empty"));
    }
    Ok(())
}

fn validate_read_level(level: ConsistencyLevel) -> Result<()> {
    match level {
        ConsistencyLevel::Zero | ConsistencyLevel::Any => Err(Status::invalid_request(format!(
            "consistency level {level:?} may not be applied to read operations"
        ))),
        _ => Ok(()),
    }
}

fn validate_parent(cf: &MemoryColumnFamily, parent: &ColumnParent) -> Result<()> {
    if parent.super_column.is_some() && !cf.descriptor.is_super() {
        return Err(Status::invalid_request(format!(
            "supercolumn parameter is invalid for standard CF {}",
            cf.descriptor.name
        )));
    }
    Ok(())
}

/// Entries of `map` the predicate selects, in traversal order.
fn select<'a, V>(
    map: &'a BTreeMap<Slice, V>,
    predicate: &SlicePredicate,
) -> Result<Vec<(&'a Slice, &'a V)>> {
    match predicate {
        SlicePredicate::ColumnNames(names) => {
            let mut names: Vec<&Slice> = names.iter().collect();
            names.sort();
            names.dedup();
            Ok(names
                .into_iter()
                .filter_map(|name| map.get_key_value(name))
                .collect())
        }
        SlicePredicate::Range(range) => select_range(map, range),
    }
}

/// Empty bounds are open.
fn inclusive(s: &Slice) -> Bound<&Slice> {
    if s.is_empty() { Bound::Unbounded } else { Bound::Included(s) }
}

fn select_range<'a, V>(
    map: &'a BTreeMap<Slice, V>,
    range: &SliceRange,
) -> Result<Vec<(&'a Slice, &'a V)>> {
    if range.count < 0 {
        return Err(Status::invalid_request("get_slice requires non-negative count"));
    }
    let count = range.count as usize;

    let (lower, upper) = if range.reversed {
        (&range.finish, &range.start)
    } else {
        (&range.start, &range.finish)
    };
    if !lower.is_empty() && !upper.is_empty() && lower > upper {
        return Err(Status::invalid_request(
            "range finish must come after start in the order of traversal",
        ));
    }

    let bounds = (inclusive(lower), inclusive(upper));

    let entries = map.range::<Slice, _>(bounds);
    Ok(if range.reversed {
        entries.rev().take(count).collect()
    } else {
        entries.take(count).collect()
    })
}

impl CassandraClient for MemoryCluster {
    fn describe_keyspaces(&mut self) -> Result<Vec<String>> {
        Ok(self.keyspaces.keys().cloned().collect())
    }

    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription> {
        let ks = self
            .keyspaces
            .get(keyspace)
            .ok_or_else(|| Status::not_found(format!("Keyspace {keyspace} does not exist")))?;

        Ok(ks
            .column_families
            .iter()
            .map(|(name, cf)| (name.clone(), cf.descriptor.to_properties()))
            .collect())
    }

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency_level: ConsistencyLevel,
    ) -> Result<Vec<ColumnOrSuperColumn>> {
        validate_key(key)?;
        validate_read_level(consistency_level)?;
        let cf = self.column_family(keyspace, &column_parent.column_family)?;
        validate_parent(cf, column_parent)?;
        trace!(keyspace, key, cf = %cf.descriptor.name, "memory get_slice");

        let Some(row) = cf.rows.get(key) else {
            return Ok(Vec::new());
        };

        Ok(match (row, &column_parent.super_column) {
            (Row::Standard(columns), _) => select(columns, predicate)?
                .into_iter()
                .map(|(_, c)| ColumnOrSuperColumn::from_column(c.clone()))
                .collect(),
            (Row::Super(groups), None) => select(groups, predicate)?
                .into_iter()
                .map(|(name, columns)| {
                    ColumnOrSuperColumn::from_super_column(SuperColumn::new(
                        name.clone(),
                        columns.values().cloned().collect(),
                    ))
                })
                .collect(),
            (Row::Super(groups), Some(sc)) => match groups.get(sc) {
                Some(columns) => select(columns, predicate)?
                    .into_iter()
                    .map(|(_, c)| ColumnOrSuperColumn::from_column(c.clone()))
                    .collect(),
                None => Vec::new(),
            },
        })
    }

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        consistency_level: ConsistencyLevel,
    ) -> Result<i32> {
        validate_key(key)?;
        validate_read_level(consistency_level)?;
        let cf = self.column_family(keyspace, &column_parent.column_family)?;
        validate_parent(cf, column_parent)?;

        let n = match (cf.rows.get(key), &column_parent.super_column) {
            (None, _) => 0,
            (Some(Row::Standard(columns)), _) => columns.len(),
            (Some(Row::Super(groups)), None) => groups.len(),
            (Some(Row::Super(groups)), Some(sc)) => groups.get(sc).map_or(0, |c| c.len()),
        };
        Ok(n as i32)
    }

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        value: &[u8],
        timestamp: i64,
        _consistency_level: ConsistencyLevel,
    ) -> Result<()> {
        validate_key(key)?;
        let cf = self.column_family_mut(keyspace, &column_path.column_family)?;
        let column_type = cf.descriptor.column_type;

        let name = match &column_path.column {
            Some(name) if !name.is_empty() => name.clone(),
            Some(_) => return Err(Status::invalid_request("column name must not be empty")),
            None => {
                return Err(Status::invalid_request(
                    "column parameter is not optional for insert",
                ));
            }
        };
        match (column_type, &column_path.super_column) {
            (ColumnType::Standard, Some(_)) => {
                return Err(Status::invalid_request(format!(
                    "supercolumn parameter is invalid for standard CF {}",
                    column_path.column_family
                )));
            }
            (ColumnType::Super, None) => {
                return Err(Status::invalid_request(format!(
                    "supercolumn parameter is not optional for super CF {}",
                    column_path.column_family
                )));
            }
            (ColumnType::Super, Some(sc)) if sc.is_empty() => {
                return Err(Status::invalid_request("supercolumn name must not be empty"));
            }
            _ => {}
        }

        let row = cf
            .rows
            .entry(key.to_string())
            .or_insert_with(|| Row::new(column_type));
        let columns = match (row, &column_path.super_column) {
            (Row::Standard(columns), _) => columns,
            (Row::Super(groups), Some(sc)) => groups.entry(sc.clone()).or_default(),
            (Row::Super(_), None) => {
                return Err(Status::invalid_request("supercolumn parameter is not optional"));
            }
        };

        let column = Column {
            name: name.clone(),
            value: Slice::from(value),
            timestamp,
        };
        match columns.get(&name) {
            Some(existing) if existing.timestamp > timestamp => {}
            _ => {
                columns.insert(name, column);
            }
        }
        Ok(())
    }

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        timestamp: i64,
        _consistency_level: ConsistencyLevel,
    ) -> Result<()> {
        validate_key(key)?;
        let cf = self.column_family_mut(keyspace, &column_path.column_family)?;

        if !cf.descriptor.is_super() && column_path.super_column.is_some() {
            return Err(Status::invalid_request(format!(
                "supercolumn parameter is invalid for standard CF {}",
                column_path.column_family
            )));
        }
        if cf.descriptor.is_super()
            && column_path.super_column.is_none()
            && column_path.column.is_some()
        {
            return Err(Status::invalid_request(
                "column requires a supercolumn in a super CF",
            ));
        }

        let Some(row) = cf.rows.get_mut(key) else {
            return Ok(());
        };

        let expire = |columns: &mut BTreeMap<Slice, Column>| {
            columns.retain(|_, c| c.timestamp > timestamp);
        };

        match (&mut *row, &column_path.super_column, &column_path.column) {
            (Row::Standard(columns), None, None) => expire(columns),
            (Row::Standard(columns), None, Some(name)) => {
                if columns.get(name).is_some_and(|c| c.timestamp <= timestamp) {
                    columns.remove(name);
                }
            }
            (Row::Super(groups), None, _) => {
                groups.values_mut().for_each(expire);
                groups.retain(|_, columns| !columns.is_empty());
            }
            (Row::Super(groups), Some(sc), column) => {
                if let Some(columns) = groups.get_mut(sc) {
                    match column {
                        None => expire(columns),
                        Some(name) => {
                            if columns.get(name).is_some_and(|c| c.timestamp <= timestamp) {
                                columns.remove(name);
                            }
                        }
                    }
                    if columns.is_empty() {
                        groups.remove(sc);
                    }
                }
            }
            (Row::Standard(_), Some(_), _) => {}
        }

        if row.is_empty() {
            cf.rows.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: ConsistencyLevel = ConsistencyLevel::One;

    fn cluster() -> MemoryCluster {
        MemoryCluster::new().with_keyspace(
            "ks",
            [
                ColumnFamilyDescriptor::standard("Standard1"),
                ColumnFamilyDescriptor::super_family("Super1"),
            ],
        )
    }

    fn path(cf: &str, sc: Option<&str>, c: Option<&str>) -> ColumnPath {
        ColumnPath::new(cf, sc.map(Slice::from), c.map(Slice::from))
    }

    fn names(items: &[ColumnOrSuperColumn]) -> Vec<String> {
        items
            .iter()
            .map(|item| match (&item.column, &item.super_column) {
                (Some(c), _) => c.name.to_string(),
                (None, Some(sc)) => sc.name.to_string(),
                (None, None) => String::new(),
            })
            .collect()
    }

    #[test]
    fn test_describe() {
        let mut c = cluster();
        assert_eq!(c.describe_keyspaces().unwrap(), vec!["ks".to_string()]);

        let desc = c.describe_keyspace("ks").unwrap();
        assert_eq!(desc["Super1"]["Type"], "Super");
        assert_eq!(desc["Standard1"]["Type"], "Standard");

        assert!(c.describe_keyspace("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_last_write_wins() {
        let mut c = cluster();
        let p = path("Standard1", None, Some("a"));
        c.insert("ks", "k", &p, b"new", 20, ONE).unwrap();
        c.insert("ks", "k", &p, b"old", 10, ONE).unwrap();

        let items = c
            .get_slice(
                "ks",
                "k",
                &ColumnParent::new("Standard1", None),
                &SlicePredicate::ColumnNames(vec![Slice::from("a")]),
                ONE,
            )
            .unwrap();
        let column = items[0].column.as_ref().unwrap();
        assert_eq!(column.value, "new");
        assert_eq!(column.timestamp, 20);
    }

    #[test]
    fn test_range_bounds_and_reverse() {
        let mut c = cluster();
        for name in ["a", "b", "c", "d", "e"] {
            c.insert("ks", "k", &path("Standard1", None, Some(name)), b"v", 1, ONE)
                .unwrap();
        }
        let parent = ColumnParent::new("Standard1", None);

        let forward = SlicePredicate::Range(SliceRange {
            start: Slice::from("b"),
            finish: Slice::from("d"),
            ..Default::default()
        });
        let items = c.get_slice("ks", "k", &parent, &forward, ONE).unwrap();
        assert_eq!(names(&items), vec!["b", "c", "d"]);

        let backward = SlicePredicate::Range(SliceRange {
            start: Slice::from("d"),
            finish: Slice::empty(),
            reversed: true,
            count: 2,
        });
        let items = c.get_slice("ks", "k", &parent, &backward, ONE).unwrap();
        assert_eq!(names(&items), vec!["d", "c"]);

        let inverted = SlicePredicate::Range(SliceRange {
            start: Slice::from("d"),
            finish: Slice::from("b"),
            ..Default::default()
        });
        let err = c.get_slice("ks", "k", &parent, &inverted, ONE).unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_super_column_paths() {
        let mut c = cluster();
        c.insert("ks", "joe", &path("Super1", Some("info"), Some("email")), b"e", 1, ONE)
            .unwrap();
        c.insert("ks", "joe", &path("Super1", Some("info"), Some("phone")), b"p", 1, ONE)
            .unwrap();
        c.insert("ks", "joe", &path("Super1", Some("prefs"), Some("lang")), b"en", 1, ONE)
            .unwrap();

        let row = ColumnParent::new("Super1", None);
        let info = ColumnParent::new("Super1", Some(Slice::from("info")));
        assert_eq!(c.get_count("ks", "joe", &row, ONE).unwrap(), 2);
        assert_eq!(c.get_count("ks", "joe", &info, ONE).unwrap(), 2);

        c.remove("ks", "joe", &path("Super1", Some("info"), Some("email")), 2, ONE)
            .unwrap();
        assert_eq!(c.get_count("ks", "joe", &info, ONE).unwrap(), 1);

        c.remove("ks", "joe", &path("Super1", Some("prefs"), None), 2, ONE)
            .unwrap();
        assert_eq!(c.get_count("ks", "joe", &row, ONE).unwrap(), 1);

        c.remove("ks", "joe", &path("Super1", None, None), 2, ONE).unwrap();
        assert_eq!(c.get_count("ks", "joe", &row, ONE).unwrap(), 0);
    }

    #[test]
    fn test_delete_respects_timestamps() {
        let mut c = cluster();
        let p = path("Standard1", None, Some("a"));
        c.insert("ks", "k", &p, b"v", 50, ONE).unwrap();
        c.remove("ks", "k", &path("Standard1", None, None), 40, ONE)
            .unwrap();

        let parent = ColumnParent::new("Standard1", None);
        assert_eq!(c.get_count("ks", "k", &parent, ONE).unwrap(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let mut c = cluster();
        let standard_with_sc = path("Standard1", Some("x"), Some("a"));
        assert!(
            c.insert("ks", "k", &standard_with_sc, b"v", 1, ONE)
                .unwrap_err()
                .is_invalid_request()
        );

        let super_without_sc = path("Super1", None, Some("a"));
        assert!(
            c.insert("ks", "k", &super_without_sc, b"v", 1, ONE)
                .unwrap_err()
                .is_invalid_request()
        );

        let unknown_cf = path("Nope", None, Some("a"));
        assert!(
            c.insert("ks", "k", &unknown_cf, b"v", 1, ONE)
                .unwrap_err()
                .is_invalid_request()
        );

        let ok = path("Standard1", None, Some("a"));
        assert!(c.insert("ks", "", &ok, b"v", 1, ONE).unwrap_err().is_invalid_request());

        let parent = ColumnParent::new("Standard1", None);
        assert!(
            c.get_count("ks", "k", &parent, ConsistencyLevel::Zero)
                .unwrap_err()
                .is_invalid_request()
        );
    }
}
