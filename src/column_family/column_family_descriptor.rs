use std::{collections::BTreeMap, fmt};

/// Property key carrying the column family type in `describe_keyspace`
pub const TYPE_PROPERTY: &str = "Type";

/// Whether rows hold columns directly or named groups of columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    #[default]
    Standard,
    Super,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Standard => "Standard",
            ColumnType::Super => "Super",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Standard" => Some(ColumnType::Standard),
            "Super" => Some(ColumnType::Super),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a Column Family as the server describes it
///
/// Contains the name, the column type and whatever other properties
/// `describe_keyspace` reported (comparator, comment, cache sizes...).
///
/// # Example
///
/// ```ignore
/// use cassal::ColumnFamilyDescriptor;
///
/// let users = ColumnFamilyDescriptor::super_family("Users");
/// assert!(users.is_super());
/// assert_eq!(users.to_properties()["Type"], "Super");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamilyDescriptor {
    /// Name of the column family
    pub name: String,

    /// Standard or Super
    pub column_type: ColumnType,

    /// Remaining server-reported properties, `Type` excluded
    pub properties: BTreeMap<String, String>,
}

impl ColumnFamilyDescriptor {
    /// Create a new column family descriptor
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType) -> Self {
        ColumnFamilyDescriptor {
            name: name.into(),
            column_type,
            properties: BTreeMap::new(),
        }
    }

    pub fn standard<S: Into<String>>(name: S) -> Self {
        ColumnFamilyDescriptor::new(name, ColumnType::Standard)
    }

    pub fn super_family<S: Into<String>>(name: S) -> Self {
        ColumnFamilyDescriptor::new(name, ColumnType::Super)
    }

    /// Attach an extra property, e.g. `CompareWith`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Build from one entry of a `describe_keyspace` reply.
    ///
    /// A missing or unrecognized `Type` is treated as `Standard`, which is
    /// what the server assumes when the schema omits it.
    pub fn from_properties<S: Into<String>>(name: S, mut properties: BTreeMap<String, String>) -> Self {
        let column_type = properties
            .remove(TYPE_PROPERTY)
            .and_then(|t| ColumnType::parse(&t))
            .unwrap_or_default();
        ColumnFamilyDescriptor {
            name: name.into(),
            column_type,
            properties,
        }
    }

    /// Inverse of [`ColumnFamilyDescriptor::from_properties`].
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut properties = self.properties.clone();
        properties.insert(TYPE_PROPERTY.to_string(), self.column_type.to_string());
        properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_super(&self) -> bool {
        self.column_type == ColumnType::Super
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_properties() {
        let mut props = BTreeMap::new();
        props.insert("Type".to_string(), "Super".to_string());
        props.insert(
            "CompareWith".to_string(),
            "org.apache.cassandra.db.marshal.UTF8Type".to_string(),
        );

        let desc = ColumnFamilyDescriptor::from_properties("Users", props);
        assert_eq!(desc.name, "Users");
        assert!(desc.is_super());
        assert_eq!(
            desc.property("CompareWith"),
            Some("org.apache.cassandra.db.marshal.UTF8Type")
        );
        assert_eq!(desc.property("Type"), None);
        assert_eq!(desc.to_properties()["Type"], "Super");
    }

    #[test]
    fn test_missing_type_is_standard() {
        let desc = ColumnFamilyDescriptor::from_properties("Standard1", BTreeMap::new());
        assert_eq!(desc.column_type, ColumnType::Standard);
        assert!(!desc.is_super());
    }

    #[test]
    fn test_column_type_parse() {
        assert_eq!(ColumnType::parse("Super"), Some(ColumnType::Super));
        assert_eq!(ColumnType::parse("super"), None);
        assert_eq!(ColumnType::Standard.to_string(), "Standard");
    }
}
