//! Hive column types and identifier/literal quoting.

use std::fmt;

/// Hive data type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HiveType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    String,
    Binary,
    Date,
    Timestamp,
    Array(Box<HiveType>),
    Map(Box<HiveType>, Box<HiveType>),
    Struct(Vec<HiveColumn>),
}

impl HiveType {
    pub fn array(element: HiveType) -> Self {
        HiveType::Array(Box::new(element))
    }

    pub fn map(key: HiveType, value: HiveType) -> Self {
        HiveType::Map(Box::new(key), Box::new(value))
    }

    /// Whether the type can serve as a map key
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            HiveType::Array(_) | HiveType::Map(_, _) | HiveType::Struct(_)
        )
    }
}

impl fmt::Display for HiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiveType::Boolean => f.write_str("boolean"),
            HiveType::TinyInt => f.write_str("tinyint"),
            HiveType::SmallInt => f.write_str("smallint"),
            HiveType::Int => f.write_str("int"),
            HiveType::BigInt => f.write_str("bigint"),
            HiveType::Float => f.write_str("float"),
            HiveType::Double => f.write_str("double"),
            HiveType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            HiveType::String => f.write_str("string"),
            HiveType::Binary => f.write_str("binary"),
            HiveType::Date => f.write_str("date"),
            HiveType::Timestamp => f.write_str("timestamp"),
            HiveType::Array(element) => write!(f, "array<{}>", element),
            HiveType::Map(key, value) => write!(f, "map<{},{}>", key, value),
            HiveType::Struct(fields) => {
                f.write_str("struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", quote_identifier(&field.name), field.hive_type)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// A named column (or struct field)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveColumn {
    pub name: String,
    pub hive_type: HiveType,
}

impl HiveColumn {
    pub fn new(name: impl Into<String>, hive_type: HiveType) -> Self {
        Self {
            name: name.into(),
            hive_type,
        }
    }
}

/// Back-quote an identifier, doubling embedded back-quotes
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quote a string literal using Hive's backslash escapes
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Turn an arbitrary dataset name into a valid Hive table name
pub fn table_name(base: &str) -> String {
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
