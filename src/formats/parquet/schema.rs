//! Mapping from Parquet schemas to Hive column types.
//!
//! Primitive columns are mapped from their logical type when present, then
//! from the legacy converted type, then from the physical type. Nested
//! columns follow the LIST/MAP backward-compatibility rules of the Parquet
//! format so that files written by older Hive, Spark and Avro writers come
//! out the same as files written by current ones.

use anyhow::{Result, anyhow, bail};
use parquet::basic::{ConvertedType, LogicalType, Repetition, Type as PhysicalType};
use parquet::schema::types::{BasicTypeInfo, Type as SchemaType};

use crate::config::MAX_DECIMAL_PRECISION;
use crate::hive::{HiveColumn, HiveType};

/// How a group field is rendered in Hive
enum GroupKind {
    List,
    Map,
    Struct,
}

/// Convert the root message type of a Parquet schema into Hive columns
pub fn hive_columns(root: &SchemaType) -> Result<Vec<HiveColumn>> {
    if !root.is_group() {
        bail!("Parquet schema root '{}' is not a group", root.name());
    }

    root.get_fields()
        .iter()
        .map(|field| Ok(HiveColumn::new(field.name(), field_type(field)?)))
        .collect()
}

fn is_repeated(field: &SchemaType) -> bool {
    let info = field.get_basic_info();
    info.has_repetition() && info.repetition() == Repetition::REPEATED
}

/// Type of a field including its repetition: REPEATED fields become arrays
fn field_type(field: &SchemaType) -> Result<HiveType> {
    let value = value_type(field)?;
    if is_repeated(field) {
        Ok(HiveType::array(value))
    } else {
        Ok(value)
    }
}

/// Type of a single value of the field, ignoring its repetition
fn value_type(field: &SchemaType) -> Result<HiveType> {
    match field {
        SchemaType::PrimitiveType { .. } => primitive_type(field),
        SchemaType::GroupType { basic_info, fields } => match group_kind(basic_info) {
            GroupKind::List => list_type(field),
            GroupKind::Map => map_type(field),
            GroupKind::Struct => {
                if fields.is_empty() {
                    bail!(
                        "Group '{}' has no fields; Hive structs cannot be empty",
                        field.name()
                    );
                }
                let columns = fields
                    .iter()
                    .map(|f| Ok(HiveColumn::new(f.name(), field_type(f)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(HiveType::Struct(columns))
            }
        },
    }
}

fn group_kind(info: &BasicTypeInfo) -> GroupKind {
    match info.logical_type() {
        Some(LogicalType::List) => GroupKind::List,
        Some(LogicalType::Map) => GroupKind::Map,
        _ => match info.converted_type() {
            ConvertedType::LIST => GroupKind::List,
            ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE => GroupKind::Map,
            _ => GroupKind::Struct,
        },
    }
}

fn list_type(list: &SchemaType) -> Result<HiveType> {
    let [repeated] = list.get_fields() else {
        bail!(
            "LIST group '{}' must have exactly one child, found {}",
            list.name(),
            list.get_fields().len()
        );
    };

    if !is_repeated(repeated) {
        bail!(
            "LIST group '{}' child '{}' is not repeated",
            list.name(),
            repeated.name()
        );
    }

    let element = match repeated.as_ref() {
        // 2-level list: the repeated primitive is the element
        SchemaType::PrimitiveType { .. } => value_type(repeated)?,
        SchemaType::GroupType { fields, .. } => {
            let tuple_name = format!("{}_tuple", list.name());
            if fields.len() != 1 || repeated.name() == "array" || repeated.name() == tuple_name {
                // Legacy layout: the repeated group itself is the element
                value_type(repeated)?
            } else {
                field_type(&fields[0])?
            }
        }
    };

    Ok(HiveType::array(element))
}

fn map_type(map: &SchemaType) -> Result<HiveType> {
    let [key_value] = map.get_fields() else {
        bail!(
            "MAP group '{}' must have exactly one child, found {}",
            map.name(),
            map.get_fields().len()
        );
    };

    let SchemaType::GroupType { fields, .. } = key_value.as_ref() else {
        bail!(
            "MAP group '{}' must contain a key/value group, found primitive '{}'",
            map.name(),
            key_value.name()
        );
    };

    let key = fields
        .first()
        .ok_or_else(|| anyhow!("MAP group '{}' has no key field", map.name()))?;
    let key_type = field_type(key)?;
    if !key_type.is_primitive() {
        bail!(
            "MAP group '{}' has non-primitive key type {}",
            map.name(),
            key_type
        );
    }

    match fields.len() {
        // Key-only maps carry sets
        1 => Ok(HiveType::array(key_type)),
        2 => Ok(HiveType::map(key_type, field_type(&fields[1])?)),
        n => bail!(
            "MAP group '{}' key/value group has {} fields, expected 1 or 2",
            map.name(),
            n
        ),
    }
}

fn primitive_type(field: &SchemaType) -> Result<HiveType> {
    let info = field.get_basic_info();
    let physical = field.get_physical_type();

    let hive_type = info
        .logical_type()
        .and_then(|logical| from_logical(&logical))
        .or_else(|| from_converted(info.converted_type(), field))
        .unwrap_or_else(|| from_physical(physical));

    if let HiveType::Decimal { precision, scale } = hive_type {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            bail!(
                "Column '{}' has decimal precision {}; Hive supports 1 to {}",
                field.name(),
                precision,
                MAX_DECIMAL_PRECISION
            );
        }
        if scale > precision {
            bail!(
                "Column '{}' has decimal scale {} greater than precision {}",
                field.name(),
                scale,
                precision
            );
        }
    }

    Ok(hive_type)
}

fn decimal(precision: i32, scale: i32) -> HiveType {
    HiveType::Decimal {
        precision: precision.max(0) as u32,
        scale: scale.max(0) as u32,
    }
}

fn integer(bit_width: i8, is_signed: bool) -> HiveType {
    match (bit_width, is_signed) {
        (8, true) => HiveType::TinyInt,
        (16, true) => HiveType::SmallInt,
        (32, true) => HiveType::Int,
        (_, true) => HiveType::BigInt,
        // Unsigned values need the next wider signed type
        (8, false) => HiveType::SmallInt,
        (16, false) => HiveType::Int,
        (32, false) => HiveType::BigInt,
        (_, false) => HiveType::Decimal {
            precision: 20,
            scale: 0,
        },
    }
}

fn from_logical(logical: &LogicalType) -> Option<HiveType> {
    match logical {
        LogicalType::String | LogicalType::Enum | LogicalType::Json => Some(HiveType::String),
        LogicalType::Bson | LogicalType::Uuid => Some(HiveType::Binary),
        LogicalType::Decimal { scale, precision } => Some(decimal(*precision, *scale)),
        LogicalType::Date => Some(HiveType::Date),
        LogicalType::Timestamp { .. } => Some(HiveType::Timestamp),
        LogicalType::Integer {
            bit_width,
            is_signed,
        } => Some(integer(*bit_width, *is_signed)),
        LogicalType::Float16 => Some(HiveType::Float),
        // TIME has no Hive counterpart and keeps its physical integer type
        _ => None,
    }
}

fn from_converted(converted: ConvertedType, field: &SchemaType) -> Option<HiveType> {
    match converted {
        ConvertedType::UTF8 | ConvertedType::ENUM | ConvertedType::JSON => Some(HiveType::String),
        ConvertedType::BSON | ConvertedType::INTERVAL => Some(HiveType::Binary),
        ConvertedType::DECIMAL => Some(decimal(field.get_precision(), field.get_scale())),
        ConvertedType::DATE => Some(HiveType::Date),
        ConvertedType::TIMESTAMP_MILLIS | ConvertedType::TIMESTAMP_MICROS => {
            Some(HiveType::Timestamp)
        }
        ConvertedType::INT_8 => Some(integer(8, true)),
        ConvertedType::INT_16 => Some(integer(16, true)),
        ConvertedType::INT_32 => Some(integer(32, true)),
        ConvertedType::INT_64 => Some(integer(64, true)),
        ConvertedType::UINT_8 => Some(integer(8, false)),
        ConvertedType::UINT_16 => Some(integer(16, false)),
        ConvertedType::UINT_32 => Some(integer(32, false)),
        ConvertedType::UINT_64 => Some(integer(64, false)),
        _ => None,
    }
}

fn from_physical(physical: PhysicalType) -> HiveType {
    match physical {
        PhysicalType::BOOLEAN => HiveType::Boolean,
        PhysicalType::INT32 => HiveType::Int,
        PhysicalType::INT64 => HiveType::BigInt,
        PhysicalType::INT96 => HiveType::Timestamp,
        PhysicalType::FLOAT => HiveType::Float,
        PhysicalType::DOUBLE => HiveType::Double,
        PhysicalType::BYTE_ARRAY | PhysicalType::FIXED_LEN_BYTE_ARRAY => HiveType::Binary,
    }
}
