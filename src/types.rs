//! Well-typed DBus values.
//!
//! A [`DbusValue`] is what the transformers produce: its shape is fixed
//! by a signature, and it records how many variants enclose it through
//! its `variant_level`. A level of 0 means the value does not sit in a
//! variant slot at all.

use crate::primitives::{ObjectPath, Signature};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DbusValue {
    pub data: Data,
    pub variant_level: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    UnixFd(u32),
    String(String),
    ObjectPath(ObjectPath),
    Signature(Signature),
    /// `signature` is the element signature, kept so that an empty
    /// array still knows its type.
    Array {
        signature: Signature,
        items: Vec<DbusValue>,
    },
    /// `signature` is the concatenation of the member signatures.
    Struct {
        signature: Signature,
        fields: Vec<DbusValue>,
    },
    /// `signature` is the key signature followed by the value signature.
    /// Keys are unique.
    Dictionary {
        signature: Signature,
        entries: Vec<(DbusValue, DbusValue)>,
    },
}

impl DbusValue {
    pub fn new(data: Data) -> Self {
        Self {
            data,
            variant_level: 0,
        }
    }

    pub fn with_variant_level(data: Data, variant_level: usize) -> Self {
        Self {
            data,
            variant_level,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.data,
            Data::Array { .. } | Data::Struct { .. } | Data::Dictionary { .. }
        )
    }
}

impl From<Data> for DbusValue {
    fn from(data: Data) -> Self {
        DbusValue::new(data)
    }
}

impl fmt::Display for DbusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Data::Byte(v) => write!(f, "Byte({})", v)?,
            Data::Boolean(v) => write!(f, "Boolean({})", v)?,
            Data::Int16(v) => write!(f, "Int16({})", v)?,
            Data::UInt16(v) => write!(f, "UInt16({})", v)?,
            Data::Int32(v) => write!(f, "Int32({})", v)?,
            Data::UInt32(v) => write!(f, "UInt32({})", v)?,
            Data::Int64(v) => write!(f, "Int64({})", v)?,
            Data::UInt64(v) => write!(f, "UInt64({})", v)?,
            Data::Double(v) => write!(f, "Double({:?})", v)?,
            Data::UnixFd(v) => write!(f, "UnixFd({})", v)?,
            Data::String(v) => write!(f, "String({:?})", v)?,
            Data::ObjectPath(v) => write!(f, "ObjectPath({:?})", v.as_str())?,
            Data::Signature(v) => write!(f, "Signature({:?})", v.as_str())?,
            Data::Array { signature, items } => {
                write!(f, "Array[{}](", signature)?;
                write_joined(f, items.iter())?;
                write!(f, ")")?;
            }
            Data::Struct { signature, fields } => {
                write!(f, "Struct({})(", signature)?;
                write_joined(f, fields.iter())?;
                write!(f, ")")?;
            }
            Data::Dictionary { signature, entries } => {
                write!(f, "Dictionary{{{}}}(", signature)?;
                for (ix, (key, value)) in entries.iter().enumerate() {
                    if ix != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, ")")?;
            }
        }
        if self.variant_level != 0 {
            write!(f, "@{}", self.variant_level)?;
        }
        Ok(())
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a DbusValue>,
) -> fmt::Result {
    for (ix, item) in items.enumerate() {
        if ix != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
