use crate::error::{Error, Result};
use crate::parser;
use crate::types::Data;
use crate::value::Value;

use std::convert::TryFrom;
use std::fmt;

/// Longest signature a `g` value may hold.
pub const MAX_SIGNATURE_LEN: usize = 255;

/// A basic DBus type that can be checked out of a dynamic [`Value`].
pub(crate) trait DbusPrimitive: Sized {
    fn from_value(value: &Value) -> Result<Self>;
    fn into_data(self) -> Data;
}

fn wrong_type(value: &Value, expected: &str) -> Error {
    Error::unexpected(value, "value", format!("is not convertible to {}", expected))
}

fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(*b as i128),
        _ => None,
    }
}

macro_rules! int_primitive {
    ($type:ident, $variant:ident) => {
        impl DbusPrimitive for $type {
            fn from_value(value: &Value) -> Result<Self> {
                let i = integer(value).ok_or_else(|| wrong_type(value, stringify!($type)))?;
                $type::try_from(i).map_err(|_| {
                    Error::unexpected(
                        value,
                        "value",
                        format!(
                            "is out of range for {} ({}..={})",
                            stringify!($type),
                            $type::MIN,
                            $type::MAX
                        ),
                    )
                })
            }

            fn into_data(self) -> Data {
                Data::$variant(self)
            }
        }
    };
}

int_primitive!(u8, Byte);
int_primitive!(i16, Int16);
int_primitive!(u16, UInt16);
int_primitive!(i32, Int32);
int_primitive!(u32, UInt32);
int_primitive!(i64, Int64);
int_primitive!(u64, UInt64);

impl DbusPrimitive for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            _ => Err(wrong_type(value, "boolean")),
        }
    }

    fn into_data(self) -> Data {
        Data::Boolean(self)
    }
}

impl DbusPrimitive for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(wrong_type(value, "double")),
        }
    }

    fn into_data(self) -> Data {
        Data::Double(self)
    }
}

impl DbusPrimitive for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(s) if s.contains('\0') => Err(Error::unexpected(
                value,
                "value",
                "strings may not contain NUL",
            )),
            Value::Str(s) => Ok(s.clone()),
            _ => Err(wrong_type(value, "string")),
        }
    }

    fn into_data(self) -> Data {
        Data::String(self)
    }
}

/// A unix file descriptor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnixFd(pub u32);

impl DbusPrimitive for UnixFd {
    fn from_value(value: &Value) -> Result<Self> {
        let fd = integer(value).ok_or_else(|| wrong_type(value, "file descriptor"))?;
        if fd < 0 || fd > i32::MAX as i128 {
            return Err(Error::unexpected(
                value,
                "value",
                "is not a valid file descriptor",
            ));
        }
        Ok(UnixFd(fd as u32))
    }

    fn into_data(self) -> Data {
        Data::UnixFd(self.0)
    }
}

/// A signature string, valid by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    pub fn new(sig: impl Into<String>) -> Result<Self> {
        let sig = sig.into();
        if sig.len() > MAX_SIGNATURE_LEN {
            return Err(Error::parse(
                &sig,
                MAX_SIGNATURE_LEN,
                format!("signature is longer than {} bytes", MAX_SIGNATURE_LEN),
            ));
        }
        parser::parse(&sig)?;
        Ok(Signature(sig))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl DbusPrimitive for Signature {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(s) => Signature::new(s.as_str()).map_err(|err| {
                Error::unexpected(value, "value", format!("is not a signature: {}", err))
            }),
            _ => Err(wrong_type(value, "signature")),
        }
    }

    fn into_data(self) -> Data {
        Data::Signature(self)
    }
}

/// An object path, valid by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !is_valid_object_path(&path) {
            return Err(Error::unexpected(
                format!("\"{}\"", path),
                "path",
                "is not a valid object path",
            ));
        }
        Ok(ObjectPath(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_object_path(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    match path.strip_prefix('/') {
        Some(rest) => rest.split('/').all(|elem| {
            !elem.is_empty()
                && elem
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }),
        None => false,
    }
}

impl DbusPrimitive for ObjectPath {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(s) if is_valid_object_path(s) => Ok(ObjectPath(s.clone())),
            Value::Str(_) => Err(Error::unexpected(
                value,
                "value",
                "is not a valid object path",
            )),
            _ => Err(wrong_type(value, "object path")),
        }
    }

    fn into_data(self) -> Data {
        Data::ObjectPath(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{DbusPrimitive, ObjectPath, Signature};
    use crate::error::{Error, Result};
    use crate::value::Value;
    use test_log::test;

    #[test]
    fn integer_ranges() -> Result<()> {
        assert_eq!(u8::from_value(&Value::Int(255))?, 255);
        assert!(u8::from_value(&Value::Int(256)).is_err());
        assert!(u16::from_value(&Value::Int(-1)).is_err());
        assert_eq!(i16::from_value(&Value::Int(-0x8000))?, i16::MIN);
        assert!(i16::from_value(&Value::Int(0x8000)).is_err());
        assert_eq!(u64::from_value(&Value::Int(u64::MAX as i128))?, u64::MAX);
        assert!(i64::from_value(&Value::Int(u64::MAX as i128)).is_err());
        assert_eq!(i32::from_value(&Value::Bool(true))?, 1);
        Ok(())
    }

    #[test]
    fn integers_reject_other_shapes() {
        for value in &[
            Value::Str("string".to_owned()),
            Value::Float(2.0),
            Value::Seq(vec![]),
        ] {
            match i64::from_value(value) {
                Err(Error::UnexpectedValue { .. }) => (),
                other => panic!("{} should be rejected, got {:?}", value, other),
            }
        }
    }

    #[test]
    fn double_accepts_integers_and_booleans() -> Result<()> {
        assert_eq!(f64::from_value(&Value::Int(3))?, 3.0);
        assert_eq!(f64::from_value(&Value::Float(2.5))?, 2.5);
        assert_eq!(f64::from_value(&Value::Bool(true))?, 1.0);
        assert_eq!(f64::from_value(&Value::Bool(false))?, 0.0);
        assert!(f64::from_value(&Value::from("1.0")).is_err());
        Ok(())
    }

    #[test]
    fn strings() -> Result<()> {
        assert_eq!(String::from_value(&Value::from("hi"))?, "hi");
        assert!(String::from_value(&Value::from("a\0b")).is_err());
        assert!(String::from_value(&Value::Int(1)).is_err());
        Ok(())
    }

    #[test]
    fn object_paths() -> Result<()> {
        for good in &["/", "/a", "/org/freedesktop/DBus", "/_0/x_y"] {
            ObjectPath::new(*good)?;
        }
        for bad in &["", "a", "//", "/a/", "/a//b", "/a-b", "/ä"] {
            assert!(ObjectPath::new(*bad).is_err(), "{} accepted", bad);
        }
        Ok(())
    }

    #[test]
    fn signatures() -> Result<()> {
        assert_eq!(Signature::new("a{sv}")?.as_str(), "a{sv}");
        Signature::new("")?;
        assert!(Signature::new("a{").is_err());
        assert!(Signature::new("i".repeat(256)).is_err());
        assert!(Signature::from_value(&Value::from("(ii")).is_err());
        Ok(())
    }
}
