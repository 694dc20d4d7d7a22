//! The DBus type signature grammar.
//!
//! A signature is a sequence of complete types. [`parse`] splits a
//! signature into its complete types, giving each one as a
//! [`CompleteType`] tree together with the exact slice of the
//! signature it was parsed from.

use crate::error::{Error, Result};
use crate::primitives::MAX_SIGNATURE_LEN;

use log::trace;
use std::fmt;

/// Maximum nesting of arrays, and separately of structs, in one signature.
pub const MAX_NESTING_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasicType {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    UnixFd,
    String,
    ObjectPath,
    Signature,
}

impl BasicType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'y' => Some(BasicType::Byte),
            b'b' => Some(BasicType::Boolean),
            b'n' => Some(BasicType::Int16),
            b'q' => Some(BasicType::UInt16),
            b'i' => Some(BasicType::Int32),
            b'u' => Some(BasicType::UInt32),
            b'x' => Some(BasicType::Int64),
            b't' => Some(BasicType::UInt64),
            b'd' => Some(BasicType::Double),
            b'h' => Some(BasicType::UnixFd),
            b's' => Some(BasicType::String),
            b'o' => Some(BasicType::ObjectPath),
            b'g' => Some(BasicType::Signature),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            BasicType::Byte => 'y',
            BasicType::Boolean => 'b',
            BasicType::Int16 => 'n',
            BasicType::UInt16 => 'q',
            BasicType::Int32 => 'i',
            BasicType::UInt32 => 'u',
            BasicType::Int64 => 'x',
            BasicType::UInt64 => 't',
            BasicType::Double => 'd',
            BasicType::UnixFd => 'h',
            BasicType::String => 's',
            BasicType::ObjectPath => 'o',
            BasicType::Signature => 'g',
        }
    }
}

/// One complete type of a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompleteType {
    Basic(BasicType),
    Array(Box<CompleteType>),
    Struct(Vec<CompleteType>),
    Dict(BasicType, Box<CompleteType>),
    Variant,
}

impl fmt::Display for CompleteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompleteType::Basic(basic) => write!(f, "{}", basic.code()),
            CompleteType::Array(elem) => write!(f, "a{}", elem),
            CompleteType::Struct(members) => {
                write!(f, "(")?;
                for member in members {
                    write!(f, "{}", member)?;
                }
                write!(f, ")")
            }
            CompleteType::Dict(key, value) => write!(f, "a{{{}{}}}", key.code(), value),
            CompleteType::Variant => write!(f, "v"),
        }
    }
}

/// Splits `signature` into its complete types.
///
/// The empty signature is valid and has no complete types.
pub fn parse(signature: &str) -> Result<Vec<(CompleteType, &str)>> {
    let mut parser = SignatureParser::new(signature);
    let mut types = Vec::new();
    while !parser.at_end() {
        let start = parser.sig_ix;
        let ty = parser.grab_single_sig()?;
        types.push((ty, &signature[start..parser.sig_ix]));
    }
    trace!("parsed {} complete types from '{}'", types.len(), signature);
    Ok(types)
}

/// Parses a signature that must hold exactly one complete type.
pub fn parse_single(signature: &str) -> Result<CompleteType> {
    let mut types = parse(signature)?;
    if types.len() != 1 {
        return Err(Error::parse(
            signature,
            0,
            format!("expected exactly one complete type, found {}", types.len()),
        ));
    }
    let (ty, _) = types.remove(0);
    Ok(ty)
}

pub fn is_valid(signature: &str) -> bool {
    parse(signature).is_ok()
}

struct SignatureParser<'s> {
    sig: &'s str,
    sig_ix: usize,
    array_depth: usize,
    struct_depth: usize,
}

impl<'s> SignatureParser<'s> {
    fn new(sig: &'s str) -> Self {
        Self {
            sig,
            sig_ix: 0,
            array_depth: 0,
            struct_depth: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.sig_ix >= self.sig.len()
    }

    fn error(&self, offset: usize, msg: impl Into<String>) -> Error {
        Error::parse(self.sig, offset, msg)
    }

    fn next_byte(&mut self) -> Result<u8> {
        match self.sig.as_bytes().get(self.sig_ix) {
            Some(&byte) => {
                self.sig_ix += 1;
                Ok(byte)
            }
            None => Err(self.error(self.sig_ix, "signature ended inside a complete type")),
        }
    }

    fn probe_signature_byte(&mut self, expected: u8) -> bool {
        if self.sig.as_bytes().get(self.sig_ix) == Some(&expected) {
            self.sig_ix += 1;
            true
        } else {
            false
        }
    }

    fn expect_signature_byte(&mut self, expected: u8) -> Result<()> {
        let ix = self.sig_ix;
        let got = self.next_byte()?;
        if got != expected {
            return Err(self.error(
                ix,
                format!("expected '{}', found '{}'", expected as char, got as char),
            ));
        }
        Ok(())
    }

    // A container's contents become a signature of their own, so they are
    // held to the same length limit.
    fn check_contents(&self, start: usize, end: usize) -> Result<()> {
        if end - start > MAX_SIGNATURE_LEN {
            return Err(self.error(
                start + MAX_SIGNATURE_LEN,
                format!(
                    "container contents are longer than {} bytes",
                    MAX_SIGNATURE_LEN
                ),
            ));
        }
        Ok(())
    }

    fn grab_single_sig(&mut self) -> Result<CompleteType> {
        let start = self.sig_ix;
        let code = self.next_byte()?;
        if let Some(basic) = BasicType::from_code(code) {
            return Ok(CompleteType::Basic(basic));
        }

        match code {
            b'v' => Ok(CompleteType::Variant),
            b'a' => self.grab_array(start),
            b'(' => self.grab_struct(start),
            b'{' => Err(self.error(start, "dict entry must directly follow 'a'")),
            b')' | b'}' => Err(self.error(
                start,
                format!("unbalanced '{}'", code as char),
            )),
            _ => Err(self.error(
                start,
                format!("unrecognized type code '{}'", char::from(code).escape_default()),
            )),
        }
    }

    // The 'a' has already been consumed.
    fn grab_array(&mut self, start: usize) -> Result<CompleteType> {
        if self.array_depth == MAX_NESTING_DEPTH {
            return Err(self.error(start, "arrays nested too deeply"));
        }
        self.array_depth += 1;
        let res = if self.probe_signature_byte(b'{') {
            self.grab_dict_entry(start + 1)
        } else {
            self.grab_single_sig().and_then(|elem| {
                self.check_contents(start + 1, self.sig_ix)?;
                Ok(CompleteType::Array(Box::new(elem)))
            })
        };
        self.array_depth -= 1;
        res
    }

    // The "a{" has already been consumed.
    fn grab_dict_entry(&mut self, start: usize) -> Result<CompleteType> {
        if self.struct_depth == MAX_NESTING_DEPTH {
            return Err(self.error(start, "structs nested too deeply"));
        }
        self.struct_depth += 1;

        let key_ix = self.sig_ix;
        let key = match self.grab_single_sig()? {
            CompleteType::Basic(basic) => basic,
            other => {
                return Err(self.error(
                    key_ix,
                    format!("dict key must be a basic type, found '{}'", other),
                ))
            }
        };
        let value = self.grab_single_sig()?;
        self.check_contents(key_ix, self.sig_ix)?;
        self.expect_signature_byte(b'}')?;

        self.struct_depth -= 1;
        Ok(CompleteType::Dict(key, Box::new(value)))
    }

    // The '(' has already been consumed.
    fn grab_struct(&mut self, start: usize) -> Result<CompleteType> {
        if self.struct_depth == MAX_NESTING_DEPTH {
            return Err(self.error(start, "structs nested too deeply"));
        }
        if self.probe_signature_byte(b')') {
            return Err(self.error(start, "struct must have at least one member"));
        }
        self.struct_depth += 1;

        let mut members = Vec::new();
        while !self.probe_signature_byte(b')') {
            if self.at_end() {
                return Err(self.error(start, "unterminated struct"));
            }
            members.push(self.grab_single_sig()?);
        }
        self.check_contents(start + 1, self.sig_ix - 1)?;

        self.struct_depth -= 1;
        Ok(CompleteType::Struct(members))
    }
}
