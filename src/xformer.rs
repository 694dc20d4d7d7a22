//! Signature-driven transformers.
//!
//! [`xformers`] parses a signature once and compiles every complete type
//! in it into an [`Xformer`], a reusable closure that checks a dynamic
//! [`Value`] against that type and rebuilds it as a [`DbusValue`].
//! Container transformers close over the transformers of their
//! contents; variant transformers compile the signature they are handed
//! each time they run, since it is only known then.
//!
//! Every transformer takes the variant level it is being called at and
//! returns, alongside the typed value, the level it reached. A value in
//! a variant slot is tagged with the level of the slot plus whatever its
//! contents reached; a value outside one is tagged 0 and passes its
//! contents' level up unchanged.

use crate::error::{Error, Result};
use crate::parser::{self, BasicType, CompleteType};
use crate::primitives::{DbusPrimitive, ObjectPath, Signature, UnixFd};
use crate::types::{Data, DbusValue};
use crate::value::Value;

use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type XformFn = dyn Fn(&Value, usize) -> Result<(DbusValue, usize)> + Send + Sync;

/// The transformer for one complete type.
#[derive(Clone)]
pub struct Xformer {
    func: Arc<XformFn>,
    signature: String,
}

impl Xformer {
    /// The complete type this transformer produces values of.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Transforms `value`, returning it with the variant level it reached.
    pub fn transform(&self, value: &Value) -> Result<(DbusValue, usize)> {
        (self.func)(value, 0)
    }
}

impl fmt::Debug for Xformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xformer")
            .field("signature", &self.signature)
            .finish()
    }
}

/// Compiles one transformer per complete type in `signature`, each
/// paired with the part of `signature` it was compiled from.
pub fn xformers(signature: &str) -> Result<Vec<(Xformer, String)>> {
    parser::parse(signature)?
        .into_iter()
        .map(|(ty, matched)| -> Result<(Xformer, String)> {
            let xformer = Xformer {
                func: compile(&ty)?,
                signature: matched.to_owned(),
            };
            Ok((xformer, matched.to_owned()))
        })
        .collect()
}

/// Transforms a whole argument list against a signature.
#[derive(Clone, Debug)]
pub struct SignatureXformer {
    signature: String,
    funcs: Vec<Xformer>,
}

impl SignatureXformer {
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Number of complete types, and so of values `transform` expects.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Transforms each of `objects` by the complete type at its position.
    pub fn transform(&self, objects: &[Value]) -> Result<Vec<DbusValue>> {
        if objects.len() != self.funcs.len() {
            debug!(
                "'{}' expects {} objects, got {}",
                self.signature,
                self.funcs.len(),
                objects.len()
            );
            return Err(Error::unexpected(
                Value::Seq(objects.to_vec()),
                "objects",
                format!(
                    "must have exactly {} items, has {}",
                    self.funcs.len(),
                    objects.len()
                ),
            ));
        }
        self.funcs
            .iter()
            .zip(objects)
            .map(|(func, object)| func.transform(object).map(|(xformed, _)| xformed))
            .collect()
    }
}

/// Compiles `signature` into a single transformer for argument lists.
pub fn xformer(signature: &str) -> Result<SignatureXformer> {
    let funcs = xformers(signature)?.into_iter().map(|(f, _)| f).collect();
    Ok(SignatureXformer {
        signature: signature.to_owned(),
        funcs,
    })
}

fn variant_levels(level: usize, variant: usize) -> (usize, usize) {
    if variant != 0 {
        (level + variant, level + variant)
    } else {
        (0, level)
    }
}

// Level reported by an empty container, which has no contents to ask.
fn empty_level(signature: &str) -> usize {
    if signature.contains('v') {
        1
    } else {
        0
    }
}

fn compile(ty: &CompleteType) -> Result<Arc<XformFn>> {
    trace!("compiling xformer for '{}'", ty);
    match ty {
        CompleteType::Basic(basic) => Ok(compile_basic(*basic)),
        CompleteType::Array(elem) => compile_array(elem),
        CompleteType::Struct(members) => compile_struct(members),
        CompleteType::Dict(key, value) => compile_dict(*key, value),
        CompleteType::Variant => {
            let func: Arc<XformFn> = Arc::new(xform_variant);
            Ok(func)
        }
    }
}

fn basic<T: DbusPrimitive + 'static>() -> Arc<XformFn> {
    Arc::new(|value: &Value, variant: usize| {
        let (obj_level, func_level) = variant_levels(0, variant);
        let data = T::from_value(value)?.into_data();
        Ok((DbusValue::with_variant_level(data, obj_level), func_level))
    })
}

fn compile_basic(basic_type: BasicType) -> Arc<XformFn> {
    match basic_type {
        BasicType::Byte => basic::<u8>(),
        BasicType::Boolean => basic::<bool>(),
        BasicType::Int16 => basic::<i16>(),
        BasicType::UInt16 => basic::<u16>(),
        BasicType::Int32 => basic::<i32>(),
        BasicType::UInt32 => basic::<u32>(),
        BasicType::Int64 => basic::<i64>(),
        BasicType::UInt64 => basic::<u64>(),
        BasicType::Double => basic::<f64>(),
        BasicType::UnixFd => basic::<UnixFd>(),
        BasicType::String => basic::<String>(),
        BasicType::ObjectPath => basic::<ObjectPath>(),
        BasicType::Signature => basic::<Signature>(),
    }
}

fn compile_array(elem: &CompleteType) -> Result<Arc<XformFn>> {
    let elem_func = compile(elem)?;
    let signature = Signature::new(elem.to_string())?;
    let empty = empty_level(signature.as_str());

    let func: Arc<XformFn> = Arc::new(move |value: &Value, variant: usize| {
        if value.is_map() {
            return Err(Error::unexpected(value, "array", "is a dict, must be an array"));
        }
        let items = value
            .as_sequence()
            .ok_or_else(|| Error::unexpected(value, "array", "is not a sequence"))?;

        let elements = items
            .iter()
            .map(|item| elem_func(item, 0))
            .collect::<Result<Vec<_>>>()?;
        let level = elements
            .iter()
            .map(|(_, level)| *level)
            .max()
            .unwrap_or(empty);
        let (obj_level, func_level) = variant_levels(level, variant);

        let data = Data::Array {
            signature: signature.clone(),
            items: elements.into_iter().map(|(x, _)| x).collect(),
        };
        Ok((DbusValue::with_variant_level(data, obj_level), func_level))
    });
    Ok(func)
}

fn compile_struct(members: &[CompleteType]) -> Result<Arc<XformFn>> {
    let funcs = members.iter().map(compile).collect::<Result<Vec<_>>>()?;
    let signature = Signature::new(members.iter().map(ToString::to_string).collect::<String>())?;

    let func: Arc<XformFn> = Arc::new(move |value: &Value, variant: usize| {
        if value.is_map() {
            return Err(Error::unexpected(
                value,
                "struct",
                "must be a simple sequence, is a dict",
            ));
        }
        let items = value
            .as_sequence()
            .ok_or_else(|| Error::unexpected(value, "struct", "is not a sequence"))?;
        if items.len() != funcs.len() {
            debug!("struct of {} members given {} items", funcs.len(), items.len());
            return Err(Error::unexpected(
                value,
                "struct",
                format!(
                    "must have exactly {} items, has {}",
                    funcs.len(),
                    items.len()
                ),
            ));
        }

        let elements = funcs
            .iter()
            .zip(items)
            .map(|(func, item)| func(item, 0))
            .collect::<Result<Vec<_>>>()?;
        let level = elements.iter().map(|(_, level)| *level).max().unwrap_or(0);
        let (obj_level, func_level) = variant_levels(level, variant);

        let data = Data::Struct {
            signature: signature.clone(),
            fields: elements.into_iter().map(|(x, _)| x).collect(),
        };
        Ok((DbusValue::with_variant_level(data, obj_level), func_level))
    });
    Ok(func)
}

// Hashable stand-in for a typed dict key. Keys are always basic, so
// equal keys give equal `KeyIndex`es. NaN has none and never matches.
#[derive(PartialEq, Eq, Hash)]
enum KeyIndex {
    Bool(bool),
    Int(i128),
    Double(u64),
    Text(String),
}

fn key_index(key: &Data) -> Option<KeyIndex> {
    let index = match key {
        Data::Byte(b) => KeyIndex::Int((*b).into()),
        Data::Boolean(b) => KeyIndex::Bool(*b),
        Data::Int16(i) => KeyIndex::Int((*i).into()),
        Data::UInt16(i) => KeyIndex::Int((*i).into()),
        Data::Int32(i) => KeyIndex::Int((*i).into()),
        Data::UInt32(i) | Data::UnixFd(i) => KeyIndex::Int((*i).into()),
        Data::Int64(i) => KeyIndex::Int((*i).into()),
        Data::UInt64(i) => KeyIndex::Int((*i).into()),
        Data::Double(f) if f.is_nan() => return None,
        // -0.0 == 0.0
        Data::Double(f) => KeyIndex::Double((f + 0.0).to_bits()),
        Data::String(s) => KeyIndex::Text(s.clone()),
        Data::ObjectPath(path) => KeyIndex::Text(path.as_str().to_owned()),
        Data::Signature(sig) => KeyIndex::Text(sig.as_str().to_owned()),
        Data::Array { .. } | Data::Struct { .. } | Data::Dictionary { .. } => return None,
    };
    Some(index)
}

fn compile_dict(key: BasicType, value_type: &CompleteType) -> Result<Arc<XformFn>> {
    let key_func = compile_basic(key);
    let value_func = compile(value_type)?;
    let signature = Signature::new(format!("{}{}", key.code(), value_type))?;
    let empty = empty_level(signature.as_str());

    let func: Arc<XformFn> = Arc::new(move |value: &Value, variant: usize| {
        let pairs = value.as_pairs().ok_or_else(|| {
            Error::unexpected(value, "dict", "does not consist of key/value pairs")
        })?;

        let mut level = None;
        let mut entries: Vec<(DbusValue, DbusValue)> = Vec::with_capacity(pairs.len());
        let mut positions = HashMap::with_capacity(pairs.len());
        for (k, v) in pairs {
            let (k, k_level) = key_func(k, 0)?;
            let (v, v_level) = value_func(v, 0)?;
            level = level.max(Some(k_level.max(v_level)));
            let index = key_index(&k.data);
            let existing: Option<usize> = index.as_ref().and_then(|index| positions.get(index)).copied();
            match existing {
                Some(pos) => entries[pos].1 = v,
                None => {
                    if let Some(index) = index {
                        positions.insert(index, entries.len());
                    }
                    entries.push((k, v));
                }
            }
        }
        let (obj_level, func_level) = variant_levels(level.unwrap_or(empty), variant);

        let data = Data::Dictionary {
            signature: signature.clone(),
            entries,
        };
        Ok((DbusValue::with_variant_level(data, obj_level), func_level))
    });
    Ok(func)
}

fn xform_variant(value: &Value, variant: usize) -> Result<(DbusValue, usize)> {
    let (signature, object) = match value.as_sequence() {
        Some([Value::Str(signature), object]) => (signature, object),
        _ => {
            return Err(Error::unexpected(
                value,
                "variant",
                "must be a (signature, value) pair",
            ))
        }
    };

    let func = parser::parse_single(signature)
        .and_then(|ty| compile(&ty))
        .map_err(|err| {
            debug!("variant signature '{}' is unusable: {}", signature, err);
            Error::unexpected(value, "variant", format!("has an unusable signature: {}", err))
        })?;
    trace!("variant of '{}' at level {}", signature, variant + 1);

    let (xformed, _) = func(object, variant + 1)?;
    let level = xformed.variant_level;
    Ok((xformed, level))
}
