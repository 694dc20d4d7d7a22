//! Recovering the signature of a typed value.

use crate::error::{Error, Result};
use crate::types::{Data, DbusValue};

use std::collections::BTreeSet;

/// The signature of `value`, with variant levels left in place.
///
/// For values produced by a transformer this inverts the transformer:
/// the signature of the result of transforming against `sig` is `sig`.
pub fn signature(value: &DbusValue) -> Result<String> {
    signature_stripped(value, 0)
}

/// The signature of `value`, with up to `strip_variant_levels` levels of
/// variant wrapping looked through.
///
/// A value sitting in more variant levels than may be stripped is just
/// `v`. Empty containers are described by the signature they store, so
/// nothing is stripped inside them.
pub fn signature_stripped(value: &DbusValue, strip_variant_levels: usize) -> Result<String> {
    let mut strip = strip_variant_levels;
    if value.variant_level != 0 {
        if strip < value.variant_level {
            return Ok("v".to_owned());
        }
        strip -= value.variant_level;
    }

    let sig = match &value.data {
        Data::Byte(_) => "y".to_owned(),
        Data::Boolean(_) => "b".to_owned(),
        Data::Int16(_) => "n".to_owned(),
        Data::UInt16(_) => "q".to_owned(),
        Data::Int32(_) => "i".to_owned(),
        Data::UInt32(_) => "u".to_owned(),
        Data::Int64(_) => "x".to_owned(),
        Data::UInt64(_) => "t".to_owned(),
        Data::Double(_) => "d".to_owned(),
        Data::UnixFd(_) => "h".to_owned(),
        Data::String(_) => "s".to_owned(),
        Data::ObjectPath(_) => "o".to_owned(),
        Data::Signature(_) => "g".to_owned(),
        Data::Array { signature, items } => {
            match single_signature(value, "elements", items.iter(), strip)? {
                Some(elem) => format!("a{}", elem),
                None => format!("a{}", signature),
            }
        }
        Data::Struct { fields, .. } => {
            if fields.is_empty() {
                return Err(Error::Signature {
                    value: value.to_string(),
                    msg: "struct has no fields".to_owned(),
                });
            }
            let members = fields
                .iter()
                .map(|field| signature_stripped(field, strip))
                .collect::<Result<String>>()?;
            format!("({})", members)
        }
        Data::Dictionary { signature, entries } => {
            let key = single_signature(value, "keys", entries.iter().map(|(k, _)| k), strip)?;
            let val = single_signature(value, "values", entries.iter().map(|(_, v)| v), strip)?;
            match (key, val) {
                (Some(key), Some(val)) => format!("a{{{}{}}}", key, val),
                _ => format!("a{{{}}}", signature),
            }
        }
    };
    Ok(sig)
}

// The one signature shared by `items`, or None if there are no items.
fn single_signature<'a>(
    container: &DbusValue,
    what: &str,
    items: impl Iterator<Item = &'a DbusValue>,
    strip: usize,
) -> Result<Option<String>> {
    let sigs = items
        .map(|item| signature_stripped(item, strip))
        .collect::<Result<BTreeSet<String>>>()?;
    if sigs.len() > 1 {
        return Err(Error::Signature {
            value: container.to_string(),
            msg: format!(
                "{} have differing signatures: {}",
                what,
                sigs.into_iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }
    Ok(sigs.into_iter().next())
}
