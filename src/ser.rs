use crate::error::{Error, Result};
use crate::value::Value;

use serde::{ser, Serialize};

pub mod serializer_policy;

use serializer_policy::{DefaultSerializerPolicy, SerializerPolicy, StructStyle};

/// This is the entry point to the serializer. It turns any `Serialize`
/// type into a [`Value`], ready to be handed to a transformer. Under the
/// default policy, [`DefaultSerializerPolicy`], tuples and tuple structs
/// become [`Value::Tuple`]s, fitting a `(...)` signature, while structs
/// with named fields become a [`Value::Map`] from field name to field
/// value.
///
/// To always use tuples instead, use [`StronglyTypedSerializerPolicy`].
/// To decide struct by struct, use [`TupleStructsPolicy`] or write a
/// custom [`SerializerPolicy`].
///
/// [`DefaultSerializerPolicy`]: serializer_policy::DefaultSerializerPolicy
/// [`StronglyTypedSerializerPolicy`]: serializer_policy::StronglyTypedSerializerPolicy
/// [`TupleStructsPolicy`]: serializer_policy::TupleStructsPolicy
/// [`SerializerPolicy`]: serializer_policy::SerializerPolicy
pub fn to_value_with_policy(value: impl Serialize, config: impl SerializerPolicy) -> Result<Value> {
    value.serialize(Serializer { config })
}

/// This is a convenience function that simply calls [`to_value_with_policy`]
/// with the default policy.
///
/// [`to_value_with_policy`]: to_value_with_policy
pub fn to_value(value: impl Serialize) -> Result<Value> {
    to_value_with_policy(value, DefaultSerializerPolicy)
}

fn unit() -> Value {
    Value::Tuple(Vec::new())
}

fn tagged(variant: &'static str, value: Value) -> Value {
    Value::Map(vec![(Value::Str(variant.to_owned()), value)])
}

struct Serializer<T: SerializerPolicy> {
    config: T,
}

impl<C: SerializerPolicy> Serializer<C> {
    fn nested<T>(&self, value: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(Serializer {
            config: self.config.clone(),
        })
    }
}

impl<C: SerializerPolicy> ser::Serializer for Serializer<C> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSeq<C>;
    type SerializeTuple = SerializeSeq<C>;
    type SerializeTupleStruct = SerializeSeq<C>;
    type SerializeTupleVariant = SerializeSeq<C>;
    type SerializeMap = SerializeMap<C>;
    type SerializeStruct = SerializeStruct<C>;
    type SerializeStructVariant = SerializeStruct<C>;

    fn serialize_bool(self, val: bool) -> Result<Value> {
        Ok(Value::Bool(val))
    }

    fn serialize_i8(self, val: i8) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_i16(self, val: i16) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_i32(self, val: i32) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_i64(self, val: i64) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_i128(self, val: i128) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_u8(self, val: u8) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_u16(self, val: u16) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_u32(self, val: u32) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_u64(self, val: u64) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_f32(self, val: f32) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_f64(self, val: f64) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_char(self, val: char) -> Result<Value> {
        Ok(Value::Str(val.to_string()))
    }

    fn serialize_str(self, val: &str) -> Result<Value> {
        Ok(val.into())
    }

    fn serialize_bytes(self, val: &[u8]) -> Result<Value> {
        Ok(Value::Seq(val.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, val: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        val.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(unit())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Value> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        variant_index: u32,
        _: &'static str,
    ) -> Result<Value> {
        variant_index.serialize(self)
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: Serialize + ?Sized,
    {
        Ok(tagged(variant, self.nested(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeSeq {
            items: Vec::with_capacity(len.unwrap_or(0)),
            kind: SeqKind::Seq,
            config: self.config,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        Ok(SerializeSeq {
            items: Vec::with_capacity(len),
            kind: SeqKind::Tuple,
            config: self.config,
        })
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeSeq {
            items: Vec::with_capacity(len),
            kind: SeqKind::TupleVariant(variant),
            config: self.config,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeMap {
            pairs: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
            config: self.config,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        let style = self.config.struct_style(name);
        Ok(SerializeStruct {
            fields: Vec::with_capacity(len),
            style,
            variant: None,
            config: self.config,
        })
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeStruct {
            fields: Vec::with_capacity(len),
            style: StructStyle::Map,
            variant: Some(variant),
            config: self.config,
        })
    }
}

enum SeqKind {
    Seq,
    Tuple,
    TupleVariant(&'static str),
}

struct SerializeSeq<T: SerializerPolicy> {
    items: Vec<Value>,
    kind: SeqKind,
    config: T,
}

impl<C: SerializerPolicy> SerializeSeq<C> {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let item = value.serialize(Serializer {
            config: self.config.clone(),
        })?;
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        Ok(match self.kind {
            SeqKind::Seq => Value::Seq(self.items),
            SeqKind::Tuple => Value::Tuple(self.items),
            SeqKind::TupleVariant(variant) => tagged(variant, Value::Tuple(self.items)),
        })
    }
}

impl<C: SerializerPolicy> ser::SerializeSeq for SerializeSeq<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl<C: SerializerPolicy> ser::SerializeTuple for SerializeSeq<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl<C: SerializerPolicy> ser::SerializeTupleStruct for SerializeSeq<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl<C: SerializerPolicy> ser::SerializeTupleVariant for SerializeSeq<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

struct SerializeMap<T: SerializerPolicy> {
    pairs: Vec<(Value, Value)>,
    pending_key: Option<Value>,
    config: T,
}

impl<C: SerializerPolicy> ser::SerializeMap for SerializeMap<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = key.serialize(Serializer {
            config: self.config.clone(),
        })?;
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::Serializing("map value without a key".to_owned()))?;
        let value = value.serialize(Serializer {
            config: self.config.clone(),
        })?;
        self.pairs.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.pairs))
    }
}

struct SerializeStruct<T: SerializerPolicy> {
    fields: Vec<(&'static str, Value)>,
    style: StructStyle,
    variant: Option<&'static str>,
    config: T,
}

impl<C: SerializerPolicy> SerializeStruct<C> {
    fn push<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = value.serialize(Serializer {
            config: self.config.clone(),
        })?;
        // Optional fields are dropped from maps, never from tuples.
        if self.style == StructStyle::Map
            && self.config.skip_empty_fields()
            && value == unit()
        {
            return Ok(());
        }
        self.fields.push((name, value));
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        let value = match self.style {
            StructStyle::Tuple => {
                Value::Tuple(self.fields.into_iter().map(|(_, v)| v).collect())
            }
            StructStyle::Map => Value::Map(
                self.fields
                    .into_iter()
                    .map(|(name, v)| (Value::Str(name.to_owned()), v))
                    .collect(),
            ),
        };
        Ok(match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        })
    }
}

impl<C: SerializerPolicy> ser::SerializeStruct for SerializeStruct<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(name, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl<C: SerializerPolicy> ser::SerializeStructVariant for SerializeStruct<C> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(name, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}
