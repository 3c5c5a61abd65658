// JSON-safe conversion
//
// Handler results are lowered into a closed set of shapes and then
// visited recursively into a serde_json::Value. Values with their own
// to-JSON hook (dates, money, anything Serialize) are converted first and
// the result is visited again. Serialize values are lowered field by field,
// so one bad field never costs the rest of the payload.

use crate::model::format_timestamp;
use chrono::{DateTime, Utc};
use serde::ser::{self, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

// ============================================================================
// SHAPES
// ============================================================================

pub enum Shape {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integers wider than the JSON number range; rendered as decimal text.
    BigInt(i128),
    Text(String),
    List(Vec<Shape>),
    Map(Vec<(String, Shape)>),
    /// Value with a custom to-JSON hook
    Custom(Box<dyn ToJson + Send>),
    /// Anything else, already reduced to its string form
    Opaque(String),
}

/// Custom to-JSON hook.
pub trait ToJson {
    fn to_json(&self) -> Shape;
}

/// Lowering of a Rust value into a `Shape`.
pub trait IntoShape {
    fn into_shape(self) -> Shape;
}

impl Shape {
    /// Wrap a `Serialize` value so its serde representation is used as its
    /// to-JSON hook.
    pub fn serialized<T>(value: T) -> Shape
    where
        T: Serialize + Send + 'static,
    {
        Shape::Custom(Box::new(Serialized(value)))
    }

    pub fn display(value: impl std::fmt::Display) -> Shape {
        Shape::Opaque(value.to_string())
    }
}

// ============================================================================
// VISITOR
// ============================================================================

pub fn to_json_value(shape: Shape) -> Value {
    match shape {
        Shape::Null => Value::Null,
        Shape::Bool(b) => Value::Bool(b),
        Shape::Int(i) => Value::Number(i.into()),
        // JSON has no NaN/Infinity; they render as null like JSON.stringify
        Shape::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        Shape::BigInt(i) => Value::String(i.to_string()),
        Shape::Text(s) => Value::String(s),
        Shape::List(items) => Value::Array(items.into_iter().map(to_json_value).collect()),
        Shape::Map(entries) => {
            let mut out = Map::new();
            for (key, value) in entries {
                out.insert(key, to_json_value(value));
            }
            Value::Object(out)
        }
        Shape::Custom(hook) => to_json_value(hook.to_json()),
        Shape::Opaque(s) => Value::String(s),
    }
}

/// Lower a parsed JSON value back into shapes. Unsigned numbers past
/// `i64::MAX` become big integers so they keep every digit.
fn shape_of_value(value: Value) -> Shape {
    match value {
        Value::Null => Shape::Null,
        Value::Bool(b) => Shape::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Shape::Int(i)
            } else if let Some(u) = n.as_u64() {
                Shape::BigInt(u as i128)
            } else {
                Shape::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Shape::Text(s),
        Value::Array(items) => Shape::List(items.into_iter().map(shape_of_value).collect()),
        Value::Object(map) => Shape::Map(
            map.into_iter()
                .map(|(k, v)| (k, shape_of_value(v)))
                .collect(),
        ),
    }
}

struct Serialized<T>(T);

impl<T: Serialize> ToJson for Serialized<T> {
    fn to_json(&self) -> Shape {
        lower_leaf(&self.0)
    }
}

/// Lower one `Serialize` value. A failure replaces only this value with
/// its type name; siblings and parents are unaffected.
fn lower_leaf<T: ?Sized + Serialize>(value: &T) -> Shape {
    match value.serialize(ShapeSerializer) {
        Ok(shape) => shape,
        Err(err) => {
            tracing::warn!(error = %err, "value could not be serialized, degrading to string");
            Shape::Opaque(std::any::type_name::<T>().to_string())
        }
    }
}

/// JSON object keys are strings; any other key renders as its JSON text.
fn key_text(key: Shape) -> String {
    match to_json_value(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn int_shape(value: i128) -> Shape {
    match i64::try_from(value) {
        Ok(i) => Shape::Int(i),
        Err(_) => Shape::BigInt(value),
    }
}

// ============================================================================
// SERDE BRIDGE
// ============================================================================

#[derive(Debug, Error)]
#[error("{0}")]
struct LowerError(String);

impl ser::Error for LowerError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        LowerError(msg.to_string())
    }
}

/// Serializer whose output is a `Shape`, following serde_json's data model
/// except that integers of any width are kept.
struct ShapeSerializer;

struct SeqLowering {
    items: Vec<Shape>,
}

struct MapLowering {
    entries: Vec<(String, Shape)>,
    next_key: Option<String>,
}

/// Externally tagged enum variant: `{"Variant": inner}`
struct Tagged<I> {
    variant: &'static str,
    inner: I,
}

impl SeqLowering {
    fn new(len: Option<usize>) -> Self {
        SeqLowering {
            items: Vec::with_capacity(len.unwrap_or(0)),
        }
    }
}

impl MapLowering {
    fn new(len: Option<usize>) -> Self {
        MapLowering {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            next_key: None,
        }
    }
}

impl ser::Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = LowerError;
    type SerializeSeq = SeqLowering;
    type SerializeTuple = SeqLowering;
    type SerializeTupleStruct = SeqLowering;
    type SerializeTupleVariant = Tagged<SeqLowering>;
    type SerializeMap = MapLowering;
    type SerializeStruct = MapLowering;
    type SerializeStructVariant = Tagged<MapLowering>;

    fn serialize_bool(self, v: bool) -> Result<Shape, LowerError> {
        Ok(Shape::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Shape, LowerError> {
        Ok(int_shape(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Shape, LowerError> {
        Ok(Shape::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Shape, LowerError> {
        Ok(int_shape(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Shape, LowerError> {
        Ok(match i128::try_from(v) {
            Ok(i) => int_shape(i),
            Err(_) => Shape::Opaque(v.to_string()),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Shape, LowerError> {
        Ok(Shape::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Shape, LowerError> {
        Ok(Shape::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Shape, LowerError> {
        Ok(Shape::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Shape, LowerError> {
        Ok(Shape::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Shape, LowerError> {
        Ok(Shape::List(v.iter().map(|b| Shape::Int((*b).into())).collect()))
    }

    fn serialize_none(self) -> Result<Shape, LowerError> {
        Ok(Shape::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Shape, LowerError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, LowerError> {
        Ok(Shape::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Shape, LowerError> {
        Ok(Shape::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Shape, LowerError> {
        Ok(Shape::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Shape, LowerError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Shape, LowerError> {
        Ok(Shape::Map(vec![(variant.to_string(), lower_leaf(value))]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqLowering, LowerError> {
        Ok(SeqLowering::new(len))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqLowering, LowerError> {
        Ok(SeqLowering::new(Some(len)))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqLowering, LowerError> {
        Ok(SeqLowering::new(Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Tagged<SeqLowering>, LowerError> {
        Ok(Tagged {
            variant,
            inner: SeqLowering::new(Some(len)),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapLowering, LowerError> {
        Ok(MapLowering::new(len))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapLowering, LowerError> {
        Ok(MapLowering::new(Some(len)))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Tagged<MapLowering>, LowerError> {
        Ok(Tagged {
            variant,
            inner: MapLowering::new(Some(len)),
        })
    }
}

impl ser::SerializeSeq for SeqLowering {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), LowerError> {
        self.items.push(lower_leaf(value));
        Ok(())
    }

    fn end(self) -> Result<Shape, LowerError> {
        Ok(Shape::List(self.items))
    }
}

impl ser::SerializeTuple for SeqLowering {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), LowerError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, LowerError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqLowering {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), LowerError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Shape, LowerError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for Tagged<SeqLowering> {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), LowerError> {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<Shape, LowerError> {
        Ok(Shape::Map(vec![(
            self.variant.to_string(),
            Shape::List(self.inner.items),
        )]))
    }
}

impl ser::SerializeMap for MapLowering {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), LowerError> {
        self.next_key = Some(key_text(lower_leaf(key)));
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), LowerError> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| LowerError("map value serialized before its key".to_string()))?;
        self.entries.push((key, lower_leaf(value)));
        Ok(())
    }

    fn end(self) -> Result<Shape, LowerError> {
        Ok(Shape::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapLowering {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), LowerError> {
        self.entries.push((key.to_string(), lower_leaf(value)));
        Ok(())
    }

    fn end(self) -> Result<Shape, LowerError> {
        Ok(Shape::Map(self.entries))
    }
}

impl ser::SerializeStructVariant for Tagged<MapLowering> {
    type Ok = Shape;
    type Error = LowerError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), LowerError> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Shape, LowerError> {
        Ok(Shape::Map(vec![(
            self.variant.to_string(),
            Shape::Map(self.inner.entries),
        )]))
    }
}

// ============================================================================
// LOWERINGS
// ============================================================================

impl IntoShape for Shape {
    fn into_shape(self) -> Shape {
        self
    }
}

impl IntoShape for bool {
    fn into_shape(self) -> Shape {
        Shape::Bool(self)
    }
}

impl IntoShape for i32 {
    fn into_shape(self) -> Shape {
        Shape::Int(self as i64)
    }
}

impl IntoShape for i64 {
    fn into_shape(self) -> Shape {
        Shape::Int(self)
    }
}

impl IntoShape for u32 {
    fn into_shape(self) -> Shape {
        Shape::Int(self as i64)
    }
}

impl IntoShape for u64 {
    fn into_shape(self) -> Shape {
        match i64::try_from(self) {
            Ok(i) => Shape::Int(i),
            Err(_) => Shape::BigInt(self as i128),
        }
    }
}

impl IntoShape for usize {
    fn into_shape(self) -> Shape {
        (self as u64).into_shape()
    }
}

impl IntoShape for i128 {
    fn into_shape(self) -> Shape {
        Shape::BigInt(self)
    }
}

impl IntoShape for u128 {
    fn into_shape(self) -> Shape {
        match i128::try_from(self) {
            Ok(i) => Shape::BigInt(i),
            Err(_) => Shape::Opaque(self.to_string()),
        }
    }
}

impl IntoShape for f64 {
    fn into_shape(self) -> Shape {
        Shape::Float(self)
    }
}

impl IntoShape for String {
    fn into_shape(self) -> Shape {
        Shape::Text(self)
    }
}

impl IntoShape for &str {
    fn into_shape(self) -> Shape {
        Shape::Text(self.to_string())
    }
}

impl IntoShape for Value {
    fn into_shape(self) -> Shape {
        shape_of_value(self)
    }
}

impl IntoShape for DateTime<Utc> {
    fn into_shape(self) -> Shape {
        Shape::Custom(Box::new(self))
    }
}

impl ToJson for DateTime<Utc> {
    fn to_json(&self) -> Shape {
        Shape::Text(format_timestamp(self))
    }
}

impl<T: IntoShape> IntoShape for Option<T> {
    fn into_shape(self) -> Shape {
        match self {
            Some(value) => value.into_shape(),
            None => Shape::Null,
        }
    }
}

impl<T: IntoShape> IntoShape for Vec<T> {
    fn into_shape(self) -> Shape {
        Shape::List(self.into_iter().map(IntoShape::into_shape).collect())
    }
}

impl<T: IntoShape> IntoShape for BTreeMap<String, T> {
    fn into_shape(self) -> Shape {
        Shape::Map(self.into_iter().map(|(k, v)| (k, v.into_shape())).collect())
    }
}

impl<T: IntoShape> IntoShape for HashMap<String, T> {
    fn into_shape(self) -> Shape {
        Shape::Map(self.into_iter().map(|(k, v)| (k, v.into_shape())).collect())
    }
}
