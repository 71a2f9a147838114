//! Value codec.
//!
//! The backing store represents numbers as arbitrary-precision decimal text.
//! Binary floating-point values must cross that boundary as an exact decimal
//! rendering, or the store's own decimal type silently reinterprets the
//! round-off. Integers pass through unchanged.

use crate::error::{Error, Result};
use crate::store::Point;

/// In-memory numeric value of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// Wire representation of a numeric field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Integer(i64),
    /// Decimal text, the way the backend's number type carries it.
    Decimal(String),
}

/// A raw stored row, fields still in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub tag: String,
    pub timestamp: WireValue,
    pub value: WireValue,
}

/// Encode an in-memory value for transmission.
///
/// Floats are rendered with the shortest decimal form that parses back to
/// the identical `f64`, so `decode(encode(v)) == v` for every finite value.
pub fn encode(value: &Value) -> WireValue {
    match value {
        Value::Integer(i) => WireValue::Integer(*i),
        Value::Float(f) => WireValue::Decimal(format!("{f}")),
    }
}

/// Decode a wire value back to its in-memory form.
pub fn decode(wire: &WireValue) -> Result<Value> {
    match wire {
        WireValue::Integer(i) => Ok(Value::Integer(*i)),
        WireValue::Decimal(text) => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::Codec(format!("not a decimal number: {text}"))),
    }
}

pub fn encode_point(point: &Point) -> RawItem {
    // Timestamps past i64::MAX travel as decimal text, which the wire's
    // number type carries anyway.
    let timestamp = match i64::try_from(point.timestamp_ms) {
        Ok(i) => WireValue::Integer(i),
        Err(_) => WireValue::Decimal(point.timestamp_ms.to_string()),
    };
    RawItem {
        tag: point.tag.clone(),
        timestamp,
        value: encode(&point.value),
    }
}

/// Decode a stored row, coercing the timestamp field back to an integer.
pub fn decode_point(raw: &RawItem) -> Result<Point> {
    let timestamp_ms = match &raw.timestamp {
        WireValue::Integer(i) if *i >= 0 => *i as u64,
        WireValue::Integer(i) => {
            return Err(Error::Codec(format!("negative timestamp: {i}")));
        }
        WireValue::Decimal(text) => text
            .parse::<u64>()
            .map_err(|_| Error::Codec(format!("not a timestamp: {text}")))?,
    };
    Ok(Point {
        tag: raw.tag.clone(),
        timestamp_ms,
        value: decode(&raw.value)?,
    })
}
