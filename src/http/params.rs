//! Query parameters.
//!
//! Callers hand over scalar values; big integers (`i128`/`u128`) are narrowed
//! to the nearest `f64` before they reach the wire, matching what JSON API
//! servers built around IEEE-754 numbers expect.
//!
//! # Known limitation
//!
//! The narrowing is lossy above [`MAX_SAFE_INTEGER`]: `2^64` goes out as
//! `18446744073709552000`. Values that must survive exactly should be sent
//! as strings.

use std::fmt;
use url::Url;

/// Largest integer an `f64` represents exactly (`2^53 - 1`).
pub const MAX_SAFE_INTEGER: i128 = 9_007_199_254_740_991;

/// A scalar query-parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Serialized as an empty value (`key=`).
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Arbitrary-precision integer; narrowed to `Float` before sending.
    BigInt(i128),
    /// Arbitrary-precision unsigned integer; narrowed to `Float` before sending.
    BigUInt(u128),
    Str(String),
}

impl QueryParam {
    /// True for the variants [`coerce`](Self::coerce) narrows.
    pub fn is_big_integer(&self) -> bool {
        matches!(self, QueryParam::BigInt(_) | QueryParam::BigUInt(_))
    }

    /// True if narrowing this value to `f64` can change it.
    pub fn exceeds_safe_integer(&self) -> bool {
        match *self {
            QueryParam::BigInt(v) => v.unsigned_abs() > MAX_SAFE_INTEGER as u128,
            QueryParam::BigUInt(v) => v > MAX_SAFE_INTEGER as u128,
            _ => false,
        }
    }

    /// Narrow big integers to the nearest `f64`; other values pass through.
    pub fn coerce(self) -> QueryParam {
        match self {
            QueryParam::BigInt(v) => QueryParam::Float(v as f64),
            QueryParam::BigUInt(v) => QueryParam::Float(v as f64),
            other => other,
        }
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::Null => Ok(()),
            QueryParam::Bool(b) => write!(f, "{b}"),
            QueryParam::Int(v) => write!(f, "{v}"),
            QueryParam::UInt(v) => write!(f, "{v}"),
            QueryParam::Float(v) if v.is_nan() => f.write_str("NaN"),
            QueryParam::Float(v) if v.is_infinite() => {
                f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            QueryParam::Float(v) => write!(f, "{v}"),
            QueryParam::BigInt(v) => write!(f, "{v}"),
            QueryParam::BigUInt(v) => write!(f, "{v}"),
            QueryParam::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for QueryParam {
            fn from(v: $ty) -> Self {
                QueryParam::$variant(v.into())
            }
        })*
    };
}

impl_from!(
    bool => Bool,
    i8 => Int, i16 => Int, i32 => Int, i64 => Int,
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt,
    f32 => Float, f64 => Float,
    i128 => BigInt, u128 => BigUInt,
    String => Str, &str => Str,
);

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(QueryParam::Null, Into::into)
    }
}

/// Narrow every big-integer parameter, logging the ones that lose precision.
pub fn coerce_params(params: &[(String, QueryParam)]) -> Vec<(String, QueryParam)> {
    params
        .iter()
        .map(|(key, value)| {
            if value.exceeds_safe_integer() {
                let narrowed = value.clone().coerce();
                tracing::warn!(
                    param = %key,
                    original = %value,
                    narrowed = %narrowed,
                    "query parameter exceeds the safe integer range and was narrowed"
                );
                (key.clone(), narrowed)
            } else {
                (key.clone(), value.clone().coerce())
            }
        })
        .collect()
}

/// Replace the query of `url` with `params`, in order. An empty parameter
/// list leaves the URL untouched.
pub fn apply_query(url: &mut Url, params: &[(String, QueryParam)]) {
    if params.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (key, value) in params {
        pairs.append_pair(key, &value.to_string());
    }
}
