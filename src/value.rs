//! Typed view over decoded JSON values.
//!
//! Provides the JSON Schema type lattice (where `integer` is a refinement of
//! `number`), structural equality with value-based numeric comparison, and
//! the exact numeric predicates used by the numeric keywords.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Number, Value};

/// A JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Boolean,
    Number,
    Integer,
    String,
    Array,
    Object,
}

impl Type {
    /// The type of an instance. Never returns `Integer`; integrality of a
    /// number is decided separately against the instance value.
    pub fn of(v: &Value) -> Type {
        match v {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Boolean,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Array(_) => Type::Array,
            Value::Object(_) => Type::Object,
        }
    }

    pub(crate) fn from_keyword(s: &str) -> Option<Type> {
        match s {
            "null" => Some(Type::Null),
            "boolean" => Some(Type::Boolean),
            "number" => Some(Type::Number),
            "integer" => Some(Type::Integer),
            "string" => Some(Type::String),
            "array" => Some(Type::Array),
            "object" => Some(Type::Object),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Boolean => "boolean",
            Type::Number => "number",
            Type::Integer => "integer",
            Type::String => "string",
            Type::Array => "array",
            Type::Object => "object",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`Type`]s, as written in a `type` keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Types(u8);

const ALL_TYPES: [Type; 7] = [
    Type::Null,
    Type::Boolean,
    Type::Number,
    Type::Integer,
    Type::String,
    Type::Array,
    Type::Object,
];

fn bit(t: Type) -> u8 {
    match t {
        Type::Null => 1,
        Type::Boolean => 1 << 1,
        Type::Number => 1 << 2,
        Type::Integer => 1 << 3,
        Type::String => 1 << 4,
        Type::Array => 1 << 5,
        Type::Object => 1 << 6,
    }
}

impl Types {
    pub(crate) fn add(&mut self, t: Type) {
        self.0 |= bit(t);
    }

    pub fn contains(&self, t: Type) -> bool {
        self.0 & bit(t) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Type> + '_ {
        ALL_TYPES.into_iter().filter(|t| self.contains(*t))
    }

    /// Whether an instance of value `v` satisfies this type set.
    pub(crate) fn matches(&self, v: &Value) -> bool {
        let t = Type::of(v);
        if self.contains(t) {
            return true;
        }
        // integral numbers satisfy "integer"
        t == Type::Number
            && self.contains(Type::Integer)
            && matches!(v, Value::Number(n) if is_integer(n))
    }
}

impl fmt::Display for Types {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for t in self.iter() {
            if !first {
                f.write_str(" or ")?;
            }
            write!(f, "{t}")?;
            first = false;
        }
        Ok(())
    }
}

/// Structural deep equality. Numbers compare by mathematical value, so
/// `1`, `1.0` and `1e0` are all equal.
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => num_eq(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(i, j)| equals(i, j))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| equals(v, w)))
        }
        _ => false,
    }
}

fn as_i128(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        Some(i as i128)
    } else {
        n.as_u64().map(|u| u as i128)
    }
}

/// Whether the number is mathematically an integer.
pub(crate) fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

pub(crate) fn num_eq(a: &Number, b: &Number) -> bool {
    num_cmp(a, b) == Ordering::Equal
}

/// Total order on JSON numbers by mathematical value. Integer operands
/// compare exactly over `i128`; an integer and a float compare exactly when
/// the float carries an integral value.
pub(crate) fn num_cmp(a: &Number, b: &Number) -> Ordering {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(x), None) => int_float_cmp(x, b),
        (None, Some(y)) => int_float_cmp(y, a).reverse(),
        (None, None) => {
            let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}

fn int_float_cmp(x: i128, f: &Number) -> Ordering {
    let y = f.as_f64().unwrap_or(0.0);
    if y.is_finite() && y.fract() == 0.0 && y.abs() < (i128::MAX as f64) {
        return x.cmp(&(y as i128));
    }
    (x as f64).partial_cmp(&y).unwrap_or(Ordering::Equal)
}

// Tolerance for the fractional remainder of a float division. Decimal
// factors such as 0.0001 are not representable in binary, so an exact
// fract() == 0 test would reject true multiples.
const MULTIPLE_EPSILON: f64 = 1e-9;

/// Check used by `multipleOf`. Integer operands divide over `i128`; float
/// quotients must land within [`MULTIPLE_EPSILON`] of a whole number.
pub(crate) fn multiple_of(v: &Number, m: &Number) -> bool {
    if let (Some(x), Some(y)) = (as_i128(v), as_i128(m)) {
        return y != 0 && x % y == 0;
    }
    let (x, y) = match (v.as_f64(), m.as_f64()) {
        (Some(x), Some(y)) if y != 0.0 => (x, y),
        _ => return false,
    };
    let q = x / y;
    if !q.is_finite() {
        return false;
    }
    let r = q.fract().abs();
    r < MULTIPLE_EPSILON || (1.0 - r) < MULTIPLE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_of_values() {
        assert_eq!(Type::of(&json!(null)), Type::Null);
        assert_eq!(Type::of(&json!(3.5)), Type::Number);
        assert_eq!(Type::of(&json!({})), Type::Object);
    }

    #[test]
    fn integer_matching() {
        let mut ts = Types::default();
        ts.add(Type::Integer);
        assert!(ts.matches(&json!(2)));
        assert!(ts.matches(&json!(2.0)));
        assert!(!ts.matches(&json!(2.5)));
        assert!(!ts.matches(&json!("2")));
    }

    #[test]
    fn equality_is_structural() {
        assert!(equals(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!equals(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn equality_symmetric_and_transitive() {
        let a = json!(1);
        let b = json!(1.0);
        let c = json!(1e0);
        assert!(equals(&a, &b) && equals(&b, &a));
        assert!(equals(&b, &c) && equals(&a, &c));
    }

    #[test]
    fn numeric_ordering() {
        let n = |v: &str| serde_json::from_str::<Number>(v).unwrap();
        assert_eq!(num_cmp(&n("3"), &n("3.0")), Ordering::Equal);
        assert_eq!(num_cmp(&n("2"), &n("2.5")), Ordering::Less);
        assert_eq!(num_cmp(&n("-1"), &n("18446744073709551615")), Ordering::Less);
    }

    #[test]
    fn multiples() {
        let n = |v: &str| serde_json::from_str::<Number>(v).unwrap();
        assert!(multiple_of(&n("10"), &n("2")));
        assert!(!multiple_of(&n("10"), &n("3")));
        assert!(multiple_of(&n("4.5"), &n("1.5")));
        assert!(multiple_of(&n("0.0075"), &n("0.0001")));
        assert!(!multiple_of(&n("0.00751"), &n("0.0001")));
        // float division overflowing to infinity is not a multiple
        assert!(!multiple_of(&n("1e308"), &n("1e-308")));
    }
}
