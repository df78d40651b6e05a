//! Compile-time values of constants, as handed to the expression evaluator.

use std::fmt;

/// A constant value. Arithmetic on these belongs to the expression evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i128),
    /// Exact rational number, kept as numerator and non-zero denominator.
    Rational(i128, i128),
    String(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; rationals qualify when their denominator divides the numerator.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Integer(x) => Some(*x),
            Value::Rational(n, d) if *d != 0 && n % d == 0 => Some(n / d),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|x| x.try_into().ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::Integer(x.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(x) => write!(f, "{}", x),
            Value::Rational(n, d) => write!(f, "{}/{}", n, d),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}
