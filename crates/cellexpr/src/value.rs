//! Runtime values
//!
//! [`Value`] is the closed set of kinds an expression can compute. Operators
//! dispatch on the kinds of their evaluated operands (see
//! [`evaluator`](crate::evaluator)); numeric operands of different kinds are
//! first widened to a common [`NumericKind`].

use chrono::{Duration, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::fmt;

/// Display format for date-time values
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value computed by an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    String(String),
    DateTime(NaiveDateTime),
    Duration(Duration),
    /// No value
    Empty,
}

/// Kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int32,
    Single,
    Double,
    Decimal,
    Boolean,
    String,
    DateTime,
    Duration,
    Empty,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int32 => "Int32",
            ValueKind::Single => "Single",
            ValueKind::Double => "Double",
            ValueKind::Decimal => "Decimal",
            ValueKind::Boolean => "Boolean",
            ValueKind::String => "String",
            ValueKind::DateTime => "DateTime",
            ValueKind::Duration => "Duration",
            ValueKind::Empty => "Empty",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric kinds, ordered so that widening never loses the integer case
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericKind {
    Int32,
    Single,
    Double,
    Decimal,
}

impl NumericKind {
    /// Common kind two numeric operands are converted to
    ///
    /// Int32 widens to anything. Mixing Decimal with a binary floating kind
    /// yields Double.
    pub fn widen(self, other: NumericKind) -> NumericKind {
        use NumericKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int32, b) => b,
            (a, Int32) => a,
            (Single, Double) | (Double, Single) => Double,
            (Decimal, _) | (_, Decimal) => Double,
            _ => Double,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int32(_) => ValueKind::Int32,
            Value::Single(_) => ValueKind::Single,
            Value::Double(_) => ValueKind::Double,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Duration(_) => ValueKind::Duration,
            Value::Empty => ValueKind::Empty,
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Value::Int32(_) => Some(NumericKind::Int32),
            Value::Single(_) => Some(NumericKind::Single),
            Value::Double(_) => Some(NumericKind::Double),
            Value::Decimal(_) => Some(NumericKind::Decimal),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_kind().is_some()
    }

    /// Convert a numeric value to `kind`
    ///
    /// Returns `None` for non-numeric values and for narrowing conversions.
    pub fn widen_to(&self, kind: NumericKind) -> Option<Value> {
        let widened = match (self, kind) {
            (Value::Int32(n), NumericKind::Int32) => Value::Int32(*n),
            (Value::Int32(n), NumericKind::Single) => Value::Single(*n as f32),
            (Value::Int32(n), NumericKind::Double) => Value::Double(f64::from(*n)),
            (Value::Single(x), NumericKind::Single) => Value::Single(*x),
            (Value::Single(x), NumericKind::Double) => Value::Double(f64::from(*x)),
            (Value::Double(x), NumericKind::Double) => Value::Double(*x),
            (Value::Int32(_) | Value::Decimal(_), NumericKind::Decimal) => {
                Value::Decimal(self.as_decimal()?)
            }
            (Value::Decimal(d), NumericKind::Double) => Value::Double(d.to_f64()?),
            _ => return None,
        };
        Some(widened)
    }

    /// Numeric value as `f64` (lossy for large decimals)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::Single(x) => Some(f64::from(*x)),
            Value::Double(x) => Some(*x),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Numeric value as a `Decimal`
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int32(n) => Some(Decimal::from(*n)),
            Value::Single(x) => Decimal::from_f32(*x),
            Value::Double(x) => Decimal::from_f64(*x),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric value that is a whole number within `i32` range
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i32(),
            Value::Single(_) | Value::Double(_) => {
                let x = self.as_f64()?;
                if x.fract() == 0.0 && x >= f64::from(i32::MIN) && x <= f64::from(i32::MAX) {
                    Some(x as i32)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

/// Render a duration as `[-][d.]hh:mm:ss`
pub fn format_duration(duration: &Duration) -> String {
    let negative = *duration < Duration::zero();
    let total = duration.num_seconds().unsigned_abs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let sign = if negative { "-" } else { "" };
    if days > 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(n) => write!(f, "{n}"),
            Value::Single(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::String(s) => f.write_str(s),
            Value::DateTime(t) => write!(f, "{}", t.format(DATE_TIME_FORMAT)),
            Value::Duration(d) => f.write_str(&format_duration(d)),
            Value::Empty => Ok(()),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Single(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::DateTime(t)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_widening_order() {
        use NumericKind::*;
        assert_eq!(Int32.widen(Int32), Int32);
        assert_eq!(Int32.widen(Single), Single);
        assert_eq!(Double.widen(Int32), Double);
        assert_eq!(Single.widen(Double), Double);
        assert_eq!(Int32.widen(Decimal), Decimal);
        assert_eq!(Decimal.widen(Single), Double);
    }

    #[test]
    fn test_widen_to() {
        assert_eq!(Value::Int32(3).widen_to(NumericKind::Double), Some(Value::Double(3.0)));
        assert_eq!(
            Value::Int32(3).widen_to(NumericKind::Decimal),
            Some(Value::Decimal(Decimal::from(3)))
        );
        assert_eq!(Value::Double(1.5).widen_to(NumericKind::Int32), None);
        assert_eq!(Value::from("x").widen_to(NumericKind::Double), None);
    }

    #[test]
    fn test_as_i32() {
        assert_eq!(Value::Int32(-4).as_i32(), Some(-4));
        assert_eq!(Value::Double(2.0).as_i32(), Some(2));
        assert_eq!(Value::Double(2.5).as_i32(), None);
        assert_eq!(Value::Decimal(Decimal::new(70, 1)).as_i32(), Some(7));
        assert_eq!(Value::Boolean(true).as_i32(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(16).to_string(), "16");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Empty.to_string(), "");

        let t = NaiveDate::from_ymd_opt(2022, 5, 31)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap();
        assert_eq!(Value::DateTime(t).to_string(), "2022-05-31 12:34:56");
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(format_duration(&Duration::seconds(3 * 3600 + 3 * 60 + 3)), "03:03:03");
        assert_eq!(format_duration(&Duration::seconds(-(3 * 3600 + 3 * 60 + 3))), "-03:03:03");
        assert_eq!(format_duration(&Duration::days(1)), "1.00:00:00");
        assert_eq!(format_duration(&Duration::zero()), "00:00:00");
    }
}
