// SQL parameter model: declared types, values, bindings and parameter sources

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{DomainError, Result};

/// Declared SQL type of an input parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlType {
    Bit,
    Int,
    BigInt,
    /// Exact numeric with the given precision (maximum integer digits)
    Numeric(u8),
    Float,
    /// Character data with a maximum length in characters
    VarChar(u32),
    Text,
    /// Binary data with a maximum length in bytes
    VarBinary(u32),
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlType::Bit => write!(f, "BIT"),
            SqlType::Int => write!(f, "INT"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Numeric(p) => write!(f, "NUMERIC({})", p),
            SqlType::Float => write!(f, "FLOAT"),
            SqlType::VarChar(n) => write!(f, "VARCHAR({})", n),
            SqlType::Text => write!(f, "TEXT"),
            SqlType::VarBinary(n) => write!(f, "VARBINARY({})", n),
        }
    }
}

/// A single SQL value, used both for input parameters and decoded result columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Bool(_) => "BIT",
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Real(f) => Some(*f),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

impl SqlType {
    /// Check `value` against this declared type and normalize it for binding
    ///
    /// NULL fits every type. Integers bound as FLOAT become reals and
    /// 0/1 bound as BIT become booleans.
    pub fn coerce(&self, value: &SqlValue) -> std::result::Result<SqlValue, String> {
        use SqlValue as V;

        match (self, value) {
            (_, V::Null) => Ok(V::Null),

            (SqlType::Float | SqlType::Numeric(_), V::Real(f)) if !f.is_finite() => {
                Err(format!("non-finite value {} is not allowed for {}", f, self))
            }

            (SqlType::Bit, V::Bool(b)) => Ok(V::Bool(*b)),
            (SqlType::Bit, V::Integer(0)) => Ok(V::Bool(false)),
            (SqlType::Bit, V::Integer(1)) => Ok(V::Bool(true)),

            (SqlType::Int, V::Integer(i)) => i32::try_from(*i)
                .map(|_| V::Integer(*i))
                .map_err(|_| format!("{} is out of range for INT", i)),
            (SqlType::BigInt, V::Integer(i)) => Ok(V::Integer(*i)),

            (SqlType::Numeric(precision), V::Integer(i)) => {
                let digits = i.unsigned_abs().to_string().len();
                if digits > usize::from(*precision) {
                    Err(format!("{} has {} digits, exceeds {}", i, digits, self))
                } else {
                    Ok(V::Integer(*i))
                }
            }
            (SqlType::Numeric(precision), V::Real(f)) => {
                if f.abs() >= 10f64.powi(i32::from(*precision)) {
                    Err(format!("{} exceeds {}", f, self))
                } else {
                    Ok(V::Real(*f))
                }
            }

            (SqlType::Float, V::Integer(i)) => Ok(V::Real(*i as f64)),
            (SqlType::Float, V::Real(f)) => Ok(V::Real(*f)),

            (SqlType::VarChar(max), V::Text(s)) => {
                let len = s.chars().count();
                if len > *max as usize {
                    Err(format!("{} characters exceed {}", len, self))
                } else {
                    Ok(V::Text(s.clone()))
                }
            }
            (SqlType::Text, V::Text(s)) => Ok(V::Text(s.clone())),

            (SqlType::VarBinary(max), V::Blob(b)) => {
                if b.len() > *max as usize {
                    Err(format!("{} bytes exceed {}", b.len(), self))
                } else {
                    Ok(V::Blob(b.clone()))
                }
            }

            (ty, v) => Err(format!("{} value does not fit {}", v.kind(), ty)),
        }
    }
}

/// One `(name, type, value)` input parameter; `name` matches an `@name` placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub sql_type: SqlType,
    pub value: SqlValue,
}

impl Binding {
    pub fn new(name: impl Into<String>, sql_type: SqlType, value: impl Into<SqlValue>) -> Self {
        Self {
            name: name.into(),
            sql_type,
            value: value.into(),
        }
    }

    /// Value checked and normalized against the declared type
    pub fn coerced_value(&self) -> Result<SqlValue> {
        self.sql_type
            .coerce(&self.value)
            .map_err(|reason| DomainError::InvalidBinding {
                name: self.name.clone(),
                reason,
            })
    }
}

impl<N, V> From<(N, SqlType, V)> for Binding
where
    N: Into<String>,
    V: Into<SqlValue>,
{
    fn from((name, sql_type, value): (N, SqlType, V)) -> Self {
        Binding::new(name, sql_type, value)
    }
}

/// Zero-argument producer of bindings, invoked when the task executes
pub type ParamProducer = dyn Fn() -> Vec<Binding> + Send + Sync;

/// Where a query task gets its bindings from
#[derive(Clone)]
pub enum ParamSource {
    /// Bindings known at registration time
    Literal(Arc<[Binding]>),
    /// Bindings computed at execution time, typically from earlier task results
    Deferred(Arc<ParamProducer>),
}

impl ParamSource {
    pub fn literal<I, B>(bindings: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Binding>,
    {
        ParamSource::Literal(bindings.into_iter().map(Into::into).collect())
    }

    pub fn deferred<F>(producer: F) -> Self
    where
        F: Fn() -> Vec<Binding> + Send + Sync + 'static,
    {
        ParamSource::Deferred(Arc::new(producer))
    }

    /// Materialize the binding sequence; runs the producer for `Deferred`
    pub fn resolve(&self) -> Vec<Binding> {
        match self {
            ParamSource::Literal(bindings) => bindings.to_vec(),
            ParamSource::Deferred(producer) => producer(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, ParamSource::Deferred(_))
    }
}

impl std::fmt::Debug for ParamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamSource::Literal(bindings) => f.debug_tuple("Literal").field(bindings).finish(),
            ParamSource::Deferred(_) => f.write_str("Deferred(<producer>)"),
        }
    }
}
