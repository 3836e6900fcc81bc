use std::{ops::Index, slice};

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// Одно позиционное значение аргумента события.
///
/// Поддерживает скаляры, строки, бинарные данные и произвольный JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    Json(Value),
}

/// Позиционные аргументы события.
///
/// Публикуются вместе с событием и передаются каждому обработчику по ссылке,
/// без преобразований и в исходном порядке.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventArgs(Vec<ArgValue>);

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ArgValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ArgValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ArgValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl EventArgs {
    /// Событие без аргументов.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Событие с одним аргументом.
    pub fn one(value: impl Into<ArgValue>) -> Self {
        Self(vec![value.into()])
    }

    /// Добавляет аргумент в конец списка (строительная цепочка).
    pub fn with(mut self, value: impl Into<ArgValue>) -> Self {
        self.0.push(value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&ArgValue> {
        self.0.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, ArgValue> {
        self.0.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Bytes> for ArgValue {
    fn from(v: Bytes) -> Self {
        ArgValue::Bytes(v)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(v: Vec<u8>) -> Self {
        ArgValue::Bytes(Bytes::from(v))
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Json(v)
    }
}

impl From<Vec<ArgValue>> for EventArgs {
    fn from(values: Vec<ArgValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<ArgValue> for EventArgs {
    fn from_iter<I: IntoIterator<Item = ArgValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for EventArgs {
    type Output = ArgValue;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a EventArgs {
    type Item = &'a ArgValue;
    type IntoIter = slice::Iter<'a, ArgValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
