//! Runtime values and the conversions the interpreter needs between them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use super::interpreter::Scope;
use super::syntax::FunctionDef;

/// Longest string, in bytes, that string building produces.
pub const MAX_STRING_LENGTH: usize = 1 << 24;
/// Deepest array and object nesting [`to_json`] accepts.
pub const MAX_JSON_DEPTH: usize = 256;
/// Conversion budget of [`to_json`]: one unit per value plus one per string byte.
pub const MAX_JSON_SIZE: usize = 1 << 26;

/// Value produced while running a script.
///
/// Arrays and objects are reference types: cloning a [`Value`] clones the handle, not the
/// contents, so mutation through one handle is visible through every other one.
#[derive(Clone)]
pub enum Value {
  /// `undefined`.
  Undefined,
  /// `null`.
  Null,
  /// Boolean primitive.
  Bool(bool),
  /// Number primitive.
  Number(f64),
  /// String primitive.
  String(Rc<str>),
  /// Array object.
  Array(Rc<RefCell<Vec<Value>>>),
  /// Plain object.
  Object(Rc<RefCell<Object>>),
  /// Closure created from a function literal.
  Function(Rc<Closure>),
}

/// Function literal paired with the scope it was created in.
pub struct Closure {
  /// Parsed definition.
  pub function: Rc<FunctionDef>,
  /// Captured scope.
  pub scope: Rc<Scope>,
}

/// Property bag of a plain object.
#[derive(Default)]
pub struct Object {
  entries: Vec<(String, Value)>,
}

impl Object {
  /// Read an own property.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self
      .entries
      .iter()
      .find(|(existing, _)| existing == key)
      .map(|(_, value)| value)
  }

  /// Create or overwrite an own property, keeping the original insertion slot on overwrite.
  pub fn set(&mut self, key: String, value: Value) {
    match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
      Some((_, slot)) => *slot = value,
      None => self.entries.push((key, value)),
    }
  }

  /// Own properties in enumeration order: array-index keys ascending, then insertion order.
  pub fn ordered_entries(&self) -> Vec<(&str, &Value)> {
    let mut indexed: Vec<(u32, &str, &Value)> = Vec::new();
    let mut named: Vec<(&str, &Value)> = Vec::new();
    for (key, value) in &self.entries {
      match array_index(key) {
        Some(index) => indexed.push((index, key.as_str(), value)),
        None => named.push((key.as_str(), value)),
      }
    }
    indexed.sort_by_key(|(index, _, _)| *index);
    indexed
      .into_iter()
      .map(|(_, key, value)| (key, value))
      .chain(named)
      .collect()
  }

  pub(crate) fn clear(&mut self) {
    self.entries.clear();
  }
}

/// Canonical array index a property key names, if any.
pub(crate) fn array_index(key: &str) -> Option<u32> {
  if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
    return None;
  }
  if !key.bytes().all(|byte| byte.is_ascii_digit()) {
    return None;
  }
  key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

impl Value {
  /// String value from anything string-like.
  pub fn string(text: impl Into<Rc<str>>) -> Self {
    Value::String(text.into())
  }

  /// Boolean coercion.
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Undefined | Value::Null => false,
      Value::Bool(value) => *value,
      Value::Number(number) => *number != 0.0 && !number.is_nan(),
      Value::String(text) => !text.is_empty(),
      Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
    }
  }

  /// Numeric coercion.
  pub fn to_number(&self) -> f64 {
    match self {
      Value::Undefined => f64::NAN,
      Value::Null => 0.0,
      Value::Bool(value) => f64::from(u8::from(*value)),
      Value::Number(number) => *number,
      Value::String(text) => string_to_number(text),
      Value::Array(_) => string_to_number(&self.to_js_string()),
      Value::Object(_) | Value::Function(_) => f64::NAN,
    }
  }

  /// String coercion, also used to turn values into property keys.
  ///
  /// Output stops growing once it passes [`MAX_STRING_LENGTH`] bytes.
  pub fn to_js_string(&self) -> String {
    let mut out = String::new();
    self.write_js_string(&mut out, 0);
    out
  }

  fn write_js_string(&self, out: &mut String, depth: usize) {
    if out.len() > MAX_STRING_LENGTH {
      return;
    }
    match self {
      Value::Undefined => out.push_str("undefined"),
      Value::Null => out.push_str("null"),
      Value::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
      Value::Number(number) => out.push_str(&number_to_string(*number)),
      Value::String(text) => out.push_str(text),
      // Self-referencing arrays render as empty rather than recursing forever.
      Value::Array(_) if depth > 32 => {}
      Value::Array(items) => {
        for (position, item) in items.borrow().iter().enumerate() {
          if out.len() > MAX_STRING_LENGTH {
            break;
          }
          if position > 0 {
            out.push(',');
          }
          if !matches!(item, Value::Undefined | Value::Null) {
            item.write_js_string(out, depth + 1);
          }
        }
      }
      Value::Object(_) => out.push_str("[object Object]"),
      Value::Function(_) => out.push_str("function () { [native code] }"),
    }
  }

  /// Objects collapse to their string form, primitives pass through.
  pub fn to_primitive(&self) -> Value {
    match self {
      Value::Array(_) | Value::Object(_) | Value::Function(_) => Value::string(self.to_js_string()),
      primitive => primitive.clone(),
    }
  }

  /// Result of the `typeof` operator.
  pub fn type_of(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null | Value::Array(_) | Value::Object(_) => "object",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Function(_) => "function",
    }
  }

  /// `===`.
  pub fn strict_equals(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
      (Value::Bool(left), Value::Bool(right)) => left == right,
      (Value::Number(left), Value::Number(right)) => left == right,
      (Value::String(left), Value::String(right)) => left == right,
      (Value::Array(left), Value::Array(right)) => Rc::ptr_eq(left, right),
      (Value::Object(left), Value::Object(right)) => Rc::ptr_eq(left, right),
      (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
      _ => false,
    }
  }

  /// `==`.
  pub fn loose_equals(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
      (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
      (Value::Number(left), Value::String(_)) => *left == other.to_number(),
      (Value::String(_), Value::Number(right)) => self.to_number() == *right,
      (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
      (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
      (Value::Array(_) | Value::Object(_) | Value::Function(_), Value::Number(_) | Value::String(_)) => {
        self.to_primitive().loose_equals(other)
      }
      (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_) | Value::Function(_)) => {
        self.loose_equals(&other.to_primitive())
      }
      _ => self.strict_equals(other),
    }
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::String(text) => write!(f, "{text:?}"),
      Value::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
      Value::Object(object) => write!(f, "Object(keys={})", object.borrow().entries.len()),
      Value::Function(closure) => match &closure.function.name {
        Some(name) => write!(f, "Function({name})"),
        None => write!(f, "Function(anonymous)"),
      },
      other => f.write_str(&other.to_js_string()),
    }
  }
}

/// Format a number the way `String(number)` does for the ranges manifests use.
pub fn number_to_string(number: f64) -> String {
  if number.is_nan() {
    "NaN".to_string()
  } else if number.is_infinite() {
    let text = if number > 0.0 { "Infinity" } else { "-Infinity" };
    text.to_string()
  } else if number == 0.0 {
    "0".to_string()
  } else if number.fract() == 0.0 && number.abs() < 1e21 {
    format!("{number:.0}")
  } else {
    format!("{number}")
  }
}

fn string_to_number(text: &str) -> f64 {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return 0.0;
  }
  if let Some(hex) = trimmed
    .strip_prefix("0x")
    .or_else(|| trimmed.strip_prefix("0X"))
  {
    return u64::from_str_radix(hex, 16)
      .map(|value| value as f64)
      .unwrap_or(f64::NAN);
  }
  match trimmed {
    "Infinity" | "+Infinity" => f64::INFINITY,
    "-Infinity" => f64::NEG_INFINITY,
    // Rust accepts spellings like "inf" and "nan" that JavaScript does not.
    _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
    _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
  }
}

/// Reasons an evaluated value cannot be handed back across the evaluator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
  /// The value graph contains a function.
  #[error("DataCloneError: function could not be cloned")]
  Function,
  /// The value graph references one of its own ancestors.
  #[error("manifest contains a circular reference, which has no JSON form")]
  Circular,
  /// Arrays and objects nest deeper than [`MAX_JSON_DEPTH`].
  #[error("manifest nests deeper than {} levels", MAX_JSON_DEPTH)]
  TooDeep,
  /// The converted value would exceed [`MAX_JSON_SIZE`].
  #[error("manifest is too large to convert")]
  TooLarge,
}

/// Convert a value graph into plain JSON.
///
/// `undefined` object properties are dropped and `undefined` array slots become `null`,
/// non-finite numbers become `null`. Shared (non-circular) references are copied, and every
/// copy is charged against [`MAX_JSON_SIZE`].
pub fn to_json(value: &Value) -> Result<JsonValue, ConversionError> {
  let mut converter = Converter {
    ancestors: Vec::new(),
    remaining: MAX_JSON_SIZE,
  };
  converter.convert(value)
}

struct Converter {
  ancestors: Vec<*const ()>,
  remaining: usize,
}

impl Converter {
  fn convert(&mut self, value: &Value) -> Result<JsonValue, ConversionError> {
    let cost = match value {
      Value::String(text) => 1 + text.len(),
      _ => 1,
    };
    self.remaining = self
      .remaining
      .checked_sub(cost)
      .ok_or(ConversionError::TooLarge)?;

    match value {
      Value::Undefined | Value::Null => Ok(JsonValue::Null),
      Value::Bool(flag) => Ok(JsonValue::Bool(*flag)),
      Value::Number(number) => Ok(number_to_json(*number)),
      Value::String(text) => Ok(JsonValue::String(text.to_string())),
      Value::Function(_) => Err(ConversionError::Function),
      Value::Array(items) => {
        self.enter(Rc::as_ptr(items) as *const ())?;
        let converted = items
          .borrow()
          .iter()
          .map(|item| self.convert(item))
          .collect::<Result<Vec<_>, _>>()?;
        self.ancestors.pop();
        Ok(JsonValue::Array(converted))
      }
      Value::Object(object) => {
        self.enter(Rc::as_ptr(object) as *const ())?;
        let mut map = Map::new();
        for (key, item) in object.borrow().ordered_entries() {
          if matches!(item, Value::Undefined) {
            continue;
          }
          map.insert(key.to_string(), self.convert(item)?);
        }
        self.ancestors.pop();
        Ok(JsonValue::Object(map))
      }
    }
  }

  fn enter(&mut self, address: *const ()) -> Result<(), ConversionError> {
    if self.ancestors.contains(&address) {
      return Err(ConversionError::Circular);
    }
    if self.ancestors.len() >= MAX_JSON_DEPTH {
      return Err(ConversionError::TooDeep);
    }
    self.ancestors.push(address);
    Ok(())
  }
}

fn number_to_json(number: f64) -> JsonValue {
  if number.fract() == 0.0 && number.abs() <= 9_007_199_254_740_991.0 {
    JsonValue::from(number as i64)
  } else {
    Number::from_f64(number)
      .map(JsonValue::Number)
      .unwrap_or(JsonValue::Null)
  }
}
