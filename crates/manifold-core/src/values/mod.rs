// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The runtime value model.
//!
//! A [`Value`] is a tagged union over everything an expression can evaluate
//! to: `undef`, the `default` marker, booleans, 64-bit integers and floats,
//! strings, regexes, types, arrays, insertion-ordered hashes, and
//! *variables* (a name plus a shared snapshot of the assigned value).
//!
//! Variable values are lookup handles, never mutable aliases: operations
//! that inspect a value [`dereference`] it explicitly first.
//!
//! # Equality
//!
//! Two equality notions coexist:
//!
//! - `==`/`Hash` on `Value` is *exact*: strings case-sensitive, floats by
//!   bit pattern. Hash keys use this.
//! - [`equals`] is the *language* equality used by `==`, `in`, and `case`
//!   matching: deep, with case-insensitive string comparison.

pub mod types;

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ecow::EcoString;
use indexmap::IndexMap;

pub use types::TypeSpec;

/// An insertion-ordered value-to-value mapping.
pub type ValueHash = IndexMap<Value, Value>;

/// A compiled regex value, keyed by its pattern text.
#[derive(Debug, Clone)]
pub struct ValueRegex {
    pattern: EcoString,
    regex: Rc<regex::Regex>,
}

impl ValueRegex {
    /// Compiles a pattern into a regex value.
    ///
    /// # Errors
    /// Returns the underlying error if the pattern does not compile.
    pub fn new(pattern: impl Into<EcoString>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Rc::new(regex::Regex::new(&pattern)?);
        Ok(Self { pattern, regex })
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn pattern(&self) -> &EcoString {
        &self.pattern
    }

    /// Returns the compiled regex.
    #[must_use]
    pub fn regex(&self) -> &regex::Regex {
        &self.regex
    }
}

impl PartialEq for ValueRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ValueRegex {}

impl Hash for ValueRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

/// A variable value: a lookup handle to an assigned variable. An
/// unassigned variable resolves to `undef`.
#[derive(Debug, Clone)]
pub struct VariableValue {
    name: EcoString,
    value: Rc<Value>,
}

impl VariableValue {
    /// Creates a variable value for `name`; `None` resolves to `undef`.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, value: Option<Rc<Value>>) -> Self {
        Self {
            name: name.into(),
            value: value.unwrap_or_else(|| Rc::new(Value::Undef)),
        }
    }

    /// Returns the variable name (without the `$` sigil).
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    /// Returns the resolved value.
    #[must_use]
    pub fn value(&self) -> &Rc<Value> {
        &self.value
    }

    /// Re-points the handle at a newly assigned value.
    pub fn assign(&mut self, value: Rc<Value>) {
        self.value = value;
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence of a value.
    Undef,
    /// The `default` marker.
    Default,
    /// A boolean.
    Boolean(bool),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    String(EcoString),
    /// A compiled regex.
    Regex(ValueRegex),
    /// A type.
    Type(TypeSpec),
    /// An array of values.
    Array(Vec<Value>),
    /// An insertion-ordered hash.
    Hash(ValueHash),
    /// A variable lookup handle.
    Variable(VariableValue),
}

impl Default for Value {
    fn default() -> Self {
        Self::Undef
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<EcoString> for Value {
    fn from(v: EcoString) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

/// Follows variable handles to the underlying value.
#[must_use]
pub fn dereference(value: &Value) -> &Value {
    let mut current = value;
    while let Value::Variable(var) = current {
        current = var.value();
    }
    current
}

/// Takes a value for mutation, dereferencing variable handles by cloning.
#[must_use]
pub fn mutate(value: Value) -> Value {
    match value {
        Value::Variable(_) => dereference(&value).clone(),
        other => other,
    }
}

/// Returns true if the value is `undef`.
#[must_use]
pub fn is_undef(value: &Value) -> bool {
    matches!(dereference(value), Value::Undef)
}

/// Returns true if the value is the `default` marker.
#[must_use]
pub fn is_default(value: &Value) -> bool {
    matches!(dereference(value), Value::Default)
}

/// Returns true if the value is the boolean `true`.
#[must_use]
pub fn is_true(value: &Value) -> bool {
    matches!(dereference(value), Value::Boolean(true))
}

/// Returns the truthiness of a value: everything is truthy except `undef`
/// and `false`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    !matches!(dereference(value), Value::Undef | Value::Boolean(false))
}

/// Language equality: deep, with case-insensitive string comparison and
/// integer/float interoperation.
#[must_use]
pub fn equals(left: &Value, right: &Value) -> bool {
    match (dereference(left), dereference(right)) {
        (Value::Undef, Value::Undef) | (Value::Default, Value::Default) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        #[allow(clippy::cast_precision_loss)]
        (Value::Integer(a), Value::Float(b)) => *a as f64 == *b,
        #[allow(clippy::cast_precision_loss)]
        (Value::Float(a), Value::Integer(b)) => *a == *b as f64,
        (Value::String(a), Value::String(b)) => string_iequals(a, b),
        (Value::Regex(a), Value::Regex(b)) => a.pattern() == b.pattern(),
        (Value::Type(a), Value::Type(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
        }
        (Value::Hash(a), Value::Hash(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| equals(v, other)))
        }
        _ => false,
    }
}

/// Case-insensitive string equality.
#[must_use]
pub fn string_iequals(left: &str, right: &str) -> bool {
    left.len() == right.len()
        && left
            .chars()
            .zip(right.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

/// Converts a value to an array.
///
/// Arrays pass through; hashes become `[key, value]` pairs when
/// `convert_hash` is set (otherwise the hash becomes the only element);
/// `undef` becomes the empty array; anything else becomes a one-element
/// array.
#[must_use]
pub fn to_array(value: Value, convert_hash: bool) -> Vec<Value> {
    match mutate(value) {
        Value::Array(elements) => elements,
        Value::Hash(hash) if convert_hash => hash
            .into_iter()
            .map(|(k, v)| Value::Array(vec![k, v]))
            .collect(),
        Value::Undef => Vec::new(),
        other => vec![other],
    }
}

/// Converts an array of `[key, value]` pairs back into a hash; the inverse
/// of [`to_array`] on hashes. Returns `None` if any element is not a
/// two-element array.
#[must_use]
pub fn to_hash(elements: Vec<Value>) -> Option<ValueHash> {
    let mut hash = ValueHash::new();
    for element in elements {
        match mutate(element) {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                let key = pair.next()?;
                let value = pair.next()?;
                hash.insert(key, value);
            }
            _ => return None,
        }
    }
    Some(hash)
}

/// Returns the type of a value.
#[must_use]
pub fn get_type(value: &Value) -> TypeSpec {
    match dereference(value) {
        Value::Undef => TypeSpec::Undef,
        Value::Default => TypeSpec::Default,
        Value::Boolean(_) => TypeSpec::Boolean,
        Value::Integer(_) => TypeSpec::Integer {
            from: None,
            to: None,
        },
        Value::Float(_) => TypeSpec::Float {
            from: None,
            to: None,
        },
        Value::String(_) => TypeSpec::String {
            min: None,
            max: None,
        },
        Value::Regex(_) => TypeSpec::Regexp(None),
        Value::Type(t) => TypeSpec::Type(Some(Box::new(t.clone()))),
        Value::Array(_) => TypeSpec::Array {
            element: Box::new(TypeSpec::Any),
            min: None,
            max: None,
        },
        Value::Hash(_) => TypeSpec::Hash {
            key: Box::new(TypeSpec::Any),
            value: Box::new(TypeSpec::Any),
            min: None,
            max: None,
        },
        Value::Variable(_) => unreachable!("dereference never returns a variable"),
    }
}

/// Joins the display forms of an array's elements with a separator.
#[must_use]
pub fn join(values: &[Value], separator: &str) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(&value.to_string());
    }
    out
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (dereference(self), dereference(other)) {
            (Value::Undef, Value::Undef) | (Value::Default, Value::Default) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                        ka == kb && va == vb
                    })
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match dereference(self) {
            Value::Undef => 0u8.hash(state),
            Value::Default => 1u8.hash(state),
            Value::Boolean(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::Integer(i) => {
                3u8.hash(state);
                i.hash(state);
            }
            Value::Float(f) => {
                4u8.hash(state);
                f.to_bits().hash(state);
            }
            Value::String(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Value::Regex(r) => {
                6u8.hash(state);
                r.hash(state);
            }
            Value::Type(t) => {
                7u8.hash(state);
                t.to_string().hash(state);
            }
            Value::Array(a) => {
                8u8.hash(state);
                for v in a {
                    v.hash(state);
                }
            }
            Value::Hash(h) => {
                9u8.hash(state);
                for (k, v) in h {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Variable(_) => unreachable!("dereference never returns a variable"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match dereference(self) {
            Value::Undef => Ok(()),
            Value::Default => write!(f, "default"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Regex(r) => write!(f, "/{}/", r.pattern()),
            Value::Type(t) => write!(f, "{t}"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Value::Hash(hash) => {
                write!(f, "{{")?;
                for (i, (key, value)) in hash.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} => {value}")?;
                }
                write!(f, "}}")
            }
            Value::Variable(_) => unreachable!("dereference never returns a variable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&Value::Undef));
        assert!(!is_truthy(&Value::Boolean(false)));
        assert!(is_truthy(&Value::Boolean(true)));
        assert!(is_truthy(&Value::Integer(0)));
        assert!(is_truthy(&Value::String(String::new().into())));
    }

    #[test]
    fn dereference_follows_chains() {
        let inner = Rc::new(Value::Integer(42));
        let var = Value::Variable(VariableValue::new("x", Some(inner)));
        assert_eq!(dereference(&var), &Value::Integer(42));

        let unset = Value::Variable(VariableValue::new("y", None));
        assert!(is_undef(&unset));
    }

    #[test]
    fn language_equality_is_case_insensitive() {
        assert!(equals(&Value::from("Hello"), &Value::from("hello")));
        assert!(!equals(&Value::from("hello"), &Value::from("world")));
        // Exact equality is case-sensitive
        assert_ne!(Value::from("Hello"), Value::from("hello"));
    }

    #[test]
    fn numeric_equality_interoperates() {
        assert!(equals(&Value::Integer(1), &Value::Float(1.0)));
        assert!(!equals(&Value::Integer(1), &Value::Float(1.5)));
    }

    #[test]
    fn deep_equality() {
        let a = Value::Array(vec![Value::from("A"), Value::Integer(1)]);
        let b = Value::Array(vec![Value::from("a"), Value::Integer(1)]);
        assert!(equals(&a, &b));
    }

    #[test]
    fn to_array_conversions() {
        assert_eq!(to_array(Value::Undef, true), Vec::<Value>::new());
        assert_eq!(to_array(Value::Integer(1), true), vec![Value::Integer(1)]);

        let mut hash = ValueHash::new();
        hash.insert(Value::from("a"), Value::Integer(1));
        let pairs = to_array(Value::Hash(hash), true);
        assert_eq!(
            pairs,
            vec![Value::Array(vec![Value::from("a"), Value::Integer(1)])]
        );
    }

    #[test]
    fn to_hash_round_trips() {
        let mut hash = ValueHash::new();
        hash.insert(Value::from("a"), Value::Integer(1));
        hash.insert(Value::from("b"), Value::Integer(2));

        let pairs = to_array(Value::Hash(hash.clone()), true);
        let back = to_hash(pairs).expect("valid pairs");
        assert_eq!(back, hash);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Undef.to_string(), "");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "[1, 2]"
        );
        let mut hash = ValueHash::new();
        hash.insert(Value::from("a"), Value::Integer(1));
        assert_eq!(Value::Hash(hash).to_string(), "{a => 1}");
    }

    #[test]
    fn hash_keys_use_exact_equality() {
        let mut hash = ValueHash::new();
        hash.insert(Value::from("a"), Value::Integer(1));
        hash.insert(Value::from("A"), Value::Integer(2));
        assert_eq!(hash.len(), 2);
    }
}
