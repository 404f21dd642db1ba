// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The type algebra.
//!
//! Types are themselves values (`Value::Type`). A bare type name in source
//! evaluates to the unparameterised type; `[]` access parameterises it
//! (`Integer[1, 10]`, `Array[String]`, `File['/tmp/x']`). Unknown
//! capitalised names evaluate to resource types of that name.
//!
//! Every type supports [`TypeSpec::is_instance`] and
//! [`TypeSpec::is_specialization`]; the comparison operators on types are
//! built from the latter (`left <= right` iff equal or `left` specializes
//! `right`).

use ecow::EcoString;

use super::{Value, ValueRegex, dereference, equals, string_iequals};

/// Normalises a resource type name segment-wise: `foo::bar` → `Foo::Bar`.
#[must_use]
pub fn normalize_type_name(name: &str) -> EcoString {
    let name = name.strip_prefix("::").unwrap_or(name);
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split("::").enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }
    EcoString::from(out)
}

/// A type in the algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Matches every value.
    Any,
    /// Matches `undef`.
    Undef,
    /// Matches the `default` marker.
    Default,
    /// Matches booleans.
    Boolean,
    /// Matches integers within optional bounds.
    Integer {
        /// Inclusive lower bound.
        from: Option<i64>,
        /// Inclusive upper bound.
        to: Option<i64>,
    },
    /// Matches floats within optional bounds.
    Float {
        /// Inclusive lower bound.
        from: Option<f64>,
        /// Inclusive upper bound.
        to: Option<f64>,
    },
    /// Matches strings with optional length bounds.
    String {
        /// Minimum length.
        min: Option<i64>,
        /// Maximum length.
        max: Option<i64>,
    },
    /// Matches regex values, optionally with an exact pattern.
    Regexp(Option<EcoString>),
    /// Matches arrays of an element type with optional size bounds.
    Array {
        /// The element type.
        element: Box<TypeSpec>,
        /// Minimum size.
        min: Option<i64>,
        /// Maximum size.
        max: Option<i64>,
    },
    /// Matches hashes of key/value types with optional size bounds.
    Hash {
        /// The key type.
        key: Box<TypeSpec>,
        /// The value type.
        value: Box<TypeSpec>,
        /// Minimum size.
        min: Option<i64>,
        /// Maximum size.
        max: Option<i64>,
    },
    /// Matches any of the member types.
    Variant(Vec<TypeSpec>),
    /// Matches `undef` or the inner type.
    Optional(Option<Box<TypeSpec>>),
    /// Matches arrays element-wise against a type list.
    Tuple {
        /// The element types.
        types: Vec<TypeSpec>,
        /// Minimum size (defaults to the type count).
        min: Option<i64>,
        /// Maximum size (defaults to the type count).
        max: Option<i64>,
    },
    /// Matches hashes with the given string keys and member types.
    Struct(Vec<(EcoString, TypeSpec)>),
    /// Matches type values, optionally of a specific type.
    Type(Option<Box<TypeSpec>>),
    /// Matches resource types/references.
    Resource {
        /// The normalised type name; `None` matches any resource.
        type_name: Option<EcoString>,
        /// The title; `None` matches any instance of the type.
        title: Option<EcoString>,
    },
    /// Matches class references.
    Class(Option<EcoString>),
    /// Matches strings from a fixed set.
    Enum(Vec<EcoString>),
    /// Matches strings matching any of the patterns.
    Pattern(Vec<ValueRegex>),
    /// Matches callable values (none exist at runtime).
    Callable,
    /// Matches integers and floats.
    Numeric,
    /// Matches numerics, strings, booleans, and regexes.
    Scalar,
    /// Matches scalars, `undef`, and arrays/hashes of data.
    Data,
    /// Matches arrays and hashes with optional size bounds.
    Collection {
        /// Minimum size.
        min: Option<i64>,
        /// Maximum size.
        max: Option<i64>,
    },
    /// Matches resource and class references.
    CatalogEntry,
}

impl TypeSpec {
    /// Resolves a bare type name to its unparameterised type. Unknown names
    /// become resource types.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "Any" => Self::Any,
            "Undef" => Self::Undef,
            "Default" => Self::Default,
            "Boolean" => Self::Boolean,
            "Integer" => Self::Integer {
                from: None,
                to: None,
            },
            "Float" => Self::Float {
                from: None,
                to: None,
            },
            "String" => Self::String {
                min: None,
                max: None,
            },
            "Regexp" => Self::Regexp(None),
            "Array" => Self::Array {
                element: Box::new(Self::Any),
                min: None,
                max: None,
            },
            "Hash" => Self::Hash {
                key: Box::new(Self::Any),
                value: Box::new(Self::Any),
                min: None,
                max: None,
            },
            "Variant" => Self::Variant(Vec::new()),
            "Optional" => Self::Optional(None),
            "Tuple" => Self::Tuple {
                types: Vec::new(),
                min: None,
                max: None,
            },
            "Struct" => Self::Struct(Vec::new()),
            "Type" => Self::Type(None),
            "Resource" => Self::Resource {
                type_name: None,
                title: None,
            },
            "Class" => Self::Class(None),
            "Enum" => Self::Enum(Vec::new()),
            "Pattern" => Self::Pattern(Vec::new()),
            "Callable" => Self::Callable,
            "Numeric" => Self::Numeric,
            "Scalar" => Self::Scalar,
            "Data" => Self::Data,
            "Collection" => Self::Collection {
                min: None,
                max: None,
            },
            "CatalogEntry" => Self::CatalogEntry,
            other => Self::Resource {
                type_name: Some(normalize_type_name(other)),
                title: None,
            },
        }
    }

    /// Creates a fully-qualified resource type.
    #[must_use]
    pub fn resource(type_name: &str, title: impl Into<EcoString>) -> Self {
        Self::Resource {
            type_name: Some(normalize_type_name(type_name)),
            title: Some(title.into()),
        }
    }

    /// Returns true if `value` is an instance of this type.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn is_instance(&self, value: &Value) -> bool {
        let value = dereference(value);
        match self {
            Self::Any => true,
            Self::Undef => matches!(value, Value::Undef),
            Self::Default => matches!(value, Value::Default),
            Self::Boolean => matches!(value, Value::Boolean(_)),
            Self::Integer { from, to } => match value {
                Value::Integer(i) => {
                    from.is_none_or(|lo| *i >= lo) && to.is_none_or(|hi| *i <= hi)
                }
                _ => false,
            },
            Self::Float { from, to } => match value {
                Value::Float(x) => from.is_none_or(|lo| *x >= lo) && to.is_none_or(|hi| *x <= hi),
                _ => false,
            },
            Self::String { min, max } => match value {
                Value::String(s) => {
                    let len = s.chars().count() as i64;
                    min.is_none_or(|lo| len >= lo) && max.is_none_or(|hi| len <= hi)
                }
                _ => false,
            },
            Self::Regexp(pattern) => match value {
                Value::Regex(r) => pattern.as_ref().is_none_or(|p| p == r.pattern()),
                _ => false,
            },
            Self::Array { element, min, max } => match value {
                Value::Array(elements) => {
                    let len = elements.len() as i64;
                    min.is_none_or(|lo| len >= lo)
                        && max.is_none_or(|hi| len <= hi)
                        && elements.iter().all(|e| element.is_instance(e))
                }
                _ => false,
            },
            Self::Hash {
                key,
                value: value_type,
                min,
                max,
            } => match value {
                Value::Hash(hash) => {
                    let len = hash.len() as i64;
                    min.is_none_or(|lo| len >= lo)
                        && max.is_none_or(|hi| len <= hi)
                        && hash
                            .iter()
                            .all(|(k, v)| key.is_instance(k) && value_type.is_instance(v))
                }
                _ => false,
            },
            Self::Variant(members) => members.iter().any(|t| t.is_instance(value)),
            Self::Optional(inner) => {
                matches!(value, Value::Undef)
                    || inner.as_ref().is_some_and(|t| t.is_instance(value))
            }
            Self::Tuple { types, min, max } => match value {
                Value::Array(elements) => {
                    let len = elements.len() as i64;
                    let lo = min.unwrap_or(types.len() as i64);
                    let hi = max.unwrap_or(types.len() as i64);
                    if len < lo || len > hi {
                        return false;
                    }
                    elements.iter().enumerate().all(|(i, e)| {
                        let t = types.get(i).or_else(|| types.last());
                        t.is_none_or(|t| t.is_instance(e))
                    })
                }
                _ => false,
            },
            Self::Struct(members) => match value {
                Value::Hash(hash) => {
                    hash.len() == members.len()
                        && members.iter().all(|(name, t)| {
                            hash.get(&Value::String(name.clone()))
                                .is_some_and(|v| t.is_instance(v))
                        })
                }
                _ => false,
            },
            Self::Type(inner) => match value {
                Value::Type(t) => inner
                    .as_ref()
                    .is_none_or(|i| **i == *t || i.is_specialization(t)),
                _ => false,
            },
            Self::Resource { type_name, title } => match value {
                Value::Type(TypeSpec::Resource {
                    type_name: other_name,
                    title: other_title,
                }) => {
                    type_name.as_ref().is_none_or(|n| {
                        other_name.as_ref().is_some_and(|o| o == n)
                    }) && title
                        .as_ref()
                        .is_none_or(|t| other_title.as_ref().is_some_and(|o| o == t))
                }
                _ => false,
            },
            Self::Class(name) => match value {
                Value::Type(TypeSpec::Class(other)) => {
                    name.as_ref().is_none_or(|n| {
                        other.as_ref().is_some_and(|o| string_iequals(o, n))
                    })
                }
                _ => false,
            },
            Self::Enum(options) => match value {
                Value::String(s) => options.iter().any(|o| o == s),
                _ => false,
            },
            Self::Pattern(patterns) => match value {
                Value::String(s) => patterns.iter().any(|p| p.regex().is_match(s)),
                _ => false,
            },
            Self::Callable => false,
            Self::Numeric => matches!(value, Value::Integer(_) | Value::Float(_)),
            Self::Scalar => matches!(
                value,
                Value::Integer(_) | Value::Float(_) | Value::String(_) | Value::Boolean(_)
                    | Value::Regex(_)
            ),
            Self::Data => match value {
                Value::Undef
                | Value::Integer(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Boolean(_) => true,
                Value::Array(elements) => elements.iter().all(|e| Self::Data.is_instance(e)),
                Value::Hash(hash) => hash.iter().all(|(k, v)| {
                    matches!(dereference(k), Value::String(_)) && Self::Data.is_instance(v)
                }),
                _ => false,
            },
            Self::Collection { min, max } => {
                let len = match value {
                    Value::Array(a) => a.len() as i64,
                    Value::Hash(h) => h.len() as i64,
                    _ => return false,
                };
                min.is_none_or(|lo| len >= lo) && max.is_none_or(|hi| len <= hi)
            }
            Self::CatalogEntry => matches!(
                value,
                Value::Type(TypeSpec::Resource { .. } | TypeSpec::Class(_))
            ),
        }
    }

    /// Returns true if `other` is a (strictly more specific) specialization
    /// of this type. `left <= right` on types is
    /// `left == right || right.is_specialization(&left)` reversed:
    /// see the comparison operators in the evaluator.
    #[must_use]
    pub fn is_specialization(&self, other: &TypeSpec) -> bool {
        match self {
            Self::Any => *other != Self::Any,
            Self::Numeric => matches!(other, Self::Integer { .. } | Self::Float { .. }),
            Self::Scalar => matches!(
                other,
                Self::Numeric
                    | Self::Integer { .. }
                    | Self::Float { .. }
                    | Self::String { .. }
                    | Self::Boolean
                    | Self::Regexp(_)
                    | Self::Enum(_)
                    | Self::Pattern(_)
            ),
            Self::Data => {
                matches!(
                    other,
                    Self::Scalar | Self::Undef | Self::Array { .. } | Self::Hash { .. }
                ) || Self::Scalar.is_specialization(other)
            }
            Self::Collection { .. } => matches!(
                other,
                Self::Array { .. } | Self::Hash { .. } | Self::Tuple { .. } | Self::Struct(_)
            ),
            Self::CatalogEntry => matches!(other, Self::Resource { .. } | Self::Class(_)),
            Self::Integer { from, to } => match other {
                Self::Integer {
                    from: other_from,
                    to: other_to,
                } => {
                    (other_from, other_to) != (from, to)
                        && bound_within(*other_from, *from, true)
                        && bound_within(*other_to, *to, false)
                }
                _ => false,
            },
            Self::String { min, max } => match other {
                Self::String {
                    min: other_min,
                    max: other_max,
                } => {
                    (other_min, other_max) != (min, max)
                        && bound_within(*other_min, *min, true)
                        && bound_within(*other_max, *max, false)
                }
                Self::Enum(_) | Self::Pattern(_) => true,
                _ => false,
            },
            Self::Regexp(pattern) => match other {
                Self::Regexp(other_pattern) => pattern.is_none() && other_pattern.is_some(),
                _ => false,
            },
            Self::Array { element, .. } => match other {
                Self::Array {
                    element: other_element,
                    ..
                } => {
                    **element == **other_element || element.is_specialization(other_element)
                }
                Self::Tuple { .. } => true,
                _ => false,
            },
            Self::Hash { .. } => matches!(other, Self::Struct(_))
                || matches!(other, Self::Hash { .. } if self != other),
            Self::Optional(inner) => match inner {
                None => matches!(other, Self::Optional(Some(_))),
                Some(t) => other == &**t || t.is_specialization(other),
            },
            Self::Variant(members) => {
                members.iter().any(|m| m == other || m.is_specialization(other))
            }
            Self::Type(inner) => match other {
                Self::Type(Some(other_inner)) => match inner {
                    None => true,
                    Some(t) => t.is_specialization(other_inner),
                },
                _ => false,
            },
            Self::Resource { type_name, title } => match other {
                Self::Resource {
                    type_name: other_name,
                    title: other_title,
                } => match type_name {
                    None => other_name.is_some(),
                    Some(name) => {
                        other_name.as_ref() == Some(name)
                            && title.is_none()
                            && other_title.is_some()
                    }
                },
                _ => false,
            },
            Self::Class(name) => match other {
                Self::Class(other_name) => name.is_none() && other_name.is_some(),
                _ => false,
            },
            _ => false,
        }
    }

    /// Parameterises this type with access arguments (`Integer[1, 2]`,
    /// `Array[String]`, `File['/x']`, …).
    ///
    /// # Errors
    /// Returns a message describing the invalid parameterisation.
    #[allow(clippy::too_many_lines)]
    pub fn parameterize(&self, arguments: &[Value]) -> Result<TypeSpec, String> {
        if arguments.is_empty() {
            return Err("expected at least one access argument".to_string());
        }
        match self {
            Self::Integer { .. } => {
                let (from, to) = integer_bounds(arguments)?;
                Ok(Self::Integer { from, to })
            }
            Self::Float { .. } => {
                let (from, to) = float_bounds(arguments)?;
                Ok(Self::Float { from, to })
            }
            Self::String { .. } => {
                let (min, max) = integer_bounds(arguments)?;
                Ok(Self::String { min, max })
            }
            Self::Regexp(_) => match arguments {
                [Value::String(pattern)] => {
                    ValueRegex::new(pattern.clone())
                        .map_err(|e| format!("invalid regular expression: {e}"))?;
                    Ok(Self::Regexp(Some(pattern.clone())))
                }
                [Value::Regex(r)] => Ok(Self::Regexp(Some(r.pattern().clone()))),
                _ => Err(format!(
                    "expected String or Regexp for Regexp parameter but found {}",
                    super::get_type(&arguments[0])
                )),
            },
            Self::Array { .. } => {
                let element = type_argument(&arguments[0])?;
                let (min, max) = integer_bounds(arguments.get(1..).unwrap_or(&[]))?;
                Ok(Self::Array {
                    element: Box::new(element),
                    min,
                    max,
                })
            }
            Self::Hash { .. } => {
                if arguments.len() < 2 {
                    return Err("expected a key type and a value type for Hash".to_string());
                }
                let key = type_argument(&arguments[0])?;
                let value = type_argument(&arguments[1])?;
                let (min, max) = integer_bounds(arguments.get(2..).unwrap_or(&[]))?;
                Ok(Self::Hash {
                    key: Box::new(key),
                    value: Box::new(value),
                    min,
                    max,
                })
            }
            Self::Variant(_) => {
                let members = arguments
                    .iter()
                    .map(type_argument)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Variant(members))
            }
            Self::Optional(_) => match arguments {
                [argument] => Ok(Self::Optional(Some(Box::new(type_argument(argument)?)))),
                _ => Err("expected a single type for Optional".to_string()),
            },
            Self::Tuple { .. } => {
                let mut types = Vec::new();
                let mut bounds = Vec::new();
                for argument in arguments {
                    match dereference(argument) {
                        Value::Integer(_) | Value::Default if !types.is_empty() => {
                            bounds.push(argument.clone());
                        }
                        _ => {
                            if !bounds.is_empty() {
                                return Err(
                                    "size bounds must follow the Tuple member types".to_string()
                                );
                            }
                            types.push(type_argument(argument)?);
                        }
                    }
                }
                let (min, max) = integer_bounds(&bounds)?;
                Ok(Self::Tuple { types, min, max })
            }
            Self::Struct(_) => match arguments {
                [argument] => match dereference(argument) {
                    Value::Hash(hash) => {
                        let mut members = Vec::new();
                        for (key, value) in hash {
                            let Value::String(name) = dereference(key) else {
                                return Err("Struct member names must be strings".to_string());
                            };
                            members.push((name.clone(), type_argument(value)?));
                        }
                        Ok(Self::Struct(members))
                    }
                    _ => Err("expected a Hash of member types for Struct".to_string()),
                },
                _ => Err("expected a single Hash for Struct".to_string()),
            },
            Self::Type(_) => match arguments {
                [argument] => Ok(Self::Type(Some(Box::new(type_argument(argument)?)))),
                _ => Err("expected a single type for Type".to_string()),
            },
            Self::Resource { type_name, title } => {
                resource_parameters(type_name.clone(), title.clone(), arguments)
            }
            Self::Class(_) => match arguments {
                [argument] => match dereference(argument) {
                    Value::String(name) => Ok(Self::Class(Some(
                        name.strip_prefix("::").unwrap_or(name).to_lowercase().into(),
                    ))),
                    Value::Type(TypeSpec::Class(Some(name))) => {
                        Ok(Self::Class(Some(name.clone())))
                    }
                    _ => Err("expected a class name for Class".to_string()),
                },
                _ => Err("expected a single class name for Class".to_string()),
            },
            Self::Enum(_) => {
                let mut options = Vec::new();
                for argument in arguments {
                    match dereference(argument) {
                        Value::String(s) => options.push(s.clone()),
                        other => {
                            return Err(format!(
                                "expected String for Enum option but found {}",
                                super::get_type(other)
                            ));
                        }
                    }
                }
                Ok(Self::Enum(options))
            }
            Self::Pattern(_) => {
                let mut patterns = Vec::new();
                for argument in arguments {
                    let pattern = match dereference(argument) {
                        Value::String(s) => s.clone(),
                        Value::Regex(r) => r.pattern().clone(),
                        other => {
                            return Err(format!(
                                "expected String or Regexp for Pattern but found {}",
                                super::get_type(other)
                            ));
                        }
                    };
                    patterns.push(
                        ValueRegex::new(pattern)
                            .map_err(|e| format!("invalid regular expression: {e}"))?,
                    );
                }
                Ok(Self::Pattern(patterns))
            }
            Self::Collection { .. } => {
                let (min, max) = integer_bounds(arguments)?;
                Ok(Self::Collection { min, max })
            }
            other => Err(format!("type {other} cannot be parameterized")),
        }
    }
}

/// Checks one range bound against a parent bound (`lower` selects the
/// direction). `None` means unbounded.
fn bound_within(child: Option<i64>, parent: Option<i64>, lower: bool) -> bool {
    match (child, parent) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(c), Some(p)) => {
            if lower {
                c >= p
            } else {
                c <= p
            }
        }
    }
}

fn type_argument(value: &Value) -> Result<TypeSpec, String> {
    match dereference(value) {
        Value::Type(t) => Ok(t.clone()),
        other => Err(format!(
            "expected Type for access argument but found {}",
            super::get_type(other)
        )),
    }
}

fn integer_bounds(arguments: &[Value]) -> Result<(Option<i64>, Option<i64>), String> {
    if arguments.len() > 2 {
        return Err("expected at most two range bounds".to_string());
    }
    let mut bounds = [None, None];
    for (i, argument) in arguments.iter().enumerate() {
        bounds[i] = match dereference(argument) {
            Value::Integer(n) => Some(*n),
            Value::Default => None,
            other => {
                return Err(format!(
                    "expected Integer or default for range bound but found {}",
                    super::get_type(other)
                ));
            }
        };
    }
    Ok((bounds[0], bounds[1]))
}

#[allow(clippy::cast_precision_loss)]
fn float_bounds(arguments: &[Value]) -> Result<(Option<f64>, Option<f64>), String> {
    if arguments.len() > 2 {
        return Err("expected at most two range bounds".to_string());
    }
    let mut bounds = [None, None];
    for (i, argument) in arguments.iter().enumerate() {
        bounds[i] = match dereference(argument) {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Default => None,
            other => {
                return Err(format!(
                    "expected Numeric or default for range bound but found {}",
                    super::get_type(other)
                ));
            }
        };
    }
    Ok((bounds[0], bounds[1]))
}

fn resource_parameters(
    type_name: Option<EcoString>,
    title: Option<EcoString>,
    arguments: &[Value],
) -> Result<TypeSpec, String> {
    let mut type_name = type_name;
    let mut titles = Vec::new();

    let mut remaining = arguments;
    if type_name.is_none() {
        let first = dereference(&remaining[0]);
        type_name = Some(match first {
            Value::String(s) => normalize_type_name(s),
            Value::Type(TypeSpec::Resource {
                type_name: Some(name),
                title: None,
            }) => name.clone(),
            other => {
                return Err(format!(
                    "expected String or Resource type for resource type name but found {}",
                    super::get_type(other)
                ));
            }
        });
        remaining = remaining.get(1..).unwrap_or(&[]);
    }

    for argument in remaining {
        match dereference(argument) {
            Value::String(s) => titles.push(s.clone()),
            other => {
                return Err(format!(
                    "expected String for resource title but found {}",
                    super::get_type(other)
                ));
            }
        }
    }

    if title.is_some() {
        return Err("resource type is already fully qualified".to_string());
    }

    match titles.len() {
        0 => Ok(TypeSpec::Resource {
            type_name,
            title: None,
        }),
        1 => Ok(TypeSpec::Resource {
            type_name,
            title: titles.pop(),
        }),
        _ => Ok(TypeSpec::Variant(
            titles
                .into_iter()
                .map(|t| TypeSpec::Resource {
                    type_name: type_name.clone(),
                    title: Some(t),
                })
                .collect(),
        )),
    }
}

impl std::fmt::Display for TypeSpec {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn bounds(
            f: &mut std::fmt::Formatter<'_>,
            from: Option<i64>,
            to: Option<i64>,
        ) -> std::fmt::Result {
            match (from, to) {
                (None, None) => Ok(()),
                (Some(lo), None) => write!(f, "[{lo}]"),
                (None, Some(hi)) => write!(f, "[default, {hi}]"),
                (Some(lo), Some(hi)) => write!(f, "[{lo}, {hi}]"),
            }
        }

        match self {
            Self::Any => write!(f, "Any"),
            Self::Undef => write!(f, "Undef"),
            Self::Default => write!(f, "Default"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Integer { from, to } => {
                write!(f, "Integer")?;
                bounds(f, *from, *to)
            }
            Self::Float { from, to } => {
                write!(f, "Float")?;
                match (from, to) {
                    (None, None) => Ok(()),
                    (Some(lo), None) => write!(f, "[{lo}]"),
                    (None, Some(hi)) => write!(f, "[default, {hi}]"),
                    (Some(lo), Some(hi)) => write!(f, "[{lo}, {hi}]"),
                }
            }
            Self::String { min, max } => {
                write!(f, "String")?;
                bounds(f, *min, *max)
            }
            Self::Regexp(pattern) => match pattern {
                None => write!(f, "Regexp"),
                Some(p) => write!(f, "Regexp[/{p}/]"),
            },
            Self::Array { element, min, max } => {
                if **element == Self::Any && min.is_none() && max.is_none() {
                    return write!(f, "Array");
                }
                write!(f, "Array[{element}")?;
                if let Some(lo) = min {
                    write!(f, ", {lo}")?;
                }
                if let Some(hi) = max {
                    write!(f, ", {hi}")?;
                }
                write!(f, "]")
            }
            Self::Hash {
                key,
                value,
                min,
                max,
            } => {
                if **key == Self::Any && **value == Self::Any && min.is_none() && max.is_none() {
                    return write!(f, "Hash");
                }
                write!(f, "Hash[{key}, {value}")?;
                if let Some(lo) = min {
                    write!(f, ", {lo}")?;
                }
                if let Some(hi) = max {
                    write!(f, ", {hi}")?;
                }
                write!(f, "]")
            }
            Self::Variant(members) => {
                if members.is_empty() {
                    return write!(f, "Variant");
                }
                write!(f, "Variant[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, "]")
            }
            Self::Optional(inner) => match inner {
                None => write!(f, "Optional"),
                Some(t) => write!(f, "Optional[{t}]"),
            },
            Self::Tuple { types, .. } => {
                if types.is_empty() {
                    return write!(f, "Tuple");
                }
                write!(f, "Tuple[")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
            Self::Struct(members) => {
                if members.is_empty() {
                    return write!(f, "Struct");
                }
                write!(f, "Struct[{{")?;
                for (i, (name, t)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{name}' => {t}")?;
                }
                write!(f, "}}]")
            }
            Self::Type(inner) => match inner {
                None => write!(f, "Type"),
                Some(t) => write!(f, "Type[{t}]"),
            },
            Self::Resource { type_name, title } => match (type_name, title) {
                (None, _) => write!(f, "Resource"),
                (Some(name), None) => write!(f, "{name}"),
                (Some(name), Some(title)) => write!(f, "{name}[{title}]"),
            },
            Self::Class(name) => match name {
                None => write!(f, "Class"),
                Some(name) => write!(f, "Class[{name}]"),
            },
            Self::Enum(options) => {
                if options.is_empty() {
                    return write!(f, "Enum");
                }
                write!(f, "Enum[")?;
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{option}'")?;
                }
                write!(f, "]")
            }
            Self::Pattern(patterns) => {
                if patterns.is_empty() {
                    return write!(f, "Pattern");
                }
                write!(f, "Pattern[")?;
                for (i, pattern) in patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "/{}/", pattern.pattern())?;
                }
                write!(f, "]")
            }
            Self::Callable => write!(f, "Callable"),
            Self::Numeric => write!(f, "Numeric"),
            Self::Scalar => write!(f, "Scalar"),
            Self::Data => write!(f, "Data"),
            Self::Collection { min, max } => {
                write!(f, "Collection")?;
                bounds(f, *min, *max)
            }
            Self::CatalogEntry => write!(f, "CatalogEntry"),
        }
    }
}

/// Language equality between a value and an expected value, using regex
/// matching when the expected value is a regex.
#[must_use]
pub fn value_matches(actual: &Value, expected: &Value) -> bool {
    match (dereference(actual), dereference(expected)) {
        (Value::String(s), Value::Regex(r)) => r.regex().is_match(s),
        (actual, Value::Type(t)) => t.is_instance(actual),
        (actual, expected) => equals(actual, expected),
    }
}
