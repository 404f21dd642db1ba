// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Binary operator semantics.
//!
//! Integer arithmetic is checked: overflow, division by zero, and the
//! `i64::MIN` edge cases are evaluation errors. Float arithmetic detects
//! overflow, underflow, and division by zero after the fact (finite inputs
//! producing non-finite or spuriously-zero outputs). Mixed integer/float
//! operands promote to float.
//!
//! String comparison is case-insensitive; type comparison uses the subtype
//! relation (`left <= right` iff the types are equal or `left` is a
//! specialization of `right`).

use crate::ast::BinaryOperator;
use crate::catalog::{Relationship, each_resource};
use crate::source_analysis::Span;
use crate::values::{Value, ValueRegex, dereference, equals, get_type, mutate, string_iequals};

use super::error::EvalResult;
use super::evaluator::Evaluator;

impl Evaluator<'_, '_> {
    /// Applies a (non-short-circuiting, non-assignment) binary operator.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn binary_operation(
        &mut self,
        op: BinaryOperator,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        match op {
            BinaryOperator::Plus => self.arithmetic(
                "addition",
                left,
                left_span,
                right,
                right_span,
                i64::checked_add,
                |l, r| l + r,
            ),
            BinaryOperator::Minus => self.arithmetic(
                "subtraction",
                left,
                left_span,
                right,
                right_span,
                i64::checked_sub,
                |l, r| l - r,
            ),
            BinaryOperator::Multiply => self.arithmetic(
                "multiplication",
                left,
                left_span,
                right,
                right_span,
                i64::checked_mul,
                |l, r| l * r,
            ),
            BinaryOperator::Divide => self.divide(left, left_span, right, right_span),
            BinaryOperator::Modulo => self.modulo(left, left_span, right, right_span),
            BinaryOperator::LeftShift => self.left_shift(left, left_span, right, right_span),
            BinaryOperator::RightShift => self.right_shift(left, left_span, right, right_span),
            BinaryOperator::Equals => Ok(Value::Boolean(equals(&left, &right))),
            BinaryOperator::NotEquals => Ok(Value::Boolean(!equals(&left, &right))),
            BinaryOperator::LessThan
            | BinaryOperator::LessEquals
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEquals => {
                self.comparison(op, left, left_span, right, right_span)
            }
            BinaryOperator::Match => {
                let matched = self.match_operation(&left, left_span, &right, right_span)?;
                Ok(Value::Boolean(matched))
            }
            BinaryOperator::NotMatch => {
                let matched = self.match_operation(&left, left_span, &right, right_span)?;
                Ok(Value::Boolean(!matched))
            }
            BinaryOperator::In => Ok(Value::Boolean(self.in_operation(&left, &right))),
            BinaryOperator::And
            | BinaryOperator::Or
            | BinaryOperator::Assign
            | BinaryOperator::Before
            | BinaryOperator::Notify
            | BinaryOperator::Require
            | BinaryOperator::Subscribe => {
                unreachable!("handled before operator dispatch")
            }
        }
    }

    /// `+`, `-`, `*`: checked integer arithmetic with float promotion;
    /// `+` additionally concatenates arrays and merges hashes.
    #[allow(clippy::too_many_arguments, clippy::cast_precision_loss)]
    fn arithmetic(
        &self,
        operation: &str,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
        int_op: impl Fn(i64, i64) -> Option<i64>,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> EvalResult<Value> {
        let left = mutate(left);
        let right = mutate(right);
        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => int_op(l, r).map(Value::Integer).ok_or_else(|| {
                self.raise(
                    left_span,
                    format!("{operation} of {l} and {r} results in an arithmetic overflow."),
                )
            }),
            (Value::Integer(l), Value::Float(r)) => {
                self.float_result(operation, float_op(l as f64, r), left_span)
            }
            (Value::Float(l), Value::Integer(r)) => {
                self.float_result(operation, float_op(l, r as f64), left_span)
            }
            (Value::Float(l), Value::Float(r)) => {
                self.float_result(operation, float_op(l, r), left_span)
            }
            (Value::Array(mut l), right) if operation == "addition" => {
                match right {
                    Value::Array(r) => l.extend(r),
                    other => l.push(other),
                }
                Ok(Value::Array(l))
            }
            (Value::Hash(mut l), Value::Hash(r)) if operation == "addition" => {
                // Merge: the right side wins
                for (key, value) in r {
                    l.insert(key, value);
                }
                Ok(Value::Hash(l))
            }
            (Value::Hash(_), right) if operation == "addition" => Err(self.raise(
                right_span,
                format!("expected Hash for hash merge but found {}.", get_type(&right)),
            )),
            (left, right) => {
                let (span, found) = if matches!(left, Value::Integer(_) | Value::Float(_)) {
                    (right_span, get_type(&right))
                } else {
                    (left_span, get_type(&left))
                };
                Err(self.raise(
                    span,
                    format!("expected Numeric for arithmetic {operation} but found {found}."),
                ))
            }
        }
    }

    /// Checks a float result for overflow/underflow.
    fn float_result(&self, operation: &str, result: f64, span: Span) -> EvalResult<Value> {
        if result.is_infinite() || result.is_nan() {
            return Err(self.raise(
                span,
                format!("{operation} results in an arithmetic overflow."),
            ));
        }
        Ok(Value::Float(result))
    }

    /// `/`: division with zero and `i64::MIN / -1` detection.
    #[allow(clippy::cast_precision_loss)]
    fn divide(
        &self,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        match (dereference(&left), dereference(&right)) {
            (Value::Integer(l), Value::Integer(r)) => {
                if *r == 0 {
                    return Err(self.raise(right_span, "cannot divide by zero."));
                }
                l.checked_div(*r).map(Value::Integer).ok_or_else(|| {
                    self.raise(
                        left_span,
                        format!("division of {l} by {r} results in an arithmetic overflow."),
                    )
                })
            }
            (Value::Integer(l), Value::Float(r)) => self.float_divide(*l as f64, *r, right_span),
            (Value::Float(l), Value::Integer(r)) => self.float_divide(*l, *r as f64, right_span),
            (Value::Float(l), Value::Float(r)) => self.float_divide(*l, *r, right_span),
            (Value::Integer(_) | Value::Float(_), other) => Err(self.raise(
                right_span,
                format!("expected Numeric for arithmetic division but found {}.", get_type(other)),
            )),
            (other, _) => Err(self.raise(
                left_span,
                format!("expected Numeric for arithmetic division but found {}.", get_type(other)),
            )),
        }
    }

    fn float_divide(&self, left: f64, right: f64, right_span: Span) -> EvalResult<Value> {
        if right == 0.0 {
            return Err(self.raise(right_span, "cannot divide by zero."));
        }
        let result = left / right;
        if result.is_infinite() {
            return Err(self.raise(
                right_span,
                format!("division of {left} by {right} results in an arithmetic overflow."),
            ));
        }
        if result == 0.0 && left != 0.0 {
            return Err(self.raise(
                right_span,
                format!("division of {left} by {right} results in an arithmetic underflow."),
            ));
        }
        Ok(Value::Float(result))
    }

    /// `%`: integer modulo with zero detection.
    fn modulo(
        &self,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        match (dereference(&left), dereference(&right)) {
            (Value::Integer(l), Value::Integer(r)) => {
                if *r == 0 {
                    return Err(self.raise(right_span, "cannot divide by zero."));
                }
                l.checked_rem(*r).map(Value::Integer).ok_or_else(|| {
                    self.raise(
                        left_span,
                        format!("modulo of {l} by {r} results in an arithmetic overflow."),
                    )
                })
            }
            (Value::Integer(_), other) => Err(self.raise(
                right_span,
                format!("expected Integer for modulo but found {}.", get_type(other)),
            )),
            (other, _) => Err(self.raise(
                left_span,
                format!("expected Integer for modulo but found {}.", get_type(other)),
            )),
        }
    }

    /// `<<`: arithmetic shift on integers (a negative count reverses the
    /// direction, the sign bit is kept); append on arrays.
    fn left_shift(
        &mut self,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        let left = mutate(left);
        let right = mutate(right);
        match (left, right) {
            (Value::Array(mut elements), right) => {
                elements.push(right);
                Ok(Value::Array(elements))
            }
            (Value::Integer(l), Value::Integer(r)) => {
                self.shift(l, r, left_span, false)
            }
            (Value::Integer(_), right) => Err(self.raise(
                right_span,
                format!(
                    "expected Integer for bitwise left shift but found {}.",
                    get_type(&right)
                ),
            )),
            (left, _) => Err(self.raise(
                left_span,
                format!(
                    "expected Integer for bitwise left shift but found {}.",
                    get_type(&left)
                ),
            )),
        }
    }

    /// `>>`: arithmetic right shift on integers.
    fn right_shift(
        &mut self,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        match (dereference(&left), dereference(&right)) {
            (Value::Integer(l), Value::Integer(r)) => self.shift(*l, *r, left_span, true),
            (Value::Integer(_), other) => Err(self.raise(
                right_span,
                format!(
                    "expected Integer for bitwise right shift but found {}.",
                    get_type(other)
                ),
            )),
            (other, _) => Err(self.raise(
                left_span,
                format!(
                    "expected Integer for bitwise right shift but found {}.",
                    get_type(other)
                ),
            )),
        }
    }

    /// Shifts with sign preservation, direction reversal on negative
    /// counts, and overflow detection when shifting left.
    fn shift(&self, left: i64, count: i64, span: Span, rightward: bool) -> EvalResult<Value> {
        let rightward = rightward ^ (count < 0);
        let magnitude = count.unsigned_abs().min(u64::from(u32::MAX)) as u32;
        let negative = left < 0;
        let absolute = left.unsigned_abs();

        let shifted = if rightward {
            absolute.checked_shr(magnitude).unwrap_or(0)
        } else {
            let Some(shifted) = absolute.checked_shl(magnitude) else {
                return Err(self.raise(
                    span,
                    format!("shift of {left} by {count} results in an arithmetic overflow."),
                ));
            };
            if shifted >> magnitude != absolute || shifted > i64::MAX as u64 {
                return Err(self.raise(
                    span,
                    format!("shift of {left} by {count} results in an arithmetic overflow."),
                ));
            }
            shifted
        };

        #[allow(clippy::cast_possible_wrap)]
        let result = if negative {
            -(shifted as i64)
        } else {
            shifted as i64
        };
        Ok(Value::Integer(result))
    }

    /// `< <= > >=`: numeric, case-insensitive string, and type comparison.
    fn comparison(
        &self,
        op: BinaryOperator,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        use std::cmp::Ordering;

        #[allow(clippy::cast_precision_loss)]
        let ordering: Option<Ordering> = match (dereference(&left), dereference(&right)) {
            (Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
            (Value::Integer(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
            (Value::Float(l), Value::Integer(r)) => l.partial_cmp(&(*r as f64)),
            (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
            (Value::String(l), Value::String(r)) => {
                if string_iequals(l, r) {
                    Some(Ordering::Equal)
                } else {
                    Some(
                        l.to_lowercase().cmp(&r.to_lowercase()),
                    )
                }
            }
            (Value::Type(l), Value::Type(r)) => {
                let result = match op {
                    BinaryOperator::LessThan => r.is_specialization(l),
                    BinaryOperator::LessEquals => l == r || r.is_specialization(l),
                    BinaryOperator::GreaterThan => l.is_specialization(r),
                    BinaryOperator::GreaterEquals => l == r || l.is_specialization(r),
                    _ => unreachable!("comparison operators only"),
                };
                return Ok(Value::Boolean(result));
            }
            (Value::Integer(_) | Value::Float(_), other) => {
                return Err(self.raise(
                    right_span,
                    format!("expected Numeric for comparison but found {}.", get_type(other)),
                ));
            }
            (Value::String(_), other) => {
                return Err(self.raise(
                    right_span,
                    format!("expected String for comparison but found {}.", get_type(other)),
                ));
            }
            (other, _) => {
                return Err(self.raise(
                    left_span,
                    format!(
                        "expected Numeric, String, or Type for comparison but found {}.",
                        get_type(other)
                    ),
                ));
            }
        };

        let Some(ordering) = ordering else {
            return Err(self.raise(left_span, "values cannot be compared."));
        };
        let result = match op {
            BinaryOperator::LessThan => ordering == Ordering::Less,
            BinaryOperator::LessEquals => ordering != Ordering::Greater,
            BinaryOperator::GreaterThan => ordering == Ordering::Greater,
            BinaryOperator::GreaterEquals => ordering != Ordering::Less,
            _ => unreachable!("comparison operators only"),
        };
        Ok(Value::Boolean(result))
    }

    /// `=~` / `!~`: the left operand must be a string; the right operand is
    /// a regex, a regex-like string, or a type. A successful regex match
    /// publishes `$0…$n`.
    fn match_operation(
        &mut self,
        left: &Value,
        left_span: Span,
        right: &Value,
        right_span: Span,
    ) -> EvalResult<bool> {
        if let Value::Type(t) = dereference(right) {
            return Ok(t.is_instance(left));
        }

        let Value::String(subject) = dereference(left) else {
            return Err(self.raise(
                left_span,
                format!("expected String for match but found {}.", get_type(left)),
            ));
        };

        let regex = match dereference(right) {
            Value::Regex(regex) => regex.clone(),
            Value::String(pattern) => ValueRegex::new(pattern.clone()).map_err(|error| {
                self.raise(right_span, format!("invalid regular expression: {error}"))
            })?,
            other => {
                return Err(self.raise(
                    right_span,
                    format!(
                        "expected Regexp or String for match but found {}.",
                        get_type(other)
                    ),
                ));
            }
        };

        match regex.regex().captures(subject) {
            Some(captures) => {
                self.set_match_variables(&captures);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// `in`: substring, array element, hash key, regex, or type tests.
    pub(crate) fn in_operation(&mut self, left: &Value, right: &Value) -> bool {
        match (dereference(left), dereference(right)) {
            (Value::String(needle), Value::String(haystack)) => {
                let needle = needle.to_lowercase();
                haystack.to_lowercase().contains(needle.as_str())
            }
            (Value::Regex(regex), Value::String(haystack)) => {
                match regex.regex().captures(haystack) {
                    Some(captures) => {
                        self.set_match_variables(&captures);
                        true
                    }
                    None => false,
                }
            }
            (Value::Type(t), Value::Array(elements)) => {
                elements.iter().any(|element| t.is_instance(element))
            }
            (Value::Regex(regex), Value::Array(elements)) => elements.iter().any(|element| {
                matches!(dereference(element), Value::String(s) if regex.regex().is_match(s))
            }),
            (needle, Value::Array(elements)) => {
                elements.iter().any(|element| equals(needle, element))
            }
            (Value::Type(t), Value::Hash(hash)) => hash.keys().any(|key| t.is_instance(key)),
            (needle, Value::Hash(hash)) => hash.keys().any(|key| equals(needle, key)),
            _ => false,
        }
    }

    /// `-> ~> <- <~`: appends the right operand's references to the left
    /// operand resources' relationship metaparameter. Both sides must name
    /// resources already in the catalog. The expression's value is the
    /// array of right-hand references, so chains associate.
    pub(crate) fn add_relationship(
        &mut self,
        op: BinaryOperator,
        left: Value,
        left_span: Span,
        right: Value,
        right_span: Span,
    ) -> EvalResult<Value> {
        let relationship = match op {
            BinaryOperator::Before => Relationship::Before,
            BinaryOperator::Notify => Relationship::Notify,
            BinaryOperator::Require => Relationship::Require,
            BinaryOperator::Subscribe => Relationship::Subscribe,
            _ => unreachable!("edge operators only"),
        };

        // Resolve the targets
        let mut targets = Vec::new();
        let result = each_resource(&right, &mut |reference| {
            if self.context.catalog.find_resource(&reference).is_none() {
                return Err(format!(
                    "cannot create relationship: resource {reference} does not exist in the catalog."
                ));
            }
            targets.push(reference);
            Ok(())
        });
        if let Err(message) = result {
            return Err(self.raise(right_span, message));
        }

        let target_values: Vec<Value> = targets
            .iter()
            .map(|reference| Value::Type(reference.to_type()))
            .collect();

        // Append to each source's metaparameter
        let mut sources = Vec::new();
        let result = each_resource(&left, &mut |reference| {
            if self.context.catalog.find_resource(&reference).is_none() {
                return Err(format!(
                    "cannot create relationship: resource {reference} does not exist in the catalog."
                ));
            }
            sources.push(reference);
            Ok(())
        });
        if let Err(message) = result {
            return Err(self.raise(left_span, message));
        }

        for source in sources {
            let resource = self
                .context
                .catalog
                .find_resource_mut(&source)
                .expect("existence checked above");
            resource.attributes_mut().append(
                relationship.parameter(),
                Value::Array(target_values.clone()),
                true,
            );
        }

        Ok(Value::Array(target_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EmptyStore};
    use crate::diagnostics::{CollectingSink, Logger};
    use crate::runtime::EvaluationContext;
    use crate::source_analysis::{SourceFile, parse_source};
    use std::rc::Rc;

    fn evaluate_one(source_text: &str) -> EvalResult<Value> {
        let source = Rc::new(SourceFile::new("test.mf", source_text));
        let (manifest, diagnostics) = parse_source(source_text);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");

        let mut sink = CollectingSink::new();
        let store = EmptyStore;
        let mut context =
            EvaluationContext::new(Catalog::new(), None, Logger::new(&mut sink), &store);
        let mut evaluator = Evaluator::new(source, &mut context);

        let mut result = Value::Undef;
        for expression in &manifest.body {
            result = evaluator.evaluate(expression)?;
        }
        Ok(result)
    }

    #[track_caller]
    fn value_of(source: &str) -> Value {
        mutate(evaluate_one(source).expect("evaluation succeeds"))
    }

    #[track_caller]
    fn error_of(source: &str) -> String {
        evaluate_one(source)
            .expect_err("evaluation should fail")
            .message()
            .to_string()
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(value_of("$x = 1 + 2 * 3"), Value::Integer(7));
        assert_eq!(value_of("$x = 7 % 3"), Value::Integer(1));
        assert_eq!(value_of("$x = 10 / 2"), Value::Integer(5));
        assert_eq!(value_of("$x = 2 - 5"), Value::Integer(-3));
    }

    #[test]
    fn float_promotion() {
        assert_eq!(value_of("$x = 1 + 0.5"), Value::Float(1.5));
        assert_eq!(value_of("$x = 3.0 / 2"), Value::Float(1.5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(error_of("$x = 1/0").contains("cannot divide by zero."));
        assert!(error_of("$x = 1 % 0").contains("cannot divide by zero."));
        assert!(error_of("$x = 1.0 / 0.0").contains("cannot divide by zero."));
    }

    #[test]
    fn integer_overflow_is_detected() {
        assert!(error_of("$x = 9223372036854775807 + 1").contains("overflow"));
        assert!(error_of("$x = -9223372036854775807 - 2").contains("overflow"));
        assert!(error_of("$x = 1 << 64").contains("overflow"));
    }

    #[test]
    fn int_min_division_overflows() {
        assert!(error_of("$x = (0 - 9223372036854775807 - 1) / -1").contains("overflow"));
    }

    #[test]
    fn shifts_reverse_on_negative_counts_and_keep_sign() {
        assert_eq!(value_of("$x = 1 << 4"), Value::Integer(16));
        assert_eq!(value_of("$x = 16 >> 2"), Value::Integer(4));
        assert_eq!(value_of("$x = 16 << -2"), Value::Integer(4));
        assert_eq!(value_of("$x = 1 >> -4"), Value::Integer(16));
        assert_eq!(value_of("$x = (0 - 16) >> 2"), Value::Integer(-4));
    }

    #[test]
    fn array_concatenation_and_append() {
        assert_eq!(
            value_of("$x = [1, 2] + [3]"),
            Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );
        assert_eq!(
            value_of("$x = [1] << 2"),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        // << appends an array as a single element
        assert_eq!(
            value_of("$x = [1] << [2]"),
            Value::Array(vec![
                Value::Integer(1),
                Value::Array(vec![Value::Integer(2)])
            ])
        );
    }

    #[test]
    fn hash_merge_right_wins() {
        let value = value_of("$x = { 'a' => 1, 'b' => 1 } + { 'b' => 2 }");
        let Value::Hash(hash) = value else {
            panic!("expected hash");
        };
        assert_eq!(hash.get(&Value::from("a")), Some(&Value::Integer(1)));
        assert_eq!(hash.get(&Value::from("b")), Some(&Value::Integer(2)));
    }

    #[test]
    fn string_comparison_is_case_insensitive() {
        assert_eq!(value_of("$x = 'Apple' == 'apple'"), Value::Boolean(true));
        assert_eq!(value_of("$x = 'a' < 'B'"), Value::Boolean(true));
        assert_eq!(value_of("$x = 'b' <= 'B'"), Value::Boolean(true));
    }

    #[test]
    fn type_comparison_uses_subtyping() {
        assert_eq!(value_of("$x = Integer <= Numeric"), Value::Boolean(true));
        assert_eq!(value_of("$x = Numeric < Scalar"), Value::Boolean(true));
        assert_eq!(value_of("$x = Numeric <= Integer"), Value::Boolean(false));
        assert_eq!(value_of("$x = Any > String"), Value::Boolean(true));
    }

    #[test]
    fn match_operator_sets_match_variables() {
        assert_eq!(value_of("$x = 'hello' =~ /^h(.*)o$/"), Value::Boolean(true));
        assert_eq!(value_of("$x = 'hello' !~ /z/"), Value::Boolean(true));
        // $0 and $1 are readable after a successful match
        assert_eq!(
            value_of("$m = 'hello' =~ /^h(.*)o$/\n$x = \"$0:$1\""),
            Value::from("hello:ell")
        );
    }

    #[test]
    fn match_against_type_tests_instances() {
        assert_eq!(value_of("$x = 5 =~ Integer"), Value::Boolean(true));
        assert_eq!(value_of("$x = 'a' =~ Integer"), Value::Boolean(false));
    }

    #[test]
    fn match_requires_a_string_subject() {
        assert!(error_of("$x = 5 =~ /a/").contains("expected String"));
    }

    #[test]
    fn in_operator() {
        assert_eq!(value_of("$x = 'ell' in 'Hello'"), Value::Boolean(true));
        assert_eq!(value_of("$x = 2 in [1, 2, 3]"), Value::Boolean(true));
        assert_eq!(value_of("$x = 'a' in { 'a' => 1 }"), Value::Boolean(true));
        assert_eq!(value_of("$x = /^h/ in ['x', 'hat']"), Value::Boolean(true));
        assert_eq!(value_of("$x = Integer in ['a', 2]"), Value::Boolean(true));
        assert_eq!(value_of("$x = 5 in 5"), Value::Boolean(false));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(value_of("$x = false and 1/0"), Value::Boolean(false));
        assert_eq!(value_of("$x = true or 1/0"), Value::Boolean(true));
        assert_eq!(value_of("$x = true and false"), Value::Boolean(false));
    }

    #[test]
    fn assignment_semantics() {
        assert!(error_of("$x = 1\n$x = 2").contains("previously assigned"));
        assert!(error_of("$0 = 1").contains("match variable"));
        assert!(error_of("$a::b = 1").contains("local to the current scope"));
        assert!(error_of("1 = 2").contains("assignment can only be performed on variables"));
    }

    #[test]
    fn comparison_type_errors() {
        assert!(error_of("$x = 1 < 'a'").contains("expected Numeric"));
        assert!(error_of("$x = 'a' < 1").contains("expected String"));
        assert!(error_of("$x = true < false").contains("expected Numeric, String, or Type"));
    }
}
