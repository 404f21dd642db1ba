// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The definition scanner.
//!
//! Classes can be declared before they are defined, so a pre-evaluation
//! pass walks every manifest's AST and registers class, defined type, and
//! node definitions in the catalog. The scanner also enforces the naming
//! rules: reserved names, `::` prefixes, parameter restrictions, nesting
//! (definitions live at top level or directly inside a class body), name
//! collisions between classes and defined types, and consistent `inherits`
//! parents across multiple definitions of one class.

use std::rc::Rc;

use ecow::EcoString;

use crate::ast::{
    ClassDefinitionExpression, DefinedTypeExpression, Expression, Lambda, Manifest,
    NodeDefinitionExpression, Parameter, QueryExpression, StringSegment,
};
use crate::runtime::{EvalResult, EvaluationError};
use crate::source_analysis::{SourceFile, Span};

use super::{Catalog, ClassDefinition, DefinedType, NodeDefinition, RESERVED_CLASS_NAMES};

/// Scans syntax trees for catalog definitions before evaluation.
pub struct DefinitionScanner<'c> {
    catalog: &'c mut Catalog,
}

impl<'c> DefinitionScanner<'c> {
    /// Creates a scanner that registers definitions into `catalog`.
    pub fn new(catalog: &'c mut Catalog) -> Self {
        Self { catalog }
    }

    /// Scans one manifest.
    ///
    /// # Errors
    /// Fails on any definition validation error.
    pub fn scan(&mut self, source: &Rc<SourceFile>, manifest: &Manifest) -> EvalResult<()> {
        let mut walker = Walker {
            catalog: self.catalog,
            source: Rc::clone(source),
            // The marker entry makes the top level a definition context.
            scopes: vec![EcoString::from("::")],
        };
        for expression in &manifest.body {
            walker.expression(expression)?;
        }
        Ok(())
    }
}

struct Walker<'c> {
    catalog: &'c mut Catalog,
    source: Rc<SourceFile>,
    /// Class-scope stack: the last entry is non-empty inside a class body
    /// (or at top level), empty inside any other construct.
    scopes: Vec<EcoString>,
}

impl Walker<'_> {
    fn error(&self, span: Span, message: impl Into<String>) -> EvaluationError {
        EvaluationError::at(message.into(), Rc::clone(&self.source), span)
    }

    fn can_define(&self) -> bool {
        self.scopes.last().is_some_and(|scope| !scope.is_empty())
    }

    /// Qualifies a definition name with the enclosing class scopes.
    fn qualify(&self, name: &str) -> EcoString {
        let mut qualified = String::new();
        for scope in self.scopes.iter().skip(1) {
            if !scope.is_empty() {
                qualified.push_str(scope);
                qualified.push_str("::");
            }
        }
        qualified.push_str(name);
        qualified.to_lowercase().into()
    }

    /// Walks one expression with a blocked (non-definition) scope.
    fn nested(&mut self, expression: &Expression) -> EvalResult<()> {
        self.scopes.push(EcoString::new());
        let result = self.expression(expression);
        self.scopes.pop();
        result
    }

    fn nested_all(&mut self, expressions: &[Expression]) -> EvalResult<()> {
        for expression in expressions {
            self.nested(expression)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn expression(&mut self, expression: &Expression) -> EvalResult<()> {
        match expression {
            Expression::ClassDefinition(class) => self.class_definition(class),
            Expression::DefinedType(defined) => self.defined_type(defined),
            Expression::NodeDefinition(node) => self.node_definition(node),

            Expression::Undef(_)
            | Expression::Default(_)
            | Expression::Boolean(..)
            | Expression::Integer(..)
            | Expression::Float(..)
            | Expression::Regex(..)
            | Expression::Variable(..)
            | Expression::Name(..)
            | Expression::BareWord(..)
            | Expression::TypeName(..)
            | Expression::Error(_) => Ok(()),

            Expression::String(literal) => {
                for segment in &literal.segments {
                    if let StringSegment::Expression(inner) = segment {
                        self.nested(inner)?;
                    }
                }
                Ok(())
            }

            Expression::Array(elements, _) => self.nested_all(elements),
            Expression::Hash(pairs, _) => {
                for (key, value) in pairs {
                    self.nested(key)?;
                    self.nested(value)?;
                }
                Ok(())
            }

            Expression::Unary { operand, .. } => self.nested(operand),
            Expression::Binary { left, right, .. } => {
                self.nested(left)?;
                self.nested(right)
            }

            Expression::Access {
                target, arguments, ..
            } => {
                self.nested(target)?;
                self.nested_all(arguments)
            }
            Expression::MethodCall {
                target,
                arguments,
                lambda,
                ..
            } => {
                self.nested(target)?;
                self.nested_all(arguments)?;
                self.lambda(lambda.as_ref())
            }
            Expression::Selector { target, cases, .. } => {
                self.nested(target)?;
                for case in cases {
                    self.nested(&case.option)?;
                    self.nested(&case.result)?;
                }
                Ok(())
            }

            Expression::If(expression) => {
                self.nested(&expression.condition)?;
                self.nested_all(&expression.body)?;
                for elsif in &expression.elsifs {
                    self.nested(&elsif.condition)?;
                    self.nested_all(&elsif.body)?;
                }
                if let Some(else_body) = &expression.else_body {
                    self.nested_all(else_body)?;
                }
                Ok(())
            }
            Expression::Unless(expression) => {
                self.nested(&expression.condition)?;
                self.nested_all(&expression.body)?;
                if let Some(else_body) = &expression.else_body {
                    self.nested_all(else_body)?;
                }
                Ok(())
            }
            Expression::Case(expression) => {
                self.nested(&expression.expression)?;
                for proposition in &expression.propositions {
                    self.nested_all(&proposition.options)?;
                    self.nested_all(&proposition.body)?;
                }
                Ok(())
            }
            Expression::FunctionCall {
                arguments, lambda, ..
            } => {
                self.nested_all(arguments)?;
                self.lambda(lambda.as_ref())
            }

            Expression::Resource(resource) => {
                for body in &resource.bodies {
                    self.nested(&body.title)?;
                    for operation in &body.operations {
                        self.nested(&operation.value)?;
                    }
                }
                Ok(())
            }
            Expression::ResourceDefaults(defaults) => {
                for operation in &defaults.operations {
                    self.nested(&operation.value)?;
                }
                Ok(())
            }
            Expression::ResourceOverride(over) => {
                self.nested(&over.reference)?;
                for operation in &over.operations {
                    self.nested(&operation.value)?;
                }
                Ok(())
            }
            Expression::Collection(collection) => {
                if let Some(query) = &collection.query {
                    self.query(query)?;
                }
                Ok(())
            }
        }
    }

    fn query(&mut self, query: &QueryExpression) -> EvalResult<()> {
        match query {
            QueryExpression::Test { value, .. } => self.nested(value),
            QueryExpression::Binary { left, right, .. } => {
                self.query(left)?;
                self.query(right)
            }
        }
    }

    fn lambda(&mut self, lambda: Option<&Lambda>) -> EvalResult<()> {
        let Some(lambda) = lambda else {
            return Ok(());
        };
        for parameter in &lambda.parameters {
            if let Some(type_expr) = &parameter.type_expr {
                self.nested(type_expr)?;
            }
            if let Some(default) = &parameter.default {
                self.nested(default)?;
            }
        }
        self.nested_all(&lambda.body)
    }

    fn class_definition(&mut self, class: &Rc<ClassDefinitionExpression>) -> EvalResult<()> {
        let name = self.validate_name(true, &class.name, class.name_span)?;

        // All definitions of a class must agree on the parent
        let parent = class
            .parent
            .as_ref()
            .map(|(parent, _)| EcoString::from(parent.to_lowercase()));
        if let (Some(parent_name), Some(definitions)) = (&parent, self.catalog.find_class(&name)) {
            for definition in definitions {
                let Some(existing) = &definition.parent else {
                    continue;
                };
                if existing != parent_name {
                    let (_, parent_span) = class.parent.as_ref().expect("parent is present");
                    return Err(self.error(
                        *parent_span,
                        format!(
                            "class '{name}' cannot inherit from '{parent_name}' because the class already inherits from '{existing}' at {}:{}.",
                            definition.source.path(),
                            definition.line()
                        ),
                    ));
                }
            }
        }

        self.validate_parameters(true, &class.parameters)?;

        self.catalog.define_class(ClassDefinition {
            name,
            parent,
            expression: Rc::clone(class),
            source: Rc::clone(&self.source),
        });

        // Parameters scan outside the class scope, the body inside it
        self.scopes.push(EcoString::new());
        for parameter in &class.parameters {
            if let Some(type_expr) = &parameter.type_expr {
                self.expression(type_expr)?;
            }
            if let Some(default) = &parameter.default {
                self.expression(default)?;
            }
        }
        self.scopes.pop();

        self.scopes.push(class.name.to_lowercase().into());
        let result = class.body.iter().try_for_each(|e| self.expression(e));
        self.scopes.pop();
        result
    }

    fn defined_type(&mut self, defined: &Rc<DefinedTypeExpression>) -> EvalResult<()> {
        let name = self.validate_name(false, &defined.name, defined.name_span)?;
        self.validate_parameters(false, &defined.parameters)?;

        self.catalog.define_type(DefinedType {
            name,
            expression: Rc::clone(defined),
            source: Rc::clone(&self.source),
        })?;

        self.scopes.push(EcoString::new());
        let mut scan = || -> EvalResult<()> {
            for parameter in &defined.parameters {
                if let Some(type_expr) = &parameter.type_expr {
                    self.expression(type_expr)?;
                }
                if let Some(default) = &parameter.default {
                    self.expression(default)?;
                }
            }
            defined.body.iter().try_for_each(|e| self.expression(e))
        };
        let result = scan();
        self.scopes.pop();
        result
    }

    fn node_definition(&mut self, node: &Rc<NodeDefinitionExpression>) -> EvalResult<()> {
        if !self.can_define() {
            return Err(self.error(
                node.span,
                "node definitions can only be defined at top-level or inside a class.",
            ));
        }

        self.catalog.define_node(NodeDefinition {
            expression: Rc::clone(node),
            source: Rc::clone(&self.source),
        })?;

        self.scopes.push(EcoString::new());
        let result = node.body.iter().try_for_each(|e| self.expression(e));
        self.scopes.pop();
        result
    }

    /// Validates a class or defined-type name and returns it qualified.
    fn validate_name(&self, is_class: bool, name: &str, span: Span) -> EvalResult<EcoString> {
        let kind = if is_class { "class" } else { "defined type" };

        if !self.can_define() {
            return Err(self.error(
                span,
                format!(
                    "{} can only be defined at top-level or inside a class.",
                    if is_class { "classes" } else { "defined types" }
                ),
            ));
        }
        if name.is_empty() {
            return Err(self.error(span, format!("a {kind} cannot have an empty name.")));
        }
        if name.starts_with("::") {
            return Err(self.error(span, format!("'{name}' is not a valid {kind} name.")));
        }

        let qualified = self.qualify(name);
        if RESERVED_CLASS_NAMES.contains(&qualified.as_str()) {
            return Err(self.error(
                span,
                format!("'{qualified}' is the name of a built-in class and cannot be used."),
            ));
        }

        // A name cannot be both a class and a defined type
        if is_class {
            if let Some(defined) = self.catalog.find_defined_type(&qualified) {
                return Err(self.error(
                    span,
                    format!(
                        "'{qualified}' was previously defined as a defined type at {}:{}.",
                        defined.source.path(),
                        defined.line()
                    ),
                ));
            }
        } else if let Some(definitions) = self.catalog.find_class(&qualified) {
            let first = &definitions[0];
            return Err(self.error(
                span,
                format!(
                    "'{qualified}' was previously defined as a class at {}:{}.",
                    first.source.path(),
                    first.line()
                ),
            ));
        }

        Ok(qualified)
    }

    /// Validates class/defined-type parameters: no reserved names, no
    /// captures-rest, no metaparameter collisions.
    fn validate_parameters(&self, is_class: bool, parameters: &[Parameter]) -> EvalResult<()> {
        for parameter in parameters {
            let name = parameter.name.as_str();
            if name == "title" || name == "name" {
                return Err(self.error(
                    parameter.span,
                    format!("parameter ${name} is reserved and cannot be used."),
                ));
            }
            if parameter.captures {
                return Err(self.error(
                    parameter.span,
                    format!(
                        "{} parameter ${name} cannot \"captures rest\".",
                        if is_class { "class" } else { "defined type" }
                    ),
                ));
            }
            if super::is_metaparameter(name) {
                return Err(self.error(
                    parameter.span,
                    format!("parameter ${name} is reserved for resource metaparameter '{name}'."),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse_source;

    fn scan(source_text: &str) -> (Catalog, EvalResult<()>) {
        let source = Rc::new(SourceFile::new("site.mf", source_text));
        let (manifest, diagnostics) = parse_source(source_text);
        assert!(
            diagnostics.is_empty(),
            "parse diagnostics: {diagnostics:?}"
        );
        let mut catalog = Catalog::new();
        let result = DefinitionScanner::new(&mut catalog).scan(&source, &manifest);
        (catalog, result)
    }

    #[test]
    fn registers_classes_and_defined_types_and_nodes() {
        let (catalog, result) = scan(
            "class a { }\nclass a { }\ndefine b { }\nnode default { }",
        );
        result.unwrap();
        assert_eq!(catalog.find_class("a").unwrap().len(), 2);
        assert!(catalog.find_defined_type("b").is_some());
        assert!(catalog.has_node_definitions());
    }

    #[test]
    fn nested_classes_qualify() {
        let (catalog, result) = scan("class outer { class inner { } }");
        result.unwrap();
        assert!(catalog.find_class("outer").is_some());
        assert!(catalog.find_class("outer::inner").is_some());
    }

    #[test]
    fn inconsistent_parent_is_rejected() {
        let (_, result) = scan(
            "class b { }\nclass c { }\nclass a inherits b { }\nclass a inherits c { }",
        );
        let error = result.unwrap_err();
        assert!(error.message().contains("already inherits from 'b'"));
    }

    #[test]
    fn consistent_parent_is_accepted() {
        let (catalog, result) = scan("class b { }\nclass a inherits b { }\nclass a inherits b { }");
        result.unwrap();
        assert_eq!(catalog.find_class("a").unwrap().len(), 2);
    }

    #[test]
    fn reserved_names_are_rejected() {
        let (_, result) = scan("class main { }");
        assert!(result.unwrap_err().message().contains("built-in class"));
        let (_, result) = scan("class settings { }");
        assert!(result.unwrap_err().message().contains("built-in class"));
    }

    #[test]
    fn class_and_defined_type_names_collide() {
        let (_, result) = scan("class a { }\ndefine a { }");
        assert!(
            result
                .unwrap_err()
                .message()
                .contains("previously defined as a class")
        );

        let (_, result) = scan("define a { }\nclass a { }");
        assert!(
            result
                .unwrap_err()
                .message()
                .contains("previously defined as a defined type")
        );
    }

    #[test]
    fn duplicate_defined_types_are_rejected() {
        let (_, result) = scan("define a { }\ndefine a { }");
        assert!(result.unwrap_err().message().contains("previously defined"));
    }

    #[test]
    fn reserved_parameters_are_rejected() {
        let (_, result) = scan("class a($title) { }");
        assert!(result.unwrap_err().message().contains("reserved"));

        let (_, result) = scan("class a(*$rest) { }");
        assert!(result.unwrap_err().message().contains("captures rest"));

        let (_, result) = scan("define d($before) { }");
        assert!(result.unwrap_err().message().contains("metaparameter"));
    }

    #[test]
    fn definitions_inside_control_flow_are_rejected() {
        let (_, result) = scan("if true { class a { } }");
        assert!(
            result
                .unwrap_err()
                .message()
                .contains("top-level or inside a class")
        );

        let (_, result) = scan("define d { node default { } }");
        assert!(
            result
                .unwrap_err()
                .message()
                .contains("top-level or inside a class")
        );
    }
}
