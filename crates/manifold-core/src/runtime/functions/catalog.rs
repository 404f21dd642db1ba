// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Catalog functions: `include`, `require`, `contain`, `realize`, `tag`.

use ecow::EcoString;

use crate::catalog::each_resource;
use crate::values::{TypeSpec, Value, dereference, get_type};

use super::super::dispatch::CallContext;
use super::super::error::EvalResult;

/// Collects class names from an `include`-style argument: a string, a
/// class or Class-resource reference, or an array of these.
fn class_names(value: &Value, names: &mut Vec<EcoString>) -> Result<(), String> {
    match dereference(value) {
        Value::String(name) => {
            names.push(name.clone());
            Ok(())
        }
        Value::Type(TypeSpec::Class(Some(name))) => {
            names.push(name.clone());
            Ok(())
        }
        Value::Type(TypeSpec::Resource {
            type_name: Some(type_name),
            title: Some(title),
        }) if type_name == "Class" => {
            names.push(title.clone());
            Ok(())
        }
        Value::Array(elements) => {
            for element in elements {
                class_names(element, names)?;
            }
            Ok(())
        }
        other => Err(format!(
            "expected String, Array, Class, or Class Resource for argument but found {}.",
            get_type(other)
        )),
    }
}

/// Declares each argument's classes (idempotently).
pub(super) fn include(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    declare_arguments(context)?;
    Ok(Value::Undef)
}

/// Declares the classes and adds a `require` relationship from the
/// containing resource to each class.
pub(super) fn require(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    let declared = declare_arguments(context)?;

    let container = context.evaluator().context.current_scope().resource().cloned();
    if let Some(container) = container {
        let references: Vec<Value> = declared
            .iter()
            .map(|reference| Value::Type(reference.to_type()))
            .collect();
        let catalog = &mut context.evaluator().context.catalog;
        if let Some(resource) = catalog.find_resource_mut(&container) {
            resource
                .attributes_mut()
                .append("require", Value::Array(references), true);
        }
    }
    Ok(Value::Undef)
}

/// Declares the classes inside the containing class.
pub(super) fn contain(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    declare_arguments(context)?;
    Ok(Value::Undef)
}

fn declare_arguments(
    context: &mut CallContext<'_, '_, '_>,
) -> EvalResult<Vec<crate::catalog::ResourceRef>> {
    if context.arguments().is_empty() {
        return Err(context.raise(
            context.span(),
            format!(
                "expected at least one argument to '{}' function.",
                context.name()
            ),
        ));
    }

    let mut declared = Vec::new();
    for index in 0..context.arguments().len() {
        let argument = context.arguments()[index].clone();
        let mut names = Vec::new();
        if let Err(message) = class_names(&argument, &mut names) {
            return Err(context.raise(context.argument_span(index), message));
        }
        for name in names {
            if name.is_empty() {
                return Err(context.raise(
                    context.argument_span(index),
                    "cannot include a class with an unspecified title.",
                ));
            }
            let span = context.argument_span(index);
            declared.push(context.evaluator().declare_class(&name, None, span)?);
        }
    }
    Ok(declared)
}

/// Realizes virtual (or exported) resources by reference.
pub(super) fn realize(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    if context.arguments().is_empty() {
        return Err(context.raise(
            context.span(),
            format!(
                "expected at least one argument to '{}' function.",
                context.name()
            ),
        ));
    }

    let mut realized = Vec::new();
    for index in 0..context.arguments().len() {
        let argument = context.arguments()[index].clone();
        let span = context.argument_span(index);

        let mut references = Vec::new();
        let result = each_resource(&argument, &mut |reference| {
            references.push(reference);
            Ok(())
        });
        if let Err(message) = result {
            return Err(context.raise(span, message));
        }

        for reference in references {
            let source = std::rc::Rc::clone(context.evaluator().source());
            context
                .evaluator()
                .context
                .catalog
                .realize(&reference)
                .map_err(|error| error.or_at(&source, span))?;
            realized.push(Value::Type(reference.to_type()));
        }
    }
    Ok(Value::Array(realized))
}

/// Tags the containing resource.
pub(super) fn tag(context: &mut CallContext<'_, '_, '_>) -> EvalResult<Value> {
    let mut tags = Vec::new();
    for (index, argument) in context.arguments().iter().enumerate() {
        match dereference(argument) {
            Value::String(tag) => tags.push(Value::String(tag.clone())),
            other => {
                return Err(context.raise(
                    context.argument_span(index),
                    format!("expected String for tag but found {}.", get_type(other)),
                ));
            }
        }
    }

    let container = context.evaluator().context.current_scope().resource().cloned();
    if let Some(container) = container {
        let catalog = &mut context.evaluator().context.catalog;
        if let Some(resource) = catalog.find_resource_mut(&container) {
            resource
                .attributes_mut()
                .append("tag", Value::Array(tags), true);
        }
    }
    Ok(Value::Undef)
}
