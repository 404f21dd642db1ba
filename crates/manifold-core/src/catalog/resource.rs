// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Resources: references, attributes, and the resource record itself.
//!
//! A resource is uniquely identified by its [`ResourceRef`]: the normalised
//! type name (`foo::bar` → `Foo::Bar`) plus the title. Classes are resources
//! of type `Class`.

use std::rc::Rc;
use std::sync::OnceLock;

use camino::Utf8PathBuf;
use ecow::EcoString;
use indexmap::IndexMap;

use crate::values::types::normalize_type_name;
use crate::values::{TypeSpec, Value, dereference, equals, is_undef};

/// Attribute names whose semantics are fixed by the runtime.
pub const METAPARAMETERS: &[&str] = &[
    "alias",
    "audit",
    "before",
    "loglevel",
    "noop",
    "notify",
    "require",
    "schedule",
    "stage",
    "subscribe",
    "tag",
];

/// Returns true if `name` is a metaparameter name.
#[must_use]
pub fn is_metaparameter(name: &str) -> bool {
    METAPARAMETERS.contains(&name)
}

/// A reference to a resource: normalised type name plus title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    type_name: EcoString,
    title: EcoString,
}

impl ResourceRef {
    /// Creates a reference, normalising the type name.
    #[must_use]
    pub fn new(type_name: &str, title: impl Into<EcoString>) -> Self {
        Self {
            type_name: normalize_type_name(type_name),
            title: title.into(),
        }
    }

    /// Creates a class reference.
    #[must_use]
    pub fn class(name: &str) -> Self {
        let name = name.strip_prefix("::").unwrap_or(name);
        Self {
            type_name: "Class".into(),
            title: name.to_lowercase().into(),
        }
    }

    /// Returns the normalised type name.
    #[must_use]
    pub fn type_name(&self) -> &EcoString {
        &self.type_name
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &EcoString {
        &self.title
    }

    /// Returns true if this references a class resource.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.type_name == "Class"
    }

    /// Parses a `Type[title]` reference string.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        static REFERENCE: OnceLock<regex::Regex> = OnceLock::new();
        let reference = REFERENCE.get_or_init(|| {
            regex::Regex::new(r"^((?:(?:::)?[A-Z]\w*)+)\[([^\]]+)\]$").expect("a valid pattern")
        });

        let captures = reference.captures(text)?;
        let mut title = captures.get(2)?.as_str().trim();
        if title.len() >= 2
            && ((title.starts_with('\'') && title.ends_with('\''))
                || (title.starts_with('"') && title.ends_with('"')))
        {
            title = &title[1..title.len() - 1];
        }
        Some(Self::new(captures.get(1)?.as_str(), title))
    }

    /// Converts this reference to its type value.
    #[must_use]
    pub fn to_type(&self) -> TypeSpec {
        if self.is_class() {
            TypeSpec::Class(Some(self.title.clone()))
        } else {
            TypeSpec::Resource {
                type_name: Some(self.type_name.clone()),
                title: Some(self.title.clone()),
            }
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.type_name, self.title)
    }
}

/// Normalises a value into resource references: a `Type[title]` string, a
/// qualified resource type, a class reference, or an array of any of these.
///
/// # Errors
/// Returns a message describing the first value that is not a reference.
pub fn each_resource(
    value: &Value,
    callback: &mut dyn FnMut(ResourceRef) -> Result<(), String>,
) -> Result<(), String> {
    match dereference(value) {
        Value::String(text) => match ResourceRef::parse(text) {
            Some(reference) => callback(reference),
            None => Err(format!("expected a resource string but found \"{text}\".")),
        },
        Value::Type(TypeSpec::Resource {
            type_name: Some(type_name),
            title: Some(title),
        }) => callback(ResourceRef::new(type_name, title.clone())),
        Value::Type(TypeSpec::Class(Some(name))) => callback(ResourceRef::class(name)),
        Value::Array(elements) => {
            for element in elements {
                each_resource(element, callback)?;
            }
            Ok(())
        }
        other => Err(format!(
            "expected String, Resource, or an Array of resource references but found {}.",
            crate::values::get_type(other)
        )),
    }
}

/// An insertion-ordered attribute collection.
///
/// Values are shared snapshots; an attribute set to `undef` reads as unset.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    values: IndexMap<EcoString, Rc<Value>>,
}

impl Attributes {
    /// Creates an empty attribute collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets an attribute's value; `undef` reads as unset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Value>> {
        self.values
            .get(name)
            .filter(|value| !is_undef(value))
    }

    /// Sets an attribute.
    pub fn set(&mut self, name: impl Into<EcoString>, value: Value) {
        self.values.insert(name.into(), Rc::new(value));
    }

    /// Sets an attribute to a shared value.
    pub fn set_shared(&mut self, name: impl Into<EcoString>, value: Rc<Value>) {
        self.values.insert(name.into(), value);
    }

    /// Sets an attribute only if it is currently unset.
    pub fn set_if_missing(&mut self, name: &str, value: Rc<Value>) {
        if self.get(name).is_none() {
            self.values.insert(name.into(), value);
        }
    }

    /// Appends a value to an attribute.
    ///
    /// An unset attribute becomes the value as an array. Returns `false` if
    /// the attribute exists and is not an array. When `skip_duplicates` is
    /// set, elements already present (by language equality) are not
    /// appended again.
    pub fn append(&mut self, name: &str, value: Value, skip_duplicates: bool) -> bool {
        let new_elements = crate::values::to_array(value, false);

        let Some(existing) = self.get(name) else {
            self.set(name, Value::Array(new_elements));
            return true;
        };
        let Value::Array(existing) = dereference(existing) else {
            return false;
        };

        let mut merged = existing.clone();
        for element in new_elements {
            if skip_duplicates && merged.iter().any(|e| equals(e, &element)) {
                continue;
            }
            merged.push(element);
        }
        self.set(name, Value::Array(merged));
        true
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) {
        self.values.shift_remove(name);
    }

    /// Iterates over the set attributes in insertion order, skipping
    /// `undef` values.
    pub fn iter(&self) -> impl Iterator<Item = (&EcoString, &Rc<Value>)> {
        self.values.iter().filter(|(_, value)| !is_undef(value))
    }

    /// Returns true if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// The lifecycle state of a resource in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// A normally declared resource.
    Real,
    /// A virtual resource awaiting realization.
    Virtual,
    /// An exported resource awaiting collection.
    Exported,
    /// A virtual or exported resource that has been realized.
    Realized,
}

impl ResourceState {
    /// Returns true if the resource takes part in the final catalog.
    #[must_use]
    pub const fn is_real(self) -> bool {
        matches!(self, Self::Real | Self::Realized)
    }
}

/// A declared resource.
#[derive(Debug, Clone)]
pub struct Resource {
    reference: ResourceRef,
    attributes: Attributes,
    state: ResourceState,
    path: Utf8PathBuf,
    line: u32,
    container: Option<ResourceRef>,
}

impl Resource {
    /// Creates a resource.
    #[must_use]
    pub fn new(
        reference: ResourceRef,
        attributes: Attributes,
        state: ResourceState,
        path: impl Into<Utf8PathBuf>,
        line: u32,
        container: Option<ResourceRef>,
    ) -> Self {
        Self {
            reference,
            attributes,
            state,
            path: path.into(),
            line,
            container,
        }
    }

    /// Returns the resource reference.
    #[must_use]
    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    /// Returns the resource attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the resource attributes for mutation.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Marks a virtual or exported resource as realized.
    pub fn realize(&mut self) {
        if matches!(self.state, ResourceState::Virtual | ResourceState::Exported) {
            self.state = ResourceState::Realized;
        }
    }

    /// Returns the path of the manifest that declared the resource.
    #[must_use]
    pub fn path(&self) -> &camino::Utf8Path {
        &self.path
    }

    /// Returns the line where the resource was declared.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the containing resource (class, defined type, or node), if
    /// any.
    #[must_use]
    pub fn container(&self) -> Option<&ResourceRef> {
        self.container.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_normalises_type_names() {
        let reference = ResourceRef::new("file", "/tmp/x");
        assert_eq!(reference.type_name(), "File");
        assert_eq!(reference.to_string(), "File[/tmp/x]");

        let qualified = ResourceRef::new("foo::bar", "x");
        assert_eq!(qualified.type_name(), "Foo::Bar");
    }

    #[test]
    fn class_references_lowercase_titles() {
        let reference = ResourceRef::class("Apache");
        assert!(reference.is_class());
        assert_eq!(reference.title(), "apache");
        assert_eq!(ResourceRef::class("::motd").title(), "motd");
    }

    #[test]
    fn parses_reference_strings() {
        let reference = ResourceRef::parse("File['/tmp/x']").expect("parses");
        assert_eq!(reference.type_name(), "File");
        assert_eq!(reference.title(), "/tmp/x");

        let unquoted = ResourceRef::parse("Foo::Bar[x]").expect("parses");
        assert_eq!(unquoted.type_name(), "Foo::Bar");
        assert_eq!(unquoted.title(), "x");

        assert!(ResourceRef::parse("not a reference").is_none());
        assert!(ResourceRef::parse("lowercase[x]").is_none());
    }

    #[test]
    fn each_resource_normalisation() {
        let mut seen = Vec::new();
        let value = Value::Array(vec![
            Value::from("File['/a']"),
            Value::Type(TypeSpec::resource("service", "sshd")),
            Value::Type(TypeSpec::Class(Some("motd".into()))),
        ]);
        each_resource(&value, &mut |reference| {
            seen.push(reference.to_string());
            Ok(())
        })
        .expect("all references valid");
        assert_eq!(seen, vec!["File[/a]", "Service[sshd]", "Class[motd]"]);

        assert!(each_resource(&Value::Integer(1), &mut |_| Ok(())).is_err());
    }

    #[test]
    fn attributes_undef_reads_as_unset() {
        let mut attributes = Attributes::new();
        attributes.set("ensure", Value::from("present"));
        attributes.set("gone", Value::Undef);
        assert!(attributes.get("ensure").is_some());
        assert!(attributes.get("gone").is_none());
        assert_eq!(attributes.iter().count(), 1);
    }

    #[test]
    fn attribute_append_semantics() {
        let mut attributes = Attributes::new();
        assert!(attributes.append("before", Value::from("File[/a]"), true));
        assert!(attributes.append("before", Value::from("File[/a]"), true));
        let Some(value) = attributes.get("before") else {
            panic!("expected value");
        };
        let Value::Array(elements) = dereference(value) else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 1);

        attributes.set("mode", Value::from("0644"));
        assert!(!attributes.append("mode", Value::from("0755"), true));
    }

    #[test]
    fn resource_realization() {
        let mut resource = Resource::new(
            ResourceRef::new("user", "bob"),
            Attributes::new(),
            ResourceState::Virtual,
            "site.mf",
            1,
            None,
        );
        assert!(!resource.state().is_real());
        resource.realize();
        assert_eq!(resource.state(), ResourceState::Realized);
        assert!(resource.state().is_real());
    }
}
