// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! The compile entry point.
//!
//! Given a node name, a fact provider, and manifest sources, [`compile`]
//! produces a [`Catalog`] or fails: lex/parse each manifest, scan
//! definitions, evaluate each manifest body in order, evaluate the matched
//! node definition, and finalize the catalog. Compilation is
//! all-or-nothing — a failed compilation yields no catalog.
//!
//! Errors and language-level log messages go to the supplied
//! [`LoggingSink`]; a CLI collaborator maps zero logged errors to exit
//! status 0 and anything else to 1.

use std::rc::Rc;

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use crate::catalog::{
    Attributes, Catalog, DefinitionScanner, EmptyStore, ExportedResourceStore, Resource,
    ResourceRef, ResourceState,
};
use crate::diagnostics::{Level, LoggingSink, Logger};
use crate::facts::FactProvider;
use crate::ast::Manifest;
use crate::runtime::{EvaluationContext, EvaluationError, Evaluator, Scope};
use crate::source_analysis::{Severity, SourceFile, parse_source};

/// A compilation failure. The detailed records (with positions and source
/// lines) have already been delivered to the logging sink.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{message}")]
pub struct CompilationError {
    message: String,
}

impl CompilationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The node a catalog is compiled for.
///
/// A node name's dot-separated prefixes all participate in node-definition
/// matching: `web01.example.com` matches definitions named
/// `web01.example.com`, `web01.example`, or `web01`, most specific first.
#[derive(Debug, Clone)]
pub struct Node {
    names: Vec<EcoString>,
}

impl Node {
    /// Creates a node from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name.to_lowercase();
        let mut names = Vec::new();
        let mut end = name.len();
        loop {
            names.push(EcoString::from(&name[..end]));
            match name[..end].rfind('.') {
                Some(dot) if dot > 0 => end = dot,
                _ => break,
            }
        }
        Self { names }
    }

    /// Returns the full node name.
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.names[0]
    }

    /// Returns the candidate names, most specific first.
    #[must_use]
    pub fn names(&self) -> &[EcoString] {
        &self.names
    }
}

/// Compiles a catalog for a node using the built-in (empty) exported
/// resource store.
///
/// # Errors
/// Fails if any manifest fails to parse or any evaluation or finalisation
/// error occurs; details are logged to `sink`.
pub fn compile(
    node_name: &str,
    facts: Rc<dyn FactProvider>,
    manifests: Vec<SourceFile>,
    sink: &mut dyn LoggingSink,
) -> Result<Catalog, CompilationError> {
    compile_with_store(node_name, facts, manifests, sink, &EmptyStore)
}

/// Compiles a catalog with an explicit exported-resource store.
///
/// # Errors
/// As [`compile`].
pub fn compile_with_store(
    node_name: &str,
    facts: Rc<dyn FactProvider>,
    manifests: Vec<SourceFile>,
    sink: &mut dyn LoggingSink,
    store: &dyn ExportedResourceStore,
) -> Result<Catalog, CompilationError> {
    let node = Node::new(node_name);
    tracing::debug!(node = %node.name(), manifests = manifests.len(), "compiling catalog");

    let mut logger = Logger::new(sink);

    // Parse everything first so definitions can be scanned before any
    // evaluation.
    let mut parsed: Vec<(Rc<SourceFile>, Manifest)> = Vec::with_capacity(manifests.len());
    let mut syntax_errors = false;
    for source in manifests {
        let source = Rc::new(source);
        let (manifest, diagnostics) = parse_source(source.text());
        for diagnostic in diagnostics {
            let level = match diagnostic.severity {
                Severity::Error => {
                    syntax_errors = true;
                    Level::Error
                }
                Severity::Warning => Level::Warning,
            };
            logger.log_at(level, &source, diagnostic.span, diagnostic.message);
        }
        parsed.push((source, manifest));
    }
    if syntax_errors {
        return Err(CompilationError::new(
            "compilation failed due to syntax errors.",
        ));
    }

    let catalog = bootstrap_catalog();
    let mut context = EvaluationContext::new(catalog, Some(facts), logger, store);

    // Class[settings] gets a named scope so $settings::… resolves
    let settings_scope = Rc::new(Scope::new(
        context.top_scope(),
        Some(ResourceRef::class("settings")),
    ));
    context.add_named_scope("settings", settings_scope);

    // Scan all manifests for definitions before evaluating any of them
    for (source, manifest) in &parsed {
        if let Err(error) = DefinitionScanner::new(&mut context.catalog).scan(source, manifest) {
            return Err(report(&mut context, &error));
        }
    }

    // Evaluate each manifest in order
    for (source, manifest) in &parsed {
        let mut evaluator = Evaluator::new(Rc::clone(source), &mut context);
        if let Err(error) = evaluator.evaluate_manifest(manifest) {
            return Err(report(&mut context, &error));
        }
    }

    // Evaluate the matched node definition
    if context.catalog.has_node_definitions() {
        let matched = context
            .catalog
            .match_node(node.names())
            .map(|(name, definition)| {
                (
                    name,
                    Rc::clone(&definition.source),
                    Rc::clone(&definition.expression),
                )
            });
        let Some((node_name, source, expression)) = matched else {
            let names: Vec<&str> = node.names().iter().map(EcoString::as_str).collect();
            let error = EvaluationError::new(format!(
                "could not find a default node or a node with the following names: {}.",
                names.join(", ")
            ));
            return Err(report(&mut context, &error));
        };

        tracing::debug!(node = %node_name, "evaluating node definition");
        let reference = ResourceRef::new("node", node_name);
        let line = source.location(expression.span.start()).line;
        let resource = Resource::new(
            reference.clone(),
            Attributes::new(),
            ResourceState::Real,
            source.path(),
            line,
            None,
        );
        if let Err(error) = context.catalog.add_resource(resource) {
            return Err(report(&mut context, &error));
        }

        context.push_node_scope(reference);
        let result =
            Evaluator::new(source, &mut context).evaluate_block(&expression.body);
        context.pop_node_scope();
        if let Err(error) = result {
            return Err(report(&mut context, &error));
        }
    }

    // Finalize: collectors, overrides, virtual culling, edges, cycles
    if let Err(error) = context.catalog.finalize(store) {
        return Err(report(&mut context, &error));
    }

    Ok(context.into_catalog())
}

/// Creates the catalog with its bootstrap resources: `Stage[main]`,
/// `Class[main]`, and `Class[settings]`.
fn bootstrap_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    for reference in [
        ResourceRef::new("stage", "main"),
        ResourceRef::class("main"),
        ResourceRef::class("settings"),
    ] {
        catalog
            .add_resource(Resource::new(
                reference,
                Attributes::new(),
                ResourceState::Real,
                "<generated>",
                1,
                None,
            ))
            .expect("the bootstrap resources are unique");
    }
    catalog.mark_class_declared("main");
    catalog.mark_class_declared("settings");
    catalog
}

/// Logs an evaluation error (with position and source line when known) and
/// converts it into the compilation failure.
fn report(context: &mut EvaluationContext<'_>, error: &EvaluationError) -> CompilationError {
    match (error.source_file(), error.span()) {
        (Some(source), Some(span)) => {
            let source = Rc::clone(source);
            context
                .logger()
                .log_at(Level::Error, &source, span, error.message().to_string());
        }
        _ => {
            context
                .logger()
                .log_message(Level::Error, error.message().to_string());
        }
    }
    CompilationError::new(error.message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::facts::MemoryFacts;
    use crate::values::{Value, dereference};

    fn facts() -> Rc<dyn FactProvider> {
        Rc::new(MemoryFacts::new().with("os", "linux").with("hostname", "web01"))
    }

    fn compile_source(source: &str) -> (Result<Catalog, CompilationError>, CollectingSink) {
        let mut sink = CollectingSink::new();
        let result = compile(
            "web01.example.com",
            facts(),
            vec![SourceFile::new("site.mf", source)],
            &mut sink,
        );
        (result, sink)
    }

    #[track_caller]
    fn compile_ok(source: &str) -> (Catalog, CollectingSink) {
        let (result, sink) = compile_source(source);
        match result {
            Ok(catalog) => (catalog, sink),
            Err(error) => panic!("compilation failed: {} (sink: {:#?})", error, sink.records),
        }
    }

    #[track_caller]
    fn compile_err(source: &str) -> (CompilationError, CollectingSink) {
        let (result, sink) = compile_source(source);
        match result {
            Ok(_) => panic!("expected compilation to fail for {source:?}"),
            Err(error) => (error, sink),
        }
    }

    /// Resources that the compilation itself declared (not bootstrap,
    /// classes, or the node resource).
    fn declared(catalog: &Catalog) -> Vec<&Resource> {
        catalog
            .resources()
            .filter(|resource| {
                let reference = resource.reference();
                !reference.is_class()
                    && reference.type_name() != "Stage"
                    && reference.type_name() != "Node"
            })
            .collect()
    }

    fn attribute(resource: &Resource, name: &str) -> Value {
        resource
            .attributes()
            .get(name)
            .map_or(Value::Undef, |value| dereference(value).clone())
    }

    // Scenario 1: include evaluates the class body once; no resources.
    #[test]
    fn include_logs_notice_and_declares_no_resources() {
        let (catalog, sink) = compile_ok("class a { notice('hi') }\ninclude a");
        assert_eq!(sink.messages_at(Level::Notice), vec!["hi"]);
        assert!(declared(&catalog).is_empty());
        assert!(catalog.find_resource(&ResourceRef::class("a")).is_some());
    }

    // Scenario 2: declaration plus override.
    #[test]
    fn resource_with_override() {
        let (catalog, _sink) = compile_ok(
            "file { '/tmp/x': ensure => present }\nFile['/tmp/x'] { mode => '0644' }",
        );
        let file = catalog
            .find_resource(&ResourceRef::new("file", "/tmp/x"))
            .expect("File[/tmp/x] in catalog");
        assert_eq!(attribute(file, "ensure"), Value::from("present"));
        assert_eq!(attribute(file, "mode"), Value::from("0644"));
    }

    // Scenario 3: collector realizes a virtual resource.
    #[test]
    fn collector_realizes_virtual_resource() {
        let (catalog, _sink) = compile_ok("@user { 'bob': }\nUser <| title == 'bob' |>");
        let bob = catalog
            .find_resource(&ResourceRef::new("user", "bob"))
            .expect("User[bob] realized");
        assert_eq!(bob.state(), ResourceState::Realized);
    }

    // Scenario 4: divergent inheritance is a scan-time error.
    #[test]
    fn divergent_class_parent_fails() {
        let (error, sink) = compile_err(
            "class b { }\nclass c { }\nclass a inherits b { }\nclass a inherits c { }",
        );
        assert!(error.message().contains("already inherits from 'b'"));
        assert!(!sink.messages_at(Level::Error).is_empty());
    }

    // Scenario 5: if/else chooses the branch.
    #[test]
    fn if_else_assigns_and_logs() {
        let (_catalog, sink) =
            compile_ok("if 1 == 1 { $x = 2 } else { $x = 3 }\nnotice($x)");
        assert_eq!(sink.messages_at(Level::Notice), vec!["2"]);
    }

    // Scenario 6: filter with a lambda.
    #[test]
    fn filter_keeps_matching_elements() {
        let (_catalog, sink) = compile_ok("notice([1, 2, 3].filter |$v| { $v > 1 })");
        assert_eq!(sink.messages_at(Level::Notice), vec!["[2, 3]"]);
    }

    // Scenario 7: split keeps empty fields.
    #[test]
    fn split_keeps_empty_fields() {
        let (_catalog, sink) = compile_ok("notice('a,b,,c'.split(','))");
        assert_eq!(sink.messages_at(Level::Notice), vec!["[a, b, , c]"]);
    }

    // Scenario 8: division by zero fails the compilation.
    #[test]
    fn division_by_zero_fails_compilation() {
        let (error, sink) = compile_err("$x = 1/0");
        assert!(error.message().contains("cannot divide by zero."));
        let errors = sink.messages_at(Level::Error);
        assert!(errors.iter().any(|m| m.contains("cannot divide by zero.")));
        // The record carries position and line text
        let record = sink
            .records
            .iter()
            .find(|r| r.level == Level::Error)
            .unwrap();
        assert!(record.location.is_some());
        assert_eq!(record.line_text.as_deref(), Some("$x = 1/0"));
    }

    // R3: include is idempotent; the body evaluates exactly once (P4).
    #[test]
    fn include_twice_is_idempotent() {
        let (_catalog, sink) =
            compile_ok("class a { notice('evaluated') }\ninclude a\ninclude a");
        assert_eq!(sink.messages_at(Level::Notice), vec!["evaluated"]);
    }

    #[test]
    fn resource_style_class_redeclaration_fails() {
        let (error, _sink) =
            compile_err("class a { }\ninclude a\nclass { 'a': }");
        assert!(error.message().contains("previously declared"));
    }

    // P2: `(lowercased type, title)` keys resources uniquely.
    #[test]
    fn duplicate_resources_fail() {
        let (error, _sink) = compile_err("file { '/x': }\nfile { '/x': }");
        assert!(error.message().contains("previously declared"));
    }

    // P3: every edge's endpoints exist in the catalog.
    #[test]
    fn edges_reference_existing_resources() {
        let (catalog, _sink) = compile_ok(
            "file { '/a': }\nfile { '/b': }\nFile['/a'] -> File['/b']",
        );
        assert!(!catalog.edges().is_empty());
        for edge in catalog.edges() {
            assert!(catalog.find_resource(&edge.source).is_some());
            assert!(catalog.find_resource(&edge.target).is_some());
        }
    }

    #[test]
    fn relationship_chain_orders_resources() {
        let (catalog, _sink) = compile_ok(
            "file { '/a': }\nfile { '/b': }\nservice { 'x': }\nFile['/a'] -> File['/b'] ~> Service['x']",
        );
        let edges: Vec<(String, String)> = catalog
            .edges()
            .iter()
            .map(|edge| (edge.source.to_string(), edge.target.to_string()))
            .collect();
        assert!(edges.contains(&("File[/a]".into(), "File[/b]".into())));
        assert!(edges.contains(&("File[/b]".into(), "Service[x]".into())));
    }

    #[test]
    fn dependency_cycles_fail() {
        let (error, _sink) = compile_err(
            "file { '/a': before => File['/b'] }\nfile { '/b': before => File['/a'] }",
        );
        assert!(error.message().contains("dependency cycle"));
    }

    #[test]
    fn defined_type_binds_title_and_name() {
        let (_catalog, sink) = compile_ok(
            "define greet($greeting = 'hello') { notice(\"$greeting $title\") }\ngreet { 'world': }",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["hello world"]);
    }

    #[test]
    fn defined_type_rejects_unknown_attributes() {
        let (error, _sink) = compile_err(
            "define thing($msg) { notice($msg) }\nthing { 'x': msg => 'm', bogus => 1 }",
        );
        assert!(error.message().contains("not a valid parameter"));
    }

    #[test]
    fn class_parameters_bind_from_attributes() {
        let (_catalog, sink) = compile_ok(
            "class greeter(String $greeting = 'hi') { notice($greeting) }\nclass { 'greeter': greeting => 'yo' }",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["yo"]);
    }

    #[test]
    fn class_parameter_type_mismatch_fails() {
        let (error, _sink) = compile_err(
            "class greeter(String $greeting = 'hi') { }\nclass { 'greeter': greeting => 5 }",
        );
        assert!(error.message().contains("expected type String"));
    }

    #[test]
    fn inherited_class_scope_resolves_parent_variables() {
        let (_catalog, sink) = compile_ok(
            "class base { $setting = 'from-base' }\nclass child inherits base { notice($setting) }\ninclude child",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["from-base"]);
    }

    #[test]
    fn qualified_variables_read_class_scopes() {
        let (_catalog, sink) = compile_ok(
            "class settings_holder { $port = 8080 }\ninclude settings_holder\nnotice($settings_holder::port)",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["8080"]);
    }

    #[test]
    fn facts_resolve_at_top_scope() {
        let (_catalog, sink) = compile_ok("notice($os)\nnotice($facts['hostname'])");
        assert_eq!(sink.messages_at(Level::Notice), vec!["linux", "web01"]);
    }

    #[test]
    fn node_definitions_match_most_specific_name() {
        let (catalog, sink) = compile_ok(
            "node 'web01' { notice('by-subname') }\nnode default { notice('default') }",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["by-subname"]);
        assert!(catalog.find_resource(&ResourceRef::new("node", "web01")).is_some());
    }

    #[test]
    fn node_regex_and_default_fallback() {
        let (_catalog, sink) = compile_ok("node /^db\\d+$/ { notice('db') }\nnode default { notice('default') }");
        assert_eq!(sink.messages_at(Level::Notice), vec!["default"]);
    }

    #[test]
    fn unmatched_node_with_definitions_fails() {
        let mut sink = CollectingSink::new();
        let result = compile(
            "other",
            facts(),
            vec![SourceFile::new("site.mf", "node 'web01' { }")],
            &mut sink,
        );
        let error = result.expect_err("no matching node");
        assert!(error.message().contains("could not find a default node"));
    }

    #[test]
    fn resource_defaults_apply_in_scope_and_descendants() {
        let (catalog, _sink) = compile_ok(
            "File { mode => '0644' }\nclass files { file { '/a': } }\ninclude files\nfile { '/b': mode => '0600' }",
        );
        let a = catalog.find_resource(&ResourceRef::new("file", "/a")).unwrap();
        assert_eq!(attribute(a, "mode"), Value::from("0644"));
        let b = catalog.find_resource(&ResourceRef::new("file", "/b")).unwrap();
        assert_eq!(attribute(b, "mode"), Value::from("0600"));
    }

    #[test]
    fn override_defers_until_declaration() {
        let (catalog, _sink) = compile_ok(
            "File['/later'] { mode => '0600' }\nfile { '/later': ensure => present }",
        );
        let file = catalog.find_resource(&ResourceRef::new("file", "/later")).unwrap();
        assert_eq!(attribute(file, "mode"), Value::from("0600"));
    }

    #[test]
    fn unresolved_override_fails() {
        let (error, _sink) = compile_err("File['/never'] { mode => '0600' }");
        assert!(error.message().contains("does not exist in the catalog"));
    }

    #[test]
    fn unrealized_virtuals_are_culled() {
        let (catalog, _sink) = compile_ok("@user { 'ghost': }");
        assert!(catalog.find_resource(&ResourceRef::new("user", "ghost")).is_none());
    }

    #[test]
    fn realize_function_realizes_virtuals() {
        let (catalog, _sink) = compile_ok("@user { 'bob': }\nrealize(User['bob'])");
        let bob = catalog.find_resource(&ResourceRef::new("user", "bob")).unwrap();
        assert_eq!(bob.state(), ResourceState::Realized);
    }

    #[test]
    fn exported_resources_cull_without_collection() {
        let (catalog, _sink) = compile_ok("@@host { 'web': }");
        assert!(catalog.find_resource(&ResourceRef::new("host", "web")).is_none());
    }

    #[test]
    fn exported_collector_realizes_local_exports() {
        let (catalog, _sink) = compile_ok("@@host { 'web': }\nHost <<| |>>");
        assert!(catalog.find_resource(&ResourceRef::new("host", "web")).is_some());
    }

    #[test]
    fn multiple_titles_declare_multiple_resources() {
        let (catalog, _sink) = compile_ok("file { ['/a', '/b']: ensure => present }");
        assert_eq!(declared(&catalog).len(), 2);
    }

    #[test]
    fn default_body_supplies_attribute_defaults() {
        let (catalog, _sink) = compile_ok(
            "file {\n  default:\n    mode => '0644';\n  '/a':\n    ensure => present;\n  '/b':\n    mode => '0600',\n}",
        );
        let a = catalog.find_resource(&ResourceRef::new("file", "/a")).unwrap();
        assert_eq!(attribute(a, "mode"), Value::from("0644"));
        let b = catalog.find_resource(&ResourceRef::new("file", "/b")).unwrap();
        assert_eq!(attribute(b, "mode"), Value::from("0600"));
    }

    #[test]
    fn metaparameter_types_are_validated() {
        let (error, _sink) = compile_err("file { '/x': noop => 'yes' }");
        assert!(error.message().contains("for attribute 'noop'"));
    }

    #[test]
    fn match_variables_flow_into_blocks() {
        let (_catalog, sink) = compile_ok(
            "if $os =~ /^l(.*)x$/ { notice($1) }\nnotice('after')",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["inu", "after"]);
    }

    #[test]
    fn case_selects_matching_proposition() {
        let (_catalog, sink) = compile_ok(
            "case $os {\n  'windows': { notice('win') }\n  /^lin/: { notice('nix') }\n  default: { notice('other') }\n}",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["nix"]);
    }

    #[test]
    fn selector_chooses_value() {
        let (_catalog, sink) = compile_ok(
            "$pkg = $os ? {\n  'linux' => 'httpd',\n  default => 'apache2',\n}\nnotice($pkg)",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["httpd"]);
    }

    #[test]
    fn heredoc_contents_evaluate() {
        let (_catalog, sink) = compile_ok(
            "$motd = @(END)\n  welcome to ${os}\n  | END\nnotice($motd)",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["welcome to linux\n"]);
    }

    #[test]
    fn fail_function_aborts() {
        let (error, _sink) = compile_err("fail('boom')");
        assert!(error.message().contains("boom"));
    }

    #[test]
    fn contain_declares_classes_in_the_container() {
        let (catalog, sink) = compile_ok(
            "class inner { notice('from inner') }\nclass outer { contain inner }\ninclude outer",
        );
        assert_eq!(sink.messages_at(Level::Notice), vec!["from inner"]);
        assert!(catalog.find_resource(&ResourceRef::class("inner")).is_some());
        assert!(catalog.find_resource(&ResourceRef::class("outer")).is_some());
    }

    #[test]
    fn shellquote_quotes_unsafe_words() {
        let (_catalog, sink) = compile_ok(
            "notice(shellquote('a b', 'plain', \"it's\"))\nnotice(shellquote(['x y', 'z']))",
        );
        assert_eq!(
            sink.messages_at(Level::Notice),
            vec!["'a b' plain 'it'\\''s'", "'x y' z"]
        );
    }

    #[test]
    fn assert_type_returns_value_or_yields() {
        let (_catalog, sink) = compile_ok(
            "notice(assert_type(String, 'ok'))\n$fallback = assert_type(String, 5) |$expected, $actual| { \"$expected vs $actual\" }\nnotice($fallback)",
        );
        assert_eq!(
            sink.messages_at(Level::Notice),
            vec!["ok", "String vs Integer"]
        );
    }

    #[test]
    fn assert_type_without_lambda_fails_on_mismatch() {
        let (error, _sink) = compile_err("assert_type(String, 5)");
        assert!(error.message().contains("expected String but found Integer"));
    }

    #[test]
    fn defined_checks_classes_resources_and_variables() {
        let (_catalog, sink) = compile_ok(
            "class a { }\nfile { '/x': }\n$v = 1\nnotice(defined('a'))\nnotice(defined(Class['a']))\nnotice(defined(File['/x']))\nnotice(defined(File['/nope']))\nnotice(defined('$v'))\nnotice(defined('$missing'))",
        );
        assert_eq!(
            sink.messages_at(Level::Notice),
            vec!["true", "true", "true", "false", "true", "false"]
        );
    }

    #[test]
    fn unknown_function_fails() {
        let (error, _sink) = compile_err("frobnicate('x')");
        assert!(error.message().contains("unknown function"));
    }

    #[test]
    fn unproductive_top_level_expression_fails() {
        let (error, _sink) = compile_err("1 + 1");
        assert!(error.message().contains("unproductive"));
    }

    #[test]
    fn parse_errors_fail_the_file() {
        let (error, sink) = compile_err("file { '/x' ensure => present }");
        assert!(error.message().contains("syntax errors"));
        assert!(
            sink.messages_at(Level::Error)
                .iter()
                .any(|m| m.contains("expected"))
        );
    }

    #[test]
    fn node_subnames_build_most_specific_first() {
        let node = Node::new("Web01.Example.Com");
        assert_eq!(
            node.names(),
            &["web01.example.com", "web01.example", "web01"]
        );
        assert_eq!(node.name(), "web01.example.com");
    }

    #[test]
    fn multiple_manifests_compile_in_order() {
        let mut sink = CollectingSink::new();
        let result = compile(
            "web01",
            facts(),
            vec![
                SourceFile::new("a.mf", "class a { notice('from a') }"),
                SourceFile::new("b.mf", "include a"),
            ],
            &mut sink,
        );
        assert!(result.is_ok(), "sink: {:#?}", sink.records);
        assert_eq!(sink.messages_at(Level::Notice), vec!["from a"]);
    }

    #[test]
    fn forward_class_references_work_across_manifests() {
        // The class is declared in the first manifest but defined in the
        // second; the scanner pre-pass makes this work.
        let mut sink = CollectingSink::new();
        let result = compile(
            "web01",
            facts(),
            vec![
                SourceFile::new("a.mf", "include later"),
                SourceFile::new("b.mf", "class later { notice('found') }"),
            ],
            &mut sink,
        );
        assert!(result.is_ok(), "sink: {:#?}", sink.records);
        assert_eq!(sink.messages_at(Level::Notice), vec!["found"]);
    }
}
