//! Parameter lists of script functions.
//!
//! The engine does not expose parameter names, so they are read from the
//! function's source text as returned by `Function.prototype.toString`,
//! parsed with the tree-sitter JavaScript grammar.

use std::collections::HashSet;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Error, Result};
use crate::member::Parameter;

/// Ways to turn a function's source text into a parseable expression.
/// Method shorthand (`build(target) { ... }`) only parses inside an object
/// literal.
const WRAPPERS: [(&str, &str); 2] = [("(", ")"), ("({", "})")];

const FUNCTION_KINDS: &[&str] = &[
    "function_expression",
    "function",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "arrow_function",
    "method_definition",
    "class",
    "class_declaration",
];

/// Reads the parameter list of a function from its source text.
///
/// Handles `function` declarations and expressions (including `async` and
/// generators), arrow functions, method shorthand, and class constructors.
/// A parameter with a default expression is reported as
/// [`Parameter::declared_default`] and `...rest` as
/// [`Parameter::variadic`]. A destructuring pattern gets the name `argN`,
/// where `N` is its position, or `argN_K` with the smallest `K` that differs
/// from every declared name.
///
/// # Errors
///
/// Returns [`Error::Grammar`] if the JavaScript grammar cannot be loaded.
///
/// # Examples
///
/// ```
/// use workdir::script::params::parse_parameters;
///
/// let params = parse_parameters("function double(\n  n, // the number\n  workdir\n) {}").unwrap();
/// let names: Vec<_> = params.iter().map(|p| p.name()).collect();
/// assert_eq!(names, vec!["n", "workdir"]);
/// ```
pub fn parse_parameters(source: &str) -> Result<Vec<Parameter>> {
    Ok(own_parameters(source)?.unwrap_or_default())
}

/// Like [`parse_parameters`], but returns `None` for a derived class that
/// declares no constructor of its own and so takes its parent's.
///
/// # Errors
///
/// Returns [`Error::Grammar`] if the JavaScript grammar cannot be loaded.
pub fn own_parameters(source: &str) -> Result<Option<Vec<Parameter>>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_javascript::LANGUAGE.into())
        .map_err(|e| Error::Grammar {
            message: e.to_string(),
        })?;

    let mut fallback: Option<(Tree, String)> = None;
    for (open, close) in WRAPPERS {
        let text = format!("{open}{source}{close}");
        let Some(tree) = parser.parse(&text, None) else {
            continue;
        };
        if find_function(tree.root_node()).is_none() {
            continue;
        }
        if !tree.root_node().has_error() {
            return Ok(read_tree(&tree, &text));
        }
        if fallback.is_none() {
            fallback = Some((tree, text));
        }
    }

    match fallback {
        Some((tree, text)) => {
            log::debug!("Reading parameters from partially parsed source: {source}");
            Ok(read_tree(&tree, &text))
        }
        None => {
            log::debug!("No function found in source: {source}");
            Ok(Some(Vec::new()))
        }
    }
}

fn read_tree(tree: &Tree, text: &str) -> Option<Vec<Parameter>> {
    match find_function(tree.root_node()) {
        Some(function) => read_function(function, text),
        None => Some(Vec::new()),
    }
}

/// The outermost function or class node, in document order.
fn find_function(node: Node<'_>) -> Option<Node<'_>> {
    if FUNCTION_KINDS.contains(&node.kind()) {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(find_function)
}

fn read_function(function: Node<'_>, text: &str) -> Option<Vec<Parameter>> {
    if matches!(function.kind(), "class" | "class_declaration") {
        return constructor_parameters(function, text);
    }
    // `x => ...` has a single bare parameter
    if let Some(single) = function.child_by_field_name("parameter") {
        return Some(vec![Parameter::required(node_text(single, text))]);
    }
    Some(
        function
            .child_by_field_name("parameters")
            .map(|list| parameter_list(list, text))
            .unwrap_or_default(),
    )
}

fn constructor_parameters(class: Node<'_>, text: &str) -> Option<Vec<Parameter>> {
    let mut cursor = class.walk();
    let children: Vec<Node<'_>> = class.named_children(&mut cursor).collect();
    let derived = children.iter().any(|c| c.kind() == "class_heritage");

    let constructor = class.child_by_field_name("body").and_then(|body| {
        let mut cursor = body.walk();
        let members: Vec<Node<'_>> = body.named_children(&mut cursor).collect();
        members.into_iter().find(|member| is_constructor(*member, text))
    });

    match constructor {
        Some(constructor) => Some(
            constructor
                .child_by_field_name("parameters")
                .map(|list| parameter_list(list, text))
                .unwrap_or_default(),
        ),
        None if derived => None,
        None => Some(Vec::new()),
    }
}

fn is_constructor(member: Node<'_>, text: &str) -> bool {
    if member.kind() != "method_definition" {
        return false;
    }
    let mut cursor = member.walk();
    let is_static = member.children(&mut cursor).any(|c| c.kind() == "static");
    !is_static
        && member
            .child_by_field_name("name")
            .is_some_and(|name| node_text(name, text) == "constructor")
}

fn parameter_list(list: Node<'_>, text: &str) -> Vec<Parameter> {
    let mut cursor = list.walk();
    let nodes: Vec<Node<'_>> = list
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let declared: HashSet<&str> = nodes.iter().filter_map(|n| bound_name(*n, text)).collect();

    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let name = bound_name(*node, text)
                .map_or_else(|| placeholder(index, &declared), str::to_string);
            match node.kind() {
                "rest_pattern" => Parameter::variadic(name),
                "assignment_pattern" => Parameter::declared_default(name),
                _ => Parameter::required(name),
            }
        })
        .collect()
}

/// The identifier a parameter binds, or `None` for a destructuring pattern.
fn bound_name<'s>(node: Node<'_>, text: &'s str) -> Option<&'s str> {
    let target = match node.kind() {
        "assignment_pattern" => node.child_by_field_name("left")?,
        "rest_pattern" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|n| n.kind() != "comment")?;
            inner
        }
        _ => node,
    };
    (target.kind() == "identifier").then(|| node_text(target, text))
}

fn placeholder(index: usize, declared: &HashSet<&str>) -> String {
    let base = format!("arg{index}");
    let mut name = base.clone();
    let mut suffix = 0;
    while declared.contains(name.as_str()) {
        suffix += 1;
        name = format!("{base}_{suffix}");
    }
    name
}

fn node_text<'s>(node: Node<'_>, text: &'s str) -> &'s str {
    &text[node.byte_range()]
}
