//! Rust grammar tables and semantic helpers.

use sift_core::{Node, PlaceholderRole, Tree, TypeHierarchy};

use super::resolve::resolve;
use super::{Grammar, Wrapper, base_type_name};

const INFERENCE_DEPTH: usize = 8;

pub(super) static GRAMMAR: Grammar = Grammar {
    statements: &[
        "expression_statement",
        "let_declaration",
        "empty_statement",
        "function_item",
        "struct_item",
        "enum_item",
        "union_item",
        "impl_item",
        "trait_item",
        "mod_item",
        "use_declaration",
        "const_item",
        "static_item",
        "type_item",
        "macro_definition",
        "extern_crate_declaration",
        "foreign_mod_item",
        "attribute_item",
    ],
    members: &[
        "function_item",
        "function_signature_item",
        "const_item",
        "type_item",
        "associated_type",
        "field_declaration",
        "enum_variant",
    ],
    unordered: &["declaration_list", "field_declaration_list"],
    lenient: &[
        (
            "function_item",
            &[
                "visibility_modifier",
                "function_modifiers",
                "type_parameters",
                "where_clause",
            ],
        ),
        (
            "struct_item",
            &["visibility_modifier", "type_parameters", "where_clause"],
        ),
        (
            "enum_item",
            &["visibility_modifier", "type_parameters", "where_clause"],
        ),
        ("trait_item", &["visibility_modifier", "type_parameters"]),
        ("impl_item", &["type_parameters", "where_clause"]),
        ("field_declaration", &["visibility_modifier"]),
        ("let_declaration", &["mutable_specifier"]),
    ],
    wrappers: &[("expression_statement", PlaceholderRole::Statement)],
    identifiers: &[
        "identifier",
        "field_identifier",
        "type_identifier",
        "shorthand_field_identifier",
    ],
    carriers: &[
        "function_item",
        "function_signature_item",
        "struct_item",
        "enum_item",
        "trait_item",
        "const_item",
        "static_item",
        "type_item",
        "mod_item",
    ],
    lists: &[
        "source_file",
        "block",
        "declaration_list",
        "field_declaration_list",
        "parameters",
        "arguments",
        "array_expression",
        "tuple_expression",
        "match_block",
        "use_list",
        "type_arguments",
        "enum_variant_list",
    ],
    comments: &["line_comment", "block_comment"],
    literals: &[
        "string_literal",
        "raw_string_literal",
        "char_literal",
        "integer_literal",
        "float_literal",
    ],
    scopes: &[
        "source_file",
        "block",
        "function_item",
        "closure_expression",
        "impl_item",
        "trait_item",
        "mod_item",
        "for_expression",
        "match_arm",
    ],
    declarations: &[
        ("let_declaration", Some("pattern")),
        ("parameter", Some("pattern")),
        ("function_item", Some("name")),
        ("struct_item", Some("name")),
        ("enum_item", Some("name")),
        ("trait_item", Some("name")),
        ("const_item", Some("name")),
        ("static_item", Some("name")),
        ("type_item", Some("name")),
        ("mod_item", Some("name")),
        ("closure_parameters", None),
        ("for_expression", Some("pattern")),
    ],
    expression_statement: "expression_statement",
    member_wrapper: Wrapper::Braced {
        prefix: "impl __SiftMember__ { ",
        suffix: "\n}",
    },
    function_wrapper: Wrapper::Braced {
        prefix: "fn __sift_wrapper__() { ",
        suffix: "\n}",
    },
};

/// Infers the static type of an expression from literals, annotations and
/// declared return types.
pub(super) fn static_type(node: Node<'_>) -> Option<String> {
    infer(node, INFERENCE_DEPTH)
}

fn infer(node: Node<'_>, budget: usize) -> Option<String> {
    let remaining = budget.checked_sub(1)?;
    match node.kind() {
        "integer_literal" => Some(literal_suffix(node.text(), "i32")),
        "float_literal" => Some(literal_suffix(node.text(), "f64")),
        "string_literal" | "raw_string_literal" => Some("&str".to_owned()),
        "char_literal" => Some("char".to_owned()),
        "boolean_literal" => Some("bool".to_owned()),
        "unit_expression" => Some("()".to_owned()),
        "struct_expression" => node.child_by_field("name").map(|name| name.text().to_owned()),
        "type_cast_expression" => node.child_by_field("type").map(|ty| ty.text().to_owned()),
        "parenthesized_expression" | "reference_expression" => {
            let inner = infer(node.named_children().last()?, remaining)?;
            Some(if node.kind() == "reference_expression" {
                format!("&{inner}")
            } else {
                inner
            })
        }
        "call_expression" => {
            let declaration = resolve(&GRAMMAR, node.child_by_field("function")?)?;
            declaration
                .child_by_field("return_type")
                .map(|ty| ty.text().to_owned())
        }
        "identifier" => declared_type(resolve(&GRAMMAR, node)?, remaining),
        _ => None,
    }
}

fn literal_suffix(text: &str, default: &str) -> String {
    const SUFFIXES: &[&str] = &[
        "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
        "f32", "f64",
    ];
    SUFFIXES
        .iter()
        .find(|suffix| text.ends_with(**suffix))
        .map_or(default, |suffix| *suffix)
        .to_owned()
}

fn declared_type(declaration: Node<'_>, budget: usize) -> Option<String> {
    if let Some(ty) = declaration.child_by_field("type") {
        return Some(ty.text().to_owned());
    }
    match declaration.kind() {
        "let_declaration" => infer(declaration.child_by_field("value")?, budget),
        _ => None,
    }
}

/// Lists visibility, function qualifiers and `mut`.
pub(super) fn modifiers(node: Node<'_>) -> Vec<String> {
    let mut found = Vec::new();
    for child in node.children() {
        match child.kind() {
            "visibility_modifier" => found.push(child.text().to_owned()),
            "function_modifiers" => {
                found.extend(child.children().map(|token| token.text().to_owned()));
            }
            "mutable_specifier" => found.push("mut".to_owned()),
            _ => {}
        }
    }
    found
}

/// Records `impl Trait for Type` and supertrait bounds as edges.
pub(super) fn type_hierarchy(tree: &Tree) -> TypeHierarchy {
    let mut hierarchy = TypeHierarchy::open();
    for node in tree.root_node().descendants() {
        match node.kind() {
            "impl_item" => {
                if let (Some(sup), Some(sub)) =
                    (node.child_by_field("trait"), node.child_by_field("type"))
                {
                    hierarchy.add_supertype(base_type_name(sub.text()), base_type_name(sup.text()));
                }
            }
            "trait_item" => {
                let (Some(name), Some(bounds)) =
                    (node.child_by_field("name"), node.child_by_field("bounds"))
                else {
                    continue;
                };
                for bound in bounds.named_children() {
                    hierarchy.add_supertype(name.text(), base_type_name(bound.text()));
                }
            }
            _ => {}
        }
    }
    hierarchy
}
