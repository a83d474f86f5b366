//! TypeScript grammar tables and semantic helpers.

use sift_core::{Node, PlaceholderRole, Tree, TypeHierarchy};

use super::resolve::resolve;
use super::{Grammar, Wrapper, base_type_name, first_named_text};

const MEMBERS: &[&str] = &[
    "method_definition",
    "public_field_definition",
    "method_signature",
    "abstract_method_signature",
    "index_signature",
    "property_signature",
    "class_static_block",
];

const ACCESSIBILITY: &[&str] = &["public", "private", "protected"];

const MODIFIER_KEYWORDS: &[&str] = &[
    "static", "readonly", "async", "abstract", "declare", "get", "set", "const", "let", "var",
    "default",
];

/// Inference stops after this many indirections (`a = b`, `b = c`, ...).
const INFERENCE_DEPTH: usize = 8;

pub(super) static GRAMMAR: Grammar = Grammar {
    statements: &[
        "expression_statement",
        "lexical_declaration",
        "variable_declaration",
        "return_statement",
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "try_statement",
        "throw_statement",
        "break_statement",
        "continue_statement",
        "switch_statement",
        "statement_block",
        "empty_statement",
        "labeled_statement",
        "debugger_statement",
        "function_declaration",
        "generator_function_declaration",
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
        "type_alias_declaration",
        "enum_declaration",
        "module",
        "internal_module",
        "import_statement",
        "export_statement",
    ],
    members: MEMBERS,
    unordered: &["class_body", "interface_body", "object_type", "enum_body"],
    lenient: &[
        ("try_statement", &["catch_clause", "finally_clause"]),
        ("class_declaration", &["decorator", "type_parameters", "class_heritage"]),
        (
            "abstract_class_declaration",
            &["decorator", "type_parameters", "class_heritage"],
        ),
        (
            "method_definition",
            &[
                "decorator",
                "accessibility_modifier",
                "static",
                "override_modifier",
                "readonly",
                "async",
                "get",
                "set",
                "*",
                "?",
                "type_annotation",
            ],
        ),
        (
            "public_field_definition",
            &[
                "decorator",
                "declare",
                "accessibility_modifier",
                "static",
                "override_modifier",
                "readonly",
                "type_annotation",
                "?",
                "!",
            ],
        ),
        ("function_declaration", &["async", "type_parameters", "type_annotation"]),
        (
            "required_parameter",
            &[
                "accessibility_modifier",
                "readonly",
                "override_modifier",
                "decorator",
                "type_annotation",
            ],
        ),
        (
            "optional_parameter",
            &[
                "accessibility_modifier",
                "readonly",
                "override_modifier",
                "decorator",
                "type_annotation",
            ],
        ),
        ("variable_declarator", &["type_annotation"]),
        ("catch_clause", &["type_annotation"]),
        ("arrow_function", &["async", "type_annotation", "type_parameters"]),
        ("call_expression", &["type_arguments"]),
        ("new_expression", &["type_arguments"]),
    ],
    wrappers: &[
        ("expression_statement", PlaceholderRole::Statement),
        ("required_parameter", PlaceholderRole::Any),
        ("public_field_definition", PlaceholderRole::Member),
        ("property_signature", PlaceholderRole::Member),
    ],
    identifiers: &[
        "identifier",
        "property_identifier",
        "type_identifier",
        "shorthand_property_identifier",
        "shorthand_property_identifier_pattern",
        "private_property_identifier",
        "statement_identifier",
    ],
    carriers: &[
        "method_definition",
        "public_field_definition",
        "method_signature",
        "abstract_method_signature",
        "property_signature",
        "class_declaration",
        "abstract_class_declaration",
        "function_declaration",
        "interface_declaration",
        "enum_declaration",
        "type_alias_declaration",
    ],
    lists: &[
        "statement_block",
        "program",
        "class_body",
        "formal_parameters",
        "arguments",
        "array",
        "object",
        "interface_body",
        "object_type",
        "enum_body",
        "switch_body",
        "type_arguments",
    ],
    comments: &["comment"],
    literals: &["string", "template_string", "number", "regex"],
    scopes: &[
        "program",
        "statement_block",
        "function_declaration",
        "generator_function_declaration",
        "function_expression",
        "arrow_function",
        "method_definition",
        "class_body",
        "for_statement",
        "for_in_statement",
        "catch_clause",
    ],
    declarations: &[
        ("variable_declarator", Some("name")),
        ("function_declaration", Some("name")),
        ("generator_function_declaration", Some("name")),
        ("class_declaration", Some("name")),
        ("abstract_class_declaration", Some("name")),
        ("interface_declaration", Some("name")),
        ("enum_declaration", Some("name")),
        ("type_alias_declaration", Some("name")),
        ("required_parameter", Some("pattern")),
        ("optional_parameter", Some("pattern")),
        ("catch_clause", Some("parameter")),
    ],
    expression_statement: "expression_statement",
    member_wrapper: Wrapper::Braced {
        prefix: "class __SiftMember__ { ",
        suffix: "\n}",
    },
    function_wrapper: Wrapper::Braced {
        prefix: "function __sift_wrapper__() { ",
        suffix: "\n}",
    },
};

/// Infers the static type of an expression from literals, annotations,
/// constructor calls and declared return types.
pub(super) fn static_type(node: Node<'_>) -> Option<String> {
    infer(node, INFERENCE_DEPTH)
}

fn infer(node: Node<'_>, budget: usize) -> Option<String> {
    let remaining = budget.checked_sub(1)?;
    let literal = match node.kind() {
        "number" => Some("number"),
        "string" | "template_string" => Some("string"),
        "true" | "false" => Some("boolean"),
        "null" => Some("null"),
        "undefined" => Some("undefined"),
        "regex" => Some("RegExp"),
        _ => None,
    };
    if let Some(name) = literal {
        return Some(name.to_owned());
    }
    match node.kind() {
        "new_expression" => {
            let constructor = node.child_by_field("constructor")?;
            let arguments = node.child_by_field("type_arguments").map_or("", |args| args.text());
            Some(format!("{}{arguments}", constructor.text()))
        }
        "as_expression" | "satisfies_expression" => {
            node.named_children().last().map(|ty| ty.text().to_owned())
        }
        "parenthesized_expression" | "non_null_expression" => {
            infer(node.named_children().next()?, remaining)
        }
        "this" => node
            .ancestors()
            .find(|ancestor| ancestor.kind().ends_with("class_declaration"))
            .and_then(|class| class.child_by_field("name"))
            .map(|name| name.text().to_owned()),
        "call_expression" => {
            let declaration = resolve(&GRAMMAR, node.child_by_field("function")?)?;
            declaration
                .child_by_field("return_type")
                .and_then(annotation_text)
        }
        kind if GRAMMAR.is_identifier(kind) => declared_type(resolve(&GRAMMAR, node)?, remaining),
        _ => None,
    }
}

fn declared_type(declaration: Node<'_>, budget: usize) -> Option<String> {
    if let Some(annotation) = declaration.child_by_field("type") {
        return annotation_text(annotation);
    }
    match declaration.kind() {
        "variable_declarator" => infer(declaration.child_by_field("value")?, budget),
        _ => None,
    }
}

fn annotation_text(annotation: Node<'_>) -> Option<String> {
    if annotation.kind() == "type_annotation" {
        first_named_text(annotation)
    } else {
        Some(annotation.text().to_owned())
    }
}

/// Lists explicit modifiers plus the implicit `public` of members and the
/// `export` of exported declarations.
pub(super) fn modifiers(node: Node<'_>) -> Vec<String> {
    let holder = if node.kind() == "variable_declarator" {
        node.parent().unwrap_or(node)
    } else {
        node
    };
    let mut found: Vec<String> = holder.children().filter_map(modifier_token).collect();
    let has_accessibility = found
        .iter()
        .any(|modifier| ACCESSIBILITY.contains(&modifier.as_str()));
    if MEMBERS.contains(&node.kind()) && !has_accessibility {
        found.push("public".to_owned());
    }
    if holder
        .parent()
        .is_some_and(|parent| parent.kind() == "export_statement")
    {
        found.push("export".to_owned());
    }
    found
}

fn modifier_token(child: Node<'_>) -> Option<String> {
    match child.kind() {
        "accessibility_modifier" | "override_modifier" => Some(child.text().trim().to_owned()),
        kind if !child.is_named() && MODIFIER_KEYWORDS.contains(&kind) => Some(kind.to_owned()),
        _ => None,
    }
}

/// Collects `extends` and `implements` edges of classes and interfaces.
pub(super) fn type_hierarchy(tree: &Tree) -> TypeHierarchy {
    let mut hierarchy = TypeHierarchy::open();
    for node in tree.root_node().descendants() {
        let clauses: &[&str] = match node.kind() {
            "class_declaration" | "abstract_class_declaration" | "class" => {
                &["extends_clause", "implements_clause"]
            }
            "interface_declaration" => &["extends_type_clause"],
            _ => continue,
        };
        let Some(name) = node.child_by_field("name") else {
            continue;
        };
        for clause in heritage_clauses(node, clauses) {
            for parent_type in clause.named_children() {
                if parent_type.kind() != "type_arguments" {
                    hierarchy.add_supertype(name.text(), base_type_name(parent_type.text()));
                }
            }
        }
    }
    hierarchy
}

fn heritage_clauses<'t>(
    declaration: Node<'t>,
    clauses: &'static [&'static str],
) -> impl Iterator<Item = Node<'t>> {
    declaration
        .children()
        .flat_map(|child| {
            let nested = child.kind() == "class_heritage";
            std::iter::once(child).chain(nested.then(|| child.children()).into_iter().flatten())
        })
        .filter(move |child| clauses.contains(&child.kind()))
}
