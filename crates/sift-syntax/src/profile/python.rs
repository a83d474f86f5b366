//! Python grammar tables and semantic helpers.

use sift_core::{Node, PlaceholderRole, Tree, TypeHierarchy};

use super::resolve::resolve;
use super::{Grammar, Wrapper, base_type_name};

const INFERENCE_DEPTH: usize = 8;

pub(super) static GRAMMAR: Grammar = Grammar {
    statements: &[
        "expression_statement",
        "return_statement",
        "if_statement",
        "for_statement",
        "while_statement",
        "try_statement",
        "with_statement",
        "function_definition",
        "class_definition",
        "decorated_definition",
        "import_statement",
        "import_from_statement",
        "pass_statement",
        "break_statement",
        "continue_statement",
        "raise_statement",
        "assert_statement",
        "delete_statement",
        "global_statement",
        "nonlocal_statement",
        "match_statement",
    ],
    members: &[
        "function_definition",
        "decorated_definition",
        "class_definition",
        "expression_statement",
    ],
    unordered: &[],
    lenient: &[
        ("try_statement", &["except_clause", "else_clause", "finally_clause"]),
        ("class_definition", &["argument_list"]),
        ("function_definition", &["async"]),
    ],
    wrappers: &[("expression_statement", PlaceholderRole::Statement)],
    identifiers: &["identifier"],
    carriers: &["function_definition", "class_definition"],
    lists: &[
        "module",
        "block",
        "argument_list",
        "parameters",
        "list",
        "dictionary",
        "tuple",
        "set",
    ],
    comments: &["comment"],
    literals: &["string", "concatenated_string", "integer", "float"],
    scopes: &["module", "function_definition", "class_definition", "lambda"],
    declarations: &[
        ("assignment", Some("left")),
        ("function_definition", Some("name")),
        ("class_definition", Some("name")),
        ("parameters", None),
        ("typed_parameter", None),
        ("default_parameter", Some("name")),
        ("typed_default_parameter", Some("name")),
        ("for_statement", Some("left")),
    ],
    expression_statement: "expression_statement",
    member_wrapper: Wrapper::Indented {
        header: "class __SiftMember__:",
    },
    function_wrapper: Wrapper::Indented {
        header: "def __sift_wrapper__():",
    },
};

/// Infers the static type of an expression from literals, annotations and
/// constructor calls.
pub(super) fn static_type(node: Node<'_>) -> Option<String> {
    infer(node, INFERENCE_DEPTH)
}

fn infer(node: Node<'_>, budget: usize) -> Option<String> {
    let remaining = budget.checked_sub(1)?;
    let literal = match node.kind() {
        "integer" => Some("int"),
        "float" => Some("float"),
        "string" | "concatenated_string" => Some("str"),
        "true" | "false" => Some("bool"),
        "none" => Some("None"),
        "list" | "list_comprehension" => Some("list"),
        "dictionary" | "dictionary_comprehension" => Some("dict"),
        "tuple" => Some("tuple"),
        "set" | "set_comprehension" => Some("set"),
        _ => None,
    };
    if let Some(name) = literal {
        return Some(name.to_owned());
    }
    match node.kind() {
        "parenthesized_expression" => infer(node.named_children().next()?, remaining),
        "call" => {
            let callee = node.child_by_field("function")?;
            let declaration = resolve(&GRAMMAR, callee)?;
            match declaration.kind() {
                "class_definition" => Some(callee.text().to_owned()),
                "function_definition" => declaration
                    .child_by_field("return_type")
                    .map(|ty| ty.text().to_owned()),
                _ => None,
            }
        }
        "identifier" => declared_type(resolve(&GRAMMAR, node)?, remaining),
        _ => None,
    }
}

fn declared_type(declaration: Node<'_>, budget: usize) -> Option<String> {
    if let Some(ty) = declaration.child_by_field("type") {
        return Some(ty.text().to_owned());
    }
    match declaration.kind() {
        "assignment" => infer(declaration.child_by_field("right")?, budget),
        _ => None,
    }
}

/// Lists decorator names and the `async` keyword of a definition.
pub(super) fn modifiers(node: Node<'_>) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(parent) = node
        .parent()
        .filter(|parent| parent.kind() == "decorated_definition")
    {
        found.extend(
            parent
                .children()
                .filter(|child| child.kind() == "decorator")
                .map(|decorator| decorator.text().trim_start_matches('@').trim().to_owned()),
        );
    }
    if node.children().any(|child| child.kind() == "async") {
        found.push("async".to_owned());
    }
    found
}

/// Records base classes as supertypes.
pub(super) fn type_hierarchy(tree: &Tree) -> TypeHierarchy {
    let mut hierarchy = TypeHierarchy::open();
    for node in tree.root_node().descendants() {
        if node.kind() != "class_definition" {
            continue;
        }
        let (Some(name), Some(bases)) = (
            node.child_by_field("name"),
            node.child_by_field("superclasses"),
        ) else {
            continue;
        };
        for base in bases
            .named_children()
            .filter(|base| base.kind() != "keyword_argument")
        {
            hierarchy.add_supertype(name.text(), base_type_name(base.text()));
        }
    }
    hierarchy
}
