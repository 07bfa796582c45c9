//! End-to-end resolution scenarios plus property and concurrency checks.
//!
//! Run with: `cargo test -p gocursor --test scenarios`

use std::collections::HashSet;
use std::sync::Arc;

use gocursor::{CursorContext, NodeKind, Resolver, ScopeSet, View, NIL_PACKAGE_NAME};
use proptest::prelude::*;
use rayon::prelude::*;

fn offset_after(src: &str, needle: &str) -> usize {
    src.find(needle).expect("needle present") + needle.len()
}

fn resolve(src: &str, pos: usize) -> Arc<CursorContext> {
    Resolver::new().resolve(src.as_bytes(), pos, None)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn assignment_right_hand_side_is_expression() {
    let src = "package p\n\nfunc f() {\n\tx := 1\n}\n";
    let cx = resolve(src, offset_after(src, "x := "));
    assert!(
        cx.scope()
            .all_of(ScopeSet::BLOCK | ScopeSet::ASSIGNMENT | ScopeSet::EXPRESSION),
        "got {}",
        cx.scope()
    );
}

#[test]
fn assignment_left_hand_side_is_not_expression() {
    let src = "package p\n\nfunc f() {\n\tx := 1\n}\n";
    let cx = resolve(src, src.find("x :=").unwrap());
    assert!(cx.scope().all_of(ScopeSet::BLOCK | ScopeSet::ASSIGNMENT));
    assert!(!cx.scope().any_of(ScopeSet::EXPRESSION), "got {}", cx.scope());
}

#[test]
fn import_string_is_import_path() {
    let src = "package p\n\nimport \"fmt\"\n";
    let cx = resolve(src, offset_after(src, "\"f"));
    assert!(cx.scope().all_of(ScopeSet::STRING | ScopeSet::IMPORT_PATH));
    assert!(cx.scope().any_of(ScopeSet::IMPORT));
    assert_eq!(cx.package_name(), "p");
    assert!(cx.import_spec().is_some());
}

#[test]
fn comment_without_package_clause() {
    let src = "// comment\n";
    let cx = resolve(src, 4);
    assert!(cx.scope().all_of(ScopeSet::PACKAGE | ScopeSet::COMMENT), "got {}", cx.scope());
    assert_eq!(cx.package_name(), NIL_PACKAGE_NAME);
    assert!(cx.comment().is_some());
}

#[test]
fn function_name_with_doc_comment() {
    let src = "package p\n\n// Foo does X.\nfunc Foo() {}\n";
    let cx = resolve(src, offset_after(src, "func F"));
    assert_eq!(cx.function_declaration_name(), "Foo");
    assert_eq!(cx.method_declaration_name(), "");

    let doc = cx.doc().expect("doc association");
    assert!(matches!(doc.node.kind, NodeKind::FuncDecl { .. }));
    assert_eq!(doc.text(), "Foo does X.");
    assert!(!cx.scope().any_of(ScopeSet::DOC));
}

#[test]
fn deferred_selector_suppresses_expression() {
    let src = "package p\n\nfunc (r *T) M() {\n\tdefer r.Close()\n}\n";
    let cx = resolve(src, offset_after(src, "r.Cl"));
    assert!(
        cx.scope()
            .all_of(ScopeSet::BLOCK | ScopeSet::DEFER | ScopeSet::SELECTOR),
        "got {}",
        cx.scope()
    );
    assert!(!cx.scope().any_of(ScopeSet::EXPRESSION));
    assert_eq!(cx.method_declaration_name(), "");
}

#[test]
fn open_parameter_list_does_not_trigger_keyword_heuristic() {
    let src = "package p\n\nfunc f(\n";
    let cx = resolve(src, offset_after(src, "func f("));
    assert_eq!(cx.current_line(), "func f(");
    assert!(!cx.scope().any_of(ScopeSet::FUNCTION_DECLARATION), "got {}", cx.scope());
}

#[test]
fn bare_func_keyword_is_function_declaration() {
    let src = "package p\n\nfunc \n";
    let cx = resolve(src, offset_after(src, "func "));
    assert_eq!(cx.current_line(), "func");
    assert!(cx.scope().all_of(ScopeSet::FUNCTION_DECLARATION), "got {}", cx.scope());
}

#[test]
fn func_keyword_with_name_is_function_declaration() {
    let src = "package p\n\nfunc Name\n";
    let cx = resolve(src, offset_after(src, "func Name"));
    assert!(cx.scope().all_of(ScopeSet::FUNCTION_DECLARATION), "got {}", cx.scope());
    assert!(!cx.scope().any_of(ScopeSet::EXPRESSION));
}

#[test]
fn bare_type_keyword_is_type_declaration() {
    let src = "package p\n\ntype \n";
    let cx = resolve(src, offset_after(src, "type "));
    assert!(
        cx.scope().all_of(ScopeSet::TYPE | ScopeSet::TYPE_DECLARATION),
        "got {}",
        cx.scope()
    );
}

#[test]
fn open_type_group_is_type_without_declaration() {
    // `(` is punctuation, so the keyword-line rule stays off
    let src = "package p\n\ntype (\n";
    let cx = resolve(src, offset_after(src, "type ("));
    assert!(cx.scope().any_of(ScopeSet::TYPE), "got {}", cx.scope());
    assert!(!cx.scope().any_of(ScopeSet::TYPE_DECLARATION), "got {}", cx.scope());
}

#[test]
fn complete_declarations_do_not_trigger_keyword_heuristic() {
    let src = "package p\n\ntype T int\n\nfunc F() {}\n";
    let cx = resolve(src, offset_after(src, "type T"));
    assert!(!cx.scope().any_of(ScopeSet::TYPE_DECLARATION), "got {}", cx.scope());
    let cx = resolve(src, offset_after(src, "func F"));
    assert!(!cx.scope().any_of(ScopeSet::FUNCTION_DECLARATION), "got {}", cx.scope());
}

#[test]
fn dangling_dot_is_selector() {
    let src = "package main\n\nfunc main() {\n\tfmt.\n}\n";
    let cx = resolve(src, offset_after(src, "fmt."));
    assert!(cx.scope().all_of(ScopeSet::BLOCK | ScopeSet::SELECTOR), "got {}", cx.scope());
    assert!(!cx.scope().any_of(ScopeSet::EXPRESSION), "got {}", cx.scope());
}

#[test]
fn keyword_without_package_name_retries_permissively() {
    let src = "package\n// c\n";
    let resolver = Resolver::new();
    let cx = resolver.resolve(src.as_bytes(), offset_after(src, "// "), None);
    assert!(cx.scope().all_of(ScopeSet::PACKAGE | ScopeSet::COMMENT), "got {}", cx.scope());
    assert_eq!(cx.package_name(), NIL_PACKAGE_NAME);
    assert!(cx.comment().is_some());
    assert_eq!(resolver.stats().parses.misses, 2);
}

#[test]
fn method_name_under_cursor() {
    let src = "package p\n\nfunc (r *T) Close() error { return nil }\n";
    let cx = resolve(src, offset_after(src, ") Cl"));
    assert_eq!(cx.method_declaration_name(), "Close");
    assert_eq!(cx.function_declaration_name(), "");
    assert_eq!(cx.func_decl_name(), Some(("Close", true)));
}

#[test]
fn return_value_is_expression() {
    let src = "package p\n\nfunc f() int {\n\treturn 1\n}\n";
    let cx = resolve(src, offset_after(src, "return "));
    assert!(cx.scope().all_of(ScopeSet::RETURN | ScopeSet::BLOCK | ScopeSet::EXPRESSION));
}

#[test]
fn const_group_sets_const() {
    let src = "package p\n\nconst (\n\tA = 1\n)\n";
    let cx = resolve(src, offset_after(src, "A = "));
    assert!(cx.scope().any_of(ScopeSet::CONST), "got {}", cx.scope());
    assert!(cx.group_decl().is_some());
}

#[test]
fn doc_comment_sets_doc_and_comment() {
    let src = "package p\n\n// Foo does X.\nfunc Foo() {}\n";
    let cx = resolve(src, offset_after(src, "// Fo"));
    assert!(cx.scope().all_of(ScopeSet::DOC | ScopeSet::COMMENT), "got {}", cx.scope());
    assert!(cx.doc().is_some_and(|d| d.encloses_cursor));
}

#[test]
fn empty_input_resolves_to_package_only() {
    let cx = resolve("", 0);
    assert_eq!(cx.scope(), ScopeSet::PACKAGE);
    assert_eq!(cx.package_name(), NIL_PACKAGE_NAME);
    assert!(!cx.is_test_file());
}

#[test]
fn test_file_detected_from_filename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p_test.go");
    std::fs::write(&path, "package p\n").unwrap();
    let cx = Resolver::new().resolve(b"", 3, Some(&path));
    assert!(cx.is_test_file());
    assert_eq!(cx.package_name(), "p");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_resolution_shares_one_result() {
    let src = "package p\n\nfunc f() {\n\tx := y.z\n}\n";
    let pos = offset_after(src, "y.");
    let resolver = Arc::new(Resolver::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || resolver.resolve(src.as_bytes(), pos, None))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for cx in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], cx));
    }
    assert_eq!(resolver.stats().contexts.misses, 1);
}

#[test]
fn parallel_views_match_direct_resolution() {
    let src = "package p\n\nimport \"os\"\n\nfunc main() {\n\tos.Exit(1)\n}\n";
    let resolver = Resolver::new();
    let views: Vec<View> = (0..=src.len())
        .map(|pos| View::new("main.go", None, src.as_bytes(), pos))
        .collect();

    let scopes: Vec<ScopeSet> = views
        .par_iter()
        .map(|view| resolver.resolve_view(view).scope())
        .collect();

    for (pos, scope) in scopes.into_iter().enumerate() {
        assert_eq!(scope, resolve(src, pos).scope(), "position {}", pos);
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const SNIPPETS: &[&str] = &[
    "package p\n\nfunc f() {\n\tx := 1\n}\n",
    "package p\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n",
    "package p\n\n// T is a type.\ntype T struct {\n\t// N counts.\n\tN int\n}\n",
    "package p\n\nfunc (r *T) M() {\n\tdefer r.Close()\n\tswitch r.n {\n\tcase 1:\n\t\treturn\n\t}\n}\n",
    "package p\n\nvar a, b = 1, \"two\" // trailing\n",
    "package p\n\nfunc f(\n",
    "// only a comment\n",
    "package p\r\n\r\nfunc f() {\r\n\ty = g(1, 2)   \r\n}\r\n",
    "package _\n\n/* block */\n",
];

fn snippet_and_position() -> impl Strategy<Value = (&'static str, usize)> {
    prop::sample::select(SNIPPETS).prop_flat_map(|src| (Just(src), 0..src.len() + 4))
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(src in "\\PC{0,120}", pos in 0usize..140) {
        let a = resolve(&src, pos);
        let b = resolve(&src, pos);
        prop_assert_eq!(a.scope(), b.scope());
        prop_assert_eq!(a.node_stack(), b.node_stack());
        prop_assert!(a.position() <= src.len());
    }

    #[test]
    fn prop_stack_is_a_containment_chain((src, pos) in snippet_and_position()) {
        let cx = resolve(src, pos);
        let stack = cx.node_stack().nodes();

        let mut ids = HashSet::new();
        for node in stack {
            prop_assert!(ids.insert(node.id), "duplicate node {}", node);
            prop_assert!(node.grammar_kind != "ERROR", "bad node pushed");
            prop_assert!(node.encloses(cx.position()), "{} does not enclose {}", node, cx.position());
        }

        let structural: Vec<_> = stack
            .iter()
            .filter(|n| !matches!(n.kind, NodeKind::Comment))
            .collect();
        for pair in structural.windows(2) {
            prop_assert!(
                pair[0].range.contains_range(&pair[1].range),
                "{} does not contain {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn prop_empty_source_is_sentinel(pos in 0usize..64) {
        let cx = resolve("", pos);
        prop_assert_eq!(cx.scope(), ScopeSet::PACKAGE);
        prop_assert_eq!(cx.package_name(), NIL_PACKAGE_NAME);
        prop_assert_eq!(cx.position(), 0);
    }
}
