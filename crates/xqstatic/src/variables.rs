//
// variables.rs
//
// In-scope variable resolution
//
// The resolver climbs from the query node to the root. At each step it knows
// the enclosing construct and which child the walk came through, and asks the
// construct which of its bindings that child can see. Bindings are emitted
// nearest scope first; within one scope the order is fixed per construct.
//

use serde::Serialize;

use crate::qname::QualifiedName;
use crate::syntax::{Node, NodeId, SyntaxKind};

/// A variable visible at a query position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub name: QualifiedName,
    /// The `VarName` token of the declaration.
    pub declaring_node: NodeId,
}

/// Variables in scope at `node`, nearest binding scope first.
///
/// Shadowed bindings are kept; the first occurrence of a name is the one a
/// reference at `node` would bind to.
pub fn in_scope_variables(node: Node<'_>) -> Vec<VariableBinding> {
    let mut out = Vec::new();
    let mut from = node;
    let mut current = node.parent();

    while let Some(scope) = current {
        collect_visible(scope, from, &mut out);
        from = scope;
        current = scope.parent();
    }

    log::trace!("{} in-scope variables at {:?}", out.len(), node);
    out
}

/// Push the bindings of `scope` that its child `from` can see.
fn collect_visible(scope: Node<'_>, from: Node<'_>, out: &mut Vec<VariableBinding>) {
    match scope.kind() {
        SyntaxKind::FLWORExpr => {
            for clause in from.preceding_siblings() {
                clause_bindings(clause, out);
            }
        }
        SyntaxKind::ForClause
        | SyntaxKind::LetClause
        | SyntaxKind::GroupByClause
        | SyntaxKind::BlockVarDecl => {
            // Earlier bindings of the same clause, in declaration order.
            let earlier: Vec<_> = from.preceding_siblings().collect();
            for binding in earlier.into_iter().rev() {
                binding_vars(binding, out);
            }
        }
        SyntaxKind::TumblingWindowClause | SyntaxKind::SlidingWindowClause => {
            if from.kind() == SyntaxKind::WindowEndCondition {
                if let Some(start) = scope.child_of_kind(SyntaxKind::WindowStartCondition) {
                    window_condition_vars(start, out);
                }
            }
        }
        SyntaxKind::WindowStartCondition | SyntaxKind::WindowEndCondition => {
            if from.kind() != SyntaxKind::WindowVars {
                window_condition_vars(scope, out);
            }
        }
        SyntaxKind::QuantifiedExpr => {
            let bindings = if from.kind() == SyntaxKind::QuantifiedBinding {
                from.preceding_siblings().collect::<Vec<_>>()
            } else {
                scope
                    .children_of_kind(SyntaxKind::QuantifiedBinding)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect()
            };
            for binding in bindings {
                binding_vars(binding, out);
            }
        }
        SyntaxKind::TypeswitchCase | SyntaxKind::TypeswitchDefault => {
            if !matches!(from.kind(), SyntaxKind::VarName | SyntaxKind::SequenceType) {
                push_var_name(scope, out);
            }
        }
        SyntaxKind::FunctionDecl | SyntaxKind::InlineFunctionExpr => {
            if from.kind() == SyntaxKind::FunctionBody {
                if let Some(params) = scope.child_of_kind(SyntaxKind::ParamList) {
                    for param in params.children_of_kind(SyntaxKind::Param) {
                        push_var_name(param, out);
                    }
                }
            }
        }
        SyntaxKind::Prolog => match from.kind() {
            SyntaxKind::VarDecl => {
                for decl in from.preceding_siblings() {
                    if decl.kind() == SyntaxKind::VarDecl {
                        push_var_name(decl, out);
                    }
                }
            }
            SyntaxKind::FunctionDecl => prolog_vars(scope, out),
            _ => {}
        },
        SyntaxKind::MainModule | SyntaxKind::LibraryModule => {
            if from.kind() == SyntaxKind::QueryBody {
                if let Some(prolog) = scope.child_of_kind(SyntaxKind::Prolog) {
                    prolog_vars(prolog, out);
                }
            }
        }
        SyntaxKind::Block => {
            if from.kind() == SyntaxKind::BlockVarDecl {
                let earlier: Vec<_> = from.preceding_siblings().collect();
                for decl in earlier.into_iter().rev() {
                    for entry in decl.children_of_kind(SyntaxKind::BlockVarDeclEntry) {
                        push_var_name(entry, out);
                    }
                }
            } else {
                for decl in scope.children_of_kind(SyntaxKind::BlockVarDecl) {
                    for entry in decl.children_of_kind(SyntaxKind::BlockVarDeclEntry) {
                        push_var_name(entry, out);
                    }
                }
            }
        }

        // A binding's own variable is not visible in its expressions.
        SyntaxKind::ForBinding
        | SyntaxKind::LetBinding
        | SyntaxKind::GroupingSpec
        | SyntaxKind::QuantifiedBinding
        | SyntaxKind::BlockVarDeclEntry
        | SyntaxKind::VarDecl
        | SyntaxKind::Param
        | SyntaxKind::CountClause
        | SyntaxKind::PositionalVar
        | SyntaxKind::WindowVars
        | SyntaxKind::CurrentItem
        | SyntaxKind::PreviousItem
        | SyntaxKind::NextItem
        | SyntaxKind::TypeswitchExpr
        | SyntaxKind::ParamList => {}

        // No scoping effect.
        SyntaxKind::ModuleDecl
        | SyntaxKind::QueryBody
        | SyntaxKind::NamespaceDecl
        | SyntaxKind::DefaultNamespaceDecl
        | SyntaxKind::DefaultNamespaceKind
        | SyntaxKind::SchemaImport
        | SyntaxKind::SchemaPrefix
        | SyntaxKind::ModuleImport
        | SyntaxKind::LocationHint
        | SyntaxKind::FunctionBody
        | SyntaxKind::TypeDeclaration
        | SyntaxKind::OptionDecl
        | SyntaxKind::DirElemConstructor
        | SyntaxKind::DirAttributeList
        | SyntaxKind::DirAttribute
        | SyntaxKind::AttributeName
        | SyntaxKind::DirAttributeValue
        | SyntaxKind::EnclosedExpr
        | SyntaxKind::WhereClause
        | SyntaxKind::OrderByClause
        | SyntaxKind::ReturnClause
        | SyntaxKind::SequenceType
        | SyntaxKind::FunctionCall
        | SyntaxKind::ArgumentList
        | SyntaxKind::ArgumentPlaceholder
        | SyntaxKind::NamedFunctionRef
        | SyntaxKind::ArrowExpr
        | SyntaxKind::ArrowFunctionSpecifier
        | SyntaxKind::Expr
        | SyntaxKind::ParenthesizedExpr
        | SyntaxKind::IfExpr
        | SyntaxKind::PathExpr
        | SyntaxKind::VarRef
        | SyntaxKind::ContextItemExpr
        | SyntaxKind::NCName
        | SyntaxKind::EQName
        | SyntaxKind::VarName
        | SyntaxKind::UriLiteral
        | SyntaxKind::StringLiteral
        | SyntaxKind::NumericLiteral
        | SyntaxKind::Error => {}
    }
}

/// Everything a FLWOR clause makes visible to the clauses after it.
fn clause_bindings(clause: Node<'_>, out: &mut Vec<VariableBinding>) {
    match clause.kind() {
        SyntaxKind::ForClause | SyntaxKind::LetClause | SyntaxKind::GroupByClause => {
            for binding in clause.children() {
                binding_vars(binding, out);
            }
        }
        SyntaxKind::TumblingWindowClause | SyntaxKind::SlidingWindowClause => {
            push_var_name(clause, out);
            for condition in [SyntaxKind::WindowStartCondition, SyntaxKind::WindowEndCondition] {
                if let Some(condition) = clause.child_of_kind(condition) {
                    window_condition_vars(condition, out);
                }
            }
        }
        SyntaxKind::CountClause => push_var_name(clause, out),
        _ => {}
    }
}

/// A binding's variable followed by its positional variable.
fn binding_vars(binding: Node<'_>, out: &mut Vec<VariableBinding>) {
    match binding.kind() {
        SyntaxKind::ForBinding
        | SyntaxKind::LetBinding
        | SyntaxKind::GroupingSpec
        | SyntaxKind::QuantifiedBinding
        | SyntaxKind::BlockVarDeclEntry => {
            push_var_name(binding, out);
            if let Some(positional) = binding.child_of_kind(SyntaxKind::PositionalVar) {
                push_var_name(positional, out);
            }
        }
        _ => {}
    }
}

/// `current`, `at`, `previous`, `next` variables of a window condition.
fn window_condition_vars(condition: Node<'_>, out: &mut Vec<VariableBinding>) {
    if let Some(vars) = condition.child_of_kind(SyntaxKind::WindowVars) {
        for var in vars.children() {
            push_var_name(var, out);
        }
    }
}

/// Prolog variable declarations, last declared first.
fn prolog_vars(prolog: Node<'_>, out: &mut Vec<VariableBinding>) {
    for decl in prolog.children().rev() {
        if decl.kind() == SyntaxKind::VarDecl {
            push_var_name(decl, out);
        }
    }
}

fn push_var_name(declaration: Node<'_>, out: &mut Vec<VariableBinding>) {
    let Some(token) = declaration.child_of_kind(SyntaxKind::VarName) else {
        return;
    };
    match token.text().and_then(QualifiedName::parse) {
        Some(name) => out.push(VariableBinding {
            name,
            declaring_node: token.id(),
        }),
        None => log::debug!("Skipping unnamed binding in {:?}", declaration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTree;
    use crate::test_utils::fixture::*;

    fn names_at(query: Node<'_>) -> Vec<String> {
        in_scope_variables(query)
            .into_iter()
            .map(|b| b.name.to_string())
            .collect()
    }

    fn names_at_test_call(tree: &SyntaxTree) -> Vec<String> {
        names_at(find_token(tree, SyntaxKind::EQName, "test"))
    }

    #[test]
    fn test_for_return_sees_bindings_in_declaration_order() {
        // for $x in 1, $y in 2 return test()
        let tree = query(flwor(
            vec![for_clause(vec![for_binding("x", None, num("1")), for_binding("y", None, num("2"))])],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x", "y"]);
    }

    #[test]
    fn test_for_value_sees_only_earlier_bindings() {
        // for $x in 1, $y in test() return 1
        let tree = query(flwor(
            vec![for_clause(vec![
                for_binding("x", None, num("1")),
                for_binding("y", None, call("test", vec![])),
            ])],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x"]);
    }

    #[test]
    fn test_nested_clauses_nearest_first() {
        // for $x in 1 for $y in 2, $z in 3 return test()
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("1"))]),
                for_clause(vec![for_binding("y", None, num("2")), for_binding("z", None, num("3"))]),
            ],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "z", "x"]);

        // for $x in 2 for $y in 3, $z in test() return 1
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("2"))]),
                for_clause(vec![
                    for_binding("y", None, num("3")),
                    for_binding("z", None, call("test", vec![])),
                ]),
            ],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "x"]);
    }

    #[test]
    fn test_positional_variable_follows_its_binding() {
        // for $x at $i in 1, $y in 2 return test()
        let tree = query(flwor(
            vec![for_clause(vec![for_binding("x", Some("i"), num("1")), for_binding("y", None, num("2"))])],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x", "i", "y"]);

        // for $x at $i in test() return 1
        let tree = query(flwor(
            vec![for_clause(vec![for_binding("x", Some("i"), call("test", vec![]))])],
            num("1"),
        ));
        assert!(names_at_test_call(&tree).is_empty());
    }

    #[test]
    fn test_let_value_isolation() {
        // let $x := 1, $y := test() return 1
        let tree = query(flwor(
            vec![let_clause(vec![let_binding("x", num("1")), let_binding("y", call("test", vec![]))])],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x"]);
    }

    #[test]
    fn test_sliding_window_return() {
        // for $x in 1 for sliding window $y in 1 start $z at $w when 2 return test()
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("1"))]),
                window_clause(
                    SyntaxKind::SlidingWindowClause,
                    "y",
                    num("1"),
                    window_condition(SyntaxKind::WindowStartCondition, Some("z"), Some("w"), None, None, num("2")),
                    None,
                ),
            ],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "z", "w", "x"]);
    }

    #[test]
    fn test_window_conditions() {
        // for tumbling window $w in test-in()
        //   start $s at $p previous $prev next $next when test()
        //   end $e when test-end()
        // return 1
        let tree = query(flwor(
            vec![window_clause(
                SyntaxKind::TumblingWindowClause,
                "w",
                call("test-in", vec![]),
                window_condition(
                    SyntaxKind::WindowStartCondition,
                    Some("s"),
                    Some("p"),
                    Some("prev"),
                    Some("next"),
                    call("test", vec![]),
                ),
                Some(window_condition(SyntaxKind::WindowEndCondition, Some("e"), None, None, None, call("test-end", vec![]))),
            )],
            call("test-return", vec![]),
        ));
        assert!(names_at(find_token(&tree, SyntaxKind::EQName, "test-in")).is_empty());
        assert_eq!(names_at_test_call(&tree), vec!["s", "p", "prev", "next"]);
        assert_eq!(
            names_at(find_token(&tree, SyntaxKind::EQName, "test-end")),
            vec!["e", "s", "p", "prev", "next"]
        );
        assert_eq!(
            names_at(find_token(&tree, SyntaxKind::EQName, "test-return")),
            vec!["w", "s", "p", "prev", "next", "e"]
        );
    }

    #[test]
    fn test_count_clause() {
        // for $x in 1 count $y return test()
        let tree = query(flwor(
            vec![for_clause(vec![for_binding("x", None, num("1"))]), count_clause("y")],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "x"]);
    }

    #[test]
    fn test_group_by() {
        // for $x in 1 group by $y, $z return test()
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("1"))]),
                group_by(vec![grouping_spec("y", None), grouping_spec("z", None)]),
            ],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "z", "x"]);

        // for $x in 1 group by $y := 2, $z := test() return 1
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("1"))]),
                group_by(vec![grouping_spec("y", Some(num("2"))), grouping_spec("z", Some(call("test", vec![])))]),
            ],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "x"]);
    }

    #[test]
    fn test_where_and_order_by_see_preceding_clauses() {
        // for $x in 1 let $y := 2 where test() order by test-order() return 1
        let tree = query(flwor(
            vec![
                for_clause(vec![for_binding("x", None, num("1"))]),
                let_clause(vec![let_binding("y", num("2"))]),
                where_clause(call("test", vec![])),
                order_by(call("test-order", vec![])),
            ],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "x"]);
        assert_eq!(names_at(find_token(&tree, SyntaxKind::EQName, "test-order")), vec!["y", "x"]);
    }

    #[test]
    fn test_quantified_expressions() {
        // some $x in 1, $y in 2 satisfies test()
        let tree = query(quantified(
            vec![quantified_binding("x", num("1")), quantified_binding("y", num("2"))],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y", "x"]);

        // some $x in 1, $y in test() satisfies 1
        let tree = query(quantified(
            vec![quantified_binding("x", num("1")), quantified_binding("y", call("test", vec![]))],
            num("1"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x"]);
    }

    #[test]
    fn test_typeswitch_variables_are_branch_local() {
        // typeswitch (test-operand()) case $a as xs:string return test()
        //   case $b as xs:int return test-b() default $c return test-c()
        let tree = query(typeswitch(
            call("test-operand", vec![]),
            vec![
                typeswitch_case(Some("a"), "xs:string", call("test", vec![])),
                typeswitch_case(Some("b"), "xs:int", call("test-b", vec![])),
            ],
            typeswitch_default(Some("c"), call("test-c", vec![])),
        ));
        assert!(names_at(find_token(&tree, SyntaxKind::EQName, "test-operand")).is_empty());
        assert_eq!(names_at_test_call(&tree), vec!["a"]);
        assert_eq!(names_at(find_token(&tree, SyntaxKind::EQName, "test-b")), vec!["b"]);
        assert_eq!(names_at(find_token(&tree, SyntaxKind::EQName, "test-c")), vec!["c"]);
    }

    #[test]
    fn test_function_parameters_and_prolog_variables() {
        // declare function f($x, $y) { test() }; declare variable $v := 1; declare variable $w := 2; test-body()
        let tree = main_module(
            vec![
                function_decl("f", vec![param("x"), param("y")], Some(call("test", vec![]))),
                var_decl("v", Some(num("1"))),
                var_decl("w", Some(num("2"))),
            ],
            call("test-body", vec![]),
        );
        assert_eq!(names_at_test_call(&tree), vec!["x", "y", "w", "v"]);
        assert_eq!(names_at(find_token(&tree, SyntaxKind::EQName, "test-body")), vec!["w", "v"]);
    }

    #[test]
    fn test_var_decl_initializer_sees_earlier_declarations() {
        // declare variable $x := 1; declare variable $y := test(); declare variable $z := 3; 1
        let tree = main_module(
            vec![
                var_decl("x", Some(num("1"))),
                var_decl("y", Some(call("test", vec![]))),
                var_decl("z", Some(num("3"))),
            ],
            num("1"),
        );
        assert_eq!(names_at_test_call(&tree), vec!["x"]);
    }

    #[test]
    fn test_inline_function_parameters_stay_inside_body() {
        // function ($x) { test() }
        let tree = query(inline_function(vec![param("x")], call("test", vec![])));
        assert_eq!(names_at_test_call(&tree), vec!["x"]);

        // function ($x) {}(test())
        let tree = query(dynamic_call(inline_function(vec![param("x")], empty_expr()), vec![call("test", vec![])]));
        assert!(names_at_test_call(&tree).is_empty());
    }

    #[test]
    fn test_block_declarations() {
        // block { declare $x := 1; declare $y := 2; test() }
        let tree = query(block(
            vec![block_var_decl(vec![("x", Some(num("1")))]), block_var_decl(vec![("y", Some(num("2")))])],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x", "y"]);

        // block { declare $x := 1, $y := test(); 2 }
        let tree = query(block(
            vec![block_var_decl(vec![("x", Some(num("1"))), ("y", Some(call("test", vec![])))])],
            num("2"),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["x"]);
    }

    #[test]
    fn test_shadowing_keeps_both_bindings() {
        // let $x := 1 return let $x := 2 return test()
        let tree = query(flwor(
            vec![let_clause(vec![let_binding("x", num("1"))])],
            flwor(vec![let_clause(vec![let_binding("x", num("2"))])], call("test", vec![])),
        ));
        let bindings = in_scope_variables(find_token(&tree, SyntaxKind::EQName, "test"));
        assert_eq!(bindings.len(), 2);
        assert_ne!(bindings[0].declaring_node, bindings[1].declaring_node);
        assert!(bindings[0].declaring_node > bindings[1].declaring_node);
    }

    #[test]
    fn test_unnamed_bindings_contribute_nothing() {
        // for $ in 1, $y in 2 return test()
        let tree = query(flwor(
            vec![for_clause(vec![for_binding("", None, num("1")), for_binding("y", None, num("2"))])],
            call("test", vec![]),
        ));
        assert_eq!(names_at_test_call(&tree), vec!["y"]);
    }

    #[test]
    fn test_names_are_unexpanded() {
        let tree = query(flwor(
            vec![let_clause(vec![let_binding("a:x", num("1"))])],
            call("test", vec![]),
        ));
        let bindings = in_scope_variables(find_token(&tree, SyntaxKind::EQName, "test"));
        assert_eq!(bindings[0].name, QualifiedName::prefixed("a", "x"));
    }
}
