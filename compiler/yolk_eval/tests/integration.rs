#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
//! End-to-end tests for the Yolk evaluator.
//!
//! Programs are built directly from `yolk_ir` constructors, run through a
//! fresh interpreter with a buffered print handler, and checked through the
//! captured output, the top-level bindings, or the returned error.

use pretty_assertions::assert_eq;
use yolk_eval::{
    buffer_handler, scripted_handler, EvalError, EvalErrorKind, Interpreter, InterpreterBuilder,
    Value,
};
use yolk_ir::{BinaryOp, Expr, FunctionDecl, Program, Stmt, TypeExpr, VarDecl};

fn interpreter() -> Interpreter {
    InterpreterBuilder::new()
        .print_handler(buffer_handler())
        .input_handler(scripted_handler(["42"]))
        .build()
}

/// Run a program, returning the interpreter for inspection.
fn run(stmts: Vec<Stmt>) -> (Interpreter, Result<(), EvalError>) {
    let mut interp = interpreter();
    let result = interp.run(&Program::new(stmts));
    (interp, result)
}

/// Run a program that must succeed and return its output.
fn run_ok(stmts: Vec<Stmt>) -> String {
    let (interp, result) = run(stmts);
    if let Err(err) = result {
        panic!("program failed: {err}");
    }
    interp.print_handler().get_output()
}

/// Run a program that must fail and return the error message.
fn run_err(stmts: Vec<Stmt>) -> String {
    match run(stmts).1 {
        Err(err) => err.message,
        Ok(()) => panic!("expected the program to fail"),
    }
}

fn println(args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::call("println", args))
}

fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

fn ident(name: &str) -> Expr {
    Expr::ident(name)
}

fn int_type() -> TypeExpr {
    TypeExpr::named("int")
}

// =============================================================================
// Arithmetic
// =============================================================================

mod arithmetic {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_int_division_yields_float() {
        let out = run_ok(vec![
            println(vec![bin(BinaryOp::Div, Expr::int(5), Expr::int(2))]),
            println(vec![bin(BinaryOp::Mod, Expr::int(5), Expr::int(2))]),
        ]);
        assert_eq!(out, "2.5\n1\n");
    }

    #[test]
    fn test_modulo_stays_int() {
        let (interp, result) = run(vec![Stmt::var(
            "r",
            bin(BinaryOp::Mod, Expr::int(5), Expr::int(2)),
        )]);
        result.unwrap();
        assert!(matches!(interp.global("r"), Some(Value::Int(1))));
    }

    #[test]
    fn test_division_by_zero_raises() {
        assert_eq!(
            run_err(vec![Stmt::var("q", bin(BinaryOp::Div, Expr::int(5), Expr::int(0)))]),
            "division by zero"
        );
        assert_eq!(
            run_err(vec![Stmt::var(
                "q",
                bin(BinaryOp::Div, Expr::float(5.0), Expr::float(0.0))
            )]),
            "division by zero"
        );
    }

    #[test]
    fn test_mixed_int_float_promotes() {
        let out = run_ok(vec![println(vec![bin(
            BinaryOp::Add,
            Expr::int(1),
            Expr::float(0.5),
        )])]);
        assert_eq!(out, "1.5\n");
    }

    #[test]
    fn test_error_operand_propagates() {
        // (1 / 0) + 1 reports the division, not the addition.
        let message = run_err(vec![println(vec![bin(
            BinaryOp::Add,
            bin(BinaryOp::Div, Expr::int(1), Expr::int(0)),
            Expr::int(1),
        )])]);
        assert_eq!(message, "division by zero");
    }

    #[test]
    fn test_error_equality_compares_messages() {
        let err = |message: &str| Expr::call("error", vec![Expr::string(message)]);
        let out = run_ok(vec![println(vec![
            bin(BinaryOp::Eq, err("a"), err("a")),
            bin(BinaryOp::Eq, err("a"), err("b")),
            bin(BinaryOp::Eq, err("a"), Expr::int(1)),
            bin(BinaryOp::NotEq, err("a"), Expr::int(1)),
        ])]);
        assert_eq!(out, "yes no no yes\n");
    }

    #[test]
    fn test_logical_operators_require_bool() {
        let (_, result) = run(vec![println(vec![bin(
            BinaryOp::And,
            Expr::int(1),
            Expr::bool(true),
        )])]);
        assert!(matches!(
            result.unwrap_err().kind,
            EvalErrorKind::NonBoolOperand { .. }
        ));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side would divide by zero if evaluated.
        let out = run_ok(vec![println(vec![bin(
            BinaryOp::Or,
            Expr::bool(true),
            bin(
                BinaryOp::Eq,
                bin(BinaryOp::Div, Expr::int(1), Expr::int(0)),
                Expr::int(1),
            ),
        )])]);
        assert_eq!(out, "yes\n");
    }
}

// =============================================================================
// Declarations and assignment
// =============================================================================

mod declarations {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multi_declaration() {
        let (interp, result) = run(vec![Stmt::decl(
            VarDecl::new(vec!["a", "b"]).values(vec![Expr::int(4), Expr::int(2)]),
        )]);
        result.unwrap();
        assert!(matches!(interp.global("a"), Some(Value::Int(4))));
        assert!(matches!(interp.global("b"), Some(Value::Int(2))));
    }

    #[test]
    fn test_multi_declaration_count_mismatch() {
        let message = run_err(vec![Stmt::decl(
            VarDecl::new(vec!["a", "b"]).values(vec![Expr::int(4)]),
        )]);
        assert_eq!(message, "assignment mismatch: 2 variables but 1 value");
    }

    #[test]
    fn test_multi_declaration_from_tuple_result() {
        let pair = FunctionDecl::new("pair")
            .returns(vec![int_type(), TypeExpr::named("string")])
            .body(vec![Stmt::ret(vec![Expr::int(1), Expr::string("one")])]);
        let out = run_ok(vec![
            Stmt::func(pair),
            Stmt::decl(VarDecl::new(vec!["n", "s"]).values(vec![Expr::call("pair", vec![])])),
            println(vec![ident("s"), ident("n")]),
        ]);
        assert_eq!(out, "one 1\n");
    }

    #[test]
    fn test_zero_values_of_annotations() {
        let out = run_ok(vec![
            Stmt::decl(VarDecl::new(vec!["n"]).typed(int_type())),
            Stmt::decl(VarDecl::new(vec!["f"]).typed(TypeExpr::named("float"))),
            Stmt::decl(VarDecl::new(vec!["b"]).typed(TypeExpr::named("bool"))),
            Stmt::decl(VarDecl::new(vec!["xs"]).typed(TypeExpr::array(int_type()))),
            println(vec![ident("n"), ident("f"), ident("b"), ident("xs")]),
        ]);
        assert_eq!(out, "0 0 no []\n");
    }

    #[test]
    fn test_int_widens_to_float() {
        let (interp, result) = run(vec![Stmt::decl(
            VarDecl::new(vec!["f"])
                .typed(TypeExpr::named("float"))
                .values(vec![Expr::int(3)]),
        )]);
        result.unwrap();
        assert!(matches!(interp.global("f"), Some(Value::Float(f)) if f == 3.0));
    }

    #[test]
    fn test_float_does_not_narrow_to_int() {
        let message = run_err(vec![Stmt::decl(
            VarDecl::new(vec!["n"]).typed(int_type()).values(vec![Expr::float(2.5)]),
        )]);
        assert_eq!(message, "cannot use 2.5 (type float) as type int in declaration");
    }

    #[test]
    fn test_assignment_keeps_existing_type() {
        let message = run_err(vec![
            Stmt::var("n", Expr::int(1)),
            Stmt::assign("n", Expr::string("x")),
        ]);
        assert_eq!(message, "cannot use x (type string) as type int in assignment");
    }

    #[test]
    fn test_nil_binding_keeps_nil_type() {
        let message = run_err(vec![
            Stmt::var("x", Expr::nil()),
            Stmt::assign("x", Expr::int(5)),
        ]);
        assert_eq!(message, "cannot use 5 (type int) as type nil in assignment");
    }

    #[test]
    fn test_declared_error_binding_accepts_errors() {
        // egg n int; egg e error; n, e = pair()
        let pair = FunctionDecl::new("pair")
            .returns(vec![int_type(), TypeExpr::named("error")])
            .body(vec![Stmt::ret(vec![
                Expr::int(1),
                Expr::call("error", vec![Expr::string("bad")]),
            ])]);
        let out = run_ok(vec![
            Stmt::func(pair),
            Stmt::decl(VarDecl::new(vec!["n"]).typed(int_type())),
            Stmt::decl(VarDecl::new(vec!["e"]).typed(TypeExpr::named("error"))),
            Stmt::multi_assign(vec!["n", "e"], vec![Expr::call("pair", vec![])]),
            println(vec![
                ident("n"),
                bin(BinaryOp::Eq, ident("e"), Expr::call("error", vec![Expr::string("bad")])),
            ]),
            Stmt::assign("e", Expr::nil()),
            println(vec![ident("e")]),
        ]);
        assert_eq!(out, "1 yes\nnil\n");
    }

    #[test]
    fn test_multi_assignment_swaps() {
        let out = run_ok(vec![
            Stmt::var("a", Expr::int(1)),
            Stmt::var("b", Expr::int(2)),
            Stmt::multi_assign(vec!["a", "b"], vec![ident("b"), ident("a")]),
            println(vec![ident("a"), ident("b")]),
        ]);
        assert_eq!(out, "2 1\n");
    }

    #[test]
    fn test_lifetime_expires_after_two_statements() {
        let message = run_err(vec![
            Stmt::decl(
                VarDecl::new(vec!["t"])
                    .values(vec![Expr::int(7)])
                    .lifetime(Expr::int(2)),
            ),
            println(vec![ident("t")]),
            println(vec![ident("t")]),
            println(vec![ident("t")]),
        ]);
        assert_eq!(message, "undefined variable: t");
    }

    #[test]
    fn test_lifetime_reads_within_window() {
        let out = run_ok(vec![
            Stmt::decl(
                VarDecl::new(vec!["t"])
                    .values(vec![Expr::int(7)])
                    .lifetime(Expr::int(2)),
            ),
            println(vec![ident("t")]),
            println(vec![ident("t")]),
        ]);
        assert_eq!(out, "7\n7\n");
    }

    #[test]
    fn test_const_cannot_be_reassigned() {
        let (_, result) = run(vec![
            Stmt::constant("c", Expr::int(1)),
            Stmt::assign("c", Expr::int(2)),
        ]);
        assert!(matches!(result.unwrap_err().kind, EvalErrorKind::Assign(_)));
    }

    #[test]
    fn test_redeclaration_in_same_frame_fails() {
        let (_, result) = run(vec![
            Stmt::var("x", Expr::int(1)),
            Stmt::var("x", Expr::int(2)),
        ]);
        let err = result.unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::Define(_)));
        assert_eq!(err.message, "x redeclared in this scope");
    }

    #[test]
    fn test_shadowing_in_child_frame_is_allowed() {
        let out = run_ok(vec![
            Stmt::var("x", Expr::int(1)),
            Stmt::if_else(
                Expr::bool(true),
                vec![Stmt::var("x", Expr::int(2)), println(vec![ident("x")])],
                None,
            ),
            println(vec![ident("x")]),
        ]);
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn test_const_array_is_deeply_frozen() {
        let message = run_err(vec![
            Stmt::constant("xs", Expr::array(vec![Expr::int(1)])),
            Stmt::index_assign(ident("xs"), Expr::int(0), Expr::int(9)),
        ]);
        assert_eq!(message, "cannot modify a constant");
    }
}

// =============================================================================
// Functions, returns, defers
// =============================================================================

mod functions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typed_return_mismatch_raises() {
        let bad = FunctionDecl::new("f")
            .returns(vec![int_type()])
            .body(vec![Stmt::ret(vec![Expr::string("x")])]);
        let message = run_err(vec![
            Stmt::func(bad),
            Stmt::var("r", Expr::call("f", vec![])),
        ]);
        assert_eq!(message, "cannot use x (type string) as type int in return from f");
    }

    #[test]
    fn test_parameter_type_is_checked() {
        let double = FunctionDecl::new("double")
            .param("n", Some(int_type()))
            .returns(vec![int_type()])
            .body(vec![Stmt::ret(vec![bin(BinaryOp::Mul, ident("n"), Expr::int(2))])]);
        let message = run_err(vec![
            Stmt::func(double),
            println(vec![Expr::call("double", vec![Expr::string("two")])]),
        ]);
        assert_eq!(
            message,
            "cannot use two (type string) as type int in argument to double"
        );
    }

    #[test]
    fn test_wrong_argument_count_is_hard_error() {
        let unit = FunctionDecl::new("unit").body(vec![]);
        let (_, result) = run(vec![
            Stmt::func(unit),
            Stmt::expr(Expr::call("unit", vec![Expr::int(1)])),
        ]);
        assert!(matches!(
            result.unwrap_err().kind,
            EvalErrorKind::ArityMismatch { .. }
        ));
    }

    #[test]
    fn test_error_return_slot_accepts_nil() {
        let check = FunctionDecl::new("check")
            .returns(vec![TypeExpr::named("error")])
            .body(vec![Stmt::ret(vec![Expr::nil()])]);
        let out = run_ok(vec![
            Stmt::func(check),
            println(vec![Expr::call("check", vec![])]),
        ]);
        assert_eq!(out, "nil\n");
    }

    #[test]
    fn test_defers_run_when_body_raises() {
        let failing = FunctionDecl::new("failing").body(vec![
            Stmt::defer(Expr::call("println", vec![Expr::string("cleanup")])),
            Stmt::expr(Expr::call("error", vec![Expr::string("boom")])),
        ]);
        let (interp, result) = run(vec![
            Stmt::func(failing),
            Stmt::expr(Expr::call("failing", vec![])),
        ]);
        assert_eq!(result.unwrap_err().message, "boom");
        assert_eq!(interp.print_handler().get_output(), "cleanup\n");
    }

    #[test]
    fn test_recursion_limit() {
        let mut interp = InterpreterBuilder::new()
            .print_handler(buffer_handler())
            .config(yolk_eval::EvalConfig::default().with_max_call_depth(Some(64)))
            .build();
        let down = FunctionDecl::new("down")
            .param("n", Some(int_type()))
            .body(vec![Stmt::expr(Expr::call(
                "down",
                vec![bin(BinaryOp::Add, ident("n"), Expr::int(1))],
            ))]);
        let result = interp.run(&Program::new(vec![
            Stmt::func(down),
            Stmt::expr(Expr::call("down", vec![Expr::int(0)])),
        ]));
        let err = result.unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::RecursionLimit { depth: 64 }));
    }
}

// =============================================================================
// Collections
// =============================================================================

mod collections {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_out_of_range() {
        let message = run_err(vec![
            Stmt::var(
                "arr",
                Expr::array(vec![Expr::int(1), Expr::int(2), Expr::int(3)]),
            ),
            println(vec![Expr::index(ident("arr"), Expr::int(5))]),
        ]);
        assert_eq!(message, "index out of range [5] with length 3");
    }

    #[test]
    fn test_mutation_persists_on_variable() {
        let out = run_ok(vec![
            Stmt::var("xs", Expr::array(vec![Expr::int(1), Expr::int(2)])),
            Stmt::expr(Expr::call("push", vec![ident("xs"), Expr::int(3)])),
            println(vec![ident("xs")]),
            Stmt::expr(Expr::call("pop", vec![ident("xs")])),
            Stmt::expr(Expr::call("insert", vec![ident("xs"), Expr::int(0), Expr::int(0)])),
            println(vec![ident("xs")]),
            Stmt::expr(Expr::call("remove", vec![ident("xs"), Expr::int(1)])),
            println(vec![ident("xs")]),
            Stmt::expr(Expr::call("clear", vec![ident("xs")])),
            println(vec![Expr::call("len", vec![ident("xs")])]),
        ]);
        assert_eq!(out, "[1, 2, 3]\n[0, 1, 2]\n[0, 2]\n0\n");
    }

    #[test]
    fn test_mutation_of_fresh_array_only_shows_in_result() {
        let out = run_ok(vec![
            Stmt::var("xs", Expr::array(vec![Expr::int(1)])),
            println(vec![Expr::call(
                "push",
                vec![Expr::array(vec![Expr::int(1)]), Expr::int(2)],
            )]),
            println(vec![ident("xs")]),
        ]);
        assert_eq!(out, "[1, 2]\n[1]\n");
    }

    #[test]
    fn test_arrays_share_between_bindings() {
        let out = run_ok(vec![
            Stmt::var("a", Expr::array(vec![Expr::int(1)])),
            Stmt::var("b", ident("a")),
            Stmt::index_assign(ident("b"), Expr::int(0), Expr::int(5)),
            println(vec![ident("a")]),
        ]);
        assert_eq!(out, "[5]\n");
    }

    #[test]
    fn test_map_literal_and_lookup() {
        let out = run_ok(vec![
            Stmt::var(
                "ages",
                Expr::map(vec![
                    (Expr::string("bo"), Expr::int(3)),
                    (Expr::string("al"), Expr::int(5)),
                ]),
            ),
            println(vec![Expr::index(ident("ages"), Expr::string("al"))]),
            println(vec![Expr::contains(Expr::string("bo"), ident("ages"))]),
            println(vec![ident("ages")]),
        ]);
        assert_eq!(out, "5\nyes\n{al: 5, bo: 3}\n");
    }

    #[test]
    fn test_range_over_array_and_int() {
        let out = run_ok(vec![
            Stmt::range_for(
                "i",
                Some("x"),
                Expr::array(vec![Expr::string("a"), Expr::string("b")]),
                vec![println(vec![ident("i"), ident("x")])],
            ),
            Stmt::range_for("n", None, Expr::int(3), vec![println(vec![ident("n")])]),
        ]);
        assert_eq!(out, "0 a\n1 b\n0\n1\n2\n");
    }

    #[test]
    fn test_array_cannot_hold_itself() {
        let message = run_err(vec![
            Stmt::var("a", Expr::array(vec![Expr::int(1), Expr::string("x")])),
            Stmt::index_assign(ident("a"), Expr::int(0), ident("a")),
            println(vec![ident("a")]),
        ]);
        assert_eq!(message, "cannot store a value inside itself");

        // Through another array.
        let message = run_err(vec![
            Stmt::var("a", Expr::array(vec![Expr::int(1), Expr::string("x")])),
            Stmt::var("b", Expr::array(vec![ident("a")])),
            Stmt::expr(Expr::call("push", vec![ident("a"), ident("b")])),
        ]);
        assert_eq!(message, "cannot store a value inside itself");
    }

    #[test]
    fn test_struct_field_cannot_hold_its_struct() {
        let message = run_err(vec![
            Stmt::type_decl(
                "Node",
                TypeExpr::structure(vec![("next", TypeExpr::named("thing"))]),
            ),
            Stmt::var("n", Expr::structure(Some("Node"), vec![("next", Expr::nil())])),
            Stmt::member_assign(ident("n"), "next", ident("n")),
        ]);
        assert_eq!(message, "cannot store a value inside itself");
    }

    #[test]
    fn test_widened_array_gets_its_own_cell() {
        // egg a = [1, 2]; egg b []thing = a; push(b, "s")
        let out = run_ok(vec![
            Stmt::var("a", Expr::array(vec![Expr::int(1), Expr::int(2)])),
            Stmt::decl(
                VarDecl::new(vec!["b"])
                    .typed(TypeExpr::array(TypeExpr::named("thing")))
                    .values(vec![ident("a")]),
            ),
            Stmt::expr(Expr::call("push", vec![ident("b"), Expr::string("s")])),
            println(vec![ident("a"), Expr::call("typeof", vec![ident("a")])]),
            println(vec![ident("b")]),
        ]);
        assert_eq!(out, "[1, 2] []int\n[1, 2, s]\n");
    }

    #[test]
    fn test_range_over_string_yields_code_points() {
        let out = run_ok(vec![Stmt::range_for(
            "i",
            Some("c"),
            Expr::string("héy"),
            vec![println(vec![ident("i"), ident("c"), Expr::call("len", vec![ident("c")])])],
        )]);
        assert_eq!(out, "0 h 1\n1 é 1\n2 y 1\n");
    }

    #[test]
    fn test_range_over_map_visits_every_entry() {
        let out = run_ok(vec![
            Stmt::var(
                "ages",
                Expr::map(vec![
                    (Expr::string("al"), Expr::int(5)),
                    (Expr::string("bo"), Expr::int(3)),
                    (Expr::string("cy"), Expr::int(9)),
                ]),
            ),
            Stmt::range_for(
                "name",
                Some("age"),
                ident("ages"),
                vec![println(vec![ident("name"), ident("age")])],
            ),
        ]);
        let mut lines: Vec<&str> = out.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["al 5", "bo 3", "cy 9"]);
    }

    #[test]
    fn test_range_over_int_rejects_second_variable() {
        let (_, result) = run(vec![Stmt::range_for(
            "i",
            Some("x"),
            Expr::int(3),
            vec![],
        )]);
        assert!(matches!(
            result.unwrap_err().kind,
            EvalErrorKind::InvalidRangeForm { .. }
        ));
    }
}

// =============================================================================
// Control flow
// =============================================================================

mod control_flow {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(x: i64) -> Expr {
        Expr::structure(Some("Point"), vec![("x", Expr::int(x))])
    }

    #[test]
    fn test_switch_runs_first_matching_case_only() {
        let out = run_ok(vec![
            Stmt::type_decl("Point", TypeExpr::structure(vec![("x", int_type())])),
            Stmt::switch(
                point(1),
                vec![
                    (vec![point(2)], vec![println(vec![Expr::string("two")])]),
                    (vec![point(1)], vec![println(vec![Expr::string("one")])]),
                    (vec![point(1)], vec![println(vec![Expr::string("again")])]),
                ],
                Some(vec![println(vec![Expr::string("default")])]),
            ),
        ]);
        assert_eq!(out, "one\n");
    }

    #[test]
    fn test_switch_default() {
        let out = run_ok(vec![Stmt::switch(
            Expr::int(9),
            vec![(vec![Expr::int(1), Expr::int(2)], vec![println(vec![Expr::string("small")])])],
            Some(vec![println(vec![Expr::string("other")])]),
        )]);
        assert_eq!(out, "other\n");
    }

    #[test]
    fn test_switch_case_must_be_comparable() {
        let message = run_err(vec![Stmt::switch(
            Expr::int(1),
            vec![(
                vec![Expr::array(vec![Expr::int(1)])],
                vec![println(vec![Expr::string("never")])],
            )],
            None,
        )]);
        assert!(message.starts_with("invalid case [1] in switch on 1"), "{message}");
    }

    #[test]
    fn test_for_loop_with_break_and_continue() {
        // for i = 0; i < 10; i = i + 1 { if i == 1 { continue }; if i == 3 { break }; println(i) }
        let out = run_ok(vec![Stmt::for_loop(
            Some(Stmt::var("i", Expr::int(0))),
            Some(bin(BinaryOp::Lt, ident("i"), Expr::int(10))),
            Some(Stmt::assign("i", bin(BinaryOp::Add, ident("i"), Expr::int(1)))),
            vec![
                Stmt::if_else(
                    bin(BinaryOp::Eq, ident("i"), Expr::int(1)),
                    vec![Stmt::cont()],
                    None,
                ),
                Stmt::if_else(
                    bin(BinaryOp::Eq, ident("i"), Expr::int(3)),
                    vec![Stmt::brk()],
                    None,
                ),
                println(vec![ident("i")]),
            ],
        )]);
        assert_eq!(out, "0\n2\n");
    }

    #[test]
    fn test_non_bool_condition_is_hard_error() {
        let (_, result) = run(vec![Stmt::while_loop(Expr::int(1), vec![])]);
        assert!(matches!(
            result.unwrap_err().kind,
            EvalErrorKind::NonBoolCondition { .. }
        ));
    }
}

// =============================================================================
// Types: casts, enums, named types, assertions
// =============================================================================

mod types {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_casts() {
        let out = run_ok(vec![
            println(vec![Expr::call("int", vec![Expr::float(3.9)])]),
            println(vec![Expr::call("float", vec![Expr::string("2.5")])]),
            println(vec![Expr::call("string", vec![Expr::int(7)])]),
            println(vec![Expr::call("bool", vec![Expr::int(0)])]),
        ]);
        assert_eq!(out, "3\n2.5\n7\nno\n");
    }

    #[test]
    fn test_enum_variants() {
        let out = run_ok(vec![
            Stmt::enum_decl("Color", vec!["Red", "Green"]),
            Stmt::var("c", Expr::member(ident("Color"), "Green")),
            println(vec![ident("c")]),
            println(vec![Expr::call("Color", vec![Expr::int(0)])]),
            println(vec![bin(
                BinaryOp::Eq,
                ident("c"),
                Expr::call("Color", vec![Expr::int(1)]),
            )]),
        ]);
        assert_eq!(out, "Color.Green\nColor.Red\nyes\n");
    }

    #[test]
    fn test_named_types_do_not_mix() {
        let message = run_err(vec![
            Stmt::type_decl("Meters", TypeExpr::named("float")),
            Stmt::type_decl("Feet", TypeExpr::named("float")),
            println(vec![bin(
                BinaryOp::Add,
                Expr::call("Meters", vec![Expr::int(1)]),
                Expr::call("Feet", vec![Expr::int(1)]),
            )]),
        ]);
        assert!(message.contains("Meters"), "unexpected message: {message}");
    }

    #[test]
    fn test_named_arithmetic_rewraps() {
        let out = run_ok(vec![
            Stmt::type_decl("Meters", TypeExpr::named("float")),
            Stmt::var(
                "d",
                bin(
                    BinaryOp::Add,
                    Expr::call("Meters", vec![Expr::int(1)]),
                    Expr::call("Meters", vec![Expr::float(0.5)]),
                ),
            ),
            println(vec![Expr::call("typeof", vec![ident("d")]), ident("d")]),
        ]);
        assert_eq!(out, "Meters 1.5\n");
    }

    #[test]
    fn test_type_assertion() {
        let out = run_ok(vec![
            Stmt::decl(
                VarDecl::new(vec!["t"])
                    .typed(TypeExpr::named("thing"))
                    .values(vec![Expr::int(5)]),
            ),
            println(vec![bin(
                BinaryOp::Add,
                Expr::type_assert(ident("t"), int_type()),
                Expr::int(1),
            )]),
        ]);
        assert_eq!(out, "6\n");
    }

    #[test]
    fn test_failed_type_assertion_raises() {
        let message = run_err(vec![
            Stmt::decl(
                VarDecl::new(vec!["t"])
                    .typed(TypeExpr::named("thing"))
                    .values(vec![Expr::int(5)]),
            ),
            println(vec![Expr::type_assert(ident("t"), TypeExpr::named("string"))]),
        ]);
        assert_eq!(message, "type assertion failed: thing holds int, not string");
    }

    #[test]
    fn test_struct_member_assignment() {
        let out = run_ok(vec![
            Stmt::type_decl("Box", TypeExpr::structure(vec![("w", int_type())])),
            Stmt::var("b", Expr::structure(Some("Box"), Vec::<(&str, Expr)>::new())),
            Stmt::member_assign(ident("b"), "w", Expr::int(4)),
            println(vec![ident("b")]),
        ]);
        assert_eq!(out, "Box{w: 4}\n");
    }
}

// =============================================================================
// Input and concurrency
// =============================================================================

mod tasks {
    use super::*;
    use pretty_assertions::assert_eq;

    const N: i64 = 200;

    fn increment_loop() -> Stmt {
        Stmt::spawn(vec![Stmt::for_loop(
            Some(Stmt::var("i", Expr::int(0))),
            Some(bin(BinaryOp::Lt, ident("i"), Expr::int(N))),
            Some(Stmt::assign("i", bin(BinaryOp::Add, ident("i"), Expr::int(1)))),
            vec![Stmt::assign(
                "counter",
                bin(BinaryOp::Add, ident("counter"), Expr::int(1)),
            )],
        )])
    }

    #[test]
    fn test_spawned_tasks_share_bindings() {
        let (interp, result) = run(vec![
            Stmt::var("counter", Expr::int(0)),
            increment_loop(),
            increment_loop(),
        ]);
        result.unwrap();
        interp.wait_for_tasks();
        let Some(Value::Int(count)) = interp.global("counter") else {
            panic!("counter must stay an int");
        };
        // Updates may be lost, never invented.
        assert!((N..=2 * N).contains(&count), "count out of range: {count}");
    }

    #[test]
    fn test_failing_task_is_contained() {
        let out = run_ok(vec![
            Stmt::spawn(vec![Stmt::var("x", ident("missing"))]),
            println(vec![Expr::string("after")]),
        ]);
        assert!(out.contains("after"));
    }

    #[test]
    fn test_input_is_converted() {
        let out = run_ok(vec![
            Stmt::var("n", Expr::call("int", vec![Expr::call("input", vec![])])),
            println(vec![bin(BinaryOp::Add, ident("n"), Expr::int(1))]),
        ]);
        assert_eq!(out, "43\n");
    }
}
