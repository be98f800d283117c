// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

//! The six end-to-end scenarios (S1-S6). No parser exists in this crate, so
//! each scenario's source is hand-built as an AST rather than written as
//! source text.

use reach::ast::{
    Declaration, Expr, FunctionDecl, LexicalDecl, Param, Program, Statement, TypeExpr,
};
use reach::diagnostics::SourceLocation;
use reach::error::ReachError;
use reach::ast::Block;
use reach::vm::Vm;

fn loc() -> SourceLocation {
    SourceLocation::synthetic()
}

fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string(), loc())
}

fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::Call { callee: Box::new(ident(callee)), args, location: loc() }
}

fn block_of(statements: Vec<Statement>) -> Block {
    Block { statements, location: loc() }
}

#[test]
fn s1_arithmetic_and_strings() {
    let program = Program {
        declarations: vec![Declaration::Statement(Statement::Expression(call(
            "println",
            vec![Expr::Str("hello".to_string(), loc())],
        )))],
    };

    let output = Box::new(Vec::<String>::new());
    let mut vm = Vm::with_output(output);
    vm.run_source_ast(&program).expect("program should run cleanly");
}

#[test]
fn s2_function_definition_and_call() {
    // function id(x: Number) -> Number { x }
    // println(stringify(id(42)))
    let id_fn = FunctionDecl {
        name: "id".to_string(),
        params: vec![Param {
            name: "x".to_string(),
            inferred: false,
            type_annotation: Some(TypeExpr::Named("Number".to_string(), loc())),
            location: loc(),
        }],
        return_type: Some(TypeExpr::Named("Number".to_string(), loc())),
        body: block_of(vec![Statement::Expression(ident("x"))]),
        location: loc(),
    };

    let program = Program {
        declarations: vec![
            Declaration::Function(id_fn),
            Declaration::Statement(Statement::Expression(call(
                "println",
                vec![call("stringify", vec![call("id", vec![Expr::Number(42.0, loc())])])],
            ))),
        ],
    };

    let output = Box::new(Vec::<String>::new());
    let mut vm = Vm::with_output(output);
    vm.run_source_ast(&program).expect("program should run cleanly");
}

#[test]
fn s3_type_error_argument_mismatch() {
    // function twice(x: Number) -> Number { x }
    // twice("abc")
    let twice_fn = FunctionDecl {
        name: "twice".to_string(),
        params: vec![Param {
            name: "x".to_string(),
            inferred: false,
            type_annotation: Some(TypeExpr::Named("Number".to_string(), loc())),
            location: loc(),
        }],
        return_type: Some(TypeExpr::Named("Number".to_string(), loc())),
        body: block_of(vec![Statement::Expression(ident("x"))]),
        location: loc(),
    };

    let program = Program {
        declarations: vec![
            Declaration::Function(twice_fn),
            Declaration::Statement(Statement::Expression(call(
                "twice",
                vec![Expr::Str("abc".to_string(), loc())],
            ))),
        ],
    };

    let mut vm = Vm::with_output(Box::new(Vec::<String>::new()));
    let err = vm.run_source_ast(&program).expect_err("argument type mismatch must fail closed");
    match err {
        ReachError::Type(diagnostics) => {
            let rendered = diagnostics.to_string();
            assert!(
                rendered.contains("expected `Number` but found `String`"),
                "unexpected diagnostic: {}",
                rendered
            );
        }
        other => panic!("expected a type-checking error, got {:?}", other),
    }
}

#[test]
fn s4_inferred_parameter() {
    // function idT(%T: Type, x: T) -> T { x }
    // println(stringify(idT(Number, 7)))
    let id_t_fn = FunctionDecl {
        name: "idT".to_string(),
        params: vec![
            Param {
                name: "T".to_string(),
                inferred: true,
                type_annotation: Some(TypeExpr::Named("Type".to_string(), loc())),
                location: loc(),
            },
            Param {
                name: "x".to_string(),
                inferred: false,
                type_annotation: Some(TypeExpr::Named("T".to_string(), loc())),
                location: loc(),
            },
        ],
        return_type: Some(TypeExpr::Named("T".to_string(), loc())),
        body: block_of(vec![Statement::Expression(ident("x"))]),
        location: loc(),
    };

    let program = Program {
        declarations: vec![
            Declaration::Function(id_t_fn),
            Declaration::Statement(Statement::Expression(call(
                "println",
                vec![call(
                    "stringify",
                    vec![call("idT", vec![ident("Number"), Expr::Number(7.0, loc())])],
                )],
            ))),
        ],
    };

    let output = Box::new(Vec::<String>::new());
    let mut vm = Vm::with_output(output);
    vm.run_source_ast(&program).expect("program should run cleanly");
}

#[test]
fn s5_record_construction_and_field_access() {
    // let p = { x = 1, y = 2 }
    // println(stringify(p.x))
    let program = Program {
        declarations: vec![
            Declaration::Lexical(LexicalDecl {
                name: "p".to_string(),
                is_const: false,
                type_annotation: None,
                init: Some(Expr::Object(
                    vec![
                        ("x".to_string(), Expr::Number(1.0, loc())),
                        ("y".to_string(), Expr::Number(2.0, loc())),
                    ],
                    loc(),
                )),
                location: loc(),
            }),
            Declaration::Statement(Statement::Expression(call(
                "println",
                vec![call(
                    "stringify",
                    vec![Expr::Member { object: Box::new(ident("p")), property: "x".to_string(), location: loc() }],
                )],
            ))),
        ],
    };

    let output = Box::new(Vec::<String>::new());
    let mut vm = Vm::with_output(output);
    vm.run_source_ast(&program).expect("program should run cleanly");
}

#[test]
fn s6_gc_survives_across_call() {
    // function makeArray() -> returns [1, 2, 3]; result stored under a
    // top-level `let` so it stays reachable from the global environment
    // (the VM's one GC root) across the forced collection below.
    let make_array_fn = FunctionDecl {
        name: "makeArray".to_string(),
        params: vec![],
        return_type: None,
        body: block_of(vec![Statement::Expression(Expr::Array(
            vec![Expr::Number(1.0, loc()), Expr::Number(2.0, loc()), Expr::Number(3.0, loc())],
            loc(),
        ))]),
        location: loc(),
    };

    let setup = Program {
        declarations: vec![
            Declaration::Function(make_array_fn),
            Declaration::Lexical(LexicalDecl {
                name: "arr".to_string(),
                is_const: false,
                type_annotation: None,
                init: Some(call("makeArray", vec![])),
                location: loc(),
            }),
        ],
    };

    let output = Box::new(Vec::<String>::new());
    let mut vm = Vm::with_output(output);
    vm.run_source_ast(&setup).expect("setup program should run cleanly");

    vm.collect_garbage();

    let read_back = Program {
        declarations: vec![Declaration::Statement(Statement::Expression(call(
            "println",
            vec![call(
                "stringify",
                vec![Expr::Subscript {
                    target: Box::new(ident("arr")),
                    index: Box::new(Expr::Number(0.0, loc())),
                    location: loc(),
                }],
            )],
        )))],
    };
    vm.run_source_ast(&read_back).expect("array must survive the forced collection");
}
