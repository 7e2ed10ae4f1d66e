use pretty_assertions::assert_eq;

use finch::error::Diagnostics;
use finch::treewalk::expr::print_ast;
use finch::treewalk::parse_source;
use finch::treewalk::stmt::{print_program, Stmt};

fn parse(code: &str) -> (Vec<Stmt>, Vec<String>) {
    let mut diagnostics = Diagnostics::new();
    let statements = parse_source(code, &mut diagnostics);
    let errors = diagnostics.errors().iter().map(|error| error.to_string()).collect();
    (statements, errors)
}

// parse a single expression statement and print its tree
fn expression_tree(code: &str) -> String {
    let (statements, errors) = parse(code);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    match statements.as_slice() {
        [Stmt::Expression { expression }] => print_ast(expression),
        other => panic!("expected one expression statement, got {other:?}"),
    }
}

fn program_tree(code: &str) -> String {
    let (statements, errors) = parse(code);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    print_program(&statements)
}

#[test]
fn binary_precedence() {
    assert_eq!("(+ 1 (* 2 3))", expression_tree("1 + 2 * 3;"));
    assert_eq!("(* (group (+ 1 2)) 3)", expression_tree("(1 + 2) * 3;"));
    assert_eq!("(== (< 1 2) true)", expression_tree("1 < 2 == true;"));
    assert_eq!("(!= (>= a b) (<= c d))", expression_tree("a >= b != c <= d;"));
}

#[test]
fn binary_operators_are_left_associative() {
    assert_eq!("(- (- 1 2) 3)", expression_tree("1 - 2 - 3;"));
    assert_eq!("(/ (/ 8 4) 2)", expression_tree("8 / 4 / 2;"));
}

#[test]
fn unary_operators() {
    assert_eq!("(- (- 1) (- 2))", expression_tree("-1 - -2;"));
    assert_eq!("(== (! true) false)", expression_tree("!true == false;"));
    assert_eq!("(! (! a))", expression_tree("!!a;"));
}

#[test]
fn logical_precedence() {
    assert_eq!("(or a (and b c))", expression_tree("a or b and c;"));
    assert_eq!("(and (== a 1) (== b 2))", expression_tree("a == 1 and b == 2;"));
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!("(= a (= b c))", expression_tree("a = b = c;"));
    assert_eq!("(= a (or b c))", expression_tree("a = b or c;"));
}

#[test]
fn calls_chain() {
    assert_eq!("(call (call f 1 2) 3)", expression_tree("f(1, 2)(3);"));
    assert_eq!("(call g)", expression_tree("g();"));
    assert_eq!("(- (call f))", expression_tree("-f();"));
}

#[test]
fn literals() {
    assert_eq!("(+ \"text\" nil)", expression_tree("\"text\" + nil;"));
    assert_eq!("(== 2.5 false)", expression_tree("2.5 == false;"));
}

#[test]
fn declarations() {
    assert_eq!(
        "(var a)\n(var b (+ 1 2))\n(fun add (x y) (return (+ x y)))\n(fun nothing ())",
        program_tree("var a;\nvar b = 1 + 2;\nfun add(x, y) { return x + y; }\nfun nothing() {}")
    );
}

#[test]
fn statements() {
    assert_eq!(
        "(print 1)\n(block (var x 2) (print x))\n(while (< i 3) (; (= i (+ i 1))))\n(return)",
        program_tree("print 1;\n{ var x = 2; print x; }\nwhile (i < 3) i = i + 1;\nreturn;")
    );
}

#[test]
fn else_binds_to_nearest_if() {
    assert_eq!(
        "(if a (if b (print 1) (print 2)))",
        program_tree("if (a) if (b) print 1; else print 2;")
    );
}

#[test]
fn for_loop_becomes_while_loop() {
    assert_eq!(
        "(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))",
        program_tree("for (var i = 0; i < 3; i = i + 1) print i;")
    );
}

#[test]
fn for_loop_clauses_are_optional() {
    assert_eq!("(while true (print 1))", program_tree("for (;;) print 1;"));
    assert_eq!(
        "(block (; (= i 0)) (while (< i 1) (print i)))",
        program_tree("for (i = 0; i < 1;) print i;")
    );
}

#[test]
fn invalid_assignment_target() {
    let (statements, errors) = parse("a + b = c;");
    assert_eq!(vec!["[Line 1] Error at '=': Invalid assignment target.".to_string()], errors);
    // reported without discarding the statement
    assert_eq!(1, statements.len());
}

#[test]
fn error_at_end_of_input() {
    let (statements, errors) = parse("print 1");
    assert_eq!(vec!["[Line 1] Error at end: Expect ';' after value.".to_string()], errors);
    assert!(statements.is_empty());
}

#[test]
fn recovers_to_report_multiple_errors() {
    let (statements, errors) = parse("var = 1;\nprint 2;\nvar x = ;\nprint 3;\nprint (4;");
    assert_eq!(
        vec![
            "[Line 1] Error at '=': Expect variable name.".to_string(),
            "[Line 3] Error at ';': Expect expression.".to_string(),
            "[Line 5] Error at ';': Expect ')' after expression.".to_string(),
        ],
        errors
    );
    assert_eq!("(print 2)\n(print 3)", print_program(&statements));
}

#[test]
fn recovers_inside_blocks() {
    let (statements, errors) = parse("{\nprint ;\nprint 1;\n}\nprint 2;");
    assert_eq!(vec!["[Line 2] Error at ';': Expect expression.".to_string()], errors);
    assert_eq!("(block (print 1))\n(print 2)", print_program(&statements));
}

#[test]
fn unclosed_block() {
    let (_, errors) = parse("{ print 1;");
    assert_eq!(vec!["[Line 1] Error at end: Expect '}' after block.".to_string()], errors);
}

#[test]
fn scan_and_parse_errors_are_both_reported() {
    let (_, errors) = parse("var a = @;");
    assert_eq!(
        vec![
            "[Line 1] Error : Unexpected character.".to_string(),
            "[Line 1] Error at ';': Expect expression.".to_string(),
        ],
        errors
    );
}

#[test]
fn too_many_arguments() {
    let arguments: Vec<String> = (0..256).map(|index| index.to_string()).collect();
    let code = format!("f({});", arguments.join(", "));

    let (statements, errors) = parse(&code);
    assert_eq!(vec!["[Line 1] Error at '255': Can't have more than 255 arguments.".to_string()], errors);
    assert_eq!(1, statements.len());
}

#[test]
fn too_many_parameters() {
    let params: Vec<String> = (0..256).map(|index| format!("p{index}")).collect();
    let code = format!("fun f({}) {{}}\nprint 1;", params.join(", "));

    let (statements, errors) = parse(&code);
    assert_eq!(vec!["[Line 1] Error at 'p255': Can't have more than 255 parameters.".to_string()], errors);
    assert_eq!(2, statements.len());
}

#[test]
fn exactly_255_arguments_is_fine() {
    let arguments: Vec<String> = (0..255).map(|index| index.to_string()).collect();
    let (_, errors) = parse(&format!("f({});", arguments.join(", ")));
    assert!(errors.is_empty());
}
