use super::Generator;
use crate::ast::Class;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::stdlib::Stdlib;
use crate::sym::GlobalIndex;

fn parse(source: &str) -> Class {
    let (tokens, diags) = Lexer::new(source, 0).tokenize();
    assert!(diags.is_empty(), "lex errors: {:?}", diags);
    Parser::new(tokens).parse_class().expect("parse").0
}

/// Compile the first source against the whole set; return its IR as text.
fn compile_set(sources: &[&str]) -> Vec<String> {
    let classes: Vec<Class> = sources.iter().map(|s| parse(s)).collect();
    let mut globals = GlobalIndex::new();
    for class in &classes {
        globals.add_class(class);
    }
    let stdlib = Stdlib::builtin();
    match Generator::generate(&classes[0], &globals, &stdlib) {
        Ok(ops) => ops.iter().map(|op| op.to_string()).collect(),
        Err(diags) => panic!("codegen errors: {:?}", diags),
    }
}

fn compile(source: &str) -> Vec<String> {
    compile_set(&[source])
}

fn compile_err(source: &str) -> Vec<Diagnostic> {
    let class = parse(source);
    let mut globals = GlobalIndex::new();
    globals.add_class(&class);
    let stdlib = Stdlib::builtin();
    match Generator::generate(&class, &globals, &stdlib) {
        Ok(_) => vec![],
        Err(diags) => diags,
    }
}

// --- End-to-end scenarios ---

#[test]
fn test_function_returning_sum() {
    let ir = compile("class A { function int f() { return 1 + 2; } }");
    assert_eq!(
        ir,
        vec![
            "function A.f 0",
            "push constant 1",
            "push constant 2",
            "add",
            "return",
        ]
    );
}

#[test]
fn test_constructor_preamble_and_this() {
    let ir = compile(
        "class A { field int x; constructor A new() { let x = 5; return this; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.new 0",
            "push constant 1",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push constant 5",
            "pop this 0",
            "push pointer 0",
            "return",
        ]
    );
}

#[test]
fn test_method_preamble_and_void_do() {
    let ir = compile(
        "class A { field int x; method void m() { do Output.printInt(x); return; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.m 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "call Output.printInt 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_if_else_label_pattern() {
    let ir = compile(
        "class A { function void f(int x) { var int y; \
           if (x < 0) { let y = 1; } else { let y = 2; } return; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.f 1",
            "push argument 0",
            "push constant 0",
            "lt",
            "not",
            "if-goto f:ifStatement:0:EXECUTE_SECOND_STATEMENT",
            "push constant 1",
            "pop local 0",
            "goto f:ifStatement:0:END",
            "label f:ifStatement:0:EXECUTE_SECOND_STATEMENT",
            "push constant 2",
            "pop local 0",
            "label f:ifStatement:0:END",
            "push constant 0",
            "return",
        ]
    );
}

// --- Statements ---

#[test]
fn test_if_without_else() {
    let ir = compile(
        "class A { function void f(int x) { if (x) { do Sys.halt(); } return; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.f 0",
            "push argument 0",
            "not",
            "if-goto f:ifStatement:0:END",
            "call Sys.halt 0",
            "pop temp 0",
            "label f:ifStatement:0:END",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_while_label_pattern() {
    let ir = compile(
        "class A { function void f(int n) { while (n > 0) { let n = n - 1; } return; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.f 0",
            "label f:whileStatement:0:START",
            "push argument 0",
            "push constant 0",
            "gt",
            "not",
            "if-goto f:whileStatement:0:END",
            "push argument 0",
            "push constant 1",
            "sub",
            "pop argument 0",
            "goto f:whileStatement:0:START",
            "label f:whileStatement:0:END",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_nested_statement_labels_are_unique() {
    let ir = compile(
        "class A { function void f(int x) { \
           while (x) { if (x) { let x = 0; } } \
           if (x) { let x = 1; } \
           return; } }",
    );
    let labels: Vec<&String> = ir
        .iter()
        .filter(|line| line.starts_with("label "))
        .collect();
    let mut deduped = labels.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(labels.len(), deduped.len(), "labels collide: {:?}", labels);
    // The nested if must not reuse the enclosing while's counter.
    assert!(ir.contains(&"label f:whileStatement:0:END".to_string()));
    assert!(ir.contains(&"label f:ifStatement:1:END".to_string()));
    assert!(ir.contains(&"label f:ifStatement:2:END".to_string()));
}

#[test]
fn test_array_store_uses_temp_handoff() {
    let ir = compile(
        "class A { function void f(Array a, int i, int j) { let a[i] = a[j]; return; } }",
    );
    assert_eq!(
        ir,
        vec![
            "function A.f 0",
            // address of a[i]
            "push argument 0",
            "push argument 1",
            "add",
            // value of a[j] — uses pointer 1 itself, which is why the
            // store must set pointer 1 only afterwards
            "push argument 0",
            "push argument 2",
            "add",
            "pop pointer 1",
            "push that 0",
            // hand-off through temp 0
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_void_return_pushes_zero() {
    let ir = compile("class A { method void m() { return; } }");
    assert_eq!(ir[ir.len() - 2], "push constant 0");
    assert_eq!(ir[ir.len() - 1], "return");
}

#[test]
fn test_do_with_non_void_callee_leaves_result() {
    let ir = compile("class A { function void f(int x) { do Math.abs(x); return; } }");
    assert!(ir.contains(&"call Math.abs 1".to_string()));
    assert!(
        !ir.contains(&"pop temp 0".to_string()),
        "non-void result must stay on the stack: {:?}",
        ir
    );
}

// --- Terms ---

#[test]
fn test_keyword_constants() {
    let ir = compile(
        "class A { function int f() { var boolean b; let b = true; let b = false; \
           let b = null; return 0; } }",
    );
    assert_eq!(
        &ir[1..9],
        &[
            "push constant 1",
            "neg",
            "pop local 0",
            "push constant 0",
            "pop local 0",
            "push constant 0",
            "pop local 0",
            "push constant 0",
        ]
    );
}

#[test]
fn test_string_constant_builds_object() {
    let ir = compile("class A { function void f() { do Output.printString(\"Hi\"); return; } }");
    assert_eq!(
        &ir[1..8],
        &[
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
        ]
    );
}

#[test]
fn test_array_read() {
    let ir = compile("class A { function int f(Array a, int i) { return a[i]; } }");
    assert_eq!(
        &ir[1..6],
        &[
            "push argument 0",
            "push argument 1",
            "add",
            "pop pointer 1",
            "push that 0",
        ]
    );
}

#[test]
fn test_unary_operators() {
    let ir = compile("class A { function int f(int x) { return -x + ~x; } }");
    assert_eq!(
        &ir[1..7],
        &[
            "push argument 0",
            "neg",
            "push argument 0",
            "not",
            "add",
            "return",
        ]
    );
}

#[test]
fn test_left_to_right_no_precedence() {
    // 2 + 3 * 4 evaluates as (2 + 3) * 4: T0 T1 op0 T2 op1.
    let ir = compile("class A { function int f() { return 2 + 3 * 4; } }");
    assert_eq!(
        &ir[1..7],
        &[
            "push constant 2",
            "push constant 3",
            "push constant 4",
            "add",
            "call Math.multiply 2",
            "return",
        ]
    );
}

#[test]
fn test_parentheses_group_first() {
    let ir = compile("class A { function int f() { return 2 + (3 * 4); } }");
    assert_eq!(
        &ir[1..7],
        &[
            "push constant 2",
            "push constant 3",
            "push constant 4",
            "call Math.multiply 2",
            "add",
            "return",
        ]
    );
}

#[test]
fn test_division_is_library_call() {
    let ir = compile("class A { function int f(int x) { return x / 2; } }");
    assert!(ir.contains(&"call Math.divide 2".to_string()));
}

// --- Call shapes ---

#[test]
fn test_bare_call_is_method_on_this() {
    let ir = compile(
        "class A { method void draw() { return; } \
           method void run() { do draw(); return; } }",
    );
    let run_at = ir
        .iter()
        .position(|l| l == "function A.run 0")
        .expect("run");
    assert_eq!(ir[run_at + 3], "push pointer 0");
    assert_eq!(ir[run_at + 4], "call A.draw 1");
}

#[test]
fn test_qualified_call_in_current_class() {
    let ir = compile(
        "class A { function int helper() { return 1; } \
           function int f() { return A.helper(); } }",
    );
    assert!(ir.contains(&"call A.helper 0".to_string()));
    // No receiver pushed for a function call.
    let f_at = ir.iter().position(|l| l == "function A.f 0").unwrap();
    assert_eq!(ir[f_at + 1], "call A.helper 0");
}

#[test]
fn test_method_call_through_variable() {
    let ir = compile_set(&[
        "class A { field Counter c; method void f() { do c.increment(3); return; } }",
        "class Counter { field int n; method void increment(int by) { let n = n + by; return; } }",
    ]);
    assert_eq!(
        &ir[3..7],
        &[
            "push this 0",
            "push constant 3",
            "call Counter.increment 2",
            "pop temp 0",
        ]
    );
}

#[test]
fn test_cross_file_function_call() {
    let ir = compile_set(&[
        "class Main { function void main() { do Helper.greet(); return; } }",
        "class Helper { function void greet() { return; } }",
    ]);
    assert!(ir.contains(&"call Helper.greet 0".to_string()));
    assert!(ir.contains(&"pop temp 0".to_string()));
}

#[test]
fn test_local_variable_shadows_field() {
    let ir = compile(
        "class A { field int x; method int f() { var int x; let x = 1; return x; } }",
    );
    assert!(ir.contains(&"pop local 0".to_string()));
    assert!(ir.contains(&"push local 0".to_string()));
    assert!(!ir.contains(&"pop this 0".to_string()));
}

#[test]
fn test_method_parameters_start_after_this() {
    // Argument 0 is the implicit receiver; declared parameters follow it.
    let ir = compile("class A { field int x; method int plus(int d) { return x + d; } }");
    assert_eq!(
        ir,
        vec![
            "function A.plus 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "push argument 1",
            "add",
            "return",
        ]
    );
}

#[test]
fn test_locals_count_matches_var_entries() {
    let ir = compile(
        "class A { function void f() { var int a, b; var boolean c; return; } }",
    );
    assert_eq!(ir[0], "function A.f 3");
}

#[test]
fn test_constructor_counts_only_fields() {
    let ir = compile(
        "class A { static int total; field int x, y; \
           constructor A new() { return this; } }",
    );
    assert_eq!(ir[1], "push constant 2");
    assert_eq!(ir[2], "call Memory.alloc 1");
}

#[test]
fn test_static_variable_segment() {
    let ir = compile(
        "class A { static int total; function void f() { let total = 1; return; } }",
    );
    assert!(ir.contains(&"pop static 0".to_string()));
}

// --- Error paths ---

#[test]
fn test_error_unknown_identifier() {
    let diags = compile_err("class A { function int f() { return ghost; } }");
    assert!(!diags.is_empty());
    assert!(
        diags[0].message.contains("unknown identifier 'ghost'"),
        "got: {}",
        diags[0].message
    );
}

#[test]
fn test_error_unknown_class() {
    let diags = compile_err("class A { function void f() { do Nowhere.run(); return; } }");
    assert!(!diags.is_empty());
    assert!(
        diags[0].message.contains("unknown class 'Nowhere'"),
        "got: {}",
        diags[0].message
    );
}

#[test]
fn test_error_unknown_subroutine_in_known_class() {
    let diags = compile_err("class A { function void f() { do Math.modulo(1); return; } }");
    assert!(!diags.is_empty());
    assert!(
        diags[0]
            .message
            .contains("class 'Math' has no subroutine 'modulo'"),
        "got: {}",
        diags[0].message
    );
}

#[test]
fn test_error_missing_return_value() {
    let diags = compile_err("class A { function int f() { return; } }");
    assert!(!diags.is_empty());
    assert!(
        diags[0].message.contains("has no value"),
        "got: {}",
        diags[0].message
    );
}

#[test]
fn test_error_duplicate_class_variable() {
    let diags = compile_err("class A { field int x; field boolean x; }");
    assert!(!diags.is_empty());
    assert!(diags[0].message.contains("duplicate declaration of 'x'"));
}

#[test]
fn test_error_duplicate_local() {
    let diags =
        compile_err("class A { function void f(int a) { var int a; return; } }");
    assert!(!diags.is_empty());
    assert!(diags[0].message.contains("duplicate declaration of 'a'"));
}
