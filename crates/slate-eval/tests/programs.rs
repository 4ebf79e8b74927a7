//! Whole-program evaluation tests: lex, parse, then walk.

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::rc::Rc;

use slate_eval::{Evaluator, RuntimeError, Value};
use slate_lex::tokenize;
use slate_par::parse;

/// A `Write` sink that can be read back after the evaluator is done
/// with its boxed copy.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output was not UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_with_input(source: &str, input: &str) -> (Result<Value, RuntimeError>, String) {
    let buffer = SharedBuffer::default();
    let mut evaluator = Evaluator::with_io(
        Box::new(buffer.clone()),
        Box::new(Cursor::new(input.as_bytes().to_vec())),
    );
    let program = parse(tokenize(source).expect("lexing failed")).expect("parsing failed");
    let result = evaluator.eval_program(&program);
    (result, buffer.contents())
}

fn run(source: &str) -> Result<Value, RuntimeError> {
    run_with_input(source, "").0
}

fn output_of(source: &str) -> String {
    let (result, output) = run_with_input(source, "");
    result.expect("program failed");
    output
}

fn error_of(source: &str) -> RuntimeError {
    run(source).expect_err("program unexpectedly succeeded")
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_precedence_scenario() {
    assert_eq!(output_of("x = 2 + 3 * 4\nprint(x)\n"), "14\n");
}

#[test]
fn test_array_scenario() {
    assert_eq!(
        output_of("array a[3] = [1, 2, 3]\na[1] = 9\nprint(a[1])\n"),
        "9\n"
    );
}

#[test]
fn test_function_scenario() {
    assert_eq!(
        output_of("function sq(n)\nreturn n * n\nendfunction\nprint(sq(7))\n"),
        "49\n"
    );
}

#[test]
fn test_for_scenario() {
    assert_eq!(output_of("for i = 0 to 3\nprint(i)\nnext i\n"), "0\n1\n2\n");
}

#[test]
fn test_string_scenario() {
    assert_eq!(
        output_of("s = \"hello\"\nprint(s.upper())\nprint(s.length)\n"),
        "HELLO\n5\n"
    );
}

#[test]
fn test_if_scenario() {
    assert_eq!(
        output_of("if 1 < 2 then\nprint(\"a\")\nelse\nprint(\"b\")\nendif\n"),
        "a\n"
    );
}

// =============================================================================
// Arithmetic and comparison
// =============================================================================

#[test]
fn test_division_always_floats() {
    assert_eq!(output_of("print(7 / 2)\n"), "3.5\n");
    assert_eq!(output_of("print(4 / 2)\n"), "2\n");
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(error_of("print(1 / 0)\n"), RuntimeError::Value { .. }));
    assert!(matches!(error_of("print(1 MOD 0)\n"), RuntimeError::Value { .. }));
    assert!(matches!(error_of("print(1 DIV 0)\n"), RuntimeError::Value { .. }));
}

#[test]
fn test_mod_and_div_floor_semantics() {
    assert_eq!(output_of("print(10 MOD 3)\n"), "1\n");
    assert_eq!(output_of("print(10 DIV 3)\n"), "3\n");
    assert_eq!(output_of("print((0 - 7) MOD 3)\n"), "2\n");
    assert_eq!(output_of("print((0 - 7) DIV 3)\n"), "-3\n");
}

#[test]
fn test_int_float_mixing() {
    assert_eq!(output_of("print(1 + 2.5)\n"), "3.5\n");
    assert_eq!(output_of("print(2 * 3)\n"), "6\n");
}

#[test]
fn test_unary_minus() {
    assert_eq!(output_of("x = -5\nprint(x + 8)\n"), "3\n");
    assert_eq!(output_of("print(2 * -3)\n"), "-6\n");
}

#[test]
fn test_comparisons_are_total_on_numbers() {
    for (a, b) in [(1, 2), (2, 2), (3, 2)] {
        let source = format!(
            "print({a} < {b})\nprint({a} == {b})\nprint({a} > {b})\n",
            a = a,
            b = b
        );
        let output = output_of(&source);
        let trues = output.lines().filter(|l| *l == "true").count();
        assert_eq!(trues, 1, "exactly one of <, ==, > must hold for {a}, {b}");
    }
}

#[test]
fn test_string_comparison() {
    assert_eq!(output_of("print(\"apple\" < \"pear\")\n"), "true\n");
    assert_eq!(output_of("print(\"a\" == \"a\")\n"), "true\n");
    assert_eq!(output_of("print(\"a\" != \"b\")\n"), "true\n");
}

#[test]
fn test_mixed_kind_comparison_is_rejected() {
    assert!(matches!(
        error_of("print(1 < \"a\")\n"),
        RuntimeError::Type { .. }
    ));
    assert!(matches!(
        error_of("print(1 == \"1\")\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(output_of("print(\"foo\" + \"bar\")\n"), "foobar\n");
    assert!(matches!(
        error_of("print(\"foo\" + 1)\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_logical_operators_yield_bools() {
    assert_eq!(output_of("print(1 AND 2)\n"), "true\n");
    assert_eq!(output_of("print(0 OR \"\")\n"), "false\n");
    assert_eq!(output_of("print(NOT true)\n"), "false\n");
    assert_eq!(output_of("print(NOT 0)\n"), "true\n");
}

// =============================================================================
// Bindings, const, global, scope
// =============================================================================

#[test]
fn test_const_violation() {
    let err = error_of("const limit = 10\nlimit = 11\n");
    assert!(err.to_string().contains("constant 'limit'"));
}

#[test]
fn test_const_value_can_be_copied() {
    assert_eq!(
        output_of("const k = 5\nx = k\nx = 6\nprint(x)\nprint(k)\n"),
        "6\n5\n"
    );
}

#[test]
fn test_name_error() {
    assert!(matches!(
        error_of("print(missing)\n"),
        RuntimeError::Name { .. }
    ));
}

#[test]
fn test_function_locals_do_not_leak() {
    let source = "function f()\nlocal = 5\nreturn local\nendfunction\nf()\nprint(local)\n";
    assert!(matches!(error_of(source), RuntimeError::Name { .. }));
}

#[test]
fn test_scoping_is_lexical_not_dynamic() {
    // `get` is defined at the root, so the caller's local `hidden`
    // must not be visible from its body.
    let source = "function get()\nreturn hidden\nendfunction\n\
                  function caller()\nhidden = 99\nreturn get()\nendfunction\n\
                  caller()\n";
    assert!(matches!(error_of(source), RuntimeError::Name { .. }));
}

#[test]
fn test_function_reads_globals() {
    let source = "base = 10\nfunction bump(n)\nreturn base + n\nendfunction\nprint(bump(4))\n";
    assert_eq!(output_of(source), "14\n");
}

#[test]
fn test_global_assignment_from_subroutine() {
    let source = "procedure setup()\nglobal flag = 1\nendprocedure\nsetup()\nprint(flag)\n";
    assert_eq!(output_of(source), "1\n");
}

#[test]
fn test_assignment_writes_defining_frame() {
    let source = "count = 0\nprocedure tick()\ncount = count + 1\nendprocedure\ntick()\ntick()\nprint(count)\n";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn test_none_literal_and_bindings() {
    assert_eq!(output_of("x = None\nprint(x)\n"), "None\n");
    assert_eq!(output_of("print(true)\nprint(false)\n"), "true\nfalse\n");
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn test_elseif_chain_takes_first_match() {
    let source = "x = 2\nif x == 1 then\nprint(\"one\")\nelseif x == 2 then\nprint(\"two\")\n\
                  elseif x == 2 then\nprint(\"again\")\nelse\nprint(\"other\")\nendif\n";
    assert_eq!(output_of(source), "two\n");
}

#[test]
fn test_if_without_match_falls_through() {
    assert_eq!(output_of("if 1 > 2 then\nprint(\"no\")\nendif\nprint(\"after\")\n"), "after\n");
}

#[test]
fn test_while_loop() {
    let source = "n = 3\nwhile n > 0\nprint(n)\nn = n - 1\nendwhile\n";
    assert_eq!(output_of(source), "3\n2\n1\n");
}

#[test]
fn test_while_false_never_runs() {
    assert_eq!(output_of("while false\nprint(\"never\")\nendwhile\nprint(\"done\")\n"), "done\n");
}

#[test]
fn test_for_with_step() {
    assert_eq!(
        output_of("for i = 0 to 6 step 2\nprint(i)\nnext i\n"),
        "0\n2\n4\n"
    );
}

#[test]
fn test_for_descending() {
    assert_eq!(
        output_of("for i = 3 to 0 step -1\nprint(i)\nnext i\n"),
        "3\n2\n1\n"
    );
}

#[test]
fn test_for_variable_keeps_final_value() {
    assert_eq!(output_of("for i = 0 to 3\ni\nnext i\nprint(i)\n"), "3\n");
}

#[test]
fn test_nested_loops() {
    let source = "for i = 0 to 2\nfor j = 0 to 2\nprint(i * 10 + j)\nnext j\nnext i\n";
    assert_eq!(output_of(source), "0\n1\n10\n11\n");
}

// =============================================================================
// Subroutines
// =============================================================================

#[test]
fn test_recursion() {
    let source = "function fact(n)\nif n == 0 then\nresult = 1\nelse\nresult = n * fact(n - 1)\nendif\nreturn result\nendfunction\nprint(fact(5))\n";
    assert_eq!(output_of(source), "120\n");
}

#[test]
fn test_procedure_returns_null() {
    let source = "procedure greet(who)\nprint(\"hi \" + who)\nendprocedure\nx = greet(\"you\")\nprint(x)\n";
    assert_eq!(output_of(source), "hi you\nNone\n");
}

#[test]
fn test_wrong_arity() {
    let err = error_of("function f(a, b)\nreturn a\nendfunction\nf(1)\n");
    assert!(matches!(err, RuntimeError::Arity { .. }));
    assert!(err.to_string().contains("f expects 2"));
}

#[test]
fn test_calling_a_non_callable() {
    assert!(matches!(
        error_of("x = 1\nx(2)\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_function_can_be_redefined() {
    let source = "function f()\nreturn 1\nendfunction\nfunction f()\nreturn 2\nendfunction\nprint(f())\n";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn test_arguments_evaluate_left_to_right() {
    let source = "function pair(a, b)\nreturn a * 10 + b\nendfunction\nprint(pair(1, 2))\n";
    assert_eq!(output_of(source), "12\n");
}

// =============================================================================
// Lists and indexing
// =============================================================================

#[test]
fn test_array_without_initialiser_is_nulls() {
    assert_eq!(output_of("array a[2]\nprint(a[0])\nprint(a.length)\n"), "None\n2\n");
}

#[test]
fn test_array_length_mismatch() {
    let err = error_of("array a[2] = [1, 2, 3]\n");
    assert!(matches!(err, RuntimeError::Value { .. }));
    assert!(err.to_string().contains("length 2"));
}

#[test]
fn test_index_out_of_range() {
    assert!(matches!(
        error_of("array a[2]\nprint(a[5])\n"),
        RuntimeError::Index { .. }
    ));
    // A negative index wraps from the end, so only one past the front
    // is out of range.
    assert!(matches!(
        error_of("array a[2]\nprint(a[-3])\n"),
        RuntimeError::Index { .. }
    ));
}

#[test]
fn test_negative_index_counts_from_end() {
    let source = "array a[3] = [1, 2, 3]\nprint(a[-1])\na[-1] = 9\nprint(a[2])\n";
    assert_eq!(output_of(source), "3\n9\n");
    assert_eq!(output_of("s = \"abc\"\nprint(s[-1])\n"), "c\n");
}

#[test]
fn test_leading_index_with_trailing_operator() {
    let source = "array a[3] = [5, 2, 9]\nif a[0] > 3 then\nprint(\"big\")\nendif\nprint(a[0] + 1)\n";
    assert_eq!(output_of(source), "big\n6\n");
}

#[test]
fn test_index_read_in_while_condition() {
    let source = "array a[3] = [2, 4, 0]\ni = 0\nwhile a[i] != 0\ni = i + 1\nendwhile\nprint(i)\n";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn test_nested_list_indexing() {
    let source = "grid = [[1, 2], [3, 4]]\nprint(grid[1][0])\ngrid[1][0] = 9\nprint(grid[1][0])\n";
    assert_eq!(output_of(source), "3\n9\n");
}

#[test]
fn test_method_on_indexed_element() {
    let source = "words = [\"hi\", \"there\"]\nprint(words[0].upper())\n";
    assert_eq!(output_of(source), "HI\n");
}

#[test]
fn test_index_must_be_integer() {
    assert!(matches!(
        error_of("array a[2]\nprint(a[0.5])\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_indexing_non_indexable() {
    assert!(matches!(
        error_of("x = 5\nprint(x[0])\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_list_aliasing() {
    let source = "array a[2] = [1, 2]\nb = a\nb[0] = 9\nprint(a[0])\n";
    assert_eq!(output_of(source), "9\n");
}

#[test]
fn test_list_aliasing_through_call() {
    let source = "procedure push(xs)\nxs.append(99)\nendprocedure\narray a[1] = [1]\npush(a)\nprint(a.length)\nprint(a[1])\n";
    assert_eq!(output_of(source), "2\n99\n");
}

#[test]
fn test_list_literal_assignment() {
    assert_eq!(output_of("xs = [1, 2, 3]\nprint(xs)\n"), "[1, 2, 3]\n");
}

#[test]
fn test_string_indexing_reads() {
    assert_eq!(output_of("s = \"abc\"\nprint(s[1])\n"), "b\n");
}

#[test]
fn test_string_index_write_is_rejected() {
    assert!(matches!(
        error_of("s = \"abc\"\ns[0] = \"z\"\n"),
        RuntimeError::Type { .. }
    ));
}

#[test]
fn test_string_index_out_of_range() {
    assert!(matches!(
        error_of("s = \"abc\"\nprint(s[3])\n"),
        RuntimeError::Index { .. }
    ));
}

// =============================================================================
// Members and built-ins in programs
// =============================================================================

#[test]
fn test_member_chain() {
    assert_eq!(output_of("print(\"abc\".upper().length)\n"), "3\n");
}

#[test]
fn test_split_and_list_ops() {
    let source = "parts = \"a b c\".split()\nprint(parts.length)\nprint(parts[2])\n";
    assert_eq!(output_of(source), "3\nc\n");
}

#[test]
fn test_upper_lower_idempotent_in_program() {
    let source = "s = \"MiXeD\"\nprint(s.upper().upper() == s.upper())\nprint(s.lower().lower() == s.lower())\n";
    assert_eq!(output_of(source), "true\ntrue\n");
}

#[test]
fn test_asc_chr_roundtrip() {
    assert_eq!(output_of("print(ASC(\"a\"))\nprint(CHR(98))\n"), "97\nb\n");
}

#[test]
fn test_casts_in_program() {
    assert_eq!(
        output_of("print(int(\"17\") + 1)\nprint(str(41) + \"!\")\nprint(float(2) / 4)\n"),
        "18\n41!\n0.5\n"
    );
}

#[test]
fn test_input_feeds_program() {
    let (result, output) = run_with_input("name = input(\"? \")\nprint(\"hi \" + name)\n", "ada\n");
    result.unwrap();
    assert_eq!(output, "? hi ada\n");
}

#[test]
fn test_print_multiple_arguments() {
    assert_eq!(output_of("print(1, \"two\", true)\n"), "1 two true\n");
}

#[test]
fn test_random_in_program() {
    let source = "x = random(1, 6)\nprint(x >= 1 AND x <= 6)\n";
    assert_eq!(output_of(source), "true\n");
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn test_file_write_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let path = path.to_str().unwrap();

    let source = format!(
        "f = newFile(\"{path}\")\nf.writeLine(\"one\")\nf.writeLine(\"two\")\nf.close()\n\
         g = open(\"{path}\")\nprint(g.readLine())\nprint(g.readLine())\n",
        path = path
    );
    assert_eq!(output_of(&source), "one\ntwo\n");
}

#[test]
fn test_read_line_past_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.txt");
    std::fs::write(&path, "only\n").unwrap();
    let source = format!(
        "f = open(\"{}\")\nf.readLine()\nf.readLine()\n",
        path.to_str().unwrap()
    );
    assert!(matches!(error_of(&source), RuntimeError::Eof { .. }));
}

#[test]
fn test_open_missing_file() {
    assert!(matches!(
        error_of("f = open(\"/no/such/file.txt\")\n"),
        RuntimeError::Io(_)
    ));
}

// =============================================================================
// Program results
// =============================================================================

#[test]
fn test_program_result_is_last_value() {
    assert_eq!(run("1 + 2\n").unwrap(), Value::Int(3));
    assert_eq!(run("").unwrap(), Value::Null);
    // Assignments are statements; they produce null.
    assert_eq!(run("x = 5\n").unwrap(), Value::Null);
}

#[test]
fn test_empty_body_if_is_fine() {
    assert_eq!(run("if true then\nendif\n").unwrap(), Value::Null);
}
