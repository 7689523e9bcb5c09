//! End-to-end tests: source text through the parser, the full pipeline and
//! the interpreter backend.

use bfc::optimize::{Pass, optimize_until};
use bfc::{
    Backend, CompileOptions, Diagnostic, Error, Interpreter, Operation, Program, SyntaxError,
    compile, optimize, parse,
};

use Operation::{AddData, Input, Loop, MovePointer, Output, SetData};

const HELLO_WORLD: &str = "
    ++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]
    >>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.
";

fn run(program: Program, input: &[u8]) -> Vec<u8> {
    Interpreter::default()
        .lower(program)
        .expect("default options are valid")
        .with_step_limit(1_000_000)
        .run(input)
        .expect("program terminates")
        .output
}

#[test]
fn clear_after_increments_reduces_to_assignments() {
    let program = compile("++>+++[-]<.", &CompileOptions::default()).unwrap();
    assert_eq!(
        program.ops(),
        &[
            SetData(2),
            MovePointer(1),
            SetData(3),
            SetData(0),
            MovePointer(-1),
            Output,
        ]
    );
    assert_eq!(run(program, b""), [2]);
}

#[test]
fn hello_world_output_is_unchanged_by_optimization() {
    let parsed = parse(HELLO_WORLD).unwrap();
    let optimized = optimize(parsed.clone(), &CompileOptions::default());

    assert!(optimized.op_count() < parsed.op_count());
    assert_eq!(run(parsed, b""), b"Hello World!\n");
    assert_eq!(run(optimized, b""), b"Hello World!\n");
}

#[test]
fn clear_loops_are_gone_after_pass_four() {
    let options = CompileOptions::default();
    for (source, delta) in [(",[-]", -1), (",[+]", 1)] {
        let parsed = parse(source).unwrap();
        assert_eq!(parsed.ops()[1], Loop(Program::new(vec![AddData(delta)])));

        let simplified = optimize_until(parsed, &options, Pass::SimplifyZeroingLoops);
        assert_eq!(simplified.ops(), &[Input, SetData(0)]);
    }

    let transfer = optimize(parse(",[->+<]").unwrap(), &options);
    assert!(matches!(transfer.ops(), [Input, Loop(_)]));
}

#[test]
fn comments_do_not_change_the_program() {
    assert_eq!(parse("+ hello + >").unwrap(), parse("++>").unwrap());
    assert_eq!(
        compile("cat: ,[.,] # copies input", &CompileOptions::default()).unwrap(),
        compile(",[.,]", &CompileOptions::default()).unwrap()
    );
}

#[test]
fn cat_program_copies_input() {
    let program = compile(",[.,]", &CompileOptions::default()).unwrap();
    assert_eq!(run(program, b"echo"), b"echo");
}

#[test]
fn unbalanced_brackets_fail_before_optimization() {
    let err = compile("+[", &CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Syntax(SyntaxError::Unclosed { offset: 1 })
    ));

    let err = compile("]", &CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Syntax(SyntaxError::UnmatchedClose { offset: 0 })
    ));
}

#[test]
fn syntax_errors_render_with_location() {
    let source = "+++\n[>+\n";
    let Err(error) = parse(source) else {
        panic!("expected a syntax error");
    };
    let rendered = Diagnostic::from_syntax_error(&error, "prog.bf", source).to_string();
    assert!(rendered.starts_with("prog.bf:2:1: error:"), "{rendered}");
    assert!(rendered.ends_with("[>+\n^"), "{rendered}");
}

#[test]
fn invalid_options_are_rejected() {
    let options = CompileOptions {
        cell_modulus: 0,
        ..CompileOptions::default()
    };
    assert!(matches!(
        compile("+", &options),
        Err(Error::InvalidOptions(_))
    ));
}

#[test]
fn wide_cells_fold_with_their_own_modulus() {
    let options = CompileOptions {
        cell_modulus: 1000,
        ..CompileOptions::default()
    };
    let program = compile(",-.", &options).unwrap();
    assert_eq!(program.ops(), &[Input, AddData(999), Output]);
}

#[test]
fn widest_cells_keep_deltas_congruent() {
    let options = CompileOptions {
        cell_modulus: bfc::config::MAX_CELL_MODULUS,
        ..CompileOptions::default()
    };
    let interpreter = Interpreter::new(options.clone());
    for (source, input) in [("-", &b""[..]), (",-.", &b"\x05"[..])] {
        let raw = interpreter.lower(parse(source).unwrap()).unwrap().run(input).unwrap();
        let optimized = compile(source, &options).unwrap();
        let folded = interpreter.lower(optimized).unwrap().run(input).unwrap();
        assert_eq!(folded.tape, raw.tape, "{source}");
        assert_eq!(folded.output, raw.output, "{source}");
    }
    assert_eq!(compile("-", &options).unwrap().ops(), &[SetData(2_147_483_647)]);
}

#[test]
fn cell_moduli_beyond_i32_deltas_are_rejected() {
    for cell_modulus in [3_000_000_000, u32::MAX] {
        let options = CompileOptions {
            cell_modulus,
            ..CompileOptions::default()
        };
        assert!(matches!(
            compile("-", &options),
            Err(Error::InvalidOptions(_))
        ));
    }
}

#[test]
fn deeply_nested_loops_compile_and_run() {
    const DEPTH: usize = 200_000;
    let source = format!("+{}-{}.", "[".repeat(DEPTH), "]".repeat(DEPTH));

    let parsed = parse(&source).unwrap();
    assert_eq!(parsed.depth(), DEPTH);

    let optimized = compile(&source, &CompileOptions::default()).unwrap();
    // the innermost `[-]` became `SetData(0)`
    assert_eq!(optimized.depth(), DEPTH - 1);
    assert_eq!(optimized.ops()[0], SetData(1));

    let again = optimize(optimized.clone(), &CompileOptions::default());
    assert!(again == optimized, "pipeline is not a fixpoint on deep nesting");

    assert_eq!(run(parsed, b""), [0]);
    assert_eq!(run(optimized, b""), [0]);
}

#[test]
fn ir_dump_is_indented() {
    let program = compile(",[->+<]", &CompileOptions::default()).unwrap();
    assert_eq!(
        program.to_string(),
        "input\nloop\n  add 255\n  move 1\n  add 1\n  move -1\nend\n"
    );
}
