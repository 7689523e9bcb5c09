use super::Backend;
use crate::ir::{Operation, Program};
use crate::{CompileOptions, Error, Result};

/// Reference backend: "lowers" a program into something that can be run
/// directly against a byte stream. Used as the oracle for checking that
/// optimization preserves behaviour, and by `bfc run`.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    options: CompileOptions,
}

impl Interpreter {
    #[must_use]
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }
}

impl Backend for Interpreter {
    type Artifact = Executable;

    fn lower(&self, program: Program) -> Result<Executable> {
        self.options.validate()?;
        Ok(Executable {
            program,
            options: self.options.clone(),
            step_limit: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Executable {
    program: Program,
    options: CompileOptions,
    step_limit: Option<u64>,
}

/// Observable result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: Vec<u8>,
    pub tape: Vec<u32>,
    pub pointer: usize,
    /// Operations executed plus loop-condition tests.
    pub steps: u64,
}

impl Executable {
    /// Abort with [`Error::StepLimitExceeded`] after `limit` steps.
    #[must_use]
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn run(&self, input: &[u8]) -> Result<Execution> {
        let mut machine = Machine {
            tape: vec![0; self.options.tape_size],
            pointer: 0,
            input: input.iter(),
            output: Vec::new(),
            steps: 0,
            step_limit: self.step_limit,
            options: &self.options,
        };
        machine.exec(&self.program)?;
        Ok(Execution {
            output: machine.output,
            tape: machine.tape,
            pointer: machine.pointer,
            steps: machine.steps,
        })
    }
}

struct Machine<'a> {
    tape: Vec<u32>,
    pointer: usize,
    input: std::slice::Iter<'a, u8>,
    output: Vec<u8>,
    steps: u64,
    step_limit: Option<u64>,
    options: &'a CompileOptions,
}

impl Machine<'_> {
    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(Error::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }

    fn exec(&mut self, program: &Program) -> Result<()> {
        // Each frame is a scope and the index of its next operation. A loop
        // stays current in its parent until its test fails, so finishing a
        // body falls back to re-testing it.
        let mut frames: Vec<(&Program, usize)> = vec![(program, 0)];

        while let Some(&(scope, pc)) = frames.last() {
            let Some(op) = scope.ops().get(pc) else {
                frames.pop();
                continue;
            };

            self.tick()?;
            if let Operation::Loop(body) = op {
                if self.tape[self.pointer] == 0 {
                    advance(&mut frames);
                } else {
                    frames.push((body, 0));
                }
                continue;
            }
            advance(&mut frames);

            let options = self.options;
            let cell = &mut self.tape[self.pointer];
            match op {
                Operation::MovePointer(delta) => {
                    let moved = self.pointer as i64 + i64::from(*delta);
                    self.pointer = moved.rem_euclid(options.tape_size as i64) as usize;
                }
                Operation::AddData(delta) => {
                    *cell = options.wrap_data(i64::from(*cell) + i64::from(*delta));
                }
                Operation::SetData(value) => *cell = options.wrap_data(i64::from(*value)),
                // Cells wider than a byte are truncated on output.
                Operation::Output => self.output.push(*cell as u8),
                Operation::Input => match self.input.next() {
                    Some(&byte) => *cell = options.wrap_data(i64::from(byte)),
                    None => {
                        if let Some(value) = options.eof_value() {
                            *cell = value;
                        }
                    }
                },
                Operation::Loop(_) => unreachable!("loops handled above"),
            }
        }
        Ok(())
    }
}

fn advance(frames: &mut [(&Program, usize)]) {
    if let Some((_, pc)) = frames.last_mut() {
        *pc += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EofPolicy, parse};

    fn run_source(source: &str, input: &[u8], options: CompileOptions) -> Execution {
        let program = parse(source).unwrap();
        Interpreter::new(options)
            .lower(program)
            .unwrap()
            .run(input)
            .unwrap()
    }

    #[test]
    fn echoes_input() {
        let run = run_source(",.,.", b"hi", CompileOptions::default());
        assert_eq!(run.output, b"hi");
    }

    #[test]
    fn cells_wrap_at_modulus() {
        let run = run_source("-.", b"", CompileOptions::default());
        assert_eq!(run.output, [255]);
        assert_eq!(run.tape[0], 255);
    }

    #[test]
    fn pointer_wraps_at_tape_size() {
        let options = CompileOptions {
            tape_size: 4,
            ..CompileOptions::default()
        };
        let run = run_source("<+", b"", options);
        assert_eq!(run.pointer, 3);
        assert_eq!(run.tape, vec![0, 0, 0, 1]);
    }

    #[test]
    fn eof_policies() {
        let source = "+++,.";
        let unchanged = run_source(source, b"", CompileOptions::default());
        assert_eq!(unchanged.output, [3]);

        let zero = run_source(
            source,
            b"",
            CompileOptions {
                eof: EofPolicy::Zero,
                ..CompileOptions::default()
            },
        );
        assert_eq!(zero.output, [0]);

        let max = run_source(
            source,
            b"",
            CompileOptions {
                eof: EofPolicy::Max,
                ..CompileOptions::default()
            },
        );
        assert_eq!(max.output, [255]);
    }

    #[test]
    fn counts_loop_tests_as_steps() {
        // add, test, add, test, add, test (exit)
        let run = run_source("++[-]", b"", CompileOptions::default());
        assert_eq!(run.steps, 2 + 3 + 2);
    }

    #[test]
    fn step_limit_stops_infinite_loops() {
        let program = parse("+[]").unwrap();
        let executable = Interpreter::default()
            .lower(program)
            .unwrap()
            .with_step_limit(100);
        assert!(matches!(
            executable.run(b""),
            Err(Error::StepLimitExceeded(100))
        ));
    }

    #[test]
    fn rejects_invalid_options() {
        let interpreter = Interpreter::new(CompileOptions {
            tape_size: 0,
            ..CompileOptions::default()
        });
        assert!(matches!(
            interpreter.lower(Program::default()),
            Err(Error::InvalidOptions(_))
        ));
    }
}
