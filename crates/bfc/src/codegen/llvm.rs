// LLVM IR backend: structural translation of the optimized program via inkwell.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::IntType;
use inkwell::values::{FunctionValue, GlobalValue, IntValue, PointerValue};
use inkwell::{AddressSpace, IntPredicate};

use super::Backend;
use crate::ir::{Operation, Program};
use crate::{CompileOptions, Error, Result};

fn llvm_err<T>(result: std::result::Result<T, BuilderError>) -> Result<T> {
    result.map_err(|e| Error::Internal(format!("LLVM builder error: {e:?}")))
}

/// Emits a textual LLVM module with a `main` that runs the program.
///
/// The tape is a zero-initialized `[tape_size x i8]` global and the data
/// pointer an `i64` index into it, wrapped with `urem` on every move. I/O goes
/// through libc `putchar`/`getchar`. Only 8-bit cells are supported.
#[derive(Debug, Clone)]
pub struct LlvmBackend {
    options: CompileOptions,
    module_name: String,
}

impl LlvmBackend {
    #[must_use]
    pub fn new(options: CompileOptions, module_name: impl Into<String>) -> Self {
        Self {
            options,
            module_name: module_name.into(),
        }
    }
}

impl Backend for LlvmBackend {
    type Artifact = String;

    fn lower(&self, program: Program) -> Result<String> {
        self.options.validate()?;
        if self.options.cell_modulus != 256 {
            return Err(Error::Unsupported(format!(
                "LLVM backend needs 8-bit cells, got modulus {}",
                self.options.cell_modulus
            )));
        }

        let context = Context::create();
        let lowering = Lowering::new(&context, &self.module_name, &self.options)?;
        let module = lowering.lower_program(&program)?;
        Ok(module.print_to_string().to_string())
    }
}

struct Lowering<'ctx, 'a> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    options: &'a CompileOptions,
    i8_type: IntType<'ctx>,
    i32_type: IntType<'ctx>,
    i64_type: IntType<'ctx>,
    tape: GlobalValue<'ctx>,
    /// Stack slot holding the current cell index.
    index_slot: PointerValue<'ctx>,
    putchar: FunctionValue<'ctx>,
    getchar: FunctionValue<'ctx>,
    main: FunctionValue<'ctx>,
}

impl<'ctx, 'a> Lowering<'ctx, 'a> {
    fn new(context: &'ctx Context, name: &str, options: &'a CompileOptions) -> Result<Self> {
        let module = context.create_module(name);
        let builder = context.create_builder();
        let i8_type = context.i8_type();
        let i32_type = context.i32_type();
        let i64_type = context.i64_type();

        let tape_len = u32::try_from(options.tape_size).map_err(|_| {
            Error::Unsupported(format!("tape of {} cells is too large", options.tape_size))
        })?;
        let tape_type = i8_type.array_type(tape_len);
        let tape = module.add_global(tape_type, None, "tape");
        tape.set_initializer(&tape_type.const_zero());
        tape.set_linkage(Linkage::Internal);

        let putchar = module.add_function(
            "putchar",
            i32_type.fn_type(&[i32_type.into()], false),
            Some(Linkage::External),
        );
        let getchar = module.add_function(
            "getchar",
            i32_type.fn_type(&[], false),
            Some(Linkage::External),
        );
        let main = module.add_function("main", i32_type.fn_type(&[], false), None);

        let entry = context.append_basic_block(main, "entry");
        builder.position_at_end(entry);
        let index_slot = llvm_err(builder.build_alloca(i64_type, "index"))?;
        llvm_err(builder.build_store(index_slot, i64_type.const_zero()))?;

        Ok(Self {
            context,
            module,
            builder,
            options,
            i8_type,
            i32_type,
            i64_type,
            tape,
            index_slot,
            putchar,
            getchar,
            main,
        })
    }

    fn lower_program(self, program: &Program) -> Result<Module<'ctx>> {
        self.lower_block(program)?;
        llvm_err(
            self.builder
                .build_return(Some(&self.i32_type.const_zero())),
        )?;

        self.module
            .verify()
            .map_err(|e| Error::Internal(format!("LLVM verify failed: {e}")))?;
        Ok(self.module)
    }

    fn lower_block(&self, program: &Program) -> Result<()> {
        // Open scopes, innermost last. Loop scopes carry the header to branch
        // back to and the exit block to continue in once their body is done.
        let mut scopes = vec![(program.iter(), None)];
        while let Some((ops, blocks)) = scopes.last_mut() {
            let Some(op) = ops.next() else {
                if let Some((header_bb, exit_bb)) = *blocks {
                    llvm_err(self.builder.build_unconditional_branch(header_bb))?;
                    self.builder.position_at_end(exit_bb);
                }
                scopes.pop();
                continue;
            };
            match op {
                Operation::MovePointer(delta) => self.lower_move(*delta)?,
                Operation::AddData(delta) => {
                    let cell = self.cell_ptr()?;
                    let value = self.load_cell(cell)?;
                    let step = self.options.wrap_data(i64::from(*delta));
                    let sum = llvm_err(self.builder.build_int_add(
                        value,
                        self.i8_type.const_int(u64::from(step), false),
                        "add",
                    ))?;
                    llvm_err(self.builder.build_store(cell, sum))?;
                }
                Operation::SetData(value) => {
                    let cell = self.cell_ptr()?;
                    let value = self.options.wrap_data(i64::from(*value));
                    llvm_err(
                        self.builder
                            .build_store(cell, self.i8_type.const_int(u64::from(value), false)),
                    )?;
                }
                Operation::Output => {
                    let cell = self.cell_ptr()?;
                    let value = self.load_cell(cell)?;
                    let ch = llvm_err(self.builder.build_int_z_extend(value, self.i32_type, "ch"))?;
                    llvm_err(self.builder.build_call(self.putchar, &[ch.into()], "putchar"))?;
                }
                Operation::Input => self.lower_input()?,
                Operation::Loop(body) => {
                    let blocks = self.open_loop()?;
                    scopes.push((body.iter(), Some(blocks)));
                }
            }
        }
        Ok(())
    }

    fn lower_move(&self, delta: i32) -> Result<()> {
        let tape_size = self.options.tape_size as u64;
        let step = i64::from(delta).rem_euclid(self.options.tape_size as i64) as u64;
        let index = self.load_index()?;
        let moved = llvm_err(self.builder.build_int_add(
            index,
            self.i64_type.const_int(step, false),
            "moved",
        ))?;
        let wrapped = llvm_err(self.builder.build_int_unsigned_rem(
            moved,
            self.i64_type.const_int(tape_size, false),
            "wrapped",
        ))?;
        llvm_err(self.builder.build_store(self.index_slot, wrapped))?;
        Ok(())
    }

    fn lower_input(&self) -> Result<()> {
        let cell = self.cell_ptr()?;
        let call = llvm_err(self.builder.build_call(self.getchar, &[], "getchar"))?;
        let read = call
            .try_as_basic_value()
            .basic()
            .ok_or_else(|| Error::Internal("getchar returned void".into()))?
            .into_int_value();
        let byte = llvm_err(self.builder.build_int_truncate(read, self.i8_type, "byte"))?;

        // getchar returns -1 at end of input
        let at_eof = llvm_err(self.builder.build_int_compare(
            IntPredicate::SLT,
            read,
            self.i32_type.const_zero(),
            "at_eof",
        ))?;
        let on_eof = match self.options.eof_value() {
            Some(value) => self.i8_type.const_int(u64::from(value), false),
            None => self.load_cell(cell)?,
        };
        let stored = llvm_err(self.builder.build_select(at_eof, on_eof, byte, "input"))?;
        llvm_err(self.builder.build_store(cell, stored))?;
        Ok(())
    }

    /// Emit a loop header testing the active cell and position the builder
    /// in the body. Returns the header and exit blocks.
    fn open_loop(&self) -> Result<(BasicBlock<'ctx>, BasicBlock<'ctx>)> {
        let header_bb = self.context.append_basic_block(self.main, "loop_header");
        let body_bb = self.context.append_basic_block(self.main, "loop_body");
        let exit_bb = self.context.append_basic_block(self.main, "loop_exit");

        llvm_err(self.builder.build_unconditional_branch(header_bb))?;
        self.builder.position_at_end(header_bb);
        let cell = self.cell_ptr()?;
        let value = self.load_cell(cell)?;
        let nonzero = llvm_err(self.builder.build_int_compare(
            IntPredicate::NE,
            value,
            self.i8_type.const_zero(),
            "loop_test",
        ))?;
        llvm_err(
            self.builder
                .build_conditional_branch(nonzero, body_bb, exit_bb),
        )?;

        self.builder.position_at_end(body_bb);
        Ok((header_bb, exit_bb))
    }

    fn load_index(&self) -> Result<IntValue<'ctx>> {
        Ok(llvm_err(
            self.builder
                .build_load(self.i64_type, self.index_slot, "index"),
        )?
        .into_int_value())
    }

    fn cell_ptr(&self) -> Result<PointerValue<'ctx>> {
        let index = self.load_index()?;
        let base = llvm_err(self.builder.build_ptr_to_int(
            self.tape.as_pointer_value(),
            self.i64_type,
            "tape_base",
        ))?;
        let addr = llvm_err(self.builder.build_int_add(base, index, "cell_addr"))?;
        llvm_err(self.builder.build_int_to_ptr(
            addr,
            self.context.ptr_type(AddressSpace::default()),
            "cell",
        ))
    }

    fn load_cell(&self, cell: PointerValue<'ctx>) -> Result<IntValue<'ctx>> {
        Ok(llvm_err(self.builder.build_load(self.i8_type, cell, "cell_value"))?.into_int_value())
    }
}
