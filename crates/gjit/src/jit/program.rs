//! Program construction and ownership of compiled code.

use std::mem::ManuallyDrop;

use cranelift_codegen::ir::{Function, Signature, Type, UserFuncName, Value};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Linkage, Module};
use tracing::{debug, trace};

use super::context::JitContext;
use crate::error::Result;

/// Compiled code for one configuration, or one shared library of helpers.
///
/// Owns the module's executable memory; dropping the program releases it.
pub(crate) struct Program {
    module: ManuallyDrop<JITModule>,
    exports: Vec<(String, *const u8)>,
    kind: &'static str,
}

// SAFETY: the module owns the code memory and is never mutated after
// finalization. Export addresses stay valid for the program's lifetime.
unsafe impl Send for Program {}
unsafe impl Sync for Program {}

impl Program {
    /// Address of an exported function.
    pub fn function(&self, name: &str) -> Option<*const u8> {
        self.exports
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, ptr)| ptr)
    }

    /// Exported functions, for registration as imports of another program.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, *const u8)> {
        self.exports.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn export_count(&self) -> usize {
        self.exports.len()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        // SAFETY: `module` is taken exactly once, here. Function pointers
        // handed out by this program are owned by state objects that drop
        // together with it.
        let module = unsafe { ManuallyDrop::take(&mut self.module) };
        unsafe { module.free_memory() };
        trace!(event = "program_freed", kind = self.kind);
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("kind", &self.kind)
            .field("exports", &self.exports.len())
            .finish()
    }
}

/// Accumulates functions into a fresh module, then finalizes it into a
/// [`Program`].
pub(crate) struct ProgramBuilder<'a> {
    jit: &'a JitContext,
    module: JITModule,
    func_ctx: FunctionBuilderContext,
    exports: Vec<(String, FuncId)>,
    defined: usize,
    kind: &'static str,
}

impl<'a> ProgramBuilder<'a> {
    /// Starts a program that may import any export of `imports`.
    pub fn new(jit: &'a JitContext, kind: &'static str, imports: &[&Program]) -> Self {
        let module = jit.new_module(imports.iter().flat_map(|p| p.symbols()));
        Self {
            jit,
            module,
            func_ctx: FunctionBuilderContext::new(),
            exports: Vec::new(),
            defined: 0,
            kind,
        }
    }

    pub fn pointer_type(&self) -> Type {
        self.jit.pointer_type()
    }

    /// Signature in the target's default (C) calling convention.
    pub fn signature(&self, params: &[Type], returns: &[Type]) -> Signature {
        let mut sig = self.module.make_signature();
        sig.params
            .extend(params.iter().map(|&t| cranelift_codegen::ir::AbiParam::new(t)));
        sig.returns
            .extend(returns.iter().map(|&t| cranelift_codegen::ir::AbiParam::new(t)));
        sig
    }

    /// Declares a function provided by an imported program.
    pub fn import(&mut self, name: &str, sig: &Signature) -> Result<FuncId> {
        Ok(self.module.declare_function(name, Linkage::Import, sig)?)
    }

    /// Declares a function defined in this program.
    pub fn declare(&mut self, name: &str, linkage: Linkage, sig: &Signature) -> Result<FuncId> {
        let id = self.module.declare_function(name, linkage, sig)?;
        if linkage == Linkage::Export && !self.exports.iter().any(|(_, e)| *e == id) {
            self.exports.push((name.to_string(), id));
        }
        Ok(id)
    }

    /// Emits the body of a declared function.
    ///
    /// `body` receives the builder positioned in the sealed entry block, the
    /// module (for referencing other functions) and the entry parameters. It
    /// must terminate every block it creates.
    pub fn define<F>(&mut self, id: FuncId, sig: Signature, body: F) -> Result<()>
    where
        F: FnOnce(&mut FunctionBuilder<'_>, &mut JITModule, &[Value]),
    {
        let mut func = Function::with_name_signature(UserFuncName::user(0, id.as_u32()), sig);

        {
            let mut builder = FunctionBuilder::new(&mut func, &mut self.func_ctx);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            builder.seal_block(entry);

            let params = builder.block_params(entry).to_vec();
            body(&mut builder, &mut self.module, &params);

            builder.seal_all_blocks();
            builder.finalize();
        }

        let mut ctx = Context::for_function(func);
        self.module.define_function(id, &mut ctx)?;
        self.module.clear_context(&mut ctx);
        self.defined += 1;
        trace!(event = "function_defined", program = self.kind, id = id.as_u32());
        Ok(())
    }

    /// Declares and defines in one step.
    pub fn function<F>(
        &mut self,
        name: &str,
        linkage: Linkage,
        sig: Signature,
        body: F,
    ) -> Result<FuncId>
    where
        F: FnOnce(&mut FunctionBuilder<'_>, &mut JITModule, &[Value]),
    {
        let id = self.declare(name, linkage, &sig)?;
        self.define(id, sig, body)?;
        Ok(id)
    }

    /// Links the module and resolves every export.
    pub fn finish(mut self) -> Result<Program> {
        self.module.finalize_definitions()?;

        let exports: Vec<(String, *const u8)> = self
            .exports
            .into_iter()
            .map(|(name, id)| {
                let ptr = self.module.get_finalized_function(id);
                (name, ptr)
            })
            .collect();

        debug!(
            event = "program_compiled",
            kind = self.kind,
            functions = self.defined,
            exports = exports.len(),
        );

        Ok(Program {
            module: ManuallyDrop::new(self.module),
            exports,
            kind: self.kind,
        })
    }
}
