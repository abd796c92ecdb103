//! Vertex attribute fetch.
//!
//! An [`InputLayout`] compiles one `input_layout(vert, buffers, index,
//! instance)` entry point that decodes every declared attribute into
//! `vert[i * 4..i * 4 + 4]`.


use std::mem::{offset_of, size_of};

use cranelift_codegen::ir::types::I32;
use cranelift_codegen::ir::{InstBuilder, Type, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::Linkage;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{GjitError, Result};
use crate::format::{emit_vec4f, Format};
use crate::jit::ir::{array_flags, store_const_vec4, store_vec4, to_pointer, DEFAULT_COLOR};
use crate::jit::{Program, ProgramBuilder};
use crate::library::Library;
use crate::types::{Buffer, VertexBuffer, MAX_ATTRIBS, MAX_VERTEX_BUFFERS};

/// Compiled vertex fetch.
///
/// `vert` must hold four floats per attribute of the layout and `buffers`
/// one slot for every binding an enabled attribute names.
pub type InputLayoutFn =
    unsafe extern "C" fn(vert: *mut f32, buffers: *const VertexBuffer, index: u32, instance: u32);

/// One vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttrib {
    pub enable: bool,
    pub format: Format,
    /// Vertex buffer slot the attribute reads from.
    pub binding: u32,
    /// Byte offset inside one element.
    pub offset: u32,
    /// Instances per element step; zero steps per vertex.
    pub divisor: u32,
}

impl VertexAttrib {
    pub fn new(format: Format, binding: u32, offset: u32) -> Self {
        Self {
            enable: true,
            format,
            binding,
            offset,
            divisor: 0,
        }
    }

    pub fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    /// A slot that always yields `(0, 0, 0, 1)`.
    pub fn disabled() -> Self {
        Self {
            enable: false,
            format: Format::Unknown,
            binding: 0,
            offset: 0,
            divisor: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLayoutCreateInfo {
    pub attribs: Vec<VertexAttrib>,
}

/// A compiled set of vertex attributes.
pub struct InputLayout {
    program: Program,
    func: InputLayoutFn,
    attribs: SmallVec<[VertexAttrib; 8]>,
    bindings: u32,
}

impl InputLayout {
    /// # Errors
    ///
    /// [`GjitError::InvalidCreateInfo`] for more than [`MAX_ATTRIBS`]
    /// attributes or a binding outside the vertex buffer slots.
    pub fn new(library: &Library, info: &InputLayoutCreateInfo) -> Result<Self> {
        if info.attribs.len() > MAX_ATTRIBS {
            return Err(GjitError::InvalidCreateInfo(format!(
                "{} attributes exceed the limit of {MAX_ATTRIBS}",
                info.attribs.len()
            )));
        }

        let mut bindings = 0u32;
        for (i, attrib) in info.attribs.iter().enumerate().filter(|(_, a)| a.enable) {
            if attrib.binding as usize >= MAX_VERTEX_BUFFERS {
                return Err(GjitError::InvalidCreateInfo(format!(
                    "attribute {i} reads binding {}, only {MAX_VERTEX_BUFFERS} exist",
                    attrib.binding
                )));
            }
            bindings |= 1 << attrib.binding;
        }

        let mut pb = ProgramBuilder::new(library.jit(), "input_layout", &[]);
        let ptr = pb.pointer_type();
        let sig = pb.signature(&[ptr, ptr, I32, I32], &[]);

        pb.function("input_layout", Linkage::Export, sig, |b, _, params| {
            let (vert, buffers, index, instance) = (params[0], params[1], params[2], params[3]);
            for (i, attrib) in info.attribs.iter().enumerate() {
                if attrib.enable {
                    let lanes = emit_attrib(b, ptr, attrib, buffers, index, instance);
                    store_vec4(b, lanes, vert, i * 4);
                } else {
                    let slot = b.ins().iadd_imm(vert, (i * 16) as i64);
                    store_const_vec4(b, DEFAULT_COLOR, slot);
                }
            }
            b.ins().return_(&[]);
        })?;

        let program = pb.finish()?;
        let raw = program
            .function("input_layout")
            .ok_or_else(|| GjitError::Module("input_layout entry point missing".to_string()))?;
        // SAFETY: declared as (ptr, ptr, i32, i32) -> () in the C convention.
        let func = unsafe { std::mem::transmute::<*const u8, InputLayoutFn>(raw) };

        debug!(
            event = "input_layout_created",
            attribs = info.attribs.len(),
            enabled = info.attribs.iter().filter(|a| a.enable).count(),
            bindings = bindings,
        );

        Ok(Self {
            program,
            func,
            attribs: info.attribs.iter().copied().collect(),
            bindings,
        })
    }

    pub fn as_fn(&self) -> InputLayoutFn {
        self.func
    }

    pub fn attribs(&self) -> &[VertexAttrib] {
        &self.attribs
    }

    /// Bitmask of vertex buffer slots enabled attributes read.
    pub fn bindings_mask(&self) -> u32 {
        self.bindings
    }

    /// Decodes vertex `index` of `instance` into `vert`.
    ///
    /// # Safety
    ///
    /// Every slot in [`Self::bindings_mask`] must point at a live [`Buffer`]
    /// holding the addressed element for each enabled attribute. Nothing is
    /// bounds-checked inside the compiled code.
    ///
    /// # Panics
    ///
    /// If `vert` is shorter than four floats per attribute or `buffers` does
    /// not cover the highest binding read.
    pub unsafe fn fetch(&self, vert: &mut [f32], buffers: &[VertexBuffer], index: u32, instance: u32) {
        assert!(vert.len() >= self.attribs.len() * 4, "vertex array too short");
        let highest = (32 - self.bindings.leading_zeros()) as usize;
        assert!(buffers.len() >= highest, "vertex buffer slots too short");
        (self.func)(vert.as_mut_ptr(), buffers.as_ptr(), index, instance)
    }
}

impl std::fmt::Debug for InputLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputLayout")
            .field("program", &self.program)
            .field("attribs", &self.attribs)
            .field("bindings", &format_args!("{:#x}", self.bindings))
            .finish()
    }
}

/// Address computation and decode of one enabled attribute.
fn emit_attrib(
    b: &mut FunctionBuilder,
    ptr: Type,
    attrib: &VertexAttrib,
    buffers: Value,
    index: Value,
    instance: Value,
) -> [Value; 4] {
    let flags = array_flags();

    let element = if attrib.divisor != 0 {
        let divisor = b.ins().iconst(I32, i64::from(attrib.divisor));
        b.ins().udiv(instance, divisor)
    } else {
        index
    };

    let slot = b
        .ins()
        .iadd_imm(buffers, (attrib.binding as usize * size_of::<VertexBuffer>()) as i64);
    let stride = b
        .ins()
        .load(I32, flags, slot, offset_of!(VertexBuffer, stride) as i32);
    let base_offset = b
        .ins()
        .load(I32, flags, slot, offset_of!(VertexBuffer, offset) as i32);
    let buffer = b
        .ins()
        .load(ptr, flags, slot, offset_of!(VertexBuffer, buffer) as i32);
    let data = b.ins().load(ptr, flags, buffer, offset_of!(Buffer, data) as i32);

    let scaled = b.ins().imul(element, stride);
    let offset = b.ins().iadd(scaled, base_offset);
    let offset = b.ins().iadd_imm(offset, i64::from(attrib.offset));
    let offset = to_pointer(b, ptr, offset);
    let addr = b.ins().iadd(data, offset);

    emit_vec4f(b, attrib.format, addr)
}
