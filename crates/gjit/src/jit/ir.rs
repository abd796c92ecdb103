//! IR emission helpers shared by the stage generators.

use cranelift_codegen::ir::types::{F32, I32};
use cranelift_codegen::ir::{InstBuilder, MemFlags, StackSlotData, StackSlotKind, Type, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Module};

pub(crate) const INV_255: f32 = 1.0 / 255.0;
pub(crate) const INV_127: f32 = 1.0 / 127.0;
pub(crate) const INV_65535: f32 = 1.0 / 65535.0;
pub(crate) const INV_32767: f32 = 1.0 / 32767.0;
pub(crate) const INV_63: f32 = 1.0 / 63.0;
pub(crate) const INV_31: f32 = 1.0 / 31.0;
pub(crate) const INV_15: f32 = 1.0 / 15.0;

/// `(0, 0, 0, 1)`
pub(crate) const DEFAULT_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Flags for caller-provided, naturally aligned arrays.
#[inline]
pub(crate) fn array_flags() -> MemFlags {
    MemFlags::trusted()
}

/// Flags for texel and vertex data, which carry no alignment guarantee.
#[inline]
pub(crate) fn data_flags() -> MemFlags {
    let mut flags = MemFlags::new();
    flags.set_notrap();
    flags
}

pub(crate) fn f32const(b: &mut FunctionBuilder, value: f32) -> Value {
    b.ins().f32const(value)
}

pub(crate) fn load_f32(b: &mut FunctionBuilder, base: Value, index: usize) -> Value {
    b.ins().load(F32, array_flags(), base, (index * 4) as i32)
}

pub(crate) fn store_f32(b: &mut FunctionBuilder, value: Value, base: Value, index: usize) {
    b.ins().store(array_flags(), value, base, (index * 4) as i32);
}

pub(crate) fn load_i32(b: &mut FunctionBuilder, base: Value, index: usize) -> Value {
    b.ins().load(I32, array_flags(), base, (index * 4) as i32)
}

pub(crate) fn store_i32(b: &mut FunctionBuilder, value: Value, base: Value, index: usize) {
    b.ins().store(array_flags(), value, base, (index * 4) as i32);
}

pub(crate) fn store_vec4(b: &mut FunctionBuilder, lanes: [Value; 4], base: Value, first: usize) {
    for (i, lane) in lanes.into_iter().enumerate() {
        store_f32(b, lane, base, first + i);
    }
}

pub(crate) fn store_const_vec4(b: &mut FunctionBuilder, color: [f32; 4], base: Value) {
    for (i, c) in color.into_iter().enumerate() {
        let v = f32const(b, c);
        store_f32(b, v, base, i);
    }
}

pub(crate) fn copy_vec4(b: &mut FunctionBuilder, dst: Value, src: Value) {
    for i in 0..4 {
        let v = load_f32(b, src, i);
        store_f32(b, v, dst, i);
    }
}

/// Address of a fresh 4-byte aligned stack array of `bytes` bytes.
pub(crate) fn stack_array(b: &mut FunctionBuilder, ptr: Type, bytes: u32) -> Value {
    let slot = b.create_sized_stack_slot(StackSlotData::new(StackSlotKind::ExplicitSlot, bytes, 2));
    b.ins().stack_addr(ptr, slot, 0)
}

/// Widens a 32-bit unsigned offset to the pointer type.
pub(crate) fn to_pointer(b: &mut FunctionBuilder, ptr: Type, value: Value) -> Value {
    if ptr.bits() > 32 {
        b.ins().uextend(ptr, value)
    } else {
        value
    }
}

/// Widens a 32-bit signed offset to the pointer type.
pub(crate) fn to_pointer_signed(b: &mut FunctionBuilder, ptr: Type, value: Value) -> Value {
    if ptr.bits() > 32 {
        b.ins().sextend(ptr, value)
    } else {
        value
    }
}

pub(crate) fn call(b: &mut FunctionBuilder, module: &mut JITModule, callee: FuncId, args: &[Value]) {
    let func_ref = module.declare_func_in_func(callee, b.func);
    b.ins().call(func_ref, args);
}

/// Direct call to a function with a single result.
pub(crate) fn call_value(
    b: &mut FunctionBuilder,
    module: &mut JITModule,
    callee: FuncId,
    args: &[Value],
) -> Value {
    let func_ref = module.declare_func_in_func(callee, b.func);
    let inst = b.ins().call(func_ref, args);
    b.inst_results(inst)[0]
}
