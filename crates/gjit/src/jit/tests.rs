use cranelift_codegen::ir::types::I32;
use cranelift_codegen::ir::InstBuilder;
use cranelift_module::Linkage;

use super::ir::call_value;
use super::*;
use crate::config::{CodegenConfig, OptLevel};
use crate::error::GjitError;
use crate::test_utils::{init_tracing, library};

type BinaryFn = unsafe extern "C" fn(i32, i32) -> i32;

fn context() -> JitContext {
    init_tracing();
    JitContext::new(&CodegenConfig::default()).unwrap()
}

#[test]
fn test_bootstrap_reports_host() {
    let jit = context();

    assert!(!jit.isa_name().is_empty());
    assert_eq!(jit.pointer_type().bytes() as usize, std::mem::size_of::<usize>());
    assert_eq!(jit.config().opt_level, OptLevel::SpeedAndSize);
}

#[test]
fn test_bootstrap_rejects_unknown_isa_flag() {
    let config = CodegenConfig::default().with_isa_flag("has_teleport");

    let err = JitContext::new(&config).unwrap_err();

    assert!(matches!(err, GjitError::Isa(_)));
}

#[test]
fn test_every_opt_level_bootstraps() {
    for level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
        let config = CodegenConfig::default().with_opt_level(level);
        assert!(JitContext::new(&config).is_ok(), "{level:?}");
    }
}

#[test]
fn test_program_exports_function() {
    let jit = context();
    let mut pb = ProgramBuilder::new(&jit, "test", &[]);
    let sig = pb.signature(&[I32, I32], &[I32]);
    pb.function("sub", Linkage::Export, sig, |b, _, params| {
        let v = b.ins().isub(params[0], params[1]);
        b.ins().return_(&[v]);
    })
    .unwrap();

    let program = pb.finish().unwrap();
    let sub = unsafe { std::mem::transmute::<*const u8, BinaryFn>(program.function("sub").unwrap()) };

    assert_eq!(unsafe { sub(7, 10) }, -3);
    assert_eq!(program.export_count(), 1);
    assert_eq!(program.kind(), "test");
}

#[test]
fn test_local_functions_are_not_exported() {
    let jit = context();
    let mut pb = ProgramBuilder::new(&jit, "test", &[]);
    let sig = pb.signature(&[I32, I32], &[I32]);
    let add = pb
        .function("add", Linkage::Local, sig.clone(), |b, _, params| {
            let v = b.ins().iadd(params[0], params[1]);
            b.ins().return_(&[v]);
        })
        .unwrap();
    pb.function("add_twice", Linkage::Export, sig, |b, module, params| {
        let once = call_value(b, module, add, &[params[0], params[1]]);
        let twice = call_value(b, module, add, &[once, params[1]]);
        b.ins().return_(&[twice]);
    })
    .unwrap();

    let program = pb.finish().unwrap();
    let f = unsafe {
        std::mem::transmute::<*const u8, BinaryFn>(program.function("add_twice").unwrap())
    };

    assert!(program.function("add").is_none());
    assert_eq!(unsafe { f(1, 5) }, 11);
}

#[test]
fn test_program_imports_from_another_program() {
    let jit = context();
    let mut lib = ProgramBuilder::new(&jit, "lib", &[]);
    let sig = lib.signature(&[I32, I32], &[I32]);
    lib.function("test_mul", Linkage::Export, sig.clone(), |b, _, params| {
        let v = b.ins().imul(params[0], params[1]);
        b.ins().return_(&[v]);
    })
    .unwrap();
    let lib = lib.finish().unwrap();

    let mut pb = ProgramBuilder::new(&jit, "user", &[&lib]);
    let mul = pb.import("test_mul", &sig).unwrap();
    pb.function("square", Linkage::Export, sig, |b, module, params| {
        let v = call_value(b, module, mul, &[params[0], params[0]]);
        b.ins().return_(&[v]);
    })
    .unwrap();
    let program = pb.finish().unwrap();
    let square =
        unsafe { std::mem::transmute::<*const u8, BinaryFn>(program.function("square").unwrap()) };

    assert_eq!(unsafe { square(9, 0) }, 81);
}

#[test]
fn test_library_exports() {
    let library = library();

    // 19 factors and 5 equations, each for RGB and alpha.
    assert_eq!(library.blend().export_count(), 2 * (19 + 5));
    // 5 wraps, filter coord, 2 interpolators, 3 filters x 3 axes.
    assert_eq!(library.sampler().export_count(), 5 + 1 + 2 + 9);
    assert!(library.sampler().function("gjit_cubic_z").is_some());
    assert!(library.blend().function("gjit_blend_alpha_src_alpha_saturate").is_some());
}
