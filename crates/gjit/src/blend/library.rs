//! Precompiled blend factor and equation functions.
//!
//! Factor functions: `fn(res, org, src, dst, constant)`, all `*f32`. The RGB
//! variant writes `res[0..3]`, the alpha variant writes `res[3]`.
//!
//! Equation functions: `fn(res, src, dst)`, same channel split.

use cranelift_codegen::ir::condcodes::FloatCC;
use cranelift_codegen::ir::{InstBuilder, Signature, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::Linkage;

use crate::error::Result;
use crate::jit::ir::{f32const, load_f32, store_f32};
use crate::jit::{JitContext, Program, ProgramBuilder};
use crate::types::{BlendFactor, BlendOp};

/// Channels written by a function variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channels {
    Rgb,
    Alpha,
}

impl Channels {
    fn range(self) -> std::ops::Range<usize> {
        match self {
            Channels::Rgb => 0..3,
            Channels::Alpha => 3..4,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Channels::Rgb => "rgb",
            Channels::Alpha => "alpha",
        }
    }
}

pub(crate) fn factor_symbol(channels: Channels, factor: BlendFactor) -> String {
    format!("gjit_blend_{}_{}", channels.prefix(), factor.name())
}

pub(crate) fn op_symbol(channels: Channels, op: BlendOp) -> String {
    format!("gjit_blend_eq_{}_{}", channels.prefix(), op.name())
}

pub(crate) fn factor_signature(pb: &ProgramBuilder) -> Signature {
    let ptr = pb.pointer_type();
    pb.signature(&[ptr; 5], &[])
}

pub(crate) fn op_signature(pb: &ProgramBuilder) -> Signature {
    let ptr = pb.pointer_type();
    pb.signature(&[ptr; 3], &[])
}

/// Compiles every factor and equation variant into one program.
pub(crate) fn build(jit: &JitContext) -> Result<Program> {
    let mut pb = ProgramBuilder::new(jit, "blend_library", &[]);

    for channels in [Channels::Rgb, Channels::Alpha] {
        for factor in BlendFactor::ALL {
            let sig = factor_signature(&pb);
            pb.function(
                &factor_symbol(channels, factor),
                Linkage::Export,
                sig,
                |b, _, params| {
                    emit_factor(b, factor, channels, params);
                    b.ins().return_(&[]);
                },
            )?;
        }
        for op in BlendOp::ALL {
            let sig = op_signature(&pb);
            pb.function(&op_symbol(channels, op), Linkage::Export, sig, |b, _, params| {
                emit_op(b, op, channels, params);
                b.ins().return_(&[]);
            })?;
        }
    }

    pb.finish()
}

/// What `org` is multiplied by.
enum Weight {
    Zero,
    One,
    Scale(Value),
}

fn emit_factor(b: &mut FunctionBuilder, factor: BlendFactor, channels: Channels, params: &[Value]) {
    let (res, org, src, dst, constant) = (params[0], params[1], params[2], params[3], params[4]);

    let saturate = (factor == BlendFactor::SrcAlphaSaturate).then(|| {
        let one = f32const(b, 1.0);
        let src_a = load_f32(b, src, 3);
        let dst_a = load_f32(b, dst, 3);
        let inv_dst_a = b.ins().fsub(one, dst_a);
        let take_src = b.ins().fcmp(FloatCC::LessThanOrEqual, src_a, inv_dst_a);
        b.ins().select(take_src, src_a, inv_dst_a)
    });

    for i in channels.range() {
        let weight = match factor {
            BlendFactor::Zero
            | BlendFactor::Src1Color
            | BlendFactor::OneMinusSrc1Color
            | BlendFactor::Src1Alpha
            | BlendFactor::OneMinusSrc1Alpha => Weight::Zero,
            BlendFactor::One => Weight::One,
            BlendFactor::SrcColor => Weight::Scale(load_f32(b, src, i)),
            BlendFactor::OneMinusSrcColor => one_minus(b, src, i),
            BlendFactor::DstColor => Weight::Scale(load_f32(b, dst, i)),
            BlendFactor::OneMinusDstColor => one_minus(b, dst, i),
            BlendFactor::SrcAlpha => Weight::Scale(load_f32(b, src, 3)),
            BlendFactor::OneMinusSrcAlpha => one_minus(b, src, 3),
            BlendFactor::DstAlpha => Weight::Scale(load_f32(b, dst, 3)),
            BlendFactor::OneMinusDstAlpha => one_minus(b, dst, 3),
            BlendFactor::ConstantColor => Weight::Scale(load_f32(b, constant, i)),
            BlendFactor::OneMinusConstantColor => one_minus(b, constant, i),
            BlendFactor::ConstantAlpha => Weight::Scale(load_f32(b, constant, 3)),
            BlendFactor::OneMinusConstantAlpha => one_minus(b, constant, 3),
            BlendFactor::SrcAlphaSaturate => match saturate {
                Some(s) => Weight::Scale(s),
                None => Weight::Zero,
            },
        };

        let value = match weight {
            Weight::Zero => f32const(b, 0.0),
            Weight::One => load_f32(b, org, i),
            Weight::Scale(w) => {
                let o = load_f32(b, org, i);
                b.ins().fmul(o, w)
            }
        };
        store_f32(b, value, res, i);
    }
}

fn one_minus(b: &mut FunctionBuilder, base: Value, index: usize) -> Weight {
    let one = f32const(b, 1.0);
    let v = load_f32(b, base, index);
    Weight::Scale(b.ins().fsub(one, v))
}

fn emit_op(b: &mut FunctionBuilder, op: BlendOp, channels: Channels, params: &[Value]) {
    let (res, src, dst) = (params[0], params[1], params[2]);

    for i in channels.range() {
        let s = load_f32(b, src, i);
        let d = load_f32(b, dst, i);
        let value = match op {
            BlendOp::Add => b.ins().fadd(s, d),
            BlendOp::Subtract => b.ins().fsub(s, d),
            BlendOp::ReverseSubtract => b.ins().fsub(d, s),
            BlendOp::Min => {
                let take_src = b.ins().fcmp(FloatCC::LessThanOrEqual, s, d);
                b.ins().select(take_src, s, d)
            }
            BlendOp::Max => {
                let take_src = b.ins().fcmp(FloatCC::GreaterThanOrEqual, s, d);
                b.ins().select(take_src, s, d)
            }
        };
        store_f32(b, value, res, i);
    }
}
