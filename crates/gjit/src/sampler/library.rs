//! Precompiled wrap, interpolation and per-axis fetch functions.
//!
//! | symbol | signature |
//! |--------|-----------|
//! | `gjit_wrap_<mode>` | `fn(size: i32, value: i32) -> i32` |
//! | `gjit_filter_coord` | `fn(value: f32, int_out: *i32, fract_out: *f32)` |
//! | `gjit_linear_interpolate` | `fn(res, c0, c1: *f32, f: f32)` |
//! | `gjit_cubic_interpolate` | `fn(res, c0, c1, c2, c3: *f32, f: f32)` |
//! | `gjit_<filter>_<axis>` | `fn(color: *f32, fetch: *i32, wrapped: *i32, fract: *f32, border: *f32, image_view: ImageViewFn)` |
//!
//! A wrap function returns `-1` for coordinates that sample the border.
//! `wrapped` holds the wrapped texel coordinates of every tap, grouped by
//! axis: `wrapped[axis * taps + k]`. The `_x` fetch writes the taps of one
//! row into `fetch[0]` and calls `image_view`; higher axes set their own
//! coordinate and recurse into the axis below.

use cranelift_codegen::ir::condcodes::IntCC;
use cranelift_codegen::ir::types::{F32, I32};
use cranelift_codegen::ir::{InstBuilder, SigRef, Signature, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Linkage};

use crate::error::Result;
use crate::jit::ir::{
    array_flags, call, copy_vec4, f32const, load_f32, load_i32, stack_array, store_f32, store_i32,
};
use crate::jit::{JitContext, Program, ProgramBuilder};
use crate::types::{Filter, WrapMode};

pub(crate) const AXES: [&str; 3] = ["x", "y", "z"];

/// Filters with a compiled fetch family. `Filter::None` samples as nearest.
pub(crate) const FILTERS: [Filter; 3] = [Filter::Nearest, Filter::Linear, Filter::Cubic];

pub(crate) fn taps(filter: Filter) -> usize {
    match filter {
        Filter::Linear => 2,
        Filter::Cubic => 4,
        Filter::None | Filter::Nearest => 1,
    }
}

fn filter_name(filter: Filter) -> &'static str {
    match filter {
        Filter::Linear => "linear",
        Filter::Cubic => "cubic",
        Filter::None | Filter::Nearest => "nearest",
    }
}

pub(crate) fn wrap_symbol(mode: WrapMode) -> String {
    format!("gjit_wrap_{}", mode.name())
}

pub(crate) fn fetch_symbol(filter: Filter, axis: usize) -> String {
    format!("gjit_{}_{}", filter_name(filter), AXES[axis])
}

pub(crate) const FILTER_COORD: &str = "gjit_filter_coord";
pub(crate) const LINEAR_INTERPOLATE: &str = "gjit_linear_interpolate";
pub(crate) const CUBIC_INTERPOLATE: &str = "gjit_cubic_interpolate";

pub(crate) fn wrap_signature(pb: &ProgramBuilder) -> Signature {
    pb.signature(&[I32, I32], &[I32])
}

pub(crate) fn filter_coord_signature(pb: &ProgramBuilder) -> Signature {
    let ptr = pb.pointer_type();
    pb.signature(&[F32, ptr, ptr], &[])
}

pub(crate) fn fetch_signature(pb: &ProgramBuilder) -> Signature {
    let ptr = pb.pointer_type();
    pb.signature(&[ptr; 6], &[])
}

pub(crate) fn build(jit: &JitContext) -> Result<Program> {
    let mut pb = ProgramBuilder::new(jit, "sampler_library", &[]);

    for mode in WrapMode::ALL {
        let sig = wrap_signature(&pb);
        pb.function(&wrap_symbol(mode), Linkage::Export, sig, |b, _, params| {
            let wrapped = emit_wrap(b, mode, params[0], params[1]);
            b.ins().return_(&[wrapped]);
        })?;
    }

    let sig = filter_coord_signature(&pb);
    pb.function(FILTER_COORD, Linkage::Export, sig, |b, _, params| {
        emit_filter_coord(b, params[0], params[1], params[2]);
        b.ins().return_(&[]);
    })?;

    let ptr = pb.pointer_type();
    let sig = pb.signature(&[ptr, ptr, ptr, F32], &[]);
    let linear = pb.function(LINEAR_INTERPOLATE, Linkage::Export, sig, |b, _, params| {
        emit_linear_interpolate(b, params[0], params[1], params[2], params[3]);
        b.ins().return_(&[]);
    })?;

    let sig = pb.signature(&[ptr, ptr, ptr, ptr, ptr, F32], &[]);
    let cubic = pb.function(CUBIC_INTERPOLATE, Linkage::Export, sig, |b, _, params| {
        emit_cubic_interpolate(b, params[0], [params[1], params[2], params[3], params[4]], params[5]);
        b.ins().return_(&[]);
    })?;

    for filter in FILTERS {
        let interpolate = match filter {
            Filter::Linear => Some(linear),
            Filter::Cubic => Some(cubic),
            _ => None,
        };
        let mut lower: Option<FuncId> = None;
        for axis in 0..AXES.len() {
            let sig = fetch_signature(&pb);
            let image_view_sig = pb.signature(&[ptr, ptr], &[]);
            let id = pb.function(
                &fetch_symbol(filter, axis),
                Linkage::Export,
                sig,
                |b, module, params| {
                    let fetch = FetchAxis {
                        taps: taps(filter),
                        axis,
                        lower,
                        interpolate,
                    };
                    fetch.emit(b, module, params, image_view_sig);
                    b.ins().return_(&[]);
                },
            )?;
            lower = Some(id);
        }
    }

    pb.finish()
}

/// `value` mapped into `[0, size)`, or `-1` for the border.
fn emit_wrap(b: &mut FunctionBuilder, mode: WrapMode, size: Value, value: Value) -> Value {
    let zero = b.ins().iconst(I32, 0);
    let last = b.ins().iadd_imm(size, -1);
    match mode {
        WrapMode::ClampToEdge => {
            let v = b.ins().smax(value, zero);
            b.ins().smin(v, last)
        }
        WrapMode::ClampToBorder => {
            let outside = b.ins().icmp(IntCC::UnsignedGreaterThanOrEqual, value, size);
            let border = b.ins().iconst(I32, -1);
            b.ins().select(outside, border, value)
        }
        WrapMode::Repeat => emit_positive_rem(b, value, size),
        WrapMode::MirroredRepeat => {
            let period = b.ins().iadd(size, size);
            let m = emit_positive_rem(b, value, period);
            let reflected = b.ins().iadd_imm(period, -1);
            let reflected = b.ins().isub(reflected, m);
            let upper = b.ins().icmp(IntCC::SignedGreaterThanOrEqual, m, size);
            b.ins().select(upper, reflected, m)
        }
        WrapMode::MirrorClampToEdge => {
            // Mirrored once about the texel 0 edge: -1 -> 0, -2 -> 1, then
            // clamped. Negation (-1 -> 1) would repeat texel 0 at the edge.
            let negative = b.ins().icmp(IntCC::SignedLessThan, value, zero);
            let flipped = b.ins().bnot(value);
            let m = b.ins().select(negative, flipped, value);
            b.ins().smin(m, last)
        }
    }
}

/// `value mod modulus` in `[0, modulus)`.
fn emit_positive_rem(b: &mut FunctionBuilder, value: Value, modulus: Value) -> Value {
    let rem = b.ins().srem(value, modulus);
    let zero = b.ins().iconst(I32, 0);
    let negative = b.ins().icmp(IntCC::SignedLessThan, rem, zero);
    let shifted = b.ins().iadd(rem, modulus);
    b.ins().select(negative, shifted, rem)
}

/// Splits `value - 0.5` into its floor and a fraction in `[0, 1)`.
fn emit_filter_coord(b: &mut FunctionBuilder, value: Value, int_out: Value, fract_out: Value) {
    let half = f32const(b, 0.5);
    let v = b.ins().fsub(value, half);
    let floor = b.ins().floor(v);
    let fract = b.ins().fsub(v, floor);
    let int = b.ins().fcvt_to_sint_sat(I32, floor);
    b.ins().store(array_flags(), int, int_out, 0);
    b.ins().store(array_flags(), fract, fract_out, 0);
}

fn emit_linear_interpolate(b: &mut FunctionBuilder, res: Value, c0: Value, c1: Value, f: Value) {
    let one = f32const(b, 1.0);
    let inv = b.ins().fsub(one, f);
    for i in 0..4 {
        let a = load_f32(b, c0, i);
        let c = load_f32(b, c1, i);
        let a = b.ins().fmul(a, inv);
        let c = b.ins().fmul(c, f);
        let v = b.ins().fadd(a, c);
        store_f32(b, v, res, i);
    }
}

/// Cubic Hermite through `c1` and `c2` with tangents `c1 - c0` and `c3 - c2`.
///
/// Evaluated in Horner form so that `f = 0` yields `c1` exactly.
fn emit_cubic_interpolate(b: &mut FunctionBuilder, res: Value, c: [Value; 4], f: Value) {
    let two = f32const(b, 2.0);
    let three = f32const(b, 3.0);
    for i in 0..4 {
        let [c0, c1, c2, c3] = c.map(|p| load_f32(b, p, i));
        let (p0, p1) = (c1, c2);
        let m0 = b.ins().fsub(c1, c0);
        let m1 = b.ins().fsub(c3, c2);

        // a = 2p0 + m0 - 2p1 + m1
        let two_p0 = b.ins().fmul(two, p0);
        let two_p1 = b.ins().fmul(two, p1);
        let a = b.ins().fadd(two_p0, m0);
        let a = b.ins().fsub(a, two_p1);
        let a = b.ins().fadd(a, m1);

        // b = -3p0 - 2m0 + 3p1 - m1
        let three_p0 = b.ins().fmul(three, p0);
        let three_p1 = b.ins().fmul(three, p1);
        let two_m0 = b.ins().fmul(two, m0);
        let bq = b.ins().fsub(three_p1, three_p0);
        let bq = b.ins().fsub(bq, two_m0);
        let bq = b.ins().fsub(bq, m1);

        let v = b.ins().fmul(a, f);
        let v = b.ins().fadd(v, bq);
        let v = b.ins().fmul(v, f);
        let v = b.ins().fadd(v, m0);
        let v = b.ins().fmul(v, f);
        let v = b.ins().fadd(v, p0);
        store_f32(b, v, res, i);
    }
}

/// What a tap that is not on the border calls.
#[derive(Clone, Copy)]
enum Callee {
    Lower(FuncId),
    ImageView(SigRef),
}

/// Body of one `gjit_<filter>_<axis>` function.
struct FetchAxis {
    taps: usize,
    axis: usize,
    lower: Option<FuncId>,
    interpolate: Option<FuncId>,
}

impl FetchAxis {
    fn emit(
        &self,
        b: &mut FunctionBuilder,
        module: &mut JITModule,
        params: &[Value],
        image_view_sig: Signature,
    ) {
        let [color, fetch, wrapped, fract, border, image_view] =
            [params[0], params[1], params[2], params[3], params[4], params[5]];
        let ptr = b.func.dfg.value_type(color);

        let tmp = match self.taps {
            1 => None,
            n => Some(stack_array(b, ptr, (n * 16) as u32)),
        };
        let callee = match self.lower {
            Some(lower) => Callee::Lower(lower),
            None => Callee::ImageView(b.import_signature(image_view_sig)),
        };

        for k in 0..self.taps {
            let out = match tmp {
                Some(tmp) => b.ins().iadd_imm(tmp, (k * 16) as i64),
                None => color,
            };
            let coord = load_i32(b, wrapped, self.axis * self.taps + k);

            let border_block = b.create_block();
            let fetch_block = b.create_block();
            let next = b.create_block();
            let zero = b.ins().iconst(I32, 0);
            let is_border = b.ins().icmp(IntCC::SignedLessThan, coord, zero);
            b.ins().brif(is_border, border_block, &[], fetch_block, &[]);

            b.switch_to_block(border_block);
            copy_vec4(b, out, border);
            b.ins().jump(next, &[]);

            b.switch_to_block(fetch_block);
            store_i32(b, coord, fetch, self.axis);
            match callee {
                Callee::Lower(lower) => {
                    call(b, module, lower, &[out, fetch, wrapped, fract, border, image_view]);
                }
                Callee::ImageView(sig) => {
                    b.ins().call_indirect(sig, image_view, &[out, fetch]);
                }
            }
            b.ins().jump(next, &[]);

            b.switch_to_block(next);
        }

        if let (Some(tmp), Some(interpolate)) = (tmp, self.interpolate) {
            let f = load_f32(b, fract, self.axis);
            let mut args = vec![color];
            for k in 0..self.taps {
                args.push(b.ins().iadd_imm(tmp, (k * 16) as i64));
            }
            args.push(f);
            call(b, module, interpolate, &args);
        }
    }
}
