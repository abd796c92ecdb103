//! Inline texel decode: raw bytes to four `f32` lanes.

use cranelift_codegen::ir::types::{F32, F64, I32};
use cranelift_codegen::ir::{InstBuilder, Value};
use cranelift_frontend::FunctionBuilder;
use tracing::warn;

use super::{Encoding, Format, Kind, Order, Packing};
use crate::jit::ir::{
    data_flags, f32const, DEFAULT_COLOR, INV_127, INV_15, INV_255, INV_31, INV_32767, INV_63,
    INV_65535,
};

/// Emits code decoding the texel at `data` into `(r, g, b, a)`.
///
/// Lanes the format does not store are `0`, alpha is `1`. Formats that are
/// not decodable produce `(0, 0, 0, 1)` without reading memory.
pub(crate) fn emit_vec4f(b: &mut FunctionBuilder, format: Format, data: Value) -> [Value; 4] {
    let info = format.info();
    let mut lanes: [Option<Value>; 4] = [None; 4];

    match info.kind {
        Kind::Plain { bits, encoding } if format.is_decodable() => {
            let bytes = (bits / 8) as i32;
            for (i, lane) in lanes.iter_mut().take(info.channels as usize).enumerate() {
                *lane = Some(load_channel(b, bits, encoding, data, i as i32 * bytes));
            }
        }
        Kind::Packed(packing) => decode_packed(b, packing, data, &mut lanes),
        _ => warn!(
            event = "unsupported_format",
            format = ?format,
            "format has no float decode, using (0, 0, 0, 1)"
        ),
    }

    reorder(&mut lanes, info.order);

    std::array::from_fn(|i| lanes[i].unwrap_or_else(|| f32const(b, DEFAULT_COLOR[i])))
}

fn load_channel(
    b: &mut FunctionBuilder,
    bits: u8,
    encoding: Encoding,
    data: Value,
    offset: i32,
) -> Value {
    let flags = data_flags();
    match (bits, encoding) {
        (32, Encoding::Sfloat) => b.ins().load(F32, flags, data, offset),
        (64, Encoding::Sfloat) => {
            let wide = b.ins().load(F64, flags, data, offset);
            b.ins().fdemote(F32, wide)
        }
        (8 | 16, _) => {
            let signed = matches!(encoding, Encoding::Snorm | Encoding::Sscaled);
            let raw = match (bits, signed) {
                (8, false) => b.ins().uload8(I32, flags, data, offset),
                (8, true) => b.ins().sload8(I32, flags, data, offset),
                (_, false) => b.ins().uload16(I32, flags, data, offset),
                (_, true) => b.ins().sload16(I32, flags, data, offset),
            };
            let value = if signed {
                b.ins().fcvt_from_sint(F32, raw)
            } else {
                b.ins().fcvt_from_uint(F32, raw)
            };
            match norm_scale(bits, encoding) {
                Some(scale) => {
                    let scale = f32const(b, scale);
                    b.ins().fmul(value, scale)
                }
                None => value,
            }
        }
        _ => f32const(b, 0.0),
    }
}

/// Reciprocal applied to normalized encodings.
fn norm_scale(bits: u8, encoding: Encoding) -> Option<f32> {
    match (bits, encoding) {
        (8, Encoding::Unorm) => Some(INV_255),
        (8, Encoding::Snorm) => Some(INV_127),
        (16, Encoding::Unorm) => Some(INV_65535),
        (16, Encoding::Snorm) => Some(INV_32767),
        _ => None,
    }
}

fn decode_packed(
    b: &mut FunctionBuilder,
    packing: Packing,
    data: Value,
    lanes: &mut [Option<Value>; 4],
) {
    let flags = data_flags();
    let raw = match packing.bytes() {
        1 => b.ins().uload8(I32, flags, data, 0),
        _ => b.ins().uload16(I32, flags, data, 0),
    };
    for (lane, &(shift, bits)) in lanes.iter_mut().zip(packing.channels()) {
        let shifted = if shift > 0 {
            b.ins().ushr_imm(raw, shift as i64)
        } else {
            raw
        };
        let masked = b.ins().band_imm(shifted, (1i64 << bits) - 1);
        let value = b.ins().fcvt_from_uint(F32, masked);
        *lane = Some(match bits {
            1 => value,
            _ => {
                let scale = f32const(b, bit_scale(bits));
                b.ins().fmul(value, scale)
            }
        });
    }
}

fn bit_scale(bits: u8) -> f32 {
    match bits {
        4 => INV_15,
        5 => INV_31,
        6 => INV_63,
        _ => 1.0 / ((1u32 << bits) - 1) as f32,
    }
}

fn reorder<T: Copy>(lanes: &mut [T; 4], order: Order) {
    match order {
        Order::Rgba => {}
        Order::Bgra => lanes.swap(0, 2),
        Order::Argb => rotate_argb(lanes),
        Order::Abgr => {
            rotate_argb(lanes);
            lanes.swap(0, 2);
        }
    }
}

/// `[a, r, g, b]` to `[r, g, b, a]`.
fn rotate_argb<T: Copy>(lanes: &mut [T; 4]) {
    lanes.rotate_left(1);
}
