use std::sync::Arc;

use cranelift_codegen::ir::types::I32;
use cranelift_codegen::ir::{InstBuilder, Type, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Linkage};
use tracing::{debug, warn};

use super::library::{
    fetch_signature, fetch_symbol, filter_coord_signature, taps, wrap_signature, wrap_symbol,
    FILTER_COORD,
};
use super::SamplerCreateInfo;
use crate::error::{GjitError, Result};
use crate::image::{ImageView, ImageViewFn};
use crate::jit::ir::{
    call, call_value, load_f32, load_i32, stack_array, store_const_vec4, store_i32,
};
use crate::jit::{Program, ProgramBuilder};
use crate::library::Library;
use crate::types::Filter;

/// Compiled sample entry point.
///
/// `coords` holds three texel-space floats, `size` the three image
/// dimensions. The result goes to `color[0..4]`.
pub type SampleFn = unsafe extern "C" fn(
    color: *mut f32,
    coords: *const f32,
    size: *const i32,
    image_view: ImageViewFn,
);

/// Filtered axes of the compiled entry point.
const SAMPLED_AXES: usize = 2;

/// A compiled sampler configuration.
pub struct Sampler {
    program: Program,
    func: SampleFn,
    info: SamplerCreateInfo,
    filter: Filter,
    _library: Arc<Program>,
}

impl Sampler {
    pub fn new(library: &Library, info: &SamplerCreateInfo) -> Result<Self> {
        let filter = match info.mag_filter {
            Filter::None => {
                warn!(event = "sampler_filter_fallback", "filter none samples as nearest");
                Filter::Nearest
            }
            f => f,
        };

        let sampler_library = Arc::clone(library.sampler());
        let mut pb = ProgramBuilder::new(library.jit(), "sampler", &[sampler_library.as_ref()]);
        let ptr = pb.pointer_type();

        let wrap_sig = wrap_signature(&pb);
        let mut wrap = Vec::with_capacity(SAMPLED_AXES);
        for mode in &info.wrap[..SAMPLED_AXES] {
            wrap.push(pb.import(&wrap_symbol(*mode), &wrap_sig)?);
        }
        let filter_coord = match filter {
            Filter::Linear | Filter::Cubic => {
                Some(pb.import(FILTER_COORD, &filter_coord_signature(&pb))?)
            }
            _ => None,
        };
        let fetch = pb.import(&fetch_symbol(filter, SAMPLED_AXES - 1), &fetch_signature(&pb))?;

        let sig = pb.signature(&[ptr; 4], &[]);
        let setup = Setup {
            filter,
            wrap,
            filter_coord,
            border_color: info.border_color,
        };
        pb.function("sample", Linkage::Export, sig, |b, module, params| {
            let (color, coords, size, image_view) = (params[0], params[1], params[2], params[3]);
            let arrays = setup.emit(b, module, ptr, coords, size);
            call(
                b,
                module,
                fetch,
                &[color, arrays.fetch, arrays.wrapped, arrays.fract, arrays.border, image_view],
            );
            b.ins().return_(&[]);
        })?;

        let program = pb.finish()?;
        let raw = program
            .function("sample")
            .ok_or_else(|| GjitError::Module("sample entry point missing".to_string()))?;
        // SAFETY: declared as four pointers returning nothing, C convention.
        let func = unsafe { std::mem::transmute::<*const u8, SampleFn>(raw) };

        debug!(
            event = "sampler_created",
            filter = ?filter,
            wrap = ?info.wrap,
            compare = info.compare_enable,
        );

        Ok(Self {
            program,
            func,
            info: *info,
            filter,
            _library: sampler_library,
        })
    }

    pub fn as_fn(&self) -> SampleFn {
        self.func
    }

    pub fn info(&self) -> &SamplerCreateInfo {
        &self.info
    }

    /// Filter the entry point was compiled with.
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Samples `view` at normalized `coord`.
    pub fn sample(&self, view: &ImageView, coord: [f32; 3]) -> [f32; 4] {
        let size = view.extent();
        let texel: [f32; 3] = std::array::from_fn(|i| coord[i] * size[i] as f32);
        let mut color = [0.0f32; 4];
        // SAFETY: wrapping keeps every fetched coordinate inside `size`, which
        // is the extent of the image `view` reads and keeps alive.
        unsafe { (self.func)(color.as_mut_ptr(), texel.as_ptr(), size.as_ptr(), view.as_fn()) };
        color
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("program", &self.program)
            .field("filter", &self.filter)
            .field("wrap", &self.info.wrap)
            .finish()
    }
}

/// Scratch arrays handed to the library fetch.
struct FetchArrays {
    fetch: Value,
    wrapped: Value,
    fract: Value,
    border: Value,
}

/// Per-axis coordinate setup ahead of the fetch.
struct Setup {
    filter: Filter,
    wrap: Vec<FuncId>,
    filter_coord: Option<FuncId>,
    border_color: [f32; 4],
}

impl Setup {
    fn emit(
        &self,
        b: &mut FunctionBuilder,
        module: &mut JITModule,
        ptr: Type,
        coords: Value,
        size: Value,
    ) -> FetchArrays {
        let taps = taps(self.filter);
        let coord_int = stack_array(b, ptr, 12);
        let fract = stack_array(b, ptr, 12);
        let fetch = stack_array(b, ptr, 12);
        let wrapped = stack_array(b, ptr, (3 * taps * 4) as u32);
        let border = stack_array(b, ptr, 16);

        store_const_vec4(b, self.border_color, border);
        let zero = b.ins().iconst(I32, 0);
        for i in 0..3 {
            store_i32(b, zero, fetch, i);
        }

        for (axis, &wrap) in self.wrap.iter().enumerate() {
            let extent = load_i32(b, size, axis);
            let coord = load_f32(b, coords, axis);

            let first = match self.filter_coord {
                Some(split) => {
                    let int_out = b.ins().iadd_imm(coord_int, (axis * 4) as i64);
                    let fract_out = b.ins().iadd_imm(fract, (axis * 4) as i64);
                    call(b, module, split, &[coord, int_out, fract_out]);
                    let base = load_i32(b, coord_int, axis);
                    match self.filter {
                        Filter::Cubic => b.ins().iadd_imm(base, -1),
                        _ => base,
                    }
                }
                None => {
                    let floor = b.ins().floor(coord);
                    b.ins().fcvt_to_sint_sat(I32, floor)
                }
            };

            for k in 0..taps {
                let texel = match k {
                    0 => first,
                    _ => b.ins().iadd_imm(first, k as i64),
                };
                let w = call_value(b, module, wrap, &[extent, texel]);
                store_i32(b, w, wrapped, axis * taps + k);
            }
        }

        FetchArrays {
            fetch,
            wrapped,
            fract,
            border,
        }
    }
}
