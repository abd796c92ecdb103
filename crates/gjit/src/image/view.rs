use std::sync::Arc;

use cranelift_codegen::ir::types::I32;
use cranelift_codegen::ir::{InstBuilder, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::Linkage;
use tracing::debug;

use super::Image;
use crate::error::{GjitError, Result};
use crate::format::{emit_vec4f, Format};
use crate::jit::ir::{f32const, load_i32, store_vec4, to_pointer_signed};
use crate::jit::{Program, ProgramBuilder};
use crate::library::Library;
use crate::types::{ImageType, Swizzle};

/// Compiled texel fetch: integer `coords[0..3]` to four floats in `color`.
pub type ImageViewFn = unsafe extern "C" fn(color: *mut f32, coords: *const i32);

#[derive(Debug, Clone)]
pub struct ImageViewCreateInfo {
    pub image: Arc<Image>,
    /// Format the texels are read as. Must not be wider than the image's.
    pub format: Format,
    pub min_level: u32,
    pub num_levels: u32,
    pub min_layer: u32,
    pub num_layers: u32,
    pub swizzle: [Swizzle; 4],
}

impl ImageViewCreateInfo {
    /// Whole-image view in the image's own format.
    pub fn new(image: Arc<Image>) -> Self {
        Self {
            format: image.format(),
            min_level: 0,
            num_levels: 1,
            min_layer: 0,
            num_layers: 1,
            swizzle: Swizzle::IDENTITY,
            image,
        }
    }

    pub fn with_swizzle(mut self, swizzle: [Swizzle; 4]) -> Self {
        self.swizzle = swizzle;
        self
    }
}

/// An image bound to a compiled fetch function.
///
/// The image's address is baked into the code, so the view keeps the image
/// alive.
pub struct ImageView {
    program: Program,
    func: ImageViewFn,
    image: Arc<Image>,
    format: Format,
    levels: (u32, u32),
    layers: (u32, u32),
    swizzle: [Swizzle; 4],
}

impl ImageView {
    /// # Errors
    ///
    /// [`GjitError::InvalidCreateInfo`] when the view format would address
    /// past the end of the image data.
    pub fn new(library: &Library, info: &ImageViewCreateInfo) -> Result<Self> {
        let image = Arc::clone(&info.image);
        let needed = u64::from(info.format.stride()) * image.size().texel_count();
        if needed > image.data().len() as u64 {
            return Err(GjitError::InvalidCreateInfo(format!(
                "{:?} view needs {needed} bytes, image holds {}",
                info.format,
                image.data().len()
            )));
        }

        let image_type = image.info().image_type;
        let [width, height, _] = image.size().clamped();
        let data = image.data_ptr() as i64;

        let mut pb = ProgramBuilder::new(library.jit(), "image_view", &[]);
        let ptr = pb.pointer_type();
        let sig = pb.signature(&[ptr; 2], &[]);

        pb.function("image_view", Linkage::Export, sig, |b, _, params| {
            let (color, coords) = (params[0], params[1]);
            let index = emit_texel_index(b, image_type, coords, width, height);
            let stride = b.ins().iconst(I32, i64::from(info.format.stride()));
            let offset = b.ins().imul(index, stride);
            let offset = to_pointer_signed(b, ptr, offset);
            let base = b.ins().iconst(ptr, data);
            let addr = b.ins().iadd(base, offset);

            let lanes = emit_vec4f(b, info.format, addr);
            let out = emit_swizzle(b, &info.swizzle, lanes);
            store_vec4(b, out, color, 0);
            b.ins().return_(&[]);
        })?;

        let program = pb.finish()?;
        let raw = program
            .function("image_view")
            .ok_or_else(|| GjitError::Module("image_view entry point missing".to_string()))?;
        // SAFETY: declared as (ptr, ptr) -> () in the C convention.
        let func = unsafe { std::mem::transmute::<*const u8, ImageViewFn>(raw) };

        debug!(
            event = "image_view_created",
            image_type = ?image_type,
            format = ?info.format,
            swizzle = ?info.swizzle,
        );

        Ok(Self {
            program,
            func,
            image,
            format: info.format,
            levels: (info.min_level, info.num_levels),
            layers: (info.min_layer, info.num_layers),
            swizzle: info.swizzle,
        })
    }

    pub fn as_fn(&self) -> ImageViewFn {
        self.func
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn swizzle(&self) -> [Swizzle; 4] {
        self.swizzle
    }

    /// `(min_level, num_levels)`. Recorded only; fetches read level 0.
    pub fn levels(&self) -> (u32, u32) {
        self.levels
    }

    /// `(min_layer, num_layers)`. Recorded only.
    pub fn layers(&self) -> (u32, u32) {
        self.layers
    }

    /// Image extent with zero dimensions counted as one, as passed to samplers.
    pub(crate) fn extent(&self) -> [i32; 3] {
        self.image
            .size()
            .clamped()
            .map(|d| i32::try_from(d).unwrap_or(i32::MAX))
    }

    /// Fetches one texel, or `None` when a coordinate the image type uses is
    /// outside the image.
    pub fn fetch(&self, coords: [i32; 3]) -> Option<[f32; 4]> {
        let used = match self.image.info().image_type {
            ImageType::D1 => 1,
            ImageType::D1Array | ImageType::D2 => 2,
            ImageType::D2Array | ImageType::D3 => 3,
        };
        let extent = self.extent();
        if (0..used).any(|i| coords[i] < 0 || coords[i] >= extent[i]) {
            return None;
        }

        let mut color = [0.0f32; 4];
        // SAFETY: the coordinates address a texel inside the image, whose
        // storage this view keeps alive.
        unsafe { (self.func)(color.as_mut_ptr(), coords.as_ptr()) };
        Some(color)
    }
}

impl std::fmt::Debug for ImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageView")
            .field("program", &self.program)
            .field("image", &self.image)
            .field("format", &self.format)
            .field("swizzle", &self.swizzle)
            .finish()
    }
}

/// Linear texel index from `coords` for the image's dimensionality.
fn emit_texel_index(
    b: &mut FunctionBuilder,
    image_type: ImageType,
    coords: Value,
    width: u32,
    height: u32,
) -> Value {
    let x = load_i32(b, coords, 0);
    match image_type {
        ImageType::D1 => x,
        ImageType::D1Array | ImageType::D2 => {
            let y = load_i32(b, coords, 1);
            let row = b.ins().imul_imm(y, i64::from(width));
            b.ins().iadd(x, row)
        }
        ImageType::D2Array | ImageType::D3 => {
            let y = load_i32(b, coords, 1);
            let z = load_i32(b, coords, 2);
            let plane = b.ins().imul_imm(z, i64::from(height));
            let rows = b.ins().iadd(y, plane);
            let rows = b.ins().imul_imm(rows, i64::from(width));
            b.ins().iadd(x, rows)
        }
    }
}

fn emit_swizzle(b: &mut FunctionBuilder, swizzle: &[Swizzle; 4], lanes: [Value; 4]) -> [Value; 4] {
    swizzle.map(|s| match s {
        Swizzle::R => lanes[0],
        Swizzle::G => lanes[1],
        Swizzle::B => lanes[2],
        Swizzle::A => lanes[3],
        Swizzle::Zero => f32const(b, 0.0),
        Swizzle::One => f32const(b, 1.0),
    })
}
