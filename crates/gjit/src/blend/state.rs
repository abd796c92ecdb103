use std::sync::Arc;

use cranelift_codegen::ir::{InstBuilder, Value};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{FuncId, Linkage};
use tracing::{debug, warn};

use super::library::{factor_signature, factor_symbol, op_signature, op_symbol, Channels};
use super::{BlendAttachment, BlendStateCreateInfo};
use crate::error::{GjitError, Result};
use crate::jit::ir::{call, load_f32, stack_array, store_f32};
use crate::jit::{Program, ProgramBuilder};
use crate::library::Library;
use crate::types::{ColorMask, LogicOp, MAX_ATTACHMENTS};

/// Compiled blend entry point.
///
/// All four arrays hold four `f32`. `res` is only written on channels the
/// color mask enables.
pub type BlendFn =
    unsafe extern "C" fn(res: *mut f32, src: *const f32, dst: *const f32, constant: *const f32);

/// Library functions one enabled attachment calls, in call order.
struct Stages {
    rgb_src: FuncId,
    rgb_dst: FuncId,
    alpha_src: FuncId,
    alpha_dst: FuncId,
    eq_rgb: FuncId,
    eq_alpha: FuncId,
}

/// A compiled blend configuration.
pub struct BlendState {
    program: Program,
    func: BlendFn,
    attachment: BlendAttachment,
    attachment_count: usize,
    logic_op: Option<LogicOp>,
    _library: Arc<Program>,
}

impl BlendState {
    /// Compiles attachment 0 of `info`.
    ///
    /// # Errors
    ///
    /// [`GjitError::InvalidCreateInfo`] for zero or more than
    /// [`MAX_ATTACHMENTS`] attachments, backend errors otherwise.
    pub fn new(library: &Library, info: &BlendStateCreateInfo) -> Result<Self> {
        let count = info.attachments.len();
        let attachment = match info.attachments.first() {
            Some(a) if count <= MAX_ATTACHMENTS => *a,
            _ => {
                return Err(GjitError::InvalidCreateInfo(format!(
                    "blend state needs 1..={MAX_ATTACHMENTS} attachments, got {count}"
                )))
            }
        };

        if count > 1 {
            warn!(
                event = "blend_attachments_ignored",
                attachments = count,
                "only attachment 0 is compiled"
            );
        }
        if attachment.enable && attachment.factors().iter().any(|f| f.is_dual_source()) {
            warn!(
                event = "dual_source_factor",
                factors = ?attachment.factors(),
                "dual-source factors blend as zero"
            );
        }

        let blend_library = Arc::clone(library.blend());
        let mut pb = ProgramBuilder::new(library.jit(), "blend_state", &[blend_library.as_ref()]);
        let ptr = pb.pointer_type();

        let mask_sig = pb.signature(&[ptr; 2], &[]);
        let color_mask = pb.function("color_mask", Linkage::Local, mask_sig, |b, _, params| {
            emit_color_mask(b, attachment.color_mask, params[0], params[1]);
            b.ins().return_(&[]);
        })?;

        let stages = if attachment.enable {
            Some(import_stages(&mut pb, &attachment)?)
        } else {
            None
        };

        let blend_sig = pb.signature(&[ptr; 4], &[]);
        pb.function("blend", Linkage::Export, blend_sig, |b, module, params| {
            let (res, src, dst, constant) = (params[0], params[1], params[2], params[3]);
            match &stages {
                None => {
                    call(b, module, color_mask, &[res, src]);
                }
                Some(s) => {
                    let tmp_src = stack_array(b, ptr, 16);
                    let tmp_dst = stack_array(b, ptr, 16);
                    let tmp_res = stack_array(b, ptr, 16);
                    call(b, module, s.rgb_src, &[tmp_src, src, src, dst, constant]);
                    call(b, module, s.rgb_dst, &[tmp_dst, dst, src, dst, constant]);
                    call(b, module, s.alpha_src, &[tmp_src, src, src, dst, constant]);
                    call(b, module, s.alpha_dst, &[tmp_dst, dst, src, dst, constant]);
                    call(b, module, s.eq_rgb, &[tmp_res, tmp_src, tmp_dst]);
                    call(b, module, s.eq_alpha, &[tmp_res, tmp_src, tmp_dst]);
                    call(b, module, color_mask, &[res, tmp_res]);
                }
            }
            b.ins().return_(&[]);
        })?;

        let program = pb.finish()?;
        let raw = program
            .function("blend")
            .ok_or_else(|| GjitError::Module("blend entry point missing".to_string()))?;
        // SAFETY: `blend` was declared with four pointer parameters and no
        // return value in the default C calling convention.
        let func = unsafe { std::mem::transmute::<*const u8, BlendFn>(raw) };

        debug!(
            event = "blend_state_created",
            enable = attachment.enable,
            color_mask = attachment.color_mask.bits(),
            attachments = count,
        );

        Ok(Self {
            program,
            func,
            attachment,
            attachment_count: count,
            logic_op: info.logic_op,
            _library: blend_library,
        })
    }

    /// Raw entry point for the rasterizer.
    pub fn as_fn(&self) -> BlendFn {
        self.func
    }

    pub fn blend(&self, res: &mut [f32; 4], src: &[f32; 4], dst: &[f32; 4], constant: &[f32; 4]) {
        // SAFETY: every argument is a valid four-float array and `res` is
        // exclusively borrowed.
        unsafe { (self.func)(res.as_mut_ptr(), src.as_ptr(), dst.as_ptr(), constant.as_ptr()) }
    }

    /// The compiled attachment.
    pub fn attachment(&self) -> &BlendAttachment {
        &self.attachment
    }

    pub fn attachment_count(&self) -> usize {
        self.attachment_count
    }

    pub fn logic_op(&self) -> Option<LogicOp> {
        self.logic_op
    }
}

impl std::fmt::Debug for BlendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlendState")
            .field("program", &self.program)
            .field("attachment", &self.attachment)
            .field("attachment_count", &self.attachment_count)
            .field("logic_op", &self.logic_op)
            .finish()
    }
}

fn import_stages(pb: &mut ProgramBuilder, a: &BlendAttachment) -> Result<Stages> {
    let factor_sig = factor_signature(pb);
    let op_sig = op_signature(pb);
    Ok(Stages {
        rgb_src: pb.import(&factor_symbol(Channels::Rgb, a.rgb_src), &factor_sig)?,
        rgb_dst: pb.import(&factor_symbol(Channels::Rgb, a.rgb_dst), &factor_sig)?,
        alpha_src: pb.import(&factor_symbol(Channels::Alpha, a.alpha_src), &factor_sig)?,
        alpha_dst: pb.import(&factor_symbol(Channels::Alpha, a.alpha_dst), &factor_sig)?,
        eq_rgb: pb.import(&op_symbol(Channels::Rgb, a.rgb_op), &op_sig)?,
        eq_alpha: pb.import(&op_symbol(Channels::Alpha, a.alpha_op), &op_sig)?,
    })
}

/// Copies the channels `mask` enables from `src` to `res`.
fn emit_color_mask(b: &mut FunctionBuilder, mask: ColorMask, res: Value, src: Value) {
    for i in (0..4).filter(|&i| mask.writes(i)) {
        let v = load_f32(b, src, i);
        store_f32(b, v, res, i);
    }
}
