//! Pipeline enums, limits and the host structures compiled code reads.

use crate::error::{GjitError, Result};

pub const MAX_ATTACHMENTS: usize = 32;
pub const MAX_ATTRIBS: usize = 32;
pub const MAX_VERTEX_BUFFERS: usize = 32;
pub const MAX_TEXTURE_IMAGE_UNITS: usize = 32;

/// Blend factor applied to a source or destination operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
    Src1Color,
    OneMinusSrc1Color,
    Src1Alpha,
    OneMinusSrc1Alpha,
}

impl BlendFactor {
    pub const ALL: [BlendFactor; 19] = [
        BlendFactor::Zero,
        BlendFactor::One,
        BlendFactor::SrcColor,
        BlendFactor::OneMinusSrcColor,
        BlendFactor::DstColor,
        BlendFactor::OneMinusDstColor,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha,
        BlendFactor::ConstantColor,
        BlendFactor::OneMinusConstantColor,
        BlendFactor::ConstantAlpha,
        BlendFactor::OneMinusConstantAlpha,
        BlendFactor::SrcAlphaSaturate,
        BlendFactor::Src1Color,
        BlendFactor::OneMinusSrc1Color,
        BlendFactor::Src1Alpha,
        BlendFactor::OneMinusSrc1Alpha,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendFactor::Zero => "zero",
            BlendFactor::One => "one",
            BlendFactor::SrcColor => "src_color",
            BlendFactor::OneMinusSrcColor => "one_minus_src_color",
            BlendFactor::DstColor => "dst_color",
            BlendFactor::OneMinusDstColor => "one_minus_dst_color",
            BlendFactor::SrcAlpha => "src_alpha",
            BlendFactor::OneMinusSrcAlpha => "one_minus_src_alpha",
            BlendFactor::DstAlpha => "dst_alpha",
            BlendFactor::OneMinusDstAlpha => "one_minus_dst_alpha",
            BlendFactor::ConstantColor => "constant_color",
            BlendFactor::OneMinusConstantColor => "one_minus_constant_color",
            BlendFactor::ConstantAlpha => "constant_alpha",
            BlendFactor::OneMinusConstantAlpha => "one_minus_constant_alpha",
            BlendFactor::SrcAlphaSaturate => "src_alpha_saturate",
            BlendFactor::Src1Color => "src1_color",
            BlendFactor::OneMinusSrc1Color => "one_minus_src1_color",
            BlendFactor::Src1Alpha => "src1_alpha",
            BlendFactor::OneMinusSrc1Alpha => "one_minus_src1_alpha",
        }
    }

    /// Dual-source factors, compiled as [`BlendFactor::Zero`].
    pub fn is_dual_source(self) -> bool {
        matches!(
            self,
            BlendFactor::Src1Color
                | BlendFactor::OneMinusSrc1Color
                | BlendFactor::Src1Alpha
                | BlendFactor::OneMinusSrc1Alpha
        )
    }
}

/// Equation combining the scaled source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOp {
    pub const ALL: [BlendOp; 5] = [
        BlendOp::Add,
        BlendOp::Subtract,
        BlendOp::ReverseSubtract,
        BlendOp::Min,
        BlendOp::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendOp::Add => "add",
            BlendOp::Subtract => "subtract",
            BlendOp::ReverseSubtract => "reverse_subtract",
            BlendOp::Min => "min",
            BlendOp::Max => "max",
        }
    }
}

/// Per-channel color write mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorMask(u8);

impl ColorMask {
    pub const NONE: ColorMask = ColorMask(0);
    pub const R: ColorMask = ColorMask(1);
    pub const G: ColorMask = ColorMask(2);
    pub const B: ColorMask = ColorMask(4);
    pub const A: ColorMask = ColorMask(8);
    pub const ALL: ColorMask = ColorMask(0xF);

    pub const fn from_bits(bits: u8) -> Self {
        ColorMask(bits & 0xF)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether channel `index` (0 = R .. 3 = A) is written.
    pub const fn writes(self, index: usize) -> bool {
        index < 4 && self.0 & (1 << index) != 0
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        ColorMask::ALL
    }
}

impl std::ops::BitOr for ColorMask {
    type Output = ColorMask;

    fn bitor(self, rhs: ColorMask) -> ColorMask {
        ColorMask(self.0 | rhs.0)
    }
}

/// Framebuffer logic operation. Recorded on blend states, not compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    Clear,
    Set,
    Copy,
    CopyInverted,
    Noop,
    Invert,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Equiv,
    AndReverse,
    AndInverted,
    OrReverse,
    OrInverted,
}

/// Depth-compare function. Recorded on samplers, not compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareOp {
    #[default]
    Never,
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
    NotEqual,
    Always,
}

/// Out-of-range texel coordinate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

impl WrapMode {
    pub const ALL: [WrapMode; 5] = [
        WrapMode::Repeat,
        WrapMode::MirroredRepeat,
        WrapMode::ClampToEdge,
        WrapMode::ClampToBorder,
        WrapMode::MirrorClampToEdge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WrapMode::Repeat => "repeat",
            WrapMode::MirroredRepeat => "mirrored_repeat",
            WrapMode::ClampToEdge => "clamp_to_edge",
            WrapMode::ClampToBorder => "clamp_to_border",
            WrapMode::MirrorClampToEdge => "mirror_clamp_to_edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    None,
    #[default]
    Nearest,
    Linear,
    Cubic,
}

/// Image dimensionality, which fixes how texel coordinates are linearized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    D1,
    D1Array,
    #[default]
    D2,
    D2Array,
    D3,
}

/// Source of one output channel of an image view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swizzle {
    R,
    G,
    B,
    A,
    Zero,
    One,
}

impl Swizzle {
    pub const IDENTITY: [Swizzle; 4] = [Swizzle::R, Swizzle::G, Swizzle::B, Swizzle::A];
}

/// Image extent in texels. A zero dimension counts as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Extent {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Dimensions with zero replaced by one.
    pub fn clamped(self) -> [u32; 3] {
        [self.x.max(1), self.y.max(1), self.z.max(1)]
    }

    pub fn texel_count(self) -> u64 {
        let [x, y, z] = self.clamped();
        x as u64 * y as u64 * z as u64
    }
}

/// Raw storage read by compiled input layouts.
///
/// Only `data` and `size` are visible to compiled code; the layout of those
/// two fields is fixed by `repr(C)`.
#[repr(C)]
pub struct Buffer {
    pub(crate) data: *mut u8,
    pub(crate) size: u32,
    storage: Box<[u8]>,
}

// SAFETY: `data` points into `storage`, which the buffer owns.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Zero-filled buffer of `size` bytes.
    pub fn new(size: u32) -> Self {
        Self::from_storage(vec![0u8; size as usize].into_boxed_slice())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if u32::try_from(bytes.len()).is_err() {
            return Err(GjitError::OutOfRange(format!(
                "buffer of {} bytes exceeds 32-bit addressing",
                bytes.len()
            )));
        }
        Ok(Self::from_storage(bytes.into()))
    }

    fn from_storage(mut storage: Box<[u8]>) -> Self {
        Self {
            data: storage.as_mut_ptr(),
            size: storage.len() as u32,
            storage,
        }
    }

    pub fn len(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Copies `bytes` into the buffer at `offset`.
    pub fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        let start = offset as usize;
        let end = start
            .checked_add(bytes.len())
            .filter(|&end| end <= self.storage.len())
            .ok_or_else(|| {
                GjitError::OutOfRange(format!(
                    "write of {} bytes at {offset} into buffer of {} bytes",
                    bytes.len(),
                    self.size
                ))
            })?;
        self.storage[start..end].copy_from_slice(bytes);
        // the unique borrow above retires any earlier pointer into storage
        self.data = self.storage.as_mut_ptr();
        Ok(())
    }

    pub(crate) fn as_ptr(&self) -> *const Buffer {
        self as *const Buffer
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("size", &self.size).finish()
    }
}

/// Vertex buffer slot as seen by compiled input layouts.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VertexBuffer {
    pub stride: u32,
    pub offset: u32,
    pub buffer: *const Buffer,
}

impl VertexBuffer {
    /// A slot with no buffer. Compiled code must not read through it.
    pub const UNBOUND: VertexBuffer = VertexBuffer {
        stride: 0,
        offset: 0,
        buffer: std::ptr::null(),
    };

    /// Points at `buffer`, which must outlive every call made with this slot.
    pub fn new(buffer: &Buffer, stride: u32, offset: u32) -> Self {
        Self {
            stride,
            offset,
            buffer: buffer.as_ptr(),
        }
    }
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::UNBOUND
    }
}
