//! Pixel formats and the texel decode generator.
//!
//! [`Format`] covers every layout the driver can store. Only a subset is
//! decodable to floats by compiled code; the rest (pure integer, 16-bit
//! float, depth/stencil, block-compressed) decode to `(0, 0, 0, 1)`.


mod decode;

pub(crate) use decode::emit_vec4f;

/// Numeric interpretation of a plain channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Unorm,
    Snorm,
    Uscaled,
    Sscaled,
    Uint,
    Sint,
    Sfloat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Unknown,

    R8Uint,
    R8Sint,
    R8Unorm,
    R8Snorm,
    R8Uscaled,
    R8Sscaled,
    R8G8Uint,
    R8G8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8Uscaled,
    R8G8Sscaled,
    R8G8B8Uint,
    R8G8B8Sint,
    R8G8B8Unorm,
    R8G8B8Snorm,
    R8G8B8Uscaled,
    R8G8B8Sscaled,
    B8G8R8Uint,
    B8G8R8Sint,
    B8G8R8Unorm,
    B8G8R8Snorm,
    B8G8R8Uscaled,
    B8G8R8Sscaled,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    R8G8B8A8Uscaled,
    R8G8B8A8Sscaled,
    B8G8R8A8Uint,
    B8G8R8A8Sint,
    B8G8R8A8Unorm,
    B8G8R8A8Snorm,
    B8G8R8A8Uscaled,
    B8G8R8A8Sscaled,

    R16Uint,
    R16Sint,
    R16Unorm,
    R16Snorm,
    R16Uscaled,
    R16Sscaled,
    R16Sfloat,
    R16G16Uint,
    R16G16Sint,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Uscaled,
    R16G16Sscaled,
    R16G16Sfloat,
    R16G16B16Uint,
    R16G16B16Sint,
    R16G16B16Unorm,
    R16G16B16Snorm,
    R16G16B16Uscaled,
    R16G16B16Sscaled,
    R16G16B16Sfloat,
    R16G16B16A16Uint,
    R16G16B16A16Sint,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R16G16B16A16Uscaled,
    R16G16B16A16Sscaled,
    R16G16B16A16Sfloat,

    R32Uint,
    R32Sint,
    R32Sfloat,
    R32G32Uint,
    R32G32Sint,
    R32G32Sfloat,
    R32G32B32Uint,
    R32G32B32Sint,
    R32G32B32Sfloat,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R32G32B32A32Sfloat,

    R64Uint,
    R64Sint,
    R64Sfloat,
    R64G64Uint,
    R64G64Sint,
    R64G64Sfloat,
    R64G64B64Uint,
    R64G64B64Sint,
    R64G64B64Sfloat,
    R64G64B64A64Uint,
    R64G64B64A64Sint,
    R64G64B64A64Sfloat,

    D24UnormS8Uint,
    D32Sfloat,
    S8Uint,

    Bc1RgbUnormBlock,
    Bc1RgbaUnormBlock,
    Bc2UnormBlock,
    Bc3UnormBlock,
    Bc4UnormBlock,
    Bc4SnormBlock,
    Bc5UnormBlock,
    Bc5SnormBlock,

    R4G4UnormPack8,
    R4G4B4A4UnormPack16,
    B4G4R4A4UnormPack16,
    A4R4G4B4UnormPack16,
    A4B4G4R4UnormPack16,
    R5G6B5UnormPack16,
    B5G6R5UnormPack16,
    R5G5B5A1UnormPack16,
    B5G5R5A1UnormPack16,
    A1R5G5B5UnormPack16,
    A1B5G5R5UnormPack16,
}

/// Packed bit layouts, channels listed in memory order from the high bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Packing {
    Rg4,
    Rgba4,
    Rgb565,
    Rgba5551,
}

impl Packing {
    /// `(shift, bits)` per channel.
    pub(crate) fn channels(self) -> &'static [(u8, u8)] {
        match self {
            Packing::Rg4 => &[(4, 4), (0, 4)],
            Packing::Rgba4 => &[(12, 4), (8, 4), (4, 4), (0, 4)],
            Packing::Rgb565 => &[(11, 5), (5, 6), (0, 5)],
            Packing::Rgba5551 => &[(11, 5), (6, 5), (1, 5), (0, 1)],
        }
    }

    pub(crate) const fn bytes(self) -> u32 {
        match self {
            Packing::Rg4 => 1,
            _ => 2,
        }
    }
}

/// Permutation applied after decoding in memory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    Rgba,
    Bgra,
    Argb,
    Abgr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Plain { bits: u8, encoding: Encoding },
    Packed(Packing),
    DepthStencil,
    Block,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Info {
    pub stride: u32,
    pub channels: u8,
    pub kind: Kind,
    pub order: Order,
}

const fn plain(bits: u8, channels: u8, encoding: Encoding, order: Order) -> Info {
    Info {
        stride: (bits as u32 / 8) * channels as u32,
        channels,
        kind: Kind::Plain { bits, encoding },
        order,
    }
}

const fn packed(packing: Packing, channels: u8, order: Order) -> Info {
    Info {
        stride: packing.bytes(),
        channels,
        kind: Kind::Packed(packing),
        order,
    }
}

const fn other(stride: u32, channels: u8, kind: Kind) -> Info {
    Info {
        stride,
        channels,
        kind,
        order: Order::Rgba,
    }
}

impl Format {
    pub(crate) fn info(self) -> Info {
        use Encoding::*;
        use Format::*;
        use Order::{Abgr, Argb, Bgra, Rgba};

        match self {
            Unknown => other(0, 0, Kind::Unknown),

            R8Uint => plain(8, 1, Uint, Rgba),
            R8Sint => plain(8, 1, Sint, Rgba),
            R8Unorm => plain(8, 1, Unorm, Rgba),
            R8Snorm => plain(8, 1, Snorm, Rgba),
            R8Uscaled => plain(8, 1, Uscaled, Rgba),
            R8Sscaled => plain(8, 1, Sscaled, Rgba),
            R8G8Uint => plain(8, 2, Uint, Rgba),
            R8G8Sint => plain(8, 2, Sint, Rgba),
            R8G8Unorm => plain(8, 2, Unorm, Rgba),
            R8G8Snorm => plain(8, 2, Snorm, Rgba),
            R8G8Uscaled => plain(8, 2, Uscaled, Rgba),
            R8G8Sscaled => plain(8, 2, Sscaled, Rgba),
            R8G8B8Uint => plain(8, 3, Uint, Rgba),
            R8G8B8Sint => plain(8, 3, Sint, Rgba),
            R8G8B8Unorm => plain(8, 3, Unorm, Rgba),
            R8G8B8Snorm => plain(8, 3, Snorm, Rgba),
            R8G8B8Uscaled => plain(8, 3, Uscaled, Rgba),
            R8G8B8Sscaled => plain(8, 3, Sscaled, Rgba),
            B8G8R8Uint => plain(8, 3, Uint, Bgra),
            B8G8R8Sint => plain(8, 3, Sint, Bgra),
            B8G8R8Unorm => plain(8, 3, Unorm, Bgra),
            B8G8R8Snorm => plain(8, 3, Snorm, Bgra),
            B8G8R8Uscaled => plain(8, 3, Uscaled, Bgra),
            B8G8R8Sscaled => plain(8, 3, Sscaled, Bgra),
            R8G8B8A8Uint => plain(8, 4, Uint, Rgba),
            R8G8B8A8Sint => plain(8, 4, Sint, Rgba),
            R8G8B8A8Unorm => plain(8, 4, Unorm, Rgba),
            R8G8B8A8Snorm => plain(8, 4, Snorm, Rgba),
            R8G8B8A8Uscaled => plain(8, 4, Uscaled, Rgba),
            R8G8B8A8Sscaled => plain(8, 4, Sscaled, Rgba),
            B8G8R8A8Uint => plain(8, 4, Uint, Bgra),
            B8G8R8A8Sint => plain(8, 4, Sint, Bgra),
            B8G8R8A8Unorm => plain(8, 4, Unorm, Bgra),
            B8G8R8A8Snorm => plain(8, 4, Snorm, Bgra),
            B8G8R8A8Uscaled => plain(8, 4, Uscaled, Bgra),
            B8G8R8A8Sscaled => plain(8, 4, Sscaled, Bgra),

            R16Uint => plain(16, 1, Uint, Rgba),
            R16Sint => plain(16, 1, Sint, Rgba),
            R16Unorm => plain(16, 1, Unorm, Rgba),
            R16Snorm => plain(16, 1, Snorm, Rgba),
            R16Uscaled => plain(16, 1, Uscaled, Rgba),
            R16Sscaled => plain(16, 1, Sscaled, Rgba),
            R16Sfloat => plain(16, 1, Sfloat, Rgba),
            R16G16Uint => plain(16, 2, Uint, Rgba),
            R16G16Sint => plain(16, 2, Sint, Rgba),
            R16G16Unorm => plain(16, 2, Unorm, Rgba),
            R16G16Snorm => plain(16, 2, Snorm, Rgba),
            R16G16Uscaled => plain(16, 2, Uscaled, Rgba),
            R16G16Sscaled => plain(16, 2, Sscaled, Rgba),
            R16G16Sfloat => plain(16, 2, Sfloat, Rgba),
            R16G16B16Uint => plain(16, 3, Uint, Rgba),
            R16G16B16Sint => plain(16, 3, Sint, Rgba),
            R16G16B16Unorm => plain(16, 3, Unorm, Rgba),
            R16G16B16Snorm => plain(16, 3, Snorm, Rgba),
            R16G16B16Uscaled => plain(16, 3, Uscaled, Rgba),
            R16G16B16Sscaled => plain(16, 3, Sscaled, Rgba),
            R16G16B16Sfloat => plain(16, 3, Sfloat, Rgba),
            R16G16B16A16Uint => plain(16, 4, Uint, Rgba),
            R16G16B16A16Sint => plain(16, 4, Sint, Rgba),
            R16G16B16A16Unorm => plain(16, 4, Unorm, Rgba),
            R16G16B16A16Snorm => plain(16, 4, Snorm, Rgba),
            R16G16B16A16Uscaled => plain(16, 4, Uscaled, Rgba),
            R16G16B16A16Sscaled => plain(16, 4, Sscaled, Rgba),
            R16G16B16A16Sfloat => plain(16, 4, Sfloat, Rgba),

            R32Uint => plain(32, 1, Uint, Rgba),
            R32Sint => plain(32, 1, Sint, Rgba),
            R32Sfloat => plain(32, 1, Sfloat, Rgba),
            R32G32Uint => plain(32, 2, Uint, Rgba),
            R32G32Sint => plain(32, 2, Sint, Rgba),
            R32G32Sfloat => plain(32, 2, Sfloat, Rgba),
            R32G32B32Uint => plain(32, 3, Uint, Rgba),
            R32G32B32Sint => plain(32, 3, Sint, Rgba),
            R32G32B32Sfloat => plain(32, 3, Sfloat, Rgba),
            R32G32B32A32Uint => plain(32, 4, Uint, Rgba),
            R32G32B32A32Sint => plain(32, 4, Sint, Rgba),
            R32G32B32A32Sfloat => plain(32, 4, Sfloat, Rgba),

            R64Uint => plain(64, 1, Uint, Rgba),
            R64Sint => plain(64, 1, Sint, Rgba),
            R64Sfloat => plain(64, 1, Sfloat, Rgba),
            R64G64Uint => plain(64, 2, Uint, Rgba),
            R64G64Sint => plain(64, 2, Sint, Rgba),
            R64G64Sfloat => plain(64, 2, Sfloat, Rgba),
            R64G64B64Uint => plain(64, 3, Uint, Rgba),
            R64G64B64Sint => plain(64, 3, Sint, Rgba),
            R64G64B64Sfloat => plain(64, 3, Sfloat, Rgba),
            R64G64B64A64Uint => plain(64, 4, Uint, Rgba),
            R64G64B64A64Sint => plain(64, 4, Sint, Rgba),
            R64G64B64A64Sfloat => plain(64, 4, Sfloat, Rgba),

            D24UnormS8Uint => other(4, 2, Kind::DepthStencil),
            D32Sfloat => other(4, 1, Kind::DepthStencil),
            S8Uint => other(1, 1, Kind::DepthStencil),

            Bc1RgbUnormBlock | Bc1RgbaUnormBlock | Bc2UnormBlock | Bc3UnormBlock
            | Bc4UnormBlock | Bc4SnormBlock | Bc5UnormBlock | Bc5SnormBlock => {
                other(0, 0, Kind::Block)
            }

            R4G4UnormPack8 => packed(Packing::Rg4, 2, Rgba),
            R4G4B4A4UnormPack16 => packed(Packing::Rgba4, 4, Rgba),
            B4G4R4A4UnormPack16 => packed(Packing::Rgba4, 4, Bgra),
            A4R4G4B4UnormPack16 => packed(Packing::Rgba4, 4, Argb),
            A4B4G4R4UnormPack16 => packed(Packing::Rgba4, 4, Abgr),
            R5G6B5UnormPack16 => packed(Packing::Rgb565, 3, Rgba),
            B5G6R5UnormPack16 => packed(Packing::Rgb565, 3, Bgra),
            R5G5B5A1UnormPack16 => packed(Packing::Rgba5551, 4, Rgba),
            B5G5R5A1UnormPack16 => packed(Packing::Rgba5551, 4, Bgra),
            // 5551 field layout, permuted like the 4444 ARGB variants
            A1R5G5B5UnormPack16 => packed(Packing::Rgba5551, 4, Argb),
            A1B5G5R5UnormPack16 => packed(Packing::Rgba5551, 4, Abgr),
        }
    }

    /// Bytes per texel or vertex element; zero for block and unknown formats.
    pub fn stride(self) -> u32 {
        self.info().stride
    }

    /// Number of stored channels.
    pub fn channels(self) -> u32 {
        self.info().channels as u32
    }

    /// Channel encoding of plain formats.
    pub fn encoding(self) -> Option<Encoding> {
        match self.info().kind {
            Kind::Plain { encoding, .. } => Some(encoding),
            Kind::Packed(_) => Some(Encoding::Unorm),
            _ => None,
        }
    }

    /// Whether compiled code decodes this format to floats.
    pub fn is_decodable(self) -> bool {
        match self.info().kind {
            Kind::Plain { bits, encoding } => match encoding {
                Encoding::Uint | Encoding::Sint => false,
                Encoding::Sfloat => bits == 32 || bits == 64,
                _ => bits == 8 || bits == 16,
            },
            Kind::Packed(_) => true,
            Kind::DepthStencil | Kind::Block | Kind::Unknown => false,
        }
    }

    pub fn is_block_compressed(self) -> bool {
        self.info().kind == Kind::Block
    }

    pub fn is_depth_stencil(self) -> bool {
        self.info().kind == Kind::DepthStencil
    }
}
