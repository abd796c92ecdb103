//! Images and compiled image views.


mod view;

pub use view::{ImageView, ImageViewCreateInfo, ImageViewFn};

use crate::error::{GjitError, Result};
use crate::format::Format;
use crate::types::{Extent, ImageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCreateInfo {
    pub image_type: ImageType,
    pub format: Format,
    pub size: Extent,
    pub levels: u32,
    pub layers: u32,
}

impl ImageCreateInfo {
    pub fn new(image_type: ImageType, format: Format, size: Extent) -> Self {
        Self {
            image_type,
            format,
            size,
            levels: 1,
            layers: 1,
        }
    }
}

/// Texel storage for a single level and layer.
pub struct Image {
    info: ImageCreateInfo,
    data: Box<[u8]>,
}

impl Image {
    /// Zero-filled image sized `stride * width * height * depth`.
    ///
    /// # Errors
    ///
    /// [`GjitError::InvalidCreateInfo`] when the format has no per-texel
    /// stride or the size does not fit in memory.
    pub fn new(info: ImageCreateInfo) -> Result<Self> {
        let len = Self::byte_len(&info)?;
        Ok(Self {
            info,
            data: vec![0u8; len].into_boxed_slice(),
        })
    }

    /// Image initialized with `bytes`, which must be exactly the image size.
    pub fn from_bytes(info: ImageCreateInfo, bytes: &[u8]) -> Result<Self> {
        let len = Self::byte_len(&info)?;
        if bytes.len() != len {
            return Err(GjitError::InvalidCreateInfo(format!(
                "{:?} image of {:?} needs {len} bytes, got {}",
                info.format,
                info.size,
                bytes.len()
            )));
        }
        Ok(Self {
            info,
            data: bytes.into(),
        })
    }

    fn byte_len(info: &ImageCreateInfo) -> Result<usize> {
        let stride = info.format.stride();
        if stride == 0 {
            return Err(GjitError::InvalidCreateInfo(format!(
                "{:?} has no per-texel storage",
                info.format
            )));
        }
        u64::from(stride)
            .checked_mul(info.size.texel_count())
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                GjitError::InvalidCreateInfo(format!("image of {:?} is too large", info.size))
            })
    }

    pub fn info(&self) -> &ImageCreateInfo {
        &self.info
    }

    pub fn format(&self) -> Format {
        self.info.format
    }

    pub fn size(&self) -> Extent {
        self.info.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copies `bytes` into the image at byte `offset`.
    ///
    /// Takes `&mut self`, so no view can be reading the image meanwhile.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                GjitError::OutOfRange(format!(
                    "write of {} bytes at {offset} into image of {} bytes",
                    bytes.len(),
                    self.data.len()
                ))
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("info", &self.info)
            .field("bytes", &self.data.len())
            .finish()
    }
}
