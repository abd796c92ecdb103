use std::sync::Arc;

use super::library::{wrap_symbol, CUBIC_INTERPOLATE, FILTER_COORD, LINEAR_INTERPOLATE};
use super::*;
use crate::image::{Image, ImageCreateInfo, ImageView, ImageViewCreateInfo};
use crate::test_utils::{assert_vec4_near, f32_bytes, library};
use crate::types::{Extent, ImageType};
use crate::Format;

type WrapFn = unsafe extern "C" fn(i32, i32) -> i32;
type FilterCoordFn = unsafe extern "C" fn(f32, *mut i32, *mut f32);
type LinearFn = unsafe extern "C" fn(*mut f32, *const f32, *const f32, f32);
type CubicFn =
    unsafe extern "C" fn(*mut f32, *const f32, *const f32, *const f32, *const f32, f32);

fn library_fn(name: &str) -> *const u8 {
    library().sampler().function(name).unwrap()
}

fn wrap(mode: WrapMode, size: i32, value: i32) -> i32 {
    let f = unsafe { std::mem::transmute::<*const u8, WrapFn>(library_fn(&wrap_symbol(mode))) };
    unsafe { f(size, value) }
}

/// 4x4 image whose red channel at `(x, y)` is `x + 10 * y`.
fn grid_view() -> ImageView {
    let values: Vec<f32> = (0..16).map(|i| (i % 4) as f32 + 10.0 * (i / 4) as f32).collect();
    let info = ImageCreateInfo::new(ImageType::D2, Format::R32Sfloat, Extent::new(4, 4, 1));
    let image = Image::from_bytes(info, &f32_bytes(&values)).unwrap();
    ImageView::new(library(), &ImageViewCreateInfo::new(Arc::new(image))).unwrap()
}

/// 4x4 image whose rows all hold red `[0, 1, 4, 9]`.
fn quadratic_view() -> ImageView {
    let values: Vec<f32> = (0..16).map(|i| ((i % 4) * (i % 4)) as f32).collect();
    let info = ImageCreateInfo::new(ImageType::D2, Format::R32Sfloat, Extent::new(4, 4, 1));
    let image = Image::from_bytes(info, &f32_bytes(&values)).unwrap();
    ImageView::new(library(), &ImageViewCreateInfo::new(Arc::new(image))).unwrap()
}

/// Hermite through `c[1]`, `c[2]` with tangents `c[1] - c[0]` and `c[3] - c[2]`.
fn hermite(c: [f32; 4], f: f32) -> f32 {
    let (p0, p1) = (c[1], c[2]);
    let (m0, m1) = (c[1] - c[0], c[3] - c[2]);
    let (f2, f3) = (f * f, f * f * f);
    (2.0 * f3 - 3.0 * f2 + 1.0) * p0
        + (f3 - 2.0 * f2 + f) * m0
        + (-2.0 * f3 + 3.0 * f2) * p1
        + (f3 - f2) * m1
}

fn sampler(info: SamplerCreateInfo) -> Sampler {
    Sampler::new(library(), &info).unwrap()
}

#[test]
fn test_clamp_to_edge_boundaries() {
    assert_eq!(wrap(WrapMode::ClampToEdge, 8, -1), 0);
    assert_eq!(wrap(WrapMode::ClampToEdge, 8, 8), 7);
    assert_eq!(wrap(WrapMode::ClampToEdge, 8, 3), 3);
}

#[test]
fn test_repeat_boundaries() {
    assert_eq!(wrap(WrapMode::Repeat, 8, -1), 7);
    assert_eq!(wrap(WrapMode::Repeat, 8, 8), 0);
    assert_eq!(wrap(WrapMode::Repeat, 8, -17), 7);
}

#[test]
fn test_clamp_to_border_sentinel() {
    assert_eq!(wrap(WrapMode::ClampToBorder, 8, -1), -1);
    assert_eq!(wrap(WrapMode::ClampToBorder, 8, 8), -1);
    assert_eq!(wrap(WrapMode::ClampToBorder, 8, 7), 7);
}

#[test]
fn test_mirrored_repeat_reflects() {
    assert_eq!(wrap(WrapMode::MirroredRepeat, 8, -1), 0);
    assert_eq!(wrap(WrapMode::MirroredRepeat, 8, 8), 7);
    assert_eq!(wrap(WrapMode::MirroredRepeat, 8, 15), 0);
    assert_eq!(wrap(WrapMode::MirroredRepeat, 8, 16), 0);
    assert_eq!(wrap(WrapMode::MirroredRepeat, 8, -9), 7);
}

#[test]
fn test_mirror_clamp_to_edge() {
    assert_eq!(wrap(WrapMode::MirrorClampToEdge, 8, -1), 0);
    assert_eq!(wrap(WrapMode::MirrorClampToEdge, 8, -3), 2);
    assert_eq!(wrap(WrapMode::MirrorClampToEdge, 8, 8), 7);
    assert_eq!(wrap(WrapMode::MirrorClampToEdge, 8, -100), 7);
}

#[test]
fn test_filter_coord_splits_about_texel_center() {
    let f = unsafe { std::mem::transmute::<*const u8, FilterCoordFn>(library_fn(FILTER_COORD)) };
    let (mut int, mut fract) = (0i32, 0f32);

    unsafe { f(2.75, &mut int, &mut fract) };
    assert_eq!((int, fract), (2, 0.25));

    unsafe { f(0.25, &mut int, &mut fract) };
    assert_eq!((int, fract), (-1, 0.75));
}

#[test]
fn test_linear_interpolate_midpoint() {
    let f = unsafe { std::mem::transmute::<*const u8, LinearFn>(library_fn(LINEAR_INTERPOLATE)) };
    let c0 = [0.0f32, 1.0, 2.0, 4.0];
    let c1 = [1.0f32, 3.0, 2.0, 0.0];
    let mut res = [0.0f32; 4];

    unsafe { f(res.as_mut_ptr(), c0.as_ptr(), c1.as_ptr(), 0.5) };

    assert_eq!(res, [0.5, 2.0, 2.0, 2.0]);
}

#[test]
fn test_cubic_interpolate_hits_inner_samples() {
    let f = unsafe { std::mem::transmute::<*const u8, CubicFn>(library_fn(CUBIC_INTERPOLATE)) };
    let c = [
        [0.5f32, -1.0, 2.0, 0.0],
        [0.25f32, 4.0, 0.125, 1.0],
        [0.75f32, 2.0, 8.0, 0.5],
        [1.5f32, -2.0, 0.25, 3.0],
    ];
    let mut res = [0.0f32; 4];

    unsafe { f(res.as_mut_ptr(), c[0].as_ptr(), c[1].as_ptr(), c[2].as_ptr(), c[3].as_ptr(), 0.0) };
    assert_eq!(res, c[1]);

    unsafe { f(res.as_mut_ptr(), c[0].as_ptr(), c[1].as_ptr(), c[2].as_ptr(), c[3].as_ptr(), 1.0) };
    assert_eq!(res, c[2]);
}

#[test]
fn test_cubic_interpolate_between_inner_samples() {
    let f = unsafe { std::mem::transmute::<*const u8, CubicFn>(library_fn(CUBIC_INTERPOLATE)) };
    let c = [
        [0.5f32, -1.0, 2.0, 0.0],
        [0.25f32, 4.0, 0.125, 1.0],
        [0.75f32, 2.0, 8.0, 0.5],
        [1.5f32, -2.0, 0.25, 3.0],
    ];

    for t in [0.25f32, 0.5, 0.8] {
        let mut res = [0.0f32; 4];
        unsafe { f(res.as_mut_ptr(), c[0].as_ptr(), c[1].as_ptr(), c[2].as_ptr(), c[3].as_ptr(), t) };

        let expected: [f32; 4] = std::array::from_fn(|i| hermite([c[0][i], c[1][i], c[2][i], c[3][i]], t));
        assert_vec4_near(res, expected, 1e-5);
    }
}

#[test]
fn test_nearest_sample_at_texel_centers() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Nearest, WrapMode::Repeat));

    assert_eq!(s.sample(&view, [0.125, 0.125, 0.0]), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(s.sample(&view, [0.875, 0.625, 0.0]), [23.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_nearest_repeat_wraps_both_axes() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Nearest, WrapMode::Repeat));

    let color = s.sample(&view, [1.125, -0.125, 0.0]);

    assert_eq!(color[0], 30.0);
}

#[test]
fn test_nearest_uses_wrap_mode_per_axis() {
    let view = grid_view();
    let info = SamplerCreateInfo::new(Filter::Nearest, WrapMode::Repeat).with_wrap([
        WrapMode::ClampToEdge,
        WrapMode::Repeat,
        WrapMode::Repeat,
    ]);
    let s = sampler(info);

    let color = s.sample(&view, [1.125, 1.125, 0.0]);

    assert_eq!(color[0], 3.0);
}

#[test]
fn test_nearest_border_color() {
    let view = grid_view();
    let border = [0.25, 0.5, 0.75, 1.0];
    let s = sampler(
        SamplerCreateInfo::new(Filter::Nearest, WrapMode::ClampToBorder).with_border_color(border),
    );

    assert_eq!(s.sample(&view, [-0.1, 0.5, 0.0]), border);
    assert_eq!(s.sample(&view, [0.5, 1.0, 0.0]), border);
}

#[test]
fn test_linear_texel_center_is_exact() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Linear, WrapMode::ClampToEdge));

    assert_eq!(s.sample(&view, [0.375, 0.625, 0.0]), [21.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_linear_between_texels() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Linear, WrapMode::ClampToEdge));

    assert_vec4_near(s.sample(&view, [0.25, 0.125, 0.0]), [0.5, 0.0, 0.0, 1.0], 1e-6);
    assert_vec4_near(s.sample(&view, [0.25, 0.25, 0.0]), [5.5, 0.0, 0.0, 1.0], 1e-5);
}

#[test]
fn test_linear_mixes_border_color() {
    let view = grid_view();
    let s = sampler(
        SamplerCreateInfo::new(Filter::Linear, WrapMode::ClampToBorder)
            .with_border_color([1.0, 1.0, 1.0, 1.0]),
    );

    let color = s.sample(&view, [0.0, 0.125, 0.0]);

    assert_vec4_near(color, [0.5, 0.5, 0.5, 1.0], 1e-6);
}

#[test]
fn test_cubic_texel_center_is_exact() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Cubic, WrapMode::Repeat));

    assert_eq!(s.sample(&view, [0.625, 0.375, 0.0]), [12.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_cubic_between_texels_on_curved_row() {
    let view = quadratic_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Cubic, WrapMode::Repeat));
    let row = [0.0, 1.0, 4.0, 9.0];

    // texel x 1.75 and 2.0: taps 0..=3 at fractions 0.25 and 0.5
    for (u, f) in [(0.4375f32, 0.25f32), (0.5, 0.5)] {
        let color = s.sample(&view, [u, 0.5, 0.0]);
        assert_vec4_near(color, [hermite(row, f), 0.0, 0.0, 1.0], 1e-5);
    }
    assert!((s.sample(&view, [0.5, 0.5, 0.0])[0] - 2.0).abs() < 1e-5);
}

#[test]
fn test_filter_none_samples_as_nearest() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::None, WrapMode::Repeat));

    assert_eq!(s.filter(), Filter::Nearest);
    assert_eq!(s.sample(&view, [0.625, 0.375, 0.0])[0], 12.0);
}

#[test]
fn test_mag_filter_selects_filter() {
    let info = SamplerCreateInfo {
        mag_filter: Filter::Linear,
        min_filter: Filter::Cubic,
        ..SamplerCreateInfo::default()
    };

    assert_eq!(sampler(info).filter(), Filter::Linear);
}

#[test]
fn test_raw_entry_point_with_view_callback() {
    let view = grid_view();
    let s = sampler(SamplerCreateInfo::new(Filter::Nearest, WrapMode::Repeat));
    let coords = [2.5f32, 3.5, 0.0];
    let size = [4i32, 4, 1];
    let mut color = [0.0f32; 4];

    unsafe { (s.as_fn())(color.as_mut_ptr(), coords.as_ptr(), size.as_ptr(), view.as_fn()) };

    assert_eq!(color, [32.0, 0.0, 0.0, 1.0]);
}
