use super::*;
use crate::test_utils::{assert_vec4_near, library};
use crate::types::{BlendFactor, BlendOp, ColorMask};
use crate::GjitError;

const NO_CONSTANT: [f32; 4] = [0.0; 4];

fn state(attachment: BlendAttachment) -> BlendState {
    BlendState::new(library(), &BlendStateCreateInfo::new(attachment)).unwrap()
}

fn run(attachment: BlendAttachment, src: [f32; 4], dst: [f32; 4], constant: [f32; 4]) -> [f32; 4] {
    let mut res = [0.0; 4];
    state(attachment).blend(&mut res, &src, &dst, &constant);
    res
}

/// Textbook weight of `factor` for channel `i`.
fn reference_factor(factor: BlendFactor, i: usize, src: [f32; 4], dst: [f32; 4], c: [f32; 4]) -> f32 {
    match factor {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::SrcColor => src[i],
        BlendFactor::OneMinusSrcColor => 1.0 - src[i],
        BlendFactor::DstColor => dst[i],
        BlendFactor::OneMinusDstColor => 1.0 - dst[i],
        BlendFactor::SrcAlpha => src[3],
        BlendFactor::OneMinusSrcAlpha => 1.0 - src[3],
        BlendFactor::DstAlpha => dst[3],
        BlendFactor::OneMinusDstAlpha => 1.0 - dst[3],
        BlendFactor::ConstantColor => c[i],
        BlendFactor::OneMinusConstantColor => 1.0 - c[i],
        BlendFactor::ConstantAlpha => c[3],
        BlendFactor::OneMinusConstantAlpha => 1.0 - c[3],
        BlendFactor::SrcAlphaSaturate => src[3].min(1.0 - dst[3]),
        _ => 0.0,
    }
}

fn reference_op(op: BlendOp, s: f32, d: f32) -> f32 {
    match op {
        BlendOp::Add => s + d,
        BlendOp::Subtract => s - d,
        BlendOp::ReverseSubtract => d - s,
        BlendOp::Min => s.min(d),
        BlendOp::Max => s.max(d),
    }
}

#[test]
fn test_alpha_blend_end_to_end() {
    let attachment = BlendAttachment::enabled(
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendOp::Add,
    )
    .with_alpha(BlendFactor::One, BlendFactor::Zero, BlendOp::Add);

    let res = run(attachment, [1.0, 0.0, 0.0, 0.5], [0.0, 0.0, 1.0, 1.0], NO_CONSTANT);

    assert_vec4_near(res, [0.5, 0.0, 0.5, 1.0], 1e-6);
}

#[test]
fn test_every_factor_matches_reference() {
    let src = [0.25, 0.5, 0.75, 0.375];
    let dst = [0.125, 0.625, 0.875, 0.5];
    let constant = [0.2, 0.4, 0.6, 0.8];

    for factor in BlendFactor::ALL {
        let attachment = BlendAttachment::enabled(factor, BlendFactor::Zero, BlendOp::Add);
        let res = run(attachment, src, dst, constant);
        let expected: [f32; 4] =
            std::array::from_fn(|i| src[i] * reference_factor(factor, i, src, dst, constant));
        assert_vec4_near(res, expected, 1e-6);

        let attachment = BlendAttachment::enabled(BlendFactor::Zero, factor, BlendOp::Add);
        let res = run(attachment, src, dst, constant);
        let expected: [f32; 4] =
            std::array::from_fn(|i| dst[i] * reference_factor(factor, i, src, dst, constant));
        assert_vec4_near(res, expected, 1e-6);
    }
}

#[test]
fn test_every_op_matches_reference() {
    let src = [0.25, 0.75, 0.5, 0.125];
    let dst = [0.5, 0.25, 0.5, 0.875];

    for op in BlendOp::ALL {
        let attachment = BlendAttachment::enabled(BlendFactor::One, BlendFactor::One, op);
        let res = run(attachment, src, dst, NO_CONSTANT);
        let expected: [f32; 4] = std::array::from_fn(|i| reference_op(op, src[i], dst[i]));
        assert_vec4_near(res, expected, 1e-6);
    }
}

#[test]
fn test_rgb_and_alpha_use_separate_equations() {
    let attachment = BlendAttachment::enabled(BlendFactor::One, BlendFactor::One, BlendOp::Add)
        .with_alpha(BlendFactor::One, BlendFactor::One, BlendOp::ReverseSubtract);

    let res = run(attachment, [0.25, 0.25, 0.25, 0.25], [0.5, 0.5, 0.5, 0.75], NO_CONSTANT);

    assert_vec4_near(res, [0.75, 0.75, 0.75, 0.5], 1e-6);
}

#[test]
fn test_saturate_tie_takes_src_alpha() {
    let attachment =
        BlendAttachment::enabled(BlendFactor::SrcAlphaSaturate, BlendFactor::Zero, BlendOp::Add);
    // 1 - dst.a == src.a
    let src = [1.0, 0.5, 0.25, 0.25];
    let dst = [0.0, 0.0, 0.0, 0.75];

    let res = run(attachment, src, dst, NO_CONSTANT);

    assert_vec4_near(res, [0.25, 0.125, 0.0625, 0.0625], 0.0);
}

#[test]
fn test_saturate_picks_smaller_operand() {
    let attachment =
        BlendAttachment::enabled(BlendFactor::SrcAlphaSaturate, BlendFactor::Zero, BlendOp::Add);

    let res = run(attachment, [1.0, 1.0, 1.0, 0.75], [0.0, 0.0, 0.0, 0.5], NO_CONSTANT);

    assert_vec4_near(res, [0.5, 0.5, 0.5, 0.375], 1e-6);
}

#[test]
fn test_dual_source_factors_blend_as_zero() {
    for factor in BlendFactor::ALL.into_iter().filter(|f| f.is_dual_source()) {
        let attachment = BlendAttachment::enabled(factor, BlendFactor::One, BlendOp::Add);
        let res = run(attachment, [1.0; 4], [0.25, 0.5, 0.75, 1.0], NO_CONSTANT);
        assert_vec4_near(res, [0.25, 0.5, 0.75, 1.0], 0.0);
    }
}

#[test]
fn test_disabled_full_mask_copies_src() {
    let src = [0.1, 0.2, 0.3, 0.4];
    let mut res = [9.0; 4];

    state(BlendAttachment::default()).blend(&mut res, &src, &[0.5; 4], &NO_CONSTANT);

    assert_eq!(res, src);
}

#[test]
fn test_cleared_mask_bits_leave_res_unchanged() {
    let attachment = BlendAttachment::default().with_color_mask(ColorMask::R | ColorMask::B);
    let mut res = [9.0, 8.0, 7.0, 6.0];

    state(attachment).blend(&mut res, &[0.1, 0.2, 0.3, 0.4], &[0.5; 4], &NO_CONSTANT);

    assert_eq!(res, [0.1, 8.0, 0.3, 6.0]);
}

#[test]
fn test_enabled_mask_applies_after_equation() {
    let attachment = BlendAttachment::enabled(BlendFactor::One, BlendFactor::One, BlendOp::Add)
        .with_color_mask(ColorMask::A);
    let mut res = [9.0; 4];

    state(attachment).blend(&mut res, &[0.25; 4], &[0.5; 4], &NO_CONSTANT);

    assert_eq!(res, [9.0, 9.0, 9.0, 0.75]);
}

#[test]
fn test_raw_entry_point_matches_wrapper() {
    let blend = state(BlendAttachment::enabled(
        BlendFactor::ConstantColor,
        BlendFactor::Zero,
        BlendOp::Add,
    ));
    let src = [1.0, 1.0, 1.0, 1.0];
    let constant = [0.25, 0.5, 0.75, 1.0];
    let mut res = [0.0f32; 4];

    unsafe {
        (blend.as_fn())(res.as_mut_ptr(), src.as_ptr(), [0.0f32; 4].as_ptr(), constant.as_ptr())
    };

    assert_eq!(res, constant);
}

#[test]
fn test_only_first_attachment_compiled() {
    let info = BlendStateCreateInfo {
        logic_op: None,
        attachments: vec![
            BlendAttachment::default(),
            BlendAttachment::enabled(BlendFactor::Zero, BlendFactor::Zero, BlendOp::Add),
        ],
    };
    let blend = BlendState::new(library(), &info).unwrap();
    let mut res = [0.0; 4];

    blend.blend(&mut res, &[0.5; 4], &[1.0; 4], &NO_CONSTANT);

    assert_eq!(blend.attachment_count(), 2);
    assert_eq!(res, [0.5; 4]);
}

#[test]
fn test_attachment_count_validated() {
    let empty = BlendStateCreateInfo::default();
    assert!(matches!(
        BlendState::new(library(), &empty),
        Err(GjitError::InvalidCreateInfo(_))
    ));

    let too_many = BlendStateCreateInfo {
        logic_op: None,
        attachments: vec![BlendAttachment::default(); 33],
    };
    assert!(matches!(
        BlendState::new(library(), &too_many),
        Err(GjitError::InvalidCreateInfo(_))
    ));
}
