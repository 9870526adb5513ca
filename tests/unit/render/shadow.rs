use super::*;
use crate::foundation::core::{Rgba8Premul, Vec2};

fn desc(blur: f64) -> ShadowDescriptor {
    ShadowDescriptor {
        offset: Vec2::new(0.0, 2.0),
        blur_radius: blur,
        color: Rgba8Premul::from_straight_rgba(0, 0, 0, 200),
        shape: MaskShape::Ellipse,
    }
}

fn alpha_at(layer: &vello_cpu::Image, size: PixelSize, x: u32, y: u32) -> u8 {
    let vello_cpu::ImageSource::Pixmap(pm) = &layer.image else {
        panic!("expected pixmap-backed shadow layer");
    };
    pm.data_as_u8_slice()[((y * size.width + x) * 4 + 3) as usize]
}

#[test]
fn layer_is_dense_inside_outline_and_empty_at_corners() {
    let size = PixelSize::new(48, 48);
    let d = desc(3.0);
    let frame = d.content_frame(size).unwrap();
    let mut cpu = CpuContext::default();
    let mut layers = ShadowLayers::default();
    let layer = layers.get_or_build(&mut cpu, size, frame, &d).unwrap();

    let center = alpha_at(&layer, size, 24, 26);
    assert!((190..=200).contains(&center), "center alpha {center}");
    assert_eq!(alpha_at(&layer, size, 0, 0), 0);
    assert_eq!(alpha_at(&layer, size, 47, 0), 0);
}

#[test]
fn layers_are_reused_per_size_and_descriptor() {
    let d = desc(2.0);
    let mut cpu = CpuContext::default();
    let mut layers = ShadowLayers::default();
    for _ in 0..3 {
        let size = PixelSize::new(32, 32);
        let frame = d.content_frame(size).unwrap();
        layers.get_or_build(&mut cpu, size, frame, &d).unwrap();
    }
    assert_eq!(layers.builds(), 1);

    let other = PixelSize::new(40, 32);
    let frame = d.content_frame(other).unwrap();
    layers.get_or_build(&mut cpu, other, frame, &d).unwrap();
    assert_eq!(layers.builds(), 2);
}
