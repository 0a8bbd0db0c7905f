use super::*;
use crate::entity::Item;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

#[test]
fn test_parse_hex_color_forms() {
    assert_eq!(parse_hex_color("#FF0000"), Some(RED));
    assert_eq!(parse_hex_color("f00"), Some(RED));
    assert_eq!(parse_hex_color("#0000ff80"), Some(Rgba([0, 0, 255, 128])));
    assert_eq!(parse_hex_color("#12345"), None);
    assert_eq!(parse_hex_color("#GG0000"), None);
    assert_eq!(parse_hex_color("#ééé"), None);
}

#[test]
fn test_rectangle_scales_to_surface() {
    let shapes = vec![Shape::rectangle("a", 1, 1, 2, 1, "#FF0000", 0)];
    let mut surface = RgbaImage::new(8, 8);
    render_shapes(&mut surface, &shapes, 4, None);

    // Grid cell (1,1) becomes the 2x2 block at (2,2)
    assert_eq!(*surface.get_pixel(2, 2), RED);
    assert_eq!(*surface.get_pixel(5, 3), RED);
    assert_eq!(*surface.get_pixel(6, 2), TRANSPARENT);
    assert_eq!(*surface.get_pixel(2, 4), TRANSPARENT);
}

#[test]
fn test_higher_z_draws_on_top_regardless_of_order() {
    let shapes = vec![
        Shape::rectangle("top", 0, 0, 4, 4, "#0000FF", 10),
        Shape::rectangle("bottom", 0, 0, 4, 4, "#FF0000", 1),
    ];
    let mut surface = RgbaImage::new(4, 4);
    render_shapes(&mut surface, &shapes, 4, None);
    assert_eq!(*surface.get_pixel(1, 1), BLUE);
}

#[test]
fn test_ellipse_leaves_corners_empty() {
    let shapes = vec![Shape::ellipse("e", 0, 0, 10, 10, "#FF0000", 0)];
    let mut surface = RgbaImage::new(10, 10);
    render_shapes(&mut surface, &shapes, 10, None);
    assert_eq!(*surface.get_pixel(5, 5), RED);
    assert_eq!(*surface.get_pixel(0, 0), TRANSPARENT);
    assert_eq!(*surface.get_pixel(9, 9), TRANSPARENT);
    assert_eq!(*surface.get_pixel(0, 5), RED);
}

#[test]
fn test_render_clears_previous_content_and_clips() {
    let mut surface = RgbaImage::from_pixel(4, 4, BLUE);
    let shapes = vec![Shape::rectangle("wide", -2, 3, 100, 100, "#FF0000", 0)];
    render_shapes(&mut surface, &shapes, 4, None);
    assert_eq!(*surface.get_pixel(0, 0), TRANSPARENT);
    assert_eq!(*surface.get_pixel(3, 3), RED);
}

#[test]
fn test_invalid_color_renders_magenta() {
    let shapes = vec![Shape::rectangle("bad", 0, 0, 1, 1, "not-a-color", 0)];
    let mut surface = RgbaImage::new(2, 2);
    render_shapes(&mut surface, &shapes, 2, Some(Rgba([255, 255, 255, 255])));
    assert_eq!(*surface.get_pixel(0, 0), MAGENTA);
    assert_eq!(*surface.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
}

#[test]
fn test_render_entity_and_png_encoding() {
    let item = Item::new(
        vec![Shape::rectangle("gem", 0, 0, 64, 64, "#FF0000", 0)],
        128,
        "a gem",
    );
    let image = render_entity(&item, 32, None);
    assert_eq!(image.dimensions(), (32, 32));
    assert_eq!(*image.get_pixel(15, 15), RED);
    assert_eq!(*image.get_pixel(16, 16), TRANSPARENT);

    let bytes = encode_png(&image).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let encoded = png_base64(&image).unwrap();
    assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
}

#[test]
fn test_save_png_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.png");
    save_png(&RgbaImage::new(2, 2), &path).unwrap();
    assert!(path.exists());
}
