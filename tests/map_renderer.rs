use std::fs;
use tempdir::TempDir;
use tiny_skia::Pixmap;
use trackmap::frame::Frame;
use trackmap::geometry::{BoundingBox, Coord, Geometry, Rgba, Shape};
use trackmap::map_renderer::{MapRenderer, RenderSink};

const CLIP: BoundingBox = BoundingBox {
    min_lon: 0.0,
    max_lon: 1.0,
    min_lat: 0.0,
    max_lat: 1.0,
};

#[test]
fn empty_scene_renders_plain_background() {
    let dir = TempDir::new("trackmap-render").unwrap();
    let output = dir.path().join("empty.png");
    let mut renderer = MapRenderer::new(output.clone());

    let frame = Frame {
        width: 64,
        height: 48,
        clip: None,
    };
    renderer.render(&frame, &[]).unwrap();

    let pixmap = Pixmap::decode_png(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(pixmap.width(), 64);
    assert_eq!(pixmap.height(), 48);
    let center = pixmap.pixel(32, 24).unwrap();
    assert_eq!((center.red(), center.green(), center.blue()), (255, 255, 255));
}

#[test]
fn filled_polygon_covers_the_window() {
    let dir = TempDir::new("trackmap-render").unwrap();
    let output = dir.path().join("poly.png");
    let mut renderer = MapRenderer::new(output.clone());

    let ring = vec![
        Coord { lon: -1.0, lat: -1.0 },
        Coord { lon: 2.0, lat: -1.0 },
        Coord { lon: 2.0, lat: 2.0 },
        Coord { lon: -1.0, lat: 2.0 },
        Coord { lon: -1.0, lat: -1.0 },
    ];
    let shape = Shape {
        geometry: Geometry::Polygon(vec![ring]),
        fill: Rgba {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        },
        line: Rgba::BLACK,
    };
    let frame = Frame {
        width: 64,
        height: 64,
        clip: Some(CLIP),
    };
    renderer.render(&frame, &[shape]).unwrap();

    let pixmap = Pixmap::decode_png(&fs::read(&output).unwrap()).unwrap();
    let center = pixmap.pixel(32, 32).unwrap();
    assert_eq!((center.red(), center.green(), center.blue()), (255, 0, 0));
}

#[test]
fn degenerate_shapes_do_not_fail() {
    let dir = TempDir::new("trackmap-render").unwrap();
    let output = dir.path().join("degenerate.png");
    let mut renderer = MapRenderer::new(output.clone());

    let shapes = vec![
        Shape {
            geometry: Geometry::LineString(vec![]),
            fill: Rgba::DEFAULT_FILL,
            line: Rgba::DEFAULT_LINE,
        },
        Shape {
            geometry: Geometry::LineString(vec![Coord { lon: 0.5, lat: 0.5 }]),
            fill: Rgba::DEFAULT_FILL,
            line: Rgba::DEFAULT_LINE,
        },
        Shape {
            geometry: Geometry::Polygon(vec![vec![]]),
            fill: Rgba::DEFAULT_FILL,
            line: Rgba::DEFAULT_LINE,
        },
    ];
    let frame = Frame {
        width: 32,
        height: 32,
        clip: None,
    };
    renderer.render(&frame, &shapes).unwrap();
    assert!(output.exists());
}

#[test]
fn zero_sized_frame_is_an_error() {
    let dir = TempDir::new("trackmap-render").unwrap();
    let mut renderer = MapRenderer::new(dir.path().join("zero.png"));
    let frame = Frame {
        width: 0,
        height: 64,
        clip: None,
    };
    assert!(renderer.render(&frame, &[]).is_err());
}
