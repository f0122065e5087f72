//! JSON encoding of environment outputs
use crate::render::RenderFrame;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ndarray::Array3;
use serde_json::{json, Value};

/// Encode a render frame as JSON.
///
/// * Text frames are strings.
/// * RGB images gain an opaque alpha channel and are sent as
///     `{"rows", "cols", "data"}` where `data` is the base64 encoding of the
///     row-major RGBA bytes.
/// * Empty frames are `null`.
pub fn render_frame(frame: &RenderFrame) -> Value {
    match frame {
        RenderFrame::Ansi(text) => Value::String(text.clone()),
        RenderFrame::Rgb(pixels) => {
            let (rows, cols, _) = pixels.dim();
            json!({
                "rows": rows,
                "cols": cols,
                "data": STANDARD.encode(with_alpha(pixels)),
            })
        }
        RenderFrame::Empty => Value::Null,
    }
}

/// Row-major RGBA bytes of an RGB image.
fn with_alpha(pixels: &Array3<u8>) -> Vec<u8> {
    let (rows, cols, channels) = pixels.dim();
    let mut data = Vec::with_capacity(rows * cols * 4);
    for row in pixels.outer_iter() {
        for pixel in row.outer_iter() {
            data.extend((0..3).map(|c| if c < channels { pixel[c] } else { 0 }));
            data.push(u8::MAX);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_is_string() {
        let frame = RenderFrame::Ansi("SFFF\n".into());
        assert_eq!(render_frame(&frame), json!("SFFF\n"));
    }

    #[test]
    fn empty_is_null() {
        assert_eq!(render_frame(&RenderFrame::Empty), Value::Null);
    }

    #[test]
    fn rgb_adds_alpha() {
        let mut pixels = Array3::zeros((1, 2, 3));
        pixels[[0, 0, 0]] = 1;
        pixels[[0, 1, 2]] = 7;
        assert_eq!(with_alpha(&pixels), vec![1, 0, 0, 255, 0, 0, 7, 255]);
    }

    #[test]
    fn rgb_metadata_and_data() {
        let pixels = Array3::from_elem((2, 3, 3), 10u8);
        let value = render_frame(&RenderFrame::Rgb(pixels));
        assert_eq!(value["rows"], json!(2));
        assert_eq!(value["cols"], json!(3));
        let data = STANDARD.decode(value["data"].as_str().unwrap()).unwrap();
        assert_eq!(data.len(), 2 * 3 * 4);
        assert_eq!(&data[..4], &[10, 10, 10, 255]);
    }

    #[test]
    fn full_size_frame_length() {
        let pixels = Array3::zeros((400, 600, 3));
        let value = render_frame(&RenderFrame::Rgb(pixels));
        assert_eq!(value["data"].as_str().unwrap().len(), 1_280_000);
    }
}
