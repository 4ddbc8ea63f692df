use ndarray::{s, ArrayView3};

use crate::shared::geometry::Size;

/// A decoded video frame: contiguous RGB bytes in row-major order.
///
/// Carries its presentation timestamp so playback pacing and time updates
/// run on media time rather than wall-clock time.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    timestamp: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            timestamp: 0.0,
        }
    }

    /// Sets the presentation timestamp in seconds.
    pub fn with_timestamp(mut self, seconds: f64) -> Self {
        self.timestamp = seconds;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Returns the frame turned clockwise by `degrees` (0, 90, 180 or 270).
    /// Quarter turns swap width and height. Index and timestamp carry over.
    pub fn rotated_clockwise(&self, degrees: i32) -> Frame {
        let view = self.as_ndarray();
        let turned = match degrees.rem_euclid(360) {
            90 => view.permuted_axes([1, 0, 2]).slice_move(s![.., ..;-1, ..]),
            180 => view.slice_move(s![..;-1, ..;-1, ..]),
            270 => view.permuted_axes([1, 0, 2]).slice_move(s![..;-1, .., ..]),
            _ => return self.clone(),
        };
        let (height, width, _) = turned.dim();
        Frame {
            data: turned.iter().copied().collect(),
            width: width as u32,
            height: height as u32,
            channels: self.channels,
            index: self.index,
            timestamp: self.timestamp,
        }
    }

    /// Expands the pixels to RGBA with opaque alpha, the layout GPU image
    /// handles expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        if self.channels == 4 {
            return self.data.clone();
        }
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for px in self.data.chunks_exact(self.channels as usize) {
            match px {
                [r, g, b, ..] => rgba.extend_from_slice(&[*r, *g, *b, 255]),
                [l] => rgba.extend_from_slice(&[*l, *l, *l, 255]),
                _ => rgba.extend_from_slice(&[0, 0, 0, 255]),
            }
        }
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 5).with_timestamp(1.5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.timestamp(), 1.5);
        assert_eq!(frame.size(), Size::new(2.0, 2.0));
    }

    #[test]
    fn test_timestamp_defaults_to_zero() {
        let frame = Frame::new(vec![0u8; 3], 1, 1, 3, 0);
        assert_eq!(frame.timestamp(), 0.0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_is_height_width_channels() {
        // 2 rows x 4 cols; mark row=1, col=0, R
        let mut data = vec![0u8; 24];
        data[12] = 255;
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    /// 3 wide, 2 tall, single channel:
    ///   1 2 3
    ///   4 5 6
    fn numbered() -> Frame {
        Frame::new(vec![1, 2, 3, 4, 5, 6], 3, 2, 1, 9).with_timestamp(0.5)
    }

    #[test]
    fn test_rotate_90_clockwise() {
        let r = numbered().rotated_clockwise(90);
        assert_eq!((r.width(), r.height()), (2, 3));
        assert_eq!(r.data(), &[4, 1, 5, 2, 6, 3]);
        assert_eq!(r.index(), 9);
        assert_eq!(r.timestamp(), 0.5);
    }

    #[test]
    fn test_rotate_180() {
        let r = numbered().rotated_clockwise(180);
        assert_eq!((r.width(), r.height()), (3, 2));
        assert_eq!(r.data(), &[6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_rotate_270_clockwise() {
        let r = numbered().rotated_clockwise(270);
        assert_eq!((r.width(), r.height()), (2, 3));
        assert_eq!(r.data(), &[3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_rotate_keeps_pixels_together() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, 0);
        let r = frame.rotated_clockwise(90);
        assert_eq!((r.width(), r.height()), (1, 2));
        assert_eq!(r.data(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(frame.rotated_clockwise(-90).data(), &[40, 50, 60, 10, 20, 30]);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        assert_eq!(numbered().rotated_clockwise(0).data(), numbered().data());
    }

    #[test]
    fn test_to_rgba_adds_opaque_alpha() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, 0);
        assert_eq!(frame.to_rgba(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }
}
