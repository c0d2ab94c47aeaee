use image::GrayImage;
use ndarray::{ArrayView2, ArrayViewMut2};

/// Value marking an in-band pixel.
pub const ON: u8 = 255;
/// Value marking an out-of-band pixel.
pub const OFF: u8 = 0;

/// A single-channel binary image, same spatial dimensions as the frame it was
/// segmented from. Pixels are [`ON`] where the source fell inside the target
/// color band and [`OFF`] elsewhere.
///
/// Masks are transient: one is produced per frame and discarded after the
/// frame has been scored.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// An all-[`OFF`] mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(vec![OFF; (width * height) as usize], width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.offset(x, y)] != OFF
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        let offset = self.offset(x, y);
        self.data[offset] = if on { ON } else { OFF };
    }

    /// Number of [`ON`] pixels.
    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v != OFF).count()
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape(self.shape(), &self.data)
            .expect("Mask data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut2<'_, u8> {
        ArrayViewMut2::from_shape(self.shape(), &mut self.data)
            .expect("Mask data length must match dimensions")
    }

    /// Copies the mask into a grayscale image, for debug dumps.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Mask data length must match dimensions")
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    fn shape(&self) -> (usize, usize) {
        (self.height as usize, self.width as usize)
    }
}
