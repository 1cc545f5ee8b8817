use crate::Error;

/// Owned row-major image, origin at the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds an image by evaluating `f(x, y)` in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

/// Borrowed image with an element stride that may exceed its width.
///
/// Views over a larger buffer (for example a padded image) are built with
/// [`ImageView::subview`].
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        if stride < width {
            return Err(Error::InvalidStride);
        }
        let min_len = min_required_len(width, height, stride).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() < min_len {
            return Err(Error::SizeMismatch {
                expected: min_len,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    /// `width x height` window with its top-left corner at `(x, y)`.
    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageView<'a, T>, Error> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
        if !(fits_x && fits_y) {
            return Err(Error::OutOfBounds);
        }
        if width == 0 || height == 0 {
            return Ok(ImageView {
                width,
                height,
                stride: self.stride,
                data: &[],
            });
        }

        let start = y * self.stride + x;
        Ok(ImageView {
            width,
            height,
            stride: self.stride,
            data: &self.data[start..],
        })
    }

    /// Applies `f` to every pixel, producing a packed image.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Image<U> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            data.extend(self.row(y).iter().map(&mut f));
        }
        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl<T: Copy> ImageView<'_, T> {
    /// Copies the view into a packed owned image.
    pub fn to_image(&self) -> Image<T> {
        if self.stride == self.width {
            let len = self.width * self.height;
            return Image {
                width: self.width,
                height: self.height,
                data: self.data[..len].to_vec(),
            };
        }
        self.map(|&v| v)
    }
}

fn min_required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }
    let base = (height - 1).checked_mul(stride)?;
    base.checked_add(width)
}

#[cfg(test)]
mod tests {
    use super::{Image, ImageView};
    use crate::Error;

    #[test]
    fn view_indexing_with_stride() {
        let data = vec![1.0f32, 2.0, 3.0, 99.0, 4.0, 5.0, 6.0, 88.0];
        let view = ImageView::from_slice(3, 2, 4, &data).expect("valid view");

        assert_eq!(view.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(view.get(2, 1), Some(&6.0));
        assert_eq!(view.get(3, 1), None);

        let packed = view.to_image();
        assert_eq!(packed.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(packed.shape(), (3, 2));
    }

    #[test]
    fn constructors_validate_lengths() {
        assert_eq!(
            Image::from_vec(3, 3, vec![0.0f32; 8]),
            Err(Error::SizeMismatch {
                expected: 9,
                actual: 8
            })
        );
        assert_eq!(
            ImageView::from_slice(3, 2, 2, &[0.0f32; 6]).err(),
            Some(Error::InvalidStride)
        );
    }

    #[test]
    fn from_fn_is_row_major() {
        let img = Image::from_fn(3, 2, |x, y| (10 * y + x) as f32);
        assert_eq!(img.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(img.get(1, 1), Some(&11.0));
        assert_eq!(img.get(3, 0), None);
    }

    #[test]
    fn subview_crops_a_border() {
        let img = Image::from_fn(6, 5, |x, y| (10 * y + x) as u8);
        let view = img.as_view();
        let inner = view.subview(1, 1, 4, 3).expect("inside");
        assert_eq!(inner.stride(), 6);
        assert_eq!(inner.row(0), &[11, 12, 13, 14]);
        assert_eq!(inner.to_image().row(2), &[31, 32, 33, 34]);

        assert!(view.subview(3, 0, 4, 1).is_err());
        assert!(view.subview(0, 0, 6, 5).is_ok());
        assert_eq!(view.subview(6, 5, 0, 0).expect("empty").shape(), (0, 0));
    }

    #[test]
    fn map_converts_pixels() {
        let img = Image::from_vec(2, 2, vec![0u8, 51, 204, 255]).expect("valid image");
        let out = img.as_view().map(|&g| g as f32 / 255.0);
        assert_eq!(out.data(), &[0.0, 0.2, 0.8, 1.0]);
    }
}
