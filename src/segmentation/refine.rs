use super::types::{Mask, MASK_OFF, MASK_ON};
use ndarray::Array2;

/// Side length of the square smoothing kernel
pub const BLUR_KERNEL_SIZE: usize = 5;

/// Blurred values at or above this level become `MASK_ON`
pub const BINARIZE_LEVEL: u8 = 128;

/// Smooth out speckle and ragged edges before contour tracing
///
/// Steps:
/// 1. Box blur with a 5x5 kernel (replicated border)
/// 2. Re-binarize at 128
///
/// A single pass is not guaranteed to be idempotent: thin features can keep
/// shrinking on repeated passes.
pub fn refine(mask: &Mask) -> Mask {
    let _span = tracing::debug_span!("refine").entered();

    let blurred = box_blur(mask, BLUR_KERNEL_SIZE / 2);
    binarize(&blurred, BINARIZE_LEVEL)
}

/// Mean filter over a (2 * half_width + 1)² window, rounded to nearest
pub fn box_blur(mask: &Mask, half_width: usize) -> Mask {
    if mask.is_empty() || half_width == 0 {
        return mask.clone();
    }

    let input = mask.as_array();
    let (height, width) = input.dim();
    let r = half_width as isize;
    let kernel_area = ((2 * half_width + 1) * (2 * half_width + 1)) as u32;

    // Horizontal pass
    let mut rows = Array2::<u32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for dx in -r..=r {
                let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                sum += u32::from(input[[y, sx]]);
            }
            rows[[y, x]] = sum;
        }
    }

    // Vertical pass
    let output = Array2::from_shape_fn((height, width), |(y, x)| {
        let mut sum = 0u32;
        for dy in -r..=r {
            let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
            sum += rows[[sy, x]];
        }
        ((sum + kernel_area / 2) / kernel_area) as u8
    });

    Mask::from_array(output)
}

/// Map values at or above `level` to `MASK_ON`, everything else to `MASK_OFF`
pub fn binarize(mask: &Mask, level: u8) -> Mask {
    Mask::from_array(
        mask.as_array()
            .mapv(|v| if v >= level { MASK_ON } else { MASK_OFF }),
    )
}
