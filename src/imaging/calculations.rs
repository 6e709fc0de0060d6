//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate thumbnail dimensions for a fixed target width.
///
/// The width is clamped to the original so small images are never upscaled.
/// The height keeps the source aspect ratio, rounded to the nearest pixel.
///
/// # Arguments
/// * `original` - Source image dimensions (width, height)
/// * `target_width` - Desired thumbnail width in pixels
///
/// # Returns
/// * `(width, height)` - Final thumbnail dimensions
///
/// # Examples
/// ```
/// # use gallery_tools::imaging::calculate_width_fit;
/// // 1200x800 landscape at 400px wide → 400x267
/// assert_eq!(calculate_width_fit((1200, 800), 400), (400, 267));
///
/// // Already narrower than the target → unchanged
/// assert_eq!(calculate_width_fit((300, 200), 400), (300, 200));
/// ```
pub fn calculate_width_fit(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;

    if orig_w == 0 || orig_w <= target_width {
        return original;
    }

    let h = (target_width as f64 * orig_h as f64 / orig_w as f64).round() as u32;
    // A 1px-tall sliver still has to encode to something
    (target_width, h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_width_fit tests
    // =========================================================================

    #[test]
    fn width_fit_landscape_rounds_up() {
        // 800 * 400 / 1200 = 266.67 → 267
        assert_eq!(calculate_width_fit((1200, 800), 400), (400, 267));
    }

    #[test]
    fn width_fit_four_by_three() {
        assert_eq!(calculate_width_fit((800, 600), 400), (400, 300));
    }

    #[test]
    fn width_fit_portrait() {
        // 1000 * 400 / 600 = 666.67 → 667
        assert_eq!(calculate_width_fit((600, 1000), 400), (400, 667));
    }

    #[test]
    fn width_fit_rounds_down_below_half() {
        // 1000 * 400 / 3000 = 133.33 → 133
        assert_eq!(calculate_width_fit((3000, 1000), 400), (400, 133));
    }

    #[test]
    fn width_fit_no_upscale_when_narrower() {
        assert_eq!(calculate_width_fit((300, 500), 400), (300, 500));
    }

    #[test]
    fn width_fit_no_upscale_when_equal() {
        assert_eq!(calculate_width_fit((400, 250), 400), (400, 250));
    }

    #[test]
    fn width_fit_extreme_panorama_keeps_one_pixel() {
        assert_eq!(calculate_width_fit((100_000, 10), 400), (400, 1));
    }

    #[test]
    fn width_fit_zero_width_passthrough() {
        assert_eq!(calculate_width_fit((0, 0), 400), (0, 0));
    }
}
