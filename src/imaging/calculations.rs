//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the size of an image scaled down to fit inside a bounding box.
///
/// Aspect ratio is preserved and images are never enlarged: a source that
/// already fits is returned unchanged. Both output edges are at least 1px.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `bounds` - Maximum dimensions (width, height)
///
/// # Examples
/// ```
/// # use bee_convert::imaging::calculate_fit_dimensions;
/// // 4032x3024 phone photo into a 320x240 preview → 320x240
/// assert_eq!(calculate_fit_dimensions((4032, 3024), (320, 240)), (320, 240));
///
/// // Portrait 3024x4032 into the same box → 180x240
/// assert_eq!(calculate_fit_dimensions((3024, 4032), (320, 240)), (180, 240));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (src_w.min(max_w), src_h.min(max_h));
    }
    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}
