/// One accepted circular region in a frame.
///
/// Coordinates are in processing-resolution pixels (the resolution the
/// detector actually ran at), sub-pixel precise from the enclosing-circle fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub center: (f64, f64),
    pub radius: f64,
    /// Shape score in (0, 1]; see [`circularity`].
    pub circularity: f64,
}

/// Shape descriptor `4π·area / perimeter²`.
///
/// Equals 1.0 for a perfect circle and drops toward 0 for elongated or
/// ragged shapes. Callers must reject zero perimeters before calling.
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    debug_assert!(perimeter > 0.0, "perimeter must be positive");
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}
