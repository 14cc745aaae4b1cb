//! The 10-point grade scale.
//!
//! Marks map onto grade points through inclusive lower bounds; the highest
//! band a mark reaches wins. There is no band between 0 and 4: anything
//! below 40 is a fail and earns nothing.

/// Inclusive lower bound → grade point, highest band first.
const BANDS: [(f64, u8); 7] = [
    (90.0, 10),
    (80.0, 9),
    (70.0, 8),
    (60.0, 7),
    (50.0, 6),
    (45.0, 5),
    (40.0, 4),
];

/// Grade point for a raw mark.
///
/// Total over all inputs: marks above 100 land in the top band, negative
/// marks (and NaN) earn 0.
pub fn grade_point(marks: f64) -> u8 {
    BANDS
        .iter()
        .find(|(floor, _)| marks >= *floor)
        .map(|&(_, points)| points)
        .unwrap_or(0)
}
