//! Distance-based panning: how loud a speaker should be for a given source position.

use crate::surface::constants::FADER_MAX;
use crate::surface::floor_plan::Speaker;
use crate::surface::geometry::Point;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Converts a distance into a gain in `[0, 1]`.
///
/// The gain is 1 at distance 0 and falls linearly to 0 at `max_distance`. A
/// `max_distance` that is not a positive finite number yields 0 for every input.
pub fn distance_to_volume(distance: f64, max_distance: f64) -> f64 {
    if !max_distance.is_finite() || max_distance <= 0.0 || distance.is_nan() {
        return 0.0;
    }

    if distance >= max_distance {
        return 0.0;
    }

    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Maps a normalized level in `[0, 1]` onto the mixer's fader range.
pub fn volume_to_fader_value(volume: f64) -> u16 {
    let volume = if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    };

    (volume * f64::from(FADER_MAX)).round() as u16
}

/// Gain of every speaker for a source at `source` (venue meters).
pub fn speaker_gains<'a>(
    source: Point,
    speakers: &'a [Speaker],
    max_distance: f64,
) -> Vec<(&'a str, f64)> {
    speakers
        .iter()
        .map(|sp| {
            let gain = distance_to_volume(distance(source, sp.position()), max_distance);
            (sp.id.as_str(), gain)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::floor_plan::SpeakerType;

    #[test]
    fn test_distance() {
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert_eq!(distance(Point::new(1.0, 1.0), Point::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_distance_to_volume_endpoints() {
        for m in [0.5, 1.0, 24.6] {
            assert_eq!(distance_to_volume(0.0, m), 1.0);
            assert_eq!(distance_to_volume(m, m), 0.0);
            assert_eq!(distance_to_volume(m * 3.0, m), 0.0);
        }
        assert!((distance_to_volume(2.5, 10.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_volume_is_monotonic() {
        let m = 12.0;
        let mut prev = f64::INFINITY;
        for i in 0..200 {
            let v = distance_to_volume(i as f64 * 0.1, m);
            assert!((0.0..=1.0).contains(&v));
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn test_distance_to_volume_degenerate_max() {
        assert_eq!(distance_to_volume(0.0, 0.0), 0.0);
        assert_eq!(distance_to_volume(1.0, -5.0), 0.0);
        assert_eq!(distance_to_volume(1.0, f64::NAN), 0.0);
        assert_eq!(distance_to_volume(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn test_volume_to_fader_value() {
        assert_eq!(volume_to_fader_value(0.0), 0);
        assert_eq!(volume_to_fader_value(0.5), 512);
        assert_eq!(volume_to_fader_value(1.0), 1023);
        assert_eq!(volume_to_fader_value(1.7), 1023);
        assert_eq!(volume_to_fader_value(-0.2), 0);
        assert_eq!(volume_to_fader_value(f64::NAN), 0);
    }

    #[test]
    fn test_speaker_gains() {
        let speakers = vec![
            Speaker::new("near", 0.0, 0.0, SpeakerType::A),
            Speaker::new("far", 10.0, 0.0, SpeakerType::A),
        ];
        let gains = speaker_gains(Point::new(0.0, 0.0), &speakers, 10.0);

        assert_eq!(gains[0], ("near", 1.0));
        assert_eq!(gains[1], ("far", 0.0));
    }
}
