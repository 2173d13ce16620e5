use crate::types::GazeSample;
use crate::{GazeError, Result};

// -- Network defaults --
pub const DEFAULT_PORT: u16 = 5005;

// -- Record geometry --
pub const RECORD_SIZE: usize = 24;

pub const OFFSET_TIMESTAMP: usize = 0;
pub const OFFSET_GAZE_X: usize = 8;
pub const OFFSET_GAZE_Y: usize = 12;
pub const OFFSET_SCREEN_X: usize = 16;
pub const OFFSET_SCREEN_Y: usize = 20;

fn read_f64(data: &[u8], at: usize) -> f64 {
    f64::from_le_bytes([
        data[at],
        data[at + 1],
        data[at + 2],
        data[at + 3],
        data[at + 4],
        data[at + 5],
        data[at + 6],
        data[at + 7],
    ])
}

fn read_f32(data: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Decode a gaze datagram into a [`GazeSample`].
///
/// Record layout (all little-endian):
/// - `[0..8)`: f64 timestamp
/// - `[8..12)`: f32 gaze x
/// - `[12..16)`: f32 gaze y
/// - `[16..20)`: f32 screen x
/// - `[20..24)`: f32 screen y
///
/// Anything past byte 24 is ignored so producers can append fields.
pub fn decode(data: &[u8]) -> Result<GazeSample> {
    if data.len() < RECORD_SIZE {
        return Err(GazeError::TooShort { len: data.len() });
    }

    Ok(GazeSample {
        timestamp: read_f64(data, OFFSET_TIMESTAMP),
        gaze_x: read_f32(data, OFFSET_GAZE_X),
        gaze_y: read_f32(data, OFFSET_GAZE_Y),
        screen_x: read_f32(data, OFFSET_SCREEN_X),
        screen_y: read_f32(data, OFFSET_SCREEN_Y),
    })
}

/// Encode a sample into the 24-byte wire record.
pub fn encode(sample: &GazeSample) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[OFFSET_TIMESTAMP..OFFSET_GAZE_X].copy_from_slice(&sample.timestamp.to_le_bytes());
    buf[OFFSET_GAZE_X..OFFSET_GAZE_Y].copy_from_slice(&sample.gaze_x.to_le_bytes());
    buf[OFFSET_GAZE_Y..OFFSET_SCREEN_X].copy_from_slice(&sample.gaze_y.to_le_bytes());
    buf[OFFSET_SCREEN_X..OFFSET_SCREEN_Y].copy_from_slice(&sample.screen_x.to_le_bytes());
    buf[OFFSET_SCREEN_Y..RECORD_SIZE].copy_from_slice(&sample.screen_y.to_le_bytes());
    buf
}

impl TryFrom<&[u8]> for GazeSample {
    type Error = GazeError;

    fn try_from(data: &[u8]) -> Result<Self> {
        decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1000.5, 0.5, 0.5, 960.0, 540.0 packed by hand.
    const SCENARIO: [u8; 24] = [
        0x00, 0x00, 0x00, 0x00, 0x00, 0x44, 0x8f, 0x40, // 1000.5
        0x00, 0x00, 0x00, 0x3f, // 0.5
        0x00, 0x00, 0x00, 0x3f, // 0.5
        0x00, 0x00, 0x70, 0x44, // 960.0
        0x00, 0x00, 0x07, 0x44, // 540.0
    ];

    #[test]
    fn test_decode_known_bytes() {
        let sample = decode(&SCENARIO).unwrap();
        assert_eq!(sample.timestamp, 1000.5);
        assert_eq!(sample.gaze_x, 0.5);
        assert_eq!(sample.gaze_y, 0.5);
        assert_eq!(sample.screen_x, 960.0);
        assert_eq!(sample.screen_y, 540.0);
    }

    #[test]
    fn test_decode_distinct_field_offsets() {
        let mut data = [0u8; 24];
        data[0..8].copy_from_slice(&(-2.25f64).to_le_bytes());
        data[8..12].copy_from_slice(&1.0f32.to_le_bytes());
        data[12..16].copy_from_slice(&2.0f32.to_le_bytes());
        data[16..20].copy_from_slice(&3.0f32.to_le_bytes());
        data[20..24].copy_from_slice(&4.0f32.to_le_bytes());

        let sample = decode(&data).unwrap();
        assert_eq!(sample, GazeSample::new(-2.25, 1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_decode_too_short() {
        for len in [0usize, 1, 5, 10, 23] {
            let data = vec![0xAB; len];
            match decode(&data) {
                Err(GazeError::TooShort { len: got }) => assert_eq!(got, len),
                other => panic!("expected TooShort for {} bytes, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let base = decode(&SCENARIO).unwrap();

        let mut extended = SCENARIO.to_vec();
        extended.extend_from_slice(&[0xFF; 40]);
        assert_eq!(decode(&extended).unwrap(), base);

        let mut other_tail = SCENARIO.to_vec();
        other_tail.extend_from_slice(&[0x00, 0x7F, 0x80]);
        assert_eq!(decode(&other_tail).unwrap(), base);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let a = decode(&SCENARIO).unwrap();
        let b = decode(&SCENARIO).unwrap();
        assert_eq!(a.timestamp.to_bits(), b.timestamp.to_bits());
        assert_eq!(a.screen_x.to_bits(), b.screen_x.to_bits());
        assert_eq!(a.screen_y.to_bits(), b.screen_y.to_bits());
    }

    #[test]
    fn test_decode_passes_non_finite_through() {
        let sample = GazeSample::new(f64::INFINITY, f32::NAN, -0.0, -50.0, 1e9);
        let decoded = decode(&encode(&sample)).unwrap();
        assert_eq!(decoded.timestamp, f64::INFINITY);
        assert!(decoded.gaze_x.is_nan());
        assert_eq!(decoded.gaze_y.to_bits(), (-0.0f32).to_bits());
        assert_eq!(decoded.screen_x, -50.0);
        assert_eq!(decoded.screen_y, 1e9);
    }

    #[test]
    fn test_encode_matches_wire_layout() {
        let sample = GazeSample::new(1000.5, 0.5, 0.5, 960.0, 540.0);
        assert_eq!(encode(&sample), SCENARIO);
    }

    #[test]
    fn test_encode_decode_bit_exact() {
        let sample = GazeSample::new(
            1_716_000_000_123_456_789.0,
            0.123_456_7,
            0.987_654_3,
            1919.999,
            0.001,
        );
        let decoded = decode(&encode(&sample)).unwrap();
        assert_eq!(decoded.timestamp.to_bits(), sample.timestamp.to_bits());
        assert_eq!(decoded.gaze_x.to_bits(), sample.gaze_x.to_bits());
        assert_eq!(decoded.gaze_y.to_bits(), sample.gaze_y.to_bits());
        assert_eq!(decoded.screen_x.to_bits(), sample.screen_x.to_bits());
        assert_eq!(decoded.screen_y.to_bits(), sample.screen_y.to_bits());
    }

    #[test]
    fn test_try_from_slice() {
        let sample = GazeSample::try_from(&SCENARIO[..]).unwrap();
        assert_eq!(sample.screen_point(), (960.0, 540.0));
        assert!(GazeSample::try_from(&SCENARIO[..20]).is_err());
    }
}
