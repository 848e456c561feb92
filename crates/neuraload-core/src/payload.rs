//! Binary payload layouts for the sensor characteristics
//!
//! Every numeric field is a little-endian IEEE-754 `f32`. Payloads carry no
//! header, length prefix or terminator:
//!
//! | Payload  | Layout                                             | Size      |
//! |----------|----------------------------------------------------|-----------|
//! | Inertial | 4 sensors x (accel XYZ, gyro XYZ, magnetometer XYZ) | 144 bytes |
//! | Ranging  | 4 distances                                        | 16 bytes  |
//! | Weight   | 1 value                                            | 4 bytes   |
//! | Identity | raw UTF-8                                          | variable  |

use serde::{Deserialize, Serialize};

use crate::errors::PayloadError;

// ----------------------------------------------------------------------------
// Layout Constants
// ----------------------------------------------------------------------------

/// Width of one numeric sample on the wire
pub const SAMPLE_WIDTH: usize = 4;

/// Number of inertial sensors in one inertial payload
pub const IMU_SENSOR_COUNT: usize = 4;

/// Floats per inertial sensor record
pub const IMU_AXIS_COUNT: usize = 9;

pub const INERTIAL_PAYLOAD_LEN: usize = IMU_SENSOR_COUNT * IMU_AXIS_COUNT * SAMPLE_WIDTH;

/// Number of ranging sensors in one ranging payload
pub const RANGING_SENSOR_COUNT: usize = 4;

pub const RANGING_PAYLOAD_LEN: usize = RANGING_SENSOR_COUNT * SAMPLE_WIDTH;

pub const WEIGHT_PAYLOAD_LEN: usize = SAMPLE_WIDTH;

// ----------------------------------------------------------------------------
// Inertial Record
// ----------------------------------------------------------------------------

/// One inertial sensor record: accelerometer, gyroscope and magnetometer axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuReading {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub mag: [f32; 3],
}

impl ImuReading {
    pub fn new(accel: [f32; 3], gyro: [f32; 3], mag: [f32; 3]) -> Self {
        Self { accel, gyro, mag }
    }

    /// Flatten into wire order: accel X/Y/Z, gyro X/Y/Z, mag X/Y/Z
    pub fn to_array(&self) -> [f32; IMU_AXIS_COUNT] {
        let [ax, ay, az] = self.accel;
        let [gx, gy, gz] = self.gyro;
        let [mx, my, mz] = self.mag;
        [ax, ay, az, gx, gy, gz, mx, my, mz]
    }

    pub fn from_array(values: [f32; IMU_AXIS_COUNT]) -> Self {
        let [ax, ay, az, gx, gy, gz, mx, my, mz] = values;
        Self {
            accel: [ax, ay, az],
            gyro: [gx, gy, gz],
            mag: [mx, my, mz],
        }
    }
}

// ----------------------------------------------------------------------------
// Generic Float Packing
// ----------------------------------------------------------------------------

/// Pack floats back to back as little-endian `f32`
pub fn encode_floats(values: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * SAMPLE_WIDTH);
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Unpack a buffer of little-endian `f32` values of any count
pub fn decode_floats(bytes: &[u8]) -> Result<Vec<f32>, PayloadError> {
    if bytes.len() % SAMPLE_WIDTH != 0 {
        return Err(PayloadError::MisalignedLength {
            width: SAMPLE_WIDTH,
            actual: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(SAMPLE_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn decode_exact<const N: usize>(bytes: &[u8]) -> Result<[f32; N], PayloadError> {
    let expected = N * SAMPLE_WIDTH;
    if bytes.len() != expected {
        return Err(PayloadError::InvalidLength {
            expected,
            actual: bytes.len(),
        });
    }

    let mut out = [0.0f32; N];
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(SAMPLE_WIDTH)) {
        *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(out)
}

// ----------------------------------------------------------------------------
// Characteristic Payloads
// ----------------------------------------------------------------------------

pub fn encode_inertial(readings: &[ImuReading; IMU_SENSOR_COUNT]) -> Vec<u8> {
    let flat: Vec<f32> = readings.iter().flat_map(|r| r.to_array()).collect();
    encode_floats(&flat)
}

pub fn decode_inertial(bytes: &[u8]) -> Result<[ImuReading; IMU_SENSOR_COUNT], PayloadError> {
    let flat = decode_exact::<{ IMU_SENSOR_COUNT * IMU_AXIS_COUNT }>(bytes)?;

    let mut readings = [ImuReading::default(); IMU_SENSOR_COUNT];
    for (reading, record) in readings.iter_mut().zip(flat.chunks_exact(IMU_AXIS_COUNT)) {
        let mut axes = [0.0f32; IMU_AXIS_COUNT];
        axes.copy_from_slice(record);
        *reading = ImuReading::from_array(axes);
    }
    Ok(readings)
}

pub fn encode_ranging(distances: &[f32; RANGING_SENSOR_COUNT]) -> Vec<u8> {
    encode_floats(distances)
}

pub fn decode_ranging(bytes: &[u8]) -> Result<[f32; RANGING_SENSOR_COUNT], PayloadError> {
    decode_exact::<RANGING_SENSOR_COUNT>(bytes)
}

pub fn encode_weight(weight: f32) -> Vec<u8> {
    weight.to_le_bytes().to_vec()
}

pub fn decode_weight(bytes: &[u8]) -> Result<f32, PayloadError> {
    let [weight] = decode_exact::<1>(bytes)?;
    Ok(weight)
}

pub fn encode_identity(device_id: &str) -> Vec<u8> {
    device_id.as_bytes().to_vec()
}

pub fn decode_identity(bytes: &[u8]) -> Result<String, PayloadError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| PayloadError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_readings() -> [ImuReading; IMU_SENSOR_COUNT] {
        [
            ImuReading::new([1.0, 0.5, 9.8], [0.01, 0.0, -0.02], [10.0, 5.0, -8.0]),
            ImuReading::new([0.9, 0.2, 9.7], [0.02, 0.1, 0.01], [15.0, -3.2, 12.0]),
            ImuReading::new([-0.4, 0.3, 9.6], [-0.05, 0.07, 0.0], [-20.5, 44.1, 3.3]),
            ImuReading::new([0.0, -1.0, 9.5], [0.1, -0.1, 0.03], [49.9, -49.9, 0.25]),
        ]
    }

    #[test]
    fn test_inertial_layout() {
        let readings = sample_readings();
        let bytes = encode_inertial(&readings);
        assert_eq!(bytes.len(), INERTIAL_PAYLOAD_LEN);
        assert_eq!(bytes.len(), 144);

        // Second sensor's gyro Y sits at float index 9 + 4
        let offset = (IMU_AXIS_COUNT + 4) * SAMPLE_WIDTH;
        assert_eq!(&bytes[offset..offset + 4], &0.1f32.to_le_bytes());

        assert_eq!(decode_inertial(&bytes).unwrap(), readings);
    }

    #[test]
    fn test_weight_payload() {
        let bytes = encode_weight(73.2);
        assert_eq!(bytes.len(), WEIGHT_PAYLOAD_LEN);
        assert_eq!(bytes, 73.2f32.to_le_bytes().to_vec());
        assert_eq!(decode_weight(&bytes).unwrap(), 73.2f32);
    }

    #[test]
    fn test_ranging_payload() {
        let distances = [2.1, 3.2, 4.5, 5.0];
        let bytes = encode_ranging(&distances);
        assert_eq!(bytes.len(), RANGING_PAYLOAD_LEN);
        assert_eq!(decode_ranging(&bytes).unwrap(), distances);
    }

    #[test]
    fn test_identity_payload_has_no_framing() {
        let bytes = encode_identity("NL-0001");
        assert_eq!(bytes, b"NL-0001".to_vec());
        assert_eq!(decode_identity(&bytes).unwrap(), "NL-0001");
        assert_eq!(decode_identity(&[0xff, 0xfe]), Err(PayloadError::InvalidUtf8));
    }

    #[test]
    fn test_length_errors() {
        assert_eq!(
            decode_weight(&[0, 0, 0]),
            Err(PayloadError::InvalidLength {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            decode_inertial(&[0u8; 140]),
            Err(PayloadError::InvalidLength {
                expected: 144,
                actual: 140
            })
        );
        assert_eq!(
            decode_floats(&[0u8; 6]),
            Err(PayloadError::MisalignedLength {
                width: 4,
                actual: 6
            })
        );
    }

    proptest! {
        #[test]
        fn prop_inertial_roundtrip_is_bit_exact(values in proptest::collection::vec(-1.0e6f64..1.0e6f64, 36)) {
            let mut readings = [ImuReading::default(); IMU_SENSOR_COUNT];
            for (i, reading) in readings.iter_mut().enumerate() {
                let mut axes = [0.0f32; IMU_AXIS_COUNT];
                for (j, axis) in axes.iter_mut().enumerate() {
                    *axis = values[i * IMU_AXIS_COUNT + j] as f32;
                }
                *reading = ImuReading::from_array(axes);
            }

            let decoded = decode_inertial(&encode_inertial(&readings)).unwrap();
            for (a, b) in decoded.iter().zip(readings.iter()) {
                for (x, y) in a.to_array().iter().zip(b.to_array().iter()) {
                    prop_assert_eq!(x.to_bits(), y.to_bits());
                }
            }
        }
    }
}
