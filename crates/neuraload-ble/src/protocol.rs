//! BLE protocol constants and payload helpers for the sensor service

use neuraload_core::payload::{decode_identity, decode_inertial, decode_ranging, decode_weight};
use neuraload_core::PublishError;
use uuid::Uuid;

pub use neuraload_core::{
    DEVICE_ID_CHARACTERISTIC_UUID, INERTIAL_CHARACTERISTIC_UUID, RANGING_CHARACTERISTIC_UUID,
    SENSOR_SERVICE_UUID, WEIGHT_CHARACTERISTIC_UUID,
};

// ----------------------------------------------------------------------------
// GATT Constants
// ----------------------------------------------------------------------------

/// Characteristic User Description descriptor (0x2901)
pub const USER_DESCRIPTION_DESCRIPTOR_UUID: Uuid =
    Uuid::from_u128(0x00002901_0000_1000_8000_00805f9b34fb);

/// Name advertised when none is configured
pub const DEFAULT_LOCAL_NAME: &str = "NeuraLoad";

/// GAP device name limit
pub const MAX_LOCAL_NAME_LEN: usize = 248;

// ----------------------------------------------------------------------------
// Payload Helpers
// ----------------------------------------------------------------------------

/// Tail of `value` starting at `offset`, as served for a long read.
///
/// An offset equal to the length yields an empty tail; anything past the end
/// is invalid.
pub fn slice_from_offset(value: &[u8], offset: usize) -> Option<Vec<u8>> {
    value.get(offset..).map(<[u8]>::to_vec)
}

/// Why a read request could not be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRejection {
    NotPermitted,
    InvalidOffset,
    Failed,
}

/// Response to a read at `offset`, given the characteristic's fresh read
pub fn read_response(
    value: neuraload_core::Result<Vec<u8>>,
    offset: usize,
) -> Result<Vec<u8>, ReadRejection> {
    match value {
        Ok(value) => slice_from_offset(&value, offset).ok_or(ReadRejection::InvalidOffset),
        Err(PublishError::NotPermitted { .. }) => Err(ReadRejection::NotPermitted),
        Err(_) => Err(ReadRejection::Failed),
    }
}

/// Value of the Characteristic User Description descriptor (UTF-8, no terminator)
pub fn user_description_value(description: &str) -> Vec<u8> {
    description.as_bytes().to_vec()
}

/// Decode a sensor payload into a single human-readable line
pub fn describe_payload(uuid: Uuid, bytes: &[u8]) -> String {
    let described = match uuid {
        INERTIAL_CHARACTERISTIC_UUID => decode_inertial(bytes).map(|imu| {
            imu.iter()
                .enumerate()
                .map(|(i, r)| {
                    format!(
                        "imu{} accel={:.3?} gyro={:.3?} mag={:.2?}",
                        i, r.accel, r.gyro, r.mag
                    )
                })
                .collect::<Vec<_>>()
                .join("; ")
        }),
        RANGING_CHARACTERISTIC_UUID => {
            decode_ranging(bytes).map(|ranging| format!("ranging={:.3?} m", ranging))
        }
        WEIGHT_CHARACTERISTIC_UUID => decode_weight(bytes).map(|w| format!("weight={:.2} kg", w)),
        DEVICE_ID_CHARACTERISTIC_UUID => decode_identity(bytes).map(|id| format!("device_id={}", id)),
        _ => return format!("{} bytes: {}", bytes.len(), hex::encode(bytes)),
    };

    described.unwrap_or_else(|e| format!("undecodable ({}): {}", e, hex::encode(bytes)))
}
