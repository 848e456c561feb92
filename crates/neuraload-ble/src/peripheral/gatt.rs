//! GATT application built from the scheduled characteristics

use std::sync::Arc;

use bluer::gatt::local::{
    Application, Characteristic as GattCharacteristic, CharacteristicNotifier,
    CharacteristicNotify, CharacteristicNotifyMethod, CharacteristicRead,
    CharacteristicReadRequest, Descriptor, DescriptorRead, DescriptorReadRequest, ReqError,
    Service as GattService,
};
use futures::FutureExt;
use neuraload_core::{CharacteristicHandle, Service};
use tracing::{debug, warn};

use crate::notifier::serve_session;
use crate::protocol::{
    read_response, user_description_value, ReadRejection, USER_DESCRIPTION_DESCRIPTOR_UUID,
};

use super::PeripheralSink;

// ----------------------------------------------------------------------------
// Application
// ----------------------------------------------------------------------------

/// One GATT service mirroring `service`, in registration order
pub(super) fn application(
    service: &Service,
    handles: &[CharacteristicHandle],
    sink: &Arc<PeripheralSink>,
) -> Application {
    let characteristics = handles
        .iter()
        .map(|handle| characteristic(handle.clone(), Arc::clone(sink)))
        .collect();

    Application {
        services: vec![GattService {
            uuid: service.uuid(),
            primary: service.is_primary(),
            characteristics,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn characteristic(handle: CharacteristicHandle, sink: Arc<PeripheralSink>) -> GattCharacteristic {
    let access = handle.access();

    let read = access.read.then(|| {
        let handle = handle.clone();
        CharacteristicRead {
            read: true,
            fun: Box::new(move |req| read_value(handle.clone(), req).boxed()),
            ..Default::default()
        }
    });

    let notify = access.notify.then(|| {
        let handle = handle.clone();
        CharacteristicNotify {
            notify: true,
            method: CharacteristicNotifyMethod::Fun(Box::new(
                move |notifier: CharacteristicNotifier| {
                    serve_session(handle.clone(), Arc::clone(&sink), notifier).boxed()
                },
            )),
            ..Default::default()
        }
    });

    GattCharacteristic {
        uuid: handle.uuid(),
        read,
        notify,
        descriptors: vec![user_description(handle.description())],
        ..Default::default()
    }
}

/// Characteristic User Description descriptor carrying `description`
fn user_description(description: &str) -> Descriptor {
    let value = user_description_value(description);
    Descriptor {
        uuid: USER_DESCRIPTION_DESCRIPTOR_UUID,
        read: Some(DescriptorRead {
            read: true,
            fun: Box::new(move |req| read_description(value.clone(), req).boxed()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ----------------------------------------------------------------------------
// Request Handlers
// ----------------------------------------------------------------------------

async fn read_value(
    handle: CharacteristicHandle,
    req: CharacteristicReadRequest,
) -> Result<Vec<u8>, ReqError> {
    let uuid = handle.uuid();
    let value = handle.read().await;
    match &value {
        Ok(value) => debug!(
            %uuid,
            device = %req.device_address,
            offset = req.offset,
            mtu = req.mtu,
            "Read {} bytes",
            value.len()
        ),
        Err(e) => warn!(%uuid, device = %req.device_address, "Read failed: {}", e),
    }
    read_response(value, usize::from(req.offset)).map_err(req_error)
}

async fn read_description(
    value: Vec<u8>,
    req: DescriptorReadRequest,
) -> Result<Vec<u8>, ReqError> {
    read_response(Ok(value), usize::from(req.offset)).map_err(req_error)
}

fn req_error(rejection: ReadRejection) -> ReqError {
    match rejection {
        ReadRejection::NotPermitted => ReqError::NotPermitted,
        ReadRejection::InvalidOffset => ReqError::InvalidOffset,
        ReadRejection::Failed => ReqError::Failed,
    }
}
