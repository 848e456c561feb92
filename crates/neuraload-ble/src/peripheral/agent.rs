//! "Just works" pairing agent
//!
//! The sensor has no display or keyboard, so every pairing and service
//! authorization request is accepted.

use bluer::agent::{
    Agent, AgentHandle, AuthorizeService, ReqError, RequestAuthorization, RequestConfirmation,
};
use bluer::{Address, Session};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::error::Result as BleResult;

/// Register the default agent; keep the handle alive to stay registered
pub(super) async fn register(session: &Session, trust_devices: bool) -> BleResult<AgentHandle> {
    let authorization_session = session.clone();
    let service_session = session.clone();

    let agent = Agent {
        request_default: true,
        request_authorization: Some(Box::new(move |req| {
            authorize_pairing(authorization_session.clone(), trust_devices, req).boxed()
        })),
        request_confirmation: Some(Box::new(|req| confirm_passkey(req).boxed())),
        authorize_service: Some(Box::new(move |req| {
            authorize_service(service_session.clone(), trust_devices, req).boxed()
        })),
        ..Default::default()
    };

    let handle = session.register_agent(agent).await?;
    info!("Registered pairing agent (no input, no output)");
    Ok(handle)
}

async fn authorize_pairing(
    session: Session,
    trust_devices: bool,
    req: RequestAuthorization,
) -> Result<(), ReqError> {
    info!(device = %req.device, "Authorizing pairing");
    if trust_devices {
        trust_device(&session, &req.adapter, req.device).await;
    }
    Ok(())
}

async fn confirm_passkey(req: RequestConfirmation) -> Result<(), ReqError> {
    info!(device = %req.device, passkey = req.passkey, "Confirming passkey");
    Ok(())
}

async fn authorize_service(
    session: Session,
    trust_devices: bool,
    req: AuthorizeService,
) -> Result<(), ReqError> {
    debug!(device = %req.device, service = %req.service, "Authorizing service access");
    if trust_devices {
        trust_device(&session, &req.adapter, req.device).await;
    }
    Ok(())
}

async fn trust_device(session: &Session, adapter: &str, device: Address) {
    let result: bluer::Result<()> = async {
        session
            .adapter(adapter)?
            .device(device)?
            .set_trusted(true)
            .await
    }
    .await;

    match result {
        Ok(()) => info!(%device, "Marked device trusted"),
        Err(e) => warn!(%device, "Could not mark device trusted: {}", e),
    }
}
