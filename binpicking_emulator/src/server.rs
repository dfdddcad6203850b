//! Zenoh queryables for the emulator's services. Payloads are JSON both
//! ways; a query without a payload is a default request.

use crate::error::ServiceError;
use crate::handlers::{Emulator, Service};
use crate::planner::{MotionPlanner, PoseSource};
use binpicking_lib::EmulatorConfig;
use eyre::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zenoh::query::Query;
use zenoh::Session;

pub fn decode_payload<T: DeserializeOwned + Default>(payload: &[u8]) -> Result<T, ServiceError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(payload).map_err(ServiceError::BadRequest)
}

pub fn encode_reply<T: Serialize>(response: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(response).map_err(ServiceError::Encode)
}

/// Key expression of every service, in registration order.
pub fn service_keys(config: &EmulatorConfig) -> Vec<(Service, String)> {
    Service::ALL
        .into_iter()
        .map(|service| (service, config.service_key(service.name())))
        .collect()
}

/// Declare one queryable per service. Every query is answered on its own
/// task so slow stubs do not hold up other services.
pub async fn serve<P, S>(
    session: &Session,
    emulator: Arc<Emulator<P, S>>,
    config: &EmulatorConfig,
) -> Result<Vec<JoinHandle<()>>>
where
    P: MotionPlanner + 'static,
    S: PoseSource + 'static,
{
    let mut tasks = Vec::with_capacity(Service::ALL.len());

    for (service, key) in service_keys(config) {
        let queryable = session
            .declare_queryable(&key)
            .await
            .map_err(|e| eyre::eyre!("Failed to declare queryable {}: {}", key, e))?;
        info!("Serving {}", key);

        let emulator = emulator.clone();
        tasks.push(tokio::spawn(async move {
            while let Ok(query) = queryable.recv_async().await {
                tokio::spawn(answer(emulator.clone(), service, query));
            }
            debug!("Queryable {} closed", key);
        }));
    }

    Ok(tasks)
}

async fn answer<P, S>(emulator: Arc<Emulator<P, S>>, service: Service, query: Query)
where
    P: MotionPlanner,
    S: PoseSource,
{
    let payload = query
        .payload()
        .map(|p| p.to_bytes().into_owned())
        .unwrap_or_default();

    match emulator.dispatch(service, &payload).await {
        Ok(reply) => {
            if let Err(e) = query.reply(query.key_expr().clone(), reply).await {
                warn!("Failed to reply to {}: {}", service.name(), e);
            }
        }
        Err(e) => {
            warn!("{} request rejected: {}", service.name(), e);
            if let Err(e) = query.reply_err(e.to_string()).await {
                warn!("Failed to send error reply to {}: {}", service.name(), e);
            }
        }
    }
}
