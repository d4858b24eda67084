//! Per-install device identity
//!
//! A pseudo-random identifier generated once per install and immutable
//! thereafter, used as the anonymous identity anchor for telemetry when no
//! authenticated session exists.

use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use stopllms_core::StorageArea;
use tracing::warn;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// Device identifier custody over the durable storage area.
pub struct DeviceIdentity {
    durable: Arc<dyn StorageArea>,
}

impl DeviceIdentity {
    /// Create an identity provider over the durable storage area.
    pub fn new(durable: Arc<dyn StorageArea>) -> Self {
        Self { durable }
    }

    /// The install's device id, generating and persisting it on first use.
    ///
    /// Storage failures degrade to an ephemeral (unpersisted) id rather
    /// than failing telemetry.
    pub async fn get_or_create(&self) -> String {
        let key = stopllms_domain::constants::DEVICE_ID_KEY;

        match self.durable.get(key).await {
            Ok(Some(Value::String(id))) if !id.is_empty() => return id,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "device id read failed; using ephemeral id");
                return generate_device_id();
            }
        }

        let id = generate_device_id();
        if let Err(err) = self.durable.set(key, Value::String(id.clone())).await {
            warn!(error = %err, "device id persist failed; id will rotate next start");
        }
        id
    }
}

/// `dev_` + 8 random lowercase base36 characters.
fn generate_device_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..SUFFIX_LEN).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect();
    format!("dev_{suffix}")
}
