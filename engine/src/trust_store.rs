//! Mutable trust store for the simple deployment profile.
//!
//! One slot per [`ServiceType`], each behind its own lock. An update swaps
//! the whole list, so a reader sees either the old list or the new one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use trustval_types::{Certificate, ServiceType};

type Slot = RwLock<Option<Arc<[Certificate]>>>;

pub struct TrustStore {
    slots: HashMap<ServiceType, Slot>,
}

impl TrustStore {
    pub fn new() -> Self {
        let slots = ServiceType::ALL
            .into_iter()
            .map(|service_type| (service_type, RwLock::new(None)))
            .collect();
        Self { slots }
    }

    /// Replace the certificates for `service_type`.
    pub async fn update(&self, service_type: ServiceType, certificates: Vec<Certificate>) {
        let Some(slot) = self.slots.get(&service_type) else {
            return;
        };
        let count = certificates.len();
        *slot.write().await = Some(certificates.into());
        info!(service_type = %service_type, certificates = count, "trust store updated");
    }

    /// Certificates for a service type given by name or URI. `None` if the
    /// value names no service type or nothing was stored for it yet.
    pub async fn lookup(&self, type_value: &str) -> Option<Arc<[Certificate]>> {
        let service_type: ServiceType = type_value.parse().ok()?;
        self.get(service_type).await
    }

    pub async fn get(&self, service_type: ServiceType) -> Option<Arc<[Certificate]>> {
        self.slots.get(&service_type)?.read().await.clone()
    }
}

impl Default for TrustStore {
    fn default() -> Self {
        Self::new()
    }
}
