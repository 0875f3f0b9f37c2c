//! Concurrent contact store.
//!
//! Wraps the in-memory registry in a [`tokio::sync::RwLock`] and couples
//! every mutation to its persistence snapshot and export refresh. The
//! write lock is held across all three steps, so "mutate + audit +
//! persist + export" is one unit per request: concurrent webhook
//! deliveries and admin edits can never record a stale audit snapshot or
//! leave the export artifacts behind the committed state.

use crate::error::StoreError;
use crate::export::ExportSink;
use crate::persist::Persistence;
use crate::registry::ContactRegistry;
use crate::types::{AuditEntry, ConsentState, Contact, ContactId, Counts};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ContactStore {
    registry: Arc<RwLock<ContactRegistry>>,
    persistence: Arc<Persistence>,
    exports: Arc<ExportSink>,
}

impl ContactStore {
    pub fn new(registry: ContactRegistry, persistence: Persistence, exports: ExportSink) -> Self {
        info!("Contact store initialized with {} contacts", registry.len());
        Self {
            registry: Arc::new(RwLock::new(registry)),
            persistence: Arc::new(persistence),
            exports: Arc::new(exports),
        }
    }

    /// Persist the registry and rebuild both export artifacts. Called with
    /// the write lock held so refreshes never interleave.
    async fn commit(&self, registry: &ContactRegistry) -> Result<(), StoreError> {
        self.persistence.save(registry).await?;
        self.exports.refresh(registry).await?;
        Ok(())
    }

    /// Rebuild the export artifacts from current state, e.g. at startup.
    pub async fn refresh_exports(&self) -> Result<(), StoreError> {
        let registry = self.registry.read().await;
        self.exports.refresh(&registry).await
    }

    pub async fn get_by_phone(&self, phone: &str) -> Option<Contact> {
        self.registry.read().await.get_by_phone(phone).cloned()
    }

    pub async fn get_by_id(&self, id: ContactId) -> Option<Contact> {
        self.registry.read().await.get_by_id(id).cloned()
    }

    pub async fn list(&self, query: &str) -> Vec<Contact> {
        self.registry.read().await.list(query)
    }

    pub async fn counts(&self) -> Counts {
        self.registry.read().await.counts()
    }

    pub async fn audit_tail(&self, limit: usize) -> Vec<AuditEntry> {
        self.registry.read().await.audit_tail(limit)
    }

    pub async fn create(
        &self,
        phone: &str,
        name: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        let contact = registry.create(phone, name, actor, origin)?;
        self.commit(&registry).await?;
        debug!(phone = %contact.phone, actor, "Contact created");
        Ok(contact)
    }

    pub async fn set_consent(
        &self,
        phone: &str,
        state: ConsentState,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        let contact = registry.set_consent(phone, state, actor, origin)?;
        self.commit(&registry).await?;
        debug!(phone = %contact.phone, ?state, actor, "Consent updated");
        Ok(contact)
    }

    pub async fn update(
        &self,
        id: ContactId,
        phone: Option<&str>,
        name: Option<&str>,
        consent: Option<ConsentState>,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        let contact = registry.update(id, phone, name, consent, actor, origin)?;
        self.commit(&registry).await?;
        debug!(id, actor, "Contact updated");
        Ok(contact)
    }

    pub async fn delete(&self, id: ContactId, actor: &str, origin: &str) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        let removed = registry.delete(id, actor, origin)?;
        self.commit(&registry).await?;
        debug!(id, actor, "Contact deleted");
        Ok(removed)
    }

    /// Inbound opt-out: create the contact if it is unknown, then mark it
    /// opted out. One lock scope, up to two audit entries.
    pub async fn record_opt_out(
        &self,
        phone: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        if registry.get_by_phone(phone).is_none() {
            registry.create(phone, "", actor, origin)?;
        }
        let contact = registry.set_consent(phone, ConsentState::OptedOut, actor, origin)?;
        self.commit(&registry).await?;
        debug!(phone = %contact.phone, "Opt-out recorded");
        Ok(contact)
    }

    /// Inbound opt-in: create the contact if it is unknown, then mark it
    /// opted in. The returned contact's empty name tells the caller the
    /// subscriber still needs to be asked for one.
    pub async fn record_opt_in(
        &self,
        phone: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let mut registry = self.registry.write().await;
        if registry.get_by_phone(phone).is_none() {
            registry.create(phone, "", actor, origin)?;
        }
        let contact = registry.set_consent(phone, ConsentState::OptedIn, actor, origin)?;
        self.commit(&registry).await?;
        debug!(phone = %contact.phone, "Opt-in recorded");
        Ok(contact)
    }

    /// Inbound name capture. `Ok(None)` means the message did not apply
    /// (unknown contact, not awaiting a name, or nothing survived
    /// sanitization) and nothing was mutated.
    pub async fn capture_name(
        &self,
        phone: &str,
        raw: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Option<Contact>, StoreError> {
        let mut registry = self.registry.write().await;
        match registry.capture_name(phone, raw, actor, origin) {
            Some(contact) => {
                self.commit(&registry).await?;
                debug!(phone = %contact.phone, name = %contact.name, "Name captured");
                Ok(Some(contact))
            }
            None => Ok(None),
        }
    }
}
