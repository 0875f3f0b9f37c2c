//! In-memory contact registry with an append-only audit log.
//!
//! This is the plain, serializable state: a map of contacts, the audit
//! trail, and the id counters. Every mutating operation appends its audit
//! entry in the same call, so a registry snapshot is always internally
//! consistent. Concurrency and persistence live one layer up in
//! [`crate::store::ContactStore`].

use crate::error::StoreError;
use crate::types::{
    sanitize_name, AuditAction, AuditEntry, ConsentState, Contact, ContactId, Counts,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRegistry {
    /// Contacts indexed by surrogate id. Phone uniqueness is enforced by
    /// the mutation paths, not by the map key.
    contacts: HashMap<ContactId, Contact>,

    /// Append-only. Entries may refer to deleted contacts.
    audit: Vec<AuditEntry>,

    next_contact_id: u64,
    next_audit_id: u64,
}

impl ContactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup on the canonical phone. Callers normalize first.
    pub fn get_by_phone(&self, phone: &str) -> Option<&Contact> {
        self.contacts.values().find(|c| c.phone == phone)
    }

    pub fn get_by_id(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    /// Insert a new opted-in contact. Fails without mutation when the
    /// phone is already present.
    pub fn create(
        &mut self,
        phone: &str,
        name: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        if self.get_by_phone(phone).is_some() {
            return Err(StoreError::PhoneExists(phone.to_string()));
        }

        self.next_contact_id += 1;
        let contact = Contact::new(self.next_contact_id, phone, sanitize_name(name), Utc::now());
        self.contacts.insert(contact.id, contact.clone());

        self.append_audit(actor, AuditAction::Create, contact.id, None, Some(contact.clone()), origin);
        Ok(contact)
    }

    /// Set the consent state for an existing contact. The caller ensures
    /// existence first; an absent contact is a [`StoreError::NotFound`].
    /// Re-applying the current state still bumps `updated_at` and still
    /// produces an audit entry.
    pub fn set_consent(
        &mut self,
        phone: &str,
        state: ConsentState,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let id = self.get_by_phone(phone).ok_or(StoreError::NotFound)?.id;
        let contact = self.contacts.get_mut(&id).ok_or(StoreError::NotFound)?;
        let before = contact.clone();

        contact.consent = state;
        contact.updated_at = Utc::now();
        let after = contact.clone();

        let action = match state {
            ConsentState::OptedIn => AuditAction::OptIn,
            ConsentState::OptedOut => AuditAction::OptOut,
        };
        self.append_audit(actor, action, id, Some(before), Some(after.clone()), origin);
        Ok(after)
    }

    /// Store a sanitized display name for an existing contact.
    pub fn set_name(
        &mut self,
        phone: &str,
        name: &str,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let id = self.get_by_phone(phone).ok_or(StoreError::NotFound)?.id;
        let contact = self.contacts.get_mut(&id).ok_or(StoreError::NotFound)?;
        let before = contact.clone();

        contact.name = sanitize_name(name);
        contact.updated_at = Utc::now();
        let after = contact.clone();

        self.append_audit(actor, AuditAction::Update, id, Some(before), Some(after.clone()), origin);
        Ok(after)
    }

    /// The name-capture step as one decide-and-write: mutates only when
    /// the contact exists, is opted in, has no name on file, and the
    /// sanitized text is non-empty. `None` means nothing changed.
    pub fn capture_name(
        &mut self,
        phone: &str,
        raw: &str,
        actor: &str,
        origin: &str,
    ) -> Option<Contact> {
        let contact = self.get_by_phone(phone)?;
        if !contact.awaiting_name() {
            return None;
        }

        let name = sanitize_name(raw);
        if name.is_empty() {
            return None;
        }

        self.set_name(phone, &name, actor, origin).ok()
    }

    /// Admin full edit. A phone change is re-validated for uniqueness
    /// against all other contacts.
    pub fn update(
        &mut self,
        id: ContactId,
        phone: Option<&str>,
        name: Option<&str>,
        consent: Option<ConsentState>,
        actor: &str,
        origin: &str,
    ) -> Result<Contact, StoreError> {
        let before = self.contacts.get(&id).ok_or(StoreError::NotFound)?.clone();

        if let Some(new_phone) = phone {
            if let Some(existing) = self.get_by_phone(new_phone) {
                if existing.id != id {
                    return Err(StoreError::PhoneExists(new_phone.to_string()));
                }
            }
        }

        let contact = self.contacts.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(new_phone) = phone {
            contact.phone = new_phone.to_string();
        }
        if let Some(new_name) = name {
            contact.name = sanitize_name(new_name);
        }
        if let Some(new_consent) = consent {
            contact.consent = new_consent;
        }
        contact.updated_at = Utc::now();
        let after = contact.clone();

        self.append_audit(actor, AuditAction::Update, id, Some(before), Some(after.clone()), origin);
        Ok(after)
    }

    pub fn delete(&mut self, id: ContactId, actor: &str, origin: &str) -> Result<Contact, StoreError> {
        let removed = self.contacts.remove(&id).ok_or(StoreError::NotFound)?;
        self.append_audit(actor, AuditAction::Delete, id, Some(removed.clone()), None, origin);
        Ok(removed)
    }

    /// Contacts matching a case-insensitive substring of phone or name
    /// (all contacts when the query is empty), most recently updated
    /// first. Callers rely on this ordering.
    pub fn list(&self, query: &str) -> Vec<Contact> {
        let needle = query.trim().to_lowercase();
        let mut contacts: Vec<Contact> = self
            .contacts
            .values()
            .filter(|c| {
                needle.is_empty()
                    || c.phone.to_lowercase().contains(&needle)
                    || c.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        contacts.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        contacts
    }

    pub fn counts(&self) -> Counts {
        let opted_in = self
            .contacts
            .values()
            .filter(|c| c.consent.is_opted_in())
            .count();
        Counts {
            total: self.contacts.len(),
            opted_in,
            opted_out: self.contacts.len() - opted_in,
        }
    }

    /// Latest audit entries, newest first.
    pub fn audit_tail(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.iter().rev().take(limit).cloned().collect()
    }

    pub fn audit_len(&self) -> usize {
        self.audit.len()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    fn append_audit(
        &mut self,
        actor: &str,
        action: AuditAction,
        contact_id: ContactId,
        before: Option<Contact>,
        after: Option<Contact>,
        origin: &str,
    ) {
        // Wall clocks can step backwards; audit timestamps must not.
        let mut created_at: DateTime<Utc> = Utc::now();
        if let Some(last) = self.audit.last() {
            created_at = created_at.max(last.created_at);
        }

        self.next_audit_id += 1;
        self.audit.push(AuditEntry {
            id: self.next_audit_id,
            actor: actor.to_string(),
            action,
            contact_id,
            before,
            after,
            origin: origin.to_string(),
            created_at,
        });
    }
}
