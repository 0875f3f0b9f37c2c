//! API request and response types.

use contact_store::{AuditEntry, ConsentState, Contact};
use serde::{Deserialize, Serialize};

/// Inbound webhook payload. The delivery provider posts an urlencoded form
/// with capitalized field names; both default to empty so a malformed post
/// still reaches the degraded-reply path instead of an extractor error.
#[derive(Debug, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "From", default)]
    pub from: String,

    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Request to create a contact.
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    /// Raw phone text; normalized before storage
    pub phone: String,

    /// Optional display name; sanitized before storage
    #[serde(default)]
    pub name: Option<String>,

    /// Acting admin identity; defaults to the configured actor
    #[serde(default)]
    pub actor: Option<String>,
}

/// Request to update a contact's fields. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub consent: Option<ConsentState>,

    #[serde(default)]
    pub actor: Option<String>,
}

/// Request to set a contact's consent state.
#[derive(Debug, Deserialize)]
pub struct SetConsentRequest {
    pub state: ConsentState,

    #[serde(default)]
    pub actor: Option<String>,
}

/// Request body for deletes (actor attribution only).
#[derive(Debug, Default, Deserialize)]
pub struct DeleteContactRequest {
    #[serde(default)]
    pub actor: Option<String>,
}

/// Contact info for API responses.
#[derive(Debug, Serialize)]
pub struct ContactInfo {
    pub id: u64,
    pub phone: String,
    pub name: String,
    pub consent: ConsentState,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Contact> for ContactInfo {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id,
            phone: contact.phone.clone(),
            name: contact.name.clone(),
            consent: contact.consent,
            created_at: contact.created_at.to_rfc3339(),
            updated_at: contact.updated_at.to_rfc3339(),
        }
    }
}

/// Single-contact response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub contact: ContactInfo,
}

/// Contact listing with registry totals.
#[derive(Debug, Serialize)]
pub struct ContactsResponse {
    pub contacts: Vec<ContactInfo>,
    pub total: usize,
    pub opted_in: usize,
    pub opted_out: usize,
}

/// Validity/existence probe for admin form autofill.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub valid: bool,
    pub exists: bool,
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// One audit entry for API responses.
#[derive(Debug, Serialize)]
pub struct AuditEntryInfo {
    pub id: u64,
    pub actor: String,
    pub action: contact_store::AuditAction,
    pub contact_id: u64,
    pub summary: String,
    pub before: Option<ContactInfo>,
    pub after: Option<ContactInfo>,
    pub origin: String,
    pub created_at: String,
}

impl From<&AuditEntry> for AuditEntryInfo {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id,
            actor: entry.actor.clone(),
            action: entry.action,
            contact_id: entry.contact_id,
            summary: entry.summary(),
            before: entry.before.as_ref().map(ContactInfo::from),
            after: entry.after.as_ref().map(ContactInfo::from),
            origin: entry.origin.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Audit log listing.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditEntryInfo>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub contacts: usize,
}

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Exists probe query parameters.
#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    #[serde(default)]
    pub phone: String,
}

/// Audit listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}
