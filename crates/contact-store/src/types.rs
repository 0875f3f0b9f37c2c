//! Contact and audit trail types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate contact identifier. Assigned at creation, never reused.
pub type ContactId = u64;

/// Actor recorded for webhook-driven mutations.
pub const SYSTEM_ACTOR: &str = "system";

/// Longest display name we keep for a contact.
pub const MAX_NAME_LEN: usize = 40;

/// Whether a contact may currently receive messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    OptedIn,
    OptedOut,
}

impl ConsentState {
    pub fn is_opted_in(self) -> bool {
        matches!(self, ConsentState::OptedIn)
    }
}

/// One phone number's relationship to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,

    /// Canonical phone identity (see the phone-normalizer crate). Unique
    /// across all contacts; lookups are exact string matches.
    pub phone: String,

    /// Sanitized display name. Empty until the subscriber replies with one.
    pub name: String,

    pub consent: ConsentState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(id: ContactId, phone: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            phone: phone.into(),
            name: name.into(),
            consent: ConsentState::OptedIn,
            created_at: now,
            updated_at: now,
        }
    }

    /// The derived "awaiting name" condition: opted in, no name on file.
    pub fn awaiting_name(&self) -> bool {
        self.consent.is_opted_in() && self.name.is_empty()
    }
}

/// What kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    OptIn,
    OptOut,
    Delete,
}

/// Immutable record of one contact mutation. Entries are never deleted and
/// may outlive the contact they describe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub actor: String,
    pub action: AuditAction,
    pub contact_id: ContactId,
    pub before: Option<Contact>,
    pub after: Option<Contact>,

    /// Caller network identity, for traceability.
    pub origin: String,

    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Human-readable one-liner for audit views.
    pub fn summary(&self) -> String {
        match (&self.before, &self.after) {
            (None, Some(after)) => {
                if after.name.is_empty() {
                    format!("Created {}", after.phone)
                } else {
                    format!("Created {} ({})", after.phone, after.name)
                }
            }
            (Some(before), None) => {
                if before.name.is_empty() {
                    format!("Deleted {}", before.phone)
                } else {
                    format!("Deleted {} ({})", before.phone, before.name)
                }
            }
            (Some(before), Some(after)) => {
                let mut changes = Vec::new();
                if before.phone != after.phone {
                    changes.push(format!("phone: {} -> {}", before.phone, after.phone));
                }
                if before.name != after.name {
                    changes.push(format!("name: {} -> {}", before.name, after.name));
                }
                if before.consent != after.consent {
                    changes.push(format!("consent: {:?} -> {:?}", before.consent, after.consent));
                }
                if changes.is_empty() {
                    "Updated".to_string()
                } else {
                    changes.join("; ")
                }
            }
            (None, None) => String::new(),
        }
    }
}

/// Registry totals split by consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: usize,
    pub opted_in: usize,
    pub opted_out: usize,
}

/// Sanitize a free-text display name: ASCII letters, spaces, hyphens and
/// apostrophes only, single-spaced, capped at [`MAX_NAME_LEN`] characters.
/// Returns an empty string when nothing survives.
pub fn sanitize_name(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '\t' | '\'' | '-'))
        .collect();

    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_keeps_letters_and_punctuation_subset() {
        assert_eq!(sanitize_name("Joey"), "Joey");
        assert_eq!(sanitize_name("  Mary-Jane  O'Brien "), "Mary-Jane O'Brien");
    }

    #[test]
    fn sanitize_name_strips_digits_and_symbols() {
        assert_eq!(sanitize_name("Joey123!"), "Joey");
        assert_eq!(sanitize_name("42!!"), "");
        assert_eq!(sanitize_name("...---..."), "---");
    }

    #[test]
    fn sanitize_name_collapses_whitespace() {
        assert_eq!(sanitize_name("Ann   \t Marie"), "Ann Marie");
    }

    #[test]
    fn sanitize_name_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_name(&long).len(), MAX_NAME_LEN);
    }

    #[test]
    fn consent_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConsentState::OptedIn).unwrap(),
            "\"opted_in\""
        );
        assert_eq!(
            serde_json::to_string(&ConsentState::OptedOut).unwrap(),
            "\"opted_out\""
        );
    }

    #[test]
    fn audit_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditAction::OptOut).unwrap(),
            "\"opt_out\""
        );
    }

    #[test]
    fn awaiting_name_is_derived_from_consent_and_name() {
        let now = Utc::now();
        let mut contact = Contact::new(1, "+14125550100", "", now);
        assert!(contact.awaiting_name());

        contact.name = "Joey".into();
        assert!(!contact.awaiting_name());

        contact.name.clear();
        contact.consent = ConsentState::OptedOut;
        assert!(!contact.awaiting_name());
    }

    #[test]
    fn summary_describes_create_delete_and_update() {
        let now = Utc::now();
        let before = Contact::new(7, "+14125550100", "Joey", now);
        let mut after = before.clone();
        after.consent = ConsentState::OptedOut;

        let entry = AuditEntry {
            id: 1,
            actor: "admin".into(),
            action: AuditAction::Create,
            contact_id: 7,
            before: None,
            after: Some(before.clone()),
            origin: "direct".into(),
            created_at: now,
        };
        assert_eq!(entry.summary(), "Created +14125550100 (Joey)");

        let entry = AuditEntry {
            before: Some(before.clone()),
            after: None,
            action: AuditAction::Delete,
            ..entry
        };
        assert_eq!(entry.summary(), "Deleted +14125550100 (Joey)");

        let entry = AuditEntry {
            before: Some(before),
            after: Some(after),
            action: AuditAction::OptOut,
            ..entry
        };
        assert_eq!(entry.summary(), "consent: OptedIn -> OptedOut");
    }
}
