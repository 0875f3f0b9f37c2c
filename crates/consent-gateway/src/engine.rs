//! Consent state machine.
//!
//! Interprets one inbound message against the keyword vocabularies and the
//! contact's current state, applies the transition through the contact
//! store, and produces the reply text. Every branch replies; nothing here
//! propagates an error to the webhook caller.

use crate::keywords::{KeywordMatch, KeywordSets};
use contact_store::{ContactStore, SYSTEM_ACTOR};
use phone_normalizer::normalize;
use tracing::{debug, error, info};

/// Reply sent when the sender address cannot be normalized.
pub const REPLY_INVALID: &str = "Invalid number. Reply JOIN to subscribe. Reply STOP to opt out.";

/// Instruction reply: help requests, unrecognized messages, and the
/// degraded path when storage fails.
pub const REPLY_INSTRUCTIONS: &str = "Reply JOIN to subscribe. Reply STOP to opt out.";

/// Opt-out confirmation.
pub const REPLY_OPTED_OUT: &str = "You're opted out. Reply START to resubscribe.";

/// Opt-in confirmation when a name is already on file.
pub const REPLY_SUBSCRIBED: &str = "You're subscribed! Reply STOP to opt out.";

/// Opt-in confirmation that also asks for a first name.
pub const REPLY_SUBSCRIBED_ASK_NAME: &str =
    "You're subscribed! Reply with your first name (example: Joey). Reply STOP to opt out.";

/// Personalized confirmation after a name is captured.
pub fn reply_name_confirmed(name: &str) -> String {
    format!("Thanks, {name}! You're all set. Reply STOP to opt out.")
}

pub struct ConsentEngine {
    store: ContactStore,
    keywords: KeywordSets,
    default_region: String,
}

impl ConsentEngine {
    pub fn new(store: ContactStore, keywords: KeywordSets, default_region: impl Into<String>) -> Self {
        Self {
            store,
            keywords,
            default_region: default_region.into(),
        }
    }

    /// Process one inbound message and return the reply text.
    ///
    /// First match wins: opt-out, help, opt-in, name capture, default.
    /// Opt-out is checked before everything else so STOP unconditionally
    /// exits the list from any state, including mid name-capture.
    pub async fn handle_inbound(&self, raw_from: &str, raw_body: &str, origin: &str) -> String {
        let phone = match normalize(raw_from, &self.default_region) {
            Ok(phone) => phone,
            Err(e) => {
                debug!(from = raw_from, %e, "Unparseable sender address");
                return REPLY_INVALID.to_string();
            }
        };

        match self.keywords.classify(raw_body) {
            Some(KeywordMatch::OptOut) => match self.store.record_opt_out(&phone, SYSTEM_ACTOR, origin).await {
                Ok(_) => {
                    info!(%phone, "Subscriber opted out");
                    REPLY_OPTED_OUT.to_string()
                }
                Err(e) => {
                    error!(%phone, %e, "Failed to record opt-out");
                    REPLY_INSTRUCTIONS.to_string()
                }
            },
            Some(KeywordMatch::Help) => REPLY_INSTRUCTIONS.to_string(),
            Some(KeywordMatch::OptIn) => match self.store.record_opt_in(&phone, SYSTEM_ACTOR, origin).await {
                Ok(contact) => {
                    info!(%phone, "Subscriber opted in");
                    if contact.name.is_empty() {
                        REPLY_SUBSCRIBED_ASK_NAME.to_string()
                    } else {
                        REPLY_SUBSCRIBED.to_string()
                    }
                }
                Err(e) => {
                    error!(%phone, %e, "Failed to record opt-in");
                    REPLY_INSTRUCTIONS.to_string()
                }
            },
            None => match self.store.capture_name(&phone, raw_body, SYSTEM_ACTOR, origin).await {
                Ok(Some(contact)) => {
                    info!(%phone, name = %contact.name, "Subscriber name captured");
                    reply_name_confirmed(&contact.name)
                }
                Ok(None) => REPLY_INSTRUCTIONS.to_string(),
                Err(e) => {
                    error!(%phone, %e, "Failed to capture name");
                    REPLY_INSTRUCTIONS.to_string()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_store::{ConsentState, ContactRegistry, ExportSink, Persistence};

    fn test_engine() -> (ConsentEngine, ContactStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let exports = ExportSink::new(dir.path().join("contacts.csv"), dir.path().join("optouts.txt"));
        let store = ContactStore::new(ContactRegistry::new(), Persistence::memory(), exports);
        let engine = ConsentEngine::new(store.clone(), KeywordSets::default(), "US");
        (engine, store, dir)
    }

    #[tokio::test]
    async fn invalid_sender_degrades_without_mutation() {
        let (engine, store, _dir) = test_engine();

        let reply = engine.handle_inbound("garbage", "JOIN", "direct").await;
        assert_eq!(reply, REPLY_INVALID);
        assert_eq!(store.counts().await.total, 0);
    }

    #[tokio::test]
    async fn new_subscriber_flow_join_name_stop() {
        let (engine, store, _dir) = test_engine();

        let reply = engine.handle_inbound("(412) 555-0100", "join", "10.0.0.1").await;
        assert_eq!(reply, REPLY_SUBSCRIBED_ASK_NAME);

        let contact = store.get_by_phone("+14125550100").await.unwrap();
        assert_eq!(contact.consent, ConsentState::OptedIn);
        assert!(contact.name.is_empty());

        let reply = engine.handle_inbound("+14125550100", "Joey", "10.0.0.1").await;
        assert_eq!(reply, reply_name_confirmed("Joey"));
        assert_eq!(store.get_by_phone("+14125550100").await.unwrap().name, "Joey");

        let reply = engine.handle_inbound("+14125550100", "StopAll please", "10.0.0.1").await;
        assert_eq!(reply, REPLY_OPTED_OUT);
        let contact = store.get_by_phone("+14125550100").await.unwrap();
        assert_eq!(contact.consent, ConsentState::OptedOut);
        assert_eq!(contact.name, "Joey");
    }

    #[tokio::test]
    async fn opt_out_works_from_any_state() {
        let (engine, store, _dir) = test_engine();

        // Absent contact: STOP still lands it on the opt-out list.
        let reply = engine.handle_inbound("+14125550100", "STOP", "direct").await;
        assert_eq!(reply, REPLY_OPTED_OUT);
        assert_eq!(
            store.get_by_phone("+14125550100").await.unwrap().consent,
            ConsentState::OptedOut
        );

        // Already opted out: idempotent.
        let reply = engine.handle_inbound("+14125550100", "STOP", "direct").await;
        assert_eq!(reply, REPLY_OPTED_OUT);

        // Mid name-capture: STOP wins over the pending name.
        engine.handle_inbound("+14125550101", "JOIN", "direct").await;
        let reply = engine.handle_inbound("+14125550101", "STOP", "direct").await;
        assert_eq!(reply, REPLY_OPTED_OUT);
        let contact = store.get_by_phone("+14125550101").await.unwrap();
        assert_eq!(contact.consent, ConsentState::OptedOut);
        assert!(contact.name.is_empty());
    }

    #[tokio::test]
    async fn help_replies_without_mutation() {
        let (engine, store, _dir) = test_engine();

        let reply = engine.handle_inbound("+14125550100", "HELP", "direct").await;
        assert_eq!(reply, REPLY_INSTRUCTIONS);
        assert_eq!(store.counts().await.total, 0);
    }

    #[tokio::test]
    async fn rejoin_with_name_on_file_skips_the_name_prompt() {
        let (engine, _store, _dir) = test_engine();

        engine.handle_inbound("+14125550100", "JOIN", "direct").await;
        engine.handle_inbound("+14125550100", "Joey", "direct").await;
        engine.handle_inbound("+14125550100", "STOP", "direct").await;

        let reply = engine.handle_inbound("+14125550100", "START", "direct").await;
        assert_eq!(reply, REPLY_SUBSCRIBED);
    }

    #[tokio::test]
    async fn unusable_name_text_falls_through_to_instructions() {
        let (engine, store, _dir) = test_engine();

        engine.handle_inbound("+14125550100", "JOIN", "direct").await;
        let reply = engine.handle_inbound("+14125550100", "12345!!", "direct").await;
        assert_eq!(reply, REPLY_INSTRUCTIONS);
        assert!(store.get_by_phone("+14125550100").await.unwrap().name.is_empty());
    }

    #[tokio::test]
    async fn free_text_from_strangers_gets_instructions() {
        let (engine, store, _dir) = test_engine();

        let reply = engine.handle_inbound("+14125550100", "hello there", "direct").await;
        assert_eq!(reply, REPLY_INSTRUCTIONS);
        assert_eq!(store.counts().await.total, 0);
    }

    #[tokio::test]
    async fn webhook_mutations_are_attributed_to_system() {
        let (engine, store, _dir) = test_engine();

        engine.handle_inbound("+14125550100", "JOIN", "10.1.2.3").await;

        let tail = store.audit_tail(10).await;
        assert!(!tail.is_empty());
        for entry in tail {
            assert_eq!(entry.actor, SYSTEM_ACTOR);
            assert_eq!(entry.origin, "10.1.2.3");
        }
    }
}
