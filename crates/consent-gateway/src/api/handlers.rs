//! HTTP request handlers.

use super::types::{
    AuditEntryInfo, AuditQuery, AuditResponse, ContactInfo, ContactResponse, ContactsResponse,
    CreateContactRequest, DeleteContactRequest, ExistsQuery, ExistsResponse, HealthResponse,
    InboundSms, SearchQuery, SetConsentRequest, UpdateContactRequest,
};
use super::AppState;
use crate::error::GatewayError;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use contact_store::{csv_field, ConsentState};
use phone_normalizer::normalize;
use tracing::{debug, info};

/// How many audit entries the audit view returns by default.
const DEFAULT_AUDIT_LIMIT: usize = 250;

/// Caller network identity for audit attribution: the first
/// X-Forwarded-For entry, or "direct" when the request came straight in.
fn client_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| "direct".to_string())
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Wrap a reply body in the delivery provider's response markup.
fn reply_markup(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(body)
    )
}

/// Inbound SMS webhook. Always HTTP 200 with well-formed reply markup;
/// malformed input degrades to a generic reply, never an error status.
pub async fn inbound_sms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(message): Form<InboundSms>,
) -> Response {
    let origin = client_origin(&headers);
    debug!(from = %message.from, origin = %origin, "Inbound SMS received");

    let reply = state
        .engine
        .handle_inbound(&message.from, &message.body, &origin)
        .await;

    (
        [(header::CONTENT_TYPE, "application/xml")],
        reply_markup(&reply),
    )
        .into_response()
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.store.counts().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        contacts: counts.total,
    })
}

/// Create a contact from the admin surface.
pub async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), GatewayError> {
    let phone = normalize(&request.phone, &state.default_region)?;
    let actor = request.actor.as_deref().unwrap_or(&state.default_actor);
    let origin = client_origin(&headers);

    let contact = state
        .store
        .create(&phone, request.name.as_deref().unwrap_or(""), actor, &origin)
        .await?;

    info!(phone = %contact.phone, actor, "Contact created via admin surface");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            contact: ContactInfo::from(&contact),
        }),
    ))
}

/// List contacts, optionally filtered by a case-insensitive substring of
/// phone or name. Most recently updated first.
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ContactsResponse> {
    let contacts = state.store.list(&query.q).await;
    let counts = state.store.counts().await;

    Json(ContactsResponse {
        contacts: contacts.iter().map(ContactInfo::from).collect(),
        total: counts.total,
        opted_in: counts.opted_in,
        opted_out: counts.opted_out,
    })
}

/// Validity/existence probe used by the admin UI while typing a number.
pub async fn contact_exists(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> Json<ExistsResponse> {
    let phone = match normalize(&query.phone, &state.default_region) {
        Ok(phone) => phone,
        Err(_) => {
            return Json(ExistsResponse {
                valid: false,
                exists: false,
                id: None,
                name: None,
            })
        }
    };

    let contact = state.store.get_by_phone(&phone).await;
    Json(ExistsResponse {
        valid: true,
        exists: contact.is_some(),
        id: contact.as_ref().map(|c| c.id),
        name: contact.map(|c| c.name),
    })
}

/// Full tabular export of the (optionally filtered) contact list.
pub async fn export_contacts_csv(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let contacts = state.store.list(&query.q).await;

    let mut csv = String::from("id,phone,name,consent,created_at,updated_at\n");
    for contact in &contacts {
        let consent = match contact.consent {
            ConsentState::OptedIn => "opted_in",
            ConsentState::OptedOut => "opted_out",
        };
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            contact.id,
            csv_field(&contact.phone),
            csv_field(&contact.name),
            consent,
            contact.created_at.to_rfc3339(),
            contact.updated_at.to_rfc3339(),
        ));
    }

    let filename = if query.q.trim().is_empty() {
        "contacts_export.csv"
    } else {
        "contacts_export_filtered.csv"
    };

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

/// Fetch one contact by id.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ContactResponse>, GatewayError> {
    let contact = state.store.get_by_id(id).await.ok_or(GatewayError::NotFound)?;
    Ok(Json(ContactResponse {
        contact: ContactInfo::from(&contact),
    }))
}

/// Admin full edit. A phone change is re-normalized and re-validated for
/// uniqueness.
pub async fn update_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<UpdateContactRequest>,
) -> Result<Json<ContactResponse>, GatewayError> {
    let phone = request
        .phone
        .as_deref()
        .map(|raw| normalize(raw, &state.default_region))
        .transpose()?;
    let actor = request.actor.as_deref().unwrap_or(&state.default_actor);
    let origin = client_origin(&headers);

    let contact = state
        .store
        .update(
            id,
            phone.as_deref(),
            request.name.as_deref(),
            request.consent,
            actor,
            &origin,
        )
        .await?;

    info!(id, actor, "Contact updated via admin surface");

    Ok(Json(ContactResponse {
        contact: ContactInfo::from(&contact),
    }))
}

/// Delete a contact. The audit trail keeps its final snapshot.
pub async fn delete_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    request: Option<Json<DeleteContactRequest>>,
) -> Result<StatusCode, GatewayError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let actor = request.actor.as_deref().unwrap_or(&state.default_actor);
    let origin = client_origin(&headers);

    let removed = state.store.delete(id, actor, &origin).await?;
    info!(id, phone = %removed.phone, actor, "Contact deleted via admin surface");

    Ok(StatusCode::NO_CONTENT)
}

/// Set consent for a contact by phone number (admin opt-in/opt-out).
pub async fn set_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<String>,
    Json(request): Json<SetConsentRequest>,
) -> Result<Json<ContactResponse>, GatewayError> {
    let phone = normalize(&number, &state.default_region)?;
    let actor = request.actor.as_deref().unwrap_or(&state.default_actor);
    let origin = client_origin(&headers);

    let contact = state
        .store
        .set_consent(&phone, request.state, actor, &origin)
        .await?;

    info!(phone = %contact.phone, state = ?request.state, actor, "Consent set via admin surface");

    Ok(Json(ContactResponse {
        contact: ContactInfo::from(&contact),
    }))
}

/// Latest audit entries, newest first.
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Json<AuditResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    let entries = state.store.audit_tail(limit).await;

    Json(AuditResponse {
        total: entries.len(),
        entries: entries.iter().map(AuditEntryInfo::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_markup_escapes_the_body() {
        let markup = reply_markup("Thanks, <Joey> & \"co\"");
        assert!(markup.starts_with("<?xml"));
        assert!(markup.contains("<Response><Message>"));
        assert!(markup.contains("Thanks, &lt;Joey&gt; &amp; &quot;co&quot;"));
        assert!(markup.ends_with("</Message></Response>"));
    }

    #[test]
    fn client_origin_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.9".parse().unwrap());
        assert_eq!(client_origin(&headers), "10.0.0.1");

        assert_eq!(client_origin(&HeaderMap::new()), "direct");
    }
}
