use serde::Deserialize;

/// A provider webhook delivery reduced to the two facts the reconciler acts
/// on. Decoded from the payload only after its signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub kind: EventKind,
    pub intent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Succeeded,
    Failed,
    /// Event types this system does not handle. Carried for logging.
    Other(String),
}

impl EventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => EventKind::Succeeded,
            "payment_intent.payment_failed" => EventKind::Failed,
            other => EventKind::Other(other.to_string()),
        }
    }
}

// Wire shape of the provider's event envelope.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    id: String,
}

impl ProviderEvent {
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)?;
        Ok(ProviderEvent {
            kind: EventKind::from_event_type(&envelope.event_type),
            intent_id: envelope.data.object.id,
        })
    }
}
