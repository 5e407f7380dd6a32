pub mod courier;
pub mod warehouse;

use serde_json::Value;

/// What an adapter call produced: the tracking number the orchestrator needs
/// plus the raw carrier response kept opaque for storage and audit.
#[derive(Debug, Clone)]
pub enum LabelOutcome {
    Warehouse {
        tracking_number: String,
        raw: Value,
    },
    PeerToPeer {
        tracking_number: String,
        raw: Value,
    },
}

impl LabelOutcome {
    pub fn tracking_number(&self) -> &str {
        match self {
            LabelOutcome::Warehouse {
                tracking_number, ..
            }
            | LabelOutcome::PeerToPeer {
                tracking_number, ..
            } => tracking_number,
        }
    }

    pub fn raw(&self) -> &Value {
        match self {
            LabelOutcome::Warehouse { raw, .. } | LabelOutcome::PeerToPeer { raw, .. } => raw,
        }
    }

    /// Persisted `label_type` discriminant.
    pub fn label_type(&self) -> &'static str {
        match self {
            LabelOutcome::Warehouse { .. } => "ninja",
            LabelOutcome::PeerToPeer { .. } => "voila",
        }
    }
}

/// Carrier systems cap order/reference identifiers at 30 characters and only
/// accept alphanumerics, so internal UUIDs are squeezed to fit.
pub fn carrier_reference(id: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(30);
    out.push_str(prefix);
    for c in id.chars().filter(|c| c.is_ascii_alphanumeric()) {
        if out.len() >= 30 {
            break;
        }
        out.push(c);
    }
    out.truncate(30);
    out
}
