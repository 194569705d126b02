//! Typed contact document carried by every lead.
//!
//! Stored as a JSONB document, but modeled as a tagged record with
//! explicit optional fields so the confirmation state machine gets
//! compile-time exhaustiveness instead of an open map.

use serde::{Deserialize, Serialize};

/// Sub-state of the contact-verification dialog.
///
/// Distinct from the lead's coarse lifecycle status: a lead can be
/// `confirmed` here while its lifecycle continues to `contacted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// No confirmation dialog started yet.
    #[default]
    None,

    /// Both fields collected; waiting for the visitor to confirm them.
    Pending,

    /// Visitor chose to correct the name; next message is tried as a name.
    EditingName,

    /// Visitor chose to correct the phone; next message is tried as a phone.
    EditingPhone,

    /// Visitor explicitly confirmed the collected details. Terminal.
    Confirmed,
}

impl ConfirmationStatus {
    /// Returns true if the visitor is mid-edit of one of the fields.
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::EditingName | Self::EditingPhone)
    }
}

/// Coarse purchase-readiness estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

impl Temperature {
    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }
}

/// Contact details collected over the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactInfo {
    /// Personal name, as given by the visitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Phone number, digits with an optional leading `+`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Messenger username, when the channel provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Opaque web visitor token; identity key for non-numeric visitors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,

    /// Confirmation dialog sub-state.
    #[serde(default)]
    pub confirmation_status: ConfirmationStatus,

    /// Classified buying intent, set once at confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,

    /// Classifier narrative backing the temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_notes: Option<String>,
}

impl ContactInfo {
    /// Returns true when both name and phone are present.
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.phone.is_some()
    }

    /// Merges extracted fields, setting only those currently absent.
    ///
    /// Returns true if anything was written. Fields under explicit edit
    /// are overwritten by the state machine instead, not through here.
    pub fn merge_absent(&mut self, name: Option<&str>, phone: Option<&str>) -> bool {
        let mut changed = false;
        if self.name.is_none() {
            if let Some(n) = name {
                self.name = Some(n.to_string());
                changed = true;
            }
        }
        if self.phone.is_none() {
            if let Some(p) = phone {
                self.phone = Some(p.to_string());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_none() {
        assert_eq!(ConfirmationStatus::default(), ConfirmationStatus::None);
    }

    #[test]
    fn status_serializes_to_snake_case() {
        let json = serde_json::to_string(&ConfirmationStatus::EditingName).unwrap();
        assert_eq!(json, "\"editing_name\"");
    }

    #[test]
    fn is_editing_only_for_edit_states() {
        assert!(ConfirmationStatus::EditingName.is_editing());
        assert!(ConfirmationStatus::EditingPhone.is_editing());
        assert!(!ConfirmationStatus::Pending.is_editing());
        assert!(!ConfirmationStatus::Confirmed.is_editing());
    }

    #[test]
    fn merge_absent_fills_only_missing_fields() {
        let mut contact = ContactInfo {
            name: Some("Aida".to_string()),
            ..Default::default()
        };

        let changed = contact.merge_absent(Some("Someone Else"), Some("+77010000000"));

        assert!(changed);
        assert_eq!(contact.name.as_deref(), Some("Aida"));
        assert_eq!(contact.phone.as_deref(), Some("+77010000000"));
    }

    #[test]
    fn merge_absent_reports_no_change_when_complete() {
        let mut contact = ContactInfo {
            name: Some("Aida".to_string()),
            phone: Some("+77010000000".to_string()),
            ..Default::default()
        };

        assert!(!contact.merge_absent(Some("Other"), Some("+77019999999")));
    }

    #[test]
    fn contact_round_trips_through_json() {
        let contact = ContactInfo {
            name: Some("Aida".to_string()),
            phone: Some("+77010000000".to_string()),
            visitor_id: Some("v_abc".to_string()),
            confirmation_status: ConfirmationStatus::Pending,
            temperature: Some(Temperature::Hot),
            ..Default::default()
        };

        let json = serde_json::to_value(&contact).unwrap();
        let back: ContactInfo = serde_json::from_value(json).unwrap();
        assert_eq!(contact, back);
    }

    #[test]
    fn empty_document_deserializes_with_defaults() {
        let contact: ContactInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(contact.confirmation_status, ConfirmationStatus::None);
        assert!(!contact.is_complete());
    }
}
