//! Confirmation flow state machine.
//!
//! Decides, from the current contact document plus the latest message,
//! which transition the funnel takes. Pure: the caller persists the
//! mutated document and performs the side effects the transition calls
//! for (prompting, classification, notification).

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::contact_info::{ConfirmationStatus, ContactInfo};
use super::extractor::{extract_name, extract_phone};

/// Affirmative tokens across the widget's languages.
static AFFIRMATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "да", "ага", "угу", "верно", "точно", "конечно", "подтверждаю", "yes", "yep", "yeah",
        "ok", "okay", "окей", "correct", "right", "sure", "confirm", "иә", "дұрыс",
    ]
    .into_iter()
    .collect()
});

/// Explicit UI action selected by the visitor (button press).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitAction {
    /// "Everything is correct."
    Confirm,
    /// "Fix the name."
    EditName,
    /// "Fix the phone."
    EditPhone,
}

/// Contact fields proposed by the extractor for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Extracted {
    /// Runs both extractors over the message text.
    pub fn from_text(text: &str) -> Self {
        Self {
            name: extract_name(text),
            phone: extract_phone(text),
        }
    }
}

/// Outcome of evaluating one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First successful entry into the confirmed state. The caller runs
    /// classification and schedules notification, guarded by the store's
    /// conditional update.
    Confirmed,

    /// Visitor chose to correct the name; next message is tried as one.
    BeginNameEdit,

    /// Visitor chose to correct the phone; next message is tried as one.
    BeginPhoneEdit,

    /// While pending, the visitor supplied a different value; the field
    /// was overwritten and the confirmation prompt is re-emitted.
    ContactRevised,

    /// An edit produced a value; back to pending with a fresh prompt.
    EditCaptured,

    /// Both fields just became present; ask for confirmation.
    AwaitConfirmation,

    /// Some new field was merged but the set is still incomplete.
    Collected,

    /// Nothing changed; an ordinary reply is due.
    Continue,
}

impl Transition {
    /// Returns true when the reply should be the confirmation prompt.
    pub fn wants_confirmation_prompt(&self) -> bool {
        matches!(
            self,
            Self::AwaitConfirmation | Self::ContactRevised | Self::EditCaptured
        )
    }
}

/// Returns true if the message is a bare affirmative.
pub fn is_affirmative(text: &str) -> bool {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    !normalized.is_empty() && AFFIRMATIVE_WORDS.contains(normalized.as_str())
}

/// Evaluates one inbound message against the contact document.
///
/// Mutates `contact` in place (field writes and confirmation sub-state)
/// and returns the transition taken. Evaluation order follows the
/// funnel's priorities: explicit actions, then the pending/editing
/// dialogs, then ordinary collection.
pub fn evaluate(
    contact: &mut ContactInfo,
    action: Option<ExplicitAction>,
    text: &str,
    extracted: &Extracted,
) -> Transition {
    // 1-3. Explicit UI actions win over anything typed.
    match action {
        Some(ExplicitAction::Confirm) if contact.is_complete() => {
            contact.confirmation_status = ConfirmationStatus::Confirmed;
            return Transition::Confirmed;
        }
        Some(ExplicitAction::EditName) => {
            contact.confirmation_status = ConfirmationStatus::EditingName;
            return Transition::BeginNameEdit;
        }
        Some(ExplicitAction::EditPhone) => {
            contact.confirmation_status = ConfirmationStatus::EditingPhone;
            return Transition::BeginPhoneEdit;
        }
        _ => {}
    }

    match contact.confirmation_status {
        // 4. Waiting for a verdict on the collected fields.
        ConfirmationStatus::Pending => {
            if contact.is_complete() && is_affirmative(text) {
                contact.confirmation_status = ConfirmationStatus::Confirmed;
                return Transition::Confirmed;
            }

            let mut revised = false;
            if let Some(name) = &extracted.name {
                if contact.name.as_deref() != Some(name.as_str()) {
                    contact.name = Some(name.clone());
                    revised = true;
                }
            }
            if let Some(phone) = &extracted.phone {
                if contact.phone.as_deref() != Some(phone.as_str()) {
                    contact.phone = Some(phone.clone());
                    revised = true;
                }
            }
            if revised {
                Transition::ContactRevised
            } else {
                Transition::Continue
            }
        }

        // 5. Mid-edit: only the field under edit is considered.
        ConfirmationStatus::EditingName => {
            if let Some(name) = &extracted.name {
                contact.name = Some(name.clone());
                contact.confirmation_status = ConfirmationStatus::Pending;
                Transition::EditCaptured
            } else {
                Transition::Continue
            }
        }
        ConfirmationStatus::EditingPhone => {
            if let Some(phone) = &extracted.phone {
                contact.phone = Some(phone.clone());
                contact.confirmation_status = ConfirmationStatus::Pending;
                Transition::EditCaptured
            } else {
                Transition::Continue
            }
        }

        // 6. Ordinary collection.
        ConfirmationStatus::None => {
            let merged = contact.merge_absent(extracted.name.as_deref(), extracted.phone.as_deref());
            if merged && contact.is_complete() {
                contact.confirmation_status = ConfirmationStatus::Pending;
                Transition::AwaitConfirmation
            } else if merged {
                Transition::Collected
            } else {
                Transition::Continue
            }
        }

        // Already confirmed: the funnel is done; everything else is
        // ordinary conversation.
        ConfirmationStatus::Confirmed => Transition::Continue,
    }
}
