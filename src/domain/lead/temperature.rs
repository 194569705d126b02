//! Temperature classification primitives.
//!
//! The oracle does the actual judging; this module owns the prompt it is
//! judged with and the keyword parser applied to its narrative answer.
//! The parser doubles as the fallback: no recognizable marker means warm.

use super::contact_info::Temperature;
use super::history::{HistoryEntry, Speaker};

/// Markers whose first occurrence classifies the narrative as hot.
const HOT_MARKERS: &[&str] = &["горяч", "hot", "ыстық"];

/// Markers whose first occurrence classifies the narrative as cold.
const COLD_MARKERS: &[&str] = &["холод", "cold", "суық"];

/// Builds the classification prompt for a finished conversation.
///
/// The oracle is asked for a short narrative that embeds one of the three
/// category words; [`parse_temperature`] digs it back out.
pub fn classification_prompt(history: &[HistoryEntry]) -> String {
    let mut transcript = String::new();
    for entry in history {
        let who = match entry.speaker {
            Speaker::Visitor => "Visitor",
            Speaker::Engine => "Assistant",
        };
        transcript.push_str(who);
        transcript.push_str(": ");
        transcript.push_str(&entry.text);
        transcript.push('\n');
    }

    format!(
        "You are assessing a sales conversation with a potential customer.\n\
         Weigh how quickly the visitor responded, how willingly they shared \
         contact details, how many objections they raised, and any explicit \
         interest signals.\n\
         Summarize the visitor's buying readiness in 2-3 sentences and \
         include exactly one of the words: hot, warm or cold.\n\n\
         Conversation:\n{transcript}"
    )
}

/// Parses the oracle narrative for the first temperature marker.
///
/// Scans for the earliest occurrence of any hot or cold marker
/// (case-insensitive); anything else, including an empty narrative, is
/// warm.
pub fn parse_temperature(narrative: &str) -> Temperature {
    let lowered = narrative.to_lowercase();

    let first_index = |markers: &[&str]| -> Option<usize> {
        markers.iter().filter_map(|m| lowered.find(m)).min()
    };

    match (first_index(HOT_MARKERS), first_index(COLD_MARKERS)) {
        (Some(hot), Some(cold)) => {
            if hot <= cold {
                Temperature::Hot
            } else {
                Temperature::Cold
            }
        }
        (Some(_), None) => Temperature::Hot,
        (None, Some(_)) => Temperature::Cold,
        (None, None) => Temperature::Warm,
    }
}
