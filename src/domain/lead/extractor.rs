//! Pure contact extraction from free text.
//!
//! Visitors type contact details in the middle of ordinary chat, in any
//! language, with arbitrary separators. Extraction is defensive: a miss is
//! not an error, it just leaves the funnel state unchanged. Both functions
//! are pure so re-applying a transcript is idempotent.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Minimum digits in a phone number.
const MIN_PHONE_DIGITS: usize = 10;

/// Maximum digits in a phone number.
const MAX_PHONE_DIGITS: usize = 15;

/// Minimum characters in a name candidate.
const MIN_NAME_CHARS: usize = 2;

/// Maximum characters in a name candidate.
const MAX_NAME_CHARS: usize = 30;

/// Maximum words in a name candidate.
const MAX_NAME_WORDS: usize = 2;

/// Words that are never a personal name: greetings, yes/no tokens and
/// business-domain nouns, across the languages the widget ships in.
static NAME_STOPLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // greetings
        "привет",
        "здравствуйте",
        "здравствуй",
        "добрый",
        "доброе",
        "hello",
        "hi",
        "hey",
        "салем",
        "сәлем",
        "салам",
        // yes / no tokens
        "да",
        "нет",
        "yes",
        "no",
        "ok",
        "okay",
        "окей",
        "ага",
        "угу",
        "верно",
        "correct",
        "иә",
        "жоқ",
        "конечно",
        "sure",
        // business-domain nouns
        "цена",
        "стоимость",
        "price",
        "cost",
        "заказ",
        "order",
        "доставка",
        "delivery",
        "менеджер",
        "manager",
        "бот",
        "bot",
        "компания",
        "company",
        "товар",
        "продукт",
        "product",
        "услуга",
        "service",
        "консультация",
        "сайт",
        "site",
        // pleasantries
        "спасибо",
        "thanks",
        "thank",
        "пока",
        "bye",
    ]
    .into_iter()
    .collect()
});

/// Extracts a phone number from free text.
///
/// Spaces, hyphens and parentheses are treated as separators and ignored;
/// the first digit run of 10-15 characters wins. A `+` immediately before
/// the run is kept.
pub fn extract_phone(text: &str) -> Option<String> {
    let cleaned: Vec<char> = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let mut i = 0;
    while i < cleaned.len() {
        if cleaned[i].is_ascii_digit() {
            let start = i;
            while i < cleaned.len() && cleaned[i].is_ascii_digit() {
                i += 1;
            }
            let run_len = i - start;
            if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&run_len) {
                let digits: String = cleaned[start..i].iter().collect();
                let has_plus = start > 0 && cleaned[start - 1] == '+';
                return Some(if has_plus {
                    format!("+{digits}")
                } else {
                    digits
                });
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Extracts a personal name from free text.
///
/// Accepts 1-2 word candidates of 2-30 characters without digits whose
/// words are not stoplisted. When the text also carries a phone number,
/// the candidate is the substring preceding the number, under the same
/// rules.
pub fn extract_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = match candidate_before_phone(trimmed) {
        Some(prefix) => prefix,
        None => trimmed.to_string(),
    };

    validate_name(&candidate)
}

/// When the text contains a phone number, returns the part before it.
fn candidate_before_phone(text: &str) -> Option<String> {
    extract_phone(text)?;

    let digit_pos = text
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)?;

    let prefix = text[..digit_pos]
        .trim_end_matches(|c: char| matches!(c, '+' | ' ' | ',' | ';' | ':' | '-' | '('));
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

fn validate_name(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();

    if candidate.chars().any(|c| c.is_numeric()) {
        return None;
    }

    let char_count = candidate.chars().count();
    if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&char_count) {
        return None;
    }

    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_NAME_WORDS {
        return None;
    }

    for word in &words {
        let normalized: String = word
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();
        if NAME_STOPLIST.contains(normalized.as_str()) {
            return None;
        }
    }

    Some(candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod phone {
        use super::*;

        #[test]
        fn extracts_plain_digit_run() {
            assert_eq!(extract_phone("77012345678").as_deref(), Some("77012345678"));
        }

        #[test]
        fn keeps_leading_plus() {
            assert_eq!(
                extract_phone("+77012345678").as_deref(),
                Some("+77012345678")
            );
        }

        #[test]
        fn ignores_spaces_hyphens_and_parentheses() {
            assert_eq!(
                extract_phone("+7 (701) 234-56-78").as_deref(),
                Some("+77012345678")
            );
        }

        #[test]
        fn finds_phone_inside_sentence() {
            assert_eq!(
                extract_phone("позвоните мне на 87011234567 вечером").as_deref(),
                Some("87011234567")
            );
        }

        #[test]
        fn rejects_short_runs() {
            assert_eq!(extract_phone("123456789"), None);
        }

        #[test]
        fn rejects_overlong_runs() {
            assert_eq!(extract_phone("1234567890123456"), None);
        }

        #[test]
        fn rejects_text_without_digits() {
            assert_eq!(extract_phone("no digits here"), None);
        }

        #[test]
        fn boundary_lengths() {
            assert_eq!(extract_phone("1234567890").as_deref(), Some("1234567890"));
            assert_eq!(
                extract_phone("123456789012345").as_deref(),
                Some("123456789012345")
            );
        }

        #[test]
        fn skips_nonqualifying_run_and_finds_later_one() {
            assert_eq!(
                extract_phone("order 123, phone 87011234567").as_deref(),
                Some("87011234567")
            );
        }
    }

    mod name {
        use super::*;

        #[test]
        fn accepts_single_word_name() {
            assert_eq!(extract_name("Meiramgul").as_deref(), Some("Meiramgul"));
        }

        #[test]
        fn accepts_two_word_name() {
            assert_eq!(extract_name("Aida Serik").as_deref(), Some("Aida Serik"));
        }

        #[test]
        fn rejects_three_words() {
            assert_eq!(extract_name("Aida Serik Kyzy"), None);
        }

        #[test]
        fn rejects_digits_anywhere() {
            assert_eq!(extract_name("Aida7"), None);
            assert_eq!(extract_name("А1да"), None);
        }

        #[test]
        fn rejects_too_short_and_too_long() {
            assert_eq!(extract_name("A"), None);
            let exactly_30 = "Constantinopolous Wolfeschlegel";
            assert_eq!(exactly_30.chars().count(), 31);
            assert_eq!(extract_name(exactly_30), None);
        }

        #[test]
        fn boundary_thirty_chars_accepted() {
            let name = "Aaaaaaaaaaaaaa Bbbbbbbbbbbbbbb";
            assert_eq!(name.chars().count(), 30);
            assert_eq!(extract_name(name).as_deref(), Some(name));
        }

        #[test]
        fn boundary_thirty_one_chars_rejected() {
            let name = "Aaaaaaaaaaaaaa Bbbbbbbbbbbbbbbb";
            assert_eq!(name.chars().count(), 31);
            assert_eq!(extract_name(name), None);
        }

        #[test]
        fn rejects_stoplisted_greetings() {
            assert_eq!(extract_name("привет"), None);
            assert_eq!(extract_name("Hello"), None);
            assert_eq!(extract_name("Сәлем"), None);
        }

        #[test]
        fn rejects_stoplisted_business_words() {
            assert_eq!(extract_name("цена"), None);
            assert_eq!(extract_name("manager"), None);
        }

        #[test]
        fn rejects_yes_no_tokens() {
            assert_eq!(extract_name("да"), None);
            assert_eq!(extract_name("Yes"), None);
        }

        #[test]
        fn stoplist_is_case_insensitive_and_ignores_punctuation() {
            assert_eq!(extract_name("Привет!"), None);
        }

        #[test]
        fn takes_prefix_when_phone_present() {
            assert_eq!(
                extract_name("Aida +77012345678").as_deref(),
                Some("Aida")
            );
        }

        #[test]
        fn prefix_still_subject_to_stoplist() {
            assert_eq!(extract_name("привет +77012345678"), None);
        }

        #[test]
        fn no_name_when_only_phone() {
            assert_eq!(extract_name("+77012345678"), None);
        }

        #[test]
        fn rejects_digit_text_without_phone() {
            assert_eq!(extract_name("Aida 123"), None);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any 1-2 word alphabetic text of 2-30 chars that avoids the
            /// stoplist comes back unchanged.
            #[test]
            fn clean_short_text_is_accepted_verbatim(
                first in "[A-Z][a-z]{2,11}",
                second in proptest::option::of("[A-Z][a-z]{2,11}"),
            ) {
                let candidate = match &second {
                    Some(s) => format!("{first} {s}"),
                    None => first.clone(),
                };
                prop_assume!(candidate.chars().count() <= 30);
                prop_assume!(candidate
                    .split_whitespace()
                    .all(|w| !NAME_STOPLIST.contains(w.to_lowercase().as_str())));

                prop_assert_eq!(extract_name(&candidate), Some(candidate));
            }

            /// Any valid digit run survives arbitrary separator noise.
            #[test]
            fn phone_survives_separator_noise(
                digits in "[0-9]{10,15}",
                with_plus in any::<bool>(),
            ) {
                let mut noisy = String::new();
                if with_plus {
                    noisy.push('+');
                }
                for (i, c) in digits.chars().enumerate() {
                    noisy.push(c);
                    if i % 3 == 1 {
                        noisy.push(' ');
                    }
                    if i % 4 == 2 {
                        noisy.push('-');
                    }
                }

                let expected = if with_plus {
                    format!("+{digits}")
                } else {
                    digits.clone()
                };
                prop_assert_eq!(extract_phone(&noisy), Some(expected));
            }

            /// Names containing any digit are always rejected.
            #[test]
            fn any_digit_rejects_name(
                prefix in "[A-Za-z]{1,10}",
                digit in "[0-9]",
                suffix in "[A-Za-z]{0,10}",
            ) {
                let candidate = format!("{prefix}{digit}{suffix}");
                prop_assert_eq!(extract_name(&candidate), None);
            }
        }
    }
}
