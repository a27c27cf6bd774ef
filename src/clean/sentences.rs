// Rule-based sentence splitting.
//
// The evaluation stages score summaries sentence by sentence, so cleaned
// files carry their text pre-split. Splits on terminal punctuation with
// guards for titles/abbreviations and decimal numbers. Input is expected
// to be whitespace-squished already.

/// Words that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "no", "vs", "etc", "approx", "e.g", "i.e",
];

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '.' || c == '!' || c == '?' {
            // Keep any closing quote with the sentence it ends
            let mut end = i + 1;
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | '\u{2019}' | '\u{201d}') {
                end += 1;
            }

            if is_boundary(&chars, i, end) {
                let sentence: String = chars[start..end].iter().collect();
                let sentence = sentence.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    // Trailing text without terminal punctuation is still a sentence
    if start < chars.len() {
        let tail: String = chars[start..].iter().collect();
        let tail = tail.trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences
}

/// Decide whether the terminal character at `i` (with closers consumed up
/// to `end`) really ends a sentence.
fn is_boundary(chars: &[char], i: usize, end: usize) -> bool {
    // Decimal numbers: digit on both sides of a period
    if chars[i] == '.'
        && i > 0
        && chars[i - 1].is_ascii_digit()
        && chars.get(i + 1).map(|c| c.is_ascii_digit()).unwrap_or(false)
    {
        return false;
    }

    // Titles, abbreviations, and single initials before a period
    if chars[i] == '.' {
        let word = preceding_word(chars, i);
        let word = word.trim_end_matches('.').to_lowercase();
        if !word.is_empty() && (ABBREVIATIONS.contains(&word.as_str()) || word.chars().count() == 1)
        {
            return false;
        }
    }

    // End of text always closes the sentence
    let mut j = end;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    let Some(&next) = chars.get(j) else {
        return true;
    };

    // A following lowercase letter means the period did not end anything
    !next.is_lowercase()
}

/// The run of non-whitespace characters immediately before position `i`.
fn preceding_word(chars: &[char], i: usize) -> String {
    let mut start = i;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    chars[start..i].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_sentences() {
        let s = split_sentences("Mrs Smith is 89 years old. She has dementia. She lives alone.");
        assert_eq!(
            s,
            vec![
                "Mrs Smith is 89 years old.",
                "She has dementia.",
                "She lives alone."
            ]
        );
    }

    #[test]
    fn keeps_titles_together() {
        let s = split_sentences("Mr. Smith arrived. He sat down.");
        assert_eq!(s, vec!["Mr. Smith arrived.", "He sat down."]);
    }

    #[test]
    fn keeps_decimals_together() {
        let s = split_sentences("She takes 2.5 mg daily. He agrees.");
        assert_eq!(s, vec!["She takes 2.5 mg daily.", "He agrees."]);
    }

    #[test]
    fn handles_question_and_exclamation() {
        let s = split_sentences("Does he need support? He says no! Carers disagree.");
        assert_eq!(
            s,
            vec!["Does he need support?", "He says no!", "Carers disagree."]
        );
    }

    #[test]
    fn unterminated_tail_is_a_sentence() {
        let s = split_sentences("First sentence. And a trailing fragment");
        assert_eq!(s, vec!["First sentence.", "And a trailing fragment"]);
    }

    #[test]
    fn lowercase_continuation_does_not_split() {
        let s = split_sentences("He attends the clinic e.g. on Mondays and Fridays.");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn closing_quote_stays_with_sentence() {
        let s = split_sentences("She said \"I am fine.\" The carer disagreed.");
        assert_eq!(s, vec!["She said \"I am fine.\"", "The carer disagreed."]);
    }
}
