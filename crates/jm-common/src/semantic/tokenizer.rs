use std::collections::HashSet;
use std::sync::LazyLock;

use crate::{CandidateProfile, JobPosting};

/// English stop words dropped before vectorisation.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "etc", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into",
        "is", "it", "its", "itself", "just", "me", "more", "most", "must", "my", "no", "nor",
        "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out",
        "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
        "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
        "through", "to", "too", "under", "until", "up", "us", "very", "was", "we", "were",
        "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
        "within", "would", "you", "your", "yours",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Lower-cases and splits on anything that is not alphanumeric, `+` or `#`,
/// so `c++` and `c#` survive. Stop words and single characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .map(|raw| raw.trim_start_matches(['+', '#']))
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Contiguous n-grams for every n in `min_n..=max_n`, joined with a space.
pub fn ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let min_n = min_n.max(1);
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    grams
}

fn push_part(document: &mut String, part: &str) {
    let part = part.trim();
    if part.is_empty() {
        return;
    }
    if !document.is_empty() {
        document.push(' ');
    }
    document.push_str(part);
}

/// Summary, experience titles and descriptions, then skill names.
pub fn candidate_document(candidate: &CandidateProfile) -> String {
    let mut document = String::new();
    push_part(&mut document, &candidate.summary);
    for record in &candidate.experience {
        push_part(&mut document, &record.title);
        if let Some(description) = record.description.as_deref() {
            push_part(&mut document, description);
        }
    }
    for skill in &candidate.skills {
        push_part(&mut document, &skill.name);
    }
    document
}

/// Title, description, requirements, required skill names and domain tags.
pub fn job_document(job: &JobPosting) -> String {
    let mut document = String::new();
    push_part(&mut document, &job.title);
    push_part(&mut document, &job.description);
    push_part(&mut document, &job.requirements);
    for skill in &job.required_skills {
        push_part(&mut document, &skill.name);
    }
    for tag in &job.domain_tags {
        push_part(&mut document, tag);
    }
    document
}
