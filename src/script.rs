use once_cell::sync::OnceCell;
use regex::Regex;

/// Cue text used when the script has nothing to show. The narration collaborator speaks
/// the same words for an empty script.
pub const PLACEHOLDER_SENTENCE: &str = "Hello world.";

/// Splits a narration script into trimmed sentences.
///
/// A boundary is terminal punctuation (`.`, `?`, `!`) followed by whitespace; the
/// punctuation stays with its sentence. Text without terminal punctuation is a single
/// sentence, and an empty script yields [`PLACEHOLDER_SENTENCE`], so the result is never
/// empty.
pub fn segment_sentences(script: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    if let Some(re) = boundary_regex() {
        for m in re.find_iter(script) {
            // The match is one punctuation byte followed by whitespace.
            let cut = m.start() + 1;
            push_trimmed(&mut sentences, &script[start..cut]);
            start = m.end();
        }
    }
    push_trimmed(&mut sentences, &script[start..]);

    if sentences.is_empty() {
        sentences.push(PLACEHOLDER_SENTENCE.to_string());
    }
    sentences
}

/// Pushes `fragment` with every whitespace run collapsed to one space, so a sentence is
/// always a single subtitle line.
fn push_trimmed(out: &mut Vec<String>, fragment: &str) {
    let collapsed = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        out.push(collapsed);
    }
}

fn boundary_regex() -> Option<&'static Regex> {
    static BOUNDARY_RE: OnceCell<Regex> = OnceCell::new();
    BOUNDARY_RE.get_or_try_init(|| Regex::new(r"[.?!]\s+")).ok()
}
