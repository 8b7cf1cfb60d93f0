/*!
 * Prompt template for single-entry subtitle translation.
 *
 * The engine is driven with a plain completion prompt in question/answer
 * form. Generation is stopped at the next question marker or newline so that
 * exactly one translation comes back.
 */

/// Completion prompt with `{source_language}`, `{target_language}` and `{text}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default translation prompt.
    pub const SUBTITLE_TRANSLATOR: &'static str = "Q: Perfectly translate this from {source_language} to {target_language}. Leave out any notes or suggestions, only reply with the ideal translation: {text} \nA:";

    /// Stop sequences matching the question/answer layout of the default prompt.
    pub const DEFAULT_STOP: [&'static str; 2] = ["Q:", "\n"];

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default subtitle translator template.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Whether the template has a slot for the text to translate.
    pub fn has_text_placeholder(&self) -> bool {
        self.template.contains("{text}")
    }

    /// Render the template. Language names are inserted verbatim.
    pub fn render(&self, text: &str, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{text}", text)
    }

    /// Stop sequences to send with every request.
    pub fn stop_sequences(&self) -> Vec<String> {
        Self::DEFAULT_STOP.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Reduce a raw completion to a single translation.
///
/// Keeps the first line (engines that ignore stop sequences keep talking),
/// drops anything from a `Q:` marker on, trims whitespace and removes one
/// pair of surrounding quotes. Returns an empty string when nothing is left.
pub fn clean_completion(raw: &str) -> String {
    let first_line = raw.trim_start().split('\n').next().unwrap_or_default();
    let answer = match first_line.find("Q:") {
        Some(pos) => &first_line[..pos],
        None => first_line,
    };
    let answer = answer.trim();

    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”'), ('«', '»')] {
        if answer.chars().count() >= 2 && answer.starts_with(open) && answer.ends_with(close) {
            let inner = &answer[open.len_utf8()..answer.len() - close.len_utf8()];
            return inner.trim().to_string();
        }
    }

    answer.to_string()
}
