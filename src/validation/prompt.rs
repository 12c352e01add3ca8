use crate::error::{ValidationError, ValidationField};

pub const MAX_PROMPT_CHARS: usize = 1000;

pub const DEFAULT_BLOCKED_TERMS: &[&str] = &["explicit", "nsfw", "violence"];

/// Content check run against every prompt before it is accepted.
pub trait ContentPolicy: Send + Sync {
    /// Returns a human-readable reason when the prompt is refused.
    fn violation(&self, prompt: &str) -> Option<String>;
}

/// Case-insensitive substring denylist.
///
/// Substring matching over-blocks: "violence" also refuses "non-violence".
#[derive(Debug, Clone)]
pub struct DenylistPolicy {
    terms: Vec<String>,
}

impl DenylistPolicy {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.into().to_lowercase())
                .filter(|term| !term.trim().is_empty())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Default for DenylistPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_TERMS.iter().copied())
    }
}

impl ContentPolicy for DenylistPolicy {
    fn violation(&self, prompt: &str) -> Option<String> {
        let lower = prompt.to_lowercase();
        self.terms
            .iter()
            .find(|term| lower.contains(term.as_str()))
            .map(|term| format!("Prompt contains blocked term: {term}"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl ContentPolicy for AllowAllPolicy {
    fn violation(&self, _prompt: &str) -> Option<String> {
        None
    }
}

pub fn validate_prompt(prompt: &str, policy: &dyn ContentPolicy) -> Result<(), ValidationError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            ValidationField::Prompt,
            "Prompt is required",
        ));
    }
    if trimmed.chars().count() > MAX_PROMPT_CHARS {
        return Err(ValidationError::new(
            ValidationField::Prompt,
            format!("Prompt must be at most {MAX_PROMPT_CHARS} characters"),
        ));
    }
    if let Some(reason) = policy.violation(trimmed) {
        return Err(ValidationError::new(ValidationField::Prompt, reason));
    }
    Ok(())
}

/// Normalizes free text before it leaves the client. Never fails.
pub fn sanitize_prompt(prompt: &str) -> String {
    let stripped: String = prompt.chars().filter(|c| *c != '<' && *c != '>').collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_PROMPT_CHARS).collect();
    truncated.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(prompt: &str) -> Result<(), ValidationError> {
        validate_prompt(prompt, &DenylistPolicy::default())
    }

    #[test]
    fn test_empty_prompt_rejected() {
        for prompt in ["", "   ", "\n\t"] {
            let err = check(prompt).unwrap_err();
            assert_eq!(err.field, ValidationField::Prompt);
            assert_eq!(err.message, "Prompt is required");
        }
    }

    #[test]
    fn test_length_is_measured_after_trim() {
        let exact = "a".repeat(MAX_PROMPT_CHARS);
        assert!(check(&exact).is_ok());
        assert!(check(&format!("   {exact}   ")).is_ok());
        assert!(check(&format!("{exact}b")).is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let wide = "é".repeat(MAX_PROMPT_CHARS);
        assert!(check(&wide).is_ok());
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let err = check("An NSFW scene").unwrap_err();
        assert_eq!(err.field, ValidationField::Prompt);
        assert!(err.message.contains("nsfw"));
    }

    #[test]
    fn test_denylist_substring_false_positive() {
        assert!(check("a poster about non-violence").is_err());
    }

    #[test]
    fn test_allow_all_policy() {
        assert!(validate_prompt("graphic violence", &AllowAllPolicy).is_ok());
    }

    #[test]
    fn test_custom_denylist() {
        let policy = DenylistPolicy::new(["Dragon", " "]);
        assert_eq!(policy.terms().to_vec(), vec!["dragon".to_string()]);
        assert!(validate_prompt("a red DRAGON", &policy).is_err());
        assert!(validate_prompt("a red fox", &policy).is_ok());
    }

    #[test]
    fn test_sanitize_normalizes() {
        assert_eq!(sanitize_prompt("  a   red\n\tfox  "), "a red fox");
        assert_eq!(sanitize_prompt("<b>bold</b> fox"), "bbold/b fox");
        assert_eq!(sanitize_prompt("a <> b"), "a b");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = format!("{} tail", "x".repeat(MAX_PROMPT_CHARS));
        assert_eq!(sanitize_prompt(&long).chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = vec![
            String::new(),
            "   ".to_string(),
            "a <> b".to_string(),
            "x <".to_string(),
            "  <<>>  ".to_string(),
            "tabs\tand\nnewlines  ".to_string(),
            format!("{} <b>", "y ".repeat(600)),
            format!("{}  z", "w".repeat(999)),
        ];
        for sample in samples {
            let once = sanitize_prompt(&sample);
            assert_eq!(sanitize_prompt(&once), once, "{sample:?}");
        }
    }
}
