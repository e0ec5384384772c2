/// Returns the generated text, or `fallback` when the provider produced none.
pub fn text_or_fallback(extracted: Option<String>, fallback: &str) -> String {
    match extracted {
        Some(text) if !text.trim().is_empty() => text,
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_generated_text() {
        assert_eq!(
            text_or_fallback(Some("Try a denim jacket.".into()), "none"),
            "Try a denim jacket."
        );
    }

    #[test]
    fn absent_or_blank_text_falls_back() {
        assert_eq!(text_or_fallback(None, "No content generated."), "No content generated.");
        assert_eq!(text_or_fallback(Some(String::new()), "fb"), "fb");
        assert_eq!(text_or_fallback(Some(" \n".into()), "fb"), "fb");
    }
}
