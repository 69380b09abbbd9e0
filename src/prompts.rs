//! System prompt for vision-model OCR.
//!
//! Used only by [`crate::pipeline::ocr::VisionOcr`]. The model is asked for a
//! plain transcription, not Markdown, so its output can drop straight into a
//! `--- Page N (OCR) ---` block next to tesseract's.

/// Transcription prompt sent with every page image.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe all text visible in the page image.

Rules:
- Output the text exactly as printed, in natural reading order.
- Keep line breaks where the page has them; separate paragraphs with a blank line.
- Include handwriting, stamps, and marginal notes if they are legible.
- Do not describe images, do not summarise, do not add commentary.
- Do not use Markdown formatting or code fences.
- If the page contains no legible text, output nothing."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_forbids_markdown_and_commentary() {
        assert!(OCR_SYSTEM_PROMPT.contains("Do not use Markdown"));
        assert!(OCR_SYSTEM_PROMPT.contains("do not add commentary"));
    }
}
