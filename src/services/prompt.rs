use crate::error::GenerationError;
use crate::models::LengthCategory;

/// Builds the article prompt from a raw length label, as posted by a form.
pub fn build_prompt(topic: &str, length: &str) -> Result<String, GenerationError> {
    let category: LengthCategory = length.parse()?;
    Ok(render_prompt(topic, category))
}

pub fn render_prompt(topic: &str, length: LengthCategory) -> String {
    format!(
        "Write an informative article about {}.\nKeep it around {} words.\nUse a clear, engaging style with proper structure and paragraphs.",
        topic,
        length.word_count()
    )
}
