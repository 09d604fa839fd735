use crate::Result;

/// Free-text generation collaborator (prompt in, text out)
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Deterministic generator that answers every prompt from a template.
///
/// `{prompt}` in the template is replaced by the prompt text.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    template: String,
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(
            "{prompt} Every line of code and every panel installed moves a community \
             closer to clean air, and your skills are the spark that makes it happen.",
        )
    }
}

impl TemplateGenerator {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl TextGenerator for TemplateGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.template.replace("{prompt}", prompt))
    }
}
