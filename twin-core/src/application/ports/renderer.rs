use crate::error::TwinError;

/// Renders one of the guide documents shipped with the generator.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, TwinError>;
}
