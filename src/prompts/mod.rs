//! Prompt construction and response decoding for the AI backends.
//!
//! A template renders a prompt from typed input and turns the model's raw
//! text back into typed output. Decoding strips code fences, parses JSON,
//! validates it against the template's bundled JSON Schema and only then
//! performs the typed decode.

pub mod background;
pub mod event_parsing;
pub mod template_generation;

use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{truncate, PipelineError, Result};

pub use background::{build_background_prompt, placeholder_url};
pub use event_parsing::{EventParsingInput, EventParsingTemplate};
pub use template_generation::{
    TemplateGenerationInput, TemplateGenerationOutput, TemplateGenerationTemplate,
};

/// Characters of the offending response quoted in a parse error.
const EXCERPT_CHARS: usize = 100;

/// How many schema violations are reported in a parse error.
const MAX_REPORTED_VIOLATIONS: usize = 3;

pub trait PromptTemplate {
    type Input<'a>;
    type Output: DeserializeOwned;

    fn id(&self) -> &'static str;

    fn build(&self, input: &Self::Input<'_>) -> String;

    fn output_schema(&self) -> &'static OutputSchema;

    /// Reshape the decoded JSON before validation.
    fn normalize(&self, value: Value) -> Value {
        value
    }

    fn parse(&self, response: &str) -> Result<Self::Output> {
        let value = self.normalize(decode_json(response)?);
        self.output_schema().validate(&value)?;
        serde_json::from_value(value).map_err(|e| {
            PipelineError::Parsing(format!("{} response does not match its shape: {}", self.id(), e))
        })
    }
}

/// Remove Markdown code fences a model may wrap around its JSON.
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn decode_json(response: &str) -> Result<Value> {
    serde_json::from_str(&strip_code_fences(response)).map_err(|_| {
        PipelineError::Parsing(format!(
            "not valid JSON: {}",
            truncate(response, EXCERPT_CHARS)
        ))
    })
}

/// Shared closing instruction for every JSON-producing prompt.
pub(crate) fn json_instructions(schema_example: &str) -> String {
    format!(
        "Return ONLY valid JSON (no markdown code blocks, no explanations).\nExpected format:\n{}",
        schema_example.trim()
    )
}

/// A bundled JSON Schema, compiled once.
pub struct OutputSchema {
    document: &'static Value,
    compiled: JSONSchema,
}

impl OutputSchema {
    /// Compile a schema shipped with the crate. Bundled schemas are covered by
    /// tests, so failure here is a build defect.
    pub(crate) fn bundled(raw: &'static str) -> Self {
        let document: Value = serde_json::from_str(raw).expect("bundled schema is valid JSON");
        // jsonschema 0.17 borrows the schema for the validator's lifetime
        let document: &'static Value = Box::leak(Box::new(document));
        let compiled = JSONSchema::options()
            .compile(document)
            .expect("bundled schema compiles");
        Self { document, compiled }
    }

    pub fn document(&self) -> &'static Value {
        self.document
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }

    pub fn validate(&self, instance: &Value) -> Result<()> {
        if let Err(errors) = self.compiled.validate(instance) {
            let violations: Vec<String> = errors
                .take(MAX_REPORTED_VIOLATIONS)
                .map(|e| {
                    // The message quotes the offending instance, which can be the whole response.
                    let message = truncate(&e.to_string(), EXCERPT_CHARS);
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        message
                    } else {
                        format!("{} at {}", message, path)
                    }
                })
                .collect();
            return Err(PipelineError::Parsing(format!(
                "schema violation: {}",
                violations.join("; ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
    }

    #[test]
    fn decode_error_quotes_a_bounded_excerpt() {
        let garbage = format!("Sure! Here is your JSON: {}", "x".repeat(300));
        let err = decode_json(&garbage).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("not valid JSON: Sure! Here is"));
        assert!(message.ends_with("..."));
        assert!(message.len() < 220);
    }

    #[test]
    fn schema_violations_quote_bounded_excerpts() {
        let schema = OutputSchema::bundled(r#"{"type": "object", "required": ["name"]}"#);
        let huge = Value::Array((0..500).map(|i| Value::from(format!("item-{i}"))).collect());

        let message = schema.validate(&huge).unwrap_err().to_string();

        assert!(message.contains("schema violation: "));
        assert!(message.contains("..."));
        assert!(!message.contains("item-499"));
        assert!(message.len() < 2 * EXCERPT_CHARS + 60);
    }
}
