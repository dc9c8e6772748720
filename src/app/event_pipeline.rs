use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::app::ports::{AiGatewayPort, PageCapturePort};
use crate::error::{PipelineError, Result};
use crate::extract;
use crate::merge::merge;
use crate::metrics::PipelineMetrics;
use crate::mock;
use crate::prompts::{
    build_background_prompt, placeholder_url, EventParsingInput, EventParsingTemplate,
    PromptTemplate, TemplateGenerationInput, TemplateGenerationTemplate,
};
use crate::types::{BackgroundStyle, GeneratedTemplate, ParsedEventData};

/// Steps of the event-parsing fallback chain.
enum ParseState<'g> {
    NoCredential,
    AttemptVision(&'g dyn AiGatewayPort),
    FallbackTextOnly(&'g dyn AiGatewayPort),
    Done(ParsedEventData, &'static str),
    Failed(PipelineError),
}

/// Turns an event URL into structured event data, poster templates and
/// background artwork, degrading through the fallback chain when a stage
/// fails.
///
/// Without an AI gateway every operation is served by the offline
/// generators. With one, only extraction and parsing problems are worked
/// around; configuration, rate-limit and availability failures are returned
/// to the caller.
pub struct EventPipeline {
    capture: Arc<dyn PageCapturePort>,
    gateway: Option<Arc<dyn AiGatewayPort>>,
}

impl EventPipeline {
    pub fn new(capture: Arc<dyn PageCapturePort>, gateway: Option<Arc<dyn AiGatewayPort>>) -> Self {
        Self { capture, gateway }
    }

    pub fn has_ai(&self) -> bool {
        self.gateway.is_some()
    }

    #[instrument(skip(self), fields(url = %url))]
    pub async fn parse_event_from_url(&self, url: &str) -> Result<ParsedEventData> {
        info!("Parsing event");
        let mut state = match self.gateway.as_deref() {
            None => ParseState::NoCredential,
            Some(gateway) => ParseState::AttemptVision(gateway),
        };

        loop {
            state = match state {
                ParseState::NoCredential => {
                    warn!("No AI credential configured, generating mock event data");
                    PipelineMetrics::record_fallback("mock");
                    ParseState::Done(mock::generate_event_data(url), "mock")
                }
                ParseState::AttemptVision(gateway) => match self.parse_with_vision(gateway, url).await {
                    Ok(event) => ParseState::Done(event, "vision"),
                    Err(e) if e.kind().is_operator_actionable() => ParseState::Failed(e),
                    Err(e) => {
                        warn!("Vision parsing failed, falling back to text-only: {}", e);
                        PipelineMetrics::record_fallback("text_only");
                        ParseState::FallbackTextOnly(gateway)
                    }
                },
                ParseState::FallbackTextOnly(gateway) => match self.parse_text_only(gateway, url).await {
                    Ok(event) => ParseState::Done(event, "text_only"),
                    Err(e) if e.kind().is_operator_actionable() => ParseState::Failed(e),
                    Err(e) => {
                        error!("Text-only parsing failed: {}", e);
                        ParseState::Failed(PipelineError::ExtractionFailed)
                    }
                },
                ParseState::Done(event, path) => {
                    PipelineMetrics::record_parse(path);
                    info!(path, name = %event.name, "Event parsed");
                    return Ok(event);
                }
                ParseState::Failed(err) => {
                    PipelineMetrics::record_parse("failed");
                    error!("Event parsing failed: {}", err);
                    return Err(err);
                }
            };
        }
    }

    async fn parse_with_vision(&self, gateway: &dyn AiGatewayPort, url: &str) -> Result<ParsedEventData> {
        let capture = self.capture.capture(url).await?;
        let scraped = extract::scrape(&capture.html, &capture.url);

        let prompt = EventParsingTemplate.build_vision_prompt(&EventParsingInput {
            url,
            scraped: Some(&scraped),
        });
        let response = gateway.complete_vision(&prompt, &capture.screenshot).await?;
        let ai_result = EventParsingTemplate.parse(&response)?;
        Ok(merge(ai_result, &scraped))
    }

    async fn parse_text_only(&self, gateway: &dyn AiGatewayPort, url: &str) -> Result<ParsedEventData> {
        let prompt = EventParsingTemplate.build(&EventParsingInput { url, scraped: None });
        let response = gateway.complete_text(&prompt, true).await?;
        EventParsingTemplate.parse(&response)
    }

    /// At most `count` templates. Once a credential is configured there is no
    /// silent fallback to the offline templates.
    #[instrument(skip(self, event), fields(event = %event.name))]
    pub async fn generate_templates(
        &self,
        event: &ParsedEventData,
        count: usize,
    ) -> Result<Vec<GeneratedTemplate>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let Some(gateway) = self.gateway.as_deref() else {
            warn!("No AI credential configured, generating mock templates");
            PipelineMetrics::record_fallback("mock");
            return Ok(mock::generate_templates(event, count));
        };

        match Self::templates_from_ai(gateway, event, count).await {
            Ok(templates) if !templates.is_empty() => {
                info!(count = templates.len(), "Templates generated");
                Ok(templates)
            }
            Ok(_) => {
                error!("AI returned no templates");
                Err(PipelineError::TemplateGenerationFailed)
            }
            Err(e) if e.kind().is_operator_actionable() => {
                error!("Template generation failed: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Template generation failed: {}", e);
                Err(PipelineError::TemplateGenerationFailed)
            }
        }
    }

    async fn templates_from_ai(
        gateway: &dyn AiGatewayPort,
        event: &ParsedEventData,
        count: usize,
    ) -> Result<Vec<GeneratedTemplate>> {
        let template = TemplateGenerationTemplate;
        let prompt = template.build(&TemplateGenerationInput {
            event,
            count,
            layouts: None,
        });
        let response = gateway.complete_text(&prompt, true).await?;
        let output = template.parse(&response)?;
        Ok(template.finalize(output, event, count))
    }

    /// Never fails: any problem yields the palette placeholder image.
    #[instrument(skip(self, event), fields(event = %event.name, style = %style))]
    pub async fn generate_background_image(
        &self,
        event: &ParsedEventData,
        style: BackgroundStyle,
    ) -> String {
        let Some(gateway) = self.gateway.as_deref() else {
            PipelineMetrics::record_fallback("placeholder");
            return placeholder_url(event);
        };

        let prompt = build_background_prompt(event, style);
        match gateway.generate_image(&prompt).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Background generation failed, using placeholder: {}", e);
                PipelineMetrics::record_fallback("placeholder");
                placeholder_url(event)
            }
        }
    }
}
