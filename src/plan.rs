use crate::config::{OrchestrationMode, ProviderKind};

/// Instruction sent with the image to the vision model in two-stage mode.
pub const CAPTION_PROMPT: &str = "Describe the clothes, colors, and textures of the person's outfit in this image in factual detail.";

/// Used as the stage-2 description when the vision model returns nothing.
pub const DESCRIPTION_FALLBACK: &str = "A person wearing clothes.";

/// Answer when the styling stage of a two-stage request returns no text.
pub const STYLING_FALLBACK: &str = "Could not generate styling ideas.";

/// Model identifiers used for each kind of stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub text: String,
    pub vision: String,
    pub multimodal: String,
}

impl ModelCatalog {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Cloudflare => Self {
                text: "@cf/meta/llama-2-7b-chat-int8".to_string(),
                vision: "@cf/llava-hf/llava-1.5-7b-hf".to_string(),
                multimodal: "@cf/llava-hf/llava-1.5-7b-hf".to_string(),
            },
            ProviderKind::Gemini => Self {
                text: "gemini-1.5-flash-latest".to_string(),
                vision: "gemini-2.5-flash".to_string(),
                multimodal: "gemini-2.5-flash".to_string(),
            },
        }
    }
}

/// What a stage sends to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// The prompt alone.
    TextOnly,
    /// The image with the fixed captioning instruction.
    Vision,
    /// The image with the caller's prompt.
    TextWithImage,
}

impl StageKind {
    pub fn carries_image(&self) -> bool {
        !matches!(self, StageKind::TextOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStage {
    pub kind: StageKind,
    pub model_id: String,
}

impl PlannedStage {
    fn new(kind: StageKind, model_id: &str) -> Self {
        Self {
            kind,
            model_id: model_id.to_string(),
        }
    }
}

/// The remote calls needed to serve one request, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPlan {
    Single(PlannedStage),
    /// The text stage's prompt is built from the vision stage's output.
    TwoStage {
        vision: PlannedStage,
        text: PlannedStage,
    },
}

impl ModelPlan {
    pub fn stage_count(&self) -> usize {
        match self {
            ModelPlan::Single(_) => 1,
            ModelPlan::TwoStage { .. } => 2,
        }
    }
}

/// Chooses the remote calls for a request.
pub fn select_plan(has_image: bool, mode: OrchestrationMode, models: &ModelCatalog) -> ModelPlan {
    if !has_image {
        return ModelPlan::Single(PlannedStage::new(StageKind::TextOnly, &models.text));
    }
    match mode {
        OrchestrationMode::SingleStage => {
            ModelPlan::Single(PlannedStage::new(StageKind::TextWithImage, &models.multimodal))
        }
        OrchestrationMode::TwoStage => ModelPlan::TwoStage {
            vision: PlannedStage::new(StageKind::Vision, &models.vision),
            text: PlannedStage::new(StageKind::TextOnly, &models.text),
        },
    }
}

/// Builds the stage-2 prompt from the image description and the caller's text.
pub fn compose_styling_prompt(description: &str, text: &str) -> String {
    format!("Based on the following description of an outfit: \"{description}\". {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_requests_use_the_text_model_in_any_mode() {
        let models = ModelCatalog::for_provider(ProviderKind::Cloudflare);
        for mode in [OrchestrationMode::SingleStage, OrchestrationMode::TwoStage] {
            let plan = select_plan(false, mode, &models);
            assert_eq!(
                plan,
                ModelPlan::Single(PlannedStage::new(StageKind::TextOnly, &models.text))
            );
        }
    }

    #[test]
    fn single_stage_image_uses_multimodal_model() {
        let models = ModelCatalog::for_provider(ProviderKind::Gemini);
        let plan = select_plan(true, OrchestrationMode::SingleStage, &models);
        assert_eq!(plan.stage_count(), 1);
        assert_eq!(
            plan,
            ModelPlan::Single(PlannedStage::new(StageKind::TextWithImage, "gemini-2.5-flash"))
        );
    }

    #[test]
    fn two_stage_image_captions_then_generates() {
        let models = ModelCatalog::for_provider(ProviderKind::Cloudflare);
        match select_plan(true, OrchestrationMode::TwoStage, &models) {
            ModelPlan::TwoStage { vision, text } => {
                assert_eq!(vision.kind, StageKind::Vision);
                assert_eq!(vision.model_id, "@cf/llava-hf/llava-1.5-7b-hf");
                assert_eq!(text.kind, StageKind::TextOnly);
                assert_eq!(text.model_id, "@cf/meta/llama-2-7b-chat-int8");
            }
            plan => panic!("expected a two-stage plan, got {plan:?}"),
        }
    }

    #[test]
    fn styling_prompt_quotes_description_before_request() {
        assert_eq!(
            compose_styling_prompt("a person in a blue shirt", "style this"),
            "Based on the following description of an outfit: \"a person in a blue shirt\". style this"
        );
    }
}
