/// Chat-completions endpoint used by OpenAI models.
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Providers a panel can be pointed at.
///
/// Only [`ProviderKind::OpenAi`] speaks a wire format the consumer
/// understands; the rest are listed so configuration can name them and get a
/// clear error instead of an unknown-provider one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    NvidiaAiPlayground,
    AmazonBedrock,
    GoogleVertexAi,
    LeptonAi,
    HuggingFaceSpaces,
    HuggingFaceInferencePro,
    TogetherAi,
    Replicate,
    FireworksAi,
    OctoAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 11] = [
        ProviderKind::OpenAi,
        ProviderKind::NvidiaAiPlayground,
        ProviderKind::AmazonBedrock,
        ProviderKind::GoogleVertexAi,
        ProviderKind::LeptonAi,
        ProviderKind::HuggingFaceSpaces,
        ProviderKind::HuggingFaceInferencePro,
        ProviderKind::TogetherAi,
        ProviderKind::Replicate,
        ProviderKind::FireworksAi,
        ProviderKind::OctoAi,
    ];

    /// Identifier used in config files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::NvidiaAiPlayground => "nvidia",
            ProviderKind::AmazonBedrock => "bedrock",
            ProviderKind::GoogleVertexAi => "vertex",
            ProviderKind::LeptonAi => "lepton",
            ProviderKind::HuggingFaceSpaces => "hf-spaces",
            ProviderKind::HuggingFaceInferencePro => "hf-inference",
            ProviderKind::TogetherAi => "together",
            ProviderKind::Replicate => "replicate",
            ProviderKind::FireworksAi => "fireworks",
            ProviderKind::OctoAi => "octoai",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::NvidiaAiPlayground => "NVIDIA AI Playground",
            ProviderKind::AmazonBedrock => "Amazon Bedrock",
            ProviderKind::GoogleVertexAi => "Google Vertex AI",
            ProviderKind::LeptonAi => "Lepton AI",
            ProviderKind::HuggingFaceSpaces => "HuggingFace Spaces",
            ProviderKind::HuggingFaceInferencePro => "HuggingFace Inference Pro",
            ProviderKind::TogetherAi => "Together.ai",
            ProviderKind::Replicate => "Replicate",
            ProviderKind::FireworksAi => "Fireworks.ai",
            ProviderKind::OctoAi => "OctoAI",
        }
    }

    pub fn is_implemented(self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }

    /// Environment variable consulted for the API key when a slot names none.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some(OPENAI_CHAT_COMPLETIONS_URL),
            _ => None,
        }
    }

    pub fn models(self) -> &'static [ModelInfo] {
        match self {
            ProviderKind::OpenAi => OPENAI_MODELS,
            _ => &[],
        }
    }

    /// Look up a model by name, case-sensitive like the provider APIs.
    pub fn model(self, name: &str) -> Option<&'static ModelInfo> {
        self.models().iter().find(|m| m.name == name)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Static metadata shown next to a selected model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub endpoint: &'static str,
    pub max_tokens: u32,
    pub training_data: &'static str,
}

const fn openai(name: &'static str, max_tokens: u32, training_data: &'static str) -> ModelInfo {
    ModelInfo {
        name,
        endpoint: OPENAI_CHAT_COMPLETIONS_URL,
        max_tokens,
        training_data,
    }
}

static OPENAI_MODELS: &[ModelInfo] = &[
    openai("gpt-4-1106-preview", 4_096, "Apr 2023"),
    openai("gpt-4-vision-preview", 4_096, "Apr 2023"),
    openai("gpt-4", 8_192, "Sep 2021"),
    openai("gpt-4-32k", 32_768, "Sep 2021"),
    openai("gpt-4-0613", 8_192, "Sep 2021"),
    openai("gpt-4-32k-0613", 32_768, "Sep 2021"),
    openai("gpt-4-0314", 8_192, "Sep 2021"),
    openai("gpt-4-32k-0314", 32_768, "Sep 2021"),
    openai("gpt-3.5-turbo-1106", 16_385, "Sep 2021"),
    openai("gpt-3.5-turbo", 4_096, "Sep 2021"),
    openai("gpt-3.5-turbo-16k", 16_385, "Sep 2021"),
    openai("gpt-3.5-turbo-instruct", 4_096, "Sep 2021"),
];
