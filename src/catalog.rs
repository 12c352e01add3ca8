use serde::{Deserialize, Serialize};

use crate::api::schemas::ModelDescriptor;
use crate::job::GenerationParameters;

/// Diffusion checkpoints the studio knows about out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KnownModel {
    #[default]
    DreamShaperV8,
    AnythingV5,
    Sdxl,
}

impl KnownModel {
    /// Model ID for API communication
    pub fn id(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "dreamshaper-v8",
            Self::AnythingV5 => "anything-v5",
            Self::Sdxl => "sdxl",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "DreamShaper v8",
            Self::AnythingV5 => "Anything v5",
            Self::Sdxl => "Stable Diffusion XL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "Best for Ghibli-style landscapes and magical scenes",
            Self::AnythingV5 => "Excellent for anime portraits and character art",
            Self::Sdxl => "High-quality renders with exceptional detail",
        }
    }

    pub fn vram_requirement(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "6GB",
            Self::AnythingV5 => "4GB",
            Self::Sdxl => "12GB",
        }
    }

    pub fn best_for(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "Fantasy art, landscapes",
            Self::AnythingV5 => "Anime, portraits",
            Self::Sdxl => "High resolution, detail",
        }
    }

    pub fn hugging_face_id(&self) -> &'static str {
        match self {
            Self::DreamShaperV8 => "Lykon/dreamshaper-8",
            Self::AnythingV5 => "Lykon/anything-v5-pruned",
            Self::Sdxl => "stabilityai/stable-diffusion-xl-base-1.0",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|model| model.id() == id)
    }

    pub fn all() -> [KnownModel; 3] {
        [Self::DreamShaperV8, Self::AnythingV5, Self::Sdxl]
    }

    pub fn descriptor(&self) -> ModelDescriptor {
        ModelDescriptor {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            vram_req: Some(self.vram_requirement().to_string()),
            best_for: Some(self.best_for().to_string()),
        }
    }
}

/// The set of model ids a request may target right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    ids: Vec<String>,
}

impl ModelCatalog {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_descriptors(descriptors: &[ModelDescriptor]) -> Self {
        Self::new(descriptors.iter().map(|descriptor| descriptor.id.clone()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(KnownModel::all().iter().map(KnownModel::id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Speed,
    Balanced,
    Quality,
    Faithful,
    Stylized,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Balanced => "Balanced",
            Self::Quality => "Quality",
            Self::Faithful => "Faithful",
            Self::Stylized => "Stylized",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Speed => "Fast generation, good quality",
            Self::Balanced => "Good balance of speed and quality",
            Self::Quality => "High quality, slower generation",
            Self::Faithful => "Closely follows prompt",
            Self::Stylized => "More creative interpretation",
        }
    }

    /// (steps, guidance, width, height)
    fn settings(&self) -> (u32, f32, u32, u32) {
        match self {
            Self::Speed => (12, 6.0, 512, 512),
            Self::Balanced => (20, 7.5, 512, 512),
            Self::Quality => (30, 8.0, 768, 768),
            Self::Faithful => (25, 12.0, 512, 512),
            Self::Stylized => (20, 4.0, 512, 512),
        }
    }

    /// Overwrites steps, guidance and size; leaves seed, strength and upscale alone.
    pub fn apply(&self, parameters: &mut GenerationParameters) {
        let (steps, guidance, width, height) = self.settings();
        parameters.steps = steps;
        parameters.guidance = guidance;
        parameters.width = width;
        parameters.height = height;
    }

    pub fn all() -> [Preset; 5] {
        [
            Self::Speed,
            Self::Balanced,
            Self::Quality,
            Self::Faithful,
            Self::Stylized,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const ASPECT_RATIOS: [AspectRatio; 7] = [
    AspectRatio {
        name: "1:1 Square",
        width: 512,
        height: 512,
    },
    AspectRatio {
        name: "4:3 Landscape",
        width: 512,
        height: 384,
    },
    AspectRatio {
        name: "3:4 Portrait",
        width: 384,
        height: 512,
    },
    AspectRatio {
        name: "16:9 Widescreen",
        width: 512,
        height: 288,
    },
    AspectRatio {
        name: "9:16 Vertical",
        width: 288,
        height: 512,
    },
    AspectRatio {
        name: "2:3 Portrait",
        width: 512,
        height: 768,
    },
    AspectRatio {
        name: "3:2 Landscape",
        width: 768,
        height: 512,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_parameters;

    #[test]
    fn test_model_ids() {
        assert_eq!(KnownModel::DreamShaperV8.id(), "dreamshaper-v8");
        assert_eq!(KnownModel::from_id("sdxl"), Some(KnownModel::Sdxl));
        assert_eq!(KnownModel::from_id("midjourney"), None);
    }

    #[test]
    fn test_default_catalog_has_every_known_model() {
        let catalog = ModelCatalog::default();
        for model in KnownModel::all() {
            assert!(catalog.contains(model.id()));
        }
        assert!(!catalog.contains("stable-diffusion-v1"));
    }

    #[test]
    fn test_presets_produce_valid_parameters() {
        for preset in Preset::all() {
            let mut params = GenerationParameters::default();
            preset.apply(&mut params);
            assert!(validate_parameters(&params).is_ok(), "{}", preset.name());
        }
    }

    #[test]
    fn test_preset_keeps_seed() {
        let mut params = GenerationParameters {
            seed: Some(7),
            ..Default::default()
        };
        Preset::Quality.apply(&mut params);
        assert_eq!(params.seed, Some(7));
        assert_eq!((params.width, params.height), (768, 768));
    }

    #[test]
    fn test_aspect_ratios_are_multiples_of_eight() {
        for ratio in ASPECT_RATIOS {
            assert_eq!(ratio.width % 8, 0, "{}", ratio.name);
            assert_eq!(ratio.height % 8, 0, "{}", ratio.name);
        }
    }
}
