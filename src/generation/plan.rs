use crate::error::PipelineError;
use crate::gateway::{Field, OutputSchema};
use crate::shape::round_half_up;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fewest parts a usable plan can have (eyes and mouth)
pub const MIN_PLAN_PARTS: usize = 2;

/// Allowed z-index band for one part
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZIndexRange {
    pub min: i32,
    pub max: i32,
}

impl Default for ZIndexRange {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// One planned part of a character
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub design_guidance: String,
    pub suggested_colors: Vec<String>,
    pub z_index_range: ZIndexRange,
}

impl PartSpec {
    fn mentions(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }

    pub fn is_eyes(&self) -> bool {
        self.mentions("eye")
    }

    pub fn is_mouth(&self) -> bool {
        self.mentions("mouth")
    }

    pub fn is_facial(&self) -> bool {
        self.is_eyes() || self.is_mouth()
    }
}

/// Ordered decomposition of a concept into parts, back to front
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub parts: Vec<PartSpec>,
    pub design_notes: String,
    pub color_strategy: String,
    pub style_guide: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawZIndexRange {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPart {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    design_guidance: Option<String>,
    #[serde(default)]
    suggested_colors: Option<Vec<String>>,
    #[serde(default)]
    z_index_range: Option<RawZIndexRange>,
}

/// Plan as returned by the model
#[derive(Debug, Default, Deserialize)]
pub struct RawPlan {
    #[serde(default)]
    pub parts: Vec<RawPart>,
    #[serde(default)]
    pub design_notes: Option<String>,
    #[serde(default)]
    pub color_strategy: Option<String>,
    #[serde(default)]
    pub style_guide: Option<String>,
}

fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

impl RawPart {
    fn normalize(self, position: usize) -> PartSpec {
        let name = self.name.unwrap_or_default().trim().to_string();
        let id = match self.id {
            Some(Value::String(s)) if !slug(&s).is_empty() => slug(&s),
            Some(Value::Number(n)) => format!("part_{}", n),
            _ if !slug(&name).is_empty() => slug(&name),
            _ => format!("part_{}", position + 1),
        };
        let z_index_range = self
            .z_index_range
            .map(|r| {
                let min = r.min.map(round_half_up).unwrap_or(0);
                let max = r.max.map(round_half_up).unwrap_or(100);
                ZIndexRange {
                    min: min.min(max),
                    max: max.max(min),
                }
            })
            .unwrap_or_default();

        PartSpec {
            name: if name.is_empty() { id.clone() } else { name },
            id,
            description: self.description.unwrap_or_default(),
            design_guidance: self.design_guidance.unwrap_or_default(),
            suggested_colors: self.suggested_colors.unwrap_or_default(),
            z_index_range,
        }
    }
}

impl RawPlan {
    /// Validate and order the plan.
    ///
    /// Rejects plans shorter than [`MIN_PLAN_PARTS`] or missing an eyes or a
    /// mouth part. Facial parts are moved behind all other parts, keeping
    /// their relative order.
    pub fn normalize(self) -> Result<GenerationPlan, PipelineError> {
        let parts: Vec<PartSpec> = self
            .parts
            .into_iter()
            .enumerate()
            .map(|(i, raw)| raw.normalize(i))
            .collect();

        if parts.len() < MIN_PLAN_PARTS {
            return Err(PipelineError::PlanTooShort {
                parts: parts.len(),
                minimum: MIN_PLAN_PARTS,
            });
        }
        if !parts.iter().any(PartSpec::is_eyes) {
            return Err(PipelineError::MissingRequiredPart("eyes"));
        }
        if !parts.iter().any(PartSpec::is_mouth) {
            return Err(PipelineError::MissingRequiredPart("mouth"));
        }

        let (facial, mut ordered): (Vec<PartSpec>, Vec<PartSpec>) =
            parts.into_iter().partition(PartSpec::is_facial);
        ordered.extend(facial);

        Ok(GenerationPlan {
            parts: ordered,
            design_notes: self.design_notes.unwrap_or_default(),
            color_strategy: self.color_strategy.unwrap_or_default(),
            style_guide: self.style_guide.unwrap_or_default(),
        })
    }
}

pub(crate) fn plan_schema() -> OutputSchema {
    OutputSchema::object(vec![
        Field::new(
            "parts",
            OutputSchema::array(OutputSchema::object(vec![
                Field::new("id", OutputSchema::string()),
                Field::new("name", OutputSchema::string()),
                Field::new("description", OutputSchema::string()),
                Field::new("design_guidance", OutputSchema::string()),
                Field::new("suggested_colors", OutputSchema::array(OutputSchema::string())),
                Field::new(
                    "z_index_range",
                    OutputSchema::object(vec![
                        Field::new("min", OutputSchema::number()),
                        Field::new("max", OutputSchema::number()),
                    ]),
                ),
            ])),
        ),
        Field::new("design_notes", OutputSchema::string()),
        Field::new("color_strategy", OutputSchema::string()),
        Field::new("style_guide", OutputSchema::string()),
    ])
}
