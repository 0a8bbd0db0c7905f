use std::fmt;

/// Failure to recover structured data from raw model output
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No `{` or `[` anywhere in the response text
    NoJson,
    /// Cleaned text still failed to parse as JSON
    Malformed(String),
    /// JSON parsed but does not have the expected shape
    Schema(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoJson => write!(f, "response contains no JSON object"),
            ParseError::Malformed(e) => write!(f, "failed to parse response as JSON: {}", e),
            ParseError::Schema(e) => write!(f, "response does not match expected schema: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised by an LLM gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No credential configured for the routed provider
    MissingCredential(String),
    /// Network-level failure (connect, timeout, body read)
    Transport(String),
    /// Endpoint answered with a non-success status
    Status { status: u16, body: String },
    /// Could not build an image attachment for the request
    Attachment(String),
    /// Response text was not recoverable JSON of the expected shape
    Parse(ParseError),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MissingCredential(provider) => {
                write!(f, "no API key configured for provider '{}'", provider)
            }
            GatewayError::Transport(e) => write!(f, "request failed: {}", e),
            GatewayError::Status { status, body } => {
                write!(f, "API request failed with status {}: {}", status, body)
            }
            GatewayError::Attachment(e) => write!(f, "failed to encode image attachment: {}", e),
            GatewayError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for GatewayError {
    fn from(e: ParseError) -> Self {
        GatewayError::Parse(e)
    }
}

/// Pipeline step that was running when generation aborted
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Planning,
    Part { index: usize, name: String },
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Planning => write!(f, "planning"),
            Stage::Part { index, name } => write!(f, "part {} ({})", index, name),
            Stage::Finalizing => write!(f, "finalizing"),
        }
    }
}

/// Abort of one entity's generation pipeline. Never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Gateway call failed during a step
    Gateway { stage: Stage, source: GatewayError },
    /// Plan came back with fewer parts than a character needs
    PlanTooShort { parts: usize, minimum: usize },
    /// Plan is missing a mandatory facial part
    MissingRequiredPart(&'static str),
    /// Part generation requested before a plan exists
    NotPlanned,
    /// Part generation requested after the last part
    PlanExhausted,
    /// Finalize requested before every part was generated
    Incomplete { remaining: usize },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Gateway { stage, source } => {
                write!(f, "generation aborted while {}: {}", stage, source)
            }
            PipelineError::PlanTooShort { parts, minimum } => {
                write!(f, "plan has {} part(s), expected at least {}", parts, minimum)
            }
            PipelineError::MissingRequiredPart(part) => {
                write!(f, "plan is missing the required '{}' part", part)
            }
            PipelineError::NotPlanned => write!(f, "no plan yet, call plan first"),
            PipelineError::PlanExhausted => write!(f, "no more parts to generate"),
            PipelineError::Incomplete { remaining } => {
                write!(f, "cannot finalize with {} part(s) still pending", remaining)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors from equipping or unequipping items
#[derive(Debug, Clone, PartialEq)]
pub enum EquipError {
    /// Character has no metadata yet (never saved), so it has no slots
    NoSlots,
    UnknownSlot(String),
    SlotOccupied { slot: String, item: String },
    SlotEmpty(String),
    NoPreviousVersion,
    /// Every transform proposal failed
    NoCandidates,
    Gateway(GatewayError),
}

impl fmt::Display for EquipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipError::NoSlots => write!(f, "character has no equipment slots"),
            EquipError::UnknownSlot(slot) => write!(f, "unknown equipment slot '{}'", slot),
            EquipError::SlotOccupied { slot, item } => {
                write!(f, "slot '{}' already holds '{}'", slot, item)
            }
            EquipError::SlotEmpty(slot) => write!(f, "slot '{}' is empty", slot),
            EquipError::NoPreviousVersion => write!(f, "no previous version found to revert to"),
            EquipError::NoCandidates => write!(f, "failed to generate any combined image"),
            EquipError::Gateway(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EquipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EquipError::Gateway(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GatewayError> for EquipError {
    fn from(e: GatewayError) -> Self {
        EquipError::Gateway(e)
    }
}
