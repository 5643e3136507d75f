/// Errors raised while building, configuring, or drawing the particle field.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("quad size must be positive, got {0}")]
    InvalidQuadSize(f32),

    #[error("instance count must not be negative, got {0}")]
    NegativeInstanceCount(i64),

    #[error("instance count {0} exceeds the 32-bit index range")]
    TooManyInstances(i64),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    #[error("unknown uniform `{0}`")]
    InvalidUniformKey(String),

    #[error("uniform `{key}` expects a {expected} value")]
    UniformType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("surface error: {0}")]
    Surface(String),
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        FieldError::Config(e.to_string())
    }
}

/// Which half of a shader program a compile diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldError>;
