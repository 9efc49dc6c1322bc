use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("unknown node kind `{kind}` at {path}")]
    UnknownNodeKind { kind: String, path: String },
    #[error("`{kind}` node is not allowed at {path}")]
    UnexpectedNode { kind: String, path: String },
    #[error("invalid date value `{value}` at {path}")]
    InvalidDate { value: String, path: String },
    #[error("export error: {0}")]
    Export(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io(_) => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::UnknownNodeKind { .. } => "UNKNOWN_NODE_KIND",
            Self::UnexpectedNode { .. } => "UNEXPECTED_NODE",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::Export(_) => "EXPORT_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Export(format!("docx package: {value}"))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Export(format!("docx xml: {value}"))
    }
}

impl From<lopdf::Error> for AppError {
    fn from(value: lopdf::Error) -> Self {
        Self::Export(format!("pdf: {value}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;
