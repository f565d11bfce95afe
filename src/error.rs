use thiserror::Error;

#[derive(Debug, Error)]
pub enum LandingError {
    #[error("could not create <{0}> element")]
    CreateElement(String),
    #[error("missing element `{0}`")]
    MissingElement(&'static str),
    #[error("invalid landing options: {0}")]
    Options(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Program,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Program => "program",
        }
    }
}

/// Rejections of a lead before it is submitted. The message is shown to the
/// visitor as is.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LeadError {
    #[error("Please fill in all fields.")]
    MissingField(Field),
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("lead submission failed: {0}")]
    Rejected(String),
}
