use failchain::{BoxedError, ChainErrorKind};
use failure::Fail;
use std::result::Result as StdResult;

pub type Error = BoxedError<ErrorKind>;
pub type Result<T> = StdResult<T, Error>;

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "Could not load `{}`: {}", level, what)]
    Load { level: String, what: &'static str },

    #[fail(display = "Mesh generation failed for `{}`.", 0)]
    MeshGeneration(String),

    #[fail(display = "Renderer rejected {}: {}", what, message)]
    Renderer { what: &'static str, message: String },

    #[fail(display = "Level `{}` drawn before it was uploaded.", 0)]
    NotUploaded(String),
}

impl ChainErrorKind for ErrorKind {
    type Error = Error;
}

impl ErrorKind {
    pub fn is_load(&self) -> bool {
        matches!(self, ErrorKind::Load { .. })
    }

    pub fn is_not_uploaded(&self) -> bool {
        matches!(self, ErrorKind::NotUploaded(_))
    }

    /// Helper for `Renderer` implementations.
    pub fn renderer(what: &'static str, message: impl Into<String>) -> Self {
        ErrorKind::Renderer {
            what,
            message: message.into(),
        }
    }

    pub(crate) fn load(level: &str, what: &'static str) -> Self {
        ErrorKind::Load {
            level: level.to_owned(),
            what,
        }
    }

    pub(crate) fn mesh_generation(level: &str) -> Self {
        ErrorKind::MeshGeneration(level.to_owned())
    }

    pub(crate) fn not_uploaded(level: &str) -> Self {
        ErrorKind::NotUploaded(level.to_owned())
    }
}
