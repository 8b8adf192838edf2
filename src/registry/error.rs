//! Template compilation and rendering errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template source `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template `{name}`")]
    Parse {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to render template `{name}`")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("render data must serialize to an object")]
    Context(#[source] tera::Error),

    #[error("unknown template `{0}`")]
    UnknownTemplate(String),
}

impl TemplateError {
    pub(crate) fn parse(name: &str) -> impl FnOnce(tera::Error) -> Self + '_ {
        move |source| Self::Parse {
            name: name.to_owned(),
            source,
        }
    }
}
