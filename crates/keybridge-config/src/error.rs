use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(keybridge::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid value for `{option}`: {message}")]
    #[diagnostic(code(keybridge::config::invalid_value))]
    InvalidValue {
        option: String,
        message: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
