//! KDL configuration parser

use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::*;

/// Convert a span from kdl's miette version into ours.
///
/// kdl 4 depends on an older miette, so the span is rebuilt from offset/len.
fn convert_span(offset: usize, len: usize) -> miette::SourceSpan {
    miette::SourceSpan::from((offset, len))
}

/// Span of the first value of a node, or of the node name if it has none
fn value_span(node: &kdl::KdlNode) -> miette::SourceSpan {
    match node.entries().first() {
        Some(entry) => convert_span(entry.span().offset(), entry.span().len()),
        None => convert_span(node.name().span().offset(), node.name().span().len()),
    }
}

fn invalid_value(node: &kdl::KdlNode, source: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        option: node.name().value().to_string(),
        message: message.into(),
        src: source.to_string(),
        span: value_span(node),
    }
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        let span = convert_span(e.span.offset(), e.span.len());
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node, content)?;
            }
            "keyboard" => {
                config.keyboard = parse_keyboard(node, content)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode, source: &str) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    let val = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_string())
                        .ok_or_else(|| invalid_value(child, source, "expected a string"))?;
                    global.log_level = val
                        .parse()
                        .map_err(|e: String| invalid_value(child, source, e))?;
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_keyboard(node: &kdl::KdlNode, source: &str) -> Result<KeyboardConfig, ConfigError> {
    let mut keyboard = KeyboardConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "auto-repeat" => {
                    keyboard.auto_repeat = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_bool())
                        .ok_or_else(|| invalid_value(child, source, "expected true or false"))?;
                }
                "repeat-delay" => {
                    keyboard.repeat_delay = parse_millis(child, source)?;
                }
                "repeat-interval" => {
                    let interval = parse_millis(child, source)?;
                    if interval.is_zero() {
                        return Err(invalid_value(
                            child,
                            source,
                            "repeat interval must be at least 1ms",
                        ));
                    }
                    keyboard.repeat_interval = interval;
                }
                "release-delay" => {
                    keyboard.release_delay = parse_millis(child, source)?;
                }
                name => {
                    tracing::warn!("Unknown keyboard config option: {}", name);
                }
            }
        }
    }

    Ok(keyboard)
}

/// Parse a node's first value as a non-negative number of milliseconds
fn parse_millis(node: &kdl::KdlNode, source: &str) -> Result<Duration, ConfigError> {
    let ms = node
        .entries()
        .first()
        .and_then(|e| e.value().as_i64())
        .ok_or_else(|| invalid_value(node, source, "expected an integer number of milliseconds"))?;

    let ms = u64::try_from(ms)
        .map_err(|_| invalid_value(node, source, format!("{}ms is negative", ms)))?;

    Ok(Duration::from_millis(ms))
}
