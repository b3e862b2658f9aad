use notestore_core::config::EngineKind;
use notestore_core::format::OutputFormat;

/// Parse output format from string
pub fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Parse engine backend from string
pub fn parse_engine(s: &str) -> Result<EngineKind, String> {
    s.parse::<EngineKind>().map_err(|e| e.to_string())
}
