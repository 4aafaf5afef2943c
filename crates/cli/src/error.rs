//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: pipeline error (cancelled run, empty playlist)
//! - 11: I/O error (reading tracks, writing the sorted playlist)
//! - 12: input error (bad config file, bad flag value, bad color)
//! - 13: serialization error

use hueify_core::ColorError;
use hueify_pipeline::PipelineError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// A pipeline-level error (cancelled run, empty playlist).
    Pipeline(PipelineError),
    /// An I/O error (track file, playlist output).
    Io(String),
    /// A user input error (bad config, bad flag value).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::TrackSource(msg) | PipelineError::PlaylistSink(msg) => CliError::Io(msg),
            PipelineError::Config(inner) => CliError::Input(inner.to_string()),
            other => CliError::Pipeline(other),
        }
    }
}

impl From<ColorError> for CliError {
    fn from(e: ColorError) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_exit_code_is_10() {
        let err = CliError::from(PipelineError::EmptyPlaylist);
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn io_error_exit_code_is_11() {
        let err = CliError::Io("write failed".into());
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn input_error_exit_code_is_12() {
        let err = CliError::Input("bad flag".into());
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn serialization_error_exit_code_is_13() {
        let err = CliError::Serialization("json fail".into());
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn source_and_sink_errors_route_to_io() {
        let source = CliError::from(PipelineError::TrackSource("tracks.json: not found".into()));
        assert_eq!(source.exit_code(), 11);
        assert!(source.to_string().contains("tracks.json"));

        let sink = CliError::from(PipelineError::PlaylistSink("disk full".into()));
        assert_eq!(sink.exit_code(), 11);
    }

    #[test]
    fn config_errors_route_to_input() {
        let err = CliError::from(PipelineError::Config(ColorError::InvalidConfig(
            "batch_size must be at least 1".into(),
        )));
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("batch_size"));

        let color = CliError::from(ColorError::InvalidColor("zz".into()));
        assert_eq!(color.exit_code(), 12);
    }

    #[test]
    fn cancelled_stays_pipeline_error() {
        let err = CliError::from(PipelineError::Cancelled {
            processed: 5,
            total: 9,
        });
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("5 of 9"));
    }

    #[test]
    fn from_serde_json_error_routes_to_serialization() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{invalid");
        let cli_err = CliError::from(bad_json.unwrap_err());
        assert_eq!(cli_err.exit_code(), 13);
    }
}
