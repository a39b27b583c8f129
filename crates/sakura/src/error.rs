//! CLI error types with miette diagnostics.
//!
//! Maps panel and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use sakura_api::Error as ApiError;
use sakura_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const REJECTED: i32 = 4;
    pub const HTTP: i32 = 5;
    pub const MALFORMED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Panel ────────────────────────────────────────────────────────
    #[error("Could not reach the panel at {path}")]
    #[diagnostic(
        code(sakura::connection_failed),
        help("Check api_host and that the panel is reachable from this node.")
    )]
    ConnectionFailed {
        path: String,
        #[source]
        source: ApiError,
    },

    #[error("Panel answered {path} with HTTP {status}")]
    #[diagnostic(code(sakura::http_error), help("Response body: {body}"))]
    Http {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Panel returned a response that is not JSON for {path}")]
    #[diagnostic(
        code(sakura::malformed_response),
        help("Is api_host pointing at the panel and not a proxy or login page?\nBody: {body}")
    )]
    MalformedResponse { path: String, body: String },

    #[error("Panel rejected {path}: {message}")]
    #[diagnostic(
        code(sakura::rejected),
        help("Verify the panel key and that node {node_id} exists on the panel.")
    )]
    Rejected {
        path: String,
        message: String,
        node_id: i64,
    },

    #[error(transparent)]
    #[diagnostic(code(sakura::api))]
    Api(ApiError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("No configuration found")]
    #[diagnostic(
        code(sakura::no_config),
        help(
            "Create {path} with a [profiles.default] section, or pass\n\
             --api-host, --key and --node-id."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(sakura::config))]
    Config(#[from] ConfigError),

    #[error("invalid {field}: {reason}")]
    #[diagnostic(code(sakura::validation))]
    Validation { field: String, reason: String },

    // ── Input / output ───────────────────────────────────────────────
    #[error("Could not read {path}")]
    #[diagnostic(code(sakura::input))]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}")]
    #[diagnostic(code(sakura::input_json))]
    InputJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(sakura::output))]
    Output(String),
}

impl CliError {
    /// Convert a panel error, naming the node for rejections.
    pub fn from_api(err: ApiError, node_id: i64) -> Self {
        match err {
            ApiError::Http {
                path, status, body, ..
            } => Self::Http { path, status, body },
            ApiError::MalformedBody { path, body, .. } => Self::MalformedResponse { path, body },
            ApiError::Application { path, message, .. } => Self::Rejected {
                path,
                message,
                node_id,
            },
            err @ ApiError::Transport { .. } => Self::ConnectionFailed {
                path: err.path().unwrap_or_default().to_owned(),
                source: err,
            },
            other => Self::Api(other),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Http { .. } => exit_code::HTTP,
            Self::MalformedResponse { .. } => exit_code::MALFORMED,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::NoConfig { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Validation { .. } | Self::Input { .. } | Self::InputJson { .. } => {
                exit_code::USAGE
            }
            Self::Api(_) | Self::Output(_) => exit_code::GENERAL,
        }
    }
}
