//! # Engine Error Types
//!
//! Central error taxonomy for resource creation and shader compilation.
//! Expected failures (missing files, full caches) are recoverable and reported
//! through [`EngineError`]; the two link-failure variants are fatal because no
//! further fallback exists once the embedded shader sources are in play.

use thiserror::Error;

use crate::gfx::backend::ShaderStage;

/// Process exit status for a program link failure.
pub const EXIT_LINK_FAILURE: i32 = 101;

/// Process exit status for a compile failure of the embedded fallback source.
pub const EXIT_FALLBACK_COMPILE_FAILURE: i32 = 102;

/// Errors produced by resource creation and shader compilation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A fixed-capacity resource store (texture cache, light list, model list)
    /// is full. The store is left untouched.
    #[error("resource limit exceeded: {resource} is capped at {limit} entries")]
    ResourceLimit {
        /// Human-readable name of the store that refused the entry.
        resource: &'static str,
        /// The hard cap that was hit.
        limit: usize,
    },

    /// An asset, texture, or shader file could not be read or decoded.
    #[error("resource not found: {path}: {reason}")]
    ResourceNotFound {
        /// Path of the file that could not be loaded.
        path: String,
        /// Underlying loader/decoder message.
        reason: String,
    },

    /// A shader stage failed to compile from its on-disk source. Recoverable:
    /// the loader retries the stage with the embedded fallback source.
    #[error("{stage:?} shader failed to compile: {log}")]
    CompileFailure {
        /// Stage that failed.
        stage: ShaderStage,
        /// Compiler output.
        log: String,
    },

    /// The embedded fallback source itself failed to compile. Fatal: there is
    /// no second fallback.
    #[error("embedded fallback {stage:?} shader failed to compile: {log}")]
    FallbackCompileFailure {
        /// Stage that failed.
        stage: ShaderStage,
        /// Compiler output.
        log: String,
    },

    /// Program linking failed. Linking is attempted exactly once, after any
    /// per-stage fallback substitution, so this is fatal.
    #[error("shader program failed to link: {log}")]
    LinkFailure {
        /// Linker output.
        log: String,
    },
}

impl EngineError {
    /// Exit status for the fatal variants; `None` for recoverable errors.
    ///
    /// The library never terminates the process itself. Binaries that own
    /// `main` are expected to map a fatal error to this status.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            EngineError::LinkFailure { .. } => Some(EXIT_LINK_FAILURE),
            EngineError::FallbackCompileFailure { .. } => Some(EXIT_FALLBACK_COMPILE_FAILURE),
            _ => None,
        }
    }

    /// True when no fallback path remains for this error.
    pub fn is_fatal(&self) -> bool {
        self.exit_code().is_some()
    }
}
