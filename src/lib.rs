//! **packsplit** - Build per-package distributions from one marker-annotated PHP tree
//!
//! Package-specific code is tagged with guard calls (`if ( __is( 'pro' ) ) { ... }`)
//! and `__isPro` name infixes; each package's build keeps its own code, unwraps
//! its guards and drops everything belonging to the others.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Token-level stripping of package-specific PHP code
pub mod strip {
    /// Token, TokenKind and the lossless TokenStream
    pub mod token;
    pub use token::{Token, TokenKind, TokenStream};

    /// logos-based PHP lexer (HTML / PHP mode switch)
    pub mod lexer;
    pub use lexer::tokenize;

    /// Guard calls and name-embedded markers
    pub mod marker;
    pub use marker::{MarkerOccurrence, MarkerShape, Recognizer, Role, guard_infix};

    /// Marker → deletion ranges via bounded token scans
    pub mod span;
    pub use span::{DeletionRange, resolve};

    /// Keep-mask application and infix scrub
    pub mod editor;

    /// Recognize → resolve → edit for one build target
    pub mod pipeline;
    pub use pipeline::{StripOutcome, Stripper};
}

/// Build pipeline - package trees, path rules, single-file stripping
pub mod core {
    /// Package build driver with rayon fan-out and per-package reports
    pub mod build;
    pub use build::{BuildError, BuildReport, PackageReport, build, run as build_run};

    /// Path membership and renaming per package
    pub mod membership;
    pub use membership::PackageLayout;

    /// Strip one file from the command line
    pub mod strip_file;
    pub use strip_file::run as strip_file_run;
}

/// Infrastructure - Configuration, I/O, walking and logging
pub mod infra {
    /// Layered configuration (file + env) and `init`
    pub mod config;
    pub use config::{Config, PackageDeclaration, init as config_init, load_config};

    /// Memory-mapped file I/O for large files (>1MB threshold)
    pub mod io;
    pub use io::{FileContent, read_file_smart};

    /// Source-tree walking with exact and glob excludes
    pub mod walk;
    pub use walk::{FileWalker, WalkEntry};

    /// tracing subscriber setup
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{build_run, strip_file_run};
pub use infra::{Config, FileWalker, load_config};

// Core types for external consumers
pub use crate::core::{BuildError, BuildReport, PackageReport};
pub use strip::{StripOutcome, Stripper};
