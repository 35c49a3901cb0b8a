//! Build-up slide navigation for layered image documents.
//!
//! A document's top-level group layers named `#<label>#<title>` are the steps
//! of a diagram that is revealed incrementally; a text layer named `step`
//! holds the label currently on show. [`steps::advance`] and
//! [`steps::retreat`] move that marker and re-render which groups are
//! visible, which hint is shown and how each step is highlighted.
//!
//! The editor is reached only through the [`host::Host`] trait;
//! [`document::Document`] is an in-memory implementation of it.

pub mod logger;

pub mod actions;
pub mod cli;
pub mod document;
pub mod host;
pub mod io;
pub mod settings;
pub mod steps;

pub use document::Document;
pub use host::{Host, HostError, LayerId, LayerInfo, LayerKind};
pub use steps::{Direction, StepError};
