//! Tracks metadata for one compilation session.

use codemap::Span;

use crate::error::Trace;
use crate::log;

/// A non-fatal diagnostic produced during compilation.
///
/// `@warn` and deprecation messages end up here; they are reported to the
/// logger as they occur and accumulated so the caller can inspect them
/// alongside the compiled CSS.
#[derive(Debug, Clone)]
pub struct Warning {
    pub message: String,
    pub span: Option<Span>,
    pub traces: Vec<Trace>,
}

/// Metadata for a compilation session.
///
/// When the calling program first uses one of the API entry points there is
/// no context yet where the compiler's code may start to track things.  This
/// struct provides that context.
pub struct Session {
    log_enabled: bool,
    warnings: Vec<Warning>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            log_enabled: log::log_enabled(),
            warnings: Vec::new(),
        }
    }

    pub fn log_enabled(&self) -> bool {
        self.log_enabled
    }

    pub fn warn(&mut self, warning: Warning) {
        rsass_log!("WARNING: {}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
