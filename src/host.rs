//! Script-host ABI
//!
//! The core is language-agnostic: it exports callback seams and a
//! ~40-function API surface (see [`crate::vm::Vm`]); a language binding
//! (Lua, JS, Wren, ...) implements [`ScriptHost`] to compile and run
//! user code against a [`Vm`](crate::vm::Vm). Per the design notes,
//! this is modeled as a trait with one method per callback rather than
//! a raw function-pointer table, since we're in a safe language.

use crate::vm::Vm;

/// Static metadata + syntax-highlighting data a language binding
/// supplies once, independent of any running cartridge.
#[derive(Clone, Debug)]
pub struct ScriptConfig {
    pub name: &'static str,
    pub file_extension: &'static str,
    pub project_comment: &'static str,
    pub line_comment: &'static str,
    pub block_comment: Option<(&'static str, &'static str)>,
    pub string_delimiters: &'static [char],
    pub keywords: &'static [&'static str],
}

/// One top-level definition's location, for editor outline views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub source_offset: usize,
    pub length: usize,
}

/// A compiled, running instance of a cartridge's code in some
/// language. The scheduler owns one of these and drives it once per
/// tick; it never inspects the interpreter's internals.
pub trait ScriptHost {
    /// Compile and evaluate `code`, typically registering the
    /// cartridge's global functions (`TIC`, `SCN`, `OVR`, `BDR`, ...).
    fn init(&mut self, vm: &mut Vm, code: &str);

    /// Tear down the interpreter. Called once, before the host is
    /// dropped or replaced by a fresh cartridge load.
    fn close(&mut self, vm: &mut Vm);

    /// Invoke the user's `TIC()` entry point for one frame.
    fn tick(&mut self, vm: &mut Vm);

    /// Run a REPL fragment against the already-initialized interpreter
    /// state, returning its printed result (or an error message).
    fn eval(&mut self, vm: &mut Vm, code: &str) -> Result<String, String>;

    /// List top-level definitions in `code`, for the editor's outline
    /// panel.
    fn get_outline(&self, code: &str) -> Vec<OutlineEntry>;

    /// Poll whether the host wants to abort the in-flight `tick()`
    /// call. The scheduler checks this cooperatively; timeouts are a
    /// host concern, not the core's.
    fn force_exit_requested(&self) -> bool {
        false
    }
}

/// Raster callbacks invoked by the compositor mid-frame, giving user
/// code a chance at palette/scroll raster effects (spec §3.2, "Scanline
/// / overline callbacks").
pub trait RasterCallbacks {
    /// Called after each framebuffer row is composited, with the row
    /// number just drawn.
    fn scanline(&mut self, vm: &mut Vm, row: i32);

    /// Called once after the full frame has been composited.
    fn overline(&mut self, vm: &mut Vm);

    /// Called once per row while drawing the border area outside the
    /// visible screen rect, if the host renders a border.
    fn border(&mut self, vm: &mut Vm, row: i32);
}

/// The single error-reporting channel out of the core: resource-bounds
/// violations never panic or return `Result`, they clamp/no-op and,
/// where the spec calls for visibility, forward a message here instead.
pub trait ErrorSink {
    fn error(&mut self, message: &str, color: u8);
}

/// An `ErrorSink` that drops every message, for headless/batch runs
/// that don't want console output (e.g. the CLI binary's default).
pub struct NullErrorSink;

impl ErrorSink for NullErrorSink {
    fn error(&mut self, _message: &str, _color: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_any_message_without_panicking() {
        let mut sink = NullErrorSink;
        sink.error("boom", 2);
    }
}
