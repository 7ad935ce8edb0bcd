//! Purpose: Internal JSON decoding boundary for response payloads.
//! Exports: `parse` module with decode and error-categorization helpers.
//! Role: Single seam for parser usage so callsites avoid ad hoc decode logic.
//! Invariants: Payload decoding goes through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
