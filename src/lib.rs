//! Purpose: Library crate behind the `cypherset` CLI and integration tests.
//! Exports: `api` (result views, mappers, errors) as the only public path.
//! Role: Lazy materialization layer between a raw tabular query response and callers.
//! Invariants: Core modules stay private; `api` re-exports the stable surface.
//! Invariants: Nothing here performs I/O; transport and query execution live elsewhere.
pub mod api;
mod core;
mod json;
