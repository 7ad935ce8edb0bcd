//! Purpose: Define the stable public Rust API boundary for cypherset.
//! Exports: Result views, lookup keys, mapper trait + provided mappers, errors.
//! Role: Public, additive-only surface; hides internal core modules.
//! Invariants: This module is the only public path to core types.
//! Invariants: Views are read-only; every mutation entry point fails with `ImmutableResult`.

mod graph;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::key::Key;
pub use crate::core::mapper::{EntityMapper, NoEntity, RawMapper};
pub use crate::core::raw::RawResult;
pub use crate::core::result_set::{ResultSet, Rows};
pub use crate::core::row::{Cells, Row};
pub use crate::core::value::{Cell, Mapped, RawValue};
pub use graph::{GraphEntity, GraphEntityMapper, Node, Path, Relationship};
