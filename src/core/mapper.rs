// The one capability consumed from the entity mapper, plus a passthrough mapper.
use crate::core::error::Error;
use crate::core::value::{Mapped, RawValue};
use serde::{Serialize, Serializer};

/// Converts one raw cell into a domain entity or a reduced raw shape.
///
/// Results are memoized per cell, so implementations should be pure
/// functions of their input. Errors are handed back to the caller of
/// `Row::get` unchanged and are not cached.
pub trait EntityMapper {
    type Entity;

    fn map_from(&self, raw: &RawValue) -> Result<Mapped<Self::Entity>, Error>;
}

/// Entity type for mappers that never produce entities.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoEntity {}

impl Serialize for NoEntity {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        match *self {}
    }
}

/// Classifies raw values by shape and never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawMapper;

impl EntityMapper for RawMapper {
    type Entity = NoEntity;

    fn map_from(&self, raw: &RawValue) -> Result<Mapped<NoEntity>, Error> {
        Ok(Mapped::from_raw(raw))
    }
}
