// Shape classification for raw and mapped values, and the materialized cell type.
use crate::core::error::{Error, ErrorKind};
use crate::core::mapper::EntityMapper;
use crate::core::row::Row;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One raw cell as delivered by the query layer.
pub type RawValue = Value;

/// Mapper output, classified by shape. Only `Record` is wrapped into a
/// nested [`Row`] when materialized.
#[derive(Clone, Debug, PartialEq)]
pub enum Mapped<E> {
    Scalar(Value),
    Sequence(Vec<Value>),
    Record(Map<String, Value>),
    Entity(E),
}

impl<E> Mapped<E> {
    /// Classify a raw value as-is; never produces an entity.
    pub fn from_raw(raw: &RawValue) -> Self {
        match raw {
            Value::Array(items) => Mapped::Sequence(items.clone()),
            Value::Object(map) => Mapped::Record(map.clone()),
            other => Mapped::Scalar(other.clone()),
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Mapped::Record(_))
    }
}

impl<E: Serialize> Mapped<E> {
    pub fn to_json(&self) -> Result<Value, Error> {
        match self {
            Mapped::Scalar(value) => Ok(value.clone()),
            Mapped::Sequence(items) => Ok(Value::Array(items.clone())),
            Mapped::Record(map) => Ok(Value::Object(map.clone())),
            Mapped::Entity(entity) => serde_json::to_value(entity).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to render entity as json")
                    .with_source(err)
            }),
        }
    }
}

/// A materialized cell: the mapper's output, or a nested row when that
/// output was record-shaped.
pub enum Cell<M: EntityMapper> {
    Value(Mapped<M::Entity>),
    Row(Row<M>),
}

impl<M: EntityMapper> Cell<M> {
    pub fn as_row(&self) -> Option<&Row<M>> {
        match self {
            Cell::Row(row) => Some(row),
            Cell::Value(_) => None,
        }
    }

    pub fn as_mapped(&self) -> Option<&Mapped<M::Entity>> {
        match self {
            Cell::Value(mapped) => Some(mapped),
            Cell::Row(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Cell::Value(Mapped::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&M::Entity> {
        match self {
            Cell::Value(Mapped::Entity(entity)) => Some(entity),
            _ => None,
        }
    }
}

impl<M> Cell<M>
where
    M: EntityMapper,
    M::Entity: Serialize,
{
    /// Render to JSON, materializing nested rows as needed.
    pub fn to_json(&self) -> Result<Value, Error> {
        match self {
            Cell::Value(mapped) => mapped.to_json(),
            Cell::Row(row) => row.to_json(),
        }
    }
}

impl<M> fmt::Debug for Cell<M>
where
    M: EntityMapper,
    M::Entity: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Value(mapped) => f.debug_tuple("Value").field(mapped).finish(),
            Cell::Row(row) => f.debug_tuple("Row").field(row).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Mapped;
    use crate::core::mapper::NoEntity;
    use serde_json::json;

    #[test]
    fn raw_values_classify_by_shape() {
        assert_eq!(
            Mapped::<NoEntity>::from_raw(&json!(1)),
            Mapped::Scalar(json!(1))
        );
        assert_eq!(
            Mapped::<NoEntity>::from_raw(&json!(null)),
            Mapped::Scalar(json!(null))
        );
        assert_eq!(
            Mapped::<NoEntity>::from_raw(&json!([1, "a"])),
            Mapped::Sequence(vec![json!(1), json!("a")])
        );
        assert!(Mapped::<NoEntity>::from_raw(&json!({"x": 1})).is_record());
    }

    #[test]
    fn record_keeps_key_order() {
        let raw = json!({"z": 1, "a": 2, "m": 3});
        let Mapped::<NoEntity>::Record(map) = Mapped::from_raw(&raw) else {
            panic!("expected record");
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn entity_renders_through_serde() {
        let mapped: Mapped<Vec<u8>> = Mapped::Entity(vec![1, 2]);
        assert_eq!(mapped.to_json().expect("json"), json!([1, 2]));
    }
}
