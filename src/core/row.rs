// One result tuple, indexable by position or column name, materialized lazily.
use crate::core::error::Error;
use crate::core::key::{Key, position_in};
use crate::core::mapper::EntityMapper;
use crate::core::value::{Cell, Mapped, RawValue};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::{debug, trace};

/// Read-only view over one raw tuple.
///
/// Each cell is converted through the entity mapper on first successful
/// access and cached for the life of the row; later accesses return the same
/// reference. A mapper that returns a record produces a nested `Row` over that
/// record's keys and values.
///
/// Nested rows carry no mapper: their values already came out of one, so
/// their cells are only classified by shape (records nest again).
pub struct Row<M: EntityMapper> {
    columns: Arc<[String]>,
    raw: Arc<[RawValue]>,
    mapper: Option<Arc<M>>,
    cells: Box<[OnceCell<Cell<M>>]>,
}

impl<M: EntityMapper> Row<M> {
    pub(crate) fn new(columns: Arc<[String]>, raw: Arc<[RawValue]>, mapper: Arc<M>) -> Self {
        Self::build(columns, raw, Some(mapper))
    }

    fn nested(record: Map<String, Value>) -> Self {
        let (columns, raw): (Vec<String>, Vec<RawValue>) = record.into_iter().unzip();
        Self::build(columns.into(), raw.into(), None)
    }

    fn build(columns: Arc<[String]>, raw: Arc<[RawValue]>, mapper: Option<Arc<M>>) -> Self {
        debug_assert_eq!(columns.len(), raw.len());
        let cells = raw.iter().map(|_| OnceCell::new()).collect();
        Self {
            columns,
            raw,
            mapper,
            cells,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn raw(&self) -> &[RawValue] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// True for rows built from a record-shaped mapper result.
    pub fn is_nested(&self) -> bool {
        self.mapper.is_none()
    }

    /// Positions are valid when in range. Names are valid when they resolve
    /// and the value under them is not null.
    pub fn has<'k>(&self, key: impl Into<Key<'k>>) -> bool {
        match key.into() {
            Key::Position(position) => position_in(position, self.raw.len()).is_some(),
            key @ Key::Name(_) => key
                .resolve(&self.columns)
                .and_then(|offset| self.raw.get(offset))
                .is_some_and(|value| !value.is_null()),
        }
    }

    pub fn get<'k>(&self, key: impl Into<Key<'k>>) -> Result<&Cell<M>, Error> {
        let key = key.into();
        let offset = key
            .resolve(&self.columns)
            .ok_or_else(|| key.unresolved(self.raw.len()))?;
        self.cell_at(offset)
    }

    /// Always fails: rows are read-only.
    pub fn set<'k>(&self, _key: impl Into<Key<'k>>, _value: RawValue) -> Result<(), Error> {
        Err(Error::immutable("result row"))
    }

    /// Always fails: rows are read-only.
    pub fn remove<'k>(&self, _key: impl Into<Key<'k>>) -> Result<(), Error> {
        Err(Error::immutable("result row"))
    }

    pub fn iter(&self) -> Cells<'_, M> {
        Cells {
            row: self,
            front: 0,
            back: self.raw.len(),
        }
    }

    fn cell_at(&self, offset: usize) -> Result<&Cell<M>, Error> {
        let slot = &self.cells[offset];
        if let Some(cell) = slot.get() {
            return Ok(cell);
        }
        let cell = self.materialize(offset)?;
        Ok(slot.get_or_init(|| cell))
    }

    fn materialize(&self, offset: usize) -> Result<Cell<M>, Error> {
        let raw = &self.raw[offset];
        let mapped = match &self.mapper {
            Some(mapper) => mapper.map_from(raw).inspect_err(|err| {
                debug!(offset, column = %self.columns[offset], error = %err, "entity mapping failed");
            })?,
            None => Mapped::from_raw(raw),
        };
        trace!(
            offset,
            column = %self.columns[offset],
            nested = mapped.is_record(),
            "materialized cell"
        );
        Ok(match mapped {
            Mapped::Record(record) => Cell::Row(Row::nested(record)),
            other => Cell::Value(other),
        })
    }

    fn materialized(&self) -> usize {
        self.cells.iter().filter(|slot| slot.get().is_some()).count()
    }
}

impl<M> Row<M>
where
    M: EntityMapper,
    M::Entity: Serialize,
{
    /// Render every cell into a JSON object keyed by column. A repeated
    /// column name keeps its first value, matching name lookup.
    pub fn to_json(&self) -> Result<Value, Error> {
        let mut object = Map::new();
        for (offset, column) in self.columns.iter().enumerate() {
            if object.contains_key(column) {
                continue;
            }
            let value = self.cell_at(offset)?.to_json()?;
            object.insert(column.clone(), value);
        }
        Ok(Value::Object(object))
    }
}

impl<M: EntityMapper> fmt::Debug for Row<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("columns", &self.columns)
            .field("raw", &self.raw)
            .field("materialized", &self.materialized())
            .finish()
    }
}

impl<'a, M: EntityMapper> IntoIterator for &'a Row<M> {
    type Item = Result<(&'a str, &'a Cell<M>), Error>;
    type IntoIter = Cells<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(column, cell)` pairs of a [`Row`], in tuple order.
pub struct Cells<'a, M: EntityMapper> {
    row: &'a Row<M>,
    front: usize,
    back: usize,
}

impl<'a, M: EntityMapper> Cells<'a, M> {
    fn pair(&self, offset: usize) -> Result<(&'a str, &'a Cell<M>), Error> {
        let row = self.row;
        let cell = row.cell_at(offset)?;
        Ok((row.columns[offset].as_str(), cell))
    }
}

impl<'a, M: EntityMapper> Iterator for Cells<'a, M> {
    type Item = Result<(&'a str, &'a Cell<M>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let offset = self.front;
        self.front += 1;
        Some(self.pair(offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<M: EntityMapper> DoubleEndedIterator for Cells<'_, M> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.pair(self.back))
    }
}

impl<M: EntityMapper> ExactSizeIterator for Cells<'_, M> {}

impl<M: EntityMapper> FusedIterator for Cells<'_, M> {}

#[cfg(test)]
mod tests {
    use super::Row;
    use crate::core::error::{Error, ErrorKind};
    use crate::core::mapper::{EntityMapper, RawMapper};
    use crate::core::value::{Mapped, RawValue};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingMapper {
        calls: AtomicUsize,
    }

    impl CountingMapper {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EntityMapper for CountingMapper {
        type Entity = String;

        fn map_from(&self, raw: &RawValue) -> Result<Mapped<String>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match raw {
                Value::String(text) if text.starts_with("entity:") => {
                    Mapped::Entity(text["entity:".len()..].to_string())
                }
                other => Mapped::from_raw(other),
            })
        }
    }

    /// Fails the first `failures` calls, then classifies by shape.
    struct FlakyMapper {
        failures: AtomicUsize,
    }

    impl EntityMapper for FlakyMapper {
        type Entity = String;

        fn map_from(&self, raw: &RawValue) -> Result<Mapped<String>, Error> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(Error::new(ErrorKind::Mapping).with_message("lookup failed"));
            }
            Ok(Mapped::from_raw(raw))
        }
    }

    /// Swaps shapes: scalars become records and records become scalars.
    struct ShapeSwapMapper;

    impl EntityMapper for ShapeSwapMapper {
        type Entity = String;

        fn map_from(&self, raw: &RawValue) -> Result<Mapped<String>, Error> {
            Ok(match raw {
                Value::Object(map) => Mapped::Scalar(json!(map.len())),
                other => {
                    let mut record = serde_json::Map::new();
                    record.insert("wrapped".to_string(), other.clone());
                    Mapped::Record(record)
                }
            })
        }
    }

    fn row_with<M: EntityMapper>(columns: &[&str], raw: Vec<RawValue>, mapper: Arc<M>) -> Row<M> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        Row::new(columns.into(), raw.into(), mapper)
    }

    #[test]
    fn name_and_position_share_one_cell() {
        let mapper = Arc::new(CountingMapper::default());
        let row = row_with(&["a", "b"], vec![json!(10), json!(20)], mapper.clone());

        let by_name = row.get("a").expect("by name");
        let by_position = row.get(0).expect("by position");
        assert!(std::ptr::eq(by_name, by_position));
        assert!(std::ptr::eq(by_name, row.get("a").expect("again")));
        assert_eq!(by_name.as_scalar(), Some(&json!(10)));
        assert_eq!(mapper.calls(), 1);

        assert_eq!(row.get("b").expect("b").as_scalar(), Some(&json!(20)));
        assert_eq!(mapper.calls(), 2);
    }

    #[test]
    fn entities_come_from_the_mapper() {
        let mapper = Arc::new(CountingMapper::default());
        let row = row_with(&["n"], vec![json!("entity:alice")], mapper);
        let cell = row.get("n").expect("cell");
        assert_eq!(cell.as_entity().map(String::as_str), Some("alice"));
    }

    #[test]
    fn has_checks_bounds_and_defined_values() {
        let row = row_with(
            &["a", "b"],
            vec![json!(1), Value::Null],
            Arc::new(RawMapper),
        );
        assert!(row.has(0));
        assert!(row.has(1));
        assert!(!row.has(2));
        assert!(!row.has(-1));
        assert!(row.has("a"));
        assert!(!row.has("b"));
        assert!(!row.has("missing"));
    }

    #[test]
    fn unresolved_keys_fail_by_kind() {
        let row = row_with(&["a"], vec![json!(1)], Arc::new(RawMapper));
        assert_eq!(row.get("missing").unwrap_err().kind(), ErrorKind::KeyNotFound);
        assert_eq!(row.get(1).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(row.get(-1).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn duplicate_names_resolve_to_first_column() {
        let row = row_with(&["a", "a"], vec![json!(1), json!(2)], Arc::new(RawMapper));
        assert_eq!(row.get("a").expect("a").as_scalar(), Some(&json!(1)));
        assert_eq!(row.get(1).expect("second").as_scalar(), Some(&json!(2)));
    }

    #[test]
    fn mapping_failure_is_not_cached() {
        let mapper = Arc::new(FlakyMapper {
            failures: AtomicUsize::new(1),
        });
        let row = row_with(&["a", "b"], vec![json!(1), json!(2)], mapper);

        let err = row.get("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        assert_eq!(err.message(), Some("lookup failed"));

        assert_eq!(row.get("b").expect("b").as_scalar(), Some(&json!(2)));
        let retried = row.get("a").expect("retry");
        assert_eq!(retried.as_scalar(), Some(&json!(1)));
        assert!(std::ptr::eq(retried, row.get(0).expect("cached")));
    }

    #[test]
    fn record_output_becomes_nested_row() {
        let mapper = Arc::new(CountingMapper::default());
        let row = row_with(&["r"], vec![json!({"x": 1, "y": 2})], mapper.clone());

        let nested = row.get("r").expect("cell").as_row().expect("nested row");
        assert!(nested.is_nested());
        assert_eq!(nested.columns(), ["x", "y"]);

        let pairs: Vec<(String, Value)> = nested
            .iter()
            .map(|item| {
                let (column, cell) = item.expect("cell");
                (column.to_string(), cell.as_scalar().cloned().expect("scalar"))
            })
            .collect();
        assert_eq!(
            pairs,
            vec![("x".to_string(), json!(1)), ("y".to_string(), json!(2))]
        );
        assert_eq!(mapper.calls(), 1);
    }

    #[test]
    fn deeper_records_nest_recursively() {
        let row = row_with(
            &["r"],
            vec![json!({"outer": {"inner": true}})],
            Arc::new(RawMapper),
        );
        let outer = row.get(0).expect("r").as_row().expect("row");
        let inner = outer.get("outer").expect("outer").as_row().expect("row");
        assert_eq!(inner.get("inner").expect("inner").as_scalar(), Some(&json!(true)));
    }

    #[test]
    fn wrapping_follows_mapper_output_shape() {
        let row = row_with(
            &["s", "r"],
            vec![json!(5), json!({"a": 1, "b": 2})],
            Arc::new(ShapeSwapMapper),
        );

        let from_scalar = row.get("s").expect("s").as_row().expect("wrapped");
        assert_eq!(from_scalar.columns(), ["wrapped"]);
        assert_eq!(from_scalar.get(0).expect("inner").as_scalar(), Some(&json!(5)));

        let from_record = row.get("r").expect("r");
        assert!(from_record.as_row().is_none());
        assert_eq!(from_record.as_scalar(), Some(&json!(2)));
    }

    #[test]
    fn mutation_is_rejected_and_state_unchanged() {
        let row = row_with(&["a"], vec![json!(1)], Arc::new(RawMapper));
        assert_eq!(row.remove(0).unwrap_err().kind(), ErrorKind::ImmutableResult);
        assert_eq!(
            row.set("a", json!(2)).unwrap_err().kind(),
            ErrorKind::ImmutableResult
        );
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a").expect("a").as_scalar(), Some(&json!(1)));
    }

    #[test]
    fn iterations_are_independent_and_restartable() {
        let row = row_with(
            &["a", "b", "c"],
            vec![json!(1), json!(2), json!(3)],
            Arc::new(RawMapper),
        );

        let mut first = row.iter();
        let mut second = row.iter();
        assert_eq!(first.next().expect("a").expect("ok").0, "a");
        assert_eq!(first.next().expect("b").expect("ok").0, "b");
        assert_eq!(second.next().expect("a").expect("ok").0, "a");
        assert_eq!(first.len(), 1);

        let columns: Vec<&str> = (&row)
            .into_iter()
            .map(|item| item.expect("ok").0)
            .collect();
        assert_eq!(columns, ["a", "b", "c"]);

        let reversed: Vec<&str> = row.iter().rev().map(|item| item.expect("ok").0).collect();
        assert_eq!(reversed, ["c", "b", "a"]);
    }

    #[test]
    fn json_keeps_first_of_duplicate_columns() {
        let row = row_with(
            &["a", "b", "a"],
            vec![json!(1), json!({"k": [1, 2]}), json!(3)],
            Arc::new(RawMapper),
        );
        assert_eq!(
            row.to_json().expect("json"),
            json!({"a": 1, "b": {"k": [1, 2]}})
        );
    }

    #[test]
    fn debug_reports_materialized_cells() {
        let row = row_with(&["a", "b"], vec![json!(1), json!(2)], Arc::new(RawMapper));
        row.get(1).expect("b");
        let text = format!("{row:?}");
        assert!(text.contains("materialized: 1"));
    }
}
