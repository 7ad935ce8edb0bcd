// Lazily materialized, read-only view over every tuple of a query result.
use crate::core::error::{Error, ErrorKind};
use crate::core::key::{Key, position_in};
use crate::core::mapper::EntityMapper;
use crate::core::raw::RawResult;
use crate::core::row::Row;
use crate::core::value::RawValue;
use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::{debug, trace};

/// What you get back from a query: an ordered, counted sequence of [`Row`]s.
///
/// Rows are built on first access and cached; no cell is converted until a
/// row field is read.
pub struct ResultSet<M: EntityMapper> {
    columns: Arc<[String]>,
    data: Box<[Arc<[RawValue]>]>,
    mapper: Arc<M>,
    rows: Box<[OnceCell<Row<M>>]>,
}

impl<M: EntityMapper> ResultSet<M> {
    pub fn new(raw: RawResult, mapper: M) -> Self {
        Self::with_shared_mapper(raw, Arc::new(mapper))
    }

    pub fn with_shared_mapper(raw: RawResult, mapper: Arc<M>) -> Self {
        let (columns, data) = raw.into_parts();
        debug!(columns = columns.len(), rows = data.len(), "result set created");
        let data: Box<[Arc<[RawValue]>]> = data.into_iter().map(Arc::from).collect();
        let rows = data.iter().map(|_| OnceCell::new()).collect();
        Self {
            columns: columns.into(),
            data,
            mapper,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn has<'k>(&self, index: impl Into<Key<'k>>) -> bool {
        match index.into() {
            Key::Position(position) => position_in(position, self.data.len()).is_some(),
            Key::Name(_) => false,
        }
    }

    pub fn get<'k>(&self, index: impl Into<Key<'k>>) -> Result<&Row<M>, Error> {
        let offset = match index.into() {
            Key::Position(position) => position_in(position, self.data.len()).ok_or_else(|| {
                Error::new(ErrorKind::OutOfRange)
                    .with_message(format!("row index must be in [0, {})", self.data.len()))
                    .with_index(position)
            })?,
            Key::Name(name) => {
                return Err(Error::new(ErrorKind::KeyNotFound)
                    .with_message("result rows are addressed by position")
                    .with_column(name)
                    .with_hint("Read the column from a row instead."));
            }
        };
        Ok(self.row_at(offset))
    }

    /// Always fails: query results are read-only.
    pub fn set<'k>(&self, _index: impl Into<Key<'k>>, _row: Vec<RawValue>) -> Result<(), Error> {
        Err(Error::immutable("query result"))
    }

    /// Always fails: query results are read-only.
    pub fn remove<'k>(&self, _index: impl Into<Key<'k>>) -> Result<(), Error> {
        Err(Error::immutable("query result"))
    }

    pub fn iter(&self) -> Rows<'_, M> {
        Rows {
            set: self,
            front: 0,
            back: self.data.len(),
        }
    }

    fn row_at(&self, offset: usize) -> &Row<M> {
        self.rows[offset].get_or_init(|| {
            trace!(offset, "materialized row");
            Row::new(
                Arc::clone(&self.columns),
                Arc::clone(&self.data[offset]),
                Arc::clone(&self.mapper),
            )
        })
    }
}

impl<M> ResultSet<M>
where
    M: EntityMapper,
    M::Entity: Serialize,
{
    /// Render every row as a JSON object, in index order.
    pub fn to_json(&self) -> Result<Value, Error> {
        self.iter()
            .map(Row::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<M: EntityMapper> fmt::Debug for ResultSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let materialized = self.rows.iter().filter(|slot| slot.get().is_some()).count();
        f.debug_struct("ResultSet")
            .field("columns", &self.columns)
            .field("rows", &self.data.len())
            .field("materialized", &materialized)
            .finish()
    }
}

impl<'a, M: EntityMapper> IntoIterator for &'a ResultSet<M> {
    type Item = &'a Row<M>;
    type IntoIter = Rows<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of a [`ResultSet`], in index order.
pub struct Rows<'a, M: EntityMapper> {
    set: &'a ResultSet<M>,
    front: usize,
    back: usize,
}

impl<'a, M: EntityMapper> Iterator for Rows<'a, M> {
    type Item = &'a Row<M>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let set = self.set;
        let row = set.row_at(self.front);
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<M: EntityMapper> DoubleEndedIterator for Rows<'_, M> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        let set = self.set;
        Some(set.row_at(self.back))
    }
}

impl<M: EntityMapper> ExactSizeIterator for Rows<'_, M> {}

impl<M: EntityMapper> FusedIterator for Rows<'_, M> {}
