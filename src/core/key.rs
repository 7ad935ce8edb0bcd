// Lookup keys for rows and result sets: a position or a column name.
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key<'a> {
    Position(i64),
    Name(&'a str),
}

impl Key<'_> {
    /// Resolve against `columns` to a canonical offset. Names resolve to the
    /// first matching column.
    pub(crate) fn resolve(&self, columns: &[String]) -> Option<usize> {
        match *self {
            Key::Position(position) => position_in(position, columns.len()),
            Key::Name(name) => columns.iter().position(|column| column == name),
        }
    }

    pub(crate) fn unresolved(&self, len: usize) -> Error {
        match *self {
            Key::Position(position) => Error::new(ErrorKind::OutOfRange)
                .with_message(format!("position must be in [0, {len})"))
                .with_index(position),
            Key::Name(name) => Error::new(ErrorKind::KeyNotFound)
                .with_message("no column with that name")
                .with_column(name),
        }
    }
}

pub(crate) fn position_in(position: i64, len: usize) -> Option<usize> {
    usize::try_from(position).ok().filter(|offset| *offset < len)
}

impl From<i64> for Key<'_> {
    fn from(position: i64) -> Self {
        Key::Position(position)
    }
}

impl From<i32> for Key<'_> {
    fn from(position: i32) -> Self {
        Key::Position(i64::from(position))
    }
}

impl From<usize> for Key<'_> {
    fn from(position: usize) -> Self {
        // Anything past i64::MAX is out of range for every row anyway.
        Key::Position(i64::try_from(position).unwrap_or(i64::MAX))
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(name: &'a String) -> Self {
        Key::Name(name.as_str())
    }
}
