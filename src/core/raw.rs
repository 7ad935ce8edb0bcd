// Tabular query payload: ordered column names plus row-major raw tuples.
use crate::core::error::{Error, ErrorKind};
use crate::core::value::RawValue;
use crate::json::parse;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResult {
    columns: Vec<String>,
    data: Vec<Vec<RawValue>>,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    columns: Vec<String>,
    data: Option<Vec<Vec<RawValue>>>,
}

impl RawResult {
    /// Every tuple must have exactly one value per column.
    pub fn new(columns: Vec<String>, data: Vec<Vec<RawValue>>) -> Result<Self, Error> {
        for (index, tuple) in data.iter().enumerate() {
            if tuple.len() != columns.len() {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!(
                        "row has {} values but result has {} columns",
                        tuple.len(),
                        columns.len()
                    ))
                    .with_index(index as i64));
            }
        }
        Ok(Self { columns, data })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a response body. A body without `data` is an empty result.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        let body: ResponseBody = serde_json::from_value(value).map_err(|err| {
            let hint = parse::hint_for_error(&err, "response body");
            Error::new(ErrorKind::Corrupt)
                .with_message("malformed query response")
                .with_hint(hint)
                .with_source(err)
        })?;
        Self::from_body(body)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let body: ResponseBody = parse::from_slice(bytes).map_err(|err| {
            let hint = parse::hint_for_error(&err, "response body");
            Error::new(ErrorKind::Corrupt)
                .with_message("malformed query response")
                .with_hint(hint)
                .with_source(err)
        })?;
        Self::from_body(body)
    }

    fn from_body(body: ResponseBody) -> Result<Self, Error> {
        match body.data {
            Some(data) => Self::new(body.columns, data),
            None => Ok(Self::empty()),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &[Vec<RawValue>] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<RawValue>>) {
        (self.columns, self.data)
    }
}

impl FromStr for RawResult {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        Self::from_slice(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::RawResult;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn arity_mismatch_is_rejected() {
        let err = RawResult::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![json!(1), json!(2)], vec![json!(3)]],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn body_without_data_is_empty() {
        let raw = RawResult::from_json(json!({"columns": ["n"]})).expect("decode");
        assert!(raw.is_empty());
        assert!(raw.columns().is_empty());
    }

    #[test]
    fn body_decodes_columns_and_rows() {
        let raw = r#"{"columns":["n","r"],"data":[[1,{"x":2}]]}"#
            .parse::<RawResult>()
            .expect("decode");
        assert_eq!(raw.columns(), ["n", "r"]);
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.data()[0][1], json!({"x": 2}));
    }

    #[test]
    fn malformed_body_is_corrupt_with_hint() {
        let err = r#"{"columns":[1],"data":[]}"#
            .parse::<RawResult>()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(err.hint().is_some_and(|hint| hint.contains("parse category: shape")));

        let err = RawResult::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }
}
