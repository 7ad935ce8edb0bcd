//! Purpose: Map Neo4j REST entity payloads found in result cells to typed entities.
//! Exports: `GraphEntityMapper`, `GraphEntity`, `Node`, `Relationship`, `Path`.
//! Role: Default `EntityMapper` used by the CLI and by callers of the REST endpoint.
//! Invariants: Entity detection looks only at the cell's own keys (`self`, `nodes`, `relationships`).
//! Invariants: Ids are the trailing URL segment; a non-numeric id is a mapping failure.
//! Invariants: Cells that are not entities pass through, classified by shape.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::core::mapper::EntityMapper;
use crate::core::value::{Mapped, RawValue};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: u64,
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Relationship {
    pub id: u64,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start: u64,
    pub end: u64,
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Path {
    pub start: u64,
    pub end: u64,
    pub nodes: Vec<u64>,
    pub relationships: Vec<u64>,
}

impl Path {
    /// Number of relationships traversed.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum GraphEntity {
    Node(Node),
    Relationship(Relationship),
    Path(Path),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GraphEntityMapper;

impl GraphEntityMapper {
    pub fn new() -> Self {
        Self
    }
}

impl EntityMapper for GraphEntityMapper {
    type Entity = GraphEntity;

    fn map_from(&self, raw: &RawValue) -> Result<Mapped<GraphEntity>, Error> {
        let Value::Object(map) = raw else {
            return Ok(Mapped::from_raw(raw));
        };

        if let Some(Value::String(url)) = map.get("self") {
            if url.contains("/relationship/") {
                return relationship_from(url, map).map(GraphEntity::Relationship).map(Mapped::Entity);
            }
            if url.contains("/node/") {
                return node_from(url, map).map(GraphEntity::Node).map(Mapped::Entity);
            }
        }
        if map.contains_key("nodes") && map.contains_key("relationships") {
            return path_from(map).map(GraphEntity::Path).map(Mapped::Entity);
        }

        Ok(Mapped::from_raw(raw))
    }
}

fn node_from(url: &str, map: &Map<String, Value>) -> Result<Node, Error> {
    Ok(Node {
        id: id_from_url(url)?,
        properties: properties(map)?,
    })
}

fn relationship_from(url: &str, map: &Map<String, Value>) -> Result<Relationship, Error> {
    let rel_type = match map.get("type") {
        Some(Value::String(rel_type)) => rel_type.clone(),
        _ => return Err(mapping_error("relationship has no type").with_column("type")),
    };
    Ok(Relationship {
        id: id_from_url(url)?,
        rel_type,
        start: id_field(map, "start")?,
        end: id_field(map, "end")?,
        properties: properties(map)?,
    })
}

fn path_from(map: &Map<String, Value>) -> Result<Path, Error> {
    Ok(Path {
        start: id_field(map, "start")?,
        end: id_field(map, "end")?,
        nodes: id_list(map, "nodes")?,
        relationships: id_list(map, "relationships")?,
    })
}

fn properties(map: &Map<String, Value>) -> Result<Map<String, Value>, Error> {
    match map.get("data") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(data)) => Ok(data.clone()),
        Some(_) => Err(mapping_error("entity data is not an object").with_column("data")),
    }
}

fn id_field(map: &Map<String, Value>, field: &str) -> Result<u64, Error> {
    match map.get(field) {
        Some(Value::String(url)) => id_from_url(url).map_err(|err| err.with_column(field)),
        _ => Err(mapping_error("missing entity url").with_column(field)),
    }
}

fn id_list(map: &Map<String, Value>, field: &str) -> Result<Vec<u64>, Error> {
    let Some(Value::Array(urls)) = map.get(field) else {
        return Err(mapping_error("expected a list of entity urls").with_column(field));
    };
    urls.iter()
        .map(|url| match url {
            Value::String(url) => id_from_url(url),
            _ => Err(mapping_error("expected an entity url")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.with_column(field))
}

fn id_from_url(url: &str) -> Result<u64, Error> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u64>().ok())
        .ok_or_else(|| mapping_error(format!("no numeric id in entity url {url:?}")))
}

fn mapping_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Mapping).with_message(message)
}
