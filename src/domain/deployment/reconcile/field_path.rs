use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::deployment::error::DraftError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFieldPath {
    Segments(Vec<PathSegment>),
    Dotted(String),
}

/// Address of a field inside a draft, e.g.
/// `["targets", 0, "config", "runners", "iris_clf", "hpa_conf", "max_replicas"]`
/// or the dotted form `targets.0.config.hpa_conf.max_replicas`.
///
/// A numeric segment indexes an array, or names a member when the node it
/// applies to is an object (a runner called `2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldPath")]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, DraftError> {
        if segments.is_empty() {
            return Err(DraftError::InvalidPath("empty path".into()));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn root_key(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    /// Target index when the path points into `targets.<i>`.
    pub fn target_index(&self) -> Option<usize> {
        match self.0.as_slice() {
            [PathSegment::Key(k), PathSegment::Index(i), ..] if k == "targets" => Some(*i),
            _ => None,
        }
    }

    /// Node addressed by this path, if `root` has one.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        lookup(&self.0, root)
    }

    /// Node holding the addressed field, if `root` has one.
    pub fn parent<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let (_, parents) = self.0.split_last()?;
        lookup(parents, root)
    }

    /// Overwrite the addressed node of `root` with `value`.
    ///
    /// Missing or null object members along the way are created as empty
    /// objects, so a runner that has no entry yet can be addressed directly.
    /// Array indices must already exist.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), DraftError> {
        let (last, parents) = self
            .0
            .split_last()
            .ok_or_else(|| DraftError::InvalidPath("empty path".into()))?;

        let mut node = root;
        for segment in parents {
            node = self.child_mut(node, segment)?;
        }

        if node.is_null() && matches!(last, PathSegment::Key(_)) {
            *node = Value::Object(Map::new());
        }
        match (last, node) {
            (PathSegment::Key(key), Value::Object(map)) => {
                map.insert(key.clone(), value);
            }
            (PathSegment::Index(i), Value::Object(map)) => {
                map.insert(i.to_string(), value);
            }
            (PathSegment::Index(i), Value::Array(items)) => {
                let slot = items.get_mut(*i).ok_or_else(|| self.invalid())?;
                *slot = value;
            }
            _ => return Err(self.invalid()),
        }
        Ok(())
    }

    fn child_mut<'a>(
        &self,
        node: &'a mut Value,
        segment: &PathSegment,
    ) -> Result<&'a mut Value, DraftError> {
        if node.is_null() {
            *node = Value::Object(Map::new());
        }
        match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => {
                Ok(map.entry(key.clone()).or_insert(Value::Null))
            }
            (PathSegment::Index(i), Value::Object(map)) => {
                Ok(map.entry(i.to_string()).or_insert(Value::Null))
            }
            (PathSegment::Index(i), Value::Array(items)) => {
                items.get_mut(*i).ok_or_else(|| self.invalid())
            }
            _ => Err(self.invalid()),
        }
    }

    fn invalid(&self) -> DraftError {
        DraftError::InvalidPath(self.to_string())
    }
}

fn lookup<'a>(segments: &[PathSegment], root: &'a Value) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key),
            (PathSegment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        })
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    return Err(DraftError::InvalidPath(s.to_string()));
                }
                Ok(match part.parse::<usize>() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(part.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }
}

impl TryFrom<RawFieldPath> for FieldPath {
    type Error = DraftError;

    fn try_from(raw: RawFieldPath) -> Result<Self, Self::Error> {
        match raw {
            RawFieldPath::Segments(segments) => Self::new(segments),
            RawFieldPath::Dotted(s) => s.parse(),
        }
    }
}
