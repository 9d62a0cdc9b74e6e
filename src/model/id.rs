use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque entity identifier.
///
/// The backend hands out numeric ids, but nothing here depends on that: ids
/// are compared as text. Ids in canonical integer form are written back as
/// JSON numbers so request bodies match what the backend sent; anything else
/// (`"007"`, `"+5"`, `"-0"`) goes back as the exact string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Id(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id(value.to_string())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            UInt(u64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Id(n.to_string()),
            Raw::UInt(n) => Id(n.to_string()),
            Raw::Str(s) => Id(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_strings_deserialize_to_same_id() {
        let a: Id = serde_json::from_str("42").unwrap();
        let b: Id = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "42");
    }

    #[test]
    fn numeric_ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&Id::from("7")).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Id::from("U1")).unwrap(), "\"U1\"");
    }

    #[test]
    fn non_canonical_numeric_ids_keep_their_text() {
        for raw in ["007", "+5", "-0", " 3"] {
            let id = Id::from(raw);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, serde_json::to_string(raw).unwrap());
            let back: Id = serde_json::from_str(&json).unwrap();
            assert_eq!(back, id);
        }
        assert_eq!(serde_json::to_string(&Id::from("-12")).unwrap(), "-12");
    }

    #[test]
    fn reply_parent_id_is_sent_unchanged() {
        use crate::model::comment::NewComment;

        let parent: Id = serde_json::from_str("\"007\"").unwrap();
        let body = NewComment {
            content: "x".into(),
            author_id: Id::from("U1"),
            parent_comment_id: Some(parent),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"content":"x","authorId":"U1","parentCommentId":"007"}"#
        );
    }
}
