//! Flat output record matching the destination schema.

use serde::{Deserialize, Serialize};

/// One flattened post, shaped exactly like the destination table.
///
/// Serialized field names are the destination column names, so a serialized
/// record is directly loadable by the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "postId")]
    pub post_id: String,
    pub user: String,
    pub message: String,
    pub lat: f64,
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_destination_column_names() {
        let record = PostRecord {
            post_id: "post-42".into(),
            user: "alice".into(),
            message: "hello world".into(),
            lat: 37.77,
            lon: -122.41,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["postId"], "post-42");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["message"], "hello world");
        assert_eq!(json["lat"], 37.77);
        assert_eq!(json["lon"], -122.41);
    }

    #[test]
    fn serde_roundtrip() {
        let record = PostRecord {
            post_id: "p".into(),
            user: "u".into(),
            message: String::new(),
            lat: 0.0,
            lon: -0.5,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: PostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
