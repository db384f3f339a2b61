use mongodb::bson::{oid::ObjectId, Binary};
use serde::{Deserialize, Serialize};

/// Patient feedback entry (stored in MongoDB).
///
/// `status` is a string flag: "1" = visible, "2" = pending. New entries
/// always start visible.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Feedback {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub title: String,
    pub feedback: String,
    pub image: Binary,
    pub status: String,
}

pub const FEEDBACK_STATUS_VISIBLE: &str = "1";
pub const FEEDBACK_STATUS_PENDING: &str = "2";
