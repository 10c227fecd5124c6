/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Every accepted `image` must start with this (a data URI carrying an image).
pub const IMAGE_PREFIX: &str = "data:image";

pub const STATUS_ERROR: &str = "error";

/// Body accepted on `/api/print` and forwarded as-is to the print server.
///
/// `to_text` is normally a boolean but is carried as raw JSON so that whatever
/// the caller sent reaches the print server untouched. Absent stays absent,
/// an explicit `null` is forwarded as `null`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PrintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        rename = "toText",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_text: Option<Value>,
}

// Only reached when the key exists, so `null` becomes `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PrintRequest {
    pub fn new(image: impl Into<String>, to_text: Option<bool>) -> Self {
        Self {
            image: Some(image.into()),
            to_text: to_text.map(Value::Bool),
        }
    }

    /// The image data URI, if present and carrying the image prefix.
    pub fn image_data_uri(&self) -> Option<&str> {
        self.image
            .as_deref()
            .filter(|s| s.starts_with(IMAGE_PREFIX))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
            detail,
        }
    }
}
