use bytes::BytesMut;
use futures_util::StreamExt;
use serde_json::Value;

use crate::error::AssignmentError;
use crate::storage::ObjectBody;

/// Drains `body` into a buffer and parses it once the stream has ended.
/// A stream error discards whatever was buffered.
pub async fn read_document(key: &str, mut body: ObjectBody) -> Result<Value, AssignmentError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => buffer.extend_from_slice(&bytes),
            Err(source) => {
                return Err(AssignmentError::ObjectReadError {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    serde_json::from_slice(&buffer).map_err(|source| AssignmentError::MalformedPayload {
        key: key.to_string(),
        source,
    })
}

/// Pretty-printed with two-space indentation.
pub fn encode_document(key: &str, document: &Value) -> Result<Vec<u8>, AssignmentError> {
    serde_json::to_vec_pretty(document).map_err(|source| AssignmentError::MalformedPayload {
        key: key.to_string(),
        source,
    })
}
