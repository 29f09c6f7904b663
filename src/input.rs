//! Message input parsing.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::view::Message;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a list of messages or an object with a \"messages\" list, got {0}")]
    Shape(&'static str),
}

/// Parse a JSON array of messages, or an object with a `messages` array.
pub fn parse_messages(input: &str) -> Result<Vec<Message>, InputError> {
    let value: Value = serde_json::from_str(input)?;
    let messages = match value {
        list @ Value::Array(_) => serde_json::from_value::<Vec<Message>>(list)?,
        Value::Object(mut envelope) => match envelope.remove("messages") {
            Some(list) => serde_json::from_value::<Vec<Message>>(list)?,
            None => return Err(InputError::Shape("an object without \"messages\"")),
        },
        Value::Null => return Err(InputError::Shape("null")),
        Value::Bool(_) => return Err(InputError::Shape("a boolean")),
        Value::Number(_) => return Err(InputError::Shape("a number")),
        Value::String(_) => return Err(InputError::Shape("a string")),
    };
    debug!(
        component = "input",
        operation = "parse_messages",
        message_count = messages.len(),
        "Parsed messages"
    );
    Ok(messages)
}
