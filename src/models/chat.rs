use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a conversation. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    /// Accepts only objects carrying a known string `role` and a string `content`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let role = match value.get("role")?.as_str()? {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => {
                return None;
            }
        };
        let content = value.get("content")?.as_str()?;
        Some(Self { role, content: content.to_string() })
    }
}

/// Keeps the well-formed entries of `values` in order and drops the rest.
pub fn retain_valid_messages(values: &[JsonValue]) -> Vec<Message> {
    values.iter().filter_map(Message::from_json).collect()
}

/// All-or-nothing variant: `None` unless `value` is an array of well-formed messages.
pub fn parse_message_list(value: &JsonValue) -> Option<Vec<Message>> {
    value.as_array()?.iter().map(Message::from_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_uses_lowercase_wire_names() {
        let json = serde_json::to_value(Message::assistant("Tercatat.")).unwrap();
        assert_eq!(json, json!({ "role": "assistant", "content": "Tercatat." }));
    }

    #[test]
    fn malformed_entries_are_dropped_without_touching_siblings() {
        let values = vec![
            json!({ "role": "user", "content": "hi" }),
            json!({ "role": "user" }),
            json!({ "content": "orphan" }),
            json!({ "role": 7, "content": "numeric role" }),
            json!({ "role": "system", "content": "unknown role" }),
            json!("not an object"),
            json!({ "role": "assistant", "content": "halo", "extra": true }),
        ];

        let kept = retain_valid_messages(&values);

        assert_eq!(kept, vec![Message::user("hi"), Message::assistant("halo")]);
    }

    #[test]
    fn message_list_parse_rejects_any_bad_entry() {
        let good = json!([{ "role": "user", "content": "a" }, { "role": "assistant", "content": "b" }]);
        let bad = json!([{ "role": "user", "content": "a" }, { "role": "assistant" }]);

        assert_eq!(parse_message_list(&good).map(|m| m.len()), Some(2));
        assert_eq!(parse_message_list(&bad), None);
        assert_eq!(parse_message_list(&json!({ "role": "user" })), None);
        assert_eq!(parse_message_list(&json!([])), Some(vec![]));
    }
}
