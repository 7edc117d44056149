use serde::Deserialize;

/// A message pulled out of a webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone number without the leading `+`
    pub from: String,

    /// Trimmed text body; `None` for images, audio, stickers and the like
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delivery {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    from: Option<String>,

    #[serde(default, rename = "type")]
    kind: Option<String>,

    #[serde(default)]
    text: Option<TextBody>,
}

#[derive(Debug, Default, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: String,
}

/// Extract the first message of a WhatsApp Cloud API webhook payload.
///
/// Status callbacks, deliveries without a sender and empty text bodies yield
/// `None`. Only the first message of the first change is considered.
pub fn extract_message(payload: &serde_json::Value) -> Option<InboundMessage> {
    let delivery = Delivery::deserialize(payload).ok()?;
    let message = delivery
        .entry
        .into_iter()
        .next()?
        .changes
        .into_iter()
        .next()?
        .value
        .messages
        .into_iter()
        .next()?;

    let from = message.from.filter(|f| !f.is_empty())?;

    if message.kind.as_deref().unwrap_or("text") != "text" {
        return Some(InboundMessage { from, text: None });
    }

    let text = message.text.map(|t| t.body).unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(InboundMessage {
        from,
        text: Some(text.to_string()),
    })
}

/// Phone numbers allowed to send commands
#[derive(Debug, Clone, Default)]
pub struct SenderAllowlist {
    numbers: Vec<String>,
}

impl SenderAllowlist {
    pub fn new(numbers: &[String]) -> Self {
        Self {
            numbers: numbers.iter().map(|n| n.trim().to_string()).collect(),
        }
    }

    /// An empty list allows everyone. Entries match with or without `+`.
    pub fn is_allowed(&self, phone: &str) -> bool {
        if self.numbers.is_empty() {
            return true;
        }
        let plus = format!("+{}", phone);
        self.numbers.iter().any(|n| *n == phone || *n == plus)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn delivery(message: serde_json::Value) -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": { "messaging_product": "whatsapp", "messages": [message] }
                }]
            }]
        })
    }

    #[test]
    fn test_extract_text_message() {
        let payload = delivery(json!({
            "from": "59891234567",
            "type": "text",
            "text": { "body": "  prendé la luz del living  " }
        }));

        assert_eq!(
            extract_message(&payload),
            Some(InboundMessage {
                from: "59891234567".to_string(),
                text: Some("prendé la luz del living".to_string()),
            })
        );
    }

    #[test]
    fn test_missing_type_defaults_to_text() {
        let payload = delivery(json!({ "from": "1", "text": { "body": "hola" } }));
        assert_eq!(extract_message(&payload).unwrap().text.as_deref(), Some("hola"));
    }

    #[test]
    fn test_non_text_message_has_no_text() {
        let payload = delivery(json!({ "from": "59891234567", "type": "audio", "audio": {} }));
        assert_eq!(
            extract_message(&payload),
            Some(InboundMessage {
                from: "59891234567".to_string(),
                text: None,
            })
        );
    }

    #[test]
    fn test_ignored_payloads() {
        let cases = [
            json!({}),
            json!({ "entry": [] }),
            json!({ "entry": [{ "changes": [] }] }),
            json!({ "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "read" }] } }] }] }),
            delivery(json!({ "type": "text", "text": { "body": "sin remitente" } })),
            delivery(json!({ "from": "1", "type": "text", "text": { "body": "   " } })),
            json!({ "entry": "not a list" }),
            json!([1, 2, 3]),
        ];
        for payload in cases {
            assert_eq!(extract_message(&payload), None, "{}", payload);
        }
    }

    #[test]
    fn test_empty_allowlist_allows_everyone() {
        assert!(SenderAllowlist::new(&[]).is_allowed("59891234567"));
    }

    #[test]
    fn test_allowlist_matches_with_and_without_plus() {
        let allowlist =
            SenderAllowlist::new(&["+59891234567".to_string(), "5491155550000".to_string()]);
        assert!(allowlist.is_allowed("59891234567"));
        assert!(allowlist.is_allowed("5491155550000"));
        assert!(!allowlist.is_allowed("59899999999"));
    }
}
