//! Inbound message from the transport webhook, normalized from form fields.

use std::collections::HashMap;

/// A normalized inbound message. Extraction is total: missing or empty form
/// fields become empty/absent values, never an error.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub body: String,
    pub attachment_url: Option<String>,
    pub attachment_content_type: Option<String>,
}

impl InboundMessage {
    /// Build from the transport's form payload (`From`, `Body`, `MediaUrl0`,
    /// `MediaContentType0`). No validation of number format or URL shape.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |name: &str| form.get(name).cloned().unwrap_or_default();
        let optional = |name: &str| {
            form.get(name)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            sender_id: field("From"),
            body: field("Body"),
            attachment_url: optional("MediaUrl0"),
            attachment_content_type: optional("MediaContentType0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_fields_default() {
        let msg = InboundMessage::from_form(&HashMap::new());
        assert_eq!(msg.sender_id, "");
        assert_eq!(msg.body, "");
        assert!(msg.attachment_url.is_none());
        assert!(msg.attachment_content_type.is_none());
    }

    #[test]
    fn empty_media_url_is_absent() {
        let msg = InboundMessage::from_form(&form(&[
            ("From", "whatsapp:+911234567890"),
            ("Body", "hello"),
            ("MediaUrl0", ""),
        ]));
        assert_eq!(msg.sender_id, "whatsapp:+911234567890");
        assert_eq!(msg.body, "hello");
        assert!(msg.attachment_url.is_none());
    }

    #[test]
    fn attachment_fields_pass_through() {
        let msg = InboundMessage::from_form(&form(&[
            ("From", "whatsapp:+911234567890"),
            ("MediaUrl0", "https://api.twilio.com/media/ME123"),
            ("MediaContentType0", "image/jpeg"),
        ]));
        assert_eq!(
            msg.attachment_url.as_deref(),
            Some("https://api.twilio.com/media/ME123")
        );
        assert_eq!(msg.attachment_content_type.as_deref(), Some("image/jpeg"));
    }
}
