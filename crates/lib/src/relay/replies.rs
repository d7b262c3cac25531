//! Fixed reply texts. These are user-facing contract strings; change them only
//! together with the deployed bot copy.

/// First-contact menu, sent when the body mentions both "hi" and "query".
pub const GREETING: &str = "🏠 Welcome to Dharavi Redevelopment Project Information Bot!

I can help you with:
• Project overview and timeline
• Eligibility criteria
• Benefits and features
• Documentation requirements
• Support and grievances

Please ask me any question about the Dharavi Redevelopment Project. You can also send documents or images for secure storage.";

/// Sent when the message has no body and no attachment.
pub const EMPTY_PROMPT: &str =
    "Hello! Please send me a text message or share a document about the Dharavi Redevelopment Project.";

/// Attachment fetched and stored.
pub const MEDIA_STORED: &str =
    "✅ Your file has been received and securely stored. Thank you for sharing!";

/// Attachment fetched but the blob store rejected the upload.
pub const MEDIA_STORE_FAILED: &str =
    "❌ Sorry, there was an error storing your file. Please try again.";

/// The media URL returned a non-success status.
pub const MEDIA_DOWNLOAD_FAILED: &str =
    "❌ Sorry, I couldn't download your file. Please try again.";

/// Transport-level failure while handling the attachment.
pub const MEDIA_PROCESSING_FAILED: &str = "❌ Sorry, there was an error processing your file.";

/// Inference collaborator failed; sent instead of a generated answer.
pub const INFERENCE_UNAVAILABLE: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again later.";

/// Catch-all when webhook handling itself fails.
pub const WEBHOOK_FAILED: &str =
    "Sorry, there was an error processing your message. Please try again.";
