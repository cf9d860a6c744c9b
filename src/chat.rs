//! Chat transcript
//!
//! A [`ChatSession`] owns the ordered transcript of one conversation and
//! forwards every user turn to the [`ResponseRouter`].

use crate::attachments::Attachment;
use crate::providers::GeneratedImage;
use crate::router::ResponseRouter;
use ulid::Ulid;

/// Opening message of every session
pub const GREETING: &str = "Hello! I'm your AI assistant. Here's what I can do:\n\n\
- Reminders: tell me things like \"remind me to call mom tomorrow at 3pm\"\n\
- Image generation: ask me to \"generate an image of a sunset\"\n\
- Memory: I remember our conversations and use them as context\n\
- File analysis: attach images or documents with /attach\n\n\
Type /help to see all commands. How can I help you today?";

/// Reply text used when a turn produced nothing
pub const EMPTY_REPLY: &str = "Sorry, I could not process that.";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The assistant
    Bot,
    /// The person chatting
    User,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier (ULID)
    pub id: String,
    /// Who wrote the message
    pub sender: Sender,
    /// Message text
    pub text: String,
    /// Generated image attached to a bot reply
    pub image: Option<GeneratedImage>,
    /// Names of files attached to a user message
    pub files: Vec<String>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            sender,
            text: text.into(),
            image: None,
            files: Vec::new(),
        }
    }

    /// The generated image as a `data:` URL
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(GeneratedImage::data_url)
    }
}

/// One conversation with the assistant
pub struct ChatSession {
    router: ResponseRouter,
    transcript: Vec<Message>,
}

impl ChatSession {
    /// Start a session; the transcript opens with the greeting
    pub fn new(router: ResponseRouter) -> Self {
        Self {
            router,
            transcript: vec![Message::new(Sender::Bot, GREETING)],
        }
    }

    /// Messages so far, oldest first
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// The router answering this session
    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    /// Send one user turn and return the bot's reply
    ///
    /// Blank text without attachments is ignored and returns `None`.
    pub async fn send(&mut self, text: &str, attachments: Vec<Attachment>) -> Option<&Message> {
        if text.trim().is_empty() && attachments.is_empty() {
            return None;
        }

        let mut user = Message::new(Sender::User, text);
        user.files = attachments.iter().map(|a| a.name.clone()).collect();
        self.transcript.push(user);

        let reply = self.router.respond(text, &attachments).await;
        let mut bot = Message::new(
            Sender::Bot,
            if reply.text.trim().is_empty() {
                EMPTY_REPLY.to_string()
            } else {
                reply.text
            },
        );
        bot.image = reply.image;
        self.transcript.push(bot);

        self.transcript.last()
    }
}
