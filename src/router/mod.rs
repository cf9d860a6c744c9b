//! Response routing
//!
//! The [`ResponseRouter`] turns one user turn (text plus optional
//! attachments) into a reply. Classification happens once per turn; every
//! remote failure is absorbed here and rendered as a fixed message, so
//! callers always receive a [`BotReply`].

pub mod intent;

pub use intent::{image_subject, Intent, IntentClassifier};

use crate::attachments::{partition, Attachment};
use crate::config::Config;
use crate::error::Result;
use crate::memory::{ScoredMemory, VectorStore};
use crate::providers::{
    create_providers, GeneratedImage, GenerationRequest, ImageModel, ImageRequest, LanguageModel,
    ProviderSet,
};
use crate::reminders::{
    Notifier, ReminderBook, ReminderExtractor, ReminderRequest, ReminderScheduler,
    TerminalNotifier,
};
use crate::storage::Storage;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;

/// Reply when text generation fails
pub const TEXT_APOLOGY: &str = "Sorry, I couldn't generate a response.";

/// Reply when image generation fails
pub const IMAGE_APOLOGY: &str = "Error generating the image. Please try again later.";

/// Reply when a reminder cannot be saved
pub const REMINDER_APOLOGY: &str = "Sorry, I couldn't save that reminder.";

/// Terms the image model is asked to avoid
pub const NEGATIVE_PROMPT: &str = "blurry, ugly, deformed, pixelated, low quality, garbled";

const IMAGE_PROMPT_PREFIX: &str = "A high-quality, detailed image of ";
const IMAGE_STEPS: u32 = 30;
const IMAGE_GUIDANCE: f32 = 7.5;

/// The assistant's answer to one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    /// Reply text
    pub text: String,
    /// Generated image, if any
    pub image: Option<GeneratedImage>,
}

impl BotReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// Orchestrates classification, remote models, memory and reminders
pub struct ResponseRouter {
    language: Arc<dyn LanguageModel>,
    images: Arc<dyn ImageModel>,
    classifier: IntentClassifier,
    memory: VectorStore,
    reminders: ReminderBook,
    scheduler: Arc<ReminderScheduler>,
    context_limit: usize,
}

impl ResponseRouter {
    /// Assemble a router from its parts
    pub fn new(
        providers: ProviderSet,
        storage: Storage,
        config: &Config,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let reminders = ReminderBook::new(storage.clone());
        let scheduler = Arc::new(ReminderScheduler::new(
            reminders.clone(),
            notifier,
            Duration::from_secs(config.reminders.poll_interval_seconds),
        ));
        let memory = VectorStore::new(storage, providers.embeddings, &config.memory);
        let classifier =
            IntentClassifier::new(ReminderExtractor::new(Arc::clone(&providers.language)));

        Self {
            language: providers.language,
            images: providers.images,
            classifier,
            memory,
            reminders,
            scheduler,
            context_limit: config.memory.context_limit,
        }
    }

    /// Build a router with remote providers, on-disk storage and terminal
    /// notifications
    ///
    /// # Errors
    ///
    /// Returns error if a provider client or the storage cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = create_providers(&config.providers)?;
        let storage = Storage::from_config(&config.storage)?;
        let notifier = Arc::new(TerminalNotifier::new(config.reminders.audible));
        Ok(Self::new(providers, storage, config, notifier))
    }

    /// Conversation memory
    pub fn memory(&self) -> &VectorStore {
        &self.memory
    }

    /// Reminder log
    pub fn reminders(&self) -> &ReminderBook {
        &self.reminders
    }

    /// Reminder scheduler
    pub fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    /// Produce the reply to one user turn
    pub async fn respond(&self, utterance: &str, attachments: &[Attachment]) -> BotReply {
        let intent = self
            .classifier
            .classify(utterance, !attachments.is_empty())
            .await;
        tracing::debug!(intent = intent_name(&intent), "Classified message");

        match intent {
            Intent::Reminder(request) => self.schedule_reminder(request),
            Intent::Image { subject } => self.generate_image(&subject).await,
            Intent::Files => self.analyze_files(utterance, attachments).await,
            Intent::Chat => self.chat(utterance).await,
        }
    }

    /// Stop background work started by this router
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }

    fn schedule_reminder(&self, request: ReminderRequest) -> BotReply {
        let reminder = match self.reminders.schedule(&request.task, request.datetime, None) {
            Ok(reminder) => reminder,
            Err(e) => {
                tracing::error!("Failed to save reminder: {:#}", e);
                return BotReply::text(REMINDER_APOLOGY);
            }
        };

        if self.scheduler.start() {
            tracing::debug!("Started reminder scheduler on first reminder");
        }

        BotReply::text(format!(
            "Reminder set!\n\nTask: {}\nTime: {}\n\nI'll notify you when it's time!",
            reminder.task,
            reminder
                .datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        ))
    }

    async fn generate_image(&self, subject: &str) -> BotReply {
        let request = ImageRequest {
            inputs: format!("{}{}", IMAGE_PROMPT_PREFIX, subject),
            negative_prompt: NEGATIVE_PROMPT.to_string(),
            num_inference_steps: IMAGE_STEPS,
            guidance_scale: IMAGE_GUIDANCE,
        };

        match self.images.generate_image(&request).await {
            Ok(image) => BotReply {
                text: format!("Here's what I imagined for \"{}\":", subject),
                image: Some(image),
            },
            Err(e) => {
                tracing::error!("Image generation failed: {:#}", e);
                BotReply::text(IMAGE_APOLOGY)
            }
        }
    }

    async fn analyze_files(&self, utterance: &str, attachments: &[Attachment]) -> BotReply {
        let (images, texts) = partition(attachments);
        let contents: Vec<String> = texts.iter().map(|a| a.text()).collect();
        let parts = images.iter().map(|a| a.to_inline_part()).collect();

        let request = GenerationRequest::text(build_file_prompt(utterance, &contents))
            .with_parts(parts);
        tracing::debug!(
            images = images.len(),
            texts = texts.len(),
            "Sending attachments to language model"
        );

        match self.language.generate(&request).await {
            Ok(text) => {
                self.remember(utterance, &text).await;
                BotReply::text(text)
            }
            Err(e) => {
                tracing::error!("File processing failed: {:#}", e);
                BotReply::text(format!("Error processing files: {}", e))
            }
        }
    }

    async fn chat(&self, utterance: &str) -> BotReply {
        let context = self.memory.query(utterance, self.context_limit).await;
        tracing::debug!(matches = context.len(), "Retrieved conversation context");

        let request = GenerationRequest::text(build_context_prompt(utterance, &context));
        let text = match self.language.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Text generation failed: {:#}", e);
                TEXT_APOLOGY.to_string()
            }
        };

        self.remember(utterance, &text).await;
        BotReply::text(text)
    }

    async fn remember(&self, utterance: &str, reply: &str) {
        if let Err(e) = self.memory.add(utterance, reply).await {
            tracing::error!("Failed to store conversation memory: {:#}", e);
        }
    }
}

fn intent_name(intent: &Intent) -> &'static str {
    match intent {
        Intent::Reminder(_) => "reminder",
        Intent::Image { .. } => "image",
        Intent::Files => "files",
        Intent::Chat => "chat",
    }
}

/// Wrap a prompt with retrieved conversations
///
/// # Examples
///
/// ```
/// use parley::router::build_context_prompt;
///
/// assert_eq!(build_context_prompt("hello", &[]), "hello");
/// ```
pub fn build_context_prompt(prompt: &str, context: &[ScoredMemory]) -> String {
    if context.is_empty() {
        return prompt.to_string();
    }

    let history = context
        .iter()
        .map(|c| format!("User: {}\nBot: {}", c.memory.user_message, c.memory.bot_response))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on our previous conversations:\n{}\n\nCurrent question: {}",
        history, prompt
    )
}

/// Append extracted file text to a prompt
pub fn build_file_prompt(prompt: &str, contents: &[String]) -> String {
    if contents.is_empty() {
        return prompt.to_string();
    }
    format!("{}\n\nFile contents:\n{}", prompt, contents.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationMemory;
    use crate::reminders::ReminderStatus;
    use crate::test_utils::{
        FailingEmbeddings, KeywordEmbeddings, RecordingNotifier, ScriptedLanguageModel,
        StaticImageModel,
    };
    use chrono::Utc;

    const NOT_A_REMINDER: &str = r#"{"isReminder": false}"#;

    struct Fixture {
        router: ResponseRouter,
        language: Arc<ScriptedLanguageModel>,
        images: Arc<StaticImageModel>,
    }

    fn fixture(language: ScriptedLanguageModel, images: StaticImageModel) -> Fixture {
        let language = Arc::new(language);
        let images = Arc::new(images);
        let providers = ProviderSet {
            language: language.clone(),
            embeddings: Arc::new(KeywordEmbeddings),
            images: images.clone(),
        };
        let mut config = Config::default();
        config.memory.embedding_dimension = KeywordEmbeddings::DIMENSION;
        let router = ResponseRouter::new(
            providers,
            Storage::temporary().unwrap(),
            &config,
            Arc::new(RecordingNotifier::default()),
        );
        Fixture {
            router,
            language,
            images,
        }
    }

    /// Reminder prompts get a negative answer, everything else `reply`
    fn chat_model(reply: &'static str) -> ScriptedLanguageModel {
        ScriptedLanguageModel::new(move |request| {
            if request.prompt.contains("isReminder") {
                Ok(NOT_A_REMINDER.to_string())
            } else {
                Ok(reply.to_string())
            }
        })
    }

    fn memory(user: &str, bot: &str) -> ScoredMemory {
        ScoredMemory {
            memory: ConversationMemory {
                id: "m".to_string(),
                user_message: user.to_string(),
                bot_response: bot.to_string(),
                timestamp: Utc::now(),
                embedding: None,
            },
            score: 1.0,
        }
    }

    #[test]
    fn test_build_context_prompt_format() {
        let prompt = build_context_prompt("and now?", &[memory("a", "b"), memory("c", "d")]);
        assert_eq!(
            prompt,
            "Based on our previous conversations:\nUser: a\nBot: b\n\nUser: c\nBot: d\n\nCurrent question: and now?"
        );
    }

    #[test]
    fn test_build_file_prompt_format() {
        assert_eq!(
            build_file_prompt("sum", &["1".to_string(), "2".to_string()]),
            "sum\n\nFile contents:\n1\n\n2"
        );
        assert_eq!(build_file_prompt("look", &[]), "look");
    }

    #[tokio::test]
    async fn test_reminder_is_scheduled_and_confirmed() {
        let f = fixture(ScriptedLanguageModel::failing(), StaticImageModel::ok());
        let reply = f
            .router
            .respond("remind me to call mom in 2 hours", &[])
            .await;

        assert!(reply.text.starts_with("Reminder set!"));
        assert!(reply.text.contains("Task: call mom"));
        let reminders = f.router.reminders().list();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].status, ReminderStatus::Pending);
        let expected = reminders[0].datetime.with_timezone(&Local);
        assert!(reply
            .text
            .contains(&expected.format("%Y-%m-%d %H:%M").to_string()));
        assert!(f.router.scheduler().is_running());
        assert!(f.router.memory().is_empty());
        f.router.shutdown().await;
    }

    #[tokio::test]
    async fn test_image_request_uses_fixed_parameters() {
        let f = fixture(chat_model("unused"), StaticImageModel::ok());
        let reply = f
            .router
            .respond("generate an image of a red fox", &[])
            .await;

        assert_eq!(reply.text, "Here's what I imagined for \"a red fox\":");
        assert!(reply.image.is_some());
        let request = &f.images.requests()[0];
        assert_eq!(request.inputs, "A high-quality, detailed image of a red fox");
        assert_eq!(request.negative_prompt, NEGATIVE_PROMPT);
        assert_eq!(request.num_inference_steps, 30);
        assert_eq!(request.guidance_scale, 7.5);
        assert!(f.router.memory().is_empty());
    }

    #[tokio::test]
    async fn test_image_failure_apologizes() {
        let f = fixture(chat_model("unused"), StaticImageModel::failing());
        let reply = f.router.respond("draw an image of a boat", &[]).await;
        assert_eq!(reply, BotReply::text(IMAGE_APOLOGY));
        assert!(f.router.memory().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_attachments_go_in_one_call() {
        let f = fixture(chat_model("Looks like a cat and a list."), StaticImageModel::ok());
        let files = vec![
            Attachment::from_bytes("cat.png", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec()),
            Attachment::from_bytes("list.txt", b"milk\neggs".to_vec()),
        ];

        let reply = f.router.respond("what are these?", &files).await;
        assert_eq!(reply.text, "Looks like a cat and a list.");

        let requests = f.language.requests();
        let analysis = requests.last().unwrap();
        assert_eq!(analysis.prompt, "what are these?\n\nFile contents:\nmilk\neggs");
        assert_eq!(analysis.parts.len(), 1);
        assert_eq!(analysis.parts[0].mime_type, "image/png");

        let memories = f.router.memory().list();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].user_message, "what are these?");
    }

    #[tokio::test]
    async fn test_file_failure_reports_reason() {
        let language = ScriptedLanguageModel::new(|request| {
            if request.prompt.contains("isReminder") {
                Ok(NOT_A_REMINDER.to_string())
            } else {
                Err(crate::error::ParleyError::Provider("quota exhausted".to_string()).into())
            }
        });
        let f = fixture(language, StaticImageModel::ok());
        let files = vec![Attachment::from_bytes("a.txt", b"x".to_vec())];

        let reply = f.router.respond("summarize", &files).await;
        assert!(reply.text.starts_with("Error processing files: "));
        assert!(reply.text.contains("quota exhausted"));
        assert!(f.router.memory().is_empty());
    }

    #[tokio::test]
    async fn test_chat_uses_context_after_first_turn() {
        let f = fixture(chat_model("The sea is salty."), StaticImageModel::ok());

        let first = f.router.respond("tell me about the sea", &[]).await;
        assert_eq!(first.text, "The sea is salty.");
        let first_prompt = f.language.requests()[1].prompt.clone();
        assert_eq!(first_prompt, "tell me about the sea");

        f.router.respond("more about the sea", &[]).await;
        let second_prompt = f.language.requests()[3].prompt.clone();
        assert!(second_prompt.starts_with("Based on our previous conversations:\nUser: tell me about the sea\nBot: The sea is salty."));
        assert!(second_prompt.ends_with("Current question: more about the sea"));
        assert_eq!(f.router.memory().len(), 2);
    }

    #[tokio::test]
    async fn test_chat_failure_apologizes_and_remembers() {
        let f = fixture(ScriptedLanguageModel::failing(), StaticImageModel::ok());
        let reply = f.router.respond("hello there", &[]).await;
        assert_eq!(reply.text, TEXT_APOLOGY);
        assert_eq!(f.router.memory().list()[0].bot_response, TEXT_APOLOGY);
    }

    #[tokio::test]
    async fn test_chat_without_embeddings_still_answers() {
        let language = Arc::new(chat_model("hi!"));
        let providers = ProviderSet {
            language: language.clone(),
            embeddings: Arc::new(FailingEmbeddings),
            images: Arc::new(StaticImageModel::ok()),
        };
        let router = ResponseRouter::new(
            providers,
            Storage::temporary().unwrap(),
            &Config::default(),
            Arc::new(RecordingNotifier::default()),
        );

        router.respond("hi", &[]).await;
        let reply = router.respond("hi again", &[]).await;
        assert_eq!(reply.text, "hi!");
        assert_eq!(language.requests().last().unwrap().prompt, "hi again");
        assert!(router.memory().list().iter().all(|m| !m.has_embedding()));
    }
}
