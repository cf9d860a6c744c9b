use crate::cli::MemoryCommand;
use crate::commands::truncate;
use crate::config::Config;
use crate::error::Result;
use crate::memory::{ConversationMemory, ScoredMemory, VectorStore};
use crate::providers::create_providers;
use crate::storage::Storage;
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle memory commands
pub async fn handle_memory(config: Config, command: MemoryCommand) -> Result<()> {
    let providers = create_providers(&config.providers)?;
    let storage = Storage::from_config(&config.storage)?;
    let store = VectorStore::new(storage, providers.embeddings, &config.memory);

    match command {
        MemoryCommand::List => print_memories(&store.list(), config.memory.capacity),
        MemoryCommand::Search { text, limit } => {
            let results = store.query(&text, limit).await;
            print_matches(&results);
        }
        MemoryCommand::Clear => {
            store.clear()?;
            println!("{}", "Conversation memory cleared.".green());
        }
    }

    Ok(())
}

/// Print stored exchanges as a table
pub fn print_memories(memories: &[ConversationMemory], capacity: usize) {
    if memories.is_empty() {
        println!("{}", "No conversations remembered yet.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "When".bold(),
        "You".bold(),
        "Assistant".bold(),
        "Embedded".bold()
    ]);

    for memory in memories {
        let embedded = if memory.has_embedding() {
            "yes".green()
        } else {
            "no".dimmed()
        };
        table.add_row(prettytable::row![
            memory
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            truncate(&memory.user_message, 40),
            truncate(&memory.bot_response, 40),
            embedded
        ]);
    }

    println!("\nConversation memory ({}/{}):", memories.len(), capacity);
    table.printstd();
    println!();
}

/// Print similarity search results, best first
pub fn print_matches(results: &[ScoredMemory]) {
    if results.is_empty() {
        println!("{}", "No similar conversations found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Score".bold(),
        "You".bold(),
        "Assistant".bold()
    ]);
    for result in results {
        table.add_row(prettytable::row![
            format!("{:.3}", result.score).cyan(),
            truncate(&result.memory.user_message, 40),
            truncate(&result.memory.bot_response, 40)
        ]);
    }

    println!();
    table.printstd();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::storage::Table as StoredTable;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_and_clear() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            storage: StorageConfig {
                path: Some(dir.path().join("parley.db")),
            },
            ..Default::default()
        };
        {
            let storage = Storage::from_config(&config.storage).unwrap();
            storage
                .save(
                    StoredTable::ConversationMemory,
                    &[ConversationMemory {
                        id: "m1".to_string(),
                        user_message: "hi".to_string(),
                        bot_response: "hello".to_string(),
                        timestamp: Utc::now(),
                        embedding: None,
                    }],
                )
                .unwrap();
        }

        handle_memory(config.clone(), MemoryCommand::List)
            .await
            .unwrap();
        handle_memory(config.clone(), MemoryCommand::Clear)
            .await
            .unwrap();

        let storage = Storage::from_config(&config.storage).unwrap();
        let remaining: Vec<ConversationMemory> = storage.load(StoredTable::ConversationMemory);
        assert!(remaining.is_empty());
    }
}
