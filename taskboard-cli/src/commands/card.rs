//! `taskboard card …`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use taskboard_core::service::{self, CardPatch, NewCard};
use taskboard_core::{BoardId, Card, CardId, FileStore, TodoItem};

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// List the cards of a board in display order.
    List {
        board: String,

        /// Include archived cards.
        #[arg(long)]
        archived: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print one card as YAML.
    Show {
        board: String,
        card: String,
    },

    /// Create a card; its id is issued from today's date.
    Add {
        board: String,

        #[arg(long)]
        title: String,

        /// Target list id.
        #[arg(long)]
        list: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        order: i64,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,

        /// Checklist entry. Repeat for more.
        #[arg(long = "todo", value_name = "TEXT")]
        todos: Vec<String>,
    },

    /// Change a card's title, description or labels.
    Edit {
        board: String,
        card: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replaces every label when given.
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,
    },

    /// Move a card to another list.
    Move {
        board: String,
        card: String,

        #[arg(long)]
        list: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        order: i64,
    },

    /// Archive a card, or bring it back with `--restore`.
    Archive {
        board: String,
        card: String,

        #[arg(long)]
        restore: bool,
    },

    /// Delete a card file.
    Delete {
        board: String,
        card: String,
    },
}

#[derive(Tabled)]
struct CardRow {
    #[tabled(rename = "card")]
    id: String,
    list: String,
    order: i64,
    title: String,
    labels: String,
    todos: String,
}

impl From<&Card> for CardRow {
    fn from(card: &Card) -> Self {
        let done = card.todos.iter().filter(|t| t.completed).count();
        let title = if card.archived {
            format!("{} (archived)", card.title)
        } else {
            card.title.clone()
        };
        Self {
            id: card.id.to_string(),
            list: card.list.clone(),
            order: card.order,
            title,
            labels: card.labels.join(", "),
            todos: if card.todos.is_empty() {
                String::new()
            } else {
                format!("{done}/{}", card.todos.len())
            },
        }
    }
}

pub fn run(root: &Path, cmd: CardCommand) -> Result<()> {
    let store = FileStore::new(root);
    match cmd {
        CardCommand::List {
            board,
            archived,
            json,
        } => list(&store, BoardId::from(board), archived, json),
        CardCommand::Show { board, card } => {
            let card = store
                .get_card(&BoardId::from(board), &CardId::from(card))
                .context("failed to load card")?;
            print!("{}", serde_yaml::to_string(&card)?);
            Ok(())
        }
        CardCommand::Add {
            board,
            title,
            list,
            order,
            description,
            labels,
            todos,
        } => {
            let board = BoardId::from(board);
            let new = NewCard {
                title,
                list,
                order,
                description,
                labels,
                todos: todo_items(todos),
            };
            let card = service::create_card(&store, &board, new)
                .with_context(|| format!("failed to add card to '{board}'"))?;
            println!("{} Created card {}", "✓".green(), card.id.to_string().bold());
            Ok(())
        }
        CardCommand::Edit {
            board,
            card,
            title,
            description,
            labels,
        } => {
            let patch = CardPatch {
                title,
                description,
                labels: (!labels.is_empty()).then_some(labels),
                todos: None,
            };
            let card = service::update_card(&store, &BoardId::from(board), &CardId::from(card), patch)
                .context("failed to edit card")?;
            println!("{} Updated card {}", "✓".green(), card.id);
            Ok(())
        }
        CardCommand::Move {
            board,
            card,
            list,
            order,
        } => {
            let card = service::move_card(
                &store,
                &BoardId::from(board),
                &CardId::from(card),
                &list,
                order,
            )
            .context("failed to move card")?;
            println!("{} Moved {} to '{}'", "✓".green(), card.id, card.list);
            Ok(())
        }
        CardCommand::Archive {
            board,
            card,
            restore,
        } => {
            let card = service::archive_card(
                &store,
                &BoardId::from(board),
                &CardId::from(card),
                !restore,
            )
            .context("failed to archive card")?;
            let verb = if card.archived { "Archived" } else { "Restored" };
            println!("{} {verb} {}", "✓".green(), card.id);
            Ok(())
        }
        CardCommand::Delete { board, card } => {
            let card = CardId::from(card);
            service::delete_card(&store, &BoardId::from(board), &card)
                .with_context(|| format!("failed to delete card '{card}'"))?;
            println!("{} Deleted card {card}", "✓".green());
            Ok(())
        }
    }
}

fn list(store: &FileStore, board: BoardId, include_archived: bool, json: bool) -> Result<()> {
    let cards = service::list_cards(store, &board, include_archived)
        .with_context(|| format!("failed to list cards of '{board}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }
    if cards.is_empty() {
        println!("No cards on '{board}'.");
        return Ok(());
    }

    let rows: Vec<CardRow> = cards.iter().map(CardRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

/// Checklist entries numbered from 1 in the order given.
fn todo_items(texts: Vec<String>) -> Vec<TodoItem> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| TodoItem {
            id: (i + 1).to_string(),
            text,
            completed: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn todo_items_are_numbered_from_one() {
        let items = todo_items(vec!["a".into(), "b".into()]);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[1].id, "2");
        assert!(items.iter().all(|t| !t.completed));
    }

    #[test]
    fn row_marks_archived_and_counts_todos() {
        let now = Utc::now();
        let card = Card {
            id: CardId::from("20240101-001"),
            title: "Ship".into(),
            list: "todo".into(),
            order: 2,
            description: String::new(),
            labels: vec!["a".into(), "b".into()],
            todos: vec![
                TodoItem {
                    id: "1".into(),
                    text: "x".into(),
                    completed: true,
                },
                TodoItem {
                    id: "2".into(),
                    text: "y".into(),
                    completed: false,
                },
            ],
            archived: true,
            created_at: now,
            updated_at: now,
        };

        let row = CardRow::from(&card);
        assert_eq!(row.title, "Ship (archived)");
        assert_eq!(row.labels, "a, b");
        assert_eq!(row.todos, "1/2");
    }
}
