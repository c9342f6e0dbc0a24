//! `taskboard board …`

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use taskboard_core::service::{self, BoardPatch};
use taskboard_core::{Board, BoardId, FileStore, List};

#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// List every board in the store.
    List,

    /// Print one board with its lists and card counts.
    Show {
        board: String,
    },

    /// Create a new board.
    Create(CreateArgs),

    /// Change a board's display name.
    Rename {
        board: String,
        name: String,
    },

    /// Delete a board and all of its cards.
    Delete {
        board: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Board id; also the directory name under `boards/`.
    pub id: String,

    /// Display name. Defaults to the id.
    #[arg(long)]
    pub name: Option<String>,

    /// List as `id:Name` (or just `id`). Repeat for more lists.
    #[arg(long = "list", short = 'l', value_name = "ID:NAME")]
    pub lists: Vec<ListArg>,
}

/// `id:Name` parsed from the command line.
#[derive(Debug, Clone)]
pub struct ListArg(pub List);

impl FromStr for ListArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (id, name) = match s.split_once(':') {
            Some((id, name)) => (id.trim(), name.trim()),
            None => (s.trim(), s.trim()),
        };
        if id.is_empty() || name.is_empty() {
            return Err(format!("invalid list '{s}'; expected ID:NAME"));
        }
        Ok(Self(List::new(id, name)))
    }
}

#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "board")]
    id: String,
    name: String,
    lists: String,
}

pub fn run(root: &Path, cmd: BoardCommand) -> Result<()> {
    let store = FileStore::new(root);
    match cmd {
        BoardCommand::List => list(&store),
        BoardCommand::Show { board } => show(&store, BoardId::from(board)),
        BoardCommand::Create(args) => create(&store, args),
        BoardCommand::Rename { board, name } => {
            let board = service::update_board(
                &store,
                &BoardId::from(board),
                BoardPatch {
                    name: Some(name),
                    lists: None,
                },
            )
            .context("failed to rename board")?;
            println!("{} Renamed '{}' to '{}'", "✓".green(), board.id, board.name);
            Ok(())
        }
        BoardCommand::Delete { board } => {
            let id = BoardId::from(board);
            service::delete_board(&store, &id)
                .with_context(|| format!("failed to delete board '{id}'"))?;
            println!("{} Deleted board '{id}'", "✓".green());
            Ok(())
        }
    }
}

fn list(store: &FileStore) -> Result<()> {
    let boards = store.list_boards().context("failed to list boards")?;
    if boards.is_empty() {
        println!("No boards in {}.", store.root().display());
        println!("Run: taskboard board create <id> --list todo:Todo");
        return Ok(());
    }

    let rows: Vec<BoardRow> = boards
        .into_iter()
        .map(|b| BoardRow {
            id: b.id.0,
            name: b.name,
            lists: b
                .lists
                .iter()
                .map(|l| l.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn show(store: &FileStore, id: BoardId) -> Result<()> {
    let board = store
        .get_board(&id)
        .with_context(|| format!("failed to load board '{id}'"))?;
    let cards = store
        .list_cards(&id, false)
        .with_context(|| format!("failed to load cards of '{id}'"))?;

    println!("{} ({})", board.name.bold(), board.id);
    for list in &board.lists {
        let count = cards.iter().filter(|c| c.list == list.id).count();
        println!("  {} [{}]: {} card(s)", list.name, list.id, count);
    }
    Ok(())
}

fn create(store: &FileStore, args: CreateArgs) -> Result<()> {
    let lists = if args.lists.is_empty() {
        vec![
            List::new("todo", "Todo"),
            List::new("doing", "Doing"),
            List::new("done", "Done"),
        ]
    } else {
        args.lists.into_iter().map(|l| l.0).collect()
    };
    let board = Board {
        id: BoardId::from(args.id.clone()),
        name: args.name.unwrap_or_else(|| args.id.clone()),
        lists,
    };

    let board = service::create_board(store, board)
        .with_context(|| format!("failed to create board '{}'", args.id))?;
    println!("{} Created board '{}'", "✓".green(), board.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_arg_parses_id_and_name() {
        let arg: ListArg = "todo:To do".parse().expect("parse");
        assert_eq!(arg.0, List::new("todo", "To do"));
    }

    #[test]
    fn list_arg_without_name_reuses_id() {
        let arg: ListArg = "done".parse().expect("parse");
        assert_eq!(arg.0, List::new("done", "done"));
    }

    #[test]
    fn list_arg_rejects_empty_parts() {
        assert!(":Name".parse::<ListArg>().is_err());
        assert!("id:".parse::<ListArg>().is_err());
    }
}
