//! Command handlers for peoplemem CLI.

use peoplemem::{Error, MemoryEngine, PeopleMemory};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use crate::output::*;

/// Exit code for a missing person or an unresolved reference.
const EXIT_NOT_FOUND: u8 = 2;

/// Commands supported by peoplemem CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Add a person or replace everything known about them
    Upsert {
        /// Person ID
        person: String,
        /// Everything known about the person
        text: String,
    },
    /// Resolve a name or description to a person ID
    Resolve {
        /// Free-text reference, e.g. "the hiker"
        reference: String,
    },
    /// Answer a question about one person
    Ask {
        /// Person ID
        person: String,
        /// Question text
        question: String,
    },
    /// Forget a person
    Delete {
        /// Person ID
        person: String,
    },
    /// Rank people by similarity to a query
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results (default: 5)
        #[arg(short = 'l', long, default_value = "5")]
        limit: usize,
    },
    /// Show what is stored about a person
    Get {
        /// Person ID
        person: String,
    },
    /// List people, most recently updated first
    List {
        /// Maximum number of results (default: 10)
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,
    },
    Version,
}

/// Everything a data command needs.
pub struct Session {
    pub engine: std::sync::Arc<MemoryEngine>,
    pub people: PeopleMemory,
    pub cancel: CancellationToken,
    pub json: bool,
}

/// Execute a data command for the session's user.
pub async fn execute(command: &Commands, session: &Session) -> Result<ExitCode, Error> {
    match command {
        Commands::Upsert { person, text } => handle_upsert(session, person, text).await,
        Commands::Resolve { reference } => handle_resolve(session, reference).await,
        Commands::Ask { person, question } => handle_ask(session, person, question).await,
        Commands::Delete { person } => handle_delete(session, person).await,
        Commands::Search { query, limit } => handle_search(session, query, *limit).await,
        Commands::Get { person } => handle_get(session, person),
        Commands::List { limit } => handle_list(session, *limit),
        Commands::Version => handle_version(session.json),
    }
}

async fn handle_upsert(session: &Session, person: &str, text: &str) -> Result<ExitCode, Error> {
    session
        .people
        .add_or_update_person(person, text, &session.cancel)
        .await?;
    if session.json {
        print_json(&StatusResponse {
            status: "upserted".to_string(),
            id: person.to_string(),
        });
    } else {
        println!("Stored person: {}", person);
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_resolve(session: &Session, reference: &str) -> Result<ExitCode, Error> {
    let id = session
        .people
        .resolve_person_id(reference, &session.cancel)
        .await?;
    let code = if id.is_empty() {
        ExitCode::from(EXIT_NOT_FOUND)
    } else {
        ExitCode::SUCCESS
    };
    if session.json {
        print_json(&ResolveResponse {
            reference: reference.to_string(),
            id,
        });
    } else if id.is_empty() {
        println!("No matching person");
    } else {
        println!("{}", id);
    }
    Ok(code)
}

async fn handle_ask(session: &Session, person: &str, question: &str) -> Result<ExitCode, Error> {
    let answer = session.people.ask(person, question, &session.cancel).await?;
    if session.json {
        print_json(&answer);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", answer.text);
    if let Some(reason) = &answer.no_result_reason {
        println!("  (no answer: {})", reason);
    }
    for citation in &answer.citations {
        println!(
            "  source: {} [relevance: {:.2}, updated: {}]",
            citation.document_id, citation.relevance, citation.last_updated
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_delete(session: &Session, person: &str) -> Result<ExitCode, Error> {
    session.people.delete_person(person, &session.cancel).await?;
    if session.json {
        print_json(&StatusResponse {
            status: "deleted".to_string(),
            id: person.to_string(),
        });
    } else {
        println!("Deleted person: {}", person);
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_search(session: &Session, query: &str, limit: usize) -> Result<ExitCode, Error> {
    let hits = session
        .engine
        .search(session.people.user_id(), query, limit, &session.cancel)
        .await?;
    if session.json {
        let results = hits
            .into_iter()
            .map(|hit| SearchResultItem {
                id: hit.document_id,
                score: hit.score,
            })
            .collect();
        print_json(&SearchResponse { results });
    } else {
        for hit in hits {
            println!("{} [score: {:.2}]", hit.document_id, hit.score);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get(session: &Session, person: &str) -> Result<ExitCode, Error> {
    let document = session.engine.get(session.people.user_id(), person)?;
    if session.json {
        print_json(&GetResponse {
            id: document.id,
            content: document.content,
            created_at: document.created_at,
            updated_at: document.updated_at,
        });
    } else {
        println!("ID: {}", document.id);
        println!("Content: {}", document.content);
        println!("Created: {}", document.created_at);
        println!("Updated: {}", document.updated_at);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list(session: &Session, limit: usize) -> Result<ExitCode, Error> {
    let documents = session.engine.list(session.people.user_id(), limit)?;
    if session.json {
        let documents = documents
            .into_iter()
            .map(|d| ListItem {
                id: d.id,
                content: d.content,
                updated_at: d.updated_at,
            })
            .collect();
        print_json(&ListResponse { documents });
    } else {
        for document in documents {
            println!("{}: {}", document.id, document.content);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Print name and version. Runs without loading config or models.
pub fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}

/// Exit code for a failed command.
pub fn exit_code_for(error: &Error) -> ExitCode {
    match error.kind() {
        peoplemem::ErrorKind::NotFound => ExitCode::from(EXIT_NOT_FOUND),
        _ => ExitCode::FAILURE,
    }
}
