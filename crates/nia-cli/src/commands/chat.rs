use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use nia_application::{ChatSession, ChildSessionUseCase};
use nia_core::conversation::{Message, MessageId, Rating, VisualContent};
use nia_core::feedback::RateOutcome;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

const COMMANDS: [&str; 5] = ["/up", "/down", "/logout", "/quit", "/help"];

/// Slash-command completion and highlighting for the chat prompt.
#[derive(Clone, Default)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

/// A parsed prompt line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Say(&'a str),
    Rate(MessageId, Rating),
    Logout,
    Quit,
    Help,
    Unknown,
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Input::Say(line);
    };
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let id = parts.next().and_then(|n| n.parse::<u64>().ok()).map(MessageId);

    match (name, id) {
        ("up", Some(id)) => Input::Rate(id, Rating::Helpful),
        ("down", Some(id)) => Input::Rate(id, Rating::NotHelpful),
        ("logout", _) => Input::Logout,
        ("quit" | "exit", _) => Input::Quit,
        ("help", _) => Input::Help,
        _ => Input::Unknown,
    }
}

pub async fn run(usecase: &ChildSessionUseCase) -> Result<()> {
    let chat = match usecase.open_chat() {
        Ok(chat) => chat,
        Err(e) => {
            tracing::debug!(error = %e, "Chat refused");
            println!("{}", "Please sign in first with `nia login`.".yellow());
            return Ok(());
        }
    };

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!(
        "{}",
        format!("=== Hi {}! Ask me anything. ===", chat.child().display_name)
            .bright_magenta()
            .bold()
    );
    print_help();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        match parse_input(trimmed) {
            Input::Say(text) => {
                if !say(&chat, text).await {
                    break;
                }
            }
            Input::Rate(id, rating) => rate(&chat, id, rating).await,
            Input::Logout => {
                usecase.logout().await;
                println!("{}", "Signed out. See you next time!".bright_green());
                break;
            }
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Unknown => println!("{}", "Unknown command. Try /help".bright_black()),
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

fn print_help() {
    println!(
        "{}",
        "Type a question, /up <id> or /down <id> to rate an answer, /logout, or /quit."
            .bright_black()
    );
    println!();
}

/// Returns false when the chat can no longer continue.
async fn say(chat: &ChatSession, text: &str) -> bool {
    println!("{}", "Thinking...".bright_black());
    match chat.send(text).await {
        Ok(outcome) => {
            print_reply(&outcome.reply, !outcome.fallback);
            true
        }
        Err(e) if e.is_auth() => {
            println!(
                "{}",
                "You're not signed in anymore. Run `nia login`.".yellow()
            );
            false
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            true
        }
    }
}

async fn rate(chat: &ChatSession, id: MessageId, rating: Rating) {
    let thumb = match rating {
        Rating::Helpful => "👍",
        Rating::NotHelpful => "👎",
    };
    match chat.rate(id, rating).await {
        Ok(RateOutcome::Recorded(_)) => {
            println!("{}", format!("{thumb} Thanks for telling me!").bright_green());
        }
        Ok(RateOutcome::AlreadyRecorded(_)) => {
            println!("{}", format!("You already rated #{id}.").bright_black());
        }
        Err(e) if e.is_not_found() || e.is_validation() => {
            println!("{}", format!("#{id} can't be rated.").bright_black());
        }
        Err(e) => println!("{}", format!("Couldn't send feedback: {e}").red()),
    }
}

fn print_reply(reply: &Message, ratable: bool) {
    match &reply.visual {
        Some(VisualContent::EmojiSet { emojis }) => println!("{}", emojis.join(" ")),
        Some(VisualContent::Image {
            url,
            prompt_description,
        }) => println!(
            "{}",
            format!("🖼  {prompt_description} <{url}>").bright_black()
        ),
        None => {}
    }

    let tag = format!("[#{}]", reply.id);
    println!("{}", tag.bright_magenta());
    for line in reply.content.lines() {
        println!("{}", line.bright_blue());
    }

    if let Some(label) = &reply.source_label {
        println!("{}", label.bright_black());
    }
    for source in &reply.sources {
        let check = if source.verified { " ✓" } else { "" };
        match &source.snippet {
            Some(snippet) => println!(
                "  {}",
                format!("- {}{check}: {snippet}", source.title).bright_black()
            ),
            None => println!("  {}", format!("- {}{check}", source.title).bright_black()),
        }
    }
    if let Some(follow_up) = &reply.follow_up {
        println!("{}", follow_up.text.yellow());
        for option in &follow_up.options {
            println!("  {}", format!("• {}", option.text).yellow());
        }
    }
    if !reply.related_topics.is_empty() {
        println!(
            "{}",
            format!("Related: {}", reply.related_topics.join(", ")).bright_black()
        );
    }
    if ratable {
        println!(
            "{}",
            format!("Was this helpful? /up {} or /down {}", reply.id, reply.id).bright_black()
        );
    }
    println!();
}
