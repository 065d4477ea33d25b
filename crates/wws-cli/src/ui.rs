//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};
use wws_core::Result;

use crate::assistant::Answer;

/// Prompt shown before each question
pub const PROMPT: &str = "Ask your question (q to quit):";

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Quit,
    Help,
    Stats,
    Empty,
    Question(String),
}

/// Classify one line of input
pub fn parse_input(line: &str) -> InputCommand {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => InputCommand::Empty,
        "q" | "quit" | "exit" => InputCommand::Quit,
        "help" => InputCommand::Help,
        "stats" => InputCommand::Stats,
        _ => InputCommand::Question(trimmed.to_string()),
    }
}

/// Display startup banner
pub fn display_banner(model: &str, documents: usize) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let inner = banner_width - 2;
    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    let boxed = |text: &str| {
        let pad = inner.saturating_sub(text.chars().count() + 2);
        format!("│  {}{}│", text, " ".repeat(pad))
    };

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());
    println!("{}", boxed("Water Works Supply Chain Assistant").blue().bold());
    println!("{}", empty_line.blue());

    let feature_lines = vec![
        "Answers questions from product docs, internal docs".to_string(),
        "and customer reviews.".to_string(),
        String::new(),
        format!("Model: {}", model),
        format!("Indexed documents: {}", documents),
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            println!("{}", boxed(&line).blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "Tip: type a question, 'help' for commands, 'q' to quit".dimmed()
    );
    println!();
}

/// Read one line, with history navigation when stdin is a terminal
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    // Piped input: plain line reads; EOF reads as "q"
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        let read = io::stdin().read_line(&mut input)?;
        if read == 0 {
            return Ok("q".to_string());
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    print!("{} ", PROMPT.green().bold());
    io::stdout().flush()?;

    enable_raw_mode()?;
    let result = read_line_raw(history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if !input.is_empty() {
        history.push(input.clone());
    }
    Ok(input)
}

fn redraw(input: &str) -> Result<()> {
    print!("\r{} {}\x1b[K", PROMPT.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

fn read_line_raw(history: &[String]) -> Result<String> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        match key_event.code {
            KeyCode::Enter => return Ok(input),
            KeyCode::Esc => return Ok(String::new()),
            KeyCode::Char('c')
                if key_event
                    .modifiers
                    .contains(crossterm::event::KeyModifiers::CONTROL) =>
            {
                return Ok("q".to_string());
            }
            KeyCode::Char(c) => {
                input.push(c);
                redraw(&input)?;
            }
            KeyCode::Backspace => {
                input.pop();
                redraw(&input)?;
            }
            KeyCode::Up => {
                if !history.is_empty() {
                    let new_index = match history_index {
                        None => history.len() - 1,
                        Some(idx) if idx > 0 => idx - 1,
                        Some(idx) => idx,
                    };
                    history_index = Some(new_index);
                    input = history[new_index].clone();
                    redraw(&input)?;
                }
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(&input)?;
                }
            }
            _ => {}
        }
    }
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask about products, internal policies or reviews", "question".green());
    println!("  {} - Show index statistics", "stats".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "q".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  What is the best product this company has?");
    println!("  What do customers say about SKU-3?");
    println!("  How many vacation days do new employees get?");
}

/// Print an answer and a one-line summary of what was retrieved
pub fn print_answer(answer: &Answer) {
    println!();
    println!("{}", answer.text);
    println!();

    if let Some(retrieval) = &answer.retrieval {
        let budget = retrieval.budget;
        let mut summary = format!(
            "{} documents (internal {}, product {}, reviews {})",
            answer.documents_used(),
            budget.internal,
            budget.product,
            budget.reviews
        );
        if let Some(sku) = &retrieval.sku {
            summary.push_str(&format!(", +{} for {}", retrieval.supplementary_count, sku));
        }
        println!("{}", summary.dimmed());
        println!();
    }
}

/// Print index statistics
pub fn print_stats(stats: &serde_json::Value) {
    println!("{}", "Index statistics:".bold());
    match serde_json::to_string_pretty(stats) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", stats),
    }
}
