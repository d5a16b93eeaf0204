//! Interactive editing and confirmation of generated messages.

use std::io::Write;
use std::process::Command;

use dialoguer::{Confirm, Input, Select};
use tracing::debug;

use crate::error::EditorError;

/// How the user wants to adjust the generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Keep,
    Inline,
    External,
}

const RULE: &str = "─────────────────────────────────────────────────────────────";

/// Print a message with a titled separator block.
pub fn display_message(title: &str, message: &str) {
    println!("\n{title}:");
    println!("{RULE}");
    println!("{message}");
    println!("{RULE}");
}

/// Ask how to proceed with the generated message.
pub fn choose_edit_mode() -> Result<EditMode, EditorError> {
    let options = ["Keep as is", "Edit inline", "Edit with external editor"];
    let choice = Select::new()
        .with_prompt("How would you like to proceed?")
        .items(&options)
        .default(0)
        .interact()
        .map_err(EditorError::PromptFailed)?;

    Ok(match choice {
        1 => EditMode::Inline,
        2 => EditMode::External,
        _ => EditMode::Keep,
    })
}

/// Apply the chosen edit mode to the message.
pub fn edit_message(message: &str, mode: EditMode) -> Result<String, EditorError> {
    match mode {
        EditMode::Keep => Ok(message.to_string()),
        EditMode::Inline => edit_inline(message),
        EditMode::External => edit_external(message),
    }
}

/// Yes/no confirmation with a default answer.
pub fn confirm(prompt: &str, default: bool) -> Result<bool, EditorError> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(EditorError::PromptFailed)
}

fn edit_inline(message: &str) -> Result<String, EditorError> {
    let edited: String = Input::new()
        .with_prompt("Commit message")
        .with_initial_text(message)
        .interact_text()
        .map_err(EditorError::PromptFailed)?;

    let edited = edited.trim().to_string();
    if edited.is_empty() {
        Ok(message.to_string())
    } else {
        Ok(edited)
    }
}

/// Round-trip the message through the user's editor via a temp file.
fn edit_external(message: &str) -> Result<String, EditorError> {
    let command = find_editor()?;
    debug!(editor = %command[0], "opening external editor");

    let mut file = tempfile::Builder::new()
        .prefix("quill-message-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(message.as_bytes())?;
    file.flush()?;

    let status = Command::new(&command[0])
        .args(&command[1..])
        .arg(file.path())
        .status()?;
    if !status.success() {
        return Err(EditorError::EditorFailed(status));
    }

    let edited = std::fs::read_to_string(file.path())?;
    Ok(edited.trim().to_string())
}

/// Resolve the editor command: `$EDITOR`, then `$VISUAL`, then the first
/// of a few common editors found on PATH.
fn find_editor() -> Result<Vec<String>, EditorError> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(value) = std::env::var(var) {
            let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                return Ok(parts);
            }
        }
    }

    for fallback in ["nano", "vim", "vi"] {
        if which::which(fallback).is_ok() {
            return Ok(vec![fallback.to_string()]);
        }
    }

    Err(EditorError::NoEditor)
}
