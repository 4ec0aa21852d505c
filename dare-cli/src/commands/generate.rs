//! Generate mode: the prompt comes from arguments and piped stdin.

use std::io::{self, IsTerminal, Read};

use anyhow::{bail, Context, Result};
use dare_core::prompts::SCRIPT_GENERATION;

use super::Job;

pub fn prepare_generate(words: &[String]) -> Result<Job> {
    let stdin = io::stdin();
    let piped = if stdin.is_terminal() {
        None
    } else {
        let mut input = String::new();
        stdin
            .lock()
            .read_to_string(&mut input)
            .context("Failed to read piped input")?;
        Some(input)
    };

    Ok(Job {
        system: SCRIPT_GENERATION.to_string(),
        prompt: build_prompt(words, piped.as_deref())?,
    })
}

/// Join prompt words and append piped input after a blank line.
fn build_prompt(words: &[String], piped: Option<&str>) -> Result<String> {
    let mut prompt = words.join(" ");
    if let Some(input) = piped.filter(|input| !input.is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(input);
    }

    if prompt.trim().is_empty() {
        bail!("No prompt given. Describe the script to generate, e.g. `dare print a calendar`");
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_words_joined_with_spaces() {
        let prompt = build_prompt(&words(&["print", "a", "calendar"]), None).unwrap();
        assert_eq!(prompt, "print a calendar");
    }

    #[test]
    fn test_piped_input_appended_after_blank_line() {
        let prompt = build_prompt(&words(&["summarize", "this"]), Some("a,b\n1,2\n")).unwrap();
        assert_eq!(prompt, "summarize this\n\na,b\n1,2\n");
    }

    #[test]
    fn test_empty_piped_input_ignored() {
        let prompt = build_prompt(&words(&["hello"]), Some("")).unwrap();
        assert_eq!(prompt, "hello");
    }

    #[test]
    fn test_piped_input_alone_is_a_prompt() {
        assert!(build_prompt(&[], Some("write a clock")).is_ok());
    }

    #[test]
    fn test_empty_prompt_is_an_error() {
        assert!(build_prompt(&[], None).is_err());
        assert!(build_prompt(&words(&["  "]), Some("\n")).is_err());
    }
}
