//! Interactive prompt loop
//!
//! Reads one line at a time, normalizes it with `clean_input`, and hands it to
//! the session. Command failures are printed and the loop keeps going; only
//! `exit` or end of input ends it.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::commands::{Outcome, Session};

/// Text shown before each line of input
pub const PROMPT: &str = "Pokedex > ";

/// Splits a line into lowercase words, dropping surrounding and repeated whitespace.
pub fn clean_input(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Runs the prompt until `exit` or end of input
///
/// # Arguments
/// * `session` - Session state shared across commands
/// * `input` - Line source, normally stdin
/// * `output` - Where prompts, results and errors are written, normally stdout
///
/// # Returns
/// * `Ok(())` when the session ends
/// * `Err` only if reading input or writing output fails
pub async fn run<R, W>(session: &mut Session, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            debug!("end of input");
            writeln!(output)?;
            break;
        };

        let words = clean_input(&line);
        if words.is_empty() {
            continue;
        }

        match session.execute(&words).await {
            Ok(Outcome::Continue(text)) => {
                if !text.is_empty() {
                    writeln!(output, "{}", text)?;
                }
            }
            Ok(Outcome::Exit(text)) => {
                writeln!(output, "{}", text)?;
                break;
            }
            Err(err) => {
                warn!(error = %err, "command failed");
                writeln!(output, "Error: {}", err)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PokeClient;
    use std::time::Duration;
    use tokio::io::BufReader;

    fn session() -> Session {
        let client = PokeClient::new(Duration::from_secs(60))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/api/v2");
        Session::new(client)
    }

    async fn run_script(script: &str) -> String {
        let mut session = session();
        let mut output = Vec::new();
        run(&mut session, BufReader::new(script.as_bytes()), &mut output)
            .await
            .unwrap();
        session.client().shutdown();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_clean_input() {
        assert_eq!(clean_input("  hello  world  "), vec!["hello", "world"]);
        assert_eq!(
            clean_input("Charmander Bulbasaur PIKACHU"),
            vec!["charmander", "bulbasaur", "pikachu"]
        );
        assert!(clean_input("   ").is_empty());
        assert!(clean_input("").is_empty());
    }

    #[tokio::test]
    async fn test_run_help_then_exit() {
        let output = run_script("help\nexit\npokedex\n").await;

        assert!(output.starts_with(PROMPT));
        assert!(output.contains("Usage:"));
        assert!(output.contains("Goodbye!"));
        // Nothing after exit is executed
        assert!(!output.contains("Your Pokedex"));
    }

    #[tokio::test]
    async fn test_run_ends_at_end_of_input() {
        let output = run_script("POKEDEX\n").await;
        assert!(output.contains("Your Pokedex is empty"));
        assert!(output.ends_with(&format!("{}\n", PROMPT)));
    }

    #[tokio::test]
    async fn test_run_reports_errors_and_continues() {
        let output = run_script("dance\n\ncatch\npokedex\n").await;

        assert!(output.contains("Error: Unknown command: 'dance'"));
        assert!(output.contains("Error: Usage: catch <pokemon>"));
        assert!(output.contains("Your Pokedex is empty"));
    }
}
