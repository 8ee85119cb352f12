//! REPL commands and the session state they operate on.
//!
//! Each command is a variant of `Command`. `Session::execute` runs one command
//! against the cached API client and returns the text to show the user.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, PokeClient, Pokemon};

/// A catch succeeds when the roll lands below this value
pub const CATCH_THRESHOLD: u32 = 40;

/// Commands available at the Pokedex prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the command list
    Help,
    /// Leave the REPL
    Exit,
    /// Show the next page of location areas
    Map,
    /// Show the previous page of location areas
    MapBack,
    /// List the pokemon found in a location area
    Explore,
    /// Try to catch a pokemon
    Catch,
    /// Show details of a caught pokemon
    Inspect,
    /// List caught pokemon
    Pokedex,
}

impl Command {
    /// Returns every command in the order `help` lists them.
    pub fn all() -> &'static [Command] {
        &[
            Command::Help,
            Command::Exit,
            Command::Map,
            Command::MapBack,
            Command::Explore,
            Command::Catch,
            Command::Inspect,
            Command::Pokedex,
        ]
    }

    /// The word typed at the prompt to run this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Exit => "exit",
            Command::Map => "map",
            Command::MapBack => "mapb",
            Command::Explore => "explore",
            Command::Catch => "catch",
            Command::Inspect => "inspect",
            Command::Pokedex => "pokedex",
        }
    }

    /// How to invoke the command, including its argument if it takes one.
    pub fn usage(&self) -> &'static str {
        match self {
            Command::Explore => "explore <location-area>",
            Command::Catch => "catch <pokemon>",
            Command::Inspect => "inspect <pokemon>",
            other => other.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Help => "Displays a help message",
            Command::Exit => "Exit the Pokedex",
            Command::Map => "Displays the next 20 location areas",
            Command::MapBack => "Displays the previous 20 location areas",
            Command::Explore => "Lists the pokemon found in a location area",
            Command::Catch => "Attempt to catch a pokemon",
            Command::Inspect => "Show the details of a caught pokemon",
            Command::Pokedex => "List every pokemon you have caught",
        }
    }

    fn takes_argument(&self) -> bool {
        matches!(self, Command::Explore | Command::Catch | Command::Inspect)
    }

    /// Looks up a command by the word typed at the prompt.
    ///
    /// Returns `None` if no command has that name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Command> {
        Command::all().iter().copied().find(|c| c.name() == s)
    }
}

/// Errors a command can report back to the prompt
#[derive(Debug, Error)]
pub enum CommandError {
    /// The first word did not name a command
    #[error("Unknown command: '{0}'. Type 'help' to see available commands")]
    UnknownCommand(String),

    /// The command needs an argument that was not given
    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    /// The PokeAPI read failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What the REPL should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and prompt again
    Continue(String),
    /// Print the text and end the session
    Exit(String),
}

/// State carried between commands for one REPL session
pub struct Session {
    client: PokeClient,
    /// Whether `map` has fetched a page yet
    paging_started: bool,
    next_page: Option<String>,
    previous_page: Option<String>,
    pokedex: BTreeMap<String, Pokemon>,
    rng: StdRng,
}

impl Session {
    pub fn new(client: PokeClient) -> Self {
        Self::with_rng(client, StdRng::from_entropy())
    }

    /// Creates a session with a fixed random source for catch rolls
    pub fn with_rng(client: PokeClient, rng: StdRng) -> Self {
        Self {
            client,
            paging_started: false,
            next_page: None,
            previous_page: None,
            pokedex: BTreeMap::new(),
            rng,
        }
    }

    pub fn client(&self) -> &PokeClient {
        &self.client
    }

    /// Pokemon caught so far, ordered by name
    pub fn pokedex(&self) -> &BTreeMap<String, Pokemon> {
        &self.pokedex
    }

    /// Runs the command named by the first word, passing it the remaining words.
    ///
    /// # Arguments
    /// * `words` - The cleaned input line, command name first
    ///
    /// # Returns
    /// * `Ok(Outcome)` with the text to print
    /// * `Err(CommandError)` if the command is unknown, misused, or its API read failed
    pub async fn execute(&mut self, words: &[String]) -> Result<Outcome, CommandError> {
        let Some((name, args)) = words.split_first() else {
            return Ok(Outcome::Continue(String::new()));
        };
        let command =
            Command::from_str(name).ok_or_else(|| CommandError::UnknownCommand(name.clone()))?;

        let arg = if command.takes_argument() {
            Some(
                args.first()
                    .map(String::as_str)
                    .ok_or(CommandError::MissingArgument(command.usage()))?,
            )
        } else {
            None
        };
        debug!(command = command.name(), ?arg, "executing command");

        let text = match (command, arg) {
            (Command::Help, _) => help_text(),
            (Command::Exit, _) => {
                return Ok(Outcome::Exit(
                    "Closing the Pokedex... Goodbye!".to_string(),
                ))
            }
            (Command::Map, _) => self.map_forward().await?,
            (Command::MapBack, _) => self.map_back().await?,
            (Command::Explore, Some(area)) => self.explore(area).await?,
            (Command::Catch, Some(name)) => self.catch(name).await?,
            (Command::Inspect, Some(name)) => self.inspect(name),
            (Command::Pokedex, _) => self.list_pokedex(),
            (_, None) => return Err(CommandError::MissingArgument(command.usage())),
        };
        Ok(Outcome::Continue(text))
    }

    async fn map_forward(&mut self) -> Result<String, ApiError> {
        if self.paging_started && self.next_page.is_none() {
            return Ok("You're on the last page".to_string());
        }
        let next = self.next_page.clone();
        self.show_page(next.as_deref()).await
    }

    async fn map_back(&mut self) -> Result<String, ApiError> {
        match self.previous_page.clone() {
            Some(url) => self.show_page(Some(url.as_str())).await,
            None => Ok("You're on the first page".to_string()),
        }
    }

    async fn show_page(&mut self, url: Option<&str>) -> Result<String, ApiError> {
        let page = self.client.list_location_areas(url).await?;
        self.paging_started = true;
        self.next_page = page.next;
        self.previous_page = page.previous;

        let names: Vec<&str> = page.results.iter().map(|area| area.name.as_str()).collect();
        Ok(names.join("\n"))
    }

    async fn explore(&self, area_name: &str) -> Result<String, ApiError> {
        let area = self.client.get_location_area(area_name).await?;

        let mut out = format!("Exploring {}...\n", area.name);
        let mut names = area.pokemon_names().peekable();
        if names.peek().is_none() {
            out.push_str("No pokemon found here");
            return Ok(out);
        }
        out.push_str("Found Pokemon:");
        for name in names {
            let _ = write!(out, "\n - {}", name);
        }
        Ok(out)
    }

    async fn catch(&mut self, name: &str) -> Result<String, ApiError> {
        let pokemon = self.client.get_pokemon(name).await?;

        let mut out = format!("Throwing a Pokeball at {}...\n", pokemon.name);
        let roll = catch_roll(&mut self.rng, pokemon.base_experience);
        debug!(pokemon = %pokemon.name, roll, "catch attempt");

        if is_caught(roll) {
            let _ = write!(
                out,
                "{} was caught!\nYou may now inspect it with the inspect command.",
                pokemon.name
            );
            self.pokedex.insert(pokemon.name.clone(), pokemon);
        } else {
            let _ = write!(out, "{} escaped!", pokemon.name);
        }
        Ok(out)
    }

    fn inspect(&self, name: &str) -> String {
        match self.pokedex.get(name) {
            Some(pokemon) => format_pokemon(pokemon),
            None => "you have not caught that pokemon".to_string(),
        }
    }

    fn list_pokedex(&self) -> String {
        if self.pokedex.is_empty() {
            return "Your Pokedex is empty. Try the catch command!".to_string();
        }
        let mut out = "Your Pokedex:".to_string();
        for name in self.pokedex.keys() {
            let _ = write!(out, "\n - {}", name);
        }
        out
    }
}

/// Rolls a number in `0..base_experience`; stronger pokemon roll higher.
///
/// A missing base experience rolls as if it were the catch threshold.
pub fn catch_roll<R: Rng + ?Sized>(rng: &mut R, base_experience: Option<u32>) -> u32 {
    let ceiling = base_experience.unwrap_or(CATCH_THRESHOLD).max(1);
    rng.gen_range(0..ceiling)
}

pub fn is_caught(roll: u32) -> bool {
    roll < CATCH_THRESHOLD
}

fn help_text() -> String {
    let mut out = "Welcome to the Pokedex!\nUsage:\n".to_string();
    for command in Command::all() {
        let _ = write!(out, "\n{}: {}", command.usage(), command.description());
    }
    out
}

/// Renders a caught pokemon for `inspect`
pub fn format_pokemon(pokemon: &Pokemon) -> String {
    let mut out = format!(
        "Name: {}\nHeight: {}\nWeight: {}\nStats:",
        pokemon.name, pokemon.height, pokemon.weight
    );
    for stat in &pokemon.stats {
        let _ = write!(out, "\n  -{}: {}", stat.stat.name, stat.base_stat);
    }
    out.push_str("\nTypes:");
    for kind in &pokemon.types {
        let _ = write!(out, "\n  - {}", kind.kind.name);
    }
    out
}
