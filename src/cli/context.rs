use std::io;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{Config, ConfigManager},
    errors::{CliError, PlanError},
    planning::PlanningEngine,
    storage::{GoalBook, JsonStorage, StorageBackend},
    utils::{
        clock::{Clock, SystemClock},
        paths,
    },
};

use super::{commands, output, registry::CommandRegistry, shell::parse_command_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] PlanError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

/// State shared by every shell command: configuration, the loaded goal book,
/// and where both are persisted.
pub struct ShellContext {
    pub registry: CommandRegistry,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub book: GoalBook,
    pub running: bool,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
}

impl ShellContext {
    /// Opens the default data directory (`GOAL_PLANNER_HOME` or `~/.goal_planner`).
    pub fn new() -> Result<Self, CliError> {
        let base = paths::app_data_dir();
        let config_manager = ConfigManager::with_base_dir(&base);
        let config = config_manager.load()?;
        let storage = JsonStorage::new(Some(config.data_root(&base)), None)?;
        Self::with_parts(
            config_manager,
            config,
            Box::new(storage),
            Box::new(SystemClock),
        )
    }

    pub fn with_parts(
        config_manager: ConfigManager,
        config: Config,
        storage: Box<dyn StorageBackend>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let book = storage.load()?;
        debug!(goals = book.goals.len(), "goal book loaded");
        Ok(Self {
            registry: commands::build_registry(),
            config_manager,
            config,
            book,
            running: true,
            storage,
            clock,
        })
    }

    pub fn prompt(&self) -> String {
        format!("goals({})> ", self.book.goals.len())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn engine(&self) -> Result<PlanningEngine, CommandError> {
        Ok(self.config.engine()?)
    }

    pub fn persist_book(&self) -> CommandResult {
        self.storage.save(&self.book)?;
        Ok(())
    }

    pub fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        match self.registry.handler(command) {
            Some(handler) => match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            },
            None => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        }
    }

    /// Tokenizes and runs one input line.
    pub fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some((raw, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        let control = self.dispatch(&command, raw, &args)?;
        if control == LoopControl::Exit {
            self.running = false;
        }
        Ok(control)
    }

    fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.registry.suggest(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Io(err) => Err(err.into()),
            other => {
                output::error(other);
                Ok(())
            }
        }
    }
}
