//! Shell context, dispatch and argument helpers shared by every command.

use std::{collections::HashMap, env, io, path::Path, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use strsim::levenshtein;

use crate::{
    config::{Config, ConfigManager},
    core::{
        utils::{app_data_dir, collections_dir_in},
        BillingManager, Command, CommitReport,
    },
    errors::LedgerError,
    ledger::{BillingStatus, Clock, FixedClock, MonthKey, SystemClock},
    storage::JsonStorage,
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::io as cli_io;

/// Pins the reference day of the shell, formatted `YYYY-MM-DD`.
pub const TODAY_ENV: &str = "TUITION_CORE_TODAY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// State carried across commands of one shell session.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) manager: BillingManager,
    pub(crate) config: Config,
    pub(crate) registry: CommandRegistry,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, &app_data_dir(), clock_from_env()?)
    }

    /// Opens the data stored under `base` using `clock` as the reference.
    pub fn with_base_dir(
        mode: CliMode,
        base: &Path,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let config = ConfigManager::with_base_dir(base).load()?;
        let storage = JsonStorage::new(collections_dir_in(base))?;
        let manager = BillingManager::open(Box::new(storage), clock)?
            .with_default_due_day(config.default_due_day);
        Ok(Self {
            mode,
            manager,
            config,
            registry: CommandRegistry::new(commands::all_groups()),
            running: true,
        })
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    /// Shows the reference day and, when any exist, the overdue tuition count.
    pub(crate) fn prompt(&self) -> String {
        let overdue = self
            .manager
            .snapshot()
            .payments
            .iter()
            .filter(|payment| payment.status == BillingStatus::Overdue)
            .count();
        match overdue {
            0 => format!("tuition {}> ", self.today()),
            count => format!("tuition {} ({count} overdue)> ", self.today()),
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.manager.today()
    }

    pub(crate) fn money(&self, amount: Decimal) -> String {
        cli_io::format_money(amount, &self.config.currency)
    }

    /// Applies a command and reports what was persisted.
    pub(crate) fn apply(&mut self, command: Command) -> Result<CommitReport, CommandError> {
        let report = self.manager.apply(command)?;
        if report.generated > 0 {
            cli_io::print_info(format!(
                "{} new tuition obligation(s) generated.",
                report.generated
            ));
        }
        Ok(report)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, input), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    /// Asks before a destructive action; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(cli_io::confirm_action("Exit shell?", true)?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Io(err) => Err(err.into()),
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = crate::cli::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }
}

fn clock_from_env() -> Result<Box<dyn Clock>, CliError> {
    match env::var(TODAY_ENV) {
        Ok(value) => {
            let day = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::Input(format!("{TODAY_ENV} must be YYYY-MM-DD, got `{value}`"))
            })?;
            Ok(Box::new(FixedClock::on(day)))
        }
        Err(_) => Ok(Box::new(SystemClock)),
    }
}

/// Positional arguments plus `--flag value` pairs.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    flags: HashMap<&'a str, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(args: &[&'a str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("flag `--{name}` needs a value"))
                })?;
                parsed.flags.insert(name, value);
            } else {
                parsed.positional.push(arg);
            }
        }
        Ok(parsed)
    }

    pub fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags.get(name).copied()
    }

    pub fn positional(&self, idx: usize) -> Option<&'a str> {
        self.positional.get(idx).copied()
    }

    pub fn require(&self, idx: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional(idx)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_month(input: &str) -> Result<MonthKey, CommandError> {
    MonthKey::from_str(input).map_err(|err| CommandError::InvalidArguments(err.to_string()))
}

pub(crate) fn parse_amount(input: &str) -> Result<Decimal, CommandError> {
    let amount = Decimal::from_str(input.trim()).map_err(|_| {
        CommandError::InvalidArguments(format!("invalid amount `{}`", input))
    })?;
    if amount.is_sign_negative() {
        return Err(CommandError::InvalidArguments(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(amount)
}

pub(crate) fn parse_due_day(input: &str) -> Result<u32, CommandError> {
    input
        .parse::<u32>()
        .ok()
        .filter(|day| (1..=31).contains(day))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("due day must be 1-31, got `{}`", input))
        })
}

/// Resolves a full id or a unique prefix of one.
pub(crate) fn resolve_id<'a>(
    kind: &'static str,
    candidates: impl IntoIterator<Item = &'a str>,
    input: &str,
) -> Result<String, CommandError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "{kind} id must not be empty"
        )));
    }
    let mut matches = Vec::new();
    for id in candidates {
        if id == input {
            return Ok(id.to_string());
        }
        if id.starts_with(input) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [single] => Ok(single.to_string()),
        [] => Err(LedgerError::not_found(kind, input).into()),
        _ => Err(CommandError::InvalidArguments(format!(
            "{kind} id `{input}` is ambiguous ({} matches)",
            matches.len()
        ))),
    }
}

pub(crate) fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
pub(crate) fn process_script(
    base: &Path,
    today: NaiveDate,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_base_dir(CliMode::Script, base, Box::new(FixedClock::on(today)))?;
    for line in lines {
        match app.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(app)
}
