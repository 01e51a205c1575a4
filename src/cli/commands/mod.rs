pub mod budget;
pub mod expense;
pub mod payment;
pub mod student;
pub mod summary;
pub mod system;

use crate::cli::core::{CommandResult, ShellContext};

/// Every command, grouped the way `help` lists them.
pub(crate) fn all_groups() -> Vec<CommandGroup> {
    vec![
        CommandGroup::new("Roster", student::definitions()),
        CommandGroup::new("Tuition", payment::definitions()),
        CommandGroup::new("Accounts payable", expense::definitions()),
        CommandGroup::new("Budgets", budget::definitions()),
        CommandGroup::new("Reports", summary::definitions()),
        CommandGroup::new("Shell", system::definitions()),
    ]
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// What a positional argument refers to, so the shell can offer completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Student,
    Expense,
    Month,
    MonthOrStudent,
    Category,
    Command,
    Choice(&'static [&'static str]),
}

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
    /// One entry per leading positional argument.
    pub args: &'static [Arg],
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
            args: &[],
        }
    }

    pub const fn with_args(mut self, args: &'static [Arg]) -> Self {
        self.args = args;
        self
    }
}

pub struct CommandGroup {
    pub title: &'static str,
    pub commands: Vec<CommandDefinition>,
}

impl CommandGroup {
    pub fn new(title: &'static str, commands: Vec<CommandDefinition>) -> Self {
        Self { title, commands }
    }
}

pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
}

impl CommandRegistry {
    pub fn new(groups: Vec<CommandGroup>) -> Self {
        Self { groups }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.iter().find(|command| command.name == name)
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.groups.iter().flat_map(|group| group.commands.iter())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(|command| command.name)
    }
}
