use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::utils::build_info;

use super::{Arg, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new("help", "Show available commands", "help [command]", cmd_help)
            .with_args(&[Arg::Command]),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::info(build_info::current().summary());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.command(&name) {
            Some(command) => {
                output::section(command.name);
                output::info(command.description);
                output::info(format!("usage: {}", command.usage));
            }
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }

    for group in context.registry.groups() {
        output::section(group.title);
        let rows: Vec<Vec<String>> = group
            .commands
            .iter()
            .map(|command| vec![command.usage.to_string(), command.description.to_string()])
            .collect();
        output::table(&["Usage", "Description"], &rows);
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
