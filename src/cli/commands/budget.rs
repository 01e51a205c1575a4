use crate::cli::core::{parse_amount, parse_month, CommandError, CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::core::{
    services::{BudgetService, BudgetVariance},
    Command,
};
use crate::ledger::MonthKey;

use super::expense::parse_category;
use super::{Arg, CommandDefinition};

const BUDGET_USAGE: &str = "budget set <category> <amount> | budget show [YYYY-MM]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "budget",
        "Set category ceilings or compare them with spend",
        BUDGET_USAGE,
        cmd_budget,
    )
    .with_args(&[Arg::Choice(&["set", "show"]), Arg::Category])]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = || CommandError::InvalidArguments(format!("usage: {BUDGET_USAGE}"));
    match args {
        ["set", category, amount] => {
            let category = parse_category(category)?;
            let amount = parse_amount(amount)?;
            let budgets = context.manager.snapshot().budgets.with(category, amount);
            context.apply(Command::SetBudgets(budgets))?;
            io::print_success(format!(
                "{} budget set to {}.",
                category.label(),
                context.money(amount)
            ));
            Ok(())
        }
        ["show"] => show(context, MonthKey::of(context.today())),
        ["show", month] => show(context, parse_month(month)?),
        _ => Err(usage()),
    }
}

fn show(context: &ShellContext, month: MonthKey) -> CommandResult {
    let snapshot = context.manager.snapshot();
    let report = BudgetService::budget_report(&snapshot.budgets, &snapshot.expenses, month);
    let rows: Vec<Vec<String>> = report.iter().map(|row| variance_row(context, row)).collect();
    output::section(format!("Budget for {month}"));
    output::table(
        &["Category", "Budgeted", "Actual", "Remaining", "Used"],
        &rows,
    );
    let over: Vec<&str> = report
        .iter()
        .filter(|row| row.is_over_budget())
        .map(|row| row.category.label())
        .collect();
    if !over.is_empty() {
        io::print_warning(format!("Over budget: {}", over.join(", ")));
    }
    Ok(())
}

fn variance_row(context: &ShellContext, row: &BudgetVariance) -> Vec<String> {
    vec![
        row.category.label().to_string(),
        context.money(row.budgeted),
        context.money(row.actual),
        context.money(row.diff),
        format!("{:.1}%", row.percent),
    ]
}
