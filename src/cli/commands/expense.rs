use std::str::FromStr;

use crate::cli::core::{
    parse_amount, parse_date, resolve_id, short_id, CommandError, CommandResult, ParsedArgs,
    ShellContext,
};
use crate::cli::{io, output};
use crate::core::{
    services::{ExpenseFilter, SummaryService},
    Command,
};
use crate::ledger::{BillingStatus, ExpenseCategory, ExpenseDraft};

use super::{Arg, CommandDefinition};

const EXPENSES_USAGE: &str =
    "expenses [pending|overdue|paid|all] [--search TEXT] [--from YYYY-MM-DD] [--to YYYY-MM-DD]";
const EXPENSE_USAGE: &str = "expense add <description> <amount> <category> <due YYYY-MM-DD> | \
expense edit <id> <description> <amount> <category> <due YYYY-MM-DD> | \
expense delete <id> | expense pay <id> [paid-on YYYY-MM-DD]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "expenses",
            "List accounts payable",
            EXPENSES_USAGE,
            cmd_expenses,
        )
        .with_args(&[Arg::Choice(&["pending", "overdue", "paid", "all"])]),
        CommandDefinition::new(
            "expense",
            "Add, edit, delete or pay an expense",
            EXPENSE_USAGE,
            cmd_expense,
        )
        .with_args(&[Arg::Choice(&["add", "edit", "delete", "pay"]), Arg::Expense]),
    ]
}

fn cmd_expenses(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let status = match parsed.positional(0).map(str::to_lowercase).as_deref() {
        None | Some("all") => None,
        Some(value) => Some(parse_billing_status(value)?),
    };
    let filter = ExpenseFilter {
        status,
        search: parsed.flag("search").map(str::to_string),
        due_from: parsed.flag("from").map(parse_date).transpose()?,
        due_to: parsed.flag("to").map(parse_date).transpose()?,
    };

    let expenses = SummaryService::filter_expenses(&context.manager.snapshot().expenses, &filter);
    let rows: Vec<Vec<String>> = expenses
        .iter()
        .map(|expense| {
            vec![
                short_id(&expense.id),
                expense.description.clone(),
                expense.category.label().to_string(),
                context.money(expense.amount),
                expense.due_date.to_string(),
                expense.status.to_string(),
            ]
        })
        .collect();
    output::section("Expenses");
    output::table(
        &["Id", "Description", "Category", "Amount", "Due", "Status"],
        &rows,
    );
    Ok(())
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = || CommandError::InvalidArguments(format!("usage: {EXPENSE_USAGE}"));
    let (action, rest) = args.split_first().ok_or_else(usage)?;
    match action.to_lowercase().as_str() {
        "add" => {
            let [description, amount, category, due] = rest else {
                return Err(usage());
            };
            let draft = parse_draft(description, amount, category, due)?;
            let report = context.apply(Command::CreateExpense(draft))?;
            let id = report.created.first().cloned().unwrap_or_default();
            io::print_success(format!("Expense {} created.", short_id(&id)));
        }
        "edit" => {
            let [target, description, amount, category, due] = rest else {
                return Err(usage());
            };
            let id = resolve_expense(context, target)?;
            let draft = parse_draft(description, amount, category, due)?;
            context.apply(Command::UpdateExpense {
                id: id.clone(),
                draft,
            })?;
            io::print_success(format!("Expense {} updated.", short_id(&id)));
        }
        "delete" => {
            let [target] = rest else {
                return Err(usage());
            };
            let id = resolve_expense(context, target)?;
            if !context.confirm(&format!("Delete expense {}?", short_id(&id)))? {
                io::print_info("Nothing deleted.");
                return Ok(());
            }
            context.apply(Command::DeleteExpense { id: id.clone() })?;
            io::print_success(format!("Expense {} deleted.", short_id(&id)));
        }
        "pay" => {
            let target = rest.first().ok_or_else(usage)?;
            let id = resolve_expense(context, target)?;
            let date = rest.get(1).map(|date| parse_date(date)).transpose()?;
            context.apply(Command::MarkExpensePaid {
                id: id.clone(),
                date,
            })?;
            io::print_success(format!("Expense {} marked as paid.", short_id(&id)));
        }
        _ => return Err(usage()),
    }
    Ok(())
}

fn resolve_expense(context: &ShellContext, input: &str) -> Result<String, CommandError> {
    let snapshot = context.manager.snapshot();
    resolve_id(
        "Expense",
        snapshot.expenses.iter().map(|e| e.id.as_str()),
        input,
    )
}

fn parse_draft(
    description: &str,
    amount: &str,
    category: &str,
    due: &str,
) -> Result<ExpenseDraft, CommandError> {
    Ok(ExpenseDraft::new(
        description,
        parse_amount(amount)?,
        parse_category(category)?,
        parse_date(due)?,
    ))
}

pub(crate) fn parse_category(input: &str) -> Result<ExpenseCategory, CommandError> {
    ExpenseCategory::from_str(input).map_err(|err| {
        let known: Vec<&str> = ExpenseCategory::ALL.iter().map(|c| c.slug()).collect();
        CommandError::InvalidArguments(format!("{err} (known: {})", known.join(", ")))
    })
}

fn parse_billing_status(value: &str) -> Result<BillingStatus, CommandError> {
    match value {
        "pending" => Ok(BillingStatus::Pending),
        "overdue" => Ok(BillingStatus::Overdue),
        "paid" => Ok(BillingStatus::Paid),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown status `{other}` (use pending, overdue, paid or all)"
        ))),
    }
}
