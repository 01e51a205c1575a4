use crate::cli::core::{parse_date, parse_month, short_id, CommandError, CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::core::{services::SummaryService, Command};
use crate::ledger::{MonthKey, Payment};

use super::student::resolve_student;
use super::{Arg, CommandDefinition};

const PAY_USAGE: &str = "pay <student-id> [YYYY-MM] [paid-on YYYY-MM-DD]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "payments",
            "Show a month's tuition or one student's history",
            "payments [YYYY-MM | student-id]",
            cmd_payments,
        )
        .with_args(&[Arg::MonthOrStudent]),
        CommandDefinition::new("pay", "Record a tuition payment", PAY_USAGE, cmd_pay)
            .with_args(&[Arg::Student, Arg::Month]),
    ]
}

fn cmd_payments(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        None => show_month(context, MonthKey::of(context.today())),
        Some(arg) => match parse_month(arg) {
            Ok(month) => show_month(context, month),
            Err(_) => show_history(context, arg),
        },
    }
}

fn show_month(context: &ShellContext, month: MonthKey) -> CommandResult {
    let revenue = SummaryService::revenue_by_month(&context.manager.snapshot().payments, month);
    output::section(format!("Tuition for {month}"));
    output::table(&PAYMENT_HEADERS, &payment_rows(context, &revenue.payments));
    output::info(format!(
        "{} total: {} paid, {} pending, {} overdue",
        revenue.total(),
        revenue.paid,
        revenue.pending,
        revenue.overdue
    ));
    Ok(())
}

fn show_history(context: &ShellContext, input: &str) -> CommandResult {
    let id = resolve_student(context, input)?;
    let history = SummaryService::payment_history(&context.manager.snapshot().payments, &id);
    output::section(format!("Payment history for {}", short_id(&id)));
    output::table(&PAYMENT_HEADERS, &payment_rows(context, &history));
    Ok(())
}

const PAYMENT_HEADERS: [&str; 6] = ["Student", "Month", "Amount", "Due", "Paid on", "Status"];

fn payment_rows(context: &ShellContext, payments: &[&Payment]) -> Vec<Vec<String>> {
    payments
        .iter()
        .map(|payment| {
            vec![
                payment.student_name.clone(),
                MonthKey::of(payment.due_date).to_string(),
                context.money(payment.amount),
                payment.due_date.to_string(),
                payment
                    .payment_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".into()),
                payment.status.to_string(),
            ]
        })
        .collect()
}

fn cmd_pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = args
        .first()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {PAY_USAGE}")))?;
    let student_id = resolve_student(context, target)?;
    let month = match args.get(1) {
        Some(month) => parse_month(month)?,
        None => MonthKey::of(context.today()),
    };
    let date = args.get(2).map(|date| parse_date(date)).transpose()?;

    let id = Payment::obligation_id(&student_id, month);
    context.apply(Command::MarkPaymentPaid { id, date })?;
    io::print_success(format!("Tuition for {month} marked as paid."));
    Ok(())
}
