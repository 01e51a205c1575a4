use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::{io, output};
use crate::core::services::SummaryService;
use crate::ledger::MonthKey;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "summary",
            "Show this month's financial dashboard",
            "summary",
            cmd_summary,
        ),
        CommandDefinition::new(
            "refresh",
            "Re-run obligation generation and overdue checks",
            "refresh",
            cmd_refresh,
        ),
    ]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let dashboard = context.manager.dashboard(context.config.upcoming_window_days);
    let window = context.config.upcoming_window_days;

    output::section(format!("Dashboard {}", dashboard.month));
    let rows = vec![
        vec!["Revenue".to_string(), context.money(dashboard.revenue)],
        vec!["Expenses paid".to_string(), context.money(dashboard.expenses_paid)],
        vec!["Net profit".to_string(), context.money(dashboard.net_profit)],
        vec![
            "Projected revenue".to_string(),
            context.money(dashboard.projected_revenue),
        ],
        vec![
            "Pending revenue".to_string(),
            context.money(dashboard.pending_revenue),
        ],
        vec![
            format!("Upcoming payments ({window}d)"),
            format!(
                "{} ({})",
                dashboard.upcoming_payments.count,
                context.money(dashboard.upcoming_payments.amount)
            ),
        ],
        vec![
            "Overdue expenses".to_string(),
            format!(
                "{} ({})",
                dashboard.overdue_expenses.count,
                context.money(dashboard.overdue_expenses.amount)
            ),
        ],
        vec![
            format!("Expenses due soon ({window}d)"),
            format!(
                "{} ({})",
                dashboard.expenses_due_soon.count,
                context.money(dashboard.expenses_due_soon.amount)
            ),
        ],
    ];
    output::table(&["Figure", "Value"], &rows);

    if !dashboard.distribution.is_empty() {
        output::section("Spend by category");
        let rows: Vec<Vec<String>> = dashboard
            .distribution
            .iter()
            .map(|spend| {
                vec![
                    spend.category.label().to_string(),
                    context.money(spend.amount),
                    format!("{:.1}%", spend.percentage),
                ]
            })
            .collect();
        output::table(&["Category", "Amount", "Share"], &rows);
    }

    let month = MonthKey::of(context.today());
    let stats = SummaryService::student_stats(&context.manager.snapshot().registrations, month);
    output::section("Students");
    output::info(format!(
        "{} active, {} new this month, {} archived this month",
        stats.active, stats.new_this_month, stats.archived_this_month
    ));
    if !stats.subjects.is_empty() {
        let subjects: Vec<String> = stats
            .subjects
            .iter()
            .map(|(subject, count)| format!("{subject} ({count})"))
            .collect();
        output::info(format!("Subjects: {}", subjects.join(", ")));
    }
    Ok(())
}

fn cmd_refresh(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let report = context.manager.refresh()?;
    if report.is_noop() {
        io::print_info("Everything is up to date.");
    } else {
        io::print_success(format!(
            "{} obligation(s) generated, {} record(s) now overdue.",
            report.generated, report.escalated
        ));
    }
    Ok(())
}
