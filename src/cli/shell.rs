//! Line sources for the shell and tab completion over the billing ledger.

use std::{
    borrow::Cow,
    collections::BTreeSet,
    fmt,
    io::{self, BufRead},
};

use chrono::NaiveDate;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::commands::{Arg, CommandRegistry};
use crate::cli::core::{short_id, CliError, CliMode, LoopControl, ShellContext};
use crate::cli::io as cli_io;
use crate::ledger::{ExpenseCategory, MonthKey, Snapshot};

/// Reads commands from stdin instead of an interactive editor when set.
pub const SCRIPT_ENV: &str = "TUITION_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => run_session(&mut context, &mut EditorSource::new()?),
        CliMode::Script => run_session(&mut context, &mut ScriptSource::stdin()),
    }
}

/// Where the shell's command lines come from.
trait LineSource {
    /// Next line to run, or `None` once the session should end.
    fn next_line(&mut self, context: &ShellContext) -> Result<Option<String>, CliError>;
}

fn run_session(context: &mut ShellContext, source: &mut dyn LineSource) -> Result<(), CliError> {
    while context.running {
        let Some(line) = source.next_line(context)? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => context.running = false,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

struct ScriptSource<R> {
    lines: io::Lines<R>,
}

impl ScriptSource<io::StdinLock<'static>> {
    fn stdin() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn next_line(&mut self, _context: &ShellContext) -> Result<Option<String>, CliError> {
        Ok(self.lines.next().transpose()?)
    }
}

struct EditorSource {
    editor: Editor<LedgerHelper, DefaultHistory>,
}

impl EditorSource {
    fn new() -> Result<Self, CliError> {
        let mut editor = Editor::<LedgerHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(LedgerHelper::default()));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn next_line(&mut self, context: &ShellContext) -> Result<Option<String>, CliError> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.index = CompletionIndex::build(
                &context.registry,
                context.manager.snapshot(),
                context.today(),
            );
        }
        match self.editor.readline(&context.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.trim()).ok();
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    Ok(None)
                } else {
                    Ok(Some(String::new()))
                }
            }
            Err(ReadlineError::Eof) => {
                cli_io::print_info("Exiting shell.");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Completion candidates captured from the ledger before each prompt.
#[derive(Default)]
struct CompletionIndex {
    commands: Vec<(&'static str, &'static [Arg], &'static str)>,
    students: Vec<Pair>,
    expenses: Vec<Pair>,
    /// `YYYY-MM`, newest first.
    months: Vec<String>,
}

impl CompletionIndex {
    fn build(registry: &CommandRegistry, snapshot: &Snapshot, today: NaiveDate) -> Self {
        let mut commands: Vec<_> = registry
            .iter()
            .map(|command| (command.name, command.args, command.usage))
            .collect();
        commands.sort_by_key(|(name, _, _)| *name);

        let students = snapshot
            .students()
            .map(|student| labelled(&student.id, &student.full_name))
            .collect();
        let expenses = snapshot
            .expenses
            .iter()
            .map(|expense| labelled(&expense.id, &expense.description))
            .collect();
        let months: BTreeSet<MonthKey> = snapshot
            .payments
            .iter()
            .map(|payment| MonthKey::of(payment.due_date))
            .chain([MonthKey::of(today)])
            .collect();

        Self {
            commands,
            students,
            expenses,
            months: months.iter().rev().map(MonthKey::to_string).collect(),
        }
    }

    fn candidates(&self, line: &str) -> Vec<Pair> {
        let (before, needle) = match line.rfind(char::is_whitespace) {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => ("", line),
        };
        let mut words = before.split_whitespace();
        let Some(command) = words.next() else {
            let needle = needle.to_ascii_lowercase();
            return self
                .commands
                .iter()
                .filter(|(name, _, _)| name.starts_with(&needle))
                .map(|(name, _, _)| plain(name))
                .collect();
        };
        if needle.starts_with("--") {
            return Vec::new();
        }

        let command = command.to_ascii_lowercase();
        let Some((_, args, _)) = self.commands.iter().find(|(name, _, _)| *name == command)
        else {
            return Vec::new();
        };
        if words.clone().any(|word| word.starts_with("--")) {
            return Vec::new();
        }
        let Some(arg) = args.get(words.count()) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        match arg {
            Arg::Student => found.extend(matching(&self.students, needle)),
            Arg::Expense => found.extend(matching(&self.expenses, needle)),
            Arg::Month => found.extend(self.month_pairs(needle)),
            Arg::MonthOrStudent => {
                found.extend(self.month_pairs(needle));
                found.extend(matching(&self.students, needle));
            }
            Arg::Category => found.extend(
                ExpenseCategory::ALL
                    .iter()
                    .map(|category| category.slug())
                    .filter(|slug| slug.starts_with(needle))
                    .map(plain),
            ),
            Arg::Command => found.extend(
                self.commands
                    .iter()
                    .filter(|(name, _, _)| name.starts_with(needle))
                    .map(|(name, _, _)| plain(name)),
            ),
            Arg::Choice(options) => found.extend(
                options
                    .iter()
                    .filter(|option| option.starts_with(needle))
                    .map(|option| plain(option)),
            ),
        }
        found
    }

    fn month_pairs<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = Pair> + 'a {
        self.months
            .iter()
            .filter(move |month| month.starts_with(needle))
            .map(|month| plain(month))
    }

    /// Remaining usage after a bare command name, shown as a hint.
    fn usage_hint(&self, line: &str) -> Option<String> {
        let command = line.strip_suffix(' ')?;
        let (name, _, usage) = self.commands.iter().find(|(name, _, _)| *name == command)?;
        usage
            .strip_prefix(name)
            .map(|rest| rest.trim_start().to_string())
            .filter(|rest| !rest.is_empty())
    }
}

fn labelled(id: &str, label: &str) -> Pair {
    let short = short_id(id);
    Pair {
        display: format!("{short}  {label}"),
        replacement: short,
    }
}

fn plain(value: &str) -> Pair {
    Pair {
        display: value.to_string(),
        replacement: value.to_string(),
    }
}

fn matching<'a>(pairs: &'a [Pair], needle: &'a str) -> impl Iterator<Item = Pair> + 'a {
    let needle = needle.to_ascii_lowercase();
    pairs
        .iter()
        .filter(move |pair| pair.replacement.starts_with(&needle))
        .map(|pair| Pair {
            display: pair.display.clone(),
            replacement: pair.replacement.clone(),
        })
}

#[derive(Default)]
struct LedgerHelper {
    index: CompletionIndex,
}

impl Helper for LedgerHelper {}

impl Completer for LedgerHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let start = line.rfind(char::is_whitespace).map_or(0, |idx| idx + 1);
        Ok((start, self.index.candidates(line)))
    }
}

impl Hinter for LedgerHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        (pos == line.len()).then(|| self.index.usage_hint(line)).flatten()
    }
}

impl Highlighter for LedgerHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

impl Validator for LedgerHelper {}

/// Splits a command line into words, honouring shell-style quotes.
pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::all_groups;
    use crate::core::services::StudentService;
    use crate::ledger::{BillingStatus, Expense, Guardian, Payment, StudentDraft};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger() -> (Snapshot, String) {
        let mut snapshot = Snapshot::default();
        let id = StudentService::register(
            &mut snapshot,
            StudentDraft::new("Lucas Almeida", dec!(250), 10),
            Guardian::new("Fernanda Almeida"),
            Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
            10,
        )
        .unwrap();
        snapshot.payments.push(Payment {
            id: Payment::obligation_id(&id, MonthKey::new(2024, 1).unwrap()),
            student_id: id.clone(),
            student_name: "Lucas Almeida".into(),
            amount: dec!(250),
            due_date: date(2024, 1, 10),
            payment_date: None,
            status: BillingStatus::Overdue,
        });
        snapshot.expenses.push(Expense {
            id: "e1f2a3b4-0000".into(),
            description: "Light bill".into(),
            amount: dec!(180),
            category: ExpenseCategory::Utilities,
            due_date: date(2024, 3, 20),
            payment_date: None,
            status: BillingStatus::Pending,
        });
        (snapshot, id)
    }

    fn index() -> (CompletionIndex, String) {
        let (snapshot, id) = ledger();
        let registry = CommandRegistry::new(all_groups());
        (
            CompletionIndex::build(&registry, &snapshot, date(2024, 3, 15)),
            id,
        )
    }

    fn replacements(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|pair| pair.replacement).collect()
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"register "Lucas Almeida" 250 10"#).unwrap();
        assert_eq!(tokens, vec!["register", "Lucas Almeida", "250", "10"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line(r#"register "Lucas"#).is_err());
    }

    #[test]
    fn completion_lists_matching_commands() {
        let (index, _) = index();
        assert_eq!(replacements(index.candidates("pa")), vec!["pay", "payments"]);
    }

    #[test]
    fn student_and_month_arguments_complete_from_the_ledger() {
        let (index, id) = index();
        let short = short_id(&id);

        let students = index.candidates(&format!("pay {}", &short[..2]));
        assert_eq!(replacements(students), vec![short.clone()]);

        let months = index.candidates(&format!("pay {short} 2024-"));
        assert_eq!(replacements(months), vec!["2024-03", "2024-01"]);

        let mixed = replacements(index.candidates("payments "));
        assert_eq!(mixed, vec!["2024-03".to_string(), "2024-01".to_string(), short]);
    }

    #[test]
    fn expense_ids_and_categories_complete_after_subcommands() {
        let (index, _) = index();
        assert_eq!(replacements(index.candidates("expense pay e1")), vec!["e1f2a3b4"]);
        assert_eq!(replacements(index.candidates("expense p")), vec!["pay"]);
        assert_eq!(
            replacements(index.candidates("budget set soft")),
            vec!["software_subscriptions"]
        );
        assert!(index.candidates("register --guardian F").is_empty());
        assert!(index.candidates("summary x").is_empty());
    }

    #[test]
    fn bare_command_hints_its_arguments() {
        let (index, _) = index();
        assert_eq!(
            index.usage_hint("pay ").as_deref(),
            Some("<student-id> [YYYY-MM] [paid-on YYYY-MM-DD]")
        );
        assert_eq!(index.usage_hint("summary "), None);
        assert_eq!(index.usage_hint("pay"), None);
    }

    #[test]
    fn script_lines_are_read_until_eof() {
        let input = io::Cursor::new("students\n# note\nsummary\n");
        let mut source = ScriptSource {
            lines: input.lines(),
        };
        let dir = tempfile::tempdir().unwrap();
        let context = crate::cli::core::process_script(dir.path(), date(2024, 3, 15), &[]).unwrap();
        let mut seen = Vec::new();
        while let Some(line) = source.next_line(&context).unwrap() {
            seen.push(line);
        }
        assert_eq!(seen, vec!["students", "# note", "summary"]);
    }
}
