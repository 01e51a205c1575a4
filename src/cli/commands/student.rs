use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::cli::core::{
    parse_amount, parse_date, parse_due_day, resolve_id, short_id, CommandError, CommandResult,
    ParsedArgs, ShellContext,
};
use crate::cli::{io, output};
use crate::core::{
    services::{RosterFilter, StudentService},
    Command,
};
use crate::ledger::{Guardian, Registration, StudentDraft, StudentStatus};
use crate::utils::persistence::read_json;

use super::{Arg, CommandDefinition};

const REGISTER_USAGE: &str = "register <name> <fee> [due-day] --guardian NAME [--relationship R] \
[--phone P] [--email E] [--address A] [--document D] [--grade G] [--subjects a,b] \
[--difficulties TEXT] [--birth YYYY-MM-DD]";
const UPDATE_USAGE: &str = "update <student-id> [--name N] [--fee F] [--due-day D] \
[--guardian NAME] [--phone P] [--email E] [--grade G] [--subjects a,b]";
const STATUS_USAGE: &str = "status <student-id> <active|inactive>";
const STUDENTS_USAGE: &str = "students [active|inactive|all] [--search NAME]";
const IMPORT_USAGE: &str = "import <registrations.json>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "students",
            "List registered students",
            STUDENTS_USAGE,
            cmd_students,
        )
        .with_args(&[Arg::Choice(&["active", "inactive", "all"])]),
        CommandDefinition::new("register", "Register a new student", REGISTER_USAGE, cmd_register),
        CommandDefinition::new("update", "Edit a student's registration", UPDATE_USAGE, cmd_update)
            .with_args(&[Arg::Student]),
        CommandDefinition::new(
            "status",
            "Activate or archive a student",
            STATUS_USAGE,
            cmd_status,
        )
        .with_args(&[Arg::Student, Arg::Choice(&["active", "inactive"])]),
        CommandDefinition::new(
            "import",
            "Register every student listed in a JSON file",
            IMPORT_USAGE,
            cmd_import,
        ),
    ]
}

/// One row of an import file; unknown keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRow {
    full_name: String,
    monthly_fee: Decimal,
    #[serde(default)]
    payment_due_day: u32,
    #[serde(default)]
    birth_date: Option<NaiveDate>,
    #[serde(default)]
    school_grade: String,
    #[serde(default)]
    subjects_of_interest: Vec<String>,
    #[serde(default)]
    learning_difficulties: String,
    guardian: Guardian,
}

impl ImportRow {
    fn into_pair(self) -> (StudentDraft, Guardian) {
        let draft = StudentDraft {
            full_name: self.full_name,
            birth_date: self.birth_date,
            school_grade: self.school_grade,
            subjects_of_interest: self.subjects_of_interest,
            learning_difficulties: self.learning_difficulties,
            monthly_fee: self.monthly_fee,
            payment_due_day: self.payment_due_day,
        };
        (draft, self.guardian)
    }
}

fn cmd_students(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let status = match parsed.positional(0).map(str::to_lowercase).as_deref() {
        None | Some("all") => None,
        Some(value) => Some(parse_student_status(value)?),
    };
    let filter = RosterFilter {
        status,
        search: parsed.flag("search").map(str::to_string),
    };
    let rows: Vec<Vec<String>> =
        StudentService::search(&context.manager.snapshot().registrations, &filter)
            .into_iter()
            .map(|reg| {
                vec![
                    short_id(&reg.student.id),
                    reg.student.full_name.clone(),
                    context.money(reg.student.monthly_fee),
                    reg.student.payment_due_day.to_string(),
                    reg.student.status.to_string(),
                    reg.guardian.full_name.clone(),
                ]
            })
            .collect();
    output::section("Students");
    output::table(&["Id", "Name", "Fee", "Due", "Status", "Guardian"], &rows);
    Ok(())
}

fn cmd_register(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let name = parsed.require(0, REGISTER_USAGE)?;
    let fee = parse_amount(parsed.require(1, REGISTER_USAGE)?)?;
    let due_day = match parsed.positional(2) {
        Some(day) => parse_due_day(day)?,
        None => 0,
    };

    let mut draft = StudentDraft::new(name, fee, due_day);
    apply_student_flags(&mut draft, &parsed)?;
    let mut guardian = Guardian::new(parsed.flag("guardian").unwrap_or_default());
    apply_guardian_flags(&mut guardian, &parsed);

    let report = context.apply(Command::RegisterStudent { draft, guardian })?;
    let id = report.created.first().cloned().unwrap_or_default();
    io::print_success(format!("Registered {} ({}).", name, short_id(&id)));
    Ok(())
}

fn cmd_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let id = resolve_student(context, parsed.require(0, UPDATE_USAGE)?)?;
    let Registration { student, guardian } = context
        .manager
        .snapshot()
        .registration(&id)
        .cloned()
        .ok_or_else(|| CommandError::InvalidArguments(format!("student `{id}` vanished")))?;

    let mut draft = StudentDraft {
        full_name: parsed.flag("name").map(str::to_string).unwrap_or(student.full_name),
        birth_date: student.birth_date,
        school_grade: student.school_grade,
        subjects_of_interest: student.subjects_of_interest,
        learning_difficulties: student.learning_difficulties,
        monthly_fee: match parsed.flag("fee") {
            Some(fee) => parse_amount(fee)?,
            None => student.monthly_fee,
        },
        payment_due_day: match parsed.flag("due-day") {
            Some(day) => parse_due_day(day)?,
            None => student.payment_due_day,
        },
    };
    apply_student_flags(&mut draft, &parsed)?;
    let mut guardian = guardian;
    if let Some(name) = parsed.flag("guardian") {
        guardian.full_name = name.to_string();
    }
    apply_guardian_flags(&mut guardian, &parsed);

    context.apply(Command::UpdateRegistration {
        id: id.clone(),
        draft,
        guardian,
    })?;
    io::print_success(format!("Updated student {}.", short_id(&id)));
    Ok(())
}

fn cmd_status(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [target, status] = args else {
        return Err(CommandError::InvalidArguments(format!("usage: {STATUS_USAGE}")));
    };
    let id = resolve_student(context, target)?;
    let status = parse_student_status(&status.to_lowercase())?;
    context.apply(Command::ChangeStudentStatus {
        id: id.clone(),
        status,
    })?;
    io::print_success(format!("Student {} is now {}.", short_id(&id), status));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [file] = args else {
        return Err(CommandError::InvalidArguments(format!("usage: {IMPORT_USAGE}")));
    };
    let rows: Vec<ImportRow> = read_json(Path::new(file))?.ok_or_else(|| {
        CommandError::InvalidArguments(format!("import file `{file}` does not exist"))
    })?;
    if rows.is_empty() {
        io::print_info("Import file lists no students.");
        return Ok(());
    }
    let pairs = rows.into_iter().map(ImportRow::into_pair).collect();
    let report = context.apply(Command::ImportRegistrations(pairs))?;
    io::print_success(format!("Imported {} student(s).", report.created.len()));
    Ok(())
}

pub(crate) fn resolve_student(context: &ShellContext, input: &str) -> Result<String, CommandError> {
    let snapshot = context.manager.snapshot();
    resolve_id("Student", snapshot.students().map(|s| s.id.as_str()), input)
}

fn parse_student_status(value: &str) -> Result<StudentStatus, CommandError> {
    match value {
        "active" => Ok(StudentStatus::Active),
        "inactive" | "archived" => Ok(StudentStatus::Inactive),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown student status `{other}` (use active or inactive)"
        ))),
    }
}

fn apply_student_flags(draft: &mut StudentDraft, parsed: &ParsedArgs<'_>) -> CommandResult {
    if let Some(grade) = parsed.flag("grade") {
        draft.school_grade = grade.to_string();
    }
    if let Some(subjects) = parsed.flag("subjects") {
        draft.subjects_of_interest = subjects
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(notes) = parsed.flag("difficulties") {
        draft.learning_difficulties = notes.to_string();
    }
    if let Some(birth) = parsed.flag("birth") {
        draft.birth_date = Some(parse_date(birth)?);
    }
    Ok(())
}

fn apply_guardian_flags(guardian: &mut Guardian, parsed: &ParsedArgs<'_>) {
    let fields: [(&str, &mut String); 5] = [
        ("relationship", &mut guardian.relationship),
        ("phone", &mut guardian.phone),
        ("email", &mut guardian.email),
        ("address", &mut guardian.address),
        ("document", &mut guardian.document_id),
    ];
    for (flag, field) in fields {
        if let Some(value) = parsed.flag(flag) {
            *field = value.to_string();
        }
    }
}
