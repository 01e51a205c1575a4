use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    config::DEFAULT_DUE_DAY,
    core::{
        engine::evaluate,
        services::{
            BudgetService, Dashboard, ExpenseService, PaymentService, StudentService,
            SummaryService,
        },
    },
    errors::Result,
    ledger::{Budgets, Clock, ExpenseDraft, Guardian, Snapshot, StudentDraft, StudentStatus},
    storage::{load_collection, save_collection, CollectionKey, CollectionStore},
};

/// A state-changing request against the billing snapshot.
#[derive(Debug, Clone)]
pub enum Command {
    RegisterStudent {
        draft: StudentDraft,
        guardian: Guardian,
    },
    UpdateRegistration {
        id: String,
        draft: StudentDraft,
        guardian: Guardian,
    },
    ChangeStudentStatus {
        id: String,
        status: StudentStatus,
    },
    /// Registers a batch of validated pairs; nothing is added if any pair is invalid.
    ImportRegistrations(Vec<(StudentDraft, Guardian)>),
    CreateExpense(ExpenseDraft),
    UpdateExpense {
        id: String,
        draft: ExpenseDraft,
    },
    DeleteExpense {
        id: String,
    },
    /// Settles a payment; the date defaults to the clock's day.
    MarkPaymentPaid {
        id: String,
        date: Option<NaiveDate>,
    },
    MarkExpensePaid {
        id: String,
        date: Option<NaiveDate>,
    },
    SetBudgets(Budgets),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterStudent { .. } => "register_student",
            Command::UpdateRegistration { .. } => "update_registration",
            Command::ChangeStudentStatus { .. } => "change_student_status",
            Command::ImportRegistrations(_) => "import_registrations",
            Command::CreateExpense(_) => "create_expense",
            Command::UpdateExpense { .. } => "update_expense",
            Command::DeleteExpense { .. } => "delete_expense",
            Command::MarkPaymentPaid { .. } => "mark_payment_paid",
            Command::MarkExpensePaid { .. } => "mark_expense_paid",
            Command::SetBudgets(_) => "set_budgets",
        }
    }
}

/// Outcome of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Collections that differed from the last commit and were written.
    pub written: Vec<CollectionKey>,
    pub generated: usize,
    pub escalated: usize,
    /// Ids assigned by a creating command, in input order.
    pub created: Vec<String>,
}

impl CommitReport {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty()
    }
}

/// Owns the committed snapshot and keeps storage in step with it.
///
/// Every command and every refresh runs the evaluation pass against the
/// clock's current day, and only collections that actually changed are
/// written back.
pub struct BillingManager {
    committed: Snapshot,
    store: Box<dyn CollectionStore>,
    clock: Box<dyn Clock>,
    default_due_day: u32,
}

impl BillingManager {
    /// Loads all collections (defaults when absent) and commits an initial evaluation.
    pub fn open(store: Box<dyn CollectionStore>, clock: Box<dyn Clock>) -> Result<Self> {
        let committed = Snapshot {
            registrations: load_collection(store.as_ref(), CollectionKey::Registrations)?,
            payments: load_collection(store.as_ref(), CollectionKey::Payments)?,
            expenses: load_collection(store.as_ref(), CollectionKey::Expenses)?,
            budgets: load_collection(store.as_ref(), CollectionKey::Budgets)?,
        };
        info!(
            students = committed.registrations.len(),
            payments = committed.payments.len(),
            expenses = committed.expenses.len(),
            "billing snapshot loaded"
        );
        let mut manager = Self {
            committed,
            store,
            clock,
            default_due_day: DEFAULT_DUE_DAY,
        };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn with_default_due_day(mut self, due_day: u32) -> Self {
        self.default_due_day = due_day;
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.committed
    }

    /// Reference day for evaluations and reports.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Re-evaluates the committed snapshot without a command.
    pub fn refresh(&mut self) -> Result<CommitReport> {
        let next = self.committed.clone();
        self.commit(next)
    }

    /// Applies `command` to a copy of the snapshot, evaluates it and commits the result.
    ///
    /// A rejected command, or a commit whose writes fail, leaves both memory
    /// and storage as they were.
    pub fn apply(&mut self, command: Command) -> Result<CommitReport> {
        let name = command.name();
        let mut next = self.committed.clone();
        let created = match self.execute(&mut next, command) {
            Ok(created) => created,
            Err(err) => {
                warn!(command = name, error = %err, "command rejected");
                return Err(err);
            }
        };
        let mut report = self.commit(next)?;
        report.created = created;
        info!(
            command = name,
            written = report.written.len(),
            "command applied"
        );
        Ok(report)
    }

    pub fn dashboard(&self, window_days: u32) -> Dashboard {
        SummaryService::dashboard(&self.committed, self.today(), window_days)
    }

    fn execute(&self, snapshot: &mut Snapshot, command: Command) -> Result<Vec<String>> {
        let today = self.clock.today();
        match command {
            Command::RegisterStudent { draft, guardian } => StudentService::register(
                snapshot,
                draft,
                guardian,
                self.clock.now(),
                self.default_due_day,
            )
            .map(|id| vec![id]),
            Command::ImportRegistrations(rows) => {
                StudentService::import(snapshot, rows, self.clock.now(), self.default_due_day)
            }
            Command::UpdateRegistration {
                id,
                draft,
                guardian,
            } => StudentService::update(snapshot, &id, draft, guardian).map(|_| Vec::new()),
            Command::ChangeStudentStatus { id, status } => {
                StudentService::change_status(snapshot, &id, status, self.clock.now())
                    .map(|_| Vec::new())
            }
            Command::CreateExpense(draft) => Ok(vec![ExpenseService::create(snapshot, draft)]),
            Command::UpdateExpense { id, draft } => {
                ExpenseService::update(snapshot, &id, draft).map(|_| Vec::new())
            }
            Command::DeleteExpense { id } => ExpenseService::delete(snapshot, &id).map(|_| Vec::new()),
            Command::MarkPaymentPaid { id, date } => {
                PaymentService::mark_paid(snapshot, &id, date.unwrap_or(today)).map(|_| Vec::new())
            }
            Command::MarkExpensePaid { id, date } => {
                ExpenseService::mark_paid(snapshot, &id, date.unwrap_or(today)).map(|_| Vec::new())
            }
            Command::SetBudgets(budgets) => {
                BudgetService::set_budgets(snapshot, budgets);
                Ok(Vec::new())
            }
        }
    }

    fn commit(&mut self, next: Snapshot) -> Result<CommitReport> {
        let evaluation = evaluate(&next, self.clock.today());
        let mut report = CommitReport {
            generated: evaluation.generated.len(),
            escalated: evaluation.escalated_payments + evaluation.escalated_expenses,
            ..CommitReport::default()
        };
        let next = evaluation.snapshot;

        let changed: Vec<CollectionKey> = CollectionKey::ALL
            .into_iter()
            .filter(|key| differs(&self.committed, &next, *key))
            .collect();
        for (position, key) in changed.iter().enumerate() {
            if let Err(err) = write_collection(self.store.as_ref(), &next, *key) {
                warn!(collection = %key, error = %err, "commit aborted");
                self.roll_back(&changed[..position]);
                return Err(err);
            }
        }
        self.committed = next;
        report.written = changed;

        if !report.is_noop() {
            info!(
                collections = ?report.written,
                generated = report.generated,
                escalated = report.escalated,
                "billing snapshot committed"
            );
        }
        Ok(report)
    }

    /// Rewrites the committed contents of collections already written by an
    /// aborted commit.
    fn roll_back(&self, written: &[CollectionKey]) {
        for key in written {
            if let Err(err) = write_collection(self.store.as_ref(), &self.committed, *key) {
                warn!(collection = %key, error = %err, "rollback write failed");
            }
        }
    }
}

fn differs(current: &Snapshot, next: &Snapshot, key: CollectionKey) -> bool {
    match key {
        CollectionKey::Registrations => current.registrations != next.registrations,
        CollectionKey::Payments => current.payments != next.payments,
        CollectionKey::Expenses => current.expenses != next.expenses,
        CollectionKey::Budgets => current.budgets != next.budgets,
    }
}

fn write_collection(
    store: &dyn CollectionStore,
    snapshot: &Snapshot,
    key: CollectionKey,
) -> Result<()> {
    match key {
        CollectionKey::Registrations => save_collection(store, key, &snapshot.registrations),
        CollectionKey::Payments => save_collection(store, key, &snapshot.payments),
        CollectionKey::Expenses => save_collection(store, key, &snapshot.expenses),
        CollectionKey::Budgets => save_collection(store, key, &snapshot.budgets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;
    use crate::ledger::{BillingStatus, ExpenseCategory, FixedClock};
    use crate::storage::MemoryStorage;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    /// Memory store whose writes to one collection fail while `failing` is set.
    #[derive(Clone)]
    struct FailingStore {
        inner: MemoryStorage,
        key: CollectionKey,
        failing: Arc<AtomicBool>,
    }

    impl CollectionStore for FailingStore {
        fn read(&self, key: CollectionKey) -> Result<Option<Value>> {
            self.inner.read(key)
        }

        fn write(&self, key: CollectionKey, value: &Value) -> Result<()> {
            if key == self.key && self.failing.load(Ordering::SeqCst) {
                let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
                return Err(LedgerError::Io(err));
            }
            self.inner.write(key, value)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_on(store: &MemoryStorage, day: NaiveDate) -> BillingManager {
        BillingManager::open(Box::new(store.clone()), Box::new(FixedClock::on(day))).unwrap()
    }

    fn register(manager: &mut BillingManager, name: &str, due_day: u32) -> String {
        manager
            .apply(Command::RegisterStudent {
                draft: StudentDraft::new(name, dec!(250), due_day),
                guardian: Guardian::new("Guardian"),
            })
            .unwrap()
            .created
            .remove(0)
    }

    #[test]
    fn opening_empty_store_writes_nothing() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        assert_eq!(store.write_count(), 0);
        assert!(manager.refresh().unwrap().is_noop());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn registration_generates_obligation_in_same_commit() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let id = register(&mut manager, "Lucas", 10);

        let obligation = manager
            .snapshot()
            .payment(&format!("{id}-2024-03"))
            .unwrap();
        assert_eq!(obligation.status, BillingStatus::Overdue);
        assert_eq!(
            store.write_log(),
            vec![CollectionKey::Registrations, CollectionKey::Payments]
        );
    }

    #[test]
    fn unchanged_refresh_does_not_write() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        register(&mut manager, "Lucas", 10);
        let writes = store.write_count();
        let report = manager.refresh().unwrap();
        assert!(report.is_noop());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn rejected_command_leaves_state_untouched() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let before = manager.snapshot().clone();
        let err = manager
            .apply(Command::MarkPaymentPaid {
                id: "ghost-2024-03".into(),
                date: None,
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
        assert_eq!(manager.snapshot(), &before);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn paying_defaults_to_clock_day() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let id = register(&mut manager, "Lucas", 10);
        let payment_id = format!("{id}-2024-03");
        let report = manager
            .apply(Command::MarkPaymentPaid {
                id: payment_id.clone(),
                date: None,
            })
            .unwrap();
        assert_eq!(report.written, vec![CollectionKey::Payments]);
        let payment = manager.snapshot().payment(&payment_id).unwrap();
        assert_eq!(payment.payment_date, Some(date(2024, 3, 15)));
        assert_eq!(payment.status, BillingStatus::Paid);
    }

    #[test]
    fn budgets_only_touch_their_collection() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let report = manager
            .apply(Command::SetBudgets(
                Budgets::new().with(ExpenseCategory::Rent, dec!(1200)),
            ))
            .unwrap();
        assert_eq!(report.written, vec![CollectionKey::Budgets]);
    }

    #[test]
    fn reopening_next_month_generates_and_escalates() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 5));
        let id = register(&mut manager, "Lucas", 10);
        drop(manager);

        let manager = open_on(&store, date(2024, 4, 2));
        let snapshot = manager.snapshot();
        assert_eq!(
            snapshot.payment(&format!("{id}-2024-03")).unwrap().status,
            BillingStatus::Overdue
        );
        assert_eq!(
            snapshot.payment(&format!("{id}-2024-04")).unwrap().status,
            BillingStatus::Pending
        );
    }

    #[test]
    fn zero_due_day_uses_configured_default() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 1)).with_default_due_day(20);
        let id = register(&mut manager, "Pedro", 0);
        let payment = manager
            .snapshot()
            .payment(&format!("{id}-2024-03"))
            .unwrap();
        assert_eq!(payment.due_date, date(2024, 3, 20));
    }

    #[test]
    fn failed_write_rolls_back_earlier_collections() {
        let store = FailingStore {
            inner: MemoryStorage::new(),
            key: CollectionKey::Payments,
            failing: Arc::new(AtomicBool::new(true)),
        };
        let mut manager = BillingManager::open(
            Box::new(store.clone()),
            Box::new(FixedClock::on(date(2024, 3, 15))),
        )
        .unwrap();
        let command = Command::RegisterStudent {
            draft: StudentDraft::new("Lucas", dec!(250), 10),
            guardian: Guardian::new("Fernanda"),
        };

        assert!(manager.apply(command.clone()).is_err());
        assert!(manager.snapshot().registrations.is_empty());
        assert!(manager.snapshot().payments.is_empty());
        let stored: Vec<crate::ledger::Registration> =
            load_collection(&store.inner, CollectionKey::Registrations).unwrap();
        assert!(stored.is_empty());

        store.failing.store(false, Ordering::SeqCst);
        manager.apply(command).unwrap();
        assert_eq!(manager.snapshot().registrations.len(), 1);
        assert_eq!(manager.snapshot().payments.len(), 1);
        let stored: Vec<crate::ledger::Registration> =
            load_collection(&store.inner, CollectionKey::Registrations).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn import_generates_obligations_for_every_row() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let report = manager
            .apply(Command::ImportRegistrations(vec![
                (
                    StudentDraft::new("Ana", dec!(180), 5),
                    Guardian::new("Paulo"),
                ),
                (
                    StudentDraft::new("Bruno", dec!(210), 20),
                    Guardian::new("Carla"),
                ),
            ]))
            .unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.generated, 2);
        let ana = manager
            .snapshot()
            .payment(&format!("{}-2024-03", report.created[0]))
            .unwrap();
        assert_eq!(ana.status, BillingStatus::Overdue);
    }

    #[test]
    fn invalid_import_writes_nothing() {
        let store = MemoryStorage::new();
        let mut manager = open_on(&store, date(2024, 3, 15));
        let result = manager.apply(Command::ImportRegistrations(vec![
            (
                StudentDraft::new("Ana", dec!(180), 5),
                Guardian::new("Paulo"),
            ),
            (StudentDraft::new("", dec!(210), 20), Guardian::new("Carla")),
        ]));
        assert!(matches!(result, Err(LedgerError::InvalidOperation(_))));
        assert!(manager.snapshot().registrations.is_empty());
        assert_eq!(store.write_count(), 0);
    }
}
