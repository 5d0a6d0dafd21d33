//! The expense filter session: observable filter state and derived flows.
//!
//! Four independent filter dimensions (date range, category, supplier) plus
//! the trend granularity and a manual refresh counter live in watch channels.
//! A background task recombines the tuple whenever any one changes and
//! re-issues the repository queries with switch-to-latest semantics: the
//! in-flight evaluation is dropped the moment a newer tuple exists, so a
//! superseded result is never published. Outputs are watch channels handed
//! out by the `subscribe_*` methods; while nobody subscribes the task keeps
//! its upstream change subscription warm for a grace period, then parks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::preferences::Preferences;
use crate::core::expense::{self, EXPENSE_TABLES, ExpenseDetail, ExpenseFilter};
use crate::core::report::{
    self, CategorySpending, ProductSpending, SpendingAverages, SupplierSpending, TrendInterval,
    TrendPoint,
};
use crate::errors::Result;
use crate::observe::ChangeStream;
use crate::session::presets::{DatePreset, DateRange};
use crate::store::Store;

/// How long the session keeps evaluating without any subscriber before it
/// parks, to tolerate brief consumer absence without redoing work.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Aggregates recomputed on every emission of the filtered rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportSnapshot {
    /// Spending per category within the filter, largest first
    pub by_category: Vec<CategorySpending>,
    /// Spending per supplier within the filter, largest first
    pub by_supplier: Vec<SupplierSpending>,
    /// Trend buckets at the selected granularity
    pub trend: Vec<TrendPoint>,
    /// Per-product totals and lowest prices within the filter
    pub products: Vec<ProductSpending>,
    /// All-time daily/monthly rates, independent of the filter
    pub averages: SpendingAverages,
}

/// The live filter state machine. Dropping the session cancels its task.
pub struct ExpenseFilterSession {
    range: watch::Sender<DateRange>,
    category: watch::Sender<Option<i64>>,
    supplier: watch::Sender<Option<i64>>,
    interval: watch::Sender<TrendInterval>,
    refresh: watch::Sender<u64>,
    outputs: Arc<Outputs>,
    task: JoinHandle<()>,
}

#[derive(Debug)]
struct Outputs {
    rows: watch::Sender<Vec<ExpenseDetail>>,
    total: watch::Sender<f64>,
    report: watch::Sender<ReportSnapshot>,
    wake: Notify,
}

impl Outputs {
    fn subscriber_count(&self) -> usize {
        self.rows.receiver_count() + self.total.receiver_count() + self.report.receiver_count()
    }

    /// Resolves once no subscriber is attached to any output.
    async fn idle(&self) {
        tokio::join!(self.rows.closed(), self.total.closed(), self.report.closed());
    }
}

impl ExpenseFilterSession {
    /// Starts a session with the date range read from the persisted default
    /// preset and everything else unconstrained.
    #[must_use]
    pub fn with_preferences(store: Arc<Store>, preferences: &Preferences) -> Self {
        Self::start(store, preferences.default_filter.resolve())
    }

    /// Starts a session with an explicit initial range.
    #[must_use]
    pub fn start(store: Arc<Store>, initial: DateRange) -> Self {
        Self::with_grace(store, initial, DEFAULT_GRACE)
    }

    /// Starts a session with an explicit subscriber grace period.
    #[must_use]
    pub fn with_grace(store: Arc<Store>, initial: DateRange, grace: Duration) -> Self {
        let (range, range_rx) = watch::channel(initial);
        let (category, category_rx) = watch::channel(None);
        let (supplier, supplier_rx) = watch::channel(None);
        let (interval, interval_rx) = watch::channel(TrendInterval::default());
        let (refresh, refresh_rx) = watch::channel(0_u64);

        let outputs = Arc::new(Outputs {
            rows: watch::channel(Vec::new()).0,
            total: watch::channel(0.0).0,
            report: watch::channel(ReportSnapshot::default()).0,
            wake: Notify::new(),
        });

        let changes = store.changes().watch();
        let worker = Worker {
            store,
            range: range_rx,
            category: category_rx,
            supplier: supplier_rx,
            interval: interval_rx,
            refresh: refresh_rx,
            changes,
            outputs: Arc::clone(&outputs),
            grace,
        };
        let task = tokio::spawn(worker.run());

        Self {
            range,
            category,
            supplier,
            interval,
            refresh,
            outputs,
            task,
        }
    }

    /// Replaces the date range dimension.
    pub fn set_range(&self, range: DateRange) {
        self.range.send_replace(range);
    }

    /// Applies a named preset, resolved against the current local time.
    pub fn set_preset(&self, preset: DatePreset) {
        self.set_range(preset.resolve());
    }

    /// Applies an explicit range from the date picker.
    pub fn set_custom_range(&self, start: NaiveDate, end: Option<NaiveDate>) {
        self.set_range(DateRange::custom(start, end));
    }

    /// Replaces the category dimension; `None` lifts the constraint.
    pub fn set_category(&self, category_id: Option<i64>) {
        self.category.send_replace(category_id);
    }

    /// Replaces the supplier dimension; `None` lifts the constraint.
    pub fn set_supplier(&self, supplier_id: Option<i64>) {
        self.supplier.send_replace(supplier_id);
    }

    /// Changes the trend chart granularity.
    pub fn set_trend_interval(&self, interval: TrendInterval) {
        self.interval.send_replace(interval);
    }

    /// Forces a re-evaluation without changing any dimension. Defensive
    /// re-trigger for mutations the change stream cannot see.
    pub fn refresh(&self) {
        self.refresh.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// The currently selected filter tuple.
    #[must_use]
    pub fn filter(&self) -> ExpenseFilter {
        let range = *self.range.borrow();
        ExpenseFilter {
            start: range.start,
            end: range.end,
            category_id: *self.category.borrow(),
            supplier_id: *self.supplier.borrow(),
        }
    }

    /// Subscribes to the live filtered rows.
    #[must_use]
    pub fn subscribe_rows(&self) -> watch::Receiver<Vec<ExpenseDetail>> {
        let rx = self.outputs.rows.subscribe();
        self.outputs.wake.notify_one();
        rx
    }

    /// Subscribes to the live filtered total.
    #[must_use]
    pub fn subscribe_total(&self) -> watch::Receiver<f64> {
        let rx = self.outputs.total.subscribe();
        self.outputs.wake.notify_one();
        rx
    }

    /// Subscribes to the live report aggregates.
    #[must_use]
    pub fn subscribe_report(&self) -> watch::Receiver<ReportSnapshot> {
        let rx = self.outputs.report.subscribe();
        self.outputs.wake.notify_one();
        rx
    }
}

impl Drop for ExpenseFilterSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Worker {
    store: Arc<Store>,
    range: watch::Receiver<DateRange>,
    category: watch::Receiver<Option<i64>>,
    supplier: watch::Receiver<Option<i64>>,
    interval: watch::Receiver<TrendInterval>,
    refresh: watch::Receiver<u64>,
    changes: ChangeStream,
    outputs: Arc<Outputs>,
    grace: Duration,
}

struct Evaluated {
    rows: Vec<ExpenseDetail>,
    total: f64,
    report: ReportSnapshot,
}

impl Worker {
    async fn run(mut self) {
        let mut dirty = true;
        loop {
            if self.outputs.subscriber_count() == 0 {
                tokio::select! {
                    () = self.outputs.wake.notified() => {}
                    () = tokio::time::sleep(self.grace) => {
                        debug!("no subscribers after grace period, parking");
                        self.outputs.wake.notified().await;
                        // Resume on a fresh change stream; whatever happened
                        // while parked is covered by the re-evaluation.
                        self.changes = self.store.changes().watch();
                        dirty = true;
                    }
                }
                continue;
            }

            if dirty {
                let filter = self.current_filter();
                let interval = *self.interval.borrow();
                let eval = evaluate(Arc::clone(&self.store), filter, interval);
                tokio::pin!(eval);

                tokio::select! {
                    result = &mut eval => {
                        match result {
                            Ok(update) => {
                                self.outputs.rows.send_replace(update.rows);
                                self.outputs.total.send_replace(update.total);
                                self.outputs.report.send_replace(update.report);
                            }
                            Err(err) => warn!("filter evaluation failed: {err}"),
                        }
                        dirty = false;
                    }
                    () = self.triggers() => {
                        // Superseded mid-flight; the dropped evaluation is
                        // never published.
                    }
                }
            } else {
                self.triggers().await;
                dirty = true;
            }
        }
    }

    fn current_filter(&self) -> ExpenseFilter {
        let range = *self.range.borrow();
        ExpenseFilter {
            start: range.start,
            end: range.end,
            category_id: *self.category.borrow(),
            supplier_id: *self.supplier.borrow(),
        }
    }

    /// Resolves when anything calls for a new evaluation: a filter dimension,
    /// the refresh counter, a relevant table change, or the last subscriber
    /// leaving (which sends the loop back through the grace check).
    async fn triggers(&mut self) {
        tokio::select! {
            _ = self.range.changed() => {}
            _ = self.category.changed() => {}
            _ = self.supplier.changed() => {}
            _ = self.interval.changed() => {}
            _ = self.refresh.changed() => {}
            () = self.changes.changed(EXPENSE_TABLES) => {}
            () = self.outputs.idle() => {}
        }
    }
}

async fn evaluate(
    store: Arc<Store>,
    filter: ExpenseFilter,
    interval: TrendInterval,
) -> Result<Evaluated> {
    let rows = expense::filtered_expenses(&store, filter).await?;
    let total = expense::total_filtered_expenses(&store, filter).await?;
    let by_category = report::spending_by_category(&store, filter).await?;
    let by_supplier = report::spending_by_supplier(&store, filter).await?;
    let averages = report::spending_averages(&store).await?;

    let trend = report::bucket_spending(&rows, interval);
    let products = report::product_spending(&rows);

    Ok(Evaluated {
        rows,
        total,
        report: ReportSnapshot {
            by_category,
            by_supplier,
            trend,
            products,
            averages,
        },
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_session_publishes_rows_total_and_report() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let session = ExpenseFilterSession::start(Arc::clone(&store), DateRange::default());
        let mut rows = session.subscribe_rows();
        let mut total = session.subscribe_total();
        let mut report = session.subscribe_report();

        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let rows = wait_for(&mut rows, |rows| rows.len() == 1).await;
        assert_eq!(rows[0].product_name, "Milk");
        wait_for(&mut total, |total| (*total - 3.5).abs() < 1e-9).await;
        let report = wait_for(&mut report, |report| !report.by_category.is_empty()).await;
        assert_eq!(report.by_category[0].category_name, "Groceries");
        assert!((report.averages.lifetime_total - 3.5).abs() < 1e-9);
        assert_eq!(report.products.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_changing_a_dimension_reissues_the_query() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;
        let other = create_test_category(&store, "Household").await?;
        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let session = ExpenseFilterSession::start(Arc::clone(&store), DateRange::default());
        let mut rows = session.subscribe_rows();
        wait_for(&mut rows, |rows| rows.len() == 1).await;

        // A category with no products filters everything out.
        session.set_category(Some(other.id));
        wait_for(&mut rows, Vec::is_empty).await;

        // Lifting the constraint brings the row back.
        session.set_category(None);
        wait_for(&mut rows, |rows| rows.len() == 1).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_rapid_changes_converge_to_latest() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;
        let empty_category = create_test_category(&store, "Household").await?;
        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let session = ExpenseFilterSession::start(Arc::clone(&store), DateRange::default());
        let mut rows = session.subscribe_rows();

        // Burst of changes; only the last one may determine the outcome.
        session.set_category(Some(empty_category.id));
        session.set_supplier(Some(9999));
        session.set_supplier(None);
        session.set_category(Some(fixture.category.id));

        assert_eq!(session.filter().category_id, Some(fixture.category.id));
        assert_eq!(session.filter().supplier_id, None);
        let rows = wait_for(&mut rows, |rows| rows.len() == 1).await;
        assert_eq!(rows[0].category_id, fixture.category.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_forces_a_new_emission() -> Result<()> {
        let store = setup_test_store_arc().await?;
        seed_basic(&store).await?;

        let session = ExpenseFilterSession::start(Arc::clone(&store), DateRange::default());
        let mut rows = session.subscribe_rows();

        // Consume the initial emission, then demand another one.
        wait_for(&mut rows, |_| true).await;
        let _ = rows.borrow_and_update();
        session.refresh();
        tokio::time::timeout(std::time::Duration::from_secs(5), rows.changed())
            .await
            .expect("refresh did not re-emit")
            .unwrap();
        Ok(())
    }

    #[tokio::test]
    async fn test_parked_session_resumes_for_a_new_subscriber() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let session = ExpenseFilterSession::with_grace(
            Arc::clone(&store),
            DateRange::default(),
            Duration::from_millis(50),
        );

        {
            let mut rows = session.subscribe_rows();
            wait_for(&mut rows, Vec::is_empty).await;
        }

        // Let the grace period lapse with nobody attached, then mutate.
        tokio::time::sleep(Duration::from_millis(200)).await;
        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        // A new subscriber wakes the task and gets a fresh evaluation.
        let mut rows = session.subscribe_rows();
        let rows = wait_for(&mut rows, |rows| rows.len() == 1).await;
        assert_eq!(rows[0].amount, 3.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_trend_interval_is_a_dimension() -> Result<()> {
        let store = setup_test_store_arc().await?;
        seed_report_scenario(&store).await?;

        let session = ExpenseFilterSession::start(Arc::clone(&store), DateRange::default());
        let mut report = session.subscribe_report();

        let daily = wait_for(&mut report, |r| !r.trend.is_empty()).await;
        assert_eq!(daily.trend.len(), 4);

        session.set_trend_interval(TrendInterval::Month);
        let monthly = wait_for(&mut report, |r| r.trend.len() == 1).await;
        assert!((monthly.trend[0].total - 21.0).abs() < 1e-9);
        Ok(())
    }
}
