use chrono::{DateTime, Datelike, Utc};

use super::types::{PeriodComparison, PeriodCounts};
use crate::date_util::{long_month_label, month_start, shift_month, short_month_label};
use crate::model::Task;

/// One calendar month in UTC. `start` is included, `end` (the first instant
/// of the following month) is not, so adjacent windows tile the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub short_label: &'static str,
    pub long_label: &'static str,
}

impl MonthWindow {
    /// `None` when the month or its successor falls outside chrono's range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let (next_year, next_month) = shift_month(year, month, 1);
        Some(Self {
            start: month_start(year, month)?,
            end: month_start(next_year, next_month)?,
            short_label: short_month_label(month),
            long_label: long_month_label(month),
        })
    }

    /// The month `offset` months away from the one containing `now` (0 = current).
    pub fn relative_to(now: DateTime<Utc>, offset: i32) -> Option<Self> {
        let (year, month) = shift_month(now.year(), now.month(), offset);
        Self::new(year, month)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

/// The two adjacent months compared by the headline counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodWindows {
    pub this_month: MonthWindow,
    pub last_month: MonthWindow,
}

impl PeriodWindows {
    pub fn at(now: DateTime<Utc>) -> Option<Self> {
        Some(Self {
            this_month: MonthWindow::relative_to(now, 0)?,
            last_month: MonthWindow::relative_to(now, -1)?,
        })
    }

    /// Earliest `created_at` either window can match; the loader's fetch floor.
    pub fn floor(&self) -> DateTime<Utc> {
        self.last_month.start
    }
}

impl PeriodCounts {
    fn record(&mut self, task: &Task, caller_member_id: &str, now: DateTime<Utc>) {
        self.task_count += 1;
        if task.assignee_id.as_deref() == Some(caller_member_id) {
            self.assigned_task_count += 1;
        }
        if task.status.is_completed() {
            self.completed_task_count += 1;
        } else {
            self.incomplete_task_count += 1;
        }
        if task.is_overdue(now) {
            self.overdue_task_count += 1;
        }
    }
}

/// Month-over-month headline counters.
///
/// Tasks are attributed to the month they were created in. `caller_member_id`
/// must already be the caller's member id for this workspace. Tasks outside
/// both windows are ignored. `now` decides overdue status.
pub fn compare_periods(
    tasks: &[Task],
    caller_member_id: &str,
    windows: &PeriodWindows,
    now: DateTime<Utc>,
) -> PeriodComparison {
    let mut comparison = PeriodComparison::default();

    for task in tasks {
        let bucket = if windows.this_month.contains(task.created_at) {
            &mut comparison.this_month
        } else if windows.last_month.contains(task.created_at) {
            &mut comparison.last_month
        } else {
            continue;
        };
        bucket.record(task, caller_member_id, now);
    }

    comparison
}
