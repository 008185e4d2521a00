//! Activity reporting for resource construction and teardown.
//!
//! Every `make` and `clean` a manager performs is bracketed by a
//! start/stop pair sent to an [`ActivityReporter`]. Reporters exist for
//! instrumentation only; nothing they do affects control flow.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::key::ResourceId;
use crate::node::ResourceNode;

/// Kind of lifecycle activity being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// A resource instance is being constructed
    Make,
    /// A resource instance is being torn down
    Clean,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Make => "make",
            Activity::Clean => "clean",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which edge of an activity a notification marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => f.write_str("start"),
            Phase::Stop => f.write_str("stop"),
        }
    }
}

/// Observer for timed resource activities.
///
/// Calls arrive in matched pairs: `start_activity` immediately before the
/// strategy's `make`/`clean` runs and `stop_activity` immediately after it
/// returns, whether or not it succeeded. Keep implementations cheap; they
/// run synchronously inside the lifecycle operation.
///
/// # Examples
///
/// ```
/// use ferrous_resources::{Activity, ActivityReporter, FnResource, ResourceManager, ResourceNode};
/// use std::cell::Cell;
///
/// #[derive(Default)]
/// struct CountingReporter {
///     makes: Cell<usize>,
/// }
///
/// impl ActivityReporter for CountingReporter {
///     fn start_activity(&self, activity: Activity, _resource: &dyn ResourceNode) {
///         if activity == Activity::Make {
///             self.makes.set(self.makes.get() + 1);
///         }
///     }
///
///     fn stop_activity(&self, _activity: Activity, _resource: &dyn ResourceNode) {}
/// }
///
/// let reporter = CountingReporter::default();
/// let manager = ResourceManager::new(FnResource::new(|_| Ok(vec![1u8, 2, 3])));
///
/// let first = manager.get_resource(&reporter).unwrap();
/// let second = manager.get_resource(&reporter).unwrap();
/// assert_eq!(reporter.makes.get(), 1);
///
/// manager.release(first).unwrap();
/// manager.release(second).unwrap();
/// ```
pub trait ActivityReporter {
    /// Called before an activity begins.
    fn start_activity(&self, activity: Activity, resource: &dyn ResourceNode);

    /// Called after an activity ends.
    fn stop_activity(&self, activity: Activity, resource: &dyn ResourceNode);
}

/// Reporter that ignores every notification.
///
/// Used by the convenience entry points that take no reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ActivityReporter for NoopReporter {
    fn start_activity(&self, _activity: Activity, _resource: &dyn ResourceNode) {}

    fn stop_activity(&self, _activity: Activity, _resource: &dyn ResourceNode) {}
}

/// A single notification captured by [`RecordingReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecord {
    pub activity: Activity,
    pub phase: Phase,
    pub resource: ResourceId,
}

impl ActivityRecord {
    pub fn new(activity: Activity, phase: Phase, resource: ResourceId) -> Self {
        Self {
            activity,
            phase,
            resource,
        }
    }
}

/// Reporter that keeps every notification in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    calls: RefCell<Vec<ActivityRecord>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded notifications.
    pub fn calls(&self) -> Vec<ActivityRecord> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, activity: Activity, phase: Phase, resource: &dyn ResourceNode) {
        self.calls
            .borrow_mut()
            .push(ActivityRecord::new(activity, phase, resource.id()));
    }
}

impl ActivityReporter for RecordingReporter {
    fn start_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        self.record(activity, Phase::Start, resource);
    }

    fn stop_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        self.record(activity, Phase::Stop, resource);
    }
}

/// Reporter that emits `tracing` events for each notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ActivityReporter for TracingReporter {
    fn start_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        tracing::info!(
            activity = activity.as_str(),
            resource = resource.name(),
            id = %resource.id(),
            "resource activity started"
        );
    }

    fn stop_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        tracing::info!(
            activity = activity.as_str(),
            resource = resource.name(),
            id = %resource.id(),
            "resource activity finished"
        );
    }
}

/// Accumulated timings for one activity kind of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStats {
    /// Number of completed activities
    pub count: u64,
    /// Shortest observed duration
    pub min_duration: Duration,
    /// Longest observed duration
    pub max_duration: Duration,
    /// Sum of all observed durations
    pub total_duration: Duration,
}

impl ActivityStats {
    fn new() -> Self {
        Self {
            count: 0,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            total_duration: Duration::ZERO,
        }
    }

    fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.total_duration += duration;
    }

    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_duration.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Reporter that measures how long each make and clean takes.
///
/// Useful for tuning the `set_up_cost`/`tear_down_cost` hints of a
/// resource against reality.
#[derive(Debug, Default)]
pub struct TimingReporter {
    started: RefCell<HashMap<(ResourceId, Activity), Instant>>,
    stats: RefCell<HashMap<(ResourceId, Activity), ActivityStats>>,
}

impl TimingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timings for `activity` on `resource`, if any completed.
    pub fn stats(&self, resource: ResourceId, activity: Activity) -> Option<ActivityStats> {
        self.stats.borrow().get(&(resource, activity)).cloned()
    }

    /// Total time spent across all resources and activities.
    pub fn total_time(&self) -> Duration {
        self.stats
            .borrow()
            .values()
            .map(|stats| stats.total_duration)
            .sum()
    }
}

impl ActivityReporter for TimingReporter {
    fn start_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        self.started
            .borrow_mut()
            .insert((resource.id(), activity), Instant::now());
    }

    fn stop_activity(&self, activity: Activity, resource: &dyn ResourceNode) {
        let key = (resource.id(), activity);
        let Some(started) = self.started.borrow_mut().remove(&key) else {
            tracing::warn!(
                activity = activity.as_str(),
                resource = resource.name(),
                "stop notification without matching start"
            );
            return;
        };
        self.stats
            .borrow_mut()
            .entry(key)
            .or_insert_with(ActivityStats::new)
            .record(started.elapsed());
    }
}
