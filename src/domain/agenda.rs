//! Urgency ordering and the agenda
//!
//! The agenda is a topological listing of the graph (Kahn's algorithm) where
//! the frontier is a priority queue instead of a plain set: among the tasks
//! whose dependencies have all been released, the most urgent comes first.

use chrono::{DateTime, Duration, Utc};
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

use super::graph::TaskGraph;
use super::task::{Progress, Task};

/// Orders tasks by urgency relative to a point in time
///
/// A task is *due* when its effective deadline is less than `window` away
/// from `now` (overdue tasks included, tasks without a deadline never).
/// Due tasks come first; within the same group higher effective priority
/// comes first, then the sooner effective deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urgency {
    pub now: DateTime<Utc>,
    pub window: Duration,
}

impl Urgency {
    pub fn new(now: DateTime<Utc>, window: Duration) -> Self {
        Self { now, window }
    }

    /// Returns true if the task's effective deadline falls inside the window
    pub fn is_due(&self, task: &Task) -> bool {
        task.effective_deadline.is_within(self.now, self.window)
    }

    /// `Less` means `a` is more urgent than `b`
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        self.is_due(b)
            .cmp(&self.is_due(a))
            .then_with(|| b.effective_priority.cmp(&a.effective_priority))
            .then_with(|| a.effective_deadline.cmp(&b.effective_deadline))
    }

    /// Sorts tasks most urgent first; equally urgent tasks keep their order
    pub fn sort(&self, tasks: &mut [&Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}

/// Compares two tasks by urgency; see [`Urgency`]
pub fn compare_tasks(a: &Task, b: &Task, now: DateTime<Utc>, window: Duration) -> Ordering {
    Urgency::new(now, window).compare(a, b)
}

/// Queue entry; the most urgent entry is the greatest
struct Released<'a> {
    node: NodeIndex,
    task: &'a Task,
    /// Release order, so equally urgent tasks come out first-in first-out
    seq: usize,
    urgency: Urgency,
}

impl Ord for Released<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.urgency
            .compare(other.task, self.task)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Released<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Released<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Released<'_> {}

impl TaskGraph {
    /// Actionable tasks (`todo` or `doing`) in dependency-respecting
    /// urgency order
    pub fn agenda(&self, now: DateTime<Utc>, window: Duration) -> Vec<&Task> {
        self.agenda_with(now, window, &Progress::ACTIONABLE)
    }

    /// Like [`agenda`](Self::agenda) with a caller-chosen set of listed
    /// progress states
    ///
    /// Every task is still traversed so that tasks behind an unlisted one
    /// are released in the right order; only the listing is filtered.
    pub fn agenda_with(
        &self,
        now: DateTime<Utc>,
        window: Duration,
        listed: &[Progress],
    ) -> Vec<&Task> {
        let urgency = Urgency::new(now, window);
        let mut remaining = self.in_degrees();
        let mut queue = BinaryHeap::new();
        let mut seq = 0;

        for &root in self.root_nodes() {
            queue.push(Released {
                node: root,
                task: self.node(root),
                seq,
                urgency,
            });
            seq += 1;
        }

        let mut agenda = Vec::new();
        while let Some(Released { node, task, .. }) = queue.pop() {
            if listed.contains(&task.progress) {
                agenda.push(task);
            }

            for dependent in self.dependents_of(node) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    queue.push(Released {
                        node: dependent,
                        task: self.node(dependent),
                        seq,
                        urgency,
                    });
                    seq += 1;
                }
            }
        }

        debug!(listed = agenda.len(), total = self.len(), "computed agenda");
        agenda
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MaybeDate, RawTask, TaskId};

    fn id(value: u32) -> TaskId {
        TaskId::new(value)
    }

    fn date(s: &str) -> MaybeDate {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        date("2004-05-06").instant().unwrap()
    }

    fn one_day() -> Duration {
        Duration::days(1)
    }

    fn task(value: u32, name: &str, deps: &[u32]) -> RawTask {
        RawTask::new(id(value), name).with_dependencies(deps.iter().map(|d| id(*d)))
    }

    fn names(agenda: &[&Task]) -> Vec<String> {
        agenda.iter().map(|t| t.name.clone()).collect()
    }

    fn resolved(raw: RawTask) -> Task {
        Task::from_raw(raw)
    }

    #[test]
    fn due_tasks_come_first() {
        let urgency = Urgency::new(now(), one_day());
        let due = resolved(task(0, "due", &[]).with_deadline(date("2004-05-06")));
        let important = resolved(task(1, "important", &[]).with_priority(10));

        assert!(urgency.is_due(&due));
        assert!(!urgency.is_due(&important));
        assert_eq!(urgency.compare(&due, &important), Ordering::Less);
        assert_eq!(urgency.compare(&important, &due), Ordering::Greater);
    }

    #[test]
    fn overdue_tasks_are_due() {
        let urgency = Urgency::new(now(), one_day());
        let overdue = resolved(task(0, "late", &[]).with_deadline(date("1999-01-01")));
        assert!(urgency.is_due(&overdue));
    }

    #[test]
    fn higher_priority_then_sooner_deadline() {
        let urgency = Urgency::new(now(), one_day());
        let low = resolved(task(0, "low", &[]).with_priority(1));
        let high = resolved(task(1, "high", &[]).with_priority(2));
        let soon = resolved(task(2, "soon", &[]).with_priority(1).with_deadline(date("2004-06-01")));

        assert_eq!(urgency.compare(&high, &low), Ordering::Less);
        assert_eq!(urgency.compare(&soon, &low), Ordering::Less);
        assert_eq!(urgency.compare(&low, &low.clone()), Ordering::Equal);
        assert_eq!(compare_tasks(&high, &soon, now(), one_day()), Ordering::Less);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let urgency = Urgency::new(now(), one_day());
        let a = resolved(task(0, "a", &[]));
        let b = resolved(task(1, "b", &[]));
        let c = resolved(task(2, "c", &[]).with_priority(1));

        let mut tasks = vec![&a, &b, &c];
        urgency.sort(&mut tasks);
        assert_eq!(names(&tasks), vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_graph_has_empty_agenda() {
        assert!(TaskGraph::empty().agenda(now(), one_day()).is_empty());
    }

    #[test]
    fn agenda_lists_actionable_tasks() {
        let graph = TaskGraph::new(vec![
            task(0, "eat an apple", &[]),
            task(1, "eat a banana", &[]),
            task(2, "eat a grape", &[]),
        ])
        .unwrap();
        assert_eq!(graph.agenda(now(), one_day()).len(), 3);

        let graph = TaskGraph::new(vec![
            task(0, "eat an apple", &[1]),
            task(1, "eat a banana", &[2]),
            task(2, "eat a grape", &[]),
        ])
        .unwrap();
        assert_eq!(names(&graph.agenda(now(), one_day())), vec!["eat a grape"]);

        let graph = TaskGraph::new(vec![
            task(0, "eat an apple", &[1]),
            task(1, "eat a banana", &[2]),
            task(2, "eat a grape", &[]).with_progress(Progress::Failed),
        ])
        .unwrap();
        assert!(graph.agenda(now(), one_day()).is_empty());

        let graph = TaskGraph::new(vec![
            task(0, "eat an apple", &[]).with_progress(Progress::Done),
            task(1, "eat a banana", &[]).with_progress(Progress::Done),
            task(2, "eat a grape", &[]).with_progress(Progress::Done),
        ])
        .unwrap();
        assert!(graph.agenda(now(), one_day()).is_empty());

        let graph = TaskGraph::new(vec![
            task(0, "eat an apple", &[1, 2]),
            task(1, "eat a banana", &[]).with_progress(Progress::Done),
            task(2, "eat a grape", &[]).with_progress(Progress::Done),
        ])
        .unwrap();
        assert_eq!(names(&graph.agenda(now(), one_day())), vec!["eat an apple"]);
    }

    #[test]
    fn doing_tasks_are_listed() {
        let graph = TaskGraph::new(vec![task(0, "started", &[]).with_progress(Progress::Doing)]).unwrap();
        assert_eq!(names(&graph.agenda(now(), one_day())), vec!["started"]);
    }

    #[test]
    fn independent_tasks_by_priority() {
        let graph = TaskGraph::new(vec![
            task(0, "fix car", &[]).with_priority(1),
            task(1, "buy hammer", &[]),
            task(2, "go shopping", &[]).with_priority(10),
            task(3, "buy bus pass", &[]).with_priority(-1),
        ])
        .unwrap();

        assert_eq!(
            names(&graph.agenda(now(), one_day())),
            vec!["go shopping", "fix car", "buy hammer", "buy bus pass"]
        );
    }

    #[test]
    fn inherited_priority_orders_roots() {
        let graph = TaskGraph::new(vec![
            task(0, "fix car", &[1]).with_priority(1),
            task(1, "buy hammer", &[]),
            task(2, "go shopping", &[3]).with_priority(10),
            task(3, "buy bus pass", &[]).with_priority(-1),
        ])
        .unwrap();

        assert_eq!(
            names(&graph.agenda(now(), one_day())),
            vec!["buy bus pass", "buy hammer"]
        );
    }

    #[test]
    fn inherited_due_date_beats_priority() {
        let graph = TaskGraph::new(vec![
            task(0, "fix car", &[1]).with_priority(1).with_deadline(date("2004-05-05")),
            task(1, "buy hammer", &[]),
            task(2, "go shopping", &[3]).with_priority(10).with_deadline(date("2004-05-10")),
            task(3, "buy bus pass", &[]).with_priority(-1),
        ])
        .unwrap();

        assert_eq!(
            names(&graph.agenda(now(), one_day())),
            vec!["buy hammer", "buy bus pass"]
        );
    }

    #[test]
    fn nothing_due_orders_by_priority() {
        let graph = TaskGraph::new(vec![
            task(0, "fix car", &[]).with_priority(1).with_deadline(date("2004-05-20")),
            task(1, "buy hammer", &[]).with_deadline(date("2004-05-21")),
            task(2, "go shopping", &[]).with_priority(10).with_deadline(date("2004-05-22")),
            task(3, "buy bus pass", &[]).with_priority(-1).with_deadline(date("2004-05-23")),
        ])
        .unwrap();

        assert_eq!(
            names(&graph.agenda(now(), one_day())),
            vec!["go shopping", "fix car", "buy hammer", "buy bus pass"]
        );
    }

    #[test]
    fn equal_priority_orders_by_deadline() {
        let graph = TaskGraph::new(vec![
            task(0, "fix car", &[]).with_priority(1).with_deadline(date("2004-05-20")),
            task(1, "buy hammer", &[]).with_priority(1),
            task(2, "go shopping", &[]).with_priority(1).with_deadline(date("2004-05-22")),
            task(3, "buy bus pass", &[]).with_priority(1).with_deadline(date("2004-05-23")),
        ])
        .unwrap();

        assert_eq!(
            names(&graph.agenda(now(), one_day())),
            vec!["fix car", "go shopping", "buy bus pass", "buy hammer"]
        );
    }

    #[test]
    fn dependencies_are_released_before_dependents() {
        let graph = TaskGraph::new(vec![
            task(0, "c", &[1]).with_progress(Progress::Doing),
            task(1, "b", &[2]).with_progress(Progress::Done),
            task(2, "a", &[]).with_progress(Progress::Done),
            task(3, "urgent", &[]).with_priority(100),
        ])
        .unwrap();

        let order = names(&graph.agenda(now(), one_day()));
        assert_eq!(order, vec!["urgent", "c"]);

        let everything = graph.agenda_with(now(), one_day(), &Progress::ALL);
        let position = |name: &str| everything.iter().position(|t| t.name == name).unwrap();
        assert!(position("a") < position("b"));
        assert!(position("b") < position("c"));
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn listed_states_are_configurable() {
        let graph = TaskGraph::new(vec![
            task(0, "todo", &[]),
            task(1, "doing", &[]).with_progress(Progress::Doing),
            task(2, "done", &[]).with_progress(Progress::Done),
        ])
        .unwrap();

        let only_todo = graph.agenda_with(now(), one_day(), &[Progress::Todo]);
        assert_eq!(names(&only_todo), vec!["todo"]);

        let done = graph.agenda_with(now(), one_day(), &[Progress::Done]);
        assert_eq!(names(&done), vec!["done"]);
    }
}
