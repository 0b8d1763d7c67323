//! Staged scroll orchestrator.
//!
//! A jump request is turned into an ordered list of [`Step`]s up front.
//! Steps that take time (scroll legs, rail animations) block the list until
//! their completion arrives, so leg `n + 1` can never start before leg `n`
//! has finished.  The orchestrator only sequences; the coordinator performs
//! each step against the real scroller and rail.

use std::collections::VecDeque;

use super::page::{PageLayout, RAIL_SECTION};
use super::rail::RailEdge;
use super::scroller::LegId;

/// Pixels kept above a section when jumping to it (fixed header height).
pub const SECTION_HEADER_OFFSET: f64 = 80.0;
/// Crossing down needs to start at least this far above the rail section.
const CROSS_DOWN_MARGIN: f64 = 100.0;
/// Crossing up needs to start within this distance of the section bottom.
const CROSS_UP_MARGIN: f64 = 10.0;
/// Crossing up needs a target at least this far above the section.
const CROSS_UP_TARGET_MARGIN: f64 = 50.0;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("section `{0}` is not on the page")]
    MissingSection(String),
}

/// What the caller asked to go to.
#[derive(Debug, Clone, PartialEq)]
pub enum JumpTarget {
    Top,
    Offset(f64),
    Section(String),
}

impl JumpTarget {
    pub fn section(id: impl Into<String>) -> Self {
        Self::Section(id.into())
    }

    /// Absolute scroll offset this target resolves to on `page`.
    pub fn resolve(&self, page: &PageLayout) -> Result<f64, StageError> {
        let y = match self {
            Self::Top => 0.0,
            Self::Offset(y) => *y,
            Self::Section(id) => {
                page.section(id)
                    .ok_or_else(|| StageError::MissingSection(id.clone()))?
                    .top
                    - SECTION_HEADER_OFFSET
            }
        };
        Ok(y.clamp(0.0, page.max_scroll()))
    }
}

/// Where a scroll leg goes.  Section tops are measured when the leg starts,
/// not when the plan is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    Offset(f64),
    SectionTop(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    BeginStaging,
    UnlockRail,
    ScrollTo(ScrollTarget),
    ResetRailFlags {
        reached_end: bool,
        reached_start: bool,
        exited_from_bottom: bool,
    },
    SetRailEdge(RailEdge),
    AnimateRail(RailEdge),
    EndStaging,
}

impl Step {
    fn flags(reached_end: bool, reached_start: bool, exited_from_bottom: bool) -> Self {
        Self::ResetRailFlags {
            reached_end,
            reached_start,
            exited_from_bottom,
        }
    }
}

/// Vertical extent of the rail section in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailExtent {
    pub top: f64,
    pub bottom: f64,
}

/// Live measurements a plan is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanContext {
    pub current_y: f64,
    pub rail: Option<RailExtent>,
    pub rail_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// One eased leg, no staging.
    Simple,
    /// Straight path would pass the rail section: stop there and run it.
    Crossing { downward: bool },
    /// Started while the rail was locked mid-traversal.
    FromLocked { to_end: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedPlan {
    pub kind: PlanKind,
    pub target_y: f64,
    pub steps: Vec<Step>,
}

impl StagedPlan {
    pub fn is_staged(&self) -> bool {
        self.kind != PlanKind::Simple
    }
}

/// Build the step list for a jump to `target_y`.
pub fn plan(target: &JumpTarget, target_y: f64, ctx: PlanContext) -> StagedPlan {
    let to_target = Step::ScrollTo(ScrollTarget::Offset(target_y));

    let Some(rail) = ctx.rail else {
        return StagedPlan {
            kind: PlanKind::Simple,
            target_y,
            steps: vec![to_target],
        };
    };

    let crossing_down = ctx.current_y < rail.top - CROSS_DOWN_MARGIN && target_y > rail.bottom;
    let crossing_up = ctx.current_y > rail.bottom - CROSS_UP_MARGIN
        && target_y < rail.top - CROSS_UP_TARGET_MARGIN;

    if (crossing_down || crossing_up) && !ctx.rail_locked {
        let down = crossing_down;
        let (entry, exit) = if down {
            (RailEdge::Start, RailEdge::End)
        } else {
            (RailEdge::End, RailEdge::Start)
        };
        return StagedPlan {
            kind: PlanKind::Crossing { downward: down },
            target_y,
            steps: vec![
                Step::BeginStaging,
                Step::UnlockRail,
                Step::ScrollTo(ScrollTarget::SectionTop(RAIL_SECTION.to_string())),
                Step::flags(!down, down, false),
                Step::SetRailEdge(entry),
                Step::AnimateRail(exit),
                Step::flags(down, !down, down),
                to_target,
                Step::EndStaging,
            ],
        };
    }

    if ctx.rail_locked {
        let to_end = target_y > rail.bottom;
        let edge = if to_end { RailEdge::End } else { RailEdge::Start };
        return StagedPlan {
            kind: PlanKind::FromLocked { to_end },
            target_y,
            steps: vec![
                Step::BeginStaging,
                Step::AnimateRail(edge),
                Step::UnlockRail,
                Step::flags(to_end, !to_end, to_end),
                to_target,
                Step::EndStaging,
            ],
        };
    }

    // Landing on the rail from above starts it at the first card.  From
    // below, the rail target sits above the crossing margin, so that case
    // always plans as an upward crossing.
    let mut steps = Vec::new();
    let onto_rail = matches!(target, JumpTarget::Section(id) if id == RAIL_SECTION);
    if onto_rail && ctx.current_y < rail.top {
        steps.push(Step::flags(false, true, false));
        steps.push(Step::SetRailEdge(RailEdge::Start));
    }
    steps.push(to_target);
    StagedPlan {
        kind: PlanKind::Simple,
        target_y,
        steps,
    }
}

// ───────────────────────────────────────── executor ──────────

/// A completion a blocked step is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Await {
    Leg(LegId),
    Rail,
}

/// Completion signals fed back by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Leg(LegId),
    Rail,
}

/// What the executor wants done next.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    Perform(Step),
    /// Blocked on an in-flight leg or animation.
    Waiting,
    /// The running sequence has no steps left.
    Finished,
    /// Nothing running.
    Idle,
}

#[derive(Debug)]
struct Run {
    steps: VecDeque<Step>,
    waiting: Option<Await>,
}

/// Runs one sequence at a time.  A request arriving mid-sequence is held in
/// a single queue slot (newest wins) and started when the current one ends.
#[derive(Debug, Default)]
pub struct Orchestrator {
    run: Option<Run>,
    queued: Option<JumpTarget>,
}

impl Orchestrator {
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn queued(&self) -> Option<&JumpTarget> {
        self.queued.as_ref()
    }

    /// Hold `target` until the running sequence ends.
    pub fn defer(&mut self, target: JumpTarget) {
        if let Some(replaced) = self.queued.replace(target) {
            tracing::debug!(?replaced, "queued jump superseded");
        }
    }

    pub fn begin(&mut self, plan: StagedPlan) {
        tracing::debug!(
            kind = ?plan.kind,
            target = plan.target_y,
            steps = plan.steps.len(),
            "staged sequence"
        );
        self.run = Some(Run {
            steps: plan.steps.into(),
            waiting: None,
        });
    }

    pub fn next_step(&mut self) -> NextStep {
        let Some(run) = self.run.as_mut() else {
            return NextStep::Idle;
        };
        if run.waiting.is_some() {
            return NextStep::Waiting;
        }
        match run.steps.pop_front() {
            Some(step) => NextStep::Perform(step),
            None => NextStep::Finished,
        }
    }

    /// Block the sequence until `what` completes.
    pub fn wait_for(&mut self, what: Await) {
        if let Some(run) = self.run.as_mut() {
            run.waiting = Some(what);
        }
    }

    /// Feed a completion.  Returns `true` if it unblocked the sequence;
    /// completions nobody is waiting for are ignored.
    pub fn complete(&mut self, done: Completion) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        let matches = matches!(
            (run.waiting, done),
            (Some(Await::Leg(a)), Completion::Leg(b)) if a == b
        ) || matches!((run.waiting, done), (Some(Await::Rail), Completion::Rail));
        if matches {
            run.waiting = None;
        }
        matches
    }

    /// End the running sequence; hands back the queued request, if any.
    pub fn finish(&mut self) -> Option<JumpTarget> {
        self.run = None;
        self.queued.take()
    }

    /// Drop the remaining steps of the running sequence.
    pub fn abort(&mut self) -> Option<JumpTarget> {
        if let Some(run) = self.run.as_ref() {
            tracing::warn!(remaining = run.steps.len(), "staged sequence aborted");
        }
        self.finish()
    }
}
