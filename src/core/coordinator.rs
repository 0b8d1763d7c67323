//! Scroll coordinator: the one context object that owns the page, the
//! scroller, the rail, the frame driver and the staging flag.
//!
//! Every input goes through here.  User wheel and rail keys are dropped
//! while a staged jump runs, so during staging only the orchestrator moves
//! the page and the rail.

use std::time::Instant;

use super::driver::{AnimationDriver, DriverTuning, ModeKind};
use super::mapper::{ScrollMapper, ScrollSample};
use super::orchestrator::{
    self, Await, Completion, JumpTarget, NextStep, Orchestrator, PlanContext, RailExtent,
    ScrollTarget, StageError, Step,
};
use super::page::{PageLayout, Viewport, HERO_SECTION, RAIL_SECTION};
use super::rail::{
    RailController, RailExit, RailKey, RailState, RailTransition, RailTuning, WheelOutcome,
};
use super::scroller::{EasedScroller, InstantScroller, ScrollOptions, ScrollerEvent, SmoothScroll};

/// Navigation appears this far before the hero spacer ends.
const NAV_REVEAL_MARGIN: f64 = 100.0;
/// Threshold used when the page has no hero spacer.
const NAV_FALLBACK_THRESHOLD: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorTuning {
    pub driver: DriverTuning,
    pub rail: RailTuning,
    /// Duration and easing of every programmatic scroll leg.
    pub leg: ScrollOptions,
    /// Fraction of the wheel glide gap closed per tick.
    pub glide_speed: f64,
    /// Jump instead of animating page scroll.
    pub reduced_motion: bool,
}

impl Default for CoordinatorTuning {
    fn default() -> Self {
        Self {
            driver: DriverTuning::default(),
            rail: RailTuning::default(),
            leg: ScrollOptions::default(),
            glide_speed: 0.3,
            reduced_motion: false,
        }
    }
}

/// Read-only snapshot for everything that only reacts to the core
/// (rendering, status line, decorative effects).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub staging: bool,
    pub mode: ModeKind,
    pub scroll_y: f64,
    /// A leg or wheel glide is still moving the page.
    pub page_moving: bool,
    /// Another jump is waiting for the running one.
    pub jump_queued: bool,
    pub sample: ScrollSample,
    pub rail: RailState,
    pub rail_progress: f64,
    /// 1-based card under the rail's leading edge.
    pub card: usize,
    pub card_count: usize,
    /// Frame index the driver last asked to draw.
    pub frame: usize,
    /// Bottom navigation and back-to-top are shown once the hero is done.
    pub nav_visible: bool,
}

#[derive(Debug)]
pub struct ScrollCoordinator {
    page: PageLayout,
    scroller: Box<dyn SmoothScroll>,
    mapper: ScrollMapper,
    driver: AnimationDriver,
    rail: RailController,
    orchestrator: Orchestrator,
    leg: ScrollOptions,
    staging: bool,
    frame: usize,
}

impl ScrollCoordinator {
    pub fn new(
        page: PageLayout,
        frame_count: usize,
        tuning: CoordinatorTuning,
        now: Instant,
    ) -> Self {
        let max = page.max_scroll();
        let scroller: Box<dyn SmoothScroll> = if tuning.reduced_motion {
            Box::new(InstantScroller::new(0.0, max))
        } else {
            Box::new(EasedScroller::new(0.0, max, tuning.glide_speed))
        };
        let rail = RailController::new(
            page.rail_content_width(),
            page.viewport().width,
            scroller.position(),
            tuning.rail,
        );
        Self {
            page,
            scroller,
            mapper: ScrollMapper::new(frame_count),
            driver: AnimationDriver::new(frame_count, tuning.driver, now),
            rail,
            orchestrator: Orchestrator::default(),
            leg: tuning.leg,
            staging: false,
            frame: 0,
        }
    }

    pub fn page(&self) -> &PageLayout {
        &self.page
    }

    pub fn rail(&self) -> &RailController {
        &self.rail
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroller.position()
    }

    pub fn is_staging(&self) -> bool {
        self.staging
    }

    pub fn sample(&self) -> ScrollSample {
        self.mapper.sample(
            self.scroller.position(),
            self.page.spacer_height(),
            self.page.viewport().height,
        )
    }

    pub fn signals(&self) -> Signals {
        let viewport = self.page.viewport();
        let content = self.page.rail_content();
        Signals {
            staging: self.staging,
            mode: self.driver.state().mode.kind(),
            scroll_y: self.scroller.position(),
            page_moving: self.scroller.is_moving(),
            jump_queued: self.orchestrator.queued().is_some(),
            sample: self.sample(),
            rail: self.rail.state(),
            rail_progress: self.rail.progress(),
            card: self
                .rail
                .card_counter(content.card_width(viewport), content.card_count),
            card_count: content.card_count,
            frame: self.frame,
            nav_visible: self.scroller.position() > self.nav_threshold(),
        }
    }

    fn nav_threshold(&self) -> f64 {
        self.page
            .section(HERO_SECTION)
            .map_or(NAV_FALLBACK_THRESHOLD, |s| s.bottom() - NAV_REVEAL_MARGIN)
    }

    // ── input ───────────────────────────────────────────────────

    /// Wheel input in pixels.  Returns `true` if anything consumed it.
    pub fn on_wheel(&mut self, delta_x: f64, delta_y: f64) -> bool {
        if self.staging {
            return false;
        }
        match self.rail.on_wheel(delta_x, delta_y) {
            WheelOutcome::PassThrough => self.scroller.wheel(delta_y),
            WheelOutcome::Consumed => true,
            WheelOutcome::Released(_) => {
                self.scroller.start();
                true
            }
        }
    }

    pub fn on_rail_key(&mut self, key: RailKey) -> bool {
        !self.staging && self.rail.on_key(key)
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        self.page.resize(viewport);
        self.rail.resize(self.page.rail_content_width(), viewport.width);
        self.remeasure();
    }

    /// Take a section out of the document, as if it were never rendered.
    pub fn remove_section(&mut self, id: &str) {
        self.page.remove_section(id);
        if id == RAIL_SECTION && self.rail.unlock() {
            tracing::debug!(exit = ?RailExit::Forced, "rail section removed while locked");
            self.scroller.start();
        }
        self.remeasure();
    }

    /// The page changed shape under the current offset: re-clamp, re-map the
    /// hero frame and make sure a locked rail is still on screen.
    fn remeasure(&mut self) {
        self.scroller.set_bounds(self.page.max_scroll());
        let y = self.scroller.position();
        let vh = self.page.viewport().height;
        self.driver.retarget(self.mapper.target_frame(y, self.page.spacer_height(), vh));

        let Some(rect) = self.page.rail_section().map(|s| s.rect_at(y)) else {
            return;
        };
        if let Some(RailTransition::Unlocked(_)) = self.rail.on_viewport_change(rect, vh) {
            self.scroller.start();
        }
    }

    // ── jumps ───────────────────────────────────────────────────

    /// Programmatic navigation.  An unknown section is rejected before any
    /// state changes; a request made mid-sequence waits for it to finish.
    pub fn jump_to(&mut self, target: JumpTarget, now: Instant) -> Result<(), StageError> {
        let target_y = target.resolve(&self.page)?;
        if self.orchestrator.is_running() {
            self.orchestrator.defer(target);
            return Ok(());
        }
        self.start_jump(target, target_y, now);
        Ok(())
    }

    pub fn jump_to_top(&mut self, now: Instant) {
        if let Err(err) = self.jump_to(JumpTarget::Top, now) {
            tracing::warn!(%err, "jump to top rejected");
        }
    }

    fn start_jump(&mut self, target: JumpTarget, target_y: f64, now: Instant) {
        let ctx = PlanContext {
            current_y: self.scroller.position(),
            rail: self.page.rail_section().map(|s| RailExtent {
                top: s.top,
                bottom: s.bottom(),
            }),
            rail_locked: self.rail.is_locked(),
        };
        let plan = orchestrator::plan(&target, target_y, ctx);
        tracing::debug!(kind = ?plan.kind, staged = plan.is_staged(), target_y, "jump");
        self.orchestrator.begin(plan);
        self.pump(now);
    }

    fn start_queued(&mut self, queued: Option<JumpTarget>, now: Instant) {
        let Some(target) = queued else {
            return;
        };
        match target.resolve(&self.page) {
            Ok(y) => self.start_jump(target, y, now),
            Err(err) => tracing::warn!(%err, "queued jump dropped"),
        }
    }

    /// Perform steps until one has to wait or the sequence ends.
    fn pump(&mut self, now: Instant) {
        loop {
            match self.orchestrator.next_step() {
                NextStep::Perform(step) => match self.perform(step, now) {
                    Ok(Some(what)) => {
                        self.orchestrator.wait_for(what);
                        return;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(%err, "staged jump aborted");
                        let queued = self.orchestrator.abort();
                        self.end_staging(now);
                        if !self.rail.is_locked() {
                            self.scroller.start();
                        }
                        self.start_queued(queued, now);
                        return;
                    }
                },
                NextStep::Finished => {
                    let queued = self.orchestrator.finish();
                    self.end_staging(now);
                    self.start_queued(queued, now);
                    return;
                }
                NextStep::Waiting | NextStep::Idle => return,
            }
        }
    }

    fn perform(&mut self, step: Step, now: Instant) -> Result<Option<Await>, StageError> {
        match step {
            Step::BeginStaging => {
                self.staging = true;
                self.driver.enter_staged();
            }
            Step::UnlockRail => {
                self.rail.unlock();
                self.scroller.start();
            }
            Step::ScrollTo(target) => {
                let y = match target {
                    ScrollTarget::Offset(y) => y,
                    ScrollTarget::SectionTop(id) => {
                        self.page
                            .section(&id)
                            .ok_or(StageError::MissingSection(id))?
                            .top
                    }
                };
                let leg = self.scroller.scroll_to(y, self.leg, now);
                return Ok(Some(Await::Leg(leg)));
            }
            Step::ResetRailFlags {
                reached_end,
                reached_start,
                exited_from_bottom,
            } => self.rail.reset_flags(reached_end, reached_start, exited_from_bottom),
            Step::SetRailEdge(edge) => self.rail.set_edge(edge),
            Step::AnimateRail(edge) => {
                if self.page.rail_section().is_none() {
                    return Err(StageError::MissingSection(RAIL_SECTION.to_string()));
                }
                self.rail.animate_to(edge, now);
                return Ok(Some(Await::Rail));
            }
            Step::EndStaging => self.end_staging(now),
        }
        Ok(None)
    }

    fn end_staging(&mut self, now: Instant) {
        if self.staging {
            self.staging = false;
            self.driver.exit_staged(now);
        }
    }

    // ── refresh ─────────────────────────────────────────────────

    /// Advance everything by one refresh.  Returns the frame index to draw.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut resumed = false;
        for event in self.scroller.tick(now) {
            match event {
                ScrollerEvent::Scrolled(y) => self.on_page_scroll(y, now),
                ScrollerEvent::LegComplete(id) | ScrollerEvent::LegCancelled(id) => {
                    resumed |= self.orchestrator.complete(Completion::Leg(id));
                }
            }
        }
        if self.rail.tick(now).is_some() {
            resumed |= self.orchestrator.complete(Completion::Rail);
        }
        if resumed {
            self.pump(now);
        }
        self.frame = self.driver.tick(now);
        self.frame
    }

    fn on_page_scroll(&mut self, y: f64, now: Instant) {
        let vh = self.page.viewport().height;
        let target = self.mapper.target_frame(y, self.page.spacer_height(), vh);
        self.driver.on_scroll(target, now);

        let Some(rect) = self.page.rail_section().map(|s| s.rect_at(y)) else {
            return;
        };
        match self.rail.on_page_scroll(y, rect, vh, self.staging) {
            Some(RailTransition::Locked) => self.scroller.stop(),
            Some(RailTransition::Unlocked(_)) => self.scroller.start(),
            None => {}
        }
    }
}
