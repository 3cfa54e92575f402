//! The locomotion event channel.
//!
//! Notifications are a typed FIFO queue: behaviours emit, the host driver
//! drains once per tick and fans each event out to registered subscribers.
//! Resolver queries are single-owner slots; registering a second owner is
//! rejected at registration time rather than silently multicast.

use std::collections::VecDeque;
use std::fmt;

use crate::context::LocomotionContext;
use crate::logging;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocomotionEvent {
    Land,
    Jump,
    IdleToMove,
    MovingToIdle,
    CrouchStart,
    CrouchStop,
    SlideStart,
    DashStart,
    DashStop,
    WallRunStart,
    WallRunStop,
    WallBounceStart,
    ClimbStart { hide_weapon: bool },
    ClimbStop,
    GrappleStart,
    StaminaDepleted,
    Footstep,
    Died,
}

type Subscriber = Box<dyn FnMut(LocomotionEvent)>;

/// Multicast notification bus. Single logical thread per player, so
/// subscribers are plain closures invoked during the drain.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<LocomotionEvent>,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: LocomotionEvent) {
        self.queue.push_back(event);
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(LocomotionEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Drains every pending event, notifying subscribers in emit order, and
    /// returns the drained events for host-side routing.
    pub fn drain(&mut self) -> Vec<LocomotionEvent> {
        let drained: Vec<_> = self.queue.drain(..).collect();
        for event in &drained {
            for subscriber in &mut self.subscribers {
                subscriber(*event);
            }
        }
        drained
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug)]
pub enum ResolverError {
    AlreadyOwned(&'static str),
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::AlreadyOwned(name) => {
                write!(f, "resolver '{}' already has an owner", name)
            }
        }
    }
}

impl std::error::Error for ResolverError {}

type ResolverFn = Box<dyn Fn(&LocomotionContext) -> bool>;

/// A yes/no query with exactly one answerer. Unowned slots answer `false`
/// (fail-soft: the dependent action is simply skipped).
pub struct ResolverSlot {
    name: &'static str,
    answer: Option<ResolverFn>,
}

impl ResolverSlot {
    pub fn new(name: &'static str) -> Self {
        Self { name, answer: None }
    }

    pub fn register(
        &mut self,
        answer: impl Fn(&LocomotionContext) -> bool + 'static,
    ) -> Result<(), ResolverError> {
        if self.answer.is_some() {
            logging::warn(format!("rejected second owner for resolver '{}'", self.name));
            return Err(ResolverError::AlreadyOwned(self.name));
        }
        self.answer = Some(Box::new(answer));
        Ok(())
    }

    pub fn resolve(&self, ctx: &LocomotionContext) -> bool {
        match &self.answer {
            Some(answer) => answer(ctx),
            None => false,
        }
    }
}

/// The two resolver queries the locomotion core exposes.
pub struct Resolvers {
    pub allow_slide: ResolverSlot,
    pub can_wall_bounce: ResolverSlot,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolvers {
    pub fn new() -> Self {
        Self {
            allow_slide: ResolverSlot::new("allow_slide"),
            can_wall_bounce: ResolverSlot::new("can_wall_bounce"),
        }
    }
}
