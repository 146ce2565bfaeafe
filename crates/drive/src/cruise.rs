//! Real-time travel and the locked course-and-speed protocol used during time acceleration.
//!
//! In real time the driving engine nudges the vessel along its forward axis every
//! tick. While the host accelerates time the vessel is on rails, so instead the
//! controller adds one velocity delta representing sustained warp travel and
//! cancels it again on unlock.

use std::fmt;

use blueshift_core::units;
use blueshift_core::vector::{self, Vector3};
use blueshift_orbits::is_inside_body;
use serde::{Deserialize, Serialize};

use crate::host::{Host, on_rails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CruiseState {
    #[default]
    Idle,
    RealtimeTravel,
    CruiseLocked,
}

impl fmt::Display for CruiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CruiseState::Idle => "idle",
            CruiseState::RealtimeTravel => "realtime",
            CruiseState::CruiseLocked => "locked",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockReason {
    TimeAccelerationEnded,
    LocationCrossed,
    Cutoff,
    EngineStopped,
    /// Throttle moved while locked; the lock is retaken at the new speed.
    ThrottleChanged,
}

/// What the controller did this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelOutcome {
    Idle,
    /// Waiting for the frame skip window before locking.
    AwaitingLock,
    Travelled { distance_m: f64 },
    CollisionAvoided,
    Locked { delta: Vector3 },
    Holding,
    Unlocked { reason: UnlockReason },
}

/// Inputs the vessel hands the controller each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelContext {
    /// Current warp speed of the driving engine (fraction of c).
    pub speed_c: f64,
    pub body_radius_m: f64,
    /// An engine won arbitration.
    pub can_drive: bool,
    /// False while the frame skip window is open.
    pub allow_lock: bool,
}

/// Bookkeeping for an active cruise lock.
#[derive(Debug, Clone, PartialEq)]
pub struct CruiseLock {
    pub applied_delta: Vector3,
    pub pre_lock_velocity: Vector3,
    pub frame_velocity_at_lock: Vector3,
    pub body: String,
    pub speed_c: f64,
    pub locked_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CruiseController {
    state: CruiseState,
    lock: Option<CruiseLock>,
}

impl CruiseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CruiseState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub fn active_lock(&self) -> Option<&CruiseLock> {
        self.lock.as_ref()
    }

    /// Advance the controller by one tick.
    pub fn update<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        ctx: &TravelContext,
    ) -> TravelOutcome {
        let accelerated = host.is_time_accelerated();

        if self.is_locked() {
            if host.cutoff_requested() {
                self.unlock(host, UnlockReason::Cutoff);
                host.set_throttle(0.0);
                host.cancel_time_acceleration();
                return TravelOutcome::Unlocked {
                    reason: UnlockReason::Cutoff,
                };
            }
            if !accelerated {
                self.unlock(host, UnlockReason::TimeAccelerationEnded);
                return TravelOutcome::Unlocked {
                    reason: UnlockReason::TimeAccelerationEnded,
                };
            }
            if !ctx.can_drive || ctx.speed_c <= 0.0 {
                self.unlock(host, UnlockReason::EngineStopped);
                return TravelOutcome::Unlocked {
                    reason: UnlockReason::EngineStopped,
                };
            }
            return TravelOutcome::Holding;
        }

        if !ctx.can_drive || ctx.speed_c <= 0.0 {
            self.state = CruiseState::Idle;
            return TravelOutcome::Idle;
        }

        if accelerated {
            if !ctx.allow_lock {
                self.state = CruiseState::Idle;
                return TravelOutcome::AwaitingLock;
            }
            let delta = self.lock(host, ctx.speed_c);
            return TravelOutcome::Locked { delta };
        }

        self.travel(host, ctx)
    }

    /// Capture the pre-cruise velocity and add one delta for sustained warp travel.
    pub fn lock<H: Host + ?Sized>(&mut self, host: &mut H, speed_c: f64) -> Vector3 {
        let universal_time = host.universal_time();
        let pre_lock_velocity = host.orbital_velocity();
        let forward = vector::normalize(&host.forward());
        let delta = vector::scale(&forward, units::c_to_ms(speed_c));

        on_rails(host, |h| h.add_orbital_velocity(delta, universal_time));

        tracing::info!(
            body = host.main_body(),
            speed_c,
            delta_m_s = vector::norm(&delta),
            "locked course and speed"
        );
        self.lock = Some(CruiseLock {
            applied_delta: delta,
            pre_lock_velocity,
            frame_velocity_at_lock: host.main_body_frame_velocity(),
            body: host.main_body().to_string(),
            speed_c,
            locked_at: universal_time,
        });
        self.state = CruiseState::CruiseLocked;
        delta
    }

    /// Cancel the cruise delta, correcting for any change in the reference frame's velocity.
    ///
    /// Returns the delta applied to the vessel, or `None` when nothing was locked.
    pub fn unlock<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        reason: UnlockReason,
    ) -> Option<Vector3> {
        let lock = self.lock.take()?;
        let universal_time = host.universal_time();
        let correction =
            vector::sub(&host.main_body_frame_velocity(), &lock.frame_velocity_at_lock);
        let delta = vector::add(&vector::scale(&lock.applied_delta, -1.0), &correction);

        on_rails(host, |h| h.add_orbital_velocity(delta, universal_time));

        tracing::info!(
            ?reason,
            locked_body = %lock.body,
            body = host.main_body(),
            cruise_seconds = universal_time - lock.locked_at,
            "unlocked course and speed"
        );
        self.state = CruiseState::Idle;
        Some(delta)
    }

    fn travel<H: Host + ?Sized>(&mut self, host: &mut H, ctx: &TravelContext) -> TravelOutcome {
        let forward = vector::normalize(&host.forward());
        let distance_m = units::c_to_ms(ctx.speed_c) * host.delta_time();
        let displacement = vector::scale(&forward, distance_m);
        let destination = vector::add(&host.position(), &displacement);

        if is_inside_body(&destination, &host.main_body_position(), ctx.body_radius_m) {
            tracing::warn!(
                body = host.main_body(),
                speed_c = ctx.speed_c,
                "warp travel aborted: destination inside main body"
            );
            host.set_throttle(0.0);
            host.post_message("Collision imminent! Warp throttle cut.");
            self.state = CruiseState::Idle;
            return TravelOutcome::CollisionAvoided;
        }

        if host.loaded_vessel_count() <= 1 {
            host.shift_floating_origin(displacement);
        } else {
            on_rails(host, |h| h.set_position(destination));
        }
        self.state = CruiseState::RealtimeTravel;
        TravelOutcome::Travelled { distance_m }
    }
}
