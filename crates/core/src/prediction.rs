//! Movement prediction
//!
//! Ballistic extrapolation of a player's position, the same integration the
//! host's movement code uses between ticks: constant horizontal velocity,
//! gravity on the vertical axis while airborne, nothing vertical on the
//! ground.

use std::marker::PhantomData;

use srcsdk_macros::Overlay;
use srcsdk_sdk::{Address, Vector};

use crate::context::Sdk;
use crate::entities::EntityFlags;
use crate::error::ResolveError;

/// `sv_gravity` default
pub const DEFAULT_GRAVITY: f32 = 800.0;

/// Tick interval of a 64-tick server
pub const DEFAULT_TICK_INTERVAL: f32 = 1.0 / 64.0;

/// Position after `time` seconds
///
/// On the ground only horizontal velocity applies. In the air the vertical
/// component follows `z + vz*t - g*t²/2`.
pub fn predict_position(origin: Vector, velocity: Vector, time: f32, gravity: f32, on_ground: bool) -> Vector {
    if on_ground {
        return Vector::new(origin.x + velocity.x * time, origin.y + velocity.y * time, origin.z);
    }

    let mut position = origin + velocity * time;
    position.z -= 0.5 * gravity * time * time;
    position
}

/// Position after `ticks` ticks, integrated one tick at a time
///
/// Gravity is applied in two half steps around the move, which makes the
/// result match [`predict_position`] for a whole number of ticks.
pub fn extrapolate_ticks(
    origin: Vector,
    velocity: Vector,
    ticks: u32,
    interval: f32,
    gravity: f32,
    on_ground: bool,
) -> Vector {
    let mut position = origin;
    let mut velocity = velocity;
    if on_ground {
        velocity.z = 0.0;
    }

    for _ in 0..ticks {
        if !on_ground {
            velocity.z -= 0.5 * gravity * interval;
        }
        position = position + velocity * interval;
        if !on_ground {
            velocity.z -= 0.5 * gravity * interval;
        }
    }

    position
}

/// Whole ticks in `time`, rounded to nearest
pub fn time_to_ticks(time: f32, interval: f32) -> i32 {
    (0.5 + time / interval) as i32
}

pub fn ticks_to_time(ticks: i32, interval: f32) -> f32 {
    interval * ticks as f32
}

/// The movement state prediction reads off a player
#[derive(Overlay)]
#[overlay(table = "DT_BasePlayer")]
pub struct PredictionState<'a> {
    ptr: Address,
    sdk: &'a Sdk,

    #[overlay(netvar = "m_vecOrigin", readonly)]
    _origin: PhantomData<Vector>,

    #[overlay(netvar = "m_vecVelocity[0]", readonly)]
    _velocity: PhantomData<Vector>,

    #[overlay(netvar = "m_fFlags", readonly)]
    _flags: PhantomData<EntityFlags>,

    #[overlay(netvar = "m_nTickBase", readonly)]
    _tick_base: PhantomData<i32>,
}

impl PredictionState<'_> {
    pub fn on_ground(&self) -> Result<bool, ResolveError> {
        Ok(self.flags()?.contains(EntityFlags::ON_GROUND))
    }

    /// Predicted position `time` seconds ahead
    pub fn predict(&self, time: f32, gravity: f32) -> Result<Vector, ResolveError> {
        Ok(predict_position(
            self.origin()?,
            self.velocity()?,
            time,
            gravity,
            self.on_ground()?,
        ))
    }

    /// Predicted position `ticks` ticks ahead
    pub fn predict_ticks(&self, ticks: u32, interval: f32, gravity: f32) -> Result<Vector, ResolveError> {
        Ok(extrapolate_ticks(
            self.origin()?,
            self.velocity()?,
            ticks,
            interval,
            gravity,
            self.on_ground()?,
        ))
    }

    /// Player's current simulation time
    pub fn server_time(&self, interval: f32) -> Result<f32, ResolveError> {
        Ok(ticks_to_time(self.tick_base()?, interval))
    }
}
