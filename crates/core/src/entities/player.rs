//! Entity overlays
//!
//! Networked fields resolve through the class tables at first use, so these
//! overlays keep working across host updates that only move fields around.
//! Fields the host does not network come from the offset table instead.

use std::marker::PhantomData;

use bitflags::bitflags;
use srcsdk_macros::Overlay;
use srcsdk_sdk::{Address, QAngle, Vector};

use crate::context::Sdk;
use crate::error::ResolveError;

bitflags! {
    /// `m_fFlags` bits
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u32 {
        const ON_GROUND = 1 << 0;
        const DUCKING = 1 << 1;
        const WATER_JUMP = 1 << 2;
        const ON_TRAIN = 1 << 3;
        const IN_RAIN = 1 << 4;
        const FROZEN = 1 << 5;
        const AT_CONTROLS = 1 << 6;
        const CLIENT = 1 << 7;
        const FAKE_CLIENT = 1 << 8;
        const IN_WATER = 1 << 9;
    }
}

/// `m_lifeState` values
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Alive = 0,
    Dying = 1,
    Dead = 2,
    Respawnable = 3,
    DiscardBody = 4,
}

impl From<u8> for LifeState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Alive,
            1 => Self::Dying,
            2 => Self::Dead,
            3 => Self::Respawnable,
            _ => Self::DiscardBody,
        }
    }
}

/// Overlay for `CBaseEntity`
#[derive(Overlay)]
#[overlay(table = "DT_BaseEntity")]
pub struct BaseEntity<'a> {
    ptr: Address,
    sdk: &'a Sdk,

    #[overlay(netvar = "m_iTeamNum")]
    _team: PhantomData<i32>,

    #[overlay(netvar = "m_vecOrigin")]
    _origin: PhantomData<Vector>,

    #[overlay(netvar = "m_flSimulationTime", readonly)]
    _simulation_time: PhantomData<f32>,
}

/// Overlay for `CBasePlayer`
#[derive(Overlay)]
#[overlay(table = "DT_BasePlayer", structure = "Player")]
pub struct Player<'a> {
    ptr: Address,
    sdk: &'a Sdk,

    #[overlay(netvar = "m_iHealth")]
    _health: PhantomData<i32>,

    #[overlay(netvar = "m_iTeamNum")]
    _team: PhantomData<i32>,

    #[overlay(netvar = "m_fFlags")]
    _flags: PhantomData<EntityFlags>,

    #[overlay(netvar = "m_lifeState")]
    _life_state_raw: PhantomData<u8>,

    #[overlay(netvar = "m_vecOrigin")]
    _origin: PhantomData<Vector>,

    #[overlay(netvar = "m_vecVelocity[0]")]
    _velocity: PhantomData<Vector>,

    #[overlay(netvar = "m_Local.m_vecPunchAngle", readonly)]
    _punch_angle: PhantomData<QAngle>,

    #[overlay(offset = "MoveType")]
    _move_type: PhantomData<u8>,
}

impl<'a> Player<'a> {
    pub fn life_state(&self) -> Result<LifeState, ResolveError> {
        self.life_state_raw().map(LifeState::from)
    }

    /// Alive and above zero health
    pub fn is_alive(&self) -> Result<bool, ResolveError> {
        Ok(self.life_state()? == LifeState::Alive && self.health()? > 0)
    }

    pub fn on_ground(&self) -> Result<bool, ResolveError> {
        Ok(self.flags()?.contains(EntityFlags::ON_GROUND))
    }

    /// The same object viewed as a plain entity
    pub fn entity(&self) -> BaseEntity<'a> {
        BaseEntity {
            ptr: self.ptr,
            sdk: self.sdk,
            _team: PhantomData,
            _origin: PhantomData,
            _simulation_time: PhantomData,
        }
    }
}

impl std::fmt::Debug for Player<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("ptr", &self.ptr)
            .field("health", &self.health().ok())
            .field("team", &self.team().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::netvars::fixtures::player_classes;
    use crate::overlay::Overlay;

    fn offsets() -> HashMap<(String, String), i64> {
        let mut table = HashMap::new();
        table.insert(("Player".to_string(), "MoveType".to_string()), 0x258);
        table
    }

    #[test]
    fn test_player_reads_and_writes() {
        let classes = player_classes();
        let sdk = Sdk::builder()
            .class_list(classes.head())
            .offsets(offsets())
            .build();

        let mut object = vec![0u8; 0x3100];
        let base = Address::from_ptr(object.as_mut_ptr());
        unsafe {
            base.write(87i32, 0x100);
            base.write(3i32, 0xF4);
            base.write((EntityFlags::ON_GROUND | EntityFlags::DUCKING).bits(), 0x104);
            base.write(0u8, 0x25F);
            base.write(Vector::new(1.0, 2.0, 3.0), 0x138);
            base.write(Vector::new(250.0, 0.0, 0.0), 0x114);
            base.write(QAngle { pitch: -1.5, yaw: 0.5, roll: 0.0 }, 0x2FAC + 0x70);
            base.write(2u8, 0x258);
        }

        let mut player = unsafe { Player::new(&sdk, base) }.unwrap();
        assert_eq!(player.health(), Ok(87));
        assert_eq!(player.team(), Ok(3));
        assert_eq!(player.origin(), Ok(Vector::new(1.0, 2.0, 3.0)));
        assert_eq!(player.velocity().unwrap().x, 250.0);
        assert_eq!(player.punch_angle().unwrap().pitch, -1.5);
        assert_eq!(player.move_type(), Ok(2));
        assert!(player.on_ground().unwrap());
        assert!(player.is_alive().unwrap());

        player.set_health(0).unwrap();
        assert_eq!(unsafe { base.read::<i32>(0x100) }, 0);
        assert!(!player.is_alive().unwrap());

        player.set_flags(EntityFlags::IN_WATER).unwrap();
        assert!(!player.on_ground().unwrap());

        assert_eq!(player.entity().team(), Ok(3));
        assert_eq!(player.entity().origin(), player.origin());
        assert_eq!(player.health_view().unwrap().address(), base + 0x100);
    }

    #[test]
    fn test_missing_lookups_surface_as_errors() {
        let classes = player_classes();
        // No offset table entry for MoveType
        let sdk = Sdk::builder().class_list(classes.head()).build();

        let mut object = vec![0u8; 0x400];
        let player = unsafe { Player::new(&sdk, Address::from_ptr(object.as_mut_ptr())) }.unwrap();

        assert!(matches!(
            player.move_type(),
            Err(ResolveError::OffsetNotFound { .. })
        ));
        assert!(player.health().is_ok());
    }

    #[test]
    fn test_null_and_constants() {
        let sdk = Sdk::builder().build();
        assert!(unsafe { Player::new(&sdk, Address::NULL) }.is_none());
        assert!(unsafe { <BaseEntity as Overlay>::from_address(&sdk, Address::NULL) }.is_none());

        assert_eq!(Player::TABLE, Some("DT_BasePlayer"));
        assert_eq!(Player::STRUCTURE, Some("Player"));
        assert_eq!(Player::HEALTH_FIELD, "m_iHealth");
        assert_eq!(Player::PUNCH_ANGLE_FIELD, "m_Local.m_vecPunchAngle");
        assert_eq!(<BaseEntity as Overlay>::STRUCTURE, None);
    }

    #[test]
    fn test_life_state_conversion() {
        assert_eq!(LifeState::from(0), LifeState::Alive);
        assert_eq!(LifeState::from(2), LifeState::Dead);
        assert_eq!(LifeState::from(200), LifeState::DiscardBody);
    }
}
