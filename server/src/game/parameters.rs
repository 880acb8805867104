//! Temperature, oxygen and oceans.

use crate::{
    events::{EventBus, GameEvent},
    game::{read, types::GameId, write},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub const MIN_TEMPERATURE: i32 = -30;
pub const MAX_TEMPERATURE: i32 = 8;
/// Degrees per temperature step.
pub const TEMPERATURE_STEP: i32 = 2;
pub const MIN_OXYGEN: i32 = 0;
pub const MAX_OXYGEN: i32 = 14;
pub const MIN_OCEANS: i32 = 0;
pub const MAX_OCEANS: i32 = 9;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ParameterState {
    pub temperature: i32,
    pub oxygen: i32,
    pub oceans: i32,
}

impl Default for ParameterState {
    fn default() -> Self {
        ParameterState {
            temperature: MIN_TEMPERATURE,
            oxygen: MIN_OXYGEN,
            oceans: MIN_OCEANS,
        }
    }
}

impl ParameterState {
    pub fn is_maxed(&self) -> bool {
        self.temperature >= MAX_TEMPERATURE && self.oxygen >= MAX_OXYGEN && self.oceans >= MAX_OCEANS
    }
}

#[derive(Debug)]
pub struct GlobalParameters {
    game_id: GameId,
    bus: Arc<EventBus>,
    state: RwLock<ParameterState>,
}

impl GlobalParameters {
    pub fn new(game_id: GameId, bus: Arc<EventBus>) -> Self {
        Self::with_state(game_id, ParameterState::default(), bus)
    }

    pub fn with_state(game_id: GameId, state: ParameterState, bus: Arc<EventBus>) -> Self {
        GlobalParameters {
            game_id,
            bus,
            state: RwLock::new(state),
        }
    }

    pub fn get(&self) -> ParameterState {
        *read(&self.state)
    }

    pub fn temperature(&self) -> i32 {
        read(&self.state).temperature
    }

    pub fn oxygen(&self) -> i32 {
        read(&self.state).oxygen
    }

    pub fn oceans(&self) -> i32 {
        read(&self.state).oceans
    }

    pub fn is_maxed(&self) -> bool {
        read(&self.state).is_maxed()
    }

    /// Raises temperature by `steps` steps of 2 degrees, clamped at the max.
    /// Returns the number of steps actually raised.
    pub fn increase_temperature(&self, steps: i32) -> i32 {
        if steps <= 0 {
            return 0;
        }
        let (old_value, new_value) = {
            let mut state = write(&self.state);
            let old = state.temperature;
            state.temperature = (old + steps * TEMPERATURE_STEP).min(MAX_TEMPERATURE);
            (old, state.temperature)
        };
        if new_value == old_value {
            log::debug!("Game {} temperature already at max", self.game_id);
            return 0;
        }
        self.bus.publish(GameEvent::TemperatureChanged {
            game_id: self.game_id,
            old_value,
            new_value,
        });
        (new_value - old_value) / TEMPERATURE_STEP
    }

    /// Returns the number of percentage points actually raised.
    pub fn increase_oxygen(&self, steps: i32) -> i32 {
        if steps <= 0 {
            return 0;
        }
        let (old_value, new_value) = {
            let mut state = write(&self.state);
            let old = state.oxygen;
            state.oxygen = (old + steps).min(MAX_OXYGEN);
            (old, state.oxygen)
        };
        if new_value == old_value {
            log::debug!("Game {} oxygen already at max", self.game_id);
            return 0;
        }
        self.bus.publish(GameEvent::OxygenChanged {
            game_id: self.game_id,
            old_value,
            new_value,
        });
        new_value - old_value
    }

    /// Records one more ocean. `false` once all oceans are placed.
    pub fn place_ocean(&self) -> bool {
        let (old_value, new_value) = {
            let mut state = write(&self.state);
            let old = state.oceans;
            state.oceans = (old + 1).min(MAX_OCEANS);
            (old, state.oceans)
        };
        if new_value == old_value {
            return false;
        }
        self.bus.publish(GameEvent::OceansChanged {
            game_id: self.game_id,
            old_value,
            new_value,
        });
        true
    }
}
