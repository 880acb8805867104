//! Standing card effects that react to tiles and played cards.

use super::GameSession;
use crate::{
    events::GameEvent,
    game::{
        behavior::Occurrence,
        cards::CardDef,
        effects::EffectRequest,
        player::{Player, PlayerEffect},
    },
};

impl GameSession {
    /// Puts a card's reactive behaviors on its owner's tableau.
    pub(super) fn register_effects(&self, player: &Player, card: &CardDef) {
        let effects: Vec<PlayerEffect> = card
            .reactive_behaviors()
            .map(|(behavior_index, behavior)| PlayerEffect {
                card_id: card.id.clone(),
                behavior_index,
                behavior: behavior.clone(),
            })
            .collect();
        if effects.is_empty() {
            return;
        }
        log::debug!(
            "Session {}: {} registers {} effect(s) for player {}",
            self.id,
            card.id,
            effects.len(),
            player.id()
        );
        player.add_effects(effects);
    }

    /// Resolves every standing effect that listens for `occurrence`.
    /// Effects never veto what triggered them: a failed one is logged and
    /// skipped.
    pub(super) fn fire_triggers(&self, actor: &Player, occurrence: Occurrence<'_>) {
        let players = self.players();
        for owner in &players {
            let own = owner.id() == actor.id();
            for effect in owner.effects() {
                let Some(condition) = &effect.behavior.condition else {
                    continue;
                };
                if !own && !condition.any_player {
                    continue;
                }
                let times = condition.times(occurrence);
                if times == 0 {
                    continue;
                }
                if !own && effect.behavior.needs_owner_turn() {
                    log::warn!(
                        "Session {}: {} needs its owner's turn, skipping",
                        self.id,
                        effect.card_id
                    );
                    continue;
                }

                for _ in 0..times {
                    let resolved = self.engine(&players).resolve(
                        owner,
                        &effect.behavior,
                        &EffectRequest {
                            source: &effect.card_id,
                            source_card: Some(&effect.card_id),
                            ..EffectRequest::default()
                        },
                    );
                    match resolved {
                        Ok(outcome) => {
                            self.bus.publish(GameEvent::CardEffectTriggered {
                                game_id: self.id,
                                player_id: owner.id(),
                                card_id: effect.card_id.clone(),
                                behavior: effect.behavior_index,
                            });
                            self.absorb(owner, outcome);
                        }
                        Err(e) => {
                            log::warn!(
                                "Session {}: effect of {} not applied: {e}",
                                self.id,
                                effect.card_id
                            );
                            break;
                        }
                    }
                }
            }
        }
    }
}
