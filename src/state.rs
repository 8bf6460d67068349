//! Per-entity state machine
//!
//! States are data-carrying variants that own the timers they arm, so a
//! transition cannot leak one: whatever `enter` started, `exit` kills.
//! Entry effects (pose, cue, velocity) run once in `enter`; the only
//! per-tick logic is the idle/walk swap driven by horizontal motion.
//! Everything else leaves on a timer or a contact.

use serde::{Deserialize, Serialize};

use crate::behaviour::animation::AnimKind;
use crate::behaviour::sound::SoundCue;
use crate::command::{Condition, SimCommand};
use crate::entity::{GameObject, SimCtx};
use crate::timing::{Interval, Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Idle,
    Walk,
    Jump,
    Hurt,
    Dead,
    Alert,
    Attack,
    Rotation,
}

impl StateKind {
    /// The pose a state presents while active. Long-idle swaps the pose
    /// without leaving [`StateKind::Idle`].
    pub fn anim(self) -> AnimKind {
        match self {
            StateKind::Idle => AnimKind::Idle,
            StateKind::Walk => AnimKind::Walk,
            StateKind::Jump => AnimKind::Jump,
            StateKind::Hurt => AnimKind::Hurt,
            StateKind::Dead => AnimKind::Dead,
            StateKind::Alert => AnimKind::Alert,
            StateKind::Attack => AnimKind::Attack,
            StateKind::Rotation => AnimKind::Rotation,
        }
    }
}

/// The active state of one entity, holding the timers it armed
#[derive(Debug, Clone)]
pub enum EntityState {
    Idle {
        long_idle: TimerId,
        /// Armed later, when the long-idle delay elapses.
        snore: Option<TimerId>,
    },
    Walk {
        /// Absent when the species binds no step cue.
        footsteps: Option<TimerId>,
    },
    Jump,
    Hurt {
        recovery: TimerId,
    },
    Dead {
        cleanup: TimerId,
    },
    Alert {
        windup: TimerId,
    },
    Attack {
        finish: TimerId,
    },
    Rotation,
}

impl EntityState {
    pub fn kind(&self) -> StateKind {
        match self {
            EntityState::Idle { .. } => StateKind::Idle,
            EntityState::Walk { .. } => StateKind::Walk,
            EntityState::Jump => StateKind::Jump,
            EntityState::Hurt { .. } => StateKind::Hurt,
            EntityState::Dead { .. } => StateKind::Dead,
            EntityState::Alert { .. } => StateKind::Alert,
            EntityState::Attack { .. } => StateKind::Attack,
            EntityState::Rotation => StateKind::Rotation,
        }
    }

    /// Run a state's entry effects and hand back the live state.
    pub(crate) fn enter(kind: StateKind, obj: &mut GameObject, ctx: &mut SimCtx<'_>) -> Self {
        obj.set_animation(kind.anim());
        match kind {
            StateKind::Idle => {
                let long_idle = ctx.scheduler.start_timer(
                    SimCommand::BeginLongIdle { entity: obj.id },
                    ctx.settings.long_idle_delay_ms,
                    true,
                );
                EntityState::Idle {
                    long_idle,
                    snore: None,
                }
            }
            StateKind::Walk => {
                let footsteps = obj
                    .sounds
                    .as_ref()
                    .and_then(|sounds| sounds.key(SoundCue::Step))
                    .map(|key| {
                        let key = key.to_owned();
                        let steps = Interval::new(
                            SimCommand::PlaySound { key: key.clone() },
                            ctx.settings.footstep_period_ms,
                            true,
                        )
                        .with_pause_command(SimCommand::StopSound { key: key.clone() })
                        .with_stop_when(Condition::Gone(obj.id))
                        .with_stop_command(SimCommand::StopSound { key });
                        ctx.scheduler.start_interval(steps)
                    });
                EntityState::Walk { footsteps }
            }
            StateKind::Jump => {
                obj.play_cue(SoundCue::Jump, ctx.audio);
                EntityState::Jump
            }
            StateKind::Hurt => {
                obj.play_cue(SoundCue::Hurt, ctx.audio);
                let recovery = ctx.scheduler.start_timer(
                    SimCommand::SetState {
                        entity: obj.id,
                        kind: None,
                    },
                    ctx.settings.hurt_recovery_ms,
                    true,
                );
                EntityState::Hurt { recovery }
            }
            StateKind::Dead => {
                obj.halt();
                obj.play_cue(SoundCue::Die, ctx.audio);
                // corpses keep their pose but leave the pair scan
                ctx.colliders.deregister(obj.id);
                let cleanup = ctx.scheduler.start_timer(
                    SimCommand::Despawn { entity: obj.id },
                    ctx.settings.death_cleanup_ms,
                    true,
                );
                EntityState::Dead { cleanup }
            }
            StateKind::Alert => {
                if let Some(movement) = obj.movement.as_mut() {
                    movement.velocity.x = 0.0;
                }
                obj.play_cue(SoundCue::Bellow, ctx.audio);
                let windup = ctx.scheduler.start_timer(
                    SimCommand::SetState {
                        entity: obj.id,
                        kind: Some(StateKind::Attack),
                    },
                    ctx.settings.alert_windup_ms,
                    true,
                );
                EntityState::Alert { windup }
            }
            StateKind::Attack => {
                obj.play_cue(SoundCue::Chitter, ctx.audio);
                let lunge = obj.facing.sign() * ctx.settings.attack_lunge_speed;
                if let Some(movement) = obj.movement.as_mut() {
                    movement.velocity.x = lunge;
                }
                let finish = ctx.scheduler.start_timer(
                    SimCommand::SetState {
                        entity: obj.id,
                        kind: Some(StateKind::Walk),
                    },
                    ctx.settings.attack_duration_ms,
                    true,
                );
                EntityState::Attack { finish }
            }
            StateKind::Rotation => EntityState::Rotation,
        }
    }

    /// Tear the state down on the way out. Owned loops stop through
    /// [`Scheduler::stop_interval`] so their stop commands still run.
    pub(crate) fn exit(self, obj: &mut GameObject, ctx: &mut SimCtx<'_>) {
        match self {
            EntityState::Idle { long_idle, snore } => {
                ctx.scheduler.kill(long_idle);
                if let Some(id) = snore {
                    if let Some(stop) = ctx.scheduler.stop_interval(id) {
                        ctx.commands.push(stop);
                    }
                }
            }
            EntityState::Walk { footsteps } => {
                if let Some(id) = footsteps {
                    if let Some(stop) = ctx.scheduler.stop_interval(id) {
                        ctx.commands.push(stop);
                    }
                }
            }
            EntityState::Jump | EntityState::Rotation => {}
            EntityState::Hurt { recovery } => ctx.scheduler.kill(recovery),
            EntityState::Dead { cleanup } => ctx.scheduler.kill(cleanup),
            EntityState::Alert { windup } => ctx.scheduler.kill(windup),
            EntityState::Attack { finish } => {
                ctx.scheduler.kill(finish);
                // the lunge ends with the state
                if let Some(movement) = obj.movement.as_mut() {
                    movement.velocity.x = 0.0;
                }
            }
        }
    }

    /// Per-tick state logic: only the idle/walk pair reacts to motion.
    pub(crate) fn update(&self, moving: bool) -> Option<StateKind> {
        match self {
            EntityState::Idle { .. } if moving => Some(StateKind::Walk),
            EntityState::Walk { .. } if !moving => Some(StateKind::Idle),
            _ => None,
        }
    }

    /// Kill every timer this state owns without running exit effects; the
    /// destroy path uses this when the whole entity is going away.
    pub(crate) fn kill_timers(&self, scheduler: &mut Scheduler<SimCommand>) {
        match self {
            EntityState::Idle { long_idle, snore } => {
                scheduler.kill(*long_idle);
                if let Some(id) = snore {
                    scheduler.kill(*id);
                }
            }
            EntityState::Walk { footsteps } => {
                if let Some(id) = footsteps {
                    scheduler.kill(*id);
                }
            }
            EntityState::Jump | EntityState::Rotation => {}
            EntityState::Hurt { recovery } => scheduler.kill(*recovery),
            EntityState::Dead { cleanup } => scheduler.kill(*cleanup),
            EntityState::Alert { windup } => scheduler.kill(*windup),
            EntityState::Attack { finish } => scheduler.kill(*finish),
        }
    }
}
