//! The simulation world
//!
//! [`Simulation`] owns every registry (entities, scheduler, colliders,
//! trigger watchers) and is the single writer: timers, contacts and
//! watchers act through [`SimCommand`] values the world applies at defined
//! points of the tick, one mutable borrow at a time. Hosts drive it with
//! real frame deltas and read back a [`RenderView`]; tests drive it with
//! exact deltas and read the registries.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::assets::{AssetProvider, ImageHandle};
use crate::audio::SoundSink;
use crate::behaviour::animation::AnimKind;
use crate::behaviour::resource::{Resource, ResourceKind};
use crate::behaviour::sound::SoundCue;
use crate::collision::{CollisionManager, Contact};
use crate::command::{Condition, SimCommand};
use crate::entity::{
    factory, EntityId, EntityMap, Facing, GameObject, ProfileSet, SimCtx, SpeciesKind,
};
use crate::error::{SimError, SimResult};
use crate::math::Vec2;
use crate::settings::{SpawnPlan, WorldSettings};
use crate::state::{EntityState, StateKind};
use crate::status::StatusSink;
use crate::timing::{Interval, Scheduler};
use crate::trigger::{TriggerManager, Watcher};

/// How long a snore takes to fade when something disturbs the sleeper.
const SNORE_FADE_MS: f64 = 400.0;

/// Held input flags for one entity; each call replaces the previous set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputIntent {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

/// One drawable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub entity: EntityId,
    pub position: Vec2,
    pub dimensions: Vec2,
    pub facing: Facing,
    /// None for species without strips; hosts skip those.
    pub image: Option<ImageHandle>,
}

/// Everything the host needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    /// Sprites in spawn order, so later spawns draw on top.
    pub sprites: Vec<Sprite>,
    /// Camera line: ahead of the tracked player, clamped to the world.
    pub camera_x: f32,
}

/// The whole simulation behind one facade
pub struct Simulation {
    settings: WorldSettings,
    profiles: ProfileSet,
    scheduler: Scheduler<SimCommand>,
    entities: EntityMap,
    colliders: CollisionManager,
    triggers: TriggerManager,
    assets: Box<dyn AssetProvider>,
    audio: Box<dyn SoundSink>,
    status: Box<dyn StatusSink>,
    rng: SmallRng,
    next_entity: u64,
    /// The most recently spawned drifter; camera and gates track it.
    player: Option<EntityId>,
    paused: bool,
    /// Removals queued during a pass; applied once the pass ends.
    despawn_queue: Vec<EntityId>,
}

impl Simulation {
    /// A world with the builtin species roster.
    pub fn new(
        settings: WorldSettings,
        assets: Box<dyn AssetProvider>,
        audio: Box<dyn SoundSink>,
        status: Box<dyn StatusSink>,
    ) -> SimResult<Self> {
        Self::with_profiles(settings, ProfileSet::builtin(), assets, audio, status)
    }

    /// A world with a custom (for example RON-overridden) roster.
    pub fn with_profiles(
        settings: WorldSettings,
        profiles: ProfileSet,
        assets: Box<dyn AssetProvider>,
        audio: Box<dyn SoundSink>,
        status: Box<dyn StatusSink>,
    ) -> SimResult<Self> {
        settings.validate()?;
        profiles.validate_all()?;

        let mut scheduler = Scheduler::new();
        scheduler.start_interval(Interval::new(
            SimCommand::RunUpdates,
            settings.tick_interval_ms,
            true,
        ));
        let rng = SmallRng::seed_from_u64(settings.rng_seed);
        info!(
            tick_ms = settings.tick_interval_ms,
            seed = settings.rng_seed,
            "simulation created"
        );

        Ok(Self {
            settings,
            profiles,
            scheduler,
            entities: EntityMap::new(),
            colliders: CollisionManager::new(),
            triggers: TriggerManager::new(),
            assets,
            audio,
            status,
            rng,
            next_entity: 0,
            player: None,
            paused: false,
            despawn_queue: Vec::new(),
        })
    }

    /// Advance the clock by a frame delta and run everything that came
    /// due. The primary interval turns elapsed time into update passes,
    /// so a host can feed uneven real deltas and still get fixed steps.
    pub fn tick(&mut self, delta_ms: f64) -> SimResult<()> {
        let batch = self.scheduler.tick(delta_ms);
        for command in batch.fired {
            self.apply(command)?;
        }
        for (id, condition) in batch.stop_checks {
            if Self::eval_condition(&self.entities, &condition) {
                if let Some(stop) = self.scheduler.stop_interval(id) {
                    self.apply(stop)?;
                }
            }
        }
        self.flush_despawns();
        Ok(())
    }

    /// The single dispatch point for deferred work.
    fn apply(&mut self, command: SimCommand) -> SimResult<()> {
        match command {
            SimCommand::RunUpdates => self.run_updates()?,
            SimCommand::SetState { entity, kind } => self.request_state(entity, kind)?,
            SimCommand::BeginLongIdle { entity } => self.begin_long_idle(entity),
            SimCommand::RestoreTargets { entity, species } => {
                if let Some(body) = self
                    .entities
                    .get_mut(&entity)
                    .and_then(|obj| obj.collision.as_mut())
                {
                    body.restore_targets(&species);
                }
            }
            SimCommand::Spawn { species, position } => {
                self.spawn(species, position)?;
            }
            SimCommand::Despawn { entity } => self.despawn_queue.push(entity),
            SimCommand::Shatter { entity } => self.shatter(entity),
            SimCommand::PlaySound { key } => self.audio.play(&key),
            SimCommand::StopSound { key } => self.audio.stop(&key),
            SimCommand::FadeOutSound { key, over_ms } => self.audio.fade_out(&key, over_ms),
        }
        Ok(())
    }

    /// One fixed step: entity updates, the contact pass over the refreshed
    /// rects, then the trigger pass. Each stage's deferred commands apply
    /// before the next stage starts.
    fn run_updates(&mut self) -> SimResult<()> {
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        let mut queued = Vec::new();
        for id in ids {
            if let Some(obj) = self.entities.get_mut(&id) {
                let mut ctx = SimCtx {
                    settings: &self.settings,
                    scheduler: &mut self.scheduler,
                    colliders: &mut self.colliders,
                    audio: self.audio.as_mut(),
                    commands: &mut queued,
                };
                obj.update(&mut ctx);
            }
        }
        for command in queued {
            self.apply(command)?;
        }

        let contacts = self.colliders.check_all(&self.entities);
        for contact in contacts {
            self.apply_contact(&contact)?;
        }

        // Watchers are consumed before their commands run, so a command
        // that re-arms a similar watcher cannot refire the original.
        let fired = self
            .triggers
            .collect_fired(|condition| Self::eval_condition(&self.entities, condition));
        for watcher in fired {
            debug!(when = ?watcher.when, "watcher fired");
            for command in watcher.then {
                self.apply(command)?;
            }
        }

        self.flush_despawns();
        Ok(())
    }

    fn apply_contact(&mut self, contact: &Contact) -> SimResult<()> {
        self.hit(contact.first, contact.second)?;
        self.hit(contact.second, contact.first)?;
        Ok(())
    }

    /// Apply one side's contact facets to the other. Either entity may
    /// already be gone from resolving an earlier contact this pass.
    fn hit(&mut self, attacker: EntityId, target: EntityId) -> SimResult<()> {
        let Some(obj) = self.entities.get(&attacker) else {
            return Ok(());
        };
        let Some(body) = obj.collision.as_ref() else {
            return Ok(());
        };
        let species = obj.species;
        let (strike, bounty, brittle) = (body.strike, body.bounty, body.brittle);

        if let Some(damage) = strike {
            self.strike(target, species, damage)?;
        }
        if let Some((kind, amount)) = bounty {
            self.collect(target, attacker, kind, amount);
        }
        if brittle {
            self.shatter(attacker);
        }
        Ok(())
    }

    /// Contact damage: spend health, open the invulnerability window, and
    /// drop the victim into hurt or dead. Species without health shrug
    /// strikes off.
    fn strike(&mut self, target: EntityId, attacker: SpeciesKind, damage: u32) -> SimResult<()> {
        let Some(obj) = self.entities.get_mut(&target) else {
            return Ok(());
        };
        let Some(health) = obj
            .resources
            .as_mut()
            .and_then(|resources| resources.get_mut(ResourceKind::Health))
        else {
            return Ok(());
        };
        if !health.spend(damage) {
            return Ok(());
        }
        let (current, max) = (health.current(), health.max());
        debug!(entity = %target, by = %attacker, damage, health = current, "strike");

        if let Some(body) = obj.collision.as_mut() {
            body.add_cooldown(
                target,
                &[attacker],
                self.settings.contact_cooldown_ms,
                &mut self.scheduler,
            );
        }
        self.status
            .resource_changed(target, ResourceKind::Health, current, max);
        let next = if current == 0 {
            StateKind::Dead
        } else {
            StateKind::Hurt
        };
        self.request_state(target, Some(next))
    }

    /// A pickup's bounty: cue, grant, and spend the pickup itself.
    fn collect(&mut self, collector: EntityId, pickup: EntityId, kind: ResourceKind, amount: u32) {
        if let Some(obj) = self.entities.get(&pickup) {
            obj.play_cue(SoundCue::Collect, self.audio.as_mut());
        }
        if let Some(obj) = self.entities.get_mut(&collector) {
            if let Some((current, max)) = obj
                .resources
                .as_mut()
                .and_then(|resources| resources.add(kind, amount))
            {
                debug!(entity = %collector, ?kind, amount, "bounty collected");
                self.status.resource_changed(collector, kind, current, max);
            }
        }
        self.despawn_queue.push(pickup);
    }

    /// Start a brittle body's end: freeze in place, leave the pair scan,
    /// and run the one-shot strip whose completion despawns. Species
    /// without a shatter strip skip straight to the despawn.
    fn shatter(&mut self, entity: EntityId) {
        let Some(obj) = self.entities.get_mut(&entity) else {
            return;
        };
        if obj
            .animation
            .as_ref()
            .is_some_and(|anim| anim.current_kind() == AnimKind::Shatter)
        {
            return; // already underway
        }
        debug!(entity = %entity, "shatter");
        obj.halt();
        obj.gravity = None;
        obj.play_cue(SoundCue::Shatter, self.audio.as_mut());
        self.colliders.deregister(entity);
        if obj
            .animation
            .as_ref()
            .is_some_and(|anim| anim.has(AnimKind::Shatter))
        {
            obj.set_animation(AnimKind::Shatter);
        } else {
            self.despawn_queue.push(entity);
        }
    }

    /// Apply a state request. The entity may have despawned in the same
    /// batch the request fired in; that is a skip, not an error.
    fn request_state(&mut self, entity: EntityId, kind: Option<StateKind>) -> SimResult<()> {
        let Some(obj) = self.entities.get_mut(&entity) else {
            debug!(entity = %entity, "state request for missing entity; skipped");
            return Ok(());
        };
        let mut queued = Vec::new();
        let mut ctx = SimCtx {
            settings: &self.settings,
            scheduler: &mut self.scheduler,
            colliders: &mut self.colliders,
            audio: self.audio.as_mut(),
            commands: &mut queued,
        };
        obj.set_state(kind, &mut ctx);
        for command in queued {
            self.apply(command)?;
        }
        Ok(())
    }

    /// The long-idle timer fired: swap to the long-idle pose and start the
    /// snore loop. The owner may have left idle in the same batch; its
    /// exit killed the timer, but the fired command can still be in
    /// flight, so the state is checked again here.
    fn begin_long_idle(&mut self, entity: EntityId) {
        let Some(obj) = self.entities.get_mut(&entity) else {
            return;
        };
        if obj.state_kind() != Some(StateKind::Idle) {
            return;
        }
        debug!(entity = %entity, "long idle");
        obj.set_animation(AnimKind::IdleLong);

        let Some(key) = obj
            .sounds
            .as_ref()
            .and_then(|sounds| sounds.key(SoundCue::Snore))
        else {
            return;
        };
        let key = key.to_owned();
        let snore_loop = Interval::new(
            SimCommand::PlaySound { key: key.clone() },
            self.settings.snore_period_ms,
            true,
        )
        .with_pause_command(SimCommand::StopSound { key: key.clone() })
        .with_stop_when(Condition::Gone(entity))
        .with_stop_command(SimCommand::FadeOutSound {
            key,
            over_ms: SNORE_FADE_MS,
        });
        let id = self.scheduler.start_interval(snore_loop);
        if let Some(EntityState::Idle { snore, .. }) = obj.state.as_mut() {
            *snore = Some(id);
        }
    }

    /// Bring a species into the world. Ids are monotonic, so registration
    /// (and contact) order is spawn order.
    pub fn spawn(&mut self, species: SpeciesKind, position: Vec2) -> SimResult<EntityId> {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;

        let obj = {
            let profile = self.profiles.get(species);
            factory::build(id, species, profile, position, self.assets.as_ref(), &mut self.rng)?
        };
        let trigger_defs = self.profiles.get(species).triggers.clone();
        debug!(entity = %id, %species, x = position.x, y = position.y, "spawn");

        // Initial counters, so hosts can draw meters before anything
        // changes.
        if let Some(resources) = obj.resources.as_ref() {
            for (kind, resource) in resources.iter() {
                self.status
                    .resource_changed(id, kind, resource.current(), resource.max());
            }
        }

        if obj.collision.is_some() {
            self.colliders.register(id);
        }
        if species == SpeciesKind::Drifter {
            self.player = Some(id);
        }
        for def in &trigger_defs {
            match def.resolve(id, position, self.player) {
                Some(watcher) => self.triggers.arm(watcher),
                None => warn!(entity = %id, "trigger needs a tracked player; skipped"),
            }
        }

        let has_default = obj.default_state.is_some();
        self.entities.insert(id, obj);
        if has_default {
            self.request_state(id, None)?;
        }
        Ok(id)
    }

    /// Seed a run: immediate spawns in plan order, then the gates armed as
    /// plan-owned watchers against the tracked player. Plans that want
    /// gates must list their drifter before them.
    pub fn populate(&mut self, plan: &SpawnPlan) -> SimResult<()> {
        for entry in &plan.spawns {
            self.spawn(entry.species, entry.position)?;
        }
        for gate in &plan.gates {
            let Some(player) = self.player else {
                warn!(species = %gate.species, "spawn gate without a tracked player; skipped");
                continue;
            };
            self.triggers.arm(Watcher {
                owner: None,
                when: Condition::PastX {
                    entity: player,
                    x: gate.past_x,
                },
                then: vec![SimCommand::Spawn {
                    species: gate.species,
                    position: gate.position,
                }],
            });
        }
        Ok(())
    }

    /// Spend a flask and launch it from the thrower's hands. Returns
    /// false, changing nothing, when the thrower has none left.
    pub fn throw_flask(&mut self, thrower: EntityId) -> SimResult<bool> {
        let Some(obj) = self.entities.get_mut(&thrower) else {
            return Err(SimError::LookupMiss {
                what: "entity",
                id: thrower.0,
            });
        };
        if obj.is_dead() {
            return Ok(false);
        }
        let Some(flasks) = obj
            .resources
            .as_mut()
            .and_then(|resources| resources.get_mut(ResourceKind::Flasks))
        else {
            return Ok(false);
        };
        if !flasks.spend(1) {
            return Ok(false);
        }
        let (current, max) = (flasks.current(), flasks.max());
        let facing = obj.facing;
        let origin = obj.position;
        let dims = obj.dimensions;
        obj.play_cue(SoundCue::Throw, self.audio.as_mut());
        self.status
            .resource_changed(thrower, ResourceKind::Flasks, current, max);

        // Launch speeds live in the flask's movement def: max_speed flies
        // out, jump_speed arcs up.
        let flask_profile = self.profiles.get(SpeciesKind::Flask);
        let flask_dims = flask_profile.dimensions;
        let (launch_vx, launch_vy) = flask_profile
            .movement
            .as_ref()
            .map_or((0.0, 0.0), |def| (def.max_speed, def.jump_speed));

        let x = match facing {
            Facing::Right => origin.x + dims.x + 4.0,
            Facing::Left => origin.x - flask_dims.x - 4.0,
        };
        let position = Vec2::new(x, origin.y + dims.y * 0.25);

        let id = self.spawn(SpeciesKind::Flask, position)?;
        if let Some(flask) = self.entities.get_mut(&id) {
            flask.facing = facing;
            if let Some(movement) = flask.movement.as_mut() {
                movement.velocity = Vec2::new(facing.sign() * launch_vx, -launch_vy);
            }
        }
        debug!(entity = %thrower, flask = %id, "flask thrown");
        Ok(true)
    }

    /// Host-side removal (level teardown, editors). Gameplay removals go
    /// through despawn commands instead.
    pub fn destroy(&mut self, entity: EntityId) {
        self.remove_entity(entity, "destroyed");
    }

    fn flush_despawns(&mut self) {
        while let Some(entity) = self.despawn_queue.pop() {
            self.remove_entity(entity, "despawned");
        }
    }

    /// Remove an entity and every reference a registry holds to it, so no
    /// timer or watcher outlives its owner.
    fn remove_entity(&mut self, entity: EntityId, reason: &str) {
        let Some(obj) = self.entities.remove(&entity) else {
            return;
        };
        if let Some(state) = obj.state.as_ref() {
            state.kill_timers(&mut self.scheduler);
        }
        if let Some(mut body) = obj.collision {
            body.kill_timers(&mut self.scheduler);
        }
        self.colliders.deregister(entity);
        self.triggers.remove_owned_by(entity);
        if self.player == Some(entity) {
            self.player = None;
        }
        debug!(entity = %entity, reason, "entity removed");
    }

    /// Freeze gameplay: every pausable timer banks its remaining time and
    /// looping sounds hush. Idempotent.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        info!("simulation paused");
        let hushed = self.scheduler.pause_all();
        for command in hushed {
            if let Err(error) = self.apply(command) {
                warn!(%error, "pause command failed");
            }
        }
    }

    /// Resume exactly what the pause banked. Idempotent.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.scheduler.resume_all();
        info!("simulation resumed");
    }

    /// Replace an entity's held input flags. Hosts call this every frame
    /// for the player; flags persist until replaced.
    pub fn apply_input(&mut self, entity: EntityId, input: InputIntent) -> SimResult<()> {
        let Some(obj) = self.entities.get_mut(&entity) else {
            return Err(SimError::LookupMiss {
                what: "entity",
                id: entity.0,
            });
        };
        if let Some(movement) = obj.movement.as_mut() {
            movement.move_left = input.move_left;
            movement.move_right = input.move_right;
            movement.jump = input.jump;
        }
        Ok(())
    }

    /// Snapshot for the renderer.
    pub fn render_view(&self) -> RenderView {
        let sprites = self
            .entities
            .values()
            .map(|obj| Sprite {
                entity: obj.id,
                position: obj.position,
                dimensions: obj.dimensions,
                facing: obj.facing,
                image: obj.image(),
            })
            .collect();
        let camera_x = self
            .player
            .and_then(|id| self.entities.get(&id))
            .map_or(0.0, |player| {
                let center = player.position.x + player.dimensions.x * 0.5;
                (center + player.facing.sign() * self.settings.camera_lead)
                    .clamp(0.0, self.settings.world_width)
            });
        RenderView { sprites, camera_x }
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now_ms()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity(&self, entity: EntityId) -> Option<&GameObject> {
        self.entities.get(&entity)
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Evaluate a predicate against the entity registry. An associated fn
    /// rather than a method so callers can hold other registries mutably.
    fn eval_condition(entities: &EntityMap, condition: &Condition) -> bool {
        match condition {
            Condition::PastX { entity, x } => entities
                .get(entity)
                .is_some_and(|obj| obj.position.x > *x),
            Condition::Dead(entity) => entities.get(entity).is_some_and(GameObject::is_dead),
            Condition::Gone(entity) => !entities.contains_key(entity),
            Condition::Depleted { entity, kind } => entities.get(entity).is_some_and(|obj| {
                obj.resources
                    .as_ref()
                    .and_then(|resources| resources.get(*kind))
                    .is_some_and(Resource::is_empty)
            }),
        }
    }
}
