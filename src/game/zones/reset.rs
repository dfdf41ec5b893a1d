//! Recycles zone trigger state after the global counter advances.
//!
//! Each registered zone is switched off and back on with one physics tick in
//! between, so overlap detection re-fires for any actor still standing
//! inside. Fire-and-forget.

use std::collections::VecDeque;

use avian3d::prelude::CollidingEntities;
use bevy::{ecs::entity_disabling::Disabled, prelude::*};

use super::InteractableZone;
use crate::{AppSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_message::<ZoneResetRequest>();
    app.init_resource::<ZoneResetRoster>();
    app.init_resource::<ZoneResetCycle>();

    app.add_systems(
        Update,
        queue_reset_requests.in_set(AppSystems::Update),
    );
    app.add_systems(FixedUpdate, step_reset_cycle);
    app.add_systems(OnExit(Screen::Gameplay), clear_reset_state);
}

/// Fire-and-forget request to cycle every registered zone off and on.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ZoneResetRequest;

/// The zones to recycle, in order. Filled when the level spawns.
#[derive(Resource, Default)]
pub struct ZoneResetRoster(pub Vec<Entity>);

#[derive(Resource, Default)]
struct ZoneResetCycle {
    queue: VecDeque<Entity>,
    reenable: Option<Entity>,
}

fn queue_reset_requests(
    mut requests: MessageReader<ZoneResetRequest>,
    roster: Res<ZoneResetRoster>,
    mut cycle: ResMut<ZoneResetCycle>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    // A request landing mid-cycle restarts the pass rather than interleaving
    // a second one.
    cycle.queue = roster.0.iter().copied().collect();
}

/// One step per physics tick: re-enable the previously disabled zone, then
/// take the next one down.
fn step_reset_cycle(
    mut cycle: ResMut<ZoneResetCycle>,
    mut zones: Query<(&mut InteractableZone, &mut CollidingEntities)>,
    mut commands: Commands,
) {
    if let Some(zone) = cycle.reenable.take() {
        if let Ok(mut entity) = commands.get_entity(zone) {
            entity.remove::<Disabled>();
        }
    }

    let Some(next) = cycle.queue.pop_front() else {
        return;
    };
    if let Ok((mut zone, mut colliding)) = zones.get_mut(next) {
        // Stale presence must not survive the cycle; overlap is re-detected
        // once the zone is back on.
        zone.clear_presence();
        colliding.clear();
    }
    if let Ok(mut entity) = commands.get_entity(next) {
        entity.insert(Disabled);
        cycle.reenable = Some(next);
    }
}

fn clear_reset_state(mut cycle: ResMut<ZoneResetCycle>, mut roster: ResMut<ZoneResetRoster>) {
    cycle.queue.clear();
    cycle.reenable = None;
    roster.0.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::zones::{InteractableZone, ZoneType};

    fn test_app() -> App {
        let mut app = App::new();
        app.add_message::<ZoneResetRequest>();
        app.init_resource::<ZoneResetRoster>();
        app.init_resource::<ZoneResetCycle>();
        app.add_systems(Update, queue_reset_requests);
        app.add_systems(FixedUpdate, step_reset_cycle);
        app
    }

    fn spawn_zone(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                InteractableZone::new(ZoneType::Action, 1, -1),
                CollidingEntities::default(),
            ))
            .id()
    }

    fn disabled(app: &App, entity: Entity) -> bool {
        app.world().entity(entity).contains::<Disabled>()
    }

    #[test]
    fn cycle_disables_one_zone_per_tick() {
        let mut app = test_app();
        let first = spawn_zone(&mut app);
        let second = spawn_zone(&mut app);
        app.world_mut().resource_mut::<ZoneResetRoster>().0 = vec![first, second];

        app.world_mut()
            .resource_mut::<Messages<ZoneResetRequest>>()
            .write(ZoneResetRequest);
        app.update();

        app.world_mut().run_schedule(FixedUpdate);
        assert!(disabled(&app, first));
        assert!(!disabled(&app, second));

        app.world_mut().run_schedule(FixedUpdate);
        assert!(!disabled(&app, first));
        assert!(disabled(&app, second));

        app.world_mut().run_schedule(FixedUpdate);
        assert!(!disabled(&app, first));
        assert!(!disabled(&app, second));
    }

    #[test]
    fn cycle_clears_stale_presence() {
        let mut app = test_app();
        let zone = spawn_zone(&mut app);
        let player = app.world_mut().spawn_empty().id();

        {
            let world = app.world_mut();
            world.get_mut::<InteractableZone>(zone).unwrap().in_zone = true;
            world
                .get_mut::<CollidingEntities>(zone)
                .unwrap()
                .insert(player);
        }
        app.world_mut().resource_mut::<ZoneResetRoster>().0 = vec![zone];

        app.world_mut()
            .resource_mut::<Messages<ZoneResetRequest>>()
            .write(ZoneResetRequest);
        app.update();
        app.world_mut().run_schedule(FixedUpdate);

        // The zone is off for this tick; its presence state is wiped so the
        // next genuine overlap re-enters cleanly.
        assert!(disabled(&app, zone));
        app.world_mut().run_schedule(FixedUpdate);
        assert!(!disabled(&app, zone));

        let state = app.world().get::<InteractableZone>(zone).unwrap();
        assert!(!state.in_zone);
        assert!(
            app.world()
                .get::<CollidingEntities>(zone)
                .unwrap()
                .is_empty()
        );
    }
}
