//! The breakable crate: punch it apart piece by piece once its zone hands
//! over control.

use avian3d::prelude::*;
use bevy::prelude::*;
use rand::Rng;

use crate::{
    AppSystems,
    game::zones::{CompleteZoneTask, InteractableZone, ZoneInteractionComplete},
    screens::Screen,
};

/// Zone that turns the crate punchable.
pub const CRATE_ZONE_ID: i32 = 6;

/// Upper limit of punch force.
const MAX_PUNCH_FORCE: f32 = 4.0;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<CrateBreaking>();
    app.add_systems(
        Update,
        (
            enter_breaking,
            read_punch_input,
            wind_up_punches,
            tick_rearm_timers,
            finish_breaking,
        )
            .chain()
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Broadcast when the crate grabs or releases the punch input.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrateBreaking {
    Started,
    Ended,
}

#[derive(Component)]
pub struct BreakableCrate {
    /// Intact shell, swapped out when breaking starts.
    pub whole_shell: Entity,
    /// Root of the loose pieces, swapped in when breaking starts.
    pub broken_shell: Entity,
    /// Entity carrying the crate's collider, shut off once busted.
    pub collider: Entity,
    /// The zone that hands the crate its input.
    pub zone: Entity,
    pub punch_key: KeyCode,
    /// Seconds before the zone re-arms after a punch.
    pub punch_delay: f32,
    remaining: Vec<Entity>,
    ready_to_break: bool,
    busted: bool,
    punch_held: bool,
    wind_up: f32,
    rearm: Option<Timer>,
}

impl BreakableCrate {
    pub fn new(
        whole_shell: Entity,
        broken_shell: Entity,
        collider: Entity,
        zone: Entity,
        pieces: Vec<Entity>,
    ) -> Self {
        Self {
            whole_shell,
            broken_shell,
            collider,
            zone,
            punch_key: KeyCode::KeyF,
            punch_delay: 0.5,
            remaining: pieces,
            ready_to_break: false,
            busted: false,
            punch_held: false,
            wind_up: 0.0,
            rearm: None,
        }
    }
}

/// The crate zone completing puts the crate in breaking mode and gives it
/// the punch key.
fn enter_breaking(
    mut completions: MessageReader<ZoneInteractionComplete>,
    mut crates: Query<&mut BreakableCrate>,
    mut zones: Query<&mut InteractableZone>,
    mut visibility: Query<&mut Visibility>,
    mut breaking: MessageWriter<CrateBreaking>,
) {
    for completion in completions.read() {
        if completion.zone_id != CRATE_ZONE_ID {
            continue;
        }
        for mut crate_state in crates.iter_mut() {
            if crate_state.ready_to_break || crate_state.busted {
                continue;
            }
            crate_state.ready_to_break = true;

            if let Ok(mut shell) = visibility.get_mut(crate_state.whole_shell) {
                *shell = Visibility::Hidden;
            }
            if let Ok(mut shell) = visibility.get_mut(crate_state.broken_shell) {
                *shell = Visibility::Visible;
            }
            // The zone stays quiet while the crate owns the punch key.
            if let Ok(mut zone) = zones.get_mut(crate_state.zone) {
                zone.main_interactable = false;
            } else {
                warn!("breakable crate has no zone to suspend");
            }

            breaking.write(CrateBreaking::Started);
            info!("crate breaking started");
        }
    }
}

fn read_punch_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut crates: Query<&mut BreakableCrate>,
    mut commands: Commands,
) {
    for mut crate_state in crates.iter_mut() {
        if !crate_state.ready_to_break || crate_state.busted {
            continue;
        }
        if keyboard.just_pressed(crate_state.punch_key) {
            crate_state.punch_held = true;
            crate_state.wind_up = 0.0;
        }
        if keyboard.just_released(crate_state.punch_key) && crate_state.punch_held {
            crate_state.punch_held = false;
            land_punch(&mut crate_state, &mut commands);
        }
    }
}

/// Winding up while the punch key is down. The force tops out at
/// [`MAX_PUNCH_FORCE`], at which point the punch lands on its own.
fn wind_up_punches(
    time: Res<Time>,
    mut crates: Query<&mut BreakableCrate>,
    mut commands: Commands,
) {
    for mut crate_state in crates.iter_mut() {
        if !crate_state.punch_held {
            continue;
        }
        let (wind_up, capped) = wind_up_step(crate_state.wind_up, time.delta_secs());
        crate_state.wind_up = wind_up;
        if capped {
            crate_state.punch_held = false;
            land_punch(&mut crate_state, &mut commands);
        }
    }
}

fn land_punch(crate_state: &mut BreakableCrate, commands: &mut Commands) {
    let force = crate_state.wind_up;
    let Some(piece) = take_random_piece(&mut crate_state.remaining, &mut rand::rng()) else {
        return;
    };
    info!("crate piece knocked loose with force {force:.2}");
    if let Ok(mut entity) = commands.get_entity(piece) {
        entity.insert((
            RigidBody::Dynamic,
            ExternalImpulse::new(Vec3::Y * force).with_persistence(false),
        ));
    }
    crate_state.rearm = Some(Timer::from_seconds(crate_state.punch_delay, TimerMode::Once));
}

/// After the punch delay the zone's action re-arms so the next hit counts.
fn tick_rearm_timers(
    time: Res<Time>,
    mut crates: Query<&mut BreakableCrate>,
    mut zones: Query<&mut InteractableZone>,
) {
    for mut crate_state in crates.iter_mut() {
        let Some(timer) = crate_state.rearm.as_mut() else {
            continue;
        };
        if !timer.tick(time.delta()).just_finished() {
            continue;
        }
        crate_state.rearm = None;
        if let Ok(mut zone) = zones.get_mut(crate_state.zone) {
            zone.reset_action(CRATE_ZONE_ID);
        }
    }
}

/// No pieces left: shut the crate down and complete its zone.
fn finish_breaking(
    mut crates: Query<&mut BreakableCrate>,
    mut zones: Query<&mut InteractableZone>,
    mut tasks: MessageWriter<CompleteZoneTask>,
    mut breaking: MessageWriter<CrateBreaking>,
    mut commands: Commands,
) {
    for mut crate_state in crates.iter_mut() {
        if !crate_state.ready_to_break || crate_state.busted || !crate_state.remaining.is_empty()
        {
            continue;
        }
        crate_state.ready_to_break = false;
        crate_state.busted = true;
        crate_state.punch_held = false;

        if let Ok(mut entity) = commands.get_entity(crate_state.collider) {
            entity.insert(ColliderDisabled);
        }
        if let Ok(mut zone) = zones.get_mut(crate_state.zone) {
            zone.main_interactable = true;
        }
        tasks.write(CompleteZoneTask {
            zone: crate_state.zone,
            zone_id: CRATE_ZONE_ID,
        });
        breaking.write(CrateBreaking::Ended);
        info!("crate completely busted");
    }
}

fn wind_up_step(wind_up: f32, delta: f32) -> (f32, bool) {
    let next = wind_up + delta;
    if next >= MAX_PUNCH_FORCE {
        (MAX_PUNCH_FORCE, true)
    } else {
        (next, false)
    }
}

fn take_random_piece(remaining: &mut Vec<Entity>, rng: &mut impl Rng) -> Option<Entity> {
    if remaining.is_empty() {
        return None;
    }
    let index = rng.random_range(0..remaining.len());
    Some(remaining.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::zones::ZoneType;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn wind_up_caps_at_the_force_limit() {
        let (force, capped) = wind_up_step(3.8, 0.5);
        assert_eq!(force, MAX_PUNCH_FORCE);
        assert!(capped);

        let (force, capped) = wind_up_step(1.0, 0.25);
        assert_eq!(force, 1.25);
        assert!(!capped);

        // However long the key stays down, the force never exceeds the cap.
        let mut force = 0.0;
        for _ in 0..100 {
            force = wind_up_step(force, 0.3).0;
        }
        assert_eq!(force, MAX_PUNCH_FORCE);
    }

    #[test]
    fn taking_pieces_never_goes_negative() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut world = World::new();
        let mut remaining: Vec<Entity> = (0..4).map(|_| world.spawn_empty().id()).collect();

        for _ in 0..4 {
            assert!(take_random_piece(&mut remaining, &mut rng).is_some());
        }
        assert!(remaining.is_empty());
        assert!(take_random_piece(&mut remaining, &mut rng).is_none());
        assert!(remaining.is_empty());
    }

    #[test]
    fn busting_the_last_piece_completes_the_zone() {
        let mut app = App::new();
        app.add_message::<CompleteZoneTask>();
        app.add_message::<CrateBreaking>();
        app.add_systems(Update, finish_breaking);

        let world = app.world_mut();
        let mut zone_config = InteractableZone::new(ZoneType::Action, CRATE_ZONE_ID, 4);
        zone_config.main_interactable = false;
        let zone = world.spawn(zone_config).id();
        let shell = world.spawn(Visibility::Visible).id();
        let broken = world.spawn(Visibility::Hidden).id();
        let collider = world.spawn_empty().id();

        let mut crate_state = BreakableCrate::new(shell, broken, collider, zone, Vec::new());
        crate_state.ready_to_break = true;
        let crate_entity = world.spawn(crate_state).id();

        app.update();

        let state = app.world().get::<BreakableCrate>(crate_entity).unwrap();
        assert!(state.busted);
        assert!(!state.ready_to_break);
        assert!(
            app.world()
                .entity(collider)
                .contains::<ColliderDisabled>()
        );
        assert!(
            app.world()
                .get::<InteractableZone>(zone)
                .unwrap()
                .main_interactable
        );
        let tasks: Vec<_> = app
            .world_mut()
            .resource_mut::<Messages<CompleteZoneTask>>()
            .drain()
            .collect();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].zone_id, CRATE_ZONE_ID);

        // A busted crate never completes twice.
        app.update();
        assert!(
            app.world()
                .resource::<Messages<CompleteZoneTask>>()
                .is_empty()
        );
    }
}
