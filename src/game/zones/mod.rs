//! Trigger zones gating the scripted interactions.
//!
//! Each zone is a sensor volume the player walks into. A global progression
//! counter unlocks zones in sequence; completing a zone's task advances the
//! counter and broadcasts the completion to the crate, drone, forklift and
//! player listeners.

pub mod reset;

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    AppSystems,
    game::{
        hud::{InventoryIcon, InventoryUpdated, ZonePrompt},
        input::{ActionKeyState, InteractionBindings, key_label},
        player::Player,
    },
    screens::Screen,
};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(reset::plugin);

    app.init_resource::<ZoneProgression>();
    app.add_message::<ZoneInteractionComplete>();
    app.add_message::<CompleteZoneTask>();
    app.add_message::<HoldStarted>();
    app.add_message::<HoldEnded>();

    app.add_systems(
        Update,
        (
            track_player_presence,
            handle_zone_input,
            complete_zone_tasks,
            update_zone_markers,
        )
            .chain()
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Collectable,
    Action,
    HoldAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    PressHold,
}

/// One trigger region gating one scripted interaction.
#[derive(Component)]
pub struct InteractableZone {
    pub zone_type: ZoneType,
    pub zone_id: i32,
    /// The global counter must exceed this before the zone reacts to the
    /// player at all.
    pub required_id: i32,
    /// Prompt fragment, e.g. "collect the C4" -> "Press the E key to collect
    /// the C4."
    pub display_message: Option<String>,
    /// Key named in the prompt. Falls back to the main binding.
    pub key_hint: Option<KeyCode>,
    /// World objects hidden on collect / shown on perform.
    pub items: Vec<Entity>,
    pub inventory_icon: Option<InventoryIcon>,
    pub key_state: KeyState,
    /// Waypoint shown while this zone is the current one.
    pub marker: Option<Entity>,
    pub in_zone: bool,
    pub items_collected: bool,
    pub action_performed: bool,
    pub in_hold_state: bool,
    /// Collaborators flip this off while they own the relevant input.
    pub main_interactable: bool,
    player_overlapping: bool,
}

impl InteractableZone {
    pub fn new(zone_type: ZoneType, zone_id: i32, required_id: i32) -> Self {
        Self {
            zone_type,
            zone_id,
            required_id,
            display_message: None,
            key_hint: None,
            items: Vec::new(),
            inventory_icon: None,
            key_state: KeyState::Press,
            marker: None,
            in_zone: false,
            items_collected: false,
            action_performed: false,
            in_hold_state: false,
            main_interactable: true,
            player_overlapping: false,
        }
    }

    /// Re-arm the action for a matching zone id (the crate does this between
    /// punches).
    pub fn reset_action(&mut self, zone_id: i32) {
        if zone_id == self.zone_id {
            self.action_performed = false;
        }
    }

    fn clear_presence(&mut self) {
        self.in_zone = false;
        self.player_overlapping = false;
    }

    fn prompt(&self, bindings: &InteractionBindings) -> String {
        let key = key_label(self.key_hint.unwrap_or(bindings.main));
        match (&self.display_message, self.zone_type) {
            (Some(message), _) => format!("Press the {key} key to {message}."),
            (None, ZoneType::Collectable) => format!("Press the {key} key to collect"),
            (None, ZoneType::Action) => format!("Press the {key} key to perform action"),
            (None, ZoneType::HoldAction) => format!("Hold the {key} key to perform action"),
        }
    }
}

/// Global progression counter shared by every zone. A zone is "current"
/// (marker shown) while its id equals this value.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneProgression(pub i32);

/// Broadcast when a zone's interaction fires or its task completes. The sole
/// hand-off point to the external listeners.
#[derive(Message, Debug, Clone, Copy)]
pub struct ZoneInteractionComplete {
    pub zone: Entity,
    pub zone_id: i32,
}

/// Request to mark a zone's task done. Only honored when the carried id is
/// the zone's own.
#[derive(Message, Debug, Clone, Copy)]
pub struct CompleteZoneTask {
    pub zone: Entity,
    pub zone_id: i32,
}

/// A hold-type interaction began.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldStarted {
    pub zone_id: i32,
}

/// The hold key was released, completed or not.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldEnded {
    pub zone_id: i32,
}

/// Polls sensor overlap against the player and drives the Idle <-> InZone
/// transitions. Entry is evaluated on the overlap edge only; a zone whose
/// gate opens while the player is already inside stays idle until the reset
/// helper recycles it.
fn track_player_presence(
    mut zones: Query<(&mut InteractableZone, &CollidingEntities)>,
    players: Query<Entity, With<Player>>,
    bindings: Res<InteractionBindings>,
    progression: Res<ZoneProgression>,
    mut prompt: ResMut<ZonePrompt>,
) {
    for (mut zone, colliding) in zones.iter_mut() {
        let overlapping = players.iter().any(|player| colliding.contains(&player));
        if overlapping == zone.player_overlapping {
            continue;
        }
        zone.player_overlapping = overlapping;

        if !overlapping {
            if zone.in_zone {
                zone.in_zone = false;
                prompt.0 = None;
            }
            continue;
        }

        if progression.0 <= zone.required_id {
            continue;
        }

        match zone.zone_type {
            ZoneType::Collectable if !zone.items_collected => {
                zone.in_zone = true;
                prompt.0 = Some(zone.prompt(&bindings));
            }
            ZoneType::Action if !zone.action_performed => {
                zone.in_zone = true;
                prompt.0 = Some(zone.prompt(&bindings));
            }
            ZoneType::HoldAction => {
                zone.in_zone = true;
                prompt.0 = Some(zone.prompt(&bindings));
            }
            _ => {}
        }
    }
}

/// The per-frame interaction logic for occupied zones.
fn handle_zone_input(
    keys: Res<ActionKeyState>,
    progression: Res<ZoneProgression>,
    mut zones: Query<(Entity, &mut InteractableZone)>,
    mut item_visibility: Query<&mut Visibility>,
    mut prompt: ResMut<ZonePrompt>,
    mut inventory: MessageWriter<InventoryUpdated>,
    mut tasks: MessageWriter<CompleteZoneTask>,
    mut completions: MessageWriter<ZoneInteractionComplete>,
    mut hold_started: MessageWriter<HoldStarted>,
    mut hold_ended: MessageWriter<HoldEnded>,
) {
    for (entity, mut zone) in zones.iter_mut() {
        if !zone.in_zone || !zone.main_interactable {
            continue;
        }

        // Detonate C4: while the global counter sits at 2, the occupied zone
        // answers the secondary key instead of the main one. Deliberate
        // special case, not a fallthrough.
        if progression.0 == 2 {
            if keys.secondary_pressed
                && zone.key_state != KeyState::PressHold
                && !zone.action_performed
            {
                perform_action(
                    entity,
                    &mut zone,
                    &mut item_visibility,
                    &mut inventory,
                    &mut completions,
                );
                zone.action_performed = true;
                prompt.0 = None;
            }
            continue;
        }

        if keys.main_pressed && zone.key_state != KeyState::PressHold {
            match zone.zone_type {
                ZoneType::Collectable if !zone.items_collected => {
                    collect_items(entity, &mut zone, &mut item_visibility, &mut inventory, &mut tasks);
                    zone.items_collected = true;
                    prompt.0 = None;
                }
                ZoneType::Action if !zone.action_performed => {
                    perform_action(
                        entity,
                        &mut zone,
                        &mut item_visibility,
                        &mut inventory,
                        &mut completions,
                    );
                    zone.action_performed = true;
                    prompt.0 = None;
                }
                _ => {}
            }
        } else if keys.main_held
            && zone.key_state == KeyState::PressHold
            && !zone.in_hold_state
        {
            zone.in_hold_state = true;
            if zone.zone_type == ZoneType::HoldAction {
                prompt.0 = None;
                hold_started.write(HoldStarted {
                    zone_id: zone.zone_id,
                });
            }
        }

        if !keys.main_held && zone.key_state == KeyState::PressHold && zone.in_hold_state {
            zone.in_hold_state = false;
            hold_ended.write(HoldEnded {
                zone_id: zone.zone_id,
            });
        }
    }
}

fn collect_items(
    entity: Entity,
    zone: &mut InteractableZone,
    item_visibility: &mut Query<&mut Visibility>,
    inventory: &mut MessageWriter<InventoryUpdated>,
    tasks: &mut MessageWriter<CompleteZoneTask>,
) {
    for &item in &zone.items {
        if let Ok(mut visibility) = item_visibility.get_mut(item) {
            *visibility = Visibility::Hidden;
        }
    }

    if let Some(icon) = zone.inventory_icon {
        inventory.write(InventoryUpdated { icon });
    }

    tasks.write(CompleteZoneTask {
        zone: entity,
        zone_id: zone.zone_id,
    });
}

fn perform_action(
    entity: Entity,
    zone: &mut InteractableZone,
    item_visibility: &mut Query<&mut Visibility>,
    inventory: &mut MessageWriter<InventoryUpdated>,
    completions: &mut MessageWriter<ZoneInteractionComplete>,
) {
    for &item in &zone.items {
        if let Ok(mut visibility) = item_visibility.get_mut(item) {
            *visibility = Visibility::Visible;
        }
    }

    if let Some(icon) = zone.inventory_icon {
        inventory.write(InventoryUpdated { icon });
    }

    // Performing an action does not advance the counter; that is the
    // listening collaborator's call to make.
    completions.write(ZoneInteractionComplete {
        zone: entity,
        zone_id: zone.zone_id,
    });
}

/// Advances the global counter for id-matching completion requests, kicks
/// off a reset cycle, and broadcasts the completion.
fn complete_zone_tasks(
    mut tasks: MessageReader<CompleteZoneTask>,
    zones: Query<&InteractableZone>,
    mut progression: ResMut<ZoneProgression>,
    mut resets: MessageWriter<reset::ZoneResetRequest>,
    mut completions: MessageWriter<ZoneInteractionComplete>,
) {
    for task in tasks.read() {
        let Ok(zone) = zones.get(task.zone) else {
            warn!("task completion for a missing zone {:?}", task.zone);
            continue;
        };
        if zone.zone_id != task.zone_id {
            continue;
        }
        progression.0 += 1;
        info!(
            "zone {} complete, progression now {}",
            zone.zone_id, progression.0
        );
        resets.write(reset::ZoneResetRequest);
        completions.write(ZoneInteractionComplete {
            zone: task.zone,
            zone_id: zone.zone_id,
        });
    }
}

/// Shows each zone's marker while its id matches the counter. Refreshes only
/// on completion broadcasts.
fn update_zone_markers(
    mut completions: MessageReader<ZoneInteractionComplete>,
    zones: Query<&InteractableZone>,
    progression: Res<ZoneProgression>,
    mut visibility: Query<&mut Visibility>,
) {
    if completions.is_empty() {
        return;
    }
    completions.clear();

    for zone in zones.iter() {
        let Some(marker) = zone.marker else {
            continue;
        };
        let Ok(mut marker_visibility) = visibility.get_mut(marker) else {
            continue;
        };
        *marker_visibility = if zone.zone_id == progression.0 {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<ZoneProgression>();
        app.init_resource::<ActionKeyState>();
        app.init_resource::<InteractionBindings>();
        app.init_resource::<ZonePrompt>();
        app.add_message::<ZoneInteractionComplete>();
        app.add_message::<CompleteZoneTask>();
        app.add_message::<HoldStarted>();
        app.add_message::<HoldEnded>();
        app.add_message::<InventoryUpdated>();
        app.add_message::<reset::ZoneResetRequest>();
        app.add_systems(
            Update,
            (
                track_player_presence,
                handle_zone_input,
                complete_zone_tasks,
                update_zone_markers,
            )
                .chain(),
        );
        app
    }

    fn spawn_player(app: &mut App) -> Entity {
        app.world_mut().spawn(Player).id()
    }

    fn spawn_zone(app: &mut App, zone: InteractableZone) -> Entity {
        app.world_mut()
            .spawn((zone, CollidingEntities::default()))
            .id()
    }

    fn set_overlap(app: &mut App, zone: Entity, player: Entity, overlapping: bool) {
        let mut colliding = app.world_mut().get_mut::<CollidingEntities>(zone).unwrap();
        if overlapping {
            colliding.insert(player);
        } else {
            colliding.remove(&player);
        }
    }

    fn keys(app: &mut App, main_pressed: bool, main_held: bool, secondary_pressed: bool) {
        *app.world_mut().resource_mut::<ActionKeyState>() = ActionKeyState {
            main_pressed,
            main_held,
            secondary_pressed,
        };
    }

    fn zone_state<'a>(app: &'a App, zone: Entity) -> &'a InteractableZone {
        app.world().get::<InteractableZone>(zone).unwrap()
    }

    fn completions(app: &mut App) -> Vec<i32> {
        app.world_mut()
            .resource_mut::<Messages<ZoneInteractionComplete>>()
            .drain()
            .map(|message| message.zone_id)
            .collect()
    }

    #[test]
    fn completing_a_task_requires_the_zones_own_id() {
        let mut app = test_app();
        let zone = spawn_zone(&mut app, InteractableZone::new(ZoneType::Action, 4, -1));

        app.world_mut()
            .resource_mut::<Messages<CompleteZoneTask>>()
            .write(CompleteZoneTask { zone, zone_id: 9 });
        app.update();

        assert_eq!(app.world().resource::<ZoneProgression>().0, 0);
        assert!(completions(&mut app).is_empty());

        app.world_mut()
            .resource_mut::<Messages<CompleteZoneTask>>()
            .write(CompleteZoneTask { zone, zone_id: 4 });
        app.update();

        assert_eq!(app.world().resource::<ZoneProgression>().0, 1);
        assert_eq!(completions(&mut app), vec![4]);
        assert!(
            !app.world()
                .resource::<Messages<reset::ZoneResetRequest>>()
                .is_empty()
        );
    }

    #[test]
    fn gated_zone_never_reacts_to_presence() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let zone = spawn_zone(&mut app, InteractableZone::new(ZoneType::Action, 5, 3));

        set_overlap(&mut app, zone, player, true);
        app.update();

        assert!(!zone_state(&app, zone).in_zone);
        assert!(app.world().resource::<ZonePrompt>().0.is_none());

        // Even with the gate now open, standing inside is not an entry; the
        // zone waits for a fresh overlap edge.
        app.world_mut().resource_mut::<ZoneProgression>().0 = 4;
        app.update();
        assert!(!zone_state(&app, zone).in_zone);

        set_overlap(&mut app, zone, player, false);
        app.update();
        set_overlap(&mut app, zone, player, true);
        app.update();
        assert!(zone_state(&app, zone).in_zone);
        assert!(app.world().resource::<ZonePrompt>().0.is_some());
    }

    #[test]
    fn collect_zone_hides_items_and_advances_the_counter() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let item = app.world_mut().spawn(Visibility::Visible).id();

        let mut config = InteractableZone::new(ZoneType::Collectable, 1, -1);
        config.items = vec![item];
        config.inventory_icon = Some(InventoryIcon {
            label: "C4",
            color: Color::srgb(0.9, 0.3, 0.2),
        });
        let zone = spawn_zone(&mut app, config);

        set_overlap(&mut app, zone, player, true);
        app.update();
        assert!(zone_state(&app, zone).in_zone);

        keys(&mut app, true, true, false);
        app.update();

        let state = zone_state(&app, zone);
        assert!(state.items_collected);
        assert_eq!(
            *app.world().get::<Visibility>(item).unwrap(),
            Visibility::Hidden
        );
        assert_eq!(app.world().resource::<ZoneProgression>().0, 1);
        assert_eq!(completions(&mut app), vec![1]);
        assert!(app.world().resource::<ZonePrompt>().0.is_none());
        assert!(
            !app.world()
                .resource::<Messages<InventoryUpdated>>()
                .is_empty()
        );

        // A second press must not collect again.
        keys(&mut app, true, true, false);
        app.update();
        assert_eq!(app.world().resource::<ZoneProgression>().0, 1);
    }

    #[test]
    fn action_zone_broadcasts_without_advancing_the_counter() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let zone = spawn_zone(&mut app, InteractableZone::new(ZoneType::Action, 4, -1));

        set_overlap(&mut app, zone, player, true);
        app.update();
        keys(&mut app, true, true, false);
        app.update();

        assert!(zone_state(&app, zone).action_performed);
        assert_eq!(completions(&mut app), vec![4]);
        assert_eq!(app.world().resource::<ZoneProgression>().0, 0);
    }

    #[test]
    fn secondary_key_works_only_while_the_counter_is_two() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let zone = spawn_zone(&mut app, InteractableZone::new(ZoneType::Action, 2, 1));
        app.world_mut().resource_mut::<ZoneProgression>().0 = 2;

        set_overlap(&mut app, zone, player, true);
        app.update();
        assert!(zone_state(&app, zone).in_zone);

        // The main key is ignored in the detonation window.
        keys(&mut app, true, true, false);
        app.update();
        assert!(!zone_state(&app, zone).action_performed);
        assert!(completions(&mut app).is_empty());

        keys(&mut app, false, false, true);
        app.update();
        assert!(zone_state(&app, zone).action_performed);
        assert_eq!(completions(&mut app), vec![2]);
    }

    #[test]
    fn secondary_key_is_dead_outside_the_detonation_window() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let zone = spawn_zone(&mut app, InteractableZone::new(ZoneType::Action, 4, -1));

        set_overlap(&mut app, zone, player, true);
        app.update();
        keys(&mut app, false, false, true);
        app.update();

        assert!(!zone_state(&app, zone).action_performed);
        assert!(completions(&mut app).is_empty());
    }

    #[test]
    fn hold_zone_emits_start_and_end_on_transitions() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let mut config = InteractableZone::new(ZoneType::HoldAction, 3, -1);
        config.key_state = KeyState::PressHold;
        let zone = spawn_zone(&mut app, config);

        set_overlap(&mut app, zone, player, true);
        app.update();

        keys(&mut app, false, true, false);
        app.update();
        assert!(zone_state(&app, zone).in_hold_state);
        let started: Vec<_> = app
            .world_mut()
            .resource_mut::<Messages<HoldStarted>>()
            .drain()
            .collect();
        assert_eq!(started, vec![HoldStarted { zone_id: 3 }]);

        // Holding across frames does not re-fire.
        keys(&mut app, false, true, false);
        app.update();
        assert!(
            app.world()
                .resource::<Messages<HoldStarted>>()
                .is_empty()
        );

        keys(&mut app, false, false, false);
        app.update();
        assert!(!zone_state(&app, zone).in_hold_state);
        let ended: Vec<_> = app
            .world_mut()
            .resource_mut::<Messages<HoldEnded>>()
            .drain()
            .collect();
        assert_eq!(ended, vec![HoldEnded { zone_id: 3 }]);

        // Staying released stays quiet.
        keys(&mut app, false, false, false);
        app.update();
        assert!(app.world().resource::<Messages<HoldEnded>>().is_empty());
    }

    #[test]
    fn suspended_zone_ignores_the_main_key() {
        let mut app = test_app();
        let player = spawn_player(&mut app);
        let mut config = InteractableZone::new(ZoneType::Action, 6, -1);
        config.main_interactable = false;
        let zone = spawn_zone(&mut app, config);

        set_overlap(&mut app, zone, player, true);
        app.update();
        keys(&mut app, true, true, false);
        app.update();

        assert!(!zone_state(&app, zone).action_performed);
        assert!(completions(&mut app).is_empty());
    }

    #[test]
    fn markers_follow_the_counter() {
        let mut app = test_app();
        let marker_one = app.world_mut().spawn(Visibility::Hidden).id();
        let marker_two = app.world_mut().spawn(Visibility::Hidden).id();

        let mut first = InteractableZone::new(ZoneType::Action, 1, -1);
        first.marker = Some(marker_one);
        let first = spawn_zone(&mut app, first);
        let mut second = InteractableZone::new(ZoneType::Action, 2, 0);
        second.marker = Some(marker_two);
        let second = spawn_zone(&mut app, second);

        app.world_mut()
            .resource_mut::<Messages<CompleteZoneTask>>()
            .write(CompleteZoneTask {
                zone: first,
                zone_id: 1,
            });
        app.update();
        assert_eq!(
            *app.world().get::<Visibility>(marker_one).unwrap(),
            Visibility::Visible
        );
        assert_eq!(
            *app.world().get::<Visibility>(marker_two).unwrap(),
            Visibility::Hidden
        );

        app.world_mut()
            .resource_mut::<Messages<CompleteZoneTask>>()
            .write(CompleteZoneTask {
                zone: second,
                zone_id: 2,
            });
        app.update();
        assert_eq!(
            *app.world().get::<Visibility>(marker_one).unwrap(),
            Visibility::Hidden
        );
        assert_eq!(
            *app.world().get::<Visibility>(marker_two).unwrap(),
            Visibility::Visible
        );
    }
}
