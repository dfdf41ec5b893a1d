//! Relay between the raw key bindings and the interaction consumers.
//!
//! Binds the three logical interaction keys and re-broadcasts
//! press/hold/release each frame, so the zones and vehicles never touch the
//! bindings directly.

use bevy::prelude::*;

use crate::AppSystems;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<InteractionBindings>();
    app.init_resource::<ActionKeyState>();
    app.add_message::<ActionInput>();
    app.add_systems(
        Update,
        relay_interaction_keys.in_set(AppSystems::RecordInput),
    );
}

/// The three interaction keys every zone and vehicle shares.
#[derive(Resource, Debug, Clone, Copy)]
pub struct InteractionBindings {
    /// Main interact key.
    pub main: KeyCode,
    /// Secondary interact key.
    pub secondary: KeyCode,
    /// Bail-out key for vehicle modes.
    pub escape: KeyCode,
}

impl Default for InteractionBindings {
    fn default() -> Self {
        Self {
            main: KeyCode::KeyE,
            secondary: KeyCode::Space,
            escape: KeyCode::Escape,
        }
    }
}

/// Interaction key transitions, re-broadcast with no further payload.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionInput {
    MainPressed,
    MainHeld,
    MainReleased,
    SecondaryPressed,
    SecondaryReleased,
    EscapePressed,
    EscapeReleased,
}

/// Polled mirror of the interaction keys for consumers that check state
/// every frame instead of subscribing.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ActionKeyState {
    /// Main key went down this frame.
    pub main_pressed: bool,
    /// Main key is currently down.
    pub main_held: bool,
    /// Secondary key went down this frame.
    pub secondary_pressed: bool,
}

fn relay_interaction_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    bindings: Res<InteractionBindings>,
    mut state: ResMut<ActionKeyState>,
    mut actions: MessageWriter<ActionInput>,
) {
    state.main_pressed = keyboard.just_pressed(bindings.main);
    state.main_held = keyboard.pressed(bindings.main);
    state.secondary_pressed = keyboard.just_pressed(bindings.secondary);

    if keyboard.just_pressed(bindings.main) {
        actions.write(ActionInput::MainPressed);
        actions.write(ActionInput::MainHeld);
    }
    if keyboard.just_released(bindings.main) {
        actions.write(ActionInput::MainReleased);
    }
    if keyboard.just_pressed(bindings.secondary) {
        actions.write(ActionInput::SecondaryPressed);
    }
    if keyboard.just_released(bindings.secondary) {
        actions.write(ActionInput::SecondaryReleased);
    }
    if keyboard.just_pressed(bindings.escape) {
        actions.write(ActionInput::EscapePressed);
    }
    if keyboard.just_released(bindings.escape) {
        actions.write(ActionInput::EscapeReleased);
    }
}

/// Short display name for the keys used in zone prompts.
pub fn key_label(key: KeyCode) -> &'static str {
    match key {
        KeyCode::KeyE => "E",
        KeyCode::KeyF => "F",
        KeyCode::KeyR => "R",
        KeyCode::KeyT => "T",
        KeyCode::KeyV => "V",
        KeyCode::Space => "Space",
        KeyCode::Escape => "Esc",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<InteractionBindings>();
        app.init_resource::<ActionKeyState>();
        app.add_message::<ActionInput>();
        app.add_systems(Update, relay_interaction_keys);
        app
    }

    fn drain(app: &mut App) -> Vec<ActionInput> {
        app.world_mut()
            .resource_mut::<Messages<ActionInput>>()
            .drain()
            .collect()
    }

    #[test]
    fn main_key_press_and_release_are_relayed() {
        let mut app = test_app();

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyE);
        app.update();

        let state = *app.world().resource::<ActionKeyState>();
        assert!(state.main_pressed);
        assert!(state.main_held);
        assert_eq!(
            drain(&mut app),
            vec![ActionInput::MainPressed, ActionInput::MainHeld]
        );

        let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keyboard.clear();
        keyboard.release(KeyCode::KeyE);
        app.update();

        let state = *app.world().resource::<ActionKeyState>();
        assert!(!state.main_pressed);
        assert!(!state.main_held);
        assert_eq!(drain(&mut app), vec![ActionInput::MainReleased]);
    }

    #[test]
    fn held_key_reports_level_without_new_messages() {
        let mut app = test_app();

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyE);
        app.update();
        drain(&mut app);

        // Next frame the key is still down but no longer "just" pressed.
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear();
        app.update();

        let state = *app.world().resource::<ActionKeyState>();
        assert!(!state.main_pressed);
        assert!(state.main_held);
        assert!(drain(&mut app).is_empty());
    }

    #[test]
    fn escape_is_relayed() {
        let mut app = test_app();

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();

        assert_eq!(drain(&mut app), vec![ActionInput::EscapePressed]);
    }
}
