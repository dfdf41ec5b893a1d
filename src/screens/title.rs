//! The title screen. Any key drops the player into the warehouse.

use bevy::prelude::*;

use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Title), spawn_title_screen);
    app.add_systems(
        Update,
        start_on_any_key.run_if(in_state(Screen::Title)),
    );
}

fn spawn_title_screen(mut commands: Commands) {
    commands.spawn((
        Name::new("Title Camera"),
        Camera2d,
        DespawnOnExit(Screen::Title),
    ));

    commands
        .spawn((
            Name::new("Title Screen"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(20.0),
                ..default()
            },
            DespawnOnExit(Screen::Title),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("WAREHOUSE HEIST"),
                TextFont {
                    font_size: 56.0,
                    ..default()
                },
                TextColor(Color::srgb(0.92, 0.85, 0.6)),
            ));
            parent.spawn((
                Text::new("Press any key to start"),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::srgb(0.7, 0.7, 0.7)),
            ));
        });
}

fn start_on_any_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_screen: ResMut<NextState<Screen>>,
) {
    if keyboard.get_just_pressed().next().is_some() {
        next_screen.set(Screen::Gameplay);
    }
}
