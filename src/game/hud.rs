//! The gameplay HUD: zone prompts, the inventory strip, and the drone view
//! frame.

use bevy::prelude::*;

use crate::{
    AppSystems,
    game::objects::drone::FlightMode,
    screens::Screen,
};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ZonePrompt>();
    app.add_message::<InventoryUpdated>();

    app.add_systems(OnEnter(Screen::Gameplay), spawn_hud);
    app.add_systems(
        Update,
        (
            sync_zone_prompt.run_if(resource_changed::<ZonePrompt>),
            extend_inventory_strip,
            toggle_drone_frame,
        )
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// The line shown while the player stands in an interactable zone. `None`
/// hides it.
#[derive(Resource, Default)]
pub struct ZonePrompt(pub Option<String>);

/// A picked-up item's slot in the inventory strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryIcon {
    pub label: &'static str,
    pub color: Color,
}

/// Something was added to the inventory display.
#[derive(Message, Debug, Clone, Copy)]
pub struct InventoryUpdated {
    pub icon: InventoryIcon,
}

#[derive(Component)]
struct ZonePromptText;

#[derive(Component)]
struct InventoryStrip;

#[derive(Component)]
struct DroneViewFrame;

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Name::new("HUD"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            Pickable::IGNORE,
            DespawnOnExit(Screen::Gameplay),
        ))
        .with_children(|parent| {
            // Zone prompt, bottom center.
            parent
                .spawn((
                    Node {
                        width: Val::Percent(100.0),
                        position_type: PositionType::Absolute,
                        bottom: Val::Px(60.0),
                        justify_content: JustifyContent::Center,
                        ..default()
                    },
                    Pickable::IGNORE,
                ))
                .with_children(|parent| {
                    parent.spawn((
                        ZonePromptText,
                        Text::new(""),
                        TextFont {
                            font_size: 24.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.95, 0.95, 0.85)),
                        Visibility::Hidden,
                    ));
                });

            // Inventory strip, top left.
            parent.spawn((
                InventoryStrip,
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(16.0),
                    left: Val::Px(16.0),
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(8.0),
                    ..default()
                },
                Pickable::IGNORE,
            ));

            // Drone view banner, top right, hidden until flight mode.
            parent
                .spawn((
                    DroneViewFrame,
                    Node {
                        position_type: PositionType::Absolute,
                        top: Val::Px(16.0),
                        right: Val::Px(16.0),
                        padding: UiRect::axes(Val::Px(12.0), Val::Px(6.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.1, 0.5, 0.2, 0.8)),
                    Visibility::Hidden,
                    Pickable::IGNORE,
                ))
                .with_children(|parent| {
                    parent.spawn((
                        Text::new("DRONE CAM"),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.85, 1.0, 0.85)),
                    ));
                });
        });
}

fn sync_zone_prompt(
    prompt: Res<ZonePrompt>,
    mut text_query: Query<(&mut Text, &mut Visibility), With<ZonePromptText>>,
) {
    let Ok((mut text, mut visibility)) = text_query.single_mut() else {
        return;
    };
    match &prompt.0 {
        Some(message) => {
            text.0 = message.clone();
            *visibility = Visibility::Visible;
        }
        None => {
            *visibility = Visibility::Hidden;
        }
    }
}

fn extend_inventory_strip(
    mut updates: MessageReader<InventoryUpdated>,
    strips: Query<Entity, With<InventoryStrip>>,
    mut commands: Commands,
) {
    for update in updates.read() {
        let Ok(strip) = strips.single() else {
            warn!("inventory update with no strip to show it");
            continue;
        };
        let icon = update.icon;
        commands.entity(strip).with_children(|parent| {
            parent
                .spawn((
                    Node {
                        padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
                        ..default()
                    },
                    BackgroundColor(icon.color.with_alpha(0.85)),
                ))
                .with_children(|parent| {
                    parent.spawn((
                        Text::new(icon.label),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
    }
}

fn toggle_drone_frame(
    mut flight: MessageReader<FlightMode>,
    mut frames: Query<&mut Visibility, With<DroneViewFrame>>,
) {
    for mode in flight.read() {
        for mut visibility in frames.iter_mut() {
            *visibility = match mode {
                FlightMode::Entered => Visibility::Visible,
                FlightMode::Exited => Visibility::Hidden,
            };
        }
    }
}
