mod movement;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_tnua::prelude::*;
use bevy_tnua_avian3d::*;

use crate::{
    AppSystems,
    game::{
        camera_rig::{PlayerFollowCamera, VirtualCamera},
        objects::{
            breakable::CrateBreaking,
            detonator::DetonatorCommand,
            drone::FlightMode,
            forklift::DriveMode,
        },
        zones::ZoneInteractionComplete,
    },
    screens::Screen,
};

// Player marker component
#[derive(Component)]
pub struct Player;

// Movement state
#[derive(Component)]
pub struct MovementController {
    pub walk_speed: f32, // Speed without sprinting
    pub run_speed: f32,  // Speed while sprinting
    pub jump_height: f32,
    /// Cleared while a vehicle or the crate owns the input.
    pub can_move: bool,
}

impl Default for MovementController {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            run_speed: 8.0,
            jump_height: 4.0,
            can_move: true,
        }
    }
}

// Constants
pub const PLAYER_HEIGHT: f32 = 1.1;
pub const PLAYER_RADIUS: f32 = 0.5;

// Player spawn command
pub struct SpawnPlayer {
    pub position: Vec3,
}

impl Command for SpawnPlayer {
    fn apply(self, world: &mut World) {
        let _ = world.run_system_cached_with(spawn_player, self);
    }
}

fn spawn_player(
    In(spawn_config): In<SpawnPlayer>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let body = meshes.add(Capsule3d::new(PLAYER_RADIUS * 0.8, PLAYER_HEIGHT));
    let visor = meshes.add(Cuboid::new(0.4, 0.15, 0.2));
    let suit = materials.add(Color::srgb(0.2, 0.45, 0.7));
    let glass = materials.add(Color::srgb(0.1, 0.1, 0.12));

    commands
        .spawn((
            Name::new("Player"),
            Player,
            MovementController::default(),
            DespawnOnExit(Screen::Gameplay), // Cleanup when leaving Gameplay screen
            Transform::from_translation(spawn_config.position),
            Visibility::Visible,
            // Avian3D physics components
            RigidBody::Dynamic,
            Collider::capsule(PLAYER_HEIGHT / 2., PLAYER_RADIUS),
            TnuaController::default(),
            LockedAxes::ROTATION_LOCKED.unlock_rotation_y(), // Prevent player from tipping over
            TnuaAvian3dSensorShape(Collider::cylinder(PLAYER_HEIGHT / 2., 0.0)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(body),
                MeshMaterial3d(suit),
                Transform::from_translation(Vec3::new(0., 0., 0.)),
            ));
            // Forward-facing visor so the facing direction reads at a glance.
            parent.spawn((
                Mesh3d(visor),
                MeshMaterial3d(glass),
                Transform::from_translation(Vec3::new(0., 0.5, -0.4)),
            ));
        });
}

pub(super) fn plugin(app: &mut App) {
    // Tnua controller plugins
    app.add_plugins((
        TnuaControllerPlugin::new(FixedUpdate),
        TnuaAvian3dPlugin::new(FixedUpdate),
    ));

    // The drone's hover bias is tuned against standard gravity.
    app.insert_resource(Gravity(Vec3::new(0.0, -9.81, 0.0)));

    app.add_systems(
        Update,
        (movement::apply_controls, react_to_zones, follow_mode_changes)
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Zone 1 places the charge, zone 2 sets it off.
fn react_to_zones(
    mut completions: MessageReader<ZoneInteractionComplete>,
    mut detonator: MessageWriter<DetonatorCommand>,
) {
    for completion in completions.read() {
        match completion.zone_id {
            1 => {
                // Place C4
                detonator.write(DetonatorCommand::Show);
            }
            2 => {
                // Trigger explosion
                detonator.write(DetonatorCommand::Trigger {
                    zone: completion.zone,
                });
            }
            _ => {}
        }
    }
}

/// Any of the three mode owners taking over releases player control; their
/// exit returns it. Nothing arbitrates between them.
fn follow_mode_changes(
    mut flight: MessageReader<FlightMode>,
    mut drive: MessageReader<DriveMode>,
    mut breaking: MessageReader<CrateBreaking>,
    mut players: Query<(&mut MovementController, &mut Visibility), With<Player>>,
    mut follow_cameras: Query<&mut VirtualCamera, With<PlayerFollowCamera>>,
) {
    let mut release = false;
    let mut restore = false;
    let mut hide = false;

    for mode in flight.read() {
        match mode {
            FlightMode::Entered => release = true,
            FlightMode::Exited => restore = true,
        }
    }
    for mode in drive.read() {
        match mode {
            DriveMode::Entered => {
                release = true;
                // The driver model stands in for the player while driving.
                hide = true;
            }
            DriveMode::Exited => restore = true,
        }
    }
    for mode in breaking.read() {
        match mode {
            CrateBreaking::Started => release = true,
            CrateBreaking::Ended => restore = true,
        }
    }

    if !release && !restore {
        return;
    }

    let Ok((mut controller, mut visibility)) = players.single_mut() else {
        warn!("no player to lock or unlock");
        return;
    };

    if release {
        controller.can_move = false;
        if hide {
            *visibility = Visibility::Hidden;
        }
        if let Ok(mut camera) = follow_cameras.single_mut() {
            camera.priority = 9;
        }
    }
    if restore {
        controller.can_move = true;
        *visibility = Visibility::Visible;
        if let Ok(mut camera) = follow_cameras.single_mut() {
            camera.priority = 10;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_changes_toggle_player_control() {
        let mut app = App::new();
        app.add_message::<FlightMode>();
        app.add_message::<DriveMode>();
        app.add_message::<CrateBreaking>();
        app.add_systems(Update, follow_mode_changes);

        let player = app
            .world_mut()
            .spawn((Player, MovementController::default(), Visibility::Visible))
            .id();
        let camera = app
            .world_mut()
            .spawn((PlayerFollowCamera, VirtualCamera { priority: 10 }))
            .id();

        app.world_mut()
            .resource_mut::<Messages<FlightMode>>()
            .write(FlightMode::Entered);
        app.update();

        assert!(
            !app.world()
                .get::<MovementController>(player)
                .unwrap()
                .can_move
        );
        assert_eq!(
            app.world().get::<VirtualCamera>(camera).unwrap().priority,
            9
        );

        app.world_mut()
            .resource_mut::<Messages<FlightMode>>()
            .write(FlightMode::Exited);
        app.update();

        assert!(
            app.world()
                .get::<MovementController>(player)
                .unwrap()
                .can_move
        );
        assert_eq!(
            app.world().get::<VirtualCamera>(camera).unwrap().priority,
            10
        );
    }

    #[test]
    fn driving_also_hides_the_player_model() {
        let mut app = App::new();
        app.add_message::<FlightMode>();
        app.add_message::<DriveMode>();
        app.add_message::<CrateBreaking>();
        app.add_systems(Update, follow_mode_changes);

        let player = app
            .world_mut()
            .spawn((Player, MovementController::default(), Visibility::Visible))
            .id();

        app.world_mut()
            .resource_mut::<Messages<DriveMode>>()
            .write(DriveMode::Entered);
        app.update();
        assert_eq!(
            *app.world().get::<Visibility>(player).unwrap(),
            Visibility::Hidden
        );

        app.world_mut()
            .resource_mut::<Messages<DriveMode>>()
            .write(DriveMode::Exited);
        app.update();
        assert_eq!(
            *app.world().get::<Visibility>(player).unwrap(),
            Visibility::Visible
        );
    }
}
