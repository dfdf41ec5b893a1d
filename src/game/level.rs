//! Spawns the warehouse: the six-zone progression and the objects wired to
//! it.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    game::{
        camera_rig::{DroneCamera, ForkliftCamera, PlayerFollowCamera, VirtualCamera},
        hud::InventoryIcon,
        objects::{
            breakable::BreakableCrate,
            detonator::Detonator,
            drone::Drone,
            forklift::Forklift,
            shutter::SupplyShutter,
        },
        player::SpawnPlayer,
        zones::{InteractableZone, KeyState, ZoneType, reset::ZoneResetRoster},
    },
    screens::Screen,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_level);
}

fn spawn_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut roster: ResMut<ZoneResetRoster>,
) {
    spawn_environment(&mut commands, &mut meshes, &mut materials);
    spawn_cameras(&mut commands);

    let marker_mesh = meshes.add(Cone {
        radius: 0.4,
        height: 0.8,
    });
    let marker_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.85, 0.2),
        emissive: LinearRgba::new(2.0, 1.6, 0.2, 1.0),
        ..default()
    });
    let spawn_marker = |commands: &mut Commands, position: Vec3| -> Entity {
        commands
            .spawn((
                Name::new("Zone Marker"),
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(marker_material.clone()),
                Transform::from_translation(position + Vec3::Y * 3.0)
                    .with_rotation(Quat::from_rotation_x(std::f32::consts::PI)),
                Visibility::Hidden,
                DespawnOnExit(Screen::Gameplay),
            ))
            .id()
    };

    // --- Zone 1: collect the C4 charge -----------------------------------

    let zone_one_position = Vec3::new(-8.0, 1.0, 0.0);
    let charge_prop = commands
        .spawn((
            Name::new("C4 On Table"),
            Mesh3d(meshes.add(Cuboid::new(0.5, 0.25, 0.35))),
            MeshMaterial3d(materials.add(Color::srgb(0.75, 0.15, 0.1))),
            Transform::from_xyz(-8.0, 1.0, 0.0),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id();
    commands.spawn((
        Name::new("Workbench"),
        Mesh3d(meshes.add(Cuboid::new(2.0, 0.9, 1.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.45, 0.33, 0.22))),
        Transform::from_xyz(-8.0, 0.45, 0.0),
        RigidBody::Static,
        Collider::cuboid(2.0, 0.9, 1.0),
        DespawnOnExit(Screen::Gameplay),
    ));

    let mut zone_one = InteractableZone::new(ZoneType::Collectable, 1, -1);
    zone_one.display_message = Some("collect the C4 charge".to_string());
    zone_one.items = vec![charge_prop];
    zone_one.inventory_icon = Some(InventoryIcon {
        label: "C4",
        color: Color::srgb(0.75, 0.15, 0.1),
    });
    zone_one.marker = Some(spawn_marker(&mut commands, zone_one_position));
    let zone_one = spawn_zone(&mut commands, "Zone 1 - C4 Pickup", zone_one_position, zone_one);

    // --- Zone 3: winch the supply shutter open ---------------------------

    let zone_three_position = Vec3::new(0.0, 1.0, -12.0);
    let panel = commands
        .spawn((
            Name::new("Shutter Panel"),
            Mesh3d(meshes.add(Cuboid::new(4.0, 2.2, 0.2))),
            MeshMaterial3d(materials.add(Color::srgb(0.35, 0.38, 0.42))),
            Transform::from_xyz(0.0, 1.1, -14.0),
            RigidBody::Static,
            Collider::cuboid(4.0, 2.2, 0.2),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id();
    for side in [-1.0, 1.0] {
        commands.spawn((
            Name::new("Shutter Post"),
            Mesh3d(meshes.add(Cuboid::new(0.4, 4.0, 0.4))),
            MeshMaterial3d(materials.add(Color::srgb(0.25, 0.27, 0.3))),
            Transform::from_xyz(side * 2.2, 2.0, -14.0),
            RigidBody::Static,
            Collider::cuboid(0.4, 4.0, 0.4),
            DespawnOnExit(Screen::Gameplay),
        ));
    }

    let mut zone_three = InteractableZone::new(ZoneType::HoldAction, 3, 0);
    zone_three.display_message = Some("winch the shutter open".to_string());
    zone_three.key_state = KeyState::PressHold;
    zone_three.marker = Some(spawn_marker(&mut commands, zone_three_position));
    let zone_three = spawn_zone(
        &mut commands,
        "Zone 3 - Supply Shutter",
        zone_three_position,
        zone_three,
    );

    commands.spawn((
        Name::new("Supply Shutter"),
        SupplyShutter::new(zone_three, panel, 1.1),
        Transform::from_xyz(0.0, 0.0, -14.0),
        DespawnOnExit(Screen::Gameplay),
    ));

    // --- Zone 2: set off the charge --------------------------------------

    let zone_two_position = Vec3::new(4.0, 1.0, -17.0);
    let mut zone_two = InteractableZone::new(ZoneType::Action, 2, 1);
    zone_two.display_message = Some("arm the charge".to_string());
    zone_two.key_hint = Some(KeyCode::Space);
    zone_two.marker = Some(spawn_marker(&mut commands, zone_two_position));
    let zone_two = spawn_zone(
        &mut commands,
        "Zone 2 - Detonation Point",
        zone_two_position,
        zone_two,
    );

    commands.spawn((
        Name::new("C4 Charge"),
        Detonator::default(),
        Mesh3d(meshes.add(Cuboid::new(0.5, 0.25, 0.35))),
        MeshMaterial3d(materials.add(Color::srgb(0.75, 0.15, 0.1))),
        Transform::from_xyz(4.0, 0.4, -19.0),
        Visibility::Hidden,
        DespawnOnExit(Screen::Gameplay),
    ));

    // Loose debris in front of the charge for the blast to throw around.
    let rubble_mesh = meshes.add(Cuboid::new(0.6, 0.6, 0.6));
    let rubble_material = materials.add(Color::srgb(0.5, 0.45, 0.4));
    for (index, offset) in [
        Vec3::new(-0.8, 0.3, -0.4),
        Vec3::new(0.0, 0.3, 0.3),
        Vec3::new(0.9, 0.3, -0.2),
        Vec3::new(0.1, 0.9, 0.0),
    ]
    .into_iter()
    .enumerate()
    {
        commands.spawn((
            Name::new(format!("Rubble {index}")),
            Mesh3d(rubble_mesh.clone()),
            MeshMaterial3d(rubble_material.clone()),
            Transform::from_translation(Vec3::new(4.0, 0.0, -19.0) + offset),
            RigidBody::Dynamic,
            Collider::cuboid(0.6, 0.6, 0.6),
            DespawnOnExit(Screen::Gameplay),
        ));
    }

    // --- Zone 4: the drone pad -------------------------------------------

    let zone_four_position = Vec3::new(-12.0, 1.0, -18.0);
    let mut zone_four = InteractableZone::new(ZoneType::Action, 4, 2);
    zone_four.display_message = Some("power up the drone".to_string());
    zone_four.marker = Some(spawn_marker(&mut commands, zone_four_position));
    let zone_four = spawn_zone(
        &mut commands,
        "Zone 4 - Drone Pad",
        zone_four_position,
        zone_four,
    );
    spawn_drone(
        &mut commands,
        &mut meshes,
        &mut materials,
        Vec3::new(-12.0, 1.2, -20.0),
        zone_four,
    );

    // --- Zone 5: the forklift bay ----------------------------------------

    let zone_five_position = Vec3::new(12.0, 1.0, -6.0);
    let mut zone_five = InteractableZone::new(ZoneType::Action, 5, 3);
    zone_five.display_message = Some("climb into the forklift".to_string());
    zone_five.marker = Some(spawn_marker(&mut commands, zone_five_position));
    let zone_five = spawn_zone(
        &mut commands,
        "Zone 5 - Forklift Bay",
        zone_five_position,
        zone_five,
    );
    spawn_forklift(
        &mut commands,
        &mut meshes,
        &mut materials,
        Vec3::new(12.0, 0.75, -8.0),
        zone_five,
    );

    // --- Zone 6: the crate stack -----------------------------------------

    let zone_six_position = Vec3::new(14.0, 1.0, -18.0);
    let mut zone_six = InteractableZone::new(ZoneType::Action, 6, 4);
    zone_six.display_message = Some("square up to the crate".to_string());
    zone_six.marker = Some(spawn_marker(&mut commands, zone_six_position));
    let zone_six = spawn_zone(
        &mut commands,
        "Zone 6 - Crate Stack",
        zone_six_position,
        zone_six,
    );
    spawn_breakable_crate(
        &mut commands,
        &mut meshes,
        &mut materials,
        Vec3::new(14.0, 0.75, -20.0),
        zone_six,
    );

    roster.0 = vec![zone_one, zone_two, zone_three, zone_four, zone_five, zone_six];

    commands.queue(SpawnPlayer {
        position: Vec3::new(0.0, 2.0, 6.0),
    });
}

fn spawn_zone(
    commands: &mut Commands,
    name: &'static str,
    position: Vec3,
    zone: InteractableZone,
) -> Entity {
    commands
        .spawn((
            Name::new(name),
            zone,
            Transform::from_translation(position),
            RigidBody::Static,
            Collider::cuboid(3.0, 2.0, 3.0),
            Sensor,
            CollisionEventsEnabled,
            CollidingEntities::default(),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id()
}

fn spawn_environment(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 250.0,
        ..default()
    });

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(Vec3::new(-0.6, -1.0, -0.4), Vec3::Y),
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.spawn((
        Name::new("Floor"),
        Mesh3d(meshes.add(Cuboid::new(60.0, 0.5, 60.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.55, 0.55, 0.58))),
        Transform::from_xyz(0.0, -0.25, 0.0),
        RigidBody::Static,
        Collider::cuboid(60.0, 0.5, 60.0),
        DespawnOnExit(Screen::Gameplay),
    ));

    let wall_mesh = meshes.add(Cuboid::new(60.0, 6.0, 1.0));
    let wall_material = materials.add(Color::srgb(0.4, 0.42, 0.45));
    for (position, rotation) in [
        (Vec3::new(0.0, 3.0, -30.0), 0.0),
        (Vec3::new(0.0, 3.0, 30.0), 0.0),
        (Vec3::new(-30.0, 3.0, 0.0), std::f32::consts::FRAC_PI_2),
        (Vec3::new(30.0, 3.0, 0.0), std::f32::consts::FRAC_PI_2),
    ] {
        commands.spawn((
            Name::new("Wall"),
            Mesh3d(wall_mesh.clone()),
            MeshMaterial3d(wall_material.clone()),
            Transform::from_translation(position).with_rotation(Quat::from_rotation_y(rotation)),
            RigidBody::Static,
            Collider::cuboid(60.0, 6.0, 1.0),
            DespawnOnExit(Screen::Gameplay),
        ));
    }
}

fn spawn_cameras(commands: &mut Commands) {
    commands.spawn((
        Name::new("Main Camera"),
        Camera3d::default(),
        Transform::from_xyz(0.0, 6.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.spawn((
        Name::new("Follow Camera Rig"),
        PlayerFollowCamera,
        VirtualCamera { priority: 10 },
        Transform::from_xyz(0.0, 6.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        DespawnOnExit(Screen::Gameplay),
    ));
}

fn spawn_drone(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    position: Vec3,
    zone: Entity,
) {
    let body_mesh = meshes.add(Cuboid::new(1.2, 0.35, 1.2));
    let body_material = materials.add(Color::srgb(0.2, 0.22, 0.25));
    let rotor_mesh = meshes.add(Cylinder::new(0.35, 0.05));
    let rotor_material = materials.add(Color::srgb(0.1, 0.1, 0.1));

    let props = commands
        .spawn((
            Name::new("Rotor Assembly"),
            Transform::from_xyz(0.0, 0.3, 0.0),
            Visibility::Inherited,
        ))
        .with_children(|parent| {
            for (x, z) in [(-0.5, -0.5), (-0.5, 0.5), (0.5, -0.5), (0.5, 0.5)] {
                parent.spawn((
                    Mesh3d(rotor_mesh.clone()),
                    MeshMaterial3d(rotor_material.clone()),
                    Transform::from_xyz(x, 0.0, z),
                ));
            }
        })
        .id();

    commands
        .spawn((
            Name::new("Drone"),
            Drone::new(zone, props),
            Transform::from_translation(position),
            Visibility::Visible,
            RigidBody::Dynamic,
            Collider::cuboid(1.2, 0.35, 1.2),
            LinearDamping(0.6),
            AngularDamping(2.0),
            DespawnOnExit(Screen::Gameplay),
        ))
        .add_child(props)
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(body_mesh),
                MeshMaterial3d(body_material),
                Transform::default(),
            ));
            parent.spawn((
                Name::new("Drone Camera Rig"),
                DroneCamera,
                VirtualCamera { priority: 9 },
                Transform::from_xyz(0.0, 2.5, 5.5).looking_at(Vec3::ZERO, Vec3::Y),
            ));
        });
}

fn spawn_forklift(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    position: Vec3,
    zone: Entity,
) {
    let lift = commands
        .spawn((
            Name::new("Fork Carriage"),
            Mesh3d(meshes.add(Cuboid::new(1.4, 0.1, 1.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.7, 0.55, 0.1))),
            Transform::from_xyz(0.0, 0.1, -1.4),
        ))
        .id();
    let driver_model = commands
        .spawn((
            Name::new("Driver"),
            Mesh3d(meshes.add(Capsule3d::new(0.3, 0.7))),
            MeshMaterial3d(materials.add(Color::srgb(0.2, 0.45, 0.7))),
            Transform::from_xyz(0.0, 1.3, 0.3),
            Visibility::Hidden,
        ))
        .id();

    commands
        .spawn((
            Name::new("Forklift"),
            Forklift::new(lift, driver_model, zone),
            Transform::from_translation(position),
            Visibility::Visible,
            RigidBody::Kinematic,
            Collider::cuboid(1.4, 1.5, 2.2),
            DespawnOnExit(Screen::Gameplay),
        ))
        .add_child(lift)
        .add_child(driver_model)
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.4, 1.1, 2.0))),
                MeshMaterial3d(materials.add(Color::srgb(0.8, 0.6, 0.1))),
                Transform::from_xyz(0.0, 0.3, 0.2),
            ));
            // Mast the carriage rides on.
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.2, 2.4, 0.15))),
                MeshMaterial3d(materials.add(Color::srgb(0.3, 0.3, 0.32))),
                Transform::from_xyz(0.0, 0.9, -1.0),
            ));
            parent.spawn((
                Name::new("Forklift Camera Rig"),
                ForkliftCamera,
                VirtualCamera { priority: 9 },
                Transform::from_xyz(0.0, 3.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
            ));
        });
}

fn spawn_breakable_crate(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    position: Vec3,
    zone: Entity,
) {
    let crate_material = materials.add(Color::srgb(0.55, 0.4, 0.2));

    let whole_shell = commands
        .spawn((
            Name::new("Whole Crate"),
            Mesh3d(meshes.add(Cuboid::new(1.5, 1.5, 1.5))),
            MeshMaterial3d(crate_material.clone()),
            Transform::from_translation(position),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id();

    let piece_mesh = meshes.add(Cuboid::new(0.7, 0.7, 0.7));
    let mut pieces = Vec::new();
    let broken_shell = commands
        .spawn((
            Name::new("Broken Crate"),
            Transform::from_translation(position),
            Visibility::Hidden,
            DespawnOnExit(Screen::Gameplay),
        ))
        .id();
    for x in [-0.375, 0.375] {
        for y in [-0.375, 0.375] {
            for z in [-0.375, 0.375] {
                let piece = commands
                    .spawn((
                        Name::new("Crate Piece"),
                        Mesh3d(piece_mesh.clone()),
                        MeshMaterial3d(crate_material.clone()),
                        Transform::from_xyz(x, y, z),
                        RigidBody::Static,
                        Collider::cuboid(0.7, 0.7, 0.7),
                    ))
                    .id();
                commands.entity(broken_shell).add_child(piece);
                pieces.push(piece);
            }
        }
    }

    let root = commands
        .spawn((
            Name::new("Breakable Crate"),
            Transform::from_translation(position),
            RigidBody::Static,
            Collider::cuboid(1.5, 1.5, 1.5),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id();
    commands
        .entity(root)
        .insert(BreakableCrate::new(whole_shell, broken_shell, root, zone, pieces));
}
