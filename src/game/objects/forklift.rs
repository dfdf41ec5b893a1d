//! The forklift. Entering its zone puts the player in the driver's seat
//! until escape is pressed.

use bevy::prelude::*;

use crate::{
    AppSystems,
    game::{
        camera_rig::{ForkliftCamera, VirtualCamera},
        input::ActionInput,
        zones::{CompleteZoneTask, ZoneInteractionComplete},
    },
    screens::Screen,
};

/// Zone that puts the forklift in drive mode.
pub const FORKLIFT_ZONE_ID: i32 = 5;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<DriveMode>();
    app.add_systems(
        Update,
        (enter_drive_mode, exit_drive_mode, drive, operate_lift)
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Drive mode hand-off, consumed by the player lock.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Entered,
    Exited,
}

#[derive(Component)]
pub struct Forklift {
    pub speed: f32,
    pub lift_speed: f32,
    /// Local-space travel limits for the fork carriage.
    pub lift_lower_limit: f32,
    pub lift_upper_limit: f32,
    /// The fork carriage entity, moved along its local Y.
    pub lift: Entity,
    /// Shown while someone is driving.
    pub driver_model: Entity,
    /// The zone that hands the forklift its input.
    pub zone: Entity,
    pub raise_key: KeyCode,
    pub lower_key: KeyCode,
    in_drive_mode: bool,
}

impl Forklift {
    pub fn new(lift: Entity, driver_model: Entity, zone: Entity) -> Self {
        Self {
            speed: 5.0,
            lift_speed: 1.0,
            lift_lower_limit: 0.1,
            lift_upper_limit: 1.6,
            lift,
            driver_model,
            zone,
            raise_key: KeyCode::KeyT,
            lower_key: KeyCode::KeyR,
            in_drive_mode: false,
        }
    }
}

fn enter_drive_mode(
    mut completions: MessageReader<ZoneInteractionComplete>,
    mut forklifts: Query<&mut Forklift>,
    mut cameras: Query<&mut VirtualCamera, With<ForkliftCamera>>,
    mut visibility: Query<&mut Visibility>,
    mut tasks: MessageWriter<CompleteZoneTask>,
    mut drive_mode: MessageWriter<DriveMode>,
) {
    for completion in completions.read() {
        if completion.zone_id != FORKLIFT_ZONE_ID {
            continue;
        }
        for mut forklift in forklifts.iter_mut() {
            if forklift.in_drive_mode {
                continue;
            }
            forklift.in_drive_mode = true;

            if let Ok(mut camera) = cameras.single_mut() {
                camera.priority = 11;
            } else {
                warn!("forklift has no camera rig to promote");
            }
            if let Ok(mut driver) = visibility.get_mut(forklift.driver_model) {
                *driver = Visibility::Visible;
            }

            drive_mode.write(DriveMode::Entered);
            tasks.write(CompleteZoneTask {
                zone: forklift.zone,
                zone_id: FORKLIFT_ZONE_ID,
            });
            info!("forklift drive mode entered");
        }
    }
}

fn exit_drive_mode(
    mut actions: MessageReader<ActionInput>,
    mut forklifts: Query<&mut Forklift>,
    mut cameras: Query<&mut VirtualCamera, With<ForkliftCamera>>,
    mut visibility: Query<&mut Visibility>,
    mut drive_mode: MessageWriter<DriveMode>,
) {
    let mut escape_pressed = false;
    for action in actions.read() {
        if *action == ActionInput::EscapePressed {
            escape_pressed = true;
        }
    }
    if !escape_pressed {
        return;
    }
    for mut forklift in forklifts.iter_mut() {
        if !forklift.in_drive_mode {
            continue;
        }
        forklift.in_drive_mode = false;

        if let Ok(mut camera) = cameras.single_mut() {
            camera.priority = 9;
        }
        if let Ok(mut driver) = visibility.get_mut(forklift.driver_model) {
            *driver = Visibility::Hidden;
        }

        drive_mode.write(DriveMode::Exited);
        info!("forklift drive mode exited");
    }
}

/// Translate along the forks, steer only while rolling.
fn drive(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut forklifts: Query<(&Forklift, &mut Transform)>,
) {
    for (forklift, mut transform) in forklifts.iter_mut() {
        if !forklift.in_drive_mode {
            continue;
        }

        let mut h = 0.0;
        if keyboard.pressed(KeyCode::KeyA) {
            h -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) {
            h += 1.0;
        }
        let mut v = 0.0;
        if keyboard.pressed(KeyCode::KeyS) {
            v -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyW) {
            v += 1.0;
        }

        let forward = transform.forward();
        transform.translation += forward * v * forklift.speed * time.delta_secs();

        if v.abs() > 0.0 {
            transform.rotate_y((-h * forklift.speed / 2.0).to_radians());
        }
    }
}

fn operate_lift(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    forklifts: Query<&Forklift>,
    mut transforms: Query<&mut Transform>,
) {
    for forklift in forklifts.iter() {
        if !forklift.in_drive_mode {
            continue;
        }

        let mut direction = 0.0;
        if keyboard.pressed(forklift.raise_key) {
            direction += 1.0;
        }
        if keyboard.pressed(forklift.lower_key) {
            direction -= 1.0;
        }
        if direction == 0.0 {
            continue;
        }

        let Ok(mut lift) = transforms.get_mut(forklift.lift) else {
            warn!("forklift has no lift carriage");
            continue;
        };
        lift.translation.y = advance_lift(
            lift.translation.y,
            direction,
            forklift.lift_speed * time.delta_secs(),
            forklift.lift_lower_limit,
            forklift.lift_upper_limit,
        );
    }
}

/// Move the carriage by one step, clamped to its travel limits.
fn advance_lift(current: f32, direction: f32, step: f32, lower: f32, upper: f32) -> f32 {
    (current + direction * step).clamp(lower, upper)
}
