//! The surveillance drone. Entering its zone hands the player the flight
//! keys until escape is pressed.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    AppSystems,
    game::{
        camera_rig::{DroneCamera, VirtualCamera},
        input::ActionInput,
        zones::{CompleteZoneTask, ZoneInteractionComplete},
    },
    screens::Screen,
};

/// Zone that puts the drone in flight mode.
pub const DRONE_ZONE_ID: i32 = 4;

/// Hover bias along the drone's up axis, balancing gravity while level.
const HOVER_ACCELERATION: f32 = 9.81;

/// Visual tilt while translating.
const TILT_ANGLE_DEGREES: f32 = 30.0;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<FlightMode>();
    app.add_systems(
        Update,
        (
            enter_flight_mode,
            exit_flight_mode,
            read_flight_keys,
            steer_and_tilt,
            spin_props,
        )
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(
        FixedUpdate,
        apply_flight_forces.run_if(in_state(Screen::Gameplay)),
    );
}

/// Flight mode hand-off, consumed by the player lock and the HUD.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightMode {
    Entered,
    Exited,
}

#[derive(Component)]
pub struct Drone {
    pub speed: f32,
    /// The zone that hands the drone its input.
    pub zone: Entity,
    /// Rotor assembly spun up while flying.
    pub props: Entity,
    pub ascend_key: KeyCode,
    pub descend_key: KeyCode,
    in_flight: bool,
    ascend_pressed: bool,
    descend_pressed: bool,
}

impl Drone {
    pub fn new(zone: Entity, props: Entity) -> Self {
        Self {
            speed: 5.0,
            zone,
            props,
            ascend_key: KeyCode::Space,
            descend_key: KeyCode::KeyV,
            in_flight: false,
            ascend_pressed: false,
            descend_pressed: false,
        }
    }
}

fn enter_flight_mode(
    mut completions: MessageReader<ZoneInteractionComplete>,
    mut drones: Query<&mut Drone>,
    mut cameras: Query<&mut VirtualCamera, With<DroneCamera>>,
    mut tasks: MessageWriter<CompleteZoneTask>,
    mut flight: MessageWriter<FlightMode>,
) {
    for completion in completions.read() {
        if completion.zone_id != DRONE_ZONE_ID {
            continue;
        }
        for mut drone in drones.iter_mut() {
            if drone.in_flight {
                continue;
            }
            drone.in_flight = true;

            if let Ok(mut camera) = cameras.single_mut() {
                camera.priority = 11;
            } else {
                warn!("drone has no camera rig to promote");
            }

            flight.write(FlightMode::Entered);
            tasks.write(CompleteZoneTask {
                zone: drone.zone,
                zone_id: DRONE_ZONE_ID,
            });
            info!("drone flight mode entered");
        }
    }
}

fn exit_flight_mode(
    mut actions: MessageReader<ActionInput>,
    mut drones: Query<&mut Drone>,
    mut cameras: Query<&mut VirtualCamera, With<DroneCamera>>,
    mut flight: MessageWriter<FlightMode>,
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
    for mut drone in drones.iter_mut() {
        if !drone.in_flight {
            continue;
        }
        drone.in_flight = false;
        drone.ascend_pressed = false;
        drone.descend_pressed = false;

        if let Ok(mut camera) = cameras.single_mut() {
            camera.priority = 9;
        }

        flight.write(FlightMode::Exited);
        info!("drone flight mode exited");
    }
}

fn read_flight_keys(keyboard: Res<ButtonInput<KeyCode>>, mut drones: Query<&mut Drone>) {
    for mut drone in drones.iter_mut() {
        if !drone.in_flight {
            continue;
        }
        drone.ascend_pressed = keyboard.pressed(drone.ascend_key);
        drone.descend_pressed = keyboard.pressed(drone.descend_key);
    }
}

/// Constant hover bias every physics tick, plus ascend/descend while those
/// keys are down.
fn apply_flight_forces(
    time: Res<Time>,
    mut drones: Query<(&Drone, &Transform, &mut LinearVelocity)>,
) {
    for (drone, transform, mut velocity) in drones.iter_mut() {
        let up = transform.up();
        velocity.0 += up * HOVER_ACCELERATION * time.delta_secs();
        if !drone.in_flight {
            continue;
        }
        if drone.ascend_pressed {
            velocity.0 += up * drone.speed * time.delta_secs();
        }
        if drone.descend_pressed {
            velocity.0 -= up * drone.speed * time.delta_secs();
        }
    }
}

/// Yaw from the arrow keys, visual tilt from WASD. The tilt snaps back to
/// level the moment the keys release.
fn steer_and_tilt(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut drones: Query<(&Drone, &mut Transform)>,
) {
    for (drone, mut transform) in drones.iter_mut() {
        if !drone.in_flight {
            continue;
        }

        let mut yaw_input = 0.0;
        if keyboard.pressed(KeyCode::ArrowLeft) {
            yaw_input -= 1.0;
        }
        if keyboard.pressed(KeyCode::ArrowRight) {
            yaw_input += 1.0;
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

        let (mut yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        yaw -= (yaw_input * drone.speed / 3.0).to_radians();

        let (pitch, roll) = tilt_angles(h, v);
        transform.rotation = Quat::from_euler(
            EulerRot::YXZ,
            yaw,
            pitch.to_radians(),
            roll.to_radians(),
        );
    }
}

fn spin_props(time: Res<Time>, drones: Query<&Drone>, mut transforms: Query<&mut Transform>) {
    for drone in drones.iter() {
        if !drone.in_flight {
            continue;
        }
        if let Ok(mut props) = transforms.get_mut(drone.props) {
            props.rotate_y(40.0 * time.delta_secs());
        }
    }
}

/// Pitch/roll for the current translation input, in degrees.
fn tilt_angles(h: f32, v: f32) -> (f32, f32) {
    let pitch = if v > 0.0 {
        TILT_ANGLE_DEGREES
    } else if v < 0.0 {
        -TILT_ANGLE_DEGREES
    } else {
        0.0
    };
    let roll = if h < 0.0 {
        TILT_ANGLE_DEGREES
    } else if h > 0.0 {
        -TILT_ANGLE_DEGREES
    } else {
        0.0
    };
    (pitch, roll)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilt_follows_translation_input() {
        assert_eq!(tilt_angles(0.0, 0.0), (0.0, 0.0));
        assert_eq!(tilt_angles(0.0, 1.0), (TILT_ANGLE_DEGREES, 0.0));
        assert_eq!(tilt_angles(0.0, -1.0), (-TILT_ANGLE_DEGREES, 0.0));
        assert_eq!(tilt_angles(-1.0, 0.0), (0.0, TILT_ANGLE_DEGREES));
        assert_eq!(tilt_angles(1.0, 0.0), (0.0, -TILT_ANGLE_DEGREES));
    }
}
