//! Virtual camera rigs. Each frame the main camera adopts the pose of the
//! highest-priority rig; the vehicles raise and lower their rigs' priorities
//! to take over the view.

use bevy::prelude::*;

use crate::{AppSystems, game::player::Player, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (follow_player, pose_main_camera)
            .chain()
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// A camera rig competing for the main camera. Highest priority wins; no
/// blending.
#[derive(Component, Debug, Clone, Copy)]
pub struct VirtualCamera {
    pub priority: i32,
}

/// The default rig trailing the player. Priority 10 while the player has
/// control, 9 while a vehicle owns the view.
#[derive(Component)]
pub struct PlayerFollowCamera;

/// The drone's chase rig.
#[derive(Component)]
pub struct DroneCamera;

/// The forklift's cab rig.
#[derive(Component)]
pub struct ForkliftCamera;

const FOLLOW_OFFSET: Vec3 = Vec3::new(0.0, 5.0, 9.0);
const FOLLOW_LERP_SPEED: f32 = 8.0;

fn follow_player(
    time: Res<Time>,
    players: Query<&Transform, (With<Player>, Without<PlayerFollowCamera>)>,
    mut rigs: Query<&mut Transform, With<PlayerFollowCamera>>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    for mut rig in rigs.iter_mut() {
        let target = player.translation + FOLLOW_OFFSET;
        rig.translation = rig
            .translation
            .lerp(target, (FOLLOW_LERP_SPEED * time.delta_secs()).min(1.0));
        rig.look_at(player.translation + Vec3::Y, Vec3::Y);
    }
}

fn pose_main_camera(
    rigs: Query<(&VirtualCamera, &GlobalTransform)>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    let Ok(mut camera) = cameras.single_mut() else {
        warn_once!("no main camera to drive");
        return;
    };
    let Some((_, pose)) = rigs
        .iter()
        .max_by_key(|(virtual_camera, _)| virtual_camera.priority)
    else {
        return;
    };
    *camera = pose.compute_transform();
}
