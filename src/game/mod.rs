//! Gameplay behaviors for the warehouse scene.

mod camera_rig;
mod hud;
mod input;
mod level;
mod objects;
mod player;
mod zones;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        input::plugin,
        zones::plugin,
        objects::plugin,
        player::plugin,
        camera_rig::plugin,
        hud::plugin,
        level::plugin,
    ));
}
