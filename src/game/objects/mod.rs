//! The live objects the zones hand control to.

pub mod breakable;
pub mod detonator;
pub mod drone;
pub mod forklift;
pub mod shutter;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        breakable::plugin,
        detonator::plugin,
        drone::plugin,
        forklift::plugin,
        shutter::plugin,
    ));
}
