//! The supply shutter: rises while the hold key is down, sinks back when it
//! lets go, and latches open at the top.

use bevy::prelude::*;

use crate::{
    AppSystems,
    game::zones::{CompleteZoneTask, HoldEnded, HoldStarted},
    screens::Screen,
};

/// Zone whose hold interaction drives the shutter.
pub const SHUTTER_ZONE_ID: i32 = 3;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (follow_hold_state, animate_shutter)
            .chain()
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

#[derive(Component)]
pub struct SupplyShutter {
    /// The zone that drives the shutter.
    pub zone: Entity,
    /// The sliding panel, moved along its local Y.
    pub panel: Entity,
    pub raise_speed: f32,
    /// Meters of travel until fully open.
    pub travel: f32,
    panel_rest_height: f32,
    progress: f32,
    rising: bool,
    latched: bool,
}

impl SupplyShutter {
    pub fn new(zone: Entity, panel: Entity, panel_rest_height: f32) -> Self {
        Self {
            zone,
            panel,
            raise_speed: 0.8,
            travel: 2.0,
            panel_rest_height,
            progress: 0.0,
            rising: false,
            latched: false,
        }
    }
}

fn follow_hold_state(
    mut started: MessageReader<HoldStarted>,
    mut ended: MessageReader<HoldEnded>,
    mut shutters: Query<&mut SupplyShutter>,
) {
    for hold in started.read() {
        if hold.zone_id != SHUTTER_ZONE_ID {
            continue;
        }
        for mut shutter in shutters.iter_mut() {
            shutter.rising = true;
        }
    }
    for hold in ended.read() {
        if hold.zone_id != SHUTTER_ZONE_ID {
            continue;
        }
        for mut shutter in shutters.iter_mut() {
            shutter.rising = false;
        }
    }
}

fn animate_shutter(
    time: Res<Time>,
    mut shutters: Query<&mut SupplyShutter>,
    mut transforms: Query<&mut Transform>,
    mut tasks: MessageWriter<CompleteZoneTask>,
) {
    for mut shutter in shutters.iter_mut() {
        let step = shutter.raise_speed * time.delta_secs();
        shutter.progress = advance_shutter(
            shutter.progress,
            shutter.rising || shutter.latched,
            step,
            shutter.travel,
        );

        if !shutter.latched && shutter.progress >= shutter.travel {
            shutter.latched = true;
            tasks.write(CompleteZoneTask {
                zone: shutter.zone,
                zone_id: SHUTTER_ZONE_ID,
            });
            info!("supply shutter latched open");
        }

        let Ok(mut panel) = transforms.get_mut(shutter.panel) else {
            warn!("supply shutter has no panel");
            continue;
        };
        panel.translation.y = shutter.panel_rest_height + shutter.progress;
    }
}

/// One animation step, clamped to the travel range.
fn advance_shutter(progress: f32, rising: bool, step: f32, travel: f32) -> f32 {
    let next = if rising { progress + step } else { progress - step };
    next.clamp(0.0, travel)
}
