//! The C4 charge the player places and triggers through its zones.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    AppSystems,
    game::zones::CompleteZoneTask,
    screens::Screen,
};

/// Zone completed when the explosion goes off.
pub const DETONATION_ZONE_ID: i32 = 2;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<DetonatorCommand>();
    app.add_systems(
        Update,
        handle_detonator_commands
            .in_set(AppSystems::Update)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Requests the player sends on behalf of its zones. The carried zone entity
/// is forwarded to the completion request.
#[derive(Message, Debug, Clone, Copy)]
pub enum DetonatorCommand {
    Show,
    Trigger { zone: Entity },
}

#[derive(Component)]
pub struct Detonator {
    pub blast_radius: f32,
    pub blast_impulse: f32,
    placed: bool,
    detonated: bool,
}

impl Default for Detonator {
    fn default() -> Self {
        Self {
            blast_radius: 6.0,
            blast_impulse: 12.0,
            placed: false,
            detonated: false,
        }
    }
}

fn handle_detonator_commands(
    mut requests: MessageReader<DetonatorCommand>,
    mut detonators: Query<(Entity, &mut Detonator, &GlobalTransform, &mut Visibility)>,
    bodies: Query<(Entity, &GlobalTransform, &RigidBody), Without<Detonator>>,
    mut tasks: MessageWriter<CompleteZoneTask>,
    mut commands: Commands,
) {
    for request in requests.read() {
        let Ok((entity, mut detonator, transform, mut visibility)) = detonators.single_mut()
        else {
            warn!("no detonator in the scene");
            continue;
        };
        match *request {
            DetonatorCommand::Show => {
                if !detonator.placed {
                    detonator.placed = true;
                    *visibility = Visibility::Visible;
                    info!("C4 charge placed");
                }
            }
            DetonatorCommand::Trigger { zone } => {
                if !detonator.placed || detonator.detonated {
                    continue;
                }
                detonator.detonated = true;

                let center = transform.translation();
                for (body, body_transform, rigid_body) in bodies.iter() {
                    if *rigid_body != RigidBody::Dynamic {
                        continue;
                    }
                    let Some(impulse) = blast_impulse(
                        center,
                        body_transform.translation(),
                        detonator.blast_radius,
                        detonator.blast_impulse,
                    ) else {
                        continue;
                    };
                    if let Ok(mut body_commands) = commands.get_entity(body) {
                        body_commands
                            .insert(ExternalImpulse::new(impulse).with_persistence(false));
                    }
                }

                commands.entity(entity).despawn();
                tasks.write(CompleteZoneTask {
                    zone,
                    zone_id: DETONATION_ZONE_ID,
                });
                info!("C4 detonated");
            }
        }
    }
}

/// Impulse for a body caught in the blast, falling off linearly with
/// distance and biased upward. `None` outside the radius.
fn blast_impulse(center: Vec3, position: Vec3, radius: f32, strength: f32) -> Option<Vec3> {
    let offset = position - center;
    let distance = offset.length();
    if distance > radius {
        return None;
    }
    let falloff = 1.0 - distance / radius;
    let outward = offset.normalize_or_zero();
    Some((outward + Vec3::Y) * strength * falloff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blast_falls_off_with_distance() {
        let center = Vec3::ZERO;
        let near = blast_impulse(center, Vec3::X, 6.0, 12.0).unwrap();
        let far = blast_impulse(center, Vec3::X * 5.0, 6.0, 12.0).unwrap();
        assert!(near.length() > far.length());
        // Everything caught in the blast gets thrown upward.
        assert!(near.y > 0.0);
        assert!(far.y > 0.0);
    }

    #[test]
    fn bodies_outside_the_radius_are_untouched() {
        assert!(blast_impulse(Vec3::ZERO, Vec3::X * 7.0, 6.0, 12.0).is_none());
    }

    #[test]
    fn body_at_the_center_is_thrown_straight_up() {
        let impulse = blast_impulse(Vec3::ZERO, Vec3::ZERO, 6.0, 12.0).unwrap();
        assert_eq!(impulse, Vec3::Y * 12.0);
    }
}
