use super::LayerPart;
use crate::pipeline::artifacts::Environment;
use bevy::prelude::*;
use constants::viewport::{
    ENVIRONMENT_ANCHOR_SIZE, ENVIRONMENT_GROUND_COLOUR, ENVIRONMENT_GROUND_SIZE,
};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Build the environment layer. The scene description is not interpreted;
/// the id only picks the anchor colour so consecutive environments are
/// distinguishable.
pub fn environment_parts(environment: &Environment) -> Vec<LayerPart> {
    vec![
        LayerPart {
            name: format!("environment {} ground", environment.id),
            mesh: Plane3d::default()
                .mesh()
                .size(ENVIRONMENT_GROUND_SIZE, ENVIRONMENT_GROUND_SIZE)
                .build(),
            colour: ENVIRONMENT_GROUND_COLOUR,
            unlit: false,
            transform: Transform::IDENTITY,
        },
        LayerPart {
            name: format!("environment {} anchor", environment.id),
            mesh: Cuboid::from_length(ENVIRONMENT_ANCHOR_SIZE).into(),
            colour: id_colour(&environment.id),
            unlit: false,
            transform: Transform::from_xyz(0.0, ENVIRONMENT_ANCHOR_SIZE * 0.5, 0.0),
        },
    ]
}

/// Stable hue derived from the environment id.
pub fn id_colour(id: &str) -> Color {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hue = (hasher.finish() % 360) as f32;
    Color::hsl(hue, 0.65, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_named_after_the_environment() {
        let parts = environment_parts(&Environment::new("e1"));
        let names: Vec<_> = parts.iter().map(|part| part.name.as_str()).collect();
        assert_eq!(names, vec!["environment e1 ground", "environment e1 anchor"]);
    }

    #[test]
    fn anchor_colour_is_stable_per_id() {
        assert_eq!(id_colour("e1"), id_colour("e1"));
    }
}
