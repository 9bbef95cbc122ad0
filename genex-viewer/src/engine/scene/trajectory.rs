use super::{GeometryError, LayerPart, ensure_finite, polyline_mesh};
use crate::pipeline::artifacts::Trajectory;
use bevy::prelude::*;
use constants::viewport::{TRAJECTORY_COLOUR, TRAJECTORY_MARKER_RADIUS};

/// Build the trajectory overlay: one polyline through every sample, a marker
/// at the first sample and one at the last. Samples without a position are
/// left out.
pub fn trajectory_parts(trajectory: &Trajectory) -> Result<Vec<LayerPart>, GeometryError> {
    let points = trajectory.positions();
    ensure_finite("trajectory sample", &points)?;

    let mut parts = Vec::new();
    if points.len() >= 2 {
        parts.push(LayerPart {
            name: "trajectory path".to_string(),
            mesh: polyline_mesh(&points),
            colour: TRAJECTORY_COLOUR,
            unlit: true,
            transform: Transform::IDENTITY,
        });
    }

    let markers = match points.as_slice() {
        [] => Vec::new(),
        [only] => vec![("trajectory start", *only)],
        [first, .., last] => vec![("trajectory start", *first), ("trajectory end", *last)],
    };
    for (name, position) in markers {
        parts.push(LayerPart {
            name: name.to_string(),
            mesh: Sphere::new(TRAJECTORY_MARKER_RADIUS).into(),
            colour: TRAJECTORY_COLOUR,
            unlit: true,
            transform: Transform::from_translation(Vec3::from_array(position)),
        });
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::artifacts::TrajectorySample;

    fn trajectory(points: &[[f32; 3]]) -> Trajectory {
        Trajectory::new(points.iter().copied().map(TrajectorySample::at).collect())
    }

    #[test]
    fn path_and_markers_follow_the_samples() {
        let parts =
            trajectory_parts(&trajectory(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 1.0]]))
                .unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].mesh.count_vertices(), 3);
        assert_eq!(parts[2].transform.translation, Vec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn single_sample_gets_only_a_marker() {
        let parts = trajectory_parts(&trajectory(&[[0.5, 0.0, 0.5]])).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "trajectory start");
    }

    #[test]
    fn empty_trajectories_render_nothing() {
        assert!(trajectory_parts(&Trajectory::default()).unwrap().is_empty());
    }

    #[test]
    fn samples_without_positions_are_left_out() {
        let mut samples = trajectory(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]).samples;
        samples.insert(1, TrajectorySample::default());
        let parts = trajectory_parts(&Trajectory::new(samples)).unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].mesh.count_vertices(), 2);
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let result = trajectory_parts(&trajectory(&[[0.0, 0.0, 0.0], [f32::INFINITY, 0.0, 0.0]]));
        assert!(result.is_err());
    }
}
