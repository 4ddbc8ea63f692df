//! Five-point facial landmarks as emitted by the pose head of the face model.

/// Landmark order matches the model's keypoint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landmark {
    LeftEye,
    RightEye,
    Nose,
    LeftMouth,
    RightMouth,
}

impl Landmark {
    pub const ALL: [Landmark; 5] = [
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::Nose,
        Landmark::LeftMouth,
        Landmark::RightMouth,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// `None` marks a keypoint the model was not confident about.
    points: [Option<(f64, f64)>; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Option<(f64, f64)>; 5]) -> Self {
        Self { points }
    }

    pub fn get(&self, landmark: Landmark) -> Option<(f64, f64)> {
        self.points[landmark as usize]
    }

    pub fn points(&self) -> &[Option<(f64, f64)>; 5] {
        &self.points
    }

    /// Visible keypoints paired with their name, in model order.
    pub fn visible(&self) -> impl Iterator<Item = (Landmark, (f64, f64))> + '_ {
        Landmark::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(&kind, p)| p.map(|p| (kind, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontal() -> FaceLandmarks {
        FaceLandmarks::new([
            Some((440.0, 350.0)),
            Some((560.0, 350.0)),
            Some((500.0, 420.0)),
            Some((460.0, 470.0)),
            Some((540.0, 470.0)),
        ])
    }

    #[test]
    fn test_get_by_name() {
        let lm = frontal();
        assert_eq!(lm.get(Landmark::Nose), Some((500.0, 420.0)));
        assert_eq!(lm.get(Landmark::RightMouth), Some((540.0, 470.0)));
    }

    #[test]
    fn test_visible_skips_hidden_points() {
        let lm = FaceLandmarks::new([None, Some((1.0, 2.0)), None, None, Some((3.0, 4.0))]);
        let visible: Vec<_> = lm.visible().collect();
        assert_eq!(
            visible,
            vec![
                (Landmark::RightEye, (1.0, 2.0)),
                (Landmark::RightMouth, (3.0, 4.0))
            ]
        );
    }
}
