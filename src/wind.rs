use plume_common::{angle_to_vec, FieldError, Vec2, WindConfig};

/// A wind velocity field queried at batches of positions.
pub trait WindField {
    /// Wind velocity at each point at time `t`. A single point is a batch of one.
    fn value(&self, t: f64, points: &[Vec2]) -> Vec<Vec2>;

    /// Same query with the positions split into x and y slices.
    fn value_xy(&self, t: f64, x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>), FieldError> {
        if x.len() != y.len() {
            return Err(FieldError::ShapeMismatch { x_len: x.len(), y_len: y.len() });
        }
        let points: Vec<Vec2> = x.iter().zip(y).map(|(&x, &y)| Vec2::new(x, y)).collect();
        Ok(self.value(t, &points).into_iter().map(|v| (v.x, v.y)).unzip())
    }
}

/// Uniform, time-invariant wind given by a direction and a speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWindField {
    angle: f64, // radians, counter-clockwise from +x
    speed: f64,
}

impl ConstantWindField {
    pub fn new(angle: f64, speed: f64) -> Self {
        Self { angle, speed }
    }

    pub fn from_config(config: &WindConfig) -> Self {
        match *config {
            WindConfig::Constant { angle_deg, speed } => Self::new(angle_deg.to_radians(), speed),
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The wind velocity vector, identical everywhere.
    pub fn velocity(&self) -> Vec2 {
        angle_to_vec(self.angle).scale(self.speed)
    }
}

impl WindField for ConstantWindField {
    fn value(&self, _t: f64, points: &[Vec2]) -> Vec<Vec2> {
        vec![self.velocity(); points.len()]
    }
}
