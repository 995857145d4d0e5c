use avoid_core::{AvoidError, AvoidResult};
use serde::{Deserialize, Serialize};

/// One of the five monitored directions
///
/// The declaration order is the order samples are stored in and the order
/// the policy reasons about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorRole {
    /// Straight ahead (0°)
    Front,
    /// Front-left (30°)
    NearLeft,
    /// Left (60°)
    FarLeft,
    /// Right (300°)
    FarRight,
    /// Front-right (330°)
    NearRight,
}

impl SectorRole {
    pub const ALL: [SectorRole; 5] = [
        SectorRole::Front,
        SectorRole::NearLeft,
        SectorRole::FarLeft,
        SectorRole::FarRight,
        SectorRole::NearRight,
    ];

    /// Bearing in whole degrees, counter-clockwise from straight ahead
    pub fn bearing_degrees(self) -> u32 {
        match self {
            SectorRole::Front => 0,
            SectorRole::NearLeft => 30,
            SectorRole::FarLeft => 60,
            SectorRole::FarRight => 300,
            SectorRole::NearRight => 330,
        }
    }

    /// Position of this role inside [`SectorRole::ALL`]
    pub fn slot(self) -> usize {
        self as usize
    }
}

/// Which scan index each monitored direction is sampled from
///
/// The default matches a one-degree, 360-beam scanner: indices
/// 0, 30, 60, 300 and 330.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    indices: [usize; 5],
}

impl SectorLayout {
    /// Build a layout from explicit indices, one per role
    pub fn new(
        front: usize,
        near_left: usize,
        far_left: usize,
        far_right: usize,
        near_right: usize,
    ) -> AvoidResult<Self> {
        let indices = [front, near_left, far_left, far_right, near_right];
        for (i, a) in indices.iter().enumerate() {
            if indices[i + 1..].contains(a) {
                return Err(AvoidError::InvalidConfig(format!(
                    "sector layout samples index {} twice",
                    a
                )));
            }
        }
        Ok(Self { indices })
    }

    /// Layout for a scanner spreading `beams_per_revolution` beams evenly over
    /// a full turn, starting straight ahead
    pub fn for_resolution(beams_per_revolution: usize) -> AvoidResult<Self> {
        if beams_per_revolution == 0 {
            return Err(AvoidError::InvalidConfig(
                "beams_per_revolution must be positive".to_string(),
            ));
        }

        let index_for = |role: SectorRole| -> AvoidResult<usize> {
            let scaled = (role.bearing_degrees() as usize)
                .checked_mul(beams_per_revolution)
                .and_then(|scaled| scaled.checked_add(180))
                .ok_or_else(|| {
                    AvoidError::InvalidConfig(format!(
                        "{} beams per revolution is too fine to index",
                        beams_per_revolution
                    ))
                })?;
            Ok((scaled / 360) % beams_per_revolution)
        };
        Self::new(
            index_for(SectorRole::Front)?,
            index_for(SectorRole::NearLeft)?,
            index_for(SectorRole::FarLeft)?,
            index_for(SectorRole::FarRight)?,
            index_for(SectorRole::NearRight)?,
        )
        .map_err(|_| {
            AvoidError::InvalidConfig(format!(
                "{} beams per revolution is too coarse to separate five sectors",
                beams_per_revolution
            ))
        })
    }

    /// Scan index sampled for `role`
    pub fn index(&self, role: SectorRole) -> usize {
        self.indices[role.slot()]
    }

    /// Shortest scan every index of this layout fits into
    pub fn required_len(&self) -> usize {
        self.indices.iter().copied().max().unwrap_or(0) + 1
    }

    /// Roles with their indices, in priority order
    pub fn iter(&self) -> impl Iterator<Item = (SectorRole, usize)> + '_ {
        SectorRole::ALL
            .iter()
            .map(move |&role| (role, self.index(role)))
    }
}

impl Default for SectorLayout {
    fn default() -> Self {
        Self {
            indices: [0, 30, 60, 300, 330],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = SectorLayout::default();
        let indices: Vec<usize> = layout.iter().map(|(_, i)| i).collect();
        assert_eq!(indices, vec![0, 30, 60, 300, 330]);
        assert_eq!(layout.required_len(), 331);
    }

    #[test]
    fn test_resolution_360_matches_default() {
        assert_eq!(
            SectorLayout::for_resolution(360).unwrap(),
            SectorLayout::default()
        );
    }

    #[test]
    fn test_half_degree_resolution() {
        let layout = SectorLayout::for_resolution(720).unwrap();
        assert_eq!(layout.index(SectorRole::NearLeft), 60);
        assert_eq!(layout.index(SectorRole::NearRight), 660);
        assert_eq!(layout.required_len(), 661);
    }

    #[test]
    fn test_coarse_resolution_rejected() {
        assert!(SectorLayout::for_resolution(12).is_ok());
        assert!(SectorLayout::for_resolution(8).is_err());
        assert!(SectorLayout::for_resolution(0).is_err());
    }

    #[test]
    fn test_duplicate_indices_rejected() {
        assert!(SectorLayout::new(0, 10, 10, 20, 30).is_err());
    }

    #[test]
    fn test_oversized_resolution_rejected() {
        for beams in [usize::MAX, usize::MAX / 330 + 1] {
            match SectorLayout::for_resolution(beams) {
                Err(AvoidError::InvalidConfig(msg)) => assert!(msg.contains("too fine")),
                other => panic!("unexpected layout {:?}", other),
            }
        }
    }
}
