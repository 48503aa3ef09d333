//! Path-following steering

use crate::navigation::PathQuery;
use vigil_math::Vec3;

/// Turns a destination into a move direction every tick
///
/// The path is recomputed each call. When the destination cannot be
/// reached the last destination that could be is used instead.
#[derive(Debug, Clone, Default)]
pub struct PathFollower {
    last_valid_destination: Option<Vec3>,
    corners: Vec<Vec3>,
}

impl PathFollower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit direction toward the next corner, zero with fewer than two corners
    pub fn steer(&mut self, query: &dyn PathQuery, position: Vec3, destination: Vec3) -> Vec3 {
        self.corners = match query.query(position, destination) {
            Some(corners) => {
                self.last_valid_destination = Some(destination);
                corners
            }
            None => match self.last_valid_destination {
                Some(fallback) => query.query(position, fallback).unwrap_or_default(),
                None => {
                    log::warn!("No path to {:?} and no previous destination", destination);
                    Vec::new()
                }
            },
        };

        match self.corners.get(1) {
            Some(next) => (*next - position).normalize_or_zero(),
            None => Vec3::ZERO,
        }
    }

    pub fn last_valid_destination(&self) -> Option<Vec3> {
        self.last_valid_destination
    }

    /// Corners of the most recent query
    pub fn corners(&self) -> &[Vec3] {
        &self.corners
    }
}
