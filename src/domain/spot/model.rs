//! Parking spot domain entity

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Fixed 2D coordinate of a parking spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> DomainResult<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(DomainError::Validation(
                "Location coordinates must be finite numbers".to_string(),
            ));
        }
        Ok(Self { x, y })
    }

    /// Build a location from raw components; exactly two are required.
    pub fn from_components(components: &[f64]) -> DomainResult<Self> {
        match components {
            [x, y] => Self::new(*x, *y),
            other => Err(DomainError::Validation(format!(
                "Location must be a list of two coordinates [x, y], got {} component(s)",
                other.len()
            ))),
        }
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// A physical parking location with its canonical reservation flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSpot {
    /// Storage-assigned identifier
    pub id: i32,
    pub location: Location,
    pub is_reserved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_components_are_accepted() {
        let loc = Location::from_components(&[12.0, 34.0]).unwrap();
        assert_eq!(loc.as_pair(), [12.0, 34.0]);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        for bad in [&[][..], &[1.0][..], &[1.0, 2.0, 3.0][..]] {
            let err = Location::from_components(bad).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(Location::new(f64::NAN, 1.0).is_err());
        assert!(Location::new(1.0, f64::INFINITY).is_err());
    }
}
