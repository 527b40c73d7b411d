use rand::Rng;
use serde::Serialize;

use crate::error::{DomainError, Result};

/// Smallest valid grid coordinate.
pub const MIN_COORDINATE: i32 = 1;

/// Largest valid grid coordinate.
pub const MAX_COORDINATE: i32 = 10;

/// A point on the delivery grid.
///
/// Both coordinates lie in `MIN_COORDINATE..=MAX_COORDINATE`. A `Location`
/// can only be obtained through a validating constructor and never changes
/// afterwards; moving produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    /// Creates a location, failing if either coordinate is off the grid.
    pub fn new(x: i32, y: i32) -> Result<Self> {
        check_coordinate("x", x)?;
        check_coordinate("y", y)?;
        Ok(Self { x, y })
    }

    /// Returns a uniformly random location on the grid.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    /// Returns a random location drawn from the given generator.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(MIN_COORDINATE..=MAX_COORDINATE),
            y: rng.gen_range(MIN_COORDINATE..=MAX_COORDINATE),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Manhattan distance to another location.
    pub fn distance_to(&self, other: &Location) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn check_coordinate(field: &'static str, value: i32) -> Result<()> {
    if (MIN_COORDINATE..=MAX_COORDINATE).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::ValueOutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(MIN_COORDINATE),
            max: i64::from(MAX_COORDINATE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn accepts_every_coordinate_on_the_grid() {
        for x in MIN_COORDINATE..=MAX_COORDINATE {
            for y in MIN_COORDINATE..=MAX_COORDINATE {
                let location = Location::new(x, y).unwrap();
                assert_eq!((location.x(), location.y()), (x, y));
            }
        }
    }

    #[test]
    fn rejects_coordinates_off_the_grid() {
        for (x, y) in [(0, 5), (11, 5), (5, 0), (5, 11), (-3, -3)] {
            let err = Location::new(x, y).unwrap_err();
            assert!(err.is_value_invalid(), "({x}, {y}) gave {err:?}");
        }
    }

    #[test]
    fn distance_is_manhattan_and_symmetric() {
        let a = Location::new(1, 1).unwrap();
        let b = Location::new(4, 6).unwrap();
        assert_eq!(a.distance_to(&b), 8);
        assert_eq!(b.distance_to(&a), 8);
        assert_eq!(a.distance_to(&a), 0);
    }

    #[test]
    fn distance_satisfies_triangle_inequality() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = Location::random_with(&mut rng);
            let b = Location::random_with(&mut rng);
            let c = Location::random_with(&mut rng);
            assert!(a.distance_to(&c) <= a.distance_to(&b) + b.distance_to(&c));
        }
    }

    #[test]
    fn random_stays_on_the_grid() {
        for _ in 0..100 {
            let location = Location::random();
            assert!(Location::new(location.x(), location.y()).is_ok());
        }
    }

    #[test]
    fn equality_compares_coordinates() {
        assert_eq!(Location::new(2, 3).unwrap(), Location::new(2, 3).unwrap());
        assert_ne!(Location::new(2, 3).unwrap(), Location::new(3, 2).unwrap());
    }
}
