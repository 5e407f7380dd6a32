use serde::Serialize;

/// Parcel dimensions in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

/// Kilograms used when a listing has no usable weight.
pub const DEFAULT_WEIGHT_KG: f64 = 3.0;

/// Map a parcel weight (kg) to a fixed package size band. Lower bounds are
/// inclusive: 1 kg falls in the second band, 30 kg in the last.
pub fn dimensions_for_weight(weight_kg: f64) -> Dimensions {
    if weight_kg < 1.0 {
        Dimensions {
            length: 37,
            width: 23,
            height: 10,
        }
    } else if weight_kg < 2.0 {
        Dimensions {
            length: 47,
            width: 34,
            height: 15,
        }
    } else if weight_kg < 30.0 {
        Dimensions {
            length: 50,
            width: 38,
            height: 19,
        }
    } else {
        Dimensions {
            length: 100,
            width: 100,
            height: 100,
        }
    }
}

/// Resolve a listing weight, falling back to the default when it is missing
/// or non-positive.
pub fn effective_weight(weight: Option<f64>) -> f64 {
    match weight {
        Some(w) if w > 0.0 => w,
        _ => DEFAULT_WEIGHT_KG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_all_weights() {
        assert_eq!(
            dimensions_for_weight(0.2),
            Dimensions {
                length: 37,
                width: 23,
                height: 10
            }
        );
        assert_eq!(
            dimensions_for_weight(1.5),
            Dimensions {
                length: 47,
                width: 34,
                height: 15
            }
        );
        assert_eq!(
            dimensions_for_weight(15.0),
            Dimensions {
                length: 50,
                width: 38,
                height: 19
            }
        );
        assert_eq!(
            dimensions_for_weight(45.0),
            Dimensions {
                length: 100,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn lower_bounds_are_inclusive() {
        assert_eq!(dimensions_for_weight(1.0).length, 47);
        assert_eq!(dimensions_for_weight(2.0).length, 50);
        assert_eq!(dimensions_for_weight(30.0).length, 100);
    }

    #[test]
    fn missing_or_zero_weight_defaults_to_three_kg() {
        assert_eq!(effective_weight(None), DEFAULT_WEIGHT_KG);
        assert_eq!(effective_weight(Some(0.0)), DEFAULT_WEIGHT_KG);
        assert_eq!(effective_weight(Some(-1.0)), DEFAULT_WEIGHT_KG);
        assert_eq!(effective_weight(Some(1.5)), 1.5);
    }
}
