use std::str::FromStr;

use crate::error::TransformError;

/// Mass units TRI reports quantities in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassUnit {
    Pounds,
    Grams,
}

impl MassUnit {
    /// Multiplier to kilograms
    pub fn kilograms_factor(&self) -> f64 {
        match self {
            MassUnit::Pounds => 0.453592,
            MassUnit::Grams => 1e-3,
        }
    }

    pub fn to_kilograms(&self, quantity: f64) -> f64 {
        quantity * self.kilograms_factor()
    }
}

impl FromStr for MassUnit {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pounds" => Ok(MassUnit::Pounds),
            "grams" => Ok(MassUnit::Grams),
            _ => Err(TransformError::UnknownUnit(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        let pounds: MassUnit = "Pounds".parse().unwrap();
        let grams: MassUnit = "GRAMS".parse().unwrap();
        assert!((pounds.to_kilograms(10.0) - 4.53592).abs() < 1e-9);
        assert!((grams.to_kilograms(10.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        assert!(matches!(
            "Tons".parse::<MassUnit>(),
            Err(TransformError::UnknownUnit(u)) if u == "Tons"
        ));
        assert!("".parse::<MassUnit>().is_err());
    }
}
