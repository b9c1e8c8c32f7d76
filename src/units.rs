use serde::{Deserialize, Serialize};

const LB_PER_KG: f64 = 2.204_622_621_8;

/// Unit the user enters weights in. Kilograms are canonical: every personal
/// record comparison and every persisted history weight is in kg.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    /// Converts without rounding.
    pub fn to_canonical_exact(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value / LB_PER_KG,
        }
    }

    /// Converts to kg, rounded to two decimals so that a value entered in
    /// pounds compares equal after a round trip through storage.
    pub fn to_canonical(&self, value: f64) -> f64 {
        round2(self.to_canonical_exact(value))
    }

    pub fn from_canonical(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => round2(value * LB_PER_KG),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
