//! Grain-size, uniformity and mobile-fines classifications.
//!
//! Boundaries are upper limits: a value belongs to the first class whose
//! boundary it does not exceed. Values past the last boundary fall into the
//! open-ended top class.

/// Wentworth grade upper boundaries (micron).
pub const WENTWORTH_BOUNDARIES: [(WentworthGrade, f64); 8] = [
    (WentworthGrade::Clay, 3.9),
    (WentworthGrade::Silt, 62.0),
    (WentworthGrade::VeryFineSand, 125.0),
    (WentworthGrade::FineSand, 250.0),
    (WentworthGrade::MediumSand, 500.0),
    (WentworthGrade::CoarseSand, 1000.0),
    (WentworthGrade::VeryCoarseSand, 2000.0),
    (WentworthGrade::Gravel, 4000.0),
];

/// Uniformity coefficient (D40/D90) class boundaries.
pub const UNIFORMITY_BOUNDARIES: [(UniformityClass, f64); 4] = [
    (UniformityClass::HighlyUniform, 3.0),
    (UniformityClass::Uniform, 5.0),
    (UniformityClass::NonUniform, 10.0),
    (UniformityClass::HighlyNonUniform, 25.0),
];

/// Mobile fines coefficient class boundaries.
pub const MOBILE_FINES_BOUNDARIES: [(MobileFinesClass, f64); 4] = [
    (MobileFinesClass::FinesImmobile, 5.0),
    (MobileFinesClass::ImpairmentIncreasing, 10.0),
    (MobileFinesClass::ImpairmentDecreasing, 25.0),
    (MobileFinesClass::FinesProduced, 250.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WentworthGrade {
    Clay,
    Silt,
    VeryFineSand,
    FineSand,
    MediumSand,
    CoarseSand,
    VeryCoarseSand,
    Gravel,
}

impl WentworthGrade {
    pub fn classify(size_micron: f64) -> Self {
        classify(&WENTWORTH_BOUNDARIES, size_micron, WentworthGrade::Gravel)
    }

    /// Short label used on plots and in tables.
    pub fn label(self) -> &'static str {
        match self {
            WentworthGrade::Clay => "Clay",
            WentworthGrade::Silt => "Silt",
            WentworthGrade::VeryFineSand => "VFG Sand",
            WentworthGrade::FineSand => "FG Sand",
            WentworthGrade::MediumSand => "MG Sand",
            WentworthGrade::CoarseSand => "CG Sand",
            WentworthGrade::VeryCoarseSand => "VCG Sand",
            WentworthGrade::Gravel => "Gravel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformityClass {
    HighlyUniform,
    Uniform,
    NonUniform,
    HighlyNonUniform,
}

impl UniformityClass {
    pub fn classify(uniformity_coeff: f64) -> Self {
        classify(&UNIFORMITY_BOUNDARIES, uniformity_coeff, UniformityClass::HighlyNonUniform)
    }

    pub fn label(self) -> &'static str {
        match self {
            UniformityClass::HighlyUniform => "Highly Uniform",
            UniformityClass::Uniform => "Uniform",
            UniformityClass::NonUniform => "Non-Uniform",
            UniformityClass::HighlyNonUniform => "Highly Non-Uniform",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileFinesClass {
    FinesImmobile,
    ImpairmentIncreasing,
    ImpairmentDecreasing,
    FinesProduced,
}

impl MobileFinesClass {
    pub fn classify(mobile_fines_coeff: f64) -> Self {
        classify(&MOBILE_FINES_BOUNDARIES, mobile_fines_coeff, MobileFinesClass::FinesProduced)
    }

    pub fn label(self) -> &'static str {
        match self {
            MobileFinesClass::FinesImmobile => "Fines Immobile",
            MobileFinesClass::ImpairmentIncreasing => "Impairment Increasing",
            MobileFinesClass::ImpairmentDecreasing => "Impairment Decreasing",
            MobileFinesClass::FinesProduced => "Fines Produced",
        }
    }
}

fn classify<T: Copy>(boundaries: &[(T, f64)], value: f64, top: T) -> T {
    boundaries
        .iter()
        .find(|(_, upper)| value <= *upper)
        .map(|(class, _)| *class)
        .unwrap_or(top)
}
