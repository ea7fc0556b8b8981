//! Semantic weight calculation.
//!
//! A weight is the sum of four terms, each a base weight times a
//! multiplier. Multipliers default to 1.0 and change once a count crosses a
//! model limit:
//!
//! | term           | count                        | above upper                    | below lower                   |
//! |----------------|------------------------------|--------------------------------|-------------------------------|
//! | length         | element end offset           | upper multiplier               | lower multiplier              |
//! | class          | `classes()`                  | upper - 0.2 * (n - 1)          | -                             |
//! | function       | `functions()`                | upper - 0.05 * (n - 20)        | lower - 0.1 * (4 - n)         |
//! | property/field | `fields()` + `properties()`  | upper - 0.05 * (n - 20)        | lower - 0.05 * (4 - n)        |
//!
//! Nothing is clamped; large counts can drive a term, and the total,
//! below zero.

use serde::{Deserialize, Serialize};

use crate::analysis::CodeElement;
use crate::model::WeightModel;

/// Slope constants of the count-based multipliers.
pub mod slopes {
    pub const CLASS_UPPER: f64 = 0.2;
    pub const CLASS_PIVOT: f64 = 1.0;

    pub const FUNCTION_UPPER: f64 = 0.05;
    pub const FUNCTION_UPPER_PIVOT: f64 = 20.0;
    pub const FUNCTION_LOWER: f64 = 0.1;
    pub const FUNCTION_LOWER_PIVOT: f64 = 4.0;

    pub const PROPERTY_FIELD_UPPER: f64 = 0.05;
    pub const PROPERTY_FIELD_UPPER_PIVOT: f64 = 20.0;
    pub const PROPERTY_FIELD_LOWER: f64 = 0.05;
    pub const PROPERTY_FIELD_LOWER_PIVOT: f64 = 4.0;
}

/// Per-term result of scoring one element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightBreakdown {
    /// End offset used for the length term
    pub length: u64,
    pub class_count: usize,
    pub function_count: usize,
    pub property_or_field_count: usize,

    pub length_multiplier: f64,
    pub class_multiplier: f64,
    pub function_multiplier: f64,
    pub property_or_field_multiplier: f64,

    pub length_weight: f64,
    pub class_weight: f64,
    pub function_weight: f64,
    pub property_or_field_weight: f64,
}

impl WeightBreakdown {
    /// Unclamped sum of the four terms.
    pub fn total(&self) -> f64 {
        self.length_weight + self.class_weight + self.function_weight + self.property_or_field_weight
    }
}

/// Multiplier for the length term. Pure step function.
pub fn length_multiplier(length: u64, model: &WeightModel) -> f64 {
    let length = length as f64;
    if length > model.length_upper_limit {
        model.length_upper_limit_multiplier
    } else if length < model.length_lower_limit {
        model.length_lower_limit_multiplier
    } else {
        1.0
    }
}

/// Multiplier for the class term. There is no lower bound.
pub fn class_multiplier(count: usize, model: &WeightModel) -> f64 {
    let count = count as f64;
    if count > model.class_upper_limit {
        model.class_upper_limit_multiplier - slopes::CLASS_UPPER * (count - slopes::CLASS_PIVOT)
    } else {
        1.0
    }
}

/// Multiplier for the function term.
pub fn function_multiplier(count: usize, model: &WeightModel) -> f64 {
    let count = count as f64;
    if count > model.function_upper_limit {
        model.function_upper_limit_multiplier
            - slopes::FUNCTION_UPPER * (count - slopes::FUNCTION_UPPER_PIVOT)
    } else if count < model.function_lower_limit {
        model.function_lower_limit_multiplier
            - slopes::FUNCTION_LOWER * (slopes::FUNCTION_LOWER_PIVOT - count)
    } else {
        1.0
    }
}

/// Multiplier for the property/field term.
pub fn property_or_field_multiplier(count: usize, model: &WeightModel) -> f64 {
    let count = count as f64;
    if count > model.property_field_upper_limit {
        model.property_field_upper_limit_multiplier
            - slopes::PROPERTY_FIELD_UPPER * (count - slopes::PROPERTY_FIELD_UPPER_PIVOT)
    } else if count < model.property_field_lower_limit {
        model.property_field_lower_limit_multiplier
            - slopes::PROPERTY_FIELD_LOWER * (slopes::PROPERTY_FIELD_LOWER_PIVOT - count)
    } else {
        1.0
    }
}

/// Score an element, keeping every intermediate value.
pub fn breakdown(element: CodeElement<'_>, model: &WeightModel) -> WeightBreakdown {
    let length = element.end();
    let class_count = element.classes().count();
    let function_count = element.functions().count();
    let property_or_field_count = element.properties_or_fields().count();

    let length_multiplier = length_multiplier(length, model);
    let class_multiplier = class_multiplier(class_count, model);
    let function_multiplier = function_multiplier(function_count, model);
    let property_or_field_multiplier = property_or_field_multiplier(property_or_field_count, model);

    WeightBreakdown {
        length,
        class_count,
        function_count,
        property_or_field_count,
        length_multiplier,
        class_multiplier,
        function_multiplier,
        property_or_field_multiplier,
        length_weight: model.base_length_weight * length_multiplier,
        class_weight: model.base_class_weight * class_multiplier,
        function_weight: model.base_function_weight * function_multiplier,
        property_or_field_weight: model.base_property_or_field_weight
            * property_or_field_multiplier,
    }
}

/// Semantic weight of an element under a model.
pub fn score(element: CodeElement<'_>, model: &WeightModel) -> f64 {
    breakdown(element, model).total()
}
