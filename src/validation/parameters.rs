use std::ops::RangeInclusive;

use crate::error::{ValidationError, ValidationField};
use crate::job::GenerationParameters;

pub const STEPS_RANGE: RangeInclusive<u32> = 1..=100;
pub const GUIDANCE_RANGE: RangeInclusive<f32> = 0.5..=30.0;
pub const STRENGTH_RANGE: RangeInclusive<f32> = 0.1..=1.0;
pub const SEED_RANGE: RangeInclusive<i64> = 0..=2_147_483_647;
pub const DIMENSION_RANGE: RangeInclusive<u32> = 64..=2048;
pub const DIMENSION_MULTIPLE: u32 = 8;

pub fn validate_parameters(params: &GenerationParameters) -> Result<(), ValidationError> {
    if !STEPS_RANGE.contains(&params.steps) {
        return Err(ValidationError::new(
            ValidationField::Steps,
            format!(
                "Steps must be between {} and {}",
                STEPS_RANGE.start(),
                STEPS_RANGE.end()
            ),
        ));
    }

    // NaN fails `contains`, so it is rejected here too.
    if !GUIDANCE_RANGE.contains(&params.guidance) {
        return Err(ValidationError::new(
            ValidationField::Guidance,
            format!(
                "CFG Scale must be between {} and {}",
                GUIDANCE_RANGE.start(),
                GUIDANCE_RANGE.end()
            ),
        ));
    }

    if params.width % DIMENSION_MULTIPLE != 0 || params.height % DIMENSION_MULTIPLE != 0 {
        return Err(ValidationError::new(
            ValidationField::Dimensions,
            format!("Width and height must be divisible by {DIMENSION_MULTIPLE}"),
        ));
    }

    if !DIMENSION_RANGE.contains(&params.width) || !DIMENSION_RANGE.contains(&params.height) {
        let (min, max) = (DIMENSION_RANGE.start(), DIMENSION_RANGE.end());
        return Err(ValidationError::new(
            ValidationField::Dimensions,
            format!("Dimensions must be between {min}x{min} and {max}x{max}"),
        ));
    }

    if let Some(strength) = params.strength {
        if !STRENGTH_RANGE.contains(&strength) {
            return Err(ValidationError::new(
                ValidationField::Strength,
                format!(
                    "Strength must be between {} and {}",
                    STRENGTH_RANGE.start(),
                    STRENGTH_RANGE.end()
                ),
            ));
        }
    }

    if let Some(seed) = params.seed {
        if !SEED_RANGE.contains(&seed) {
            return Err(ValidationError::new(
                ValidationField::Seed,
                format!(
                    "Seed must be between {} and {}",
                    SEED_RANGE.start(),
                    SEED_RANGE.end()
                ),
            ));
        }
    }

    Ok(())
}
