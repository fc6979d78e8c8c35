//! Closed-set categorical fields.
//!
//! Each enum mirrors one option list of the data-entry form. `label()` is the
//! exact text the form submits and `code()` is the integer the classifier saw
//! for that option at training time. Both are exhaustive matches, so a new
//! variant cannot be added without deciding its code.

use super::encoder::EncodingError;
use super::schema::Field;

/// A closed-set categorical field.
pub trait Category: Copy + Sized + 'static {
    /// The input field this category is entered through.
    const FIELD: Field;

    /// All variants in code order.
    const ALL: &'static [Self];

    /// Human-facing label, matched exactly (case-sensitive) on input.
    fn label(self) -> &'static str;

    /// Training-time integer code.
    fn code(self) -> u8;

    /// Parse a submitted label.
    ///
    /// # Errors
    /// Returns `EncodingError::UnknownCategory` for any string that is not
    /// one of the listed labels.
    fn parse(value: &str) -> Result<Self, EncodingError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label() == value)
            .ok_or_else(|| EncodingError::unknown_category(Self::FIELD, value))
    }

    /// Option labels in code order, as a form would list them.
    #[must_use]
    fn options() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl Category for Sex {
    const FIELD: Field = Field::Sex;
    const ALL: &'static [Self] = &[Self::Female, Self::Male];

    fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChestPainType {
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    Asymptomatic,
}

impl Category for ChestPainType {
    const FIELD: Field = Field::ChestPainType;
    const ALL: &'static [Self] = &[
        Self::TypicalAngina,
        Self::AtypicalAngina,
        Self::NonAnginalPain,
        Self::Asymptomatic,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::TypicalAngina => "Typical Angina",
            Self::AtypicalAngina => "Atypical Angina",
            Self::NonAnginalPain => "Non-anginal Pain",
            Self::Asymptomatic => "Asymptomatic",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::TypicalAngina => 0,
            Self::AtypicalAngina => 1,
            Self::NonAnginalPain => 2,
            Self::Asymptomatic => 3,
        }
    }
}

/// Fasting blood sugar above 120 mg/dl, submitted as `"True"`/`"False"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FastingBloodSugar {
    NotElevated,
    Elevated,
}

impl Category for FastingBloodSugar {
    const FIELD: Field = Field::FastingBloodSugarHigh;
    const ALL: &'static [Self] = &[Self::NotElevated, Self::Elevated];

    fn label(self) -> &'static str {
        match self {
            Self::NotElevated => "False",
            Self::Elevated => "True",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::NotElevated => 0,
            Self::Elevated => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestingEcg {
    Normal,
    StTWaveAbnormality,
    LeftVentricularHypertrophy,
}

impl Category for RestingEcg {
    const FIELD: Field = Field::RestingEcg;
    const ALL: &'static [Self] = &[
        Self::Normal,
        Self::StTWaveAbnormality,
        Self::LeftVentricularHypertrophy,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::StTWaveAbnormality => "ST-T Wave Abnormality",
            Self::LeftVentricularHypertrophy => {
                "Probable or Definite Left Ventricular Hypertrophy"
            }
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::StTWaveAbnormality => 1,
            Self::LeftVentricularHypertrophy => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseAngina {
    No,
    Yes,
}

impl Category for ExerciseAngina {
    const FIELD: Field = Field::ExerciseInducedAngina;
    const ALL: &'static [Self] = &[Self::No, Self::Yes];

    fn label(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
        }
    }
}

/// Slope of the peak exercise ST segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl Category for StSlope {
    const FIELD: Field = Field::StSlope;
    const ALL: &'static [Self] = &[Self::Upsloping, Self::Flat, Self::Downsloping];

    fn label(self) -> &'static str {
        match self {
            Self::Upsloping => "Upsloping",
            Self::Flat => "Flat",
            Self::Downsloping => "Downsloping",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Upsloping => 0,
            Self::Flat => 1,
            Self::Downsloping => 2,
        }
    }
}

/// Thallium stress test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThalResult {
    Normal,
    FixedDefect,
    ReversibleDefect,
}

impl Category for ThalResult {
    const FIELD: Field = Field::ThalResult;
    const ALL: &'static [Self] = &[Self::Normal, Self::FixedDefect, Self::ReversibleDefect];

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FixedDefect => "Fixed Defect",
            Self::ReversibleDefect => "Reversible Defect",
        }
    }

    fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::FixedDefect => 1,
            Self::ReversibleDefect => 2,
        }
    }
}

/// Option labels for `vessels_colored_count`. The value is a count and is
/// parsed numerically, not looked up.
pub const VESSEL_COUNT_OPTIONS: [&str; 4] = ["0", "1", "2", "3"];

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_codes_follow_order<C: Category>() {
        for (i, c) in C::ALL.iter().enumerate() {
            assert_eq!(usize::from(c.code()), i, "{} out of order", c.label());
        }
    }

    fn assert_labels_round_trip<C: Category + PartialEq + std::fmt::Debug>() {
        for &c in C::ALL {
            assert_eq!(C::parse(c.label()).expect("listed label parses"), c);
        }
    }

    #[test]
    fn test_codes_follow_option_order() {
        assert_codes_follow_order::<Sex>();
        assert_codes_follow_order::<ChestPainType>();
        assert_codes_follow_order::<FastingBloodSugar>();
        assert_codes_follow_order::<RestingEcg>();
        assert_codes_follow_order::<ExerciseAngina>();
        assert_codes_follow_order::<StSlope>();
        assert_codes_follow_order::<ThalResult>();
    }

    #[test]
    fn test_every_label_parses_to_its_variant() {
        assert_labels_round_trip::<Sex>();
        assert_labels_round_trip::<ChestPainType>();
        assert_labels_round_trip::<FastingBloodSugar>();
        assert_labels_round_trip::<RestingEcg>();
        assert_labels_round_trip::<ExerciseAngina>();
        assert_labels_round_trip::<StSlope>();
        assert_labels_round_trip::<ThalResult>();
    }

    #[test]
    fn test_documented_codes() {
        assert_eq!(Sex::parse("Male").map(Category::code), Ok(1));
        assert_eq!(Sex::parse("Female").map(Category::code), Ok(0));
        assert_eq!(ChestPainType::parse("Non-anginal Pain").map(Category::code), Ok(2));
        assert_eq!(ChestPainType::parse("Asymptomatic").map(Category::code), Ok(3));
        assert_eq!(FastingBloodSugar::parse("True").map(Category::code), Ok(1));
        assert_eq!(
            RestingEcg::parse("Probable or Definite Left Ventricular Hypertrophy")
                .map(Category::code),
            Ok(2)
        );
        assert_eq!(ExerciseAngina::parse("Yes").map(Category::code), Ok(1));
        assert_eq!(StSlope::parse("Flat").map(Category::code), Ok(1));
        assert_eq!(ThalResult::parse("Reversible Defect").map(Category::code), Ok(2));
    }

    #[test]
    fn test_parse_is_exact() {
        assert!(Sex::parse("male").is_err());
        assert!(Sex::parse(" Male").is_err());
        assert!(FastingBloodSugar::parse("true").is_err());
        assert!(FastingBloodSugar::parse("1").is_err());
        assert!(ExerciseAngina::parse("").is_err());
    }

    #[test]
    fn test_unknown_label_names_field() {
        let err = ChestPainType::parse("Severe Angina").expect_err("not a listed label");
        assert_eq!(
            err,
            EncodingError::UnknownCategory {
                field: Field::ChestPainType,
                value: "Severe Angina".to_string(),
            }
        );
    }

    #[test]
    fn test_options_in_form_order() {
        assert_eq!(
            ChestPainType::options(),
            vec!["Typical Angina", "Atypical Angina", "Non-anginal Pain", "Asymptomatic"]
        );
        assert_eq!(FastingBloodSugar::options(), vec!["False", "True"]);
    }
}
