use serde::{Deserialize, Serialize};

/// Display language for labels, exports, and user-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Am,
}

impl Language {
    pub const fn pick(self, english: &'static str, amharic: &'static str) -> &'static str {
        match self {
            Self::En => english,
            Self::Am => amharic,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Am => "am",
        }
    }
}

/// Closed set of values for one categorical demographic field.
pub trait DemographicValue: Copy + Eq + 'static {
    /// Field name as stored by the record store.
    const FIELD: &'static str;

    fn ordered() -> &'static [Self];
    fn as_str(self) -> &'static str;
    fn label(self, language: Language) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl DemographicValue for Gender {
    const FIELD: &'static str = "gender";

    fn ordered() -> &'static [Self] {
        &[Self::Male, Self::Female]
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    fn label(self, language: Language) -> &'static str {
        match self {
            Self::Male => language.pick("Male", "ወንድ"),
            Self::Female => language.pick("Female", "ሴት"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-30")]
    From18To30,
    #[serde(rename = "31-40")]
    From31To40,
    #[serde(rename = "41-50")]
    From41To50,
    #[serde(rename = "50+")]
    Over50,
}

impl DemographicValue for AgeGroup {
    const FIELD: &'static str = "age";

    fn ordered() -> &'static [Self] {
        &[
            Self::From18To30,
            Self::From31To40,
            Self::From41To50,
            Self::Over50,
        ]
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::From18To30 => "18-30",
            Self::From31To40 => "31-40",
            Self::From41To50 => "41-50",
            Self::Over50 => "50+",
        }
    }

    fn label(self, _language: Language) -> &'static str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Married,
    Single,
    Divorced,
    Widowed,
}

impl DemographicValue for MaritalStatus {
    const FIELD: &'static str = "marital_status";

    fn ordered() -> &'static [Self] {
        &[Self::Married, Self::Single, Self::Divorced, Self::Widowed]
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Married => "married",
            Self::Single => "single",
            Self::Divorced => "divorced",
            Self::Widowed => "widowed",
        }
    }

    fn label(self, language: Language) -> &'static str {
        match self {
            Self::Married => language.pick("Married", "ያገባ"),
            Self::Single => language.pick("Single", "ያላገባ"),
            Self::Divorced => language.pick("Divorced", "የተፋታ"),
            Self::Widowed => language.pick("Widowed", "የሞተበት/ባት"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "unfilled")]
    Unfilled,
    #[serde(rename = "1-8")]
    Grades1To8,
    #[serde(rename = "9-12")]
    Grades9To12,
    #[serde(rename = "certificate")]
    Certificate,
    #[serde(rename = "diploma")]
    Diploma,
    #[serde(rename = "first_degree")]
    FirstDegree,
    #[serde(rename = "second_degree_plus")]
    SecondDegreePlus,
}

impl DemographicValue for EducationLevel {
    const FIELD: &'static str = "education_level";

    fn ordered() -> &'static [Self] {
        &[
            Self::Unfilled,
            Self::Grades1To8,
            Self::Grades9To12,
            Self::Certificate,
            Self::Diploma,
            Self::FirstDegree,
            Self::SecondDegreePlus,
        ]
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Unfilled => "unfilled",
            Self::Grades1To8 => "1-8",
            Self::Grades9To12 => "9-12",
            Self::Certificate => "certificate",
            Self::Diploma => "diploma",
            Self::FirstDegree => "first_degree",
            Self::SecondDegreePlus => "second_degree_plus",
        }
    }

    fn label(self, language: Language) -> &'static str {
        match self {
            Self::Unfilled => language.pick("Unfilled", "ያልተሞላ"),
            Self::Grades1To8 => "1-8",
            Self::Grades9To12 => "9-12",
            Self::Certificate => language.pick("Certificate", "ሰርተፊኬት"),
            Self::Diploma => language.pick("Diploma", "ዲፕሎማ"),
            Self::FirstDegree => language.pick("First Degree", "የመጀመሪያ ዲግሪ"),
            Self::SecondDegreePlus => language.pick("Second Degree+", "ሁለተኛ ዲግሪና ከዚያ በላይ"),
        }
    }
}

/// The four demographic answers captured with every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub gender: Gender,
    pub age: AgeGroup,
    pub marital_status: MaritalStatus,
    pub education_level: EducationLevel,
}

/// Service-quality dimension; each is scored from exactly three items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Tangibility,
    Responsiveness,
    Reliability,
    Assurance,
    Empathy,
}

impl Dimension {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Tangibility,
            Self::Responsiveness,
            Self::Reliability,
            Self::Assurance,
            Self::Empathy,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tangibility => "tangibility",
            Self::Responsiveness => "responsiveness",
            Self::Reliability => "reliability",
            Self::Assurance => "assurance",
            Self::Empathy => "empathy",
        }
    }

    pub const fn label(self, language: Language) -> &'static str {
        match self {
            Self::Tangibility => language.pick("Tangibility", "ተጨባጭነት"),
            Self::Responsiveness => language.pick("Responsiveness", "ፈጣን አገልግሎት"),
            Self::Reliability => language.pick("Reliability", "ተዓማኒነት"),
            Self::Assurance => language.pick("Assurance", "የሰራተኞች ብቃት"),
            Self::Empathy => language.pick("Empathy", "ተሳትፎ"),
        }
    }
}
