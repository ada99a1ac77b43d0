use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Dimension, Language};

/// The fifteen fixed questionnaire items. Each belongs to exactly one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKey {
    #[serde(rename = "q1_facilities")]
    Facilities,
    #[serde(rename = "q2_equipment")]
    Equipment,
    #[serde(rename = "q3_materials")]
    Materials,
    #[serde(rename = "q4_prompt_service")]
    PromptService,
    #[serde(rename = "q5_willingness")]
    Willingness,
    #[serde(rename = "q6_availability")]
    Availability,
    #[serde(rename = "q7_promised_time")]
    PromisedTime,
    #[serde(rename = "q8_problem_solving")]
    ProblemSolving,
    #[serde(rename = "q9_dependable")]
    Dependable,
    #[serde(rename = "q10_competence")]
    Competence,
    #[serde(rename = "q11_courtesy")]
    Courtesy,
    #[serde(rename = "q12_confidence")]
    Confidence,
    #[serde(rename = "q13_individual_attention")]
    IndividualAttention,
    #[serde(rename = "q14_understanding")]
    Understanding,
    #[serde(rename = "q15_best_interests")]
    BestInterests,
}

pub const ITEM_COUNT: usize = 15;
pub const ITEMS_PER_DIMENSION: usize = 3;

impl ItemKey {
    pub const fn ordered() -> [Self; ITEM_COUNT] {
        [
            Self::Facilities,
            Self::Equipment,
            Self::Materials,
            Self::PromptService,
            Self::Willingness,
            Self::Availability,
            Self::PromisedTime,
            Self::ProblemSolving,
            Self::Dependable,
            Self::Competence,
            Self::Courtesy,
            Self::Confidence,
            Self::IndividualAttention,
            Self::Understanding,
            Self::BestInterests,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            Self::Facilities => "q1_facilities",
            Self::Equipment => "q2_equipment",
            Self::Materials => "q3_materials",
            Self::PromptService => "q4_prompt_service",
            Self::Willingness => "q5_willingness",
            Self::Availability => "q6_availability",
            Self::PromisedTime => "q7_promised_time",
            Self::ProblemSolving => "q8_problem_solving",
            Self::Dependable => "q9_dependable",
            Self::Competence => "q10_competence",
            Self::Courtesy => "q11_courtesy",
            Self::Confidence => "q12_confidence",
            Self::IndividualAttention => "q13_individual_attention",
            Self::Understanding => "q14_understanding",
            Self::BestInterests => "q15_best_interests",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|item| item.id() == id)
    }

    /// 1-based position in the questionnaire.
    pub fn order(self) -> u16 {
        Self::ordered()
            .iter()
            .position(|item| *item == self)
            .map(|index| index as u16 + 1)
            .unwrap_or_default()
    }

    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Facilities | Self::Equipment | Self::Materials => Dimension::Tangibility,
            Self::PromptService | Self::Willingness | Self::Availability => {
                Dimension::Responsiveness
            }
            Self::PromisedTime | Self::ProblemSolving | Self::Dependable => Dimension::Reliability,
            Self::Competence | Self::Courtesy | Self::Confidence => Dimension::Assurance,
            Self::IndividualAttention | Self::Understanding | Self::BestInterests => {
                Dimension::Empathy
            }
        }
    }

    pub const fn text(self, language: Language) -> &'static str {
        match self {
            Self::Facilities => language.pick(
                "The office environment is clean and safe",
                "የቢሮው አካባቢ ንጹህና ደህንነቱ የተጠበቀ ነው",
            ),
            Self::Equipment => language.pick(
                "The office has modern equipment and technology",
                "ቢሮው ዘመናዊ መሳሪያዎችና ቴክኖሎጂ አለው",
            ),
            Self::Materials => language.pick(
                "Information materials are clear and accessible",
                "የመረጃ ቁሳቁሶች ግልጽና ተደራሽ ናቸው",
            ),
            Self::PromptService => {
                language.pick("Staff provide prompt service", "ሰራተኞች ፈጣን አገልግሎት ይሰጣሉ")
            }
            Self::Willingness => language.pick("Staff are willing to help", "ሰራተኞች ለመርዳት ፈቃደኛ ናቸው"),
            Self::Availability => language.pick("Staff are always available", "ሰራተኞች ሁልጊዜ ይገኛሉ"),
            Self::PromisedTime => language.pick(
                "Service is delivered at the promised time",
                "አገልግሎቱ በተገለጸው ጊዜ ይሰጣል",
            ),
            Self::ProblemSolving => {
                language.pick("Problems are solved appropriately", "ችግሮች በተገቢው መንገድ ይፈታሉ")
            }
            Self::Dependable => language.pick("The service is dependable", "አገልግሎቱ ተዓማኒ ነው"),
            Self::Competence => language.pick(
                "Staff have adequate knowledge and skills",
                "ሰራተኞች በቂ እውቀትና ክህሎት አላቸው",
            ),
            Self::Courtesy => {
                language.pick("Staff are courteous and respectful", "ሰራተኞች ትሁትና አክባሪ ናቸው")
            }
            Self::Confidence => {
                language.pick("I have confidence in the service", "በአገልግሎቱ ላይ መተማመን አለኝ")
            }
            Self::IndividualAttention => language.pick(
                "Staff give individual attention to each customer",
                "ሰራተኞች ለእያንዳንዱ ደንበኛ ልዩ ትኩረት ይሰጣሉ",
            ),
            Self::Understanding => {
                language.pick("Staff understand customer needs", "ሰራተኞች የደንበኞችን ፍላጎት ይረዳሉ")
            }
            Self::BestInterests => language.pick(
                "Staff act in customers' best interests",
                "ሰራተኞች የደንበኞችን ጥቅም ያስቀድማሉ",
            ),
        }
    }
}

impl Dimension {
    /// The three items scored under this dimension, in questionnaire order.
    pub fn items(self) -> [ItemKey; ITEMS_PER_DIMENSION] {
        let mut items = [ItemKey::Facilities; ITEMS_PER_DIMENSION];
        for (slot, item) in ItemKey::ordered()
            .into_iter()
            .filter(|item| item.dimension() == self)
            .enumerate()
        {
            items[slot] = item;
        }
        items
    }
}

/// Likert ratings keyed by item. Complete sets are built through intake; sets
/// read back from the record store may be partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemScores(BTreeMap<ItemKey, u8>);

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const NEUTRAL_SCORE: u8 = 3;

impl ItemScores {
    pub(crate) fn from_validated(scores: BTreeMap<ItemKey, u8>) -> Self {
        Self(scores)
    }

    /// Keep only in-range ratings for known items; anything else reads as unanswered.
    pub fn from_recorded<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (ItemKey, i64)>,
    {
        Self(
            scores
                .into_iter()
                .filter(|(_, value)| (MIN_SCORE as i64..=MAX_SCORE as i64).contains(value))
                .map(|(item, value)| (item, value as u8))
                .collect(),
        )
    }

    pub fn get(&self, item: ItemKey) -> Option<u8> {
        self.0.get(&item).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKey, u8)> + '_ {
        self.0.iter().map(|(item, score)| (*item, *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == ITEM_COUNT
    }

    /// Scores nested by dimension, the shape used on the wire and in the record store.
    pub fn by_dimension(&self) -> BTreeMap<Dimension, BTreeMap<ItemKey, u8>> {
        let mut nested: BTreeMap<Dimension, BTreeMap<ItemKey, u8>> = BTreeMap::new();
        for (item, score) in self.iter() {
            nested
                .entry(item.dimension())
                .or_default()
                .insert(item, score);
        }
        nested
    }
}

/// Identifier of a catalog question. The fixed items use their item ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

/// Administrator-managed questionnaire entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub dimension: Dimension,
    pub text_amharic: String,
    pub text_english: String,
    pub is_active: bool,
    pub order_number: u16,
}

impl Question {
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::En => &self.text_english,
            Language::Am => &self.text_amharic,
        }
    }
}

/// Fields an administrator may set when adding or editing a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub dimension: Dimension,
    pub text_amharic: String,
    pub text_english: String,
    pub order_number: u16,
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<(), QuestionDraftError> {
        if self.text_english.trim().is_empty() {
            return Err(QuestionDraftError::MissingText("English"));
        }
        if self.text_amharic.trim().is_empty() {
            return Err(QuestionDraftError::MissingText("Amharic"));
        }
        if self.order_number == 0 {
            return Err(QuestionDraftError::InvalidOrder);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionDraftError {
    #[error("question text ({0}) must not be empty")]
    MissingText(&'static str),
    #[error("question order must start at 1")]
    InvalidOrder,
}

/// The questionnaire as first published: fifteen active questions.
pub fn standard_catalog() -> Vec<Question> {
    ItemKey::ordered()
        .into_iter()
        .map(|item| Question {
            id: QuestionId(item.id().to_string()),
            dimension: item.dimension(),
            text_amharic: item.text(Language::Am).to_string(),
            text_english: item.text(Language::En).to_string(),
            is_active: true,
            order_number: item.order(),
        })
        .collect()
}
