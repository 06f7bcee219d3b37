use serde::{Deserialize, Serialize};

/// Gaming platforms the recognition prompt may report (PriceCharting naming).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "NES")]
    Nes,
    #[serde(rename = "SNES")]
    Snes,
    #[serde(rename = "N64")]
    N64,
    #[serde(rename = "GameCube")]
    GameCube,
    #[serde(rename = "Wii")]
    Wii,
    #[serde(rename = "Wii U")]
    WiiU,
    #[serde(rename = "Switch")]
    Switch,
    #[serde(rename = "GB")]
    GameBoy,
    #[serde(rename = "GBC")]
    GameBoyColor,
    #[serde(rename = "GBA")]
    GameBoyAdvance,
    #[serde(rename = "DS")]
    Ds,
    #[serde(rename = "3DS")]
    ThreeDs,
    #[serde(rename = "Virtual Boy")]
    VirtualBoy,
    #[serde(rename = "PS1")]
    Ps1,
    #[serde(rename = "PS2")]
    Ps2,
    #[serde(rename = "PS3")]
    Ps3,
    #[serde(rename = "PS4")]
    Ps4,
    #[serde(rename = "PS5")]
    Ps5,
    #[serde(rename = "PSP")]
    Psp,
    #[serde(rename = "Vita")]
    Vita,
    #[serde(rename = "Xbox")]
    Xbox,
    #[serde(rename = "Xbox 360")]
    Xbox360,
    #[serde(rename = "Xbox One")]
    XboxOne,
    #[serde(rename = "Xbox Series")]
    XboxSeries,
    #[serde(rename = "Master System")]
    MasterSystem,
    #[serde(rename = "Genesis")]
    Genesis,
    #[serde(rename = "Sega CD")]
    SegaCd,
    #[serde(rename = "32X")]
    Sega32X,
    #[serde(rename = "Saturn")]
    Saturn,
    #[serde(rename = "Dreamcast")]
    Dreamcast,
    #[serde(rename = "Game Gear")]
    GameGear,
    #[serde(rename = "Atari 2600")]
    Atari2600,
    #[serde(rename = "Atari 5200")]
    Atari5200,
    #[serde(rename = "Atari 7800")]
    Atari7800,
    #[serde(rename = "Jaguar")]
    Jaguar,
    #[serde(rename = "Lynx")]
    Lynx,
    #[serde(rename = "TurboGrafx-16")]
    TurboGrafx16,
    #[serde(rename = "Neo Geo")]
    NeoGeo,
    #[serde(rename = "3DO")]
    ThreeDo,
    #[serde(rename = "CD-i")]
    CdI,
    #[default]
    #[serde(rename = "Other", other)]
    Other,
}

impl Platform {
    pub const ALL: [Platform; 41] = [
        Platform::Nes,
        Platform::Snes,
        Platform::N64,
        Platform::GameCube,
        Platform::Wii,
        Platform::WiiU,
        Platform::Switch,
        Platform::GameBoy,
        Platform::GameBoyColor,
        Platform::GameBoyAdvance,
        Platform::Ds,
        Platform::ThreeDs,
        Platform::VirtualBoy,
        Platform::Ps1,
        Platform::Ps2,
        Platform::Ps3,
        Platform::Ps4,
        Platform::Ps5,
        Platform::Psp,
        Platform::Vita,
        Platform::Xbox,
        Platform::Xbox360,
        Platform::XboxOne,
        Platform::XboxSeries,
        Platform::MasterSystem,
        Platform::Genesis,
        Platform::SegaCd,
        Platform::Sega32X,
        Platform::Saturn,
        Platform::Dreamcast,
        Platform::GameGear,
        Platform::Atari2600,
        Platform::Atari5200,
        Platform::Atari7800,
        Platform::Jaguar,
        Platform::Lynx,
        Platform::TurboGrafx16,
        Platform::NeoGeo,
        Platform::ThreeDo,
        Platform::CdI,
        Platform::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Nes => "NES",
            Platform::Snes => "SNES",
            Platform::N64 => "N64",
            Platform::GameCube => "GameCube",
            Platform::Wii => "Wii",
            Platform::WiiU => "Wii U",
            Platform::Switch => "Switch",
            Platform::GameBoy => "GB",
            Platform::GameBoyColor => "GBC",
            Platform::GameBoyAdvance => "GBA",
            Platform::Ds => "DS",
            Platform::ThreeDs => "3DS",
            Platform::VirtualBoy => "Virtual Boy",
            Platform::Ps1 => "PS1",
            Platform::Ps2 => "PS2",
            Platform::Ps3 => "PS3",
            Platform::Ps4 => "PS4",
            Platform::Ps5 => "PS5",
            Platform::Psp => "PSP",
            Platform::Vita => "Vita",
            Platform::Xbox => "Xbox",
            Platform::Xbox360 => "Xbox 360",
            Platform::XboxOne => "Xbox One",
            Platform::XboxSeries => "Xbox Series",
            Platform::MasterSystem => "Master System",
            Platform::Genesis => "Genesis",
            Platform::SegaCd => "Sega CD",
            Platform::Sega32X => "32X",
            Platform::Saturn => "Saturn",
            Platform::Dreamcast => "Dreamcast",
            Platform::GameGear => "Game Gear",
            Platform::Atari2600 => "Atari 2600",
            Platform::Atari5200 => "Atari 5200",
            Platform::Atari7800 => "Atari 7800",
            Platform::Jaguar => "Jaguar",
            Platform::Lynx => "Lynx",
            Platform::TurboGrafx16 => "TurboGrafx-16",
            Platform::NeoGeo => "Neo Geo",
            Platform::ThreeDo => "3DO",
            Platform::CdI => "CD-i",
            Platform::Other => "Other",
        }
    }

    /// Case-insensitive label lookup; anything unrecognised is `Other`.
    pub fn from_label(raw: &str) -> Self {
        let needle = raw.trim();
        Platform::ALL
            .iter()
            .copied()
            .find(|platform| platform.label().eq_ignore_ascii_case(needle))
            .unwrap_or(Platform::Other)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    #[default]
    Game,
    Console,
    Accessory,
}

impl ItemCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Console => "console",
            Self::Accessory => "accessory",
        }
    }

    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "console" => Self::Console,
            "accessory" => Self::Accessory,
            _ => Self::Game,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Loose,
    /// Complete in box.
    Cib,
    Sealed,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loose => "loose",
            Self::Cib => "cib",
            Self::Sealed => "sealed",
        }
    }

    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cib" | "complete" | "complete-in-box" => Self::Cib,
            "sealed" | "new" => Self::Sealed,
            _ => Self::Loose,
        }
    }
}

/// Shipping weight classes used by the shipping cost table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeightClass {
    #[serde(rename = "4oz")]
    Oz4,
    #[default]
    #[serde(rename = "8oz")]
    Oz8,
    #[serde(rename = "12oz")]
    Oz12,
    #[serde(rename = "16oz")]
    Oz16,
    #[serde(rename = "24oz")]
    Oz24,
    #[serde(rename = "32oz")]
    Oz32,
    #[serde(rename = "48oz")]
    Oz48,
}

impl WeightClass {
    pub const ALL: [WeightClass; 7] = [
        WeightClass::Oz4,
        WeightClass::Oz8,
        WeightClass::Oz12,
        WeightClass::Oz16,
        WeightClass::Oz24,
        WeightClass::Oz32,
        WeightClass::Oz48,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Oz4 => "4oz",
            Self::Oz8 => "8oz",
            Self::Oz12 => "12oz",
            Self::Oz16 => "16oz",
            Self::Oz24 => "24oz",
            Self::Oz32 => "32oz",
            Self::Oz48 => "48oz",
        }
    }

    /// Unknown labels fall back to the default 8oz class.
    pub fn from_label(raw: &str) -> Self {
        let needle = raw.trim();
        WeightClass::ALL
            .iter()
            .copied()
            .find(|weight| weight.label().eq_ignore_ascii_case(needle))
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Condition-specific price estimates in dollars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimates {
    pub loose: f64,
    pub cib: f64,
    pub sealed: f64,
}

impl PriceEstimates {
    /// The price matching `condition`: sealed, complete-in-box, otherwise loose.
    pub fn for_condition(&self, condition: Condition) -> f64 {
        match condition {
            Condition::Sealed => self.sealed,
            Condition::Cib => self.cib,
            Condition::Loose => self.loose,
        }
    }
}

/// An item detected in a lot photo, reviewed before the lot is bought.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub category: ItemCategory,
    pub condition: Condition,
    #[serde(default)]
    pub variant: String,
    pub prices: PriceEstimates,
    pub weight: WeightClass,
    pub confidence: Confidence,
    #[serde(default)]
    pub notes: String,
}

impl CandidateItem {
    /// Condition-selected value in dollars, clamped to be non-negative.
    pub fn estimated_value(&self) -> f64 {
        super::money::non_negative(self.prices.for_condition(self.condition))
    }
}

/// Partial edit applied to a candidate during lot review.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub platform: Option<Platform>,
    pub category: Option<ItemCategory>,
    pub condition: Option<Condition>,
    pub prices: Option<PriceEstimates>,
    pub weight: Option<WeightClass>,
    pub notes: Option<String>,
}

impl CandidateUpdate {
    pub fn apply(self, item: &mut CandidateItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(platform) = self.platform {
            item.platform = platform;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(condition) = self.condition {
            item.condition = condition;
        }
        if let Some(prices) = self.prices {
            item.prices = prices;
        }
        if let Some(weight) = self.weight {
            item.weight = weight;
        }
        if let Some(notes) = self.notes {
            item.notes = notes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(condition: Condition) -> CandidateItem {
        CandidateItem {
            id: "c-1".into(),
            name: "Super Mario 64".into(),
            platform: Platform::N64,
            category: ItemCategory::Game,
            condition,
            variant: String::new(),
            prices: PriceEstimates {
                loose: 35.0,
                cib: 80.0,
                sealed: 400.0,
            },
            weight: WeightClass::Oz4,
            confidence: Confidence::High,
            notes: String::new(),
        }
    }

    #[test]
    fn selects_price_by_condition() {
        assert_eq!(candidate(Condition::Loose).estimated_value(), 35.0);
        assert_eq!(candidate(Condition::Cib).estimated_value(), 80.0);
        assert_eq!(candidate(Condition::Sealed).estimated_value(), 400.0);
    }

    #[test]
    fn unknown_labels_fall_back() {
        assert_eq!(Platform::from_label("xbox 360"), Platform::Xbox360);
        assert_eq!(Platform::from_label("Pippin"), Platform::Other);
        assert_eq!(WeightClass::from_label("100oz"), WeightClass::Oz8);
        assert_eq!(Condition::from_label("mint-ish"), Condition::Loose);
        assert_eq!(ItemCategory::from_label("Console"), ItemCategory::Console);
    }

    #[test]
    fn deserializes_unknown_platform_as_other() {
        let platform: Platform = serde_json::from_str("\"Pippin\"").unwrap();
        assert_eq!(platform, Platform::Other);
        let platform: Platform = serde_json::from_str("\"Wii U\"").unwrap();
        assert_eq!(platform, Platform::WiiU);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut item = candidate(Condition::Loose);
        CandidateUpdate {
            condition: Some(Condition::Cib),
            ..Default::default()
        }
        .apply(&mut item);
        assert_eq!(item.condition, Condition::Cib);
        assert_eq!(item.name, "Super Mario 64");
    }
}
