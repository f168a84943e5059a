//! User display preferences.
//!
//! One row per user, created lazily on the first write. Reads synthesize the
//! defaults when no row exists.

use serde::{Deserialize, Serialize};

/// Emoji family used for mood badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiSet {
    #[default]
    Default,
    Nature,
    Expressive,
    Minimal,
}

impl EmojiSet {
    pub const ALL: [Self; 4] = [Self::Default, Self::Nature, Self::Expressive, Self::Minimal];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Nature => "nature",
            Self::Expressive => "expressive",
            Self::Minimal => "minimal",
        }
    }

    #[must_use]
    pub fn from_db(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .unwrap_or_default()
    }
}

/// Color palette for mood accents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPalette {
    #[default]
    Vibrant,
    Pastel,
    Mono,
}

impl ColorPalette {
    pub const ALL: [Self; 3] = [Self::Vibrant, Self::Pastel, Self::Mono];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vibrant => "vibrant",
            Self::Pastel => "pastel",
            Self::Mono => "mono",
        }
    }

    #[must_use]
    pub fn from_db(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .unwrap_or_default()
    }
}

/// How strongly moods are visualized on cards and the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationIntensity {
    Full,
    #[default]
    Balanced,
    Subtle,
    Off,
}

impl VisualizationIntensity {
    pub const ALL: [Self; 4] = [Self::Full, Self::Balanced, Self::Subtle, Self::Off];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Balanced => "balanced",
            Self::Subtle => "subtle",
            Self::Off => "off",
        }
    }

    #[must_use]
    pub fn from_db(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .unwrap_or_default()
    }
}

/// Stored (or synthesized) preferences for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub user_id: String,
    pub emoji_set: EmojiSet,
    pub color_palette: ColorPalette,
    pub visualization_intensity: VisualizationIntensity,

    /// Absent on synthesized defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl UserPreferences {
    /// Defaults for a user without a stored row.
    #[must_use]
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            emoji_set: EmojiSet::default(),
            color_palette: ColorPalette::default(),
            visualization_intensity: VisualizationIntensity::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Merge a patch over these preferences, keeping unspecified fields.
    #[must_use]
    pub fn apply(&self, patch: &PreferencesPatch) -> Self {
        Self {
            user_id: self.user_id.clone(),
            emoji_set: patch.emoji_set.unwrap_or(self.emoji_set),
            color_palette: patch.color_palette.unwrap_or(self.color_palette),
            visualization_intensity: patch
                .visualization_intensity
                .unwrap_or(self.visualization_intensity),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial preferences write; `null` and absent both mean "keep".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_set: Option<EmojiSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette: Option<ColorPalette>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_intensity: Option<VisualizationIntensity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = UserPreferences::defaults_for("u1");
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["emojiSet"], "default");
        assert_eq!(json["colorPalette"], "vibrant");
        assert_eq!(json["visualizationIntensity"], "balanced");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_apply_keeps_unspecified_fields() {
        let base = UserPreferences {
            emoji_set: EmojiSet::Nature,
            ..UserPreferences::defaults_for("u1")
        };
        let merged = base.apply(&PreferencesPatch {
            color_palette: Some(ColorPalette::Mono),
            ..PreferencesPatch::default()
        });
        assert_eq!(merged.emoji_set, EmojiSet::Nature);
        assert_eq!(merged.color_palette, ColorPalette::Mono);
        assert_eq!(merged.visualization_intensity, VisualizationIntensity::Balanced);
    }

    #[test]
    fn test_patch_treats_null_as_unspecified() {
        let patch: PreferencesPatch =
            serde_json::from_str(r#"{"emojiSet":null,"colorPalette":"pastel"}"#).unwrap();
        assert_eq!(patch.emoji_set, None);
        assert_eq!(patch.color_palette, Some(ColorPalette::Pastel));
    }
}
