//! # 风格设置模块
//!
//! ## 设计思路
//!
//! `StyleSettings` 是一个不可变的值对象：用户每次修改选项时整体替换，而不是原地修改字段。
//! 这样“设置是否变化”只需一次 `==` 比较，提示词重新生成的触发判断也随之变得简单。
//!
//! ## 实现思路
//!
//! - 三个枚举都提供 `as_str` / `FromStr`，字符串形式稳定，供 CLI 与配置文件使用。
//! - `description()` 给出写入提示词的人类可读短语。
//! - 比例枚举额外提供 `ratio()`，裁剪状态机据此锁定宽高比。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 选项字符串无法识别。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("未知{kind}：{value}（可选：{choices}）")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
    pub choices: String,
}

fn unknown_option(kind: &'static str, value: &str, choices: &[&'static str]) -> UnknownOption {
    UnknownOption {
        kind,
        value: value.trim().to_string(),
        choices: choices.join(" / "),
    }
}

/// 目标画幅比例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [Self::Square, Self::Portrait, Self::Landscape];

    /// 宽 / 高。
    pub fn ratio(self) -> f64 {
        match self {
            Self::Square => 1.0,
            Self::Portrait => 3.0 / 4.0,
            Self::Landscape => 16.0 / 9.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "16:9",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Square => "a square 1:1 frame",
            Self::Portrait => "a vertical 3:4 portrait frame",
            Self::Landscape => "a wide 16:9 landscape frame",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == normalized)
            .ok_or_else(|| {
                unknown_option("画幅比例", value, &Self::ALL.map(Self::as_str))
            })
    }
}

/// 布光风格。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightingStyle {
    #[default]
    StudioSoftbox,
    NaturalDaylight,
    GoldenHour,
    DramaticLowKey,
    HighKey,
    NeonAccent,
}

impl LightingStyle {
    pub const ALL: [LightingStyle; 6] = [
        Self::StudioSoftbox,
        Self::NaturalDaylight,
        Self::GoldenHour,
        Self::DramaticLowKey,
        Self::HighKey,
        Self::NeonAccent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StudioSoftbox => "studio-softbox",
            Self::NaturalDaylight => "natural-daylight",
            Self::GoldenHour => "golden-hour",
            Self::DramaticLowKey => "dramatic-low-key",
            Self::HighKey => "high-key",
            Self::NeonAccent => "neon-accent",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::StudioSoftbox => "soft, even studio softbox lighting with gentle shadows",
            Self::NaturalDaylight => "bright natural daylight from a large window",
            Self::GoldenHour => "warm golden-hour sunlight with long soft shadows",
            Self::DramaticLowKey => "dramatic low-key lighting with deep shadows and a single hard key light",
            Self::HighKey => "clean high-key lighting on a bright, nearly shadowless background",
            Self::NeonAccent => "moody lighting with colourful neon accent rims",
        }
    }
}

impl FromStr for LightingStyle {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| unknown_option("布光风格", value, &Self::ALL.map(Self::as_str)))
    }
}

/// 机位视角。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraPerspective {
    #[default]
    EyeLevel,
    HighAngle,
    LowAngle,
    TopDown,
    CloseUp,
    ThreeQuarter,
}

impl CameraPerspective {
    pub const ALL: [CameraPerspective; 6] = [
        Self::EyeLevel,
        Self::HighAngle,
        Self::LowAngle,
        Self::TopDown,
        Self::CloseUp,
        Self::ThreeQuarter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EyeLevel => "eye-level",
            Self::HighAngle => "high-angle",
            Self::LowAngle => "low-angle",
            Self::TopDown => "top-down",
            Self::CloseUp => "close-up",
            Self::ThreeQuarter => "three-quarter",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::EyeLevel => "a straight-on eye-level shot",
            Self::HighAngle => "a high-angle shot looking down at the product",
            Self::LowAngle => "a low-angle hero shot looking up at the product",
            Self::TopDown => "a top-down flat-lay shot",
            Self::CloseUp => "a tight close-up macro shot showing material detail",
            Self::ThreeQuarter => "a three-quarter view showing the front and one side",
        }
    }
}

impl FromStr for CameraPerspective {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|perspective| perspective.as_str() == normalized)
            .ok_or_else(|| unknown_option("机位视角", value, &Self::ALL.map(Self::as_str)))
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(AspectRatio, LightingStyle, CameraPerspective);

/// 用户当前选择的整组风格设置。
///
/// 值语义：通过 `with_*` 生成新值后整体替换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StyleSettings {
    pub aspect_ratio: AspectRatio,
    pub lighting: LightingStyle,
    pub perspective: CameraPerspective,
}

impl StyleSettings {
    pub fn new(
        aspect_ratio: AspectRatio,
        lighting: LightingStyle,
        perspective: CameraPerspective,
    ) -> Self {
        Self {
            aspect_ratio,
            lighting,
            perspective,
        }
    }

    pub fn with_aspect_ratio(self, aspect_ratio: AspectRatio) -> Self {
        Self { aspect_ratio, ..self }
    }

    pub fn with_lighting(self, lighting: LightingStyle) -> Self {
        Self { lighting, ..self }
    }

    pub fn with_perspective(self, perspective: CameraPerspective) -> Self {
        Self { perspective, ..self }
    }
}
