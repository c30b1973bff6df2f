//! Named colors and the depth-indexed palettes used to paint tower blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named color. Hex values follow the usual animation-engine swatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    BlueA,
    BlueB,
    BlueC,
    BlueD,
    BlueE,
    PurpleA,
    PurpleB,
    PurpleC,
    PurpleD,
    PurpleE,
    YellowA,
    YellowB,
    YellowC,
    YellowD,
    YellowE,
    GreenA,
    GreenB,
    GreenC,
    GreenD,
    GreenE,
    Red,
    Gray,
    White,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::BlueA => "#C7E9F1",
            Color::BlueB => "#9CDCEB",
            Color::BlueC => "#58C4DD",
            Color::BlueD => "#29ABCA",
            Color::BlueE => "#236B8E",
            Color::PurpleA => "#CAA3E8",
            Color::PurpleB => "#B189C6",
            Color::PurpleC => "#9A72AC",
            Color::PurpleD => "#715582",
            Color::PurpleE => "#644172",
            Color::YellowA => "#FFF1B6",
            Color::YellowB => "#FFEA94",
            Color::YellowC => "#FFFF00",
            Color::YellowD => "#F4D345",
            Color::YellowE => "#E8C11C",
            Color::GreenA => "#C9E2AE",
            Color::GreenB => "#A6CF8C",
            Color::GreenC => "#83C167",
            Color::GreenD => "#77B05D",
            Color::GreenE => "#699C52",
            Color::Red => "#FC6255",
            Color::Gray => "#888888",
            Color::White => "#FFFFFF",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

/// Marks a block with no children (the empty set).
pub const EMPTY_COLOR: Color = Color::Red;
/// Default block color before layout assigns one.
pub const BLOCK_COLOR: Color = Color::BlueD;
pub const HIGHLIGHT_COLOR: Color = Color::YellowC;
/// Fresh bases added by `successive`.
pub const BASE_COLOR: Color = Color::YellowC;

const OCEAN: [Color; 10] = [
    Color::BlueE,
    Color::BlueD,
    Color::BlueC,
    Color::BlueB,
    Color::BlueA,
    Color::PurpleA,
    Color::PurpleB,
    Color::PurpleC,
    Color::PurpleD,
    Color::PurpleE,
];

const DAWN: [Color; 10] = [
    Color::YellowE,
    Color::YellowD,
    Color::YellowC,
    Color::YellowB,
    Color::YellowA,
    Color::BlueA,
    Color::BlueB,
    Color::BlueC,
    Color::BlueD,
    Color::BlueE,
];

const MEADOW: [Color; 10] = [
    Color::YellowE,
    Color::YellowD,
    Color::YellowC,
    Color::YellowB,
    Color::YellowA,
    Color::GreenA,
    Color::GreenB,
    Color::GreenC,
    Color::GreenD,
    Color::GreenE,
];

/// Depth-indexed color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Ocean,
    Dawn,
    Meadow,
}

impl Palette {
    pub fn colors(self) -> &'static [Color] {
        match self {
            Palette::Ocean => &OCEAN,
            Palette::Dawn => &DAWN,
            Palette::Meadow => &MEADOW,
        }
    }

    /// Color for a nesting level. Levels past the table saturate on the last entry.
    pub fn color_for_level(self, level: usize) -> Color {
        let colors = self.colors();
        colors[level.min(colors.len() - 1)]
    }
}
