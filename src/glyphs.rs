/// Box-drawing character set selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharMode {
    #[default]
    Utf8,
    Ascii,
}

impl CharMode {
    pub fn from_config_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ascii" => CharMode::Ascii,
            _ => CharMode::Utf8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CharMode::Utf8 => "utf8",
            CharMode::Ascii => "ascii",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyphs {
    pub degree: &'static str,
    pub horizontal: &'static str,
    pub vertical: &'static str,
    pub corner_top_left: &'static str,
    pub corner_top_right: &'static str,
    pub corner_bottom_left: &'static str,
    pub corner_bottom_right: &'static str,
    pub tree_mid: &'static str,
    pub tree_end: &'static str,
}

impl Glyphs {
    pub fn utf8() -> Self {
        Glyphs {
            degree: "°C",
            horizontal: "─",
            vertical: "│",
            corner_top_left: "╭",
            corner_top_right: "╮",
            corner_bottom_left: "╰",
            corner_bottom_right: "╯",
            tree_mid: "├",
            tree_end: "└",
        }
    }

    pub fn ascii() -> Self {
        Glyphs {
            degree: " C",
            horizontal: "-",
            vertical: "|",
            corner_top_left: "+",
            corner_top_right: "+",
            corner_bottom_left: "+",
            corner_bottom_right: "+",
            tree_mid: "+",
            tree_end: "+",
        }
    }

    pub fn for_mode(mode: CharMode) -> Self {
        match mode {
            CharMode::Utf8 => Self::utf8(),
            CharMode::Ascii => Self::ascii(),
        }
    }
}

/// The four four-cell segments a process tree line prefix is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeGlyphs {
    /// An ancestor that still has siblings below it.
    pub continuing: String,
    /// An ancestor that was the last of its siblings.
    pub blank: String,
    pub branch_mid: String,
    pub branch_end: String,
}

impl TreeGlyphs {
    pub fn from_glyphs(glyphs: &Glyphs) -> Self {
        let dash = glyphs.horizontal.repeat(2);
        TreeGlyphs {
            continuing: format!("{}   ", glyphs.vertical),
            blank: "    ".to_string(),
            branch_mid: format!("{}{dash} ", glyphs.tree_mid),
            branch_end: format!("{}{dash} ", glyphs.tree_end),
        }
    }
}
