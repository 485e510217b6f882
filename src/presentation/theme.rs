//! Theme catalogue
//!
//! Each theme maps to a fixed palette. Palettes are static data; the
//! presentation controller turns them into CSS custom properties and
//! inline styles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SYSTEM_SANS: &str = r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif"#;
const SYSTEM_SANS_WIDE: &str =
    r#"-apple-system, BlinkMacSystemFont, "Segoe UI", "Roboto", "Helvetica Neue", Arial, sans-serif"#;
const CODE_MONO: &str = r#""Consolas", "Monaco", "Courier New", monospace"#;
const CODE_MONO_WIDE: &str = r#""Consolas", "SF Mono", "Monaco", "Menlo", monospace"#;
const SERIF_BOOK: &str = r#""Georgia", "Times New Roman", "Book Antiqua", serif"#;

/// Named presentation theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Sepia,
    Nord,
    Dracula,
    SolarizedLight,
    Github,
    Monokai,
    Literary,
    Terminal,
    Oceanic,
    Newspaper,
    Cyberpunk,
    Forest,
    Minimal,
    Academic,
}

/// Theme handed to diagram engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagramTheme {
    #[default]
    Default,
    Dark,
}

impl DiagramTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramTheme::Default => "default",
            DiagramTheme::Dark => "dark",
        }
    }
}

/// Colours and typography of one theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub body: &'static str,
    pub content: &'static str,
    pub text: &'static str,
    pub heading: &'static str,
    pub link: &'static str,
    pub code_bg: &'static str,
    pub code_text: &'static str,
    pub quote_bg: &'static str,
    pub quote_border: &'static str,
    pub quote_text: &'static str,
    pub font_family: &'static str,
    pub code_font_family: &'static str,
    /// Base font size in CSS pixels, before font scaling
    pub font_size_px: f32,
    pub line_height: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 16] = [
        Theme::Dark,
        Theme::Light,
        Theme::Sepia,
        Theme::Nord,
        Theme::Dracula,
        Theme::SolarizedLight,
        Theme::Github,
        Theme::Monokai,
        Theme::Literary,
        Theme::Terminal,
        Theme::Oceanic,
        Theme::Newspaper,
        Theme::Cyberpunk,
        Theme::Forest,
        Theme::Minimal,
        Theme::Academic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Sepia => "sepia",
            Theme::Nord => "nord",
            Theme::Dracula => "dracula",
            Theme::SolarizedLight => "solarized-light",
            Theme::Github => "github",
            Theme::Monokai => "monokai",
            Theme::Literary => "literary",
            Theme::Terminal => "terminal",
            Theme::Oceanic => "oceanic",
            Theme::Newspaper => "newspaper",
            Theme::Cyberpunk => "cyberpunk",
            Theme::Forest => "forest",
            Theme::Minimal => "minimal",
            Theme::Academic => "academic",
        }
    }

    /// Dark themes switch diagram engines to their dark variant
    pub fn is_dark(&self) -> bool {
        matches!(
            self,
            Theme::Dark
                | Theme::Nord
                | Theme::Dracula
                | Theme::Monokai
                | Theme::Terminal
                | Theme::Oceanic
                | Theme::Cyberpunk
                | Theme::Forest
        )
    }

    pub fn diagram_theme(&self) -> DiagramTheme {
        if self.is_dark() {
            DiagramTheme::Dark
        } else {
            DiagramTheme::Default
        }
    }

    pub fn palette(&self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
            Theme::Sepia => &SEPIA,
            Theme::Nord => &NORD,
            Theme::Dracula => &DRACULA,
            Theme::SolarizedLight => &SOLARIZED_LIGHT,
            Theme::Github => &GITHUB,
            Theme::Monokai => &MONOKAI,
            Theme::Literary => &LITERARY,
            Theme::Terminal => &TERMINAL,
            Theme::Oceanic => &OCEANIC,
            Theme::Newspaper => &NEWSPAPER,
            Theme::Cyberpunk => &CYBERPUNK,
            Theme::Forest => &FOREST,
            Theme::Minimal => &MINIMAL,
            Theme::Academic => &ACADEMIC,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Theme::ALL
            .iter()
            .copied()
            .find(|theme| theme.name() == wanted)
            .ok_or_else(|| format!("unknown theme '{}'", s))
    }
}

static DARK: Palette = Palette {
    body: "#1e1e1e",
    content: "#1e1e1e",
    text: "#d4d4d4",
    heading: "#4ec9b0",
    link: "#4fc3f7",
    code_bg: "#2d2d30",
    code_text: "#ce9178",
    quote_bg: "rgba(255, 255, 255, 0.03)",
    quote_border: "#4fc3f7",
    quote_text: "#b0b0b0",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static LIGHT: Palette = Palette {
    body: "#ffffff",
    content: "#ffffff",
    text: "#24292e",
    heading: "#0366d6",
    link: "#0366d6",
    code_bg: "#f6f8fa",
    code_text: "#d73a49",
    quote_bg: "#f6f8fa",
    quote_border: "#0366d6",
    quote_text: "#6a737d",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static SEPIA: Palette = Palette {
    body: "#f4ecd8",
    content: "#f4ecd8",
    text: "#5b4636",
    heading: "#8b6914",
    link: "#aa6708",
    code_bg: "#e8dcc0",
    code_text: "#aa6708",
    quote_bg: "#e8dcc0",
    quote_border: "#aa6708",
    quote_text: "#7d6c56",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static NORD: Palette = Palette {
    body: "#2e3440",
    content: "#2e3440",
    text: "#d8dee9",
    heading: "#88c0d0",
    link: "#81a1c1",
    code_bg: "#3b4252",
    code_text: "#a3be8c",
    quote_bg: "#3b4252",
    quote_border: "#88c0d0",
    quote_text: "#d8dee9",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static DRACULA: Palette = Palette {
    body: "#282a36",
    content: "#282a36",
    text: "#f8f8f2",
    heading: "#ff79c6",
    link: "#8be9fd",
    code_bg: "#44475a",
    code_text: "#50fa7b",
    quote_bg: "#44475a",
    quote_border: "#bd93f9",
    quote_text: "#f8f8f2",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static SOLARIZED_LIGHT: Palette = Palette {
    body: "#fdf6e3",
    content: "#fdf6e3",
    text: "#657b83",
    heading: "#268bd2",
    link: "#2aa198",
    code_bg: "#eee8d5",
    code_text: "#cb4b16",
    quote_bg: "#eee8d5",
    quote_border: "#268bd2",
    quote_text: "#93a1a1",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static GITHUB: Palette = Palette {
    body: "#ffffff",
    content: "#ffffff",
    text: "#24292f",
    heading: "#1f2328",
    link: "#0969da",
    code_bg: "#f6f8fa",
    code_text: "#cf222e",
    quote_bg: "#f6f8fa",
    quote_border: "#d0d7de",
    quote_text: "#57606a",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static MONOKAI: Palette = Palette {
    body: "#272822",
    content: "#272822",
    text: "#f8f8f2",
    heading: "#f92672",
    link: "#66d9ef",
    code_bg: "#3e3d32",
    code_text: "#a6e22e",
    quote_bg: "#3e3d32",
    quote_border: "#f92672",
    quote_text: "#f8f8f2",
    font_family: SYSTEM_SANS,
    code_font_family: CODE_MONO,
    font_size_px: 16.0,
    line_height: "1.6",
};

static LITERARY: Palette = Palette {
    body: "#f9f7f4",
    content: "#f9f7f4",
    text: "#2c2416",
    heading: "#8b4513",
    link: "#c65d2b",
    code_bg: "#f0ebe3",
    code_text: "#8b4513",
    quote_bg: "#f0ebe3",
    quote_border: "#c65d2b",
    quote_text: "#5d4e37",
    font_family: r#""Times New Roman", "Georgia", "Garamond", "Book Antiqua", serif"#,
    code_font_family: r#""Consolas", "Monaco", "SF Mono", "Menlo", "Courier New", monospace"#,
    font_size_px: 18.0,
    line_height: "1.8",
};

static TERMINAL: Palette = Palette {
    body: "#0c0c0c",
    content: "#0c0c0c",
    text: "#00ff00",
    heading: "#00ff00",
    link: "#00ffff",
    code_bg: "#1a1a1a",
    code_text: "#00ff00",
    quote_bg: "#1a1a1a",
    quote_border: "#00ff00",
    quote_text: "#00cc00",
    font_family: r#""Consolas", "SF Mono", "Monaco", "Menlo", "Liberation Mono", "Courier New", monospace"#,
    code_font_family: r#""Consolas", "SF Mono", "Monaco", "Menlo", "Liberation Mono", monospace"#,
    font_size_px: 15.0,
    line_height: "1.5",
};

static OCEANIC: Palette = Palette {
    body: "#1b2b34",
    content: "#1b2b34",
    text: "#cdd3de",
    heading: "#6699cc",
    link: "#5fb3b3",
    code_bg: "#343d46",
    code_text: "#99c794",
    quote_bg: "#343d46",
    quote_border: "#5fb3b3",
    quote_text: "#a7adba",
    font_family: SYSTEM_SANS_WIDE,
    code_font_family: CODE_MONO_WIDE,
    font_size_px: 16.0,
    line_height: "1.7",
};

static NEWSPAPER: Palette = Palette {
    body: "#ffffff",
    content: "#ffffff",
    text: "#1a1a1a",
    heading: "#000000",
    link: "#0051a5",
    code_bg: "#f5f5f5",
    code_text: "#d32f2f",
    quote_bg: "#f5f5f5",
    quote_border: "#cccccc",
    quote_text: "#555555",
    font_family: SERIF_BOOK,
    code_font_family: r#""Courier New", monospace"#,
    font_size_px: 17.0,
    line_height: "1.75",
};

static CYBERPUNK: Palette = Palette {
    body: "#0a0e27",
    content: "#0a0e27",
    text: "#e0d9ff",
    heading: "#ff00ff",
    link: "#00ffff",
    code_bg: "#1a1f3a",
    code_text: "#ff00ff",
    quote_bg: "#1a1f3a",
    quote_border: "#ff00ff",
    quote_text: "#c9b3ff",
    font_family: SYSTEM_SANS_WIDE,
    code_font_family: CODE_MONO_WIDE,
    font_size_px: 16.0,
    line_height: "1.6",
};

static FOREST: Palette = Palette {
    body: "#1a2e1a",
    content: "#1a2e1a",
    text: "#d4e7d4",
    heading: "#8bc34a",
    link: "#4caf50",
    code_bg: "#2d4a2d",
    code_text: "#aed581",
    quote_bg: "#2d4a2d",
    quote_border: "#8bc34a",
    quote_text: "#c5e1a5",
    font_family: SYSTEM_SANS_WIDE,
    code_font_family: CODE_MONO_WIDE,
    font_size_px: 16.0,
    line_height: "1.65",
};

static MINIMAL: Palette = Palette {
    body: "#fafafa",
    content: "#fafafa",
    text: "#333333",
    heading: "#111111",
    link: "#666666",
    code_bg: "#eeeeee",
    code_text: "#333333",
    quote_bg: "#f5f5f5",
    quote_border: "#dddddd",
    quote_text: "#666666",
    font_family: SYSTEM_SANS_WIDE,
    code_font_family: CODE_MONO_WIDE,
    font_size_px: 15.0,
    line_height: "1.6",
};

static ACADEMIC: Palette = Palette {
    body: "#f8f8f8",
    content: "#f8f8f8",
    text: "#1a1a1a",
    heading: "#1a237e",
    link: "#3949ab",
    code_bg: "#eeeeee",
    code_text: "#c62828",
    quote_bg: "#e8eaf6",
    quote_border: "#3f51b5",
    quote_text: "#1a237e",
    font_family: SERIF_BOOK,
    code_font_family: CODE_MONO_WIDE,
    font_size_px: 17.0,
    line_height: "1.8",
};
