//! Page geometry shared by on-screen pagination and PDF export

use crate::error::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CSS pixels per inch
pub const CSS_DPI: f64 = 96.0;

pub const DEFAULT_MARGIN: &str = "0.75in";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    Legal,
}

impl PageSize {
    pub fn name(&self) -> &'static str {
        match self {
            PageSize::Letter => "Letter",
            PageSize::A4 => "A4",
            PageSize::Legal => "Legal",
        }
    }

    /// Portrait (width, height) in inches
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (8.5, 11.0),
            PageSize::A4 => (210.0 / 25.4, 297.0 / 25.4),
            PageSize::Legal => (8.5, 14.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PageSize::Letter),
            "a4" => Ok(PageSize::A4),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!("unknown page size '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Page margins as CSS lengths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

impl Margins {
    pub fn uniform(value: &str) -> Self {
        Self {
            top: value.to_string(),
            right: value.to_string(),
            bottom: value.to_string(),
            left: value.to_string(),
        }
    }
}

/// Margins converted to inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginsIn {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSettings {
    pub size: PageSize,
    pub orientation: Orientation,
    pub margins: Margins,
}

impl fmt::Display for PageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.size.name(), self.orientation.name())
    }
}

impl PageSettings {
    /// Value of the `--pd-page-size` custom property, e.g. `A4 portrait`
    pub fn css_page_size(&self) -> String {
        self.to_string()
    }

    pub fn is_landscape(&self) -> bool {
        self.orientation == Orientation::Landscape
    }

    /// Page box (width, height) in inches, orientation applied
    pub fn page_box_in(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions_in();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn margins_in(&self) -> ExportResult<MarginsIn> {
        Ok(MarginsIn {
            top: length_to_inches(&self.margins.top)?,
            right: length_to_inches(&self.margins.right)?,
            bottom: length_to_inches(&self.margins.bottom)?,
            left: length_to_inches(&self.margins.left)?,
        })
    }

    /// Content box (width, height) in CSS pixels
    pub fn content_box_px(&self) -> ExportResult<(f64, f64)> {
        let (w, h) = self.page_box_in();
        let m = self.margins_in()?;
        let width = w - m.left - m.right;
        let height = h - m.top - m.bottom;
        if width <= 0.0 || height <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "margins leave no printable area on a {} page",
                self
            )));
        }
        Ok((width * CSS_DPI, height * CSS_DPI))
    }

    /// Check that all margins parse and leave a printable area
    pub fn validate(&self) -> ExportResult<()> {
        self.content_box_px().map(|_| ())
    }
}

/// Convert a CSS length (`in`, `cm`, `mm`, `pt`, `px`; bare `0`) to inches
pub fn length_to_inches(value: &str) -> ExportResult<f64> {
    let trimmed = value.trim();
    let invalid = || ExportError::InvalidGeometry(format!("invalid length '{}'", value));

    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let number: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !number.is_finite() || number < 0.0 {
        return Err(invalid());
    }

    let inches = match unit.to_ascii_lowercase().as_str() {
        "in" => number,
        "cm" => number / 2.54,
        "mm" => number / 25.4,
        "pt" => number / 72.0,
        "px" => number / CSS_DPI,
        "" if number == 0.0 => 0.0,
        _ => return Err(invalid()),
    };
    Ok(inches)
}
