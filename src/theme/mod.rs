//! Theme for human-mode output.

use console::Style;

/// Styles shared by every human-mode renderer.
#[derive(Debug, Clone)]
pub struct StickerTheme {
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub identifier: Style,
    pub emoji: Style,
    pub marker: Style,
}

impl Default for StickerTheme {
    fn default() -> Self {
        Self {
            accent: Style::new().color256(33),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().color256(214).bold(),
            muted: Style::new().color256(244),
            header: Style::new().color256(33).bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            identifier: Style::new().cyan(),
            emoji: Style::new(),
            marker: Style::new().red().italic(),
        }
    }
}

impl StickerTheme {
    /// Style for a pack's health label.
    pub fn health(&self, health: crate::service::PackHealth) -> &Style {
        use crate::service::PackHealth;
        match health {
            PackHealth::Valid => &self.success,
            PackHealth::ValidWithInvalidStickers => &self.warning,
            PackHealth::Invalid => &self.error,
        }
    }
}
