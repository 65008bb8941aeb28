use serde::{Deserialize, Serialize};

/// Horizontal text alignment, per PRESENTATION bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlign {
    LeftEdge,
    XCenter,
    RightEdge,
}

/// Vertical text alignment, per PRESENTATION bits 2-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlign {
    TopEdge,
    YCenter,
    BottomEdge,
}

/// A text label's alignment, packed on disk as the low byte of a PRESENTATION record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            horizontal: HorizontalAlign::LeftEdge,
            vertical: VerticalAlign::TopEdge,
        }
    }
}

impl Presentation {
    pub fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Packs this presentation into the low byte of a two-byte PRESENTATION payload.
    /// The high byte (font selection) is always zero.
    pub fn to_bits(self) -> u8 {
        let h: u8 = match self.horizontal {
            HorizontalAlign::LeftEdge => 0b00,
            HorizontalAlign::XCenter => 0b01,
            HorizontalAlign::RightEdge => 0b10,
        };
        let v: u8 = match self.vertical {
            VerticalAlign::TopEdge => 0b00,
            VerticalAlign::YCenter => 0b01,
            VerticalAlign::BottomEdge => 0b10,
        };
        h | (v << 2)
    }

    /// Unpacks the low byte of a PRESENTATION payload. Unknown bit patterns
    /// (the reserved `0b11` combination) fall back to the nearest defined alignment.
    pub fn from_bits(low_byte: u8) -> Self {
        let horizontal = match low_byte & 0b11 {
            0b00 => HorizontalAlign::LeftEdge,
            0b01 => HorizontalAlign::XCenter,
            _ => HorizontalAlign::RightEdge,
        };
        let vertical = match (low_byte >> 2) & 0b11 {
            0b00 => VerticalAlign::TopEdge,
            0b01 => VerticalAlign::YCenter,
            _ => VerticalAlign::BottomEdge,
        };
        Self {
            horizontal,
            vertical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_is_zero() {
        let p = Presentation::default();
        assert_eq!(p.to_bits(), 0x00);
    }

    #[test]
    fn test_roundtrip_all_combinations() {
        let horiz = [
            HorizontalAlign::LeftEdge,
            HorizontalAlign::XCenter,
            HorizontalAlign::RightEdge,
        ];
        let vert = [
            VerticalAlign::TopEdge,
            VerticalAlign::YCenter,
            VerticalAlign::BottomEdge,
        ];
        for &h in &horiz {
            for &v in &vert {
                let p = Presentation::new(h, v);
                let bits = p.to_bits();
                let back = Presentation::from_bits(bits);
                assert_eq!(back, p);
            }
        }
    }
}
