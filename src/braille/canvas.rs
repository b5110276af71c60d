/// What a dot belongs to. When layers share a cell, the highest one decides
/// the cell's style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Land,
    Marker,
    Highlight,
}

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    dots: Vec<u8>,
    layers: Vec<Option<Layer>>,
}

impl BrailleCanvas {
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dots: vec![0; width * height],
            layers: vec![None; width * height],
        }
    }

    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize, layer: Layer) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let idx = cy * self.width + cx;
        self.dots[idx] |= bit;
        self.layers[idx] = self.layers[idx].max(Some(layer));
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, layer: Layer) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, layer);
        }
    }

    fn glyph(bits: u8) -> char {
        char::from_u32(0x2800 + bits as u32).unwrap_or(' ')
    }

    /// One row split into runs of cells sharing a top layer, ready to be
    /// styled as spans.
    pub fn row_runs(&self, row: usize) -> Vec<(Option<Layer>, String)> {
        let mut runs: Vec<(Option<Layer>, String)> = Vec::new();
        if row >= self.height {
            return runs;
        }

        let start = row * self.width;
        for idx in start..start + self.width {
            let layer = self.layers[idx];
            let ch = Self::glyph(self.dots[idx]);
            match runs.last_mut() {
                Some((last, text)) if *last == layer => text.push(ch),
                _ => runs.push((layer, ch.to_string())),
            }
        }
        runs
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.dots
            .chunks(self.width.max(1))
            .take(self.height)
            .map(|row| row.iter().map(|&b| Self::glyph(b)).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0, Layer::Land);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y, Layer::Land);
            }
        }
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(2, 0, Layer::Land);
        canvas.set_pixel_signed(-1, 0, Layer::Land);
        assert_eq!(canvas.to_string(), "\u{2800}");
    }

    #[test]
    fn test_runs_split_on_layer() {
        let mut canvas = BrailleCanvas::new(4, 1);
        canvas.set_pixel(0, 0, Layer::Land);
        canvas.set_pixel(2, 0, Layer::Marker);
        canvas.set_pixel(4, 0, Layer::Marker);
        // Marker outranks land in a shared cell.
        canvas.set_pixel(5, 0, Layer::Land);

        let runs = canvas.row_runs(0);
        let layers: Vec<_> = runs.iter().map(|(l, _)| *l).collect();
        assert_eq!(layers, vec![Some(Layer::Land), Some(Layer::Marker), None]);
        assert_eq!(runs[1].1.chars().count(), 2);
        assert!(canvas.row_runs(1).is_empty());
    }
}
