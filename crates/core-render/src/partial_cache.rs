//! Previous-frame snapshot for partial repaint.
//!
//! Holds the exact text last written to each screen row. A row is repainted
//! when its new text differs; a cold cache (first frame, resize, `⌃L`)
//! repaints everything.

#[derive(Debug, Default)]
pub struct PartialCache {
    width: u16,
    rows: Vec<String>,
}

impl PartialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything so the next frame is painted in full.
    pub fn clear(&mut self) {
        self.width = 0;
        self.rows.clear();
    }

    /// Warm for a screen of this shape.
    pub fn is_warm_for(&self, width: u16, height: u16) -> bool {
        self.width == width && self.rows.len() == height as usize && width > 0
    }

    pub fn row_changed(&self, row: usize, text: &str) -> bool {
        self.rows.get(row).is_none_or(|prev| prev != text)
    }

    pub fn store(&mut self, width: u16, rows: &[String]) {
        self.width = width;
        self.rows.clear();
        self.rows.extend(rows.iter().cloned());
    }

    pub fn prev_text(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_until_stored_and_after_clear() {
        let mut c = PartialCache::new();
        assert!(!c.is_warm_for(10, 2));
        c.store(10, &["a".into(), "b".into()]);
        assert!(c.is_warm_for(10, 2));
        assert!(!c.is_warm_for(11, 2));
        assert!(!c.row_changed(1, "b"));
        assert!(c.row_changed(1, "c"));
        assert!(c.row_changed(5, ""));
        c.clear();
        assert!(!c.is_warm_for(10, 2));
        assert_eq!(c.prev_text(0), None);
    }
}
