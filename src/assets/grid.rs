/// Grid connection point shared by the plant and the battery.
///
/// Only the import direction is limited: battery charging may not push the
/// site's total draw past `max_import_mw`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConnection {
    max_import_mw: f64,
}

impl Default for GridConnection {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl GridConnection {
    /// A connection with no import limit.
    pub fn unlimited() -> Self {
        Self {
            max_import_mw: f64::INFINITY,
        }
    }

    /// A connection with an import limit. Non-positive values mean unlimited.
    pub fn with_import_limit(max_import_mw: f64) -> Self {
        if max_import_mw > 0.0 {
            Self { max_import_mw }
        } else {
            Self::unlimited()
        }
    }

    /// Returns the import limit in MW (infinite when unlimited).
    pub fn max_import_mw(&self) -> f64 {
        self.max_import_mw
    }

    /// Import capacity left once `load_mw` is already drawn (MW, >= 0).
    pub fn import_headroom_mw(&self, load_mw: f64) -> f64 {
        (self.max_import_mw - load_mw).max(0.0)
    }
}
