//+1 when a moves from <= b to > b, -1 when a moves from >= b to < b, 0 otherwise
//needs both inputs on the current and previous bar

#[derive(Debug, Clone, Default)]
pub struct CrossOver {
    prev: Option<(f64, f64)>,
    current: Option<f64>,
}

impl CrossOver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: Option<f64>, b: Option<f64>) -> Option<f64> {
        let now = a.zip(b);

        self.current = match (self.prev, now) {
            (Some((pa, pb)), Some((a, b))) => Some(if pa <= pb && a > b {
                1.0
            } else if pa >= pb && a < b {
                -1.0
            } else {
                0.0
            }),
            _ => None,
        };

        self.prev = now;
        self.current
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }
}
