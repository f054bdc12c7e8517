use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Colour ramp generator
// ---------------------------------------------------------------------------

/// `n` colours running from blue (light halos) to red (heavy halos).
pub fn generate_ramp(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
            let hue = 216.0 * (1.0 - t);
            let hsl = Hsl::new(hue, 1.0, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Mass colour mapping: halo mass → ramp step
// ---------------------------------------------------------------------------

/// Splits the mass range into equal steps (in log10 when all masses are
/// positive) and assigns each step a colour.
#[derive(Debug, Clone)]
pub struct MassColorMap {
    lo: f64,
    hi: f64,
    log: bool,
    colors: Vec<Color32>,
}

impl MassColorMap {
    pub fn new(min_mass: f64, max_mass: f64, steps: usize) -> Self {
        let log = min_mass > 0.0;
        let (lo, hi) = if log {
            (min_mass.log10(), max_mass.log10())
        } else {
            (min_mass, max_mass)
        };
        MassColorMap {
            lo,
            hi,
            log,
            colors: generate_ramp(steps.max(1)),
        }
    }

    pub fn steps(&self) -> usize {
        self.colors.len()
    }

    /// Ramp step a mass falls into.
    pub fn step_for(&self, mass: f64) -> usize {
        let v = if self.log { mass.log10() } else { mass };
        let span = self.hi - self.lo;
        if !(span > 0.0) || !v.is_finite() {
            return 0;
        }
        let t = ((v - self.lo) / span).clamp(0.0, 1.0);
        ((t * self.steps() as f64) as usize).min(self.steps() - 1)
    }

    pub fn color(&self, step: usize) -> Color32 {
        self.colors.get(step).copied().unwrap_or(Color32::GRAY)
    }

    /// Legend label of a ramp step.
    pub fn label(&self, step: usize) -> String {
        let width = (self.hi - self.lo) / self.steps() as f64;
        let a = self.lo + width * step as f64;
        let b = a + width;
        if self.log {
            format!("log M {a:.1} – {b:.1}")
        } else {
            format!("M {a:.3e} – {b:.3e}")
        }
    }
}
