use std::ops;

// Linear-light radiance triple. Channels stay unbounded through the
// whole estimator; the output transfer chain at the bottom of this
// file is the only place values are squeezed into display range.
pub struct RGB {
    r: f32,
    g: f32,
    b: f32,
}

impl Copy for RGB {}
impl Clone for RGB {
    fn clone(&self) -> RGB {
        *self
    }
}

impl RGB {
    pub fn new(r: f32, g: f32, b: f32) -> RGB {
        RGB { r: r, g: g, b: b }
    }

    pub fn black() -> RGB {
        RGB::new(0.0_f32, 0.0_f32, 0.0_f32)
    }

    pub fn r(&self) -> f32 {
        self.r
    }
    pub fn g(&self) -> f32 {
        self.g
    }
    pub fn b(&self) -> f32 {
        self.b
    }
}

// Channelwise product: albedo tinting and throughput accumulation.
impl ops::Mul for RGB {
    type Output = RGB;
    fn mul(self, rhs: RGB) -> RGB {
        RGB::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl ops::Add for RGB {
    type Output = RGB;
    fn add(self, rhs: RGB) -> RGB {
        RGB::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl ops::Mul<f32> for RGB {
    type Output = RGB;
    fn mul(self, rhs: f32) -> RGB {
        RGB::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl ops::Div<f32> for RGB {
    type Output = RGB;
    fn div(self, rhs: f32) -> RGB {
        RGB::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

fn saturate(c: RGB) -> RGB {
    RGB::new(
        crate::utils::clamp(c.r, 0.0_f32, 1.0_f32),
        crate::utils::clamp(c.g, 0.0_f32, 1.0_f32),
        crate::utils::clamp(c.b, 0.0_f32, 1.0_f32),
    )
}

// Narkowicz's rational fit of the ACES response curve.
// https://knarkowicz.wordpress.com/2016/01/06/aces-filmic-tone-mapping-curve/
pub fn aces_tonemap(c: RGB) -> RGB {
    const A: f32 = 2.51_f32;
    const B: f32 = 0.03_f32;
    const C: f32 = 2.43_f32;
    const D: f32 = 0.59_f32;
    const E: f32 = 0.14_f32;

    fn curve(x: f32) -> f32 {
        (x * (A * x + B)) / (x * (C * x + D) + E)
    }

    saturate(RGB::new(curve(c.r), curve(c.g), curve(c.b)))
}

pub fn gamma_corrected(c: RGB) -> RGB {
    let gamma = 1.0_f32 / 2.2_f32;
    RGB::new(c.r.powf(gamma), c.g.powf(gamma), c.b.powf(gamma))
}

pub fn to_bytes(c: RGB) -> [u8; 3] {
    [
        (255.0_f32 * c.r).round() as u8,
        (255.0_f32 * c.g).round() as u8,
        (255.0_f32 * c.b).round() as u8,
    ]
}

// Runs the full output transfer chain over a finished pixel buffer.
pub fn finalize(colors: &[RGB]) -> Vec<u8> {
    let mut data = Vec::with_capacity(colors.len() * 3);
    for c in colors {
        let bytes = to_bytes(gamma_corrected(aces_tonemap(*c)));
        data.push(bytes[0]);
        data.push(bytes[1]);
        data.push(bytes[2]);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aces_pins_black_and_clamps_highlights() {
        let black = aces_tonemap(RGB::black());
        assert!(black.r() == 0.0_f32 && black.g() == 0.0_f32 && black.b() == 0.0_f32);

        let hot = aces_tonemap(RGB::new(100.0_f32, 100.0_f32, 100.0_f32));
        assert!(hot.r() == 1.0_f32 && hot.g() == 1.0_f32 && hot.b() == 1.0_f32);
    }

    #[test]
    fn aces_is_monotone_in_the_working_range() {
        let mut prev = -1.0_f32;
        for i in 0..100 {
            let x = i as f32 * 0.05_f32;
            let mapped = aces_tonemap(RGB::new(x, x, x)).r();
            assert!(mapped >= prev);
            prev = mapped;
        }
    }

    #[test]
    fn gamma_preserves_endpoints() {
        let lo = gamma_corrected(RGB::black());
        let hi = gamma_corrected(RGB::new(1.0_f32, 1.0_f32, 1.0_f32));
        assert!(lo.r() == 0.0_f32);
        assert!((hi.r() - 1.0_f32).abs() < 1e-6);
    }

    #[test]
    fn quantization_rounds_to_nearest() {
        let bytes = to_bytes(RGB::new(0.5_f32, 0.0_f32, 1.0_f32));
        assert_eq!(bytes, [128_u8, 0_u8, 255_u8]);
    }
}
