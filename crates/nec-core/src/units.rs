// nec-core/src/units.rs

use uom::si::f64::{Frequency as UomFrequency, Length as UomLength};

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;
pub type Length = UomLength;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn mhz(v: f64) -> Frequency {
    use uom::si::frequency::megahertz;
    Frequency::new::<megahertz>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Frequency value in MHz, the unit used by frequency cards.
#[inline]
pub fn in_mhz(f: Frequency) -> f64 {
    use uom::si::frequency::megahertz;
    f.get::<megahertz>()
}

pub mod constants {
    use super::*;

    /// Speed of light in vacuum (m/s).
    pub const C0: f64 = 299_792_458.0;
    /// Vacuum permeability (H/m).
    pub const MU0: f64 = 4.0e-7 * core::f64::consts::PI;
    /// Vacuum permittivity (F/m).
    pub const EPS0: f64 = 1.0 / (MU0 * C0 * C0);
    /// Free-space wave impedance (ohms).
    pub const ETA0: f64 = MU0 * C0;

    /// Free-space wavelength at `f`.
    #[inline]
    pub fn wavelength(f: Frequency) -> Length {
        use uom::si::frequency::hertz;
        m(C0 / f.get::<hertz>())
    }
}

#[cfg(test)]
mod tests {
    use super::constants::*;
    use super::*;

    #[test]
    fn construct_and_read_back_si() {
        use uom::si::frequency::hertz;
        use uom::si::length::meter;

        let f = mhz(30.0);
        assert!((f.get::<hertz>() - 30.0e6).abs() < 1e-6);
        assert!((in_mhz(hz(1.5e6)) - 1.5).abs() < 1e-12);
        assert_eq!(m(2.5).get::<meter>(), 2.5);
    }

    #[test]
    fn free_space_constants_are_consistent() {
        assert!((ETA0 - 376.730_313).abs() < 1e-3);
        assert!((1.0 / (MU0 * EPS0).sqrt() - C0).abs() < 1e-3);
    }

    #[test]
    fn thirty_megahertz_is_ten_meters() {
        use uom::si::length::meter;
        let lambda = wavelength(mhz(30.0)).get::<meter>();
        assert!((lambda - 9.993_081_933).abs() < 1e-6);
    }
}
