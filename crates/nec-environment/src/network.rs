//! Transmission lines and general two-port networks between segments.

use nec_core::{Cplx, Real, ensure_finite};

use crate::error::{EnvironmentError, EnvironmentResult};
use crate::excitation::SegmentRef;

/// Lossless transmission line connecting the gaps of two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionLine {
    pub port1: SegmentRef,
    pub port2: SegmentRef,
    /// Negative values describe a crossed (phase-reversed) line.
    pub characteristic_impedance: Real,
    /// `None` uses the straight distance between the two segments.
    pub length: Option<Real>,
    pub shunt1: Cplx,
    pub shunt2: Cplx,
}

/// General two-port defined by its short-circuit admittance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPort {
    pub port1: SegmentRef,
    pub port2: SegmentRef,
    pub y11: Cplx,
    pub y12: Cplx,
    pub y22: Cplx,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Network {
    Line(TransmissionLine),
    TwoPort(TwoPort),
}

impl Network {
    pub fn ports(&self) -> (SegmentRef, SegmentRef) {
        match self {
            Network::Line(l) => (l.port1, l.port2),
            Network::TwoPort(n) => (n.port1, n.port2),
        }
    }

    pub fn validate(&self) -> EnvironmentResult<()> {
        let (p1, p2) = self.ports();
        if p1.ordinal == 0 || p2.ordinal == 0 {
            return Err(EnvironmentError::Invalid {
                what: "network port ordinal is 1-based",
            });
        }
        if p1 == p2 {
            return Err(EnvironmentError::Invalid {
                what: "network ports must be different segments",
            });
        }
        match self {
            Network::Line(l) => {
                if ensure_finite(l.characteristic_impedance, "characteristic impedance")? == 0.0 {
                    return Err(EnvironmentError::Invalid {
                        what: "characteristic impedance must be non-zero",
                    });
                }
                if let Some(len) = l.length {
                    if ensure_finite(len, "line length")? < 0.0 {
                        return Err(EnvironmentError::Invalid {
                            what: "line length must not be negative",
                        });
                    }
                }
                Ok(())
            }
            Network::TwoPort(n) => {
                let all = [n.y11, n.y12, n.y22];
                if all.iter().all(|y| y.re.is_finite() && y.im.is_finite()) {
                    Ok(())
                } else {
                    Err(EnvironmentError::Invalid {
                        what: "network admittance is not finite",
                    })
                }
            }
        }
    }

    /// Short-circuit admittance matrix `[[y11, y12], [y12, y22]]`.
    ///
    /// `k` is the wavenumber and `port_distance` the straight distance
    /// between the two port segments; the absolute indices are only used in
    /// error reports.
    pub fn admittance(
        &self,
        k: Real,
        port_distance: Real,
        ports: (usize, usize),
    ) -> EnvironmentResult<[[Cplx; 2]; 2]> {
        match self {
            Network::TwoPort(n) => Ok([[n.y11, n.y12], [n.y12, n.y22]]),
            Network::Line(l) => {
                let z0 = l.characteristic_impedance;
                let beta_l = k * l.length.unwrap_or(port_distance);
                let s = beta_l.sin();
                if s.abs() < 1e-9 {
                    return Err(EnvironmentError::ResonantLine {
                        port1: ports.0 + 1,
                        port2: ports.1 + 1,
                    });
                }
                let y0 = 1.0 / z0.abs();
                let self_y = Cplx::new(0.0, -y0 * beta_l.cos() / s);
                let mut mutual = Cplx::new(0.0, y0 / s);
                if z0 < 0.0 {
                    mutual = -mutual;
                }
                Ok([[self_y + l.shunt1, mutual], [mutual, self_y + l.shunt2]])
            }
        }
    }
}
