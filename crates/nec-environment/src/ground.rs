//! Ground models.

use nec_core::constants::EPS0;
use nec_core::{Cplx, Real, ensure_finite, ensure_positive};

use crate::error::{EnvironmentError, EnvironmentResult};

/// How a finite ground enters the interaction matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiniteGroundModel {
    /// Image scaled by the reflection coefficient.
    #[default]
    ReflectionCoefficient,
    /// Sommerfeld-Norton treatment for wires close to the ground.
    SommerfeldNorton,
}

/// Electrical constants of a lossy ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundMaterial {
    pub relative_permittivity: Real,
    /// Conductivity in S/m.
    pub conductivity: Real,
}

impl GroundMaterial {
    pub fn new(relative_permittivity: Real, conductivity: Real) -> EnvironmentResult<Self> {
        ensure_positive(relative_permittivity, "ground relative permittivity")?;
        let sigma = ensure_finite(conductivity, "ground conductivity")?;
        if sigma < 0.0 {
            return Err(EnvironmentError::Invalid {
                what: "ground conductivity must not be negative",
            });
        }
        Ok(Self {
            relative_permittivity,
            conductivity: sigma,
        })
    }

    /// Relative complex permittivity `eps_r - j sigma / (omega eps0)`.
    pub fn complex_permittivity(&self, omega: Real) -> Cplx {
        Cplx::new(
            self.relative_permittivity,
            -self.conductivity / (omega * EPS0),
        )
    }
}

/// Radial wire ground screen centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialScreen {
    pub radial_count: u32,
    pub screen_radius: Real,
    pub wire_radius: Real,
}

impl RadialScreen {
    pub fn new(radial_count: u32, screen_radius: Real, wire_radius: Real) -> EnvironmentResult<Self> {
        if radial_count == 0 {
            return Err(EnvironmentError::Invalid {
                what: "radial screen needs at least one radial",
            });
        }
        ensure_positive(screen_radius, "screen radius")?;
        ensure_positive(wire_radius, "screen wire radius")?;
        Ok(Self {
            radial_count,
            screen_radius,
            wire_radius,
        })
    }

    /// Surface impedance of the screen, relative to the free-space wave
    /// impedance, at distance `rho` from the center.
    pub fn relative_surface_impedance(&self, k: Real, rho: Real) -> Cplx {
        let spacing = 2.0 * core::f64::consts::PI * rho / self.radial_count as Real;
        let ratio = (spacing / (2.0 * core::f64::consts::PI * self.wire_radius)).max(1.0);
        Cplx::new(0.0, k * spacing / (2.0 * core::f64::consts::PI) * ratio.ln())
    }
}

/// Geometry of the boundary between the near and far ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cliff {
    /// Straight edge at x = `distance`; the far ground lies `height` lower.
    Linear { distance: Real, height: Real },
    /// Circular edge of `radius` around the origin.
    Circular { radius: Real, height: Real },
}

impl Cliff {
    pub fn height(&self) -> Real {
        match *self {
            Cliff::Linear { height, .. } | Cliff::Circular { height, .. } => height,
        }
    }

    /// True when a ground point at (x, y) lies beyond the edge.
    pub fn is_beyond(&self, x: Real, y: Real) -> bool {
        match *self {
            Cliff::Linear { distance, .. } => x > distance,
            Cliff::Circular { radius, .. } => x.hypot(y) > radius,
        }
    }
}

/// Far ground region used by the cliff pattern modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondMedium {
    pub material: GroundMaterial,
    pub cliff: Cliff,
}

/// Ground below the structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Ground {
    /// Free space.
    #[default]
    None,
    /// Perfectly conducting plane at z = 0.
    Perfect,
    /// Lossy plane at z = 0.
    Finite {
        material: GroundMaterial,
        model: FiniteGroundModel,
        screen: Option<RadialScreen>,
        second: Option<SecondMedium>,
    },
}

impl Ground {
    pub fn finite(material: GroundMaterial, model: FiniteGroundModel) -> Self {
        Ground::Finite {
            material,
            model,
            screen: None,
            second: None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Ground::None)
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Ground::Finite { .. })
    }

    /// Attach a radial wire screen to a finite ground.
    pub fn set_radial_screen(&mut self, radial: RadialScreen) -> EnvironmentResult<()> {
        match self {
            Ground::Finite { screen, .. } => {
                *screen = Some(radial);
                Ok(())
            }
            _ => Err(EnvironmentError::RequiresFiniteGround {
                what: "radial ground screen",
            }),
        }
    }

    /// Attach a second ground medium beyond a cliff to a finite ground.
    pub fn set_second_medium(&mut self, medium: SecondMedium) -> EnvironmentResult<()> {
        match self {
            Ground::Finite { second, .. } => {
                *second = Some(medium);
                Ok(())
            }
            _ => Err(EnvironmentError::RequiresFiniteGround {
                what: "second ground medium",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_permittivity_has_loss_term() {
        let g = GroundMaterial::new(13.0, 0.005).unwrap();
        let omega = 2.0 * core::f64::consts::PI * 10e6;
        let e = g.complex_permittivity(omega);
        assert_eq!(e.re, 13.0);
        assert!((e.im + 8.987_551_8).abs() < 1e-4);
    }

    #[test]
    fn bad_ground_constants() {
        assert!(GroundMaterial::new(0.0, 0.01).is_err());
        assert!(GroundMaterial::new(10.0, -0.01).is_err());
    }

    #[test]
    fn screens_need_finite_ground() {
        let screen = RadialScreen::new(120, 10.0, 0.001).unwrap();
        let mut perfect = Ground::Perfect;
        assert!(matches!(
            perfect.set_radial_screen(screen),
            Err(EnvironmentError::RequiresFiniteGround { .. })
        ));
        let mut lossy = Ground::finite(
            GroundMaterial::new(13.0, 0.005).unwrap(),
            FiniteGroundModel::ReflectionCoefficient,
        );
        lossy.set_radial_screen(screen).unwrap();
        assert!(matches!(lossy, Ground::Finite { screen: Some(_), .. }));
    }

    #[test]
    fn cliff_sides() {
        let linear = Cliff::Linear {
            distance: 5.0,
            height: 2.0,
        };
        assert!(!linear.is_beyond(4.0, 100.0));
        assert!(linear.is_beyond(6.0, 0.0));
        let circular = Cliff::Circular {
            radius: 5.0,
            height: 2.0,
        };
        assert!(circular.is_beyond(4.0, 4.0));
        assert!(!circular.is_beyond(3.0, 3.0));
        assert_eq!(circular.height(), 2.0);
    }
}
