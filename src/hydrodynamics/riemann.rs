use crate::error::Error;
use crate::error::Result;
use crate::prelude::Float;

/// A one-dimensional fluid state on one side of the interface,
/// velocity taken along the line connecting the interacting pair.
#[derive(Clone, Copy, Debug)]
pub struct RiemannState {
    pub dens: Float,
    pub pres: Float,
    pub vel: Float,
    pub sound: Float,
}

impl RiemannState {
    fn validate(&self, side: &str) -> Result<()> {
        if !(self.dens > 0.0) || !(self.pres >= 0.0) || !(self.sound > 0.0) {
            return Err(Error::InvalidRiemannState(format!(
                "{} state requires dens > 0, pres >= 0, sound > 0, got \
                 dens = {}, pres = {}, sound = {}",
                side, self.dens, self.pres, self.sound
            )));
        }
        Ok(())
    }
}

/// Interface pressure and normal velocity.
#[derive(Clone, Copy, Debug)]
pub struct RiemannSolution {
    pub pres: Float,
    pub vel: Float,
}

/// The HLL approximate Riemann solver. Wave speed estimates follow
/// Davis with Roe-averaged velocity and sound speed; the star state
/// comes from the jump conditions across the two bounding waves, with
/// upwind selection when the interface lies outside the wave fan.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hll;

impl Hll {
    pub fn solve(&self, left: RiemannState, right: RiemannState) -> Result<RiemannSolution> {
        left.validate("left")?;
        right.validate("right")?;
        let sqrt_dens_left = left.dens.sqrt();
        let sqrt_dens_right = right.dens.sqrt();
        let roe_weight = 1.0 / (sqrt_dens_left + sqrt_dens_right);
        let roe_vel = (sqrt_dens_left * left.vel + sqrt_dens_right * right.vel) * roe_weight;
        let roe_sound =
            (sqrt_dens_left * left.sound + sqrt_dens_right * right.sound) * roe_weight;
        let s_left = (left.vel - left.sound).min(roe_vel - roe_sound);
        let s_right = (right.vel + right.sound).max(roe_vel + roe_sound);
        // Supersonic interface: take the upwind state unmodified.
        if s_left >= 0.0 {
            return Ok(RiemannSolution {
                pres: left.pres,
                vel: left.vel,
            });
        }
        if s_right <= 0.0 {
            return Ok(RiemannSolution {
                pres: right.pres,
                vel: right.vel,
            });
        }
        // Mass fluxes through the left and right waves; both are
        // positive inside this branch.
        let z_left = left.dens * (left.vel - s_left);
        let z_right = right.dens * (s_right - right.vel);
        let z_sum = z_left + z_right;
        let vel = (z_left * left.vel + z_right * right.vel + left.pres - right.pres) / z_sum;
        let pres = (z_right * left.pres
            + z_left * right.pres
            + z_left * z_right * (left.vel - right.vel))
            / z_sum;
        // Strong rarefactions can drive the jump-condition pressure
        // negative; the physical star pressure tends to zero there.
        Ok(RiemannSolution {
            pres: pres.max(0.0),
            vel,
        })
    }
}
