//! Per-user persistent channel state and per-TTI SINR/CQI/bits-per-RB snapshots.
//!
//! Two operating modes share the CQI→bits-per-RB table:
//! - PHY mode (`Phy`): pathloss + shadowing fixed at init, fading evolves as an
//!   AR(1) process, SINR derived and mapped to CQI and a per-RB error probability.
//! - Legacy mode (no `Phy` instance): CQI performs an independent random walk
//!   and per-RB error probability is unused (HARQ falls back to a configured BLER).

use crate::rng::Rng;

/// CQI thresholds (dB), lower bound for CQI 1..15.
const CQI_THRESHOLDS_DB: [f64; 15] = [
    -5.0, -2.0, 0.0, 1.5, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0, 19.0, 21.0, 23.0,
];

/// Bits-per-RB table, indexed by CQI 0..15 (index 0 is unused/defensive).
const BITS_PER_RB_TABLE: [i64; 16] = [
    0, 48, 72, 96, 120, 144, 192, 240, 288, 336, 408, 480, 552, 648, 744, 840,
];

/// Map an instantaneous SINR (dB) to a CQI in `[1, 15]` using the monotonic
/// threshold table: the highest CQI whose lower bound the SINR clears.
pub fn map_sinr_to_cqi(sinr_db: f64) -> i32 {
    let mut cqi = 1;
    for (i, &th) in CQI_THRESHOLDS_DB.iter().enumerate() {
        if sinr_db >= th {
            cqi = i as i32 + 1;
        }
    }
    cqi.clamp(1, 15)
}

/// Achievable bits per resource block at a given CQI (clamped to `[1, 15]`).
pub fn bits_per_rb_for_cqi(cqi: i32) -> i64 {
    let cqi = cqi.clamp(1, 15) as usize;
    BITS_PER_RB_TABLE[cqi]
}

/// Per-RB error probability from a logistic curve centered at 8 dB, floored
/// at `floor` so HARQ never sees a zero-error channel.
fn per_rb_error_prob(sinr_db: f64, floor: f64) -> f64 {
    let p = 1.0 / (1.0 + (0.8 * (sinr_db - 8.0)).exp());
    p.max(floor).min(1.0)
}

/// Persistent per-UE channel state: large-scale fading (fixed at init) plus
/// the AR(1) fast-fading state (mutated every `Phy::step`).
#[derive(Debug, Clone, Copy)]
pub struct PhyUeState {
    pathloss_db: f64,
    shadow_db: f64,
    fading_state: f64,
}

/// A fully-resolved per-TTI channel snapshot for one UE, used to drive both
/// the scheduler (`bits_per_rb`) and HARQ ACK/NACK sampling (`rb_err_prob`,
/// captured into the `HarqEvent` at transmit time).
#[derive(Debug, Clone, Copy)]
pub struct PhySnapshot {
    pub sinr_db: f64,
    pub cqi: i32,
    pub bits_per_rb: i64,
    pub rb_err_prob: f64,
}

/// Tunable parameters for the PHY channel model (§4.3). `fading_rho` and
/// `rb_floor_perr` are expected to already be clamped by `Config`.
#[derive(Debug, Clone, Copy)]
pub struct PhyParams {
    pub pathloss_exp: f64,
    pub shadowing_std_db: f64,
    pub fading_rho: f64,
    pub snr_ref_db: f64,
    pub rb_floor_perr: f64,
}

/// Per-user channel model state for the whole simulation.
pub struct Phy {
    ue: Vec<PhyUeState>,
    params: PhyParams,
}

impl Phy {
    /// Draw initial pathloss/shadowing for each UE from an area-uniform
    /// annulus distance in `[0.5, 1.5]` cell radii; fading starts at zero.
    pub fn init(num_ues: usize, params: PhyParams, rng: &mut Rng) -> Self {
        let ue = (0..num_ues)
            .map(|_| {
                let d = draw_annulus_distance(rng);
                let pathloss_db = 10.0 * params.pathloss_exp * d.log10();
                let shadow_db = params.shadowing_std_db * rng.normal();
                PhyUeState {
                    pathloss_db,
                    shadow_db,
                    fading_state: 0.0,
                }
            })
            .collect();
        Self { ue, params }
    }

    /// Advance every UE's AR(1) fading state by one TTI.
    pub fn step(&mut self, rng: &mut Rng) {
        let rho = self.params.fading_rho.clamp(0.0, 0.999);
        let sigma = (1.0 - rho * rho).max(1e-9).sqrt();
        for ue in &mut self.ue {
            let z = rng.normal();
            ue.fading_state = rho * ue.fading_state + sigma * z;
        }
    }

    /// Compute the current-TTI snapshot for one UE.
    pub fn snapshot(&self, ue_id: usize) -> PhySnapshot {
        let st = &self.ue[ue_id];
        let fading_db = 3.0 * st.fading_state;
        let sinr_db = (self.params.snr_ref_db - st.pathloss_db - st.shadow_db + fading_db).clamp(-10.0, 30.0);
        let cqi = map_sinr_to_cqi(sinr_db);
        PhySnapshot {
            sinr_db,
            cqi,
            bits_per_rb: bits_per_rb_for_cqi(cqi),
            rb_err_prob: per_rb_error_prob(sinr_db, self.params.rb_floor_perr),
        }
    }
}

fn draw_annulus_distance(rng: &mut Rng) -> f64 {
    let (r1, r2) = (0.5_f64, 1.5_f64);
    let u = rng.uniform01();
    (u * (r2 * r2 - r1 * r1) + r1 * r1).sqrt()
}
