//! CLI surface and run configuration (§4.8, §4.9).

use clap::Parser;

use crate::phy::PhyParams;

/// Discrete-time cellular downlink link-layer simulator: EDF scheduling,
/// HARQ retransmission, and an optional PHY channel model.
#[derive(Debug, Parser)]
#[command(name = "l1-scheduler-sim", version, about)]
pub struct Config {
    /// Number of TTIs to simulate.
    #[arg(long)]
    pub ttis: i64,

    /// Resource blocks available per TTI.
    #[arg(long)]
    pub rb: i64,

    /// Number of simulated UEs.
    #[arg(long)]
    pub ues: usize,

    /// Per-UE, per-TTI arrival probability.
    #[arg(long, default_value_t = 0.2)]
    pub arrival: f64,

    /// Relative deadline, in TTIs after arrival.
    #[arg(long, default_value_t = 8)]
    pub deadline: i64,

    /// RNG seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Legacy-mode transport-block BLER.
    #[arg(long, default_value_t = 0.1)]
    pub bler: f64,

    /// HARQ round-trip time, in TTIs.
    #[arg(long, default_value_t = 8)]
    pub harq: i64,

    /// Optional path for the per-TTI scheduler allocation CSV log.
    #[arg(long)]
    pub csv: Option<String>,

    /// Enable the PHY channel model instead of the legacy CQI random walk.
    #[arg(long = "phy-mode", default_value_t = 0)]
    pub phy_mode: u8,

    /// Log-distance pathloss exponent.
    #[arg(long = "pathloss-exp", default_value_t = 3.5)]
    pub pathloss_exp: f64,

    /// Log-normal shadowing standard deviation, in dB.
    #[arg(long = "shadowing-std", default_value_t = 6.0)]
    pub shadowing_std: f64,

    /// AR(1) fading correlation coefficient.
    #[arg(long = "fading-rho", default_value_t = 0.9)]
    pub fading_rho: f64,

    /// Reference SNR, in dB.
    #[arg(long = "snr-ref", default_value_t = 18.0)]
    pub snr_ref: f64,

    /// Floor on the per-RB error probability.
    #[arg(long = "rb-floor-perr", default_value_t = 1e-4)]
    pub rb_floor_perr: f64,

    /// Minimum arriving packet size, in bits.
    #[arg(long = "pkt-bits-min", default_value_t = 800)]
    pub pkt_bits_min: i64,

    /// Maximum arriving packet size, in bits.
    #[arg(long = "pkt-bits-max", default_value_t = 12000)]
    pub pkt_bits_max: i64,
}

impl Config {
    pub fn phy_enabled(&self) -> bool {
        self.phy_mode != 0
    }

    /// PHY parameters, clamped to the ranges `Phy` assumes (§4.3).
    pub fn phy_params(&self) -> PhyParams {
        PhyParams {
            pathloss_exp: self.pathloss_exp,
            shadowing_std_db: self.shadowing_std,
            fading_rho: self.fading_rho.clamp(0.0, 0.999),
            snr_ref_db: self.snr_ref,
            rb_floor_perr: self.rb_floor_perr.clamp(0.0, 1.0),
        }
    }

    /// HARQ ring capacity, sized to strictly exceed the maximum possible
    /// in-flight event count (§5).
    pub fn harq_ring_capacity(&self) -> usize {
        (self.ttis.max(1) as usize) * self.ues.max(1) + 64
    }
}
