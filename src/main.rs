use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};

use l1_scheduler_sim::config::Config;
use l1_scheduler_sim::sim::Sim;

fn main() {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.init();

    let cfg = match Config::try_parse() {
        Ok(cfg) => cfg,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    info!(
        "starting run: ttis={} ues={} rb={} seed={} phy_mode={}",
        cfg.ttis,
        cfg.ues,
        cfg.rb,
        cfg.seed,
        cfg.phy_enabled()
    );
    if cfg.phy_enabled() && cfg.bler != 0.1 {
        info!("--bler is ignored in PHY mode; ACK/NACK is sampled per RB instead");
    }

    let mut sim = Sim::new(&cfg);
    sim.run();
    print_summary(&cfg, &sim);
}

fn print_summary(cfg: &Config, sim: &Sim) {
    let m = sim.metrics();
    println!("=== L1 Scheduler Summary ===");
    println!("TTIs: {}, UEs: {}, RB/TTI: {}", cfg.ttis, cfg.ues, cfg.rb);
    println!("Arrivals: {} pkts", m.total_packets);
    println!(
        "Bits sent: {} bits ({:.2} Mbits)",
        m.total_bits_sent,
        m.total_bits_sent as f64 / 1e6
    );
    println!(
        "Deadline misses: {} ({:.2}%)",
        m.deadline_misses,
        m.miss_rate() * 100.0
    );
    println!("Avg latency (TTIs) over delivered: {:.2}", m.average_latency());
    println!("RB utilization: {:.2}%", m.rb_utilization(cfg.ttis, cfg.rb) * 100.0);
}
