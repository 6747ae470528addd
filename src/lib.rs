//! Discrete-time cellular downlink link-layer simulator.
//!
//! A TTI-driven engine modeling per-UE traffic arrivals, an earliest-deadline-
//! first resource-block scheduler with partial-packet segmentation, a HARQ
//! retransmission pipeline with delayed feedback, and an optional PHY channel
//! model. See [`sim::Sim`] for the simulation core and its per-TTI contract.

pub mod config;
pub mod harq;
pub mod logging;
pub mod metrics;
pub mod packet;
pub mod phy;
pub mod queue;
pub mod rng;
pub mod scheduler;
pub mod sim;
pub mod ue;
