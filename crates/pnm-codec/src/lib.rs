//! # PNM-Codec
//!
//! Binary capture codec for DOCSIS 3.1 PNM telemetry files.
//!
//! A PNM file is a proprietary binary artifact a cable modem produces for a
//! specific measurement: per-subcarrier RxMER, OFDM channel-estimate
//! coefficients, FEC codeword counters, a sample histogram, a constellation
//! snapshot, or a downstream spectrum sweep. Every file carries a common
//! header (device MAC, OFDM channel id, subcarrier geometry, declared
//! payload length, type code) followed by a type-specific payload.
//!
//! The single entry point is [`decode`], which validates the header,
//! dispatches on the type code, and returns a typed [`DecodedCapture`]
//! whose per-subcarrier series carry a derived frequency axis.
//!
//! Decode failures are local to one artifact; they never invalidate
//! sibling artifacts from the same capture session.

pub mod capture;
pub mod chan_est;
pub mod constellation;
pub mod fec;
pub mod fixed_point;
pub mod header;
pub mod histogram;
pub mod rxmer;
pub mod spectrum;

pub use capture::{decode, DecodedCapture};
pub use chan_est::ChannelEstimateCapture;
pub use constellation::ConstellationCapture;
pub use fec::{FecProfileCounters, FecSummaryCapture};
pub use fixed_point::FixedPointFormat;
pub use header::CaptureHeader;
pub use histogram::{HistogramBin, HistogramCapture};
pub use rxmer::RxMerCapture;
pub use spectrum::{SpectrumCapture, SweepParams};
