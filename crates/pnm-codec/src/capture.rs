//! Tag-dispatched decode entry point.

use pnm_core::{DecodeError, PnmFileType};
use serde::{Deserialize, Serialize};

use crate::chan_est::ChannelEstimateCapture;
use crate::constellation::ConstellationCapture;
use crate::fec::FecSummaryCapture;
use crate::header::CaptureHeader;
use crate::histogram::HistogramCapture;
use crate::rxmer::RxMerCapture;
use crate::spectrum::SpectrumCapture;

/// A fully decoded PNM capture, one variant per file type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecodedCapture {
    RxMer(RxMerCapture),
    ChannelEstimate(ChannelEstimateCapture),
    FecSummary(FecSummaryCapture),
    Histogram(HistogramCapture),
    Constellation(ConstellationCapture),
    SpectrumSweep(SpectrumCapture),
}

impl DecodedCapture {
    pub fn header(&self) -> &CaptureHeader {
        match self {
            DecodedCapture::RxMer(c) => &c.header,
            DecodedCapture::ChannelEstimate(c) => &c.header,
            DecodedCapture::FecSummary(c) => &c.header,
            DecodedCapture::Histogram(c) => &c.header,
            DecodedCapture::Constellation(c) => &c.header,
            DecodedCapture::SpectrumSweep(c) => &c.header,
        }
    }

    pub fn file_type(&self) -> PnmFileType {
        self.header().file_type
    }

    pub fn channel_id(&self) -> u8 {
        self.header().channel_id
    }
}

/// Decode one capture artifact: validate the header, then dispatch on the
/// file-type tag to the matching variant decoder.
pub fn decode(bytes: &[u8]) -> Result<DecodedCapture, DecodeError> {
    let (header, payload) = CaptureHeader::parse(bytes)?;

    match header.file_type {
        PnmFileType::RxMer => Ok(DecodedCapture::RxMer(RxMerCapture::decode(header, payload))),
        PnmFileType::ChannelEstimate => Ok(DecodedCapture::ChannelEstimate(
            ChannelEstimateCapture::decode(header, payload)?,
        )),
        PnmFileType::FecSummary => Ok(DecodedCapture::FecSummary(FecSummaryCapture::decode(
            header, payload,
        )?)),
        PnmFileType::Histogram => Ok(DecodedCapture::Histogram(HistogramCapture::decode(
            header, payload,
        )?)),
        PnmFileType::Constellation => Ok(DecodedCapture::Constellation(
            ConstellationCapture::decode(header, payload)?,
        )),
        PnmFileType::SpectrumSweep => Ok(DecodedCapture::SpectrumSweep(SpectrumCapture::decode(
            header, payload,
        )?)),
    }
}
