use serde::{Serialize, Serializer};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

/// The scores and latencies of one identifier, in seconds where timed.
/// Floats are rounded to three decimals on serialisation only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetScoreRecord {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "NetScore", serialize_with = "round3")]
    pub net_score: f64,
    #[serde(rename = "NetScore_Latency", serialize_with = "round3")]
    pub net_score_latency: f64,
    #[serde(rename = "RampUp", serialize_with = "round3")]
    pub ramp_up: f64,
    #[serde(rename = "RampUp_Latency", serialize_with = "round3")]
    pub ramp_up_latency: f64,
    #[serde(rename = "Correctness", serialize_with = "round3")]
    pub correctness: f64,
    #[serde(rename = "Correctness_Latency", serialize_with = "round3")]
    pub correctness_latency: f64,
    #[serde(rename = "BusFactor", serialize_with = "round3")]
    pub bus_factor: f64,
    #[serde(rename = "BusFactor_Latency", serialize_with = "round3")]
    pub bus_factor_latency: f64,
    #[serde(rename = "ResponsiveMaintainer", serialize_with = "round3")]
    pub responsive_maintainer: f64,
    #[serde(rename = "ResponsiveMaintainer_Latency", serialize_with = "round3")]
    pub responsive_maintainer_latency: f64,
    #[serde(rename = "License", serialize_with = "round3")]
    pub license: f64,
    #[serde(rename = "License_Latency", serialize_with = "round3")]
    pub license_latency: f64,
}

impl NetScoreRecord {
    /// Scores only, in output order, without the URL or latencies.
    pub fn scores(&self) -> [f64; 6] {
        [
            self.net_score,
            self.ramp_up,
            self.correctness,
            self.bus_factor,
            self.responsive_maintainer,
            self.license,
        ]
    }
}

pub struct ResultsPersistence;

impl ResultsPersistence {
    pub fn to_json(record: &NetScoreRecord, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        }
    }

    /// Writes one record followed by a newline and flushes, so each line is
    /// visible as soon as its identifier finishes.
    pub async fn write_record<W>(out: &mut W, record: &NetScoreRecord, pretty: bool) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut line = Self::to_json(record, pretty)?;
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        debug!("Wrote record for {}", record.url);
        Ok(())
    }
}
