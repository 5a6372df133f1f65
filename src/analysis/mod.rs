pub mod balance;
pub mod decode;
pub mod overall;
pub mod types;
pub mod zones;

use decode::{ActivityDecoder, FitDecoder};
use overall::aggregate;
use zones::aggregate_by_zone;

pub use decode::DecoderConfig;
pub use types::{
    ActivityOverview, AnalysisError, BalanceReading, DecodedActivity, NormalizedBalance,
    PowerAnalysisResult, PowerRange, PowerZoneAggregate, SampleRecord, SessionSummary,
    SideMetrics,
};

/// Decode a FIT payload with the default decoder and analyse its power data.
pub fn analyze(bytes: &[u8]) -> Result<PowerAnalysisResult, AnalysisError> {
    analyze_with(&FitDecoder::default(), bytes)
}

/// Decode `bytes` with `decoder` and analyse the result.
///
/// The function performs three stages:
/// 1. [`ActivityDecoder::decode`] turns bytes into samples and the session
///    summary; a failure here is returned unchanged.
/// 2. [`overall::aggregate`] resolves whole-activity figures, including the
///    threshold power.
/// 3. [`zones::aggregate_by_zone`] breaks the samples down by power zone.
pub fn analyze_with<D: ActivityDecoder + ?Sized>(
    decoder: &D,
    bytes: &[u8],
) -> Result<PowerAnalysisResult, AnalysisError> {
    let activity = decoder.decode(bytes)?;
    Ok(analyze_decoded(&activity))
}

/// Analyse an already-decoded activity.
pub fn analyze_decoded(activity: &DecodedActivity) -> PowerAnalysisResult {
    let overview = aggregate(&activity.samples, activity.session.as_ref());
    let power_zone_balances = aggregate_by_zone(&activity.samples, overview.threshold_power);

    tracing::info!(
        samples = activity.samples.len(),
        average_power = overview.average_power,
        threshold_power = ?overview.threshold_power,
        zones = power_zone_balances.len(),
        "analysed activity power"
    );

    PowerAnalysisResult {
        average_power: overview.average_power,
        threshold_power: overview.threshold_power,
        left_right_balance: overview.balance,
        torque_effectiveness: overview.torque_effectiveness,
        pedal_smoothness: overview.pedal_smoothness,
        power_zone_balances,
    }
}
