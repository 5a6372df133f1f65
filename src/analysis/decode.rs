use crate::analysis::types::{
    AnalysisError, BalanceReading, DecodedActivity, SampleRecord, SessionSummary,
};
use fitparser::de::{DecodeOption, from_bytes_with_options};
use fitparser::profile::MesgNum;
use fitparser::{FitDataField, FitDataRecord};
use std::collections::HashSet;

// Record `left_right_balance`: 7-bit percentage, top bit flags the right leg.
const RECORD_BALANCE_MASK: u32 = 0x7F;
const RECORD_BALANCE_RIGHT: u32 = 0x80;

// Session `left_right_balance`: 14-bit percentage in hundredths, top bit flags
// the right leg.
const SESSION_BALANCE_MASK: u32 = 0x3FFF;
const SESSION_BALANCE_RIGHT: u32 = 0x8000;
const SESSION_BALANCE_SCALE: f64 = 100.0;

// File header: byte 0 is its own length, bytes 4..8 the little-endian length
// of the data section. A two-byte CRC follows the data.
const FIT_MIN_HEADER_BYTES: usize = 12;
const FIT_CRC_BYTES: usize = 2;

/// Options handed to the FIT decoder when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub validate_header_crc: bool,
    pub validate_data_crc: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            validate_header_crc: true,
            validate_data_crc: true,
        }
    }
}

impl DecoderConfig {
    /// Accept files whose checksums do not match, as long as they parse.
    pub fn lenient() -> Self {
        Self {
            validate_header_crc: false,
            validate_data_crc: false,
        }
    }

    fn decode_options(&self) -> HashSet<DecodeOption> {
        let mut options = HashSet::from([
            // Bit-field types such as the balance come back as raw integers.
            DecodeOption::ReturnNumericEnumValues,
            DecodeOption::DropUnknownFields,
            DecodeOption::DropUnknownMessages,
        ]);
        if !self.validate_header_crc {
            options.insert(DecodeOption::SkipHeaderCrcValidation);
        }
        if !self.validate_data_crc {
            options.insert(DecodeOption::SkipDataCrcValidation);
        }
        options
    }
}

/// Turns raw activity bytes into samples and a session summary.
pub trait ActivityDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedActivity, AnalysisError>;
}

/// [`ActivityDecoder`] backed by `fitparser`.
#[derive(Debug, Clone, Default)]
pub struct FitDecoder {
    config: DecoderConfig,
}

impl FitDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl ActivityDecoder for FitDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedActivity, AnalysisError> {
        check_declared_length(bytes)?;
        let records = from_bytes_with_options(bytes, &self.config.decode_options())
            .map_err(|err| AnalysisError::Decode(err.to_string()))?;
        Ok(to_activity(&records))
    }
}

/// Reject input shorter than the size its header declares.
///
/// `fitparser` stops quietly when the bytes run out on a message boundary, so
/// a truncated file would otherwise decode into a partial activity.
fn check_declared_length(bytes: &[u8]) -> Result<(), AnalysisError> {
    let header_size = bytes.first().copied().map_or(0, usize::from);
    if header_size < FIT_MIN_HEADER_BYTES || bytes.len() < header_size {
        return Err(AnalysisError::Decode(format!(
            "incomplete FIT header ({} bytes)",
            bytes.len()
        )));
    }

    let data_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let expected = usize::try_from(data_size)
        .ok()
        .and_then(|data| data.checked_add(header_size + FIT_CRC_BYTES))
        .unwrap_or(usize::MAX);
    if bytes.len() < expected {
        return Err(AnalysisError::Decode(format!(
            "file is truncated: header declares {expected} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

/// Pick out power samples and the first session from decoded FIT messages.
pub fn to_activity(records: &[FitDataRecord]) -> DecodedActivity {
    let mut samples = Vec::new();
    let mut session = None;

    for record in records {
        match record.kind() {
            MesgNum::Record => samples.push(to_sample(record)),
            MesgNum::Session if session.is_none() => session = Some(to_session(record)),
            _ => {}
        }
    }

    tracing::debug!(
        records = records.len(),
        samples = samples.len(),
        has_session = session.is_some(),
        "decoded FIT messages"
    );

    DecodedActivity { samples, session }
}

fn to_sample(record: &FitDataRecord) -> SampleRecord {
    let mut sample = SampleRecord::default();

    for field in record.fields() {
        match field.name() {
            "power" => sample.power = field_value_to_f64(field).and_then(to_watts),
            "left_right_balance" => {
                sample.balance = field_value_to_bits(field).map(|raw| {
                    BalanceReading::new(
                        f64::from(raw & RECORD_BALANCE_MASK),
                        raw & RECORD_BALANCE_RIGHT != 0,
                    )
                })
            }
            "left_torque_effectiveness" => {
                sample.left_torque_effectiveness = field_value_to_f64(field)
            }
            "right_torque_effectiveness" => {
                sample.right_torque_effectiveness = field_value_to_f64(field)
            }
            "left_pedal_smoothness" => sample.left_pedal_smoothness = field_value_to_f64(field),
            "right_pedal_smoothness" => sample.right_pedal_smoothness = field_value_to_f64(field),
            _ => {}
        }
    }

    sample
}

fn to_session(record: &FitDataRecord) -> SessionSummary {
    let mut session = SessionSummary::default();

    for field in record.fields() {
        match field.name() {
            "avg_power" => session.average_power = field_value_to_f64(field),
            "threshold_power" => {
                session.threshold_power = field_value_to_f64(field).and_then(to_watts)
            }
            "left_right_balance" => {
                session.balance = field_value_to_bits(field).map(|raw| {
                    BalanceReading::new(
                        f64::from(raw & SESSION_BALANCE_MASK) / SESSION_BALANCE_SCALE,
                        raw & SESSION_BALANCE_RIGHT != 0,
                    )
                })
            }
            _ => {}
        }
    }

    session
}

fn to_watts(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u32)
}

fn field_value_to_f64(field: &FitDataField) -> Option<f64> {
    field.value().clone().try_into().ok().or_else(|| {
        field
            .to_string()
            .split_whitespace()
            .next()
            .and_then(|raw| raw.parse::<f64>().ok())
    })
}

// Bit-field values must arrive unscaled to be split into flag and percentage.
fn field_value_to_bits(field: &FitDataField) -> Option<u32> {
    field_value_to_f64(field)
        .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
        .map(|value| value as u32)
}
