//! Minimal FIT encoder for building test activities.
//!
//! Each message is written with its own definition on local message 0, which
//! keeps the encoder simple while staying valid FIT.
#![allow(dead_code)]

const BASE_ENUM: u8 = 0x00;
const BASE_UINT8: u8 = 0x02;
const BASE_UINT16: u8 = 0x84;
const BASE_UINT32: u8 = 0x86;

const MESG_FILE_ID: u16 = 0;
const MESG_SESSION: u16 = 18;
const MESG_RECORD: u16 = 20;

const FIT_EPOCH_OFFSET: u32 = 1_000_000_000;

/// Fields of one `record` message. Percentages are in whole percent and are
/// scaled to the FIT encoding on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Record {
    pub power: Option<u16>,
    /// `(percent, right_is_reference)`
    pub balance: Option<(u8, bool)>,
    pub left_torque: Option<f64>,
    pub right_torque: Option<f64>,
    pub left_smoothness: Option<f64>,
    pub right_smoothness: Option<f64>,
}

impl Record {
    pub fn power(watts: u16) -> Self {
        Self {
            power: Some(watts),
            ..Default::default()
        }
    }

    pub fn with_balance(mut self, percent: u8, right_is_reference: bool) -> Self {
        self.balance = Some((percent, right_is_reference));
        self
    }

    pub fn with_torque(mut self, left: f64, right: f64) -> Self {
        self.left_torque = Some(left);
        self.right_torque = Some(right);
        self
    }

    pub fn with_smoothness(mut self, left: f64, right: f64) -> Self {
        self.left_smoothness = Some(left);
        self.right_smoothness = Some(right);
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    pub avg_power: Option<u16>,
    pub threshold_power: Option<u16>,
    /// `(percent, right_is_reference)`, percent may carry hundredths.
    pub balance: Option<(f64, bool)>,
}

enum FieldValue {
    Enum(u8),
    U8(u8),
    U16(u16),
    U32(u32),
}

impl FieldValue {
    fn size(&self) -> u8 {
        match self {
            FieldValue::Enum(_) | FieldValue::U8(_) => 1,
            FieldValue::U16(_) => 2,
            FieldValue::U32(_) => 4,
        }
    }

    fn base_type(&self) -> u8 {
        match self {
            FieldValue::Enum(_) => BASE_ENUM,
            FieldValue::U8(_) => BASE_UINT8,
            FieldValue::U16(_) => BASE_UINT16,
            FieldValue::U32(_) => BASE_UINT32,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            FieldValue::Enum(value) | FieldValue::U8(value) => out.push(*value),
            FieldValue::U16(value) => out.extend_from_slice(&value.to_le_bytes()),
            FieldValue::U32(value) => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}

/// Builds a complete FIT activity file in memory.
#[derive(Debug, Default)]
pub struct FitBuilder {
    data: Vec<u8>,
    records: u32,
}

impl FitBuilder {
    pub fn new() -> Self {
        let mut builder = Self::default();
        // file_id.type = activity
        builder.message(MESG_FILE_ID, &[(0, FieldValue::Enum(4))]);
        builder
    }

    pub fn record(mut self, record: Record) -> Self {
        let mut fields = vec![(253, FieldValue::U32(FIT_EPOCH_OFFSET + self.records))];
        if let Some(power) = record.power {
            fields.push((7, FieldValue::U16(power)));
        }
        if let Some((percent, right)) = record.balance {
            let flag = if right { 0x80 } else { 0x00 };
            fields.push((30, FieldValue::U8((percent & 0x7F) | flag)));
        }
        for (number, value) in [
            (43, record.left_torque),
            (44, record.right_torque),
            (45, record.left_smoothness),
            (46, record.right_smoothness),
        ] {
            if let Some(percent) = value {
                // Stored in half-percent steps.
                fields.push((number, FieldValue::U8((percent * 2.0).round() as u8)));
            }
        }
        self.message(MESG_RECORD, &fields);
        self.records += 1;
        self
    }

    pub fn records<I>(self, records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        records
            .into_iter()
            .fold(self, |builder, record| builder.record(record))
    }

    pub fn session(mut self, session: Session) -> Self {
        let mut fields = vec![(253, FieldValue::U32(FIT_EPOCH_OFFSET + self.records))];
        if let Some(avg) = session.avg_power {
            fields.push((20, FieldValue::U16(avg)));
        }
        if let Some((percent, right)) = session.balance {
            let raw = ((percent * 100.0).round() as u16) & 0x3FFF;
            let flag = if right { 0x8000 } else { 0x0000 };
            fields.push((37, FieldValue::U16(raw | flag)));
        }
        if let Some(threshold) = session.threshold_power {
            fields.push((45, FieldValue::U16(threshold)));
        }
        self.message(MESG_SESSION, &fields);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut header = Vec::with_capacity(14);
        header.push(14);
        header.push(0x20);
        header.extend_from_slice(&2132u16.to_le_bytes());
        header.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        header.extend_from_slice(b".FIT");
        let header_crc = calculate_crc(&header);
        header.extend_from_slice(&header_crc.to_le_bytes());

        let mut file = header;
        file.extend_from_slice(&self.data);
        let data_crc = calculate_crc(&file);
        file.extend_from_slice(&data_crc.to_le_bytes());
        file
    }

    fn message(&mut self, global: u16, fields: &[(u8, FieldValue)]) {
        // Definition message on local 0, little-endian.
        self.data.push(0x40);
        self.data.push(0);
        self.data.push(0);
        self.data.extend_from_slice(&global.to_le_bytes());
        self.data.push(fields.len() as u8);
        for (number, value) in fields {
            self.data.push(*number);
            self.data.push(value.size());
            self.data.push(value.base_type());
        }

        self.data.push(0x00);
        for (_, value) in fields {
            value.write(&mut self.data);
        }
    }
}

/// Standard FIT CRC-16 using the Garmin nibble lookup table.
pub fn calculate_crc(data: &[u8]) -> u16 {
    const CRC_TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    data.iter().fold(0u16, |crc, byte| {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        let mut crc = (crc >> 4) & 0x0FFF;
        crc ^= tmp ^ CRC_TABLE[(byte & 0xF) as usize];
        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
    })
}

/// A ride with a session carrying average power, threshold and balance.
pub fn ride_with_session() -> Vec<u8> {
    FitBuilder::new()
        .records([
            Record::power(100)
                .with_balance(48, false)
                .with_torque(80.0, 78.0)
                .with_smoothness(22.0, 24.0),
            Record::power(105).with_balance(52, true).with_torque(82.0, 76.0),
            Record::power(190).with_balance(51, true),
            Record::power(260)
                .with_balance(47, false)
                .with_smoothness(18.0, 20.0),
            Record::power(0).with_balance(10, false),
            Record::default().with_balance(10, false),
        ])
        .session(Session {
            avg_power: Some(171),
            threshold_power: Some(200),
            balance: Some((50.5, true)),
        })
        .build()
}

/// Write `bytes` to a fresh temp file named `name` and return its path.
pub fn write_temp_fit(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("power-balance-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
