use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_xlsxwriter::{Format, Workbook};

use monitor_domain::{parse_timestamp, Category, Transaction};

const COLUMNS: [&str; 10] = [
    "transaction_id",
    "timestamp",
    "user_id",
    "amount",
    "merchant",
    "category",
    "country",
    "device",
    "ip",
    "is_fraud",
];
const REQUIRED: [&str; 7] = [
    "transaction_id",
    "timestamp",
    "user_id",
    "amount",
    "category",
    "country",
    "device",
];
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const SECONDS_PER_DAY: f64 = 86_400.0;

static EMPTY: Data = Data::Empty;

fn excel_epoch() -> NaiveDateTime {
    // Day zero of the 1900 date system, shifted past the 1900 leap-year bug.
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    excel_epoch().checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

pub fn datetime_to_serial(value: &NaiveDateTime) -> f64 {
    let seconds = (*value - excel_epoch()).num_seconds();
    seconds as f64 / SECONDS_PER_DAY
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            text.trim().to_string()
        }
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value.as_f64().to_string(),
        _ => String::new(),
    }
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(value) => serial_to_datetime(value.as_f64()),
        Data::Float(value) => serial_to_datetime(*value),
        Data::Int(value) => serial_to_datetime(*value as f64),
        Data::String(text) | Data::DateTimeIso(text) => parse_timestamp(text),
        _ => None,
    }
}

fn cell_amount(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn cell_flag(cell: &Data) -> Option<bool> {
    match cell {
        Data::Bool(value) => Some(*value),
        Data::Int(value) => Some(*value != 0),
        Data::Float(value) => Some(*value != 0.0),
        Data::Empty => Some(false),
        Data::String(text) => match text.trim().to_lowercase().as_str() {
            "" | "0" | "false" | "no" => Some(false),
            "1" | "true" | "yes" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn field<'a>(row: &'a [Data], columns: &HashMap<String, usize>, name: &str) -> &'a Data {
    columns
        .get(name)
        .and_then(|column| row.get(*column))
        .unwrap_or(&EMPTY)
}

/// Reads the first worksheet. The first row is the header; columns are
/// matched by name in any order.
pub fn parse_xlsx(bytes: &[u8]) -> Result<Vec<Transaction>> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("invalid xlsx workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .context("failed to read first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(index, cell)| (cell_text(cell).to_lowercase(), index))
        .collect();
    for name in REQUIRED {
        if !columns.contains_key(name) {
            return Err(anyhow!("missing column '{}' in xlsx header", name));
        }
    }

    let mut transactions = Vec::new();
    for (index, row) in rows.enumerate() {
        // header is row 1
        let line = index + 2;
        let cell = |name: &str| field(row, &columns, name);
        if row.iter().all(|value| matches!(value, Data::Empty)) {
            continue;
        }
        let timestamp = cell_datetime(cell("timestamp"))
            .ok_or_else(|| anyhow!("invalid timestamp on row {}", line))?;
        let amount = cell_amount(cell("amount"))
            .ok_or_else(|| anyhow!("invalid amount on row {}", line))?;
        let is_fraud = cell_flag(cell("is_fraud"))
            .ok_or_else(|| anyhow!("invalid is_fraud flag on row {}", line))?;
        transactions.push(Transaction {
            transaction_id: cell_text(cell("transaction_id")),
            timestamp,
            user_id: cell_text(cell("user_id")),
            amount,
            merchant: cell_text(cell("merchant")),
            category: Category::from(cell_text(cell("category"))),
            country: cell_text(cell("country")),
            device: cell_text(cell("device")),
            ip: cell_text(cell("ip")),
            is_fraud,
        });
    }
    Ok(transactions)
}

/// Writes one worksheet with a header row; timestamps are stored as date cells.
pub fn render_xlsx(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let sheet = workbook.add_worksheet();
    for (column, name) in (0u16..).zip(COLUMNS) {
        sheet.write_string(0, column, name)?;
    }
    for (row, tx) in (1u32..).zip(transactions) {
        sheet.write_string(row, 0, &tx.transaction_id)?;
        sheet.write_number_with_format(row, 1, datetime_to_serial(&tx.timestamp), &date_format)?;
        sheet.write_string(row, 2, &tx.user_id)?;
        sheet.write_number(row, 3, tx.amount)?;
        sheet.write_string(row, 4, &tx.merchant)?;
        sheet.write_string(row, 5, tx.category.as_str())?;
        sheet.write_string(row, 6, &tx.country)?;
        sheet.write_string(row, 7, &tx.device)?;
        sheet.write_string(row, 8, &tx.ip)?;
        sheet.write_number(row, 9, f64::from(u8::from(tx.is_fraud)))?;
    }
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> NaiveDateTime {
        parse_timestamp(text).expect("timestamp")
    }

    #[test]
    fn serial_dates_follow_the_1900_system() {
        assert_eq!(serial_to_datetime(45292.0), Some(at("2024-01-01 00:00:00")));
        assert_eq!(serial_to_datetime(45292.5), Some(at("2024-01-01 12:00:00")));
        assert_eq!(datetime_to_serial(&at("2024-01-01 06:00:00")), 45292.25);
        assert_eq!(serial_to_datetime(-1.0), None);
    }

    #[test]
    fn cells_convert_to_fields() {
        assert_eq!(cell_text(&Data::Float(42.0)), "42");
        assert_eq!(cell_text(&Data::String(" USR00001 ".to_string())), "USR00001");
        assert_eq!(cell_amount(&Data::Int(12)), Some(12.0));
        assert_eq!(cell_flag(&Data::Float(1.0)), Some(true));
        assert_eq!(cell_flag(&Data::String("maybe".to_string())), None);
        assert_eq!(
            cell_datetime(&Data::String("2024-01-01T08:30:00".to_string())),
            Some(at("2024-01-01 08:30:00"))
        );
    }

    #[test]
    fn workbook_round_trip_keeps_rows() {
        let rows = vec![
            Transaction {
                transaction_id: "TX10000001".to_string(),
                timestamp: at("2024-02-29 23:59:59"),
                user_id: "USR00001".to_string(),
                amount: 125.0,
                merchant: "Acme Inc".to_string(),
                category: Category::Travel,
                country: "FR".to_string(),
                device: "Safari/iPhone".to_string(),
                ip: "10.1.2.3".to_string(),
                is_fraud: true,
            },
            Transaction {
                transaction_id: "TX10000002".to_string(),
                timestamp: at("2024-03-01 02:05:00"),
                user_id: "USR00002".to_string(),
                amount: 7.5,
                merchant: String::new(),
                category: Category::Other("Gaming".to_string()),
                country: "US".to_string(),
                device: "Chrome/macOS".to_string(),
                ip: String::new(),
                is_fraud: false,
            },
        ];
        let bytes = render_xlsx(&rows).expect("render");
        let parsed = parse_xlsx(&bytes).expect("parse");
        assert_eq!(parsed, rows);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "transaction_id").expect("write");
        sheet.write_string(0, 1, "amount").expect("write");
        let bytes = workbook.save_to_buffer().expect("save");
        let err = parse_xlsx(&bytes).expect_err("missing columns");
        assert!(err.to_string().contains("missing column 'timestamp'"), "{}", err);
    }
}
