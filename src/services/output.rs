use crate::domain::models::{ApplicationRecord, JsonOut};
use serde::Serialize;

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// Single-line JSON for streaming output (one value per line).
pub fn print_line<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&JsonOut { ok: true, data })?);
    Ok(())
}

pub fn record_row(r: &ApplicationRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{:.2}\t{}",
        r.id,
        r.citizen_id,
        r.pan.as_deref().unwrap_or("N/A"),
        r.bank_account,
        r.severity().label(),
        r.fraud_score,
        r.flag_label()
    )
}
