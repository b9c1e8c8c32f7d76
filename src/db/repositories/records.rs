use anyhow::Result;
use rusqlite::{params, Connection, Row};

use crate::{
    db::{
        helpers::{parse_datetime, parse_metric},
        Database,
    },
    models::HistoricalPr,
};

fn row_to_record(row: &Row) -> Result<HistoricalPr> {
    let metric: String = row.get("metric")?;
    let date: String = row.get("date")?;
    Ok(HistoricalPr {
        exercise_id: row.get("exercise_id")?,
        metric: parse_metric(&metric)?,
        value: row.get("value")?,
        date: parse_datetime(&date, "date")?,
        history_record_id: row.get("history_record_id")?,
    })
}

/// Inserts or raises a record; a lower value never replaces a higher one.
pub(super) fn upsert_record(conn: &Connection, record: &HistoricalPr) -> Result<()> {
    conn.execute(
        "INSERT INTO personal_records (exercise_id, metric, value, date, history_record_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(exercise_id, metric) DO UPDATE SET
             value = excluded.value,
             date = excluded.date,
             history_record_id = excluded.history_record_id
         WHERE excluded.value > personal_records.value",
        params![
            record.exercise_id,
            record.metric.as_str(),
            record.value,
            record.date.to_rfc3339(),
            record.history_record_id,
        ],
    )?;
    Ok(())
}

impl Database {
    pub async fn load_personal_records(&self, exercise_ids: Vec<String>) -> Result<Vec<HistoricalPr>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT exercise_id, metric, value, date, history_record_id
                 FROM personal_records
                 WHERE exercise_id = ?1",
            )?;
            let mut records = Vec::new();
            for exercise_id in exercise_ids {
                let mut rows = stmt.query(params![exercise_id])?;
                while let Some(row) = rows.next()? {
                    records.push(row_to_record(row)?);
                }
            }
            Ok(records)
        })
        .await
    }

    pub async fn upsert_personal_record(&self, record: &HistoricalPr) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| upsert_record(conn, &record)).await
    }
}
