use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::{
    db::{
        helpers::{parse_datetime, to_i64, to_optional_u32, to_position, to_u64},
        Database,
    },
    models::{HistoricalPr, HistoryExercise, HistoryRecord, HistorySet},
};

use super::records::upsert_record;

fn insert_history(conn: &Connection, record: &HistoryRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO history_records (id, workout_id, name, date, duration_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.workout_id,
            record.name,
            record.date.to_rfc3339(),
            to_i64(record.duration_seconds)?,
        ],
    )
    .with_context(|| "failed to insert history record")?;

    for (exercise_position, exercise) in record.exercises.iter().enumerate() {
        for (position, set) in exercise.sets.iter().enumerate() {
            conn.execute(
                "INSERT INTO history_sets
                    (history_id, exercise_position, exercise_id, position, reps, weight_kg, time_seconds, distance_meters)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    to_position(exercise_position)?,
                    exercise.exercise_id,
                    to_position(position)?,
                    set.reps,
                    set.weight,
                    set.time,
                    set.distance,
                ],
            )?;
        }
    }

    Ok(())
}

impl Database {
    /// Writes the finished workout and its records atomically; on failure
    /// nothing is stored and the caller may retry with the same data.
    pub async fn finish_workout(&self, record: &HistoryRecord, records: &[HistoricalPr]) -> Result<()> {
        let history = record.clone();
        let records = records.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            insert_history(&tx, &history)?;
            for pr in &records {
                upsert_record(&tx, pr)?;
            }
            tx.commit().with_context(|| "failed to commit finished workout")?;
            Ok(())
        })
        .await
    }

    pub async fn get_history(&self, history_id: &str) -> Result<Option<HistoryRecord>> {
        let history_id = history_id.to_string();
        self.execute(move |conn| {
            let header = {
                let mut stmt = conn.prepare(
                    "SELECT workout_id, name, date, duration_seconds FROM history_records WHERE id = ?1",
                )?;
                let mut rows = stmt.query(params![history_id])?;
                match rows.next()? {
                    Some(row) => Some((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    )),
                    None => None,
                }
            };
            let Some((workout_id, name, date, duration_seconds)) = header else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT exercise_position, exercise_id, reps, weight_kg, time_seconds, distance_meters
                 FROM history_sets
                 WHERE history_id = ?1
                 ORDER BY exercise_position ASC, position ASC",
            )?;
            let mut rows = stmt.query(params![history_id])?;
            let mut exercises: Vec<HistoryExercise> = Vec::new();
            let mut current_position: Option<i64> = None;
            while let Some(row) = rows.next()? {
                let exercise_position: i64 = row.get("exercise_position")?;
                if current_position != Some(exercise_position) {
                    current_position = Some(exercise_position);
                    exercises.push(HistoryExercise {
                        exercise_id: row.get("exercise_id")?,
                        sets: Vec::new(),
                    });
                }
                if let Some(exercise) = exercises.last_mut() {
                    exercise.sets.push(HistorySet {
                        reps: to_optional_u32(row.get("reps")?, "reps")?,
                        weight: row.get("weight_kg")?,
                        time: to_optional_u32(row.get("time_seconds")?, "time_seconds")?,
                        distance: to_optional_u32(row.get("distance_meters")?, "distance_meters")?,
                    });
                }
            }

            Ok(Some(HistoryRecord {
                id: history_id.clone(),
                workout_id,
                name,
                date: parse_datetime(&date, "date")?,
                duration_seconds: to_u64(duration_seconds, "duration_seconds")?,
                exercises,
            }))
        })
        .await
    }

    pub async fn list_history_ids(&self, workout_id: &str) -> Result<Vec<String>> {
        let workout_id = workout_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM history_records WHERE workout_id = ?1 ORDER BY date DESC",
            )?;
            let mut rows = stmt.query(params![workout_id])?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                ids.push(row.get(0)?);
            }
            Ok(ids)
        })
        .await
    }
}
